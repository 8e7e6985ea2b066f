//! Support code for generated models.
//!
//! Generated `<Resource>Model` structs keep relation fields non-optional: a
//! relation that is missing or `null` in a response deserializes to an empty
//! model, so `model.tags.data` can always be walked without a null check.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize `null` as `T::default()`.
///
/// Used with `#[serde(default, deserialize_with = "...")]` so both an omitted
/// and an explicit `null` relation produce an empty instance.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `skip_serializing_if` predicate for empty relations.
pub fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Behaviour shared by every generated single-item model.
pub trait V3Model: Serialize + DeserializeOwned + Default + Clone {
    /// Server-assigned id, `None` until the item was created.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: Option<i64>);

    /// Wire names of fields that may be sent on create but not on update.
    fn non_updatable() -> &'static [&'static str];
}
