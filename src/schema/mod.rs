//! # Schema Module
//!
//! Resource schemas are the generator's input contract: one property set per
//! API resource type, plus the TQL keywords the API accepts for it.
//!
//! - [`ObjectType`] is the fixed catalogue of supported resource types with
//!   their name forms, endpoints and module paths.
//! - [`ResourceSchema`] / [`PropertySchema`] hold a loaded property set.
//! - [`SchemaLoader`] reads schemas from a directory of JSON/YAML documents or
//!   fetches them from the live API.
//!
//! A schema document looks like:
//!
//! ```json
//! {
//!   "properties": {
//!     "summary": {"type": "string", "description": "The indicator summary.", "methods": ["POST"]},
//!     "tags": {"allOf": [{"$ref": "#/definitions/TagsModel"}], "description": "A list of Tags."},
//!     "id": {"type": "integer", "readOnly": true}
//!   },
//!   "tql": [{"keyword": "summary", "name": "Summary", "type": "String"}]
//! }
//! ```

mod load;
mod resource;
mod types;

pub use load::*;
pub use resource::*;
pub use types::*;
