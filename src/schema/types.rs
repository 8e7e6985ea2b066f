use serde::Deserialize;
use serde_json::{Map, Value};

use super::ObjectType;
use crate::generator::GeneratorError;

/// One field of a resource type as described by the schema source.
///
/// The raw JSON is kept so shape errors can be reported with the original
/// definition attached.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub name: String,
    pub description: String,
    pub read_only: bool,
    pub updatable: bool,
    pub methods: Vec<String>,
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub max_size: Option<u64>,
    pub raw: Value,
}

impl PropertySchema {
    pub fn from_value(name: &str, raw: &Value) -> Self {
        let flag = |camel: &str, snake: &str| {
            raw.get(camel)
                .or_else(|| raw.get(snake))
                .and_then(Value::as_bool)
        };
        let number = |camel: &str, snake: &str| {
            raw.get(camel)
                .or_else(|| raw.get(snake))
                .and_then(Value::as_u64)
        };
        PropertySchema {
            name: name.to_string(),
            description: raw
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            read_only: flag("readOnly", "read_only").unwrap_or(false),
            updatable: flag("updatable", "updatable").unwrap_or(true),
            methods: raw
                .get("methods")
                .and_then(Value::as_array)
                .map(|m| {
                    m.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            max_length: number("maxLength", "max_length"),
            min_length: number("minLength", "min_length"),
            max_size: number("maxSize", "max_size"),
            raw: raw.clone(),
        }
    }

    /// camelCase name the API uses on the wire.
    pub fn wire_name(&self) -> String {
        crate::generator::lower_camel_case(&self.name)
    }
}

/// A TQL keyword advertised by the API for a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TqlKeyword {
    pub keyword: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub tql_type: String,
    #[serde(default)]
    pub description: String,
}

/// The full property set of a single resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub object_type: ObjectType,
    /// Sorted by name so every generator walks them in the same order.
    pub properties: Vec<PropertySchema>,
    /// Explicit TQL keyword list, when the source provides one.
    pub tql: Option<Vec<TqlKeyword>>,
    pub raw: Value,
}

impl ResourceSchema {
    /// Build a schema from a JSON document.
    ///
    /// Accepts either a document with a top-level `properties` map or one that
    /// points at a model in `definitions` through `$ref`.
    pub fn from_value(object_type: ObjectType, raw: Value) -> Result<Self, GeneratorError> {
        let properties = Self::properties_of(&raw).ok_or_else(|| GeneratorError::SchemaShape {
            resource: object_type,
            property: None,
            raw: raw.clone(),
        })?;

        let mut props: Vec<PropertySchema> = properties
            .iter()
            .map(|(name, prop)| PropertySchema::from_value(name, prop))
            .collect();
        props.sort_by(|a, b| a.name.cmp(&b.name));

        let tql = match raw.get("tql") {
            Some(v) => Some(serde_json::from_value::<Vec<TqlKeyword>>(v.clone()).map_err(
                |_| GeneratorError::SchemaShape {
                    resource: object_type,
                    property: Some("tql".to_string()),
                    raw: v.clone(),
                },
            )?),
            None => None,
        };

        Ok(ResourceSchema {
            object_type,
            properties: props,
            tql,
            raw,
        })
    }

    fn properties_of(raw: &Value) -> Option<&Map<String, Value>> {
        if let Some(reference) = raw.get("$ref").and_then(Value::as_str) {
            let model = reference.rsplit('/').next()?;
            return raw
                .get("definitions")
                .and_then(|d| d.get(model))
                .and_then(|m| m.get("properties"))
                .and_then(Value::as_object);
        }
        raw.get("properties").and_then(Value::as_object)
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }
}
