use std::collections::{BTreeMap, BTreeSet};

use askama::Template;
use serde_json::Value;

use super::format::{
    format_description, format_type, prefix_lines, rust_identifier, snake_case, TypeName,
    DOC_WIDTH,
};
use super::model::{ModelRef, ModelRegistry};
use super::templates::{FilterTemplateData, KeywordMethodView, NestedMethodView};
use super::GeneratorError;
use crate::schema::{ObjectType, PropertySchema, ResourceSchema, TqlKeyword};
use crate::tql::TqlType;

/// One filter method to generate.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterKeyword {
    Scalar {
        keyword: String,
        tql_type: TqlType,
        description: String,
    },
    /// `has<Resource>(<inner filter>)`
    Nested {
        keyword: String,
        target: ObjectType,
        description: String,
    },
}

impl FilterKeyword {
    pub fn keyword(&self) -> &str {
        match self {
            FilterKeyword::Scalar { keyword, .. } | FilterKeyword::Nested { keyword, .. } => {
                keyword
            }
        }
    }

    pub fn method_name(&self) -> String {
        rust_identifier(&snake_case(self.keyword()))
    }
}

/// TQL type of a primitive property, `None` when it cannot be filtered on.
fn property_tql_type(property: &PropertySchema) -> Option<TqlType> {
    let raw = &property.raw;
    if raw.get("enum").is_some_and(Value::is_array) {
        return Some(TqlType::Enum);
    }
    let format = raw.get("format").and_then(Value::as_str);
    match raw.get("type").and_then(Value::as_str)? {
        "string" if matches!(format, Some("date-time" | "date")) => Some(TqlType::Date),
        "string" => Some(TqlType::String),
        "integer" if format == Some("int64") => Some(TqlType::BigInteger),
        "integer" => Some(TqlType::Integer),
        "number" => Some(TqlType::Number),
        "boolean" => Some(TqlType::Boolean),
        _ => None,
    }
}

fn nested_keyword(target: &ModelRef) -> String {
    format!("has{}", target.object_type.camel_singular())
}

fn from_tql_list(
    schema: &ResourceSchema,
    keywords: &[TqlKeyword],
    registry: &ModelRegistry,
) -> Result<Vec<FilterKeyword>, GeneratorError> {
    let mut out = Vec::with_capacity(keywords.len());
    for keyword in keywords {
        let target = keyword
            .keyword
            .strip_prefix("has")
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
            .and_then(|rest| registry.resolve(schema.object_type, rest));
        if let Some(target) = target {
            out.push(FilterKeyword::Nested {
                keyword: keyword.keyword.clone(),
                target: target.object_type,
                description: keyword.description.clone(),
            });
            continue;
        }
        let tql_type = keyword
            .tql_type
            .parse::<TqlType>()
            .map_err(|_| GeneratorError::SchemaShape {
                resource: schema.object_type,
                property: Some(keyword.keyword.clone()),
                raw: serde_json::json!({
                    "keyword": keyword.keyword,
                    "name": keyword.name,
                    "type": keyword.tql_type,
                }),
            })?;
        out.push(FilterKeyword::Scalar {
            keyword: keyword.keyword.clone(),
            tql_type,
            description: keyword.description.clone(),
        });
    }
    Ok(out)
}

fn from_properties(
    schema: &ResourceSchema,
    registry: &ModelRegistry,
) -> Result<Vec<FilterKeyword>, GeneratorError> {
    let mut out = Vec::new();
    for property in &schema.properties {
        match format_type(schema.object_type, property)? {
            TypeName::Primitive(_) => {
                if let Some(tql_type) = property_tql_type(property) {
                    out.push(FilterKeyword::Scalar {
                        keyword: property.wire_name(),
                        tql_type,
                        description: property.description.clone(),
                    });
                }
            }
            TypeName::Reference(name) | TypeName::ReferenceList(name) => {
                if let Some(target) = registry.resolve(schema.object_type, &name) {
                    out.push(FilterKeyword::Nested {
                        keyword: nested_keyword(&target),
                        target: target.object_type,
                        description: format!(
                            "A nested query for association to {}.",
                            target.object_type.camel_plural()
                        ),
                    });
                }
            }
            TypeName::PrimitiveList(_) => {}
        }
    }
    Ok(out)
}

/// The keywords a resource can be filtered on.
///
/// Uses the schema's explicit TQL keyword list when it has one, otherwise
/// derives keywords from primitive properties and resolvable relations.
/// Duplicate method names keep the first keyword; the result is sorted by
/// method name.
pub fn filter_keywords(
    schema: &ResourceSchema,
    registry: &ModelRegistry,
) -> Result<Vec<FilterKeyword>, GeneratorError> {
    let keywords = match &schema.tql {
        Some(list) => from_tql_list(schema, list, registry)?,
        None => from_properties(schema, registry)?,
    };
    let mut by_method = BTreeMap::new();
    for keyword in keywords {
        by_method.entry(keyword.method_name()).or_insert(keyword);
    }
    Ok(by_method.into_values().collect())
}

fn method_doc(description: &str, fallback: &str) -> String {
    let text = if description.trim().is_empty() {
        fallback
    } else {
        description
    };
    prefix_lines(&format_description(text, DOC_WIDTH - 8, ""), "    /// ")
}

/// Render the `<Singular>Filter` type for a resource.
///
/// Output only depends on the schema and registry contents, so repeated runs
/// produce identical text.
///
/// # Errors
///
/// Returns an error if a keyword has an unknown TQL type, a property cannot
/// be typed, or rendering fails.
pub fn generate_filter(
    schema: &ResourceSchema,
    registry: &ModelRegistry,
) -> Result<String, GeneratorError> {
    let object_type = schema.object_type;
    let mut imports = BTreeSet::new();
    let mut keywords = Vec::new();
    let mut nested = Vec::new();

    for keyword in filter_keywords(schema, registry)? {
        let name = keyword.method_name();
        match keyword {
            FilterKeyword::Scalar {
                keyword,
                tql_type,
                description,
            } => {
                let fallback = format!(
                    "Filter {} based on **{keyword}** keyword.",
                    object_type.camel_plural()
                );
                keywords.push(KeywordMethodView {
                    doc: method_doc(&description, &fallback),
                    name,
                    keyword,
                    tql_type: tql_type.as_str().to_string(),
                });
            }
            FilterKeyword::Nested {
                keyword,
                target,
                description,
            } => {
                let filter_type = format!("{}Filter", target.camel_singular());
                if target != object_type {
                    imports.insert(format!(
                        "{}::{}_filter::{filter_type}",
                        target.rust_module(),
                        target.singular()
                    ));
                }
                let fallback = format!("Filter by nested {} query.", target.camel_plural());
                nested.push(NestedMethodView {
                    doc: method_doc(&description, &fallback),
                    name,
                    keyword,
                    filter_type,
                });
            }
        }
    }

    let data = FilterTemplateData {
        singular: object_type.camel_singular(),
        plural: object_type.camel_plural(),
        imports: imports.into_iter().collect(),
        keywords,
        nested,
    };
    Ok(data.render()?)
}
