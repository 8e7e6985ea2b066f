use std::collections::BTreeSet;

use askama::Template;
use tracing::warn;

use super::format::{
    format_description, format_type, lower_camel_case, prefix_lines, rust_identifier,
    rust_primitive, snake_case, TypeName, DOC_WIDTH,
};
use super::templates::{ModelFieldView, ModelTemplateData};
use super::GeneratorError;
use crate::schema::{ObjectType, PropertySchema, ResourceSchema};

/// A reference from one generated model to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModelRef {
    pub object_type: ObjectType,
    /// `true` for the `<Plural>Model` collection form
    pub collection: bool,
}

impl ModelRef {
    pub fn model_name(&self) -> String {
        if self.collection {
            format!("{}Model", self.object_type.camel_plural())
        } else {
            format!("{}Model", self.object_type.camel_singular())
        }
    }

    /// Name of the single-item model, the element type of a collection.
    pub fn item_model_name(&self) -> String {
        format!("{}Model", self.object_type.camel_singular())
    }

    pub fn model_module(&self) -> String {
        format!(
            "{}::{}_model",
            self.object_type.rust_module(),
            self.object_type.singular()
        )
    }
}

/// How a property is represented on the generated model.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive { rust: &'static str, list: bool },
    Relation(ModelRef),
    /// The reference names no declared model; typed as `serde_json::Value`.
    Unresolved(String),
}

#[derive(Debug, Clone)]
pub struct BoundField {
    pub property: PropertySchema,
    pub type_name: TypeName,
    pub kind: FieldKind,
}

impl BoundField {
    pub fn ident(&self) -> String {
        rust_identifier(&snake_case(&self.property.name))
    }

    pub fn wire_name(&self) -> String {
        lower_camel_case(&self.property.name)
    }
}

/// A resource schema with every relation resolved against the registry.
#[derive(Debug, Clone)]
pub struct BoundModel {
    pub object_type: ObjectType,
    pub fields: Vec<BoundField>,
}

impl BoundModel {
    /// Relations to other types' models, deduplicated and sorted.
    pub fn foreign_refs(&self) -> BTreeSet<ModelRef> {
        self.fields
            .iter()
            .filter_map(|f| match f.kind {
                FieldKind::Relation(r) if r.object_type != self.object_type => Some(r),
                _ => None,
            })
            .collect()
    }
}

/// Attribute types are referenced as plain `Attributes` from their owner.
fn owner_attribute_type(owner: ObjectType) -> Option<ObjectType> {
    match owner {
        ObjectType::Cases => Some(ObjectType::CaseAttributes),
        ObjectType::Groups => Some(ObjectType::GroupAttributes),
        ObjectType::Indicators => Some(ObjectType::IndicatorAttributes),
        ObjectType::Victims => Some(ObjectType::VictimAttributes),
        _ => None,
    }
}

/// Two-phase model registration.
///
/// Schemas reference each other freely, cycles included, so no model can be
/// bound while the set of models is still being discovered. Phase one
/// ([`declare`](Self::declare)) records every model that will exist; phase two
/// ([`bind`](Self::bind)) resolves each relation against that set.
#[derive(Debug, Default, Clone)]
pub struct ModelRegistry {
    declared: BTreeSet<ObjectType>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every catalogue type declared.
    ///
    /// Used when generating a single type into a tree that already holds the
    /// other types' modules.
    pub fn with_catalogue() -> Self {
        let mut registry = Self::new();
        for object_type in ObjectType::ALL {
            registry.declare(object_type);
        }
        registry
    }

    pub fn declare(&mut self, object_type: ObjectType) {
        self.declared.insert(object_type);
    }

    pub fn declare_schema(&mut self, schema: &ResourceSchema) {
        self.declare(schema.object_type);
    }

    pub fn is_declared(&self, object_type: ObjectType) -> bool {
        self.declared.contains(&object_type)
    }

    /// Resolve a referenced model name seen on `owner`'s schema.
    pub fn resolve(&self, owner: ObjectType, name: &str) -> Option<ModelRef> {
        let (object_type, collection) = ObjectType::from_model_name(name).or_else(|| {
            match name.strip_suffix("Model").unwrap_or(name) {
                "Attributes" => owner_attribute_type(owner).map(|t| (t, true)),
                "Attribute" => owner_attribute_type(owner).map(|t| (t, false)),
                _ => None,
            }
        })?;
        self.is_declared(object_type).then_some(ModelRef {
            object_type,
            collection,
        })
    }

    /// Phase two: resolve every property of `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::SchemaShape`] for a property whose type
    /// cannot be determined.
    pub fn bind(&self, schema: &ResourceSchema) -> Result<BoundModel, GeneratorError> {
        let mut fields = Vec::with_capacity(schema.properties.len());
        for property in &schema.properties {
            let type_name = format_type(schema.object_type, property)?;
            let kind = match &type_name {
                TypeName::Primitive(name) => FieldKind::Primitive {
                    rust: rust_primitive(name),
                    list: false,
                },
                TypeName::PrimitiveList(name) => FieldKind::Primitive {
                    rust: rust_primitive(name),
                    list: true,
                },
                TypeName::Reference(name) | TypeName::ReferenceList(name) => {
                    match self.resolve(schema.object_type, name) {
                        Some(model) => FieldKind::Relation(model),
                        None => {
                            warn!(
                                resource = %schema.object_type,
                                property = %property.name,
                                target = %name,
                                "Unresolved model reference, falling back to serde_json::Value"
                            );
                            FieldKind::Unresolved(name.clone())
                        }
                    }
                }
            };
            fields.push(BoundField {
                property: property.clone(),
                type_name,
                kind,
            });
        }
        Ok(BoundModel {
            object_type: schema.object_type,
            fields,
        })
    }
}

fn field_doc(property: &PropertySchema) -> String {
    let text = if property.description.is_empty() {
        property.name.as_str()
    } else {
        property.description.as_str()
    };
    prefix_lines(&format_description(text, DOC_WIDTH - 8, ""), "    /// ")
}

fn field_view(field: &BoundField) -> ModelFieldView {
    let wire = field.wire_name();
    let read_only = field.property.read_only;
    let (ty, attr) = match &field.kind {
        FieldKind::Primitive { rust, list } => {
            let inner = if *list {
                format!("Vec<{rust}>")
            } else {
                rust.to_string()
            };
            let skip = if read_only {
                "skip_serializing"
            } else {
                "skip_serializing_if = \"Option::is_none\""
            };
            (
                format!("Option<{inner}>"),
                format!("#[serde(rename = \"{wire}\", default, {skip})]"),
            )
        }
        FieldKind::Relation(target) => {
            let name = target.model_name();
            let ty = if target.collection {
                name
            } else {
                format!("Box<{name}>")
            };
            let skip = if read_only {
                "skip_serializing"
            } else {
                "skip_serializing_if = \"tcv3::model::is_default\""
            };
            (
                ty,
                format!(
                    "#[serde(rename = \"{wire}\", default, deserialize_with = \"tcv3::model::null_as_default\", {skip})]"
                ),
            )
        }
        FieldKind::Unresolved(_) => {
            let skip = if read_only {
                "skip_serializing"
            } else {
                "skip_serializing_if = \"serde_json::Value::is_null\""
            };
            (
                "serde_json::Value".to_string(),
                format!("#[serde(rename = \"{wire}\", default, {skip})]"),
            )
        }
    };
    ModelFieldView {
        doc: field_doc(&field.property),
        attr,
        ident: field.ident(),
        ty,
    }
}

/// Render the model family (`<Plural>Model`, `<Singular>DataModel`,
/// `<Singular>Model`) for a resource.
///
/// # Errors
///
/// Returns an error if a property cannot be typed or rendering fails.
pub fn generate_model(
    schema: &ResourceSchema,
    registry: &ModelRegistry,
) -> Result<String, GeneratorError> {
    let model = registry.bind(schema)?;
    let object_type = schema.object_type;

    let imports: Vec<String> = model
        .foreign_refs()
        .into_iter()
        .map(|r| format!("{}::{}", r.model_module(), r.model_name()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let id_field = model.fields.iter().find(|f| {
        f.property.name == "id"
            && matches!(f.kind, FieldKind::Primitive { rust: "i64", list: false })
    });
    let (id_get, id_set) = match id_field {
        Some(_) => ("self.id".to_string(), "self.id = id;".to_string()),
        None => ("None".to_string(), "let _ = id;".to_string()),
    };

    let non_updatable = model
        .fields
        .iter()
        .filter(|f| !f.property.updatable && !f.property.read_only)
        .map(BoundField::wire_name)
        .collect();

    let data = ModelTemplateData {
        singular: object_type.camel_singular(),
        plural: object_type.camel_plural(),
        imports,
        fields: model.fields.iter().map(field_view).collect(),
        id_get,
        id_set,
        non_updatable,
    };
    Ok(data.render()?)
}
