use std::collections::BTreeSet;

use askama::Template;

use super::args::generate_args_doc;
use super::format::{prefix_lines, snake_case};
use super::model::{FieldKind, ModelRegistry};
use super::templates::{AdderView, ObjectTemplateData};
use super::GeneratorError;
use crate::schema::{ObjectType, ResourceSchema};

/// `associated_groups` → `associated_group`
fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{stem}y")
    } else if name.ends_with("ss") {
        name.to_string()
    } else {
        name.strip_suffix('s').unwrap_or(name).to_string()
    }
}

/// Render the collection and item wrappers for a resource.
///
/// The item's constructor documents the accepted model fields with the args
/// block. Every writable collection relation gets an `add_<item>` method that
/// appends to the in-memory model. Its doc carries the related type's args
/// block (scalar updatable fields only) when `nested_schema` can supply that
/// type's schema.
///
/// # Errors
///
/// Returns an error if a property cannot be typed or rendering fails.
pub fn generate_object(
    schema: &ResourceSchema,
    registry: &ModelRegistry,
    nested_schema: impl Fn(ObjectType) -> Option<ResourceSchema>,
) -> Result<String, GeneratorError> {
    let object_type = schema.object_type;
    let model = registry.bind(schema)?;

    let args = generate_args_doc(schema, "", "    ", true, true)?;
    let args_doc = if args.is_empty() {
        String::new()
    } else {
        prefix_lines(&args, "    /// ")
    };

    let mut imports = BTreeSet::new();
    let mut adders = Vec::new();
    for field in &model.fields {
        let FieldKind::Relation(target) = field.kind else {
            continue;
        };
        if !target.collection || field.property.read_only {
            continue;
        }
        if target.object_type != object_type {
            imports.insert(format!(
                "{}::{}",
                target.model_module(),
                target.item_model_name()
            ));
        }
        let target_args = if target.object_type == object_type {
            generate_args_doc(schema, "", "    ", false, false)?
        } else {
            match nested_schema(target.object_type) {
                Some(target_schema) => generate_args_doc(&target_schema, "", "    ", false, false)?,
                None => String::new(),
            }
        };
        let field_name = snake_case(&field.property.name);
        adders.push(AdderView {
            name: singularize(&field_name),
            label: singularize(&field_name).replace('_', " "),
            field: field.ident(),
            model: target.item_model_name(),
            args_doc: if target_args.is_empty() {
                String::new()
            } else {
                prefix_lines(&target_args, "    /// ")
            },
        });
    }

    let data = ObjectTemplateData {
        singular: object_type.camel_singular(),
        plural: object_type.camel_plural(),
        singular_snake: object_type.singular().to_string(),
        plural_snake: object_type.as_str().to_string(),
        endpoint: object_type.api_endpoint().to_string(),
        imports: imports.into_iter().collect(),
        args_doc,
        adders,
    };
    Ok(data.render()?)
}
