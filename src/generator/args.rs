use super::format::{format_type, normalize_description, wrap_text, DOC_WIDTH};
use super::GeneratorError;
use crate::schema::ResourceSchema;

/// Type names that are nested objects even when the schema does not mark them
/// as references.
pub const NESTED_TYPE_NAMES: &[&str] = &[
    "AdversaryAssets",
    "Artifact",
    "Artifacts",
    "ArtifactType",
    "Assignee",
    "Attributes",
    "Case",
    "Cases",
    "FileAction",
    "FileOccurrences",
    "Groups",
    "Indicators",
    "Note",
    "Notes",
    "SecurityLabels",
    "Tag",
    "Tags",
    "Task",
    "Tasks",
    "User",
    "Users",
    "Victims",
    "VictimAssets",
    "WorkflowEvent",
    "WorkflowEvents",
    "WorkflowTemplate",
];

/// Build the `Args:` documentation block for a resource.
///
/// Read-only properties are always left out. Non-updatable properties are
/// left out when `include_non_updatable` is false, nested objects when
/// `include_nested` is false.
///
/// Each entry reads `<name> (<type>, kwargs): <description>`, is indented by
/// `continuation_indent` and wraps at [`DOC_WIDTH`] columns with a further
/// four-space hanging indent. The header is indented by `base_indent`.
///
/// Returns an empty string when no property survives the filters; callers
/// omit the block in that case.
///
/// # Errors
///
/// Returns [`GeneratorError::SchemaShape`] if a surviving property's type
/// cannot be resolved. With `include_nested` false such a property is
/// skipped instead.
pub fn generate_args_doc(
    schema: &ResourceSchema,
    base_indent: &str,
    continuation_indent: &str,
    include_nested: bool,
    include_non_updatable: bool,
) -> Result<String, GeneratorError> {
    let mut doc = vec![format!("{base_indent}Args:")];
    let hanging = format!("{continuation_indent}    ");

    for property in &schema.properties {
        if property.read_only {
            continue;
        }
        if !include_non_updatable && !property.updatable {
            continue;
        }

        // Untyped properties are nested objects in practice.
        let type_name = match format_type(schema.object_type, property) {
            Ok(type_name) => type_name,
            Err(_) if !include_nested => continue,
            Err(e) => return Err(e),
        };
        if !include_nested
            && (type_name.is_reference() || NESTED_TYPE_NAMES.contains(&type_name.name()))
        {
            continue;
        }

        let entry = format!(
            "{continuation_indent}{} ({type_name}, kwargs): {}",
            property.name,
            normalize_description(&property.description)
        );
        doc.push(wrap_text(&entry, DOC_WIDTH, &hanging));
    }

    if doc.len() > 1 {
        Ok(doc.join("\n"))
    } else {
        Ok(String::new())
    }
}
