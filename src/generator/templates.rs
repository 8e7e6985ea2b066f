use askama::Template;
use std::fs;
use std::path::Path;

use tracing::info;

/// A field of the generated single-item model
#[derive(Debug, Clone)]
pub struct ModelFieldView {
    /// Doc comment lines, already prefixed with `    /// `
    pub doc: String,
    /// The `#[serde(...)]` attribute
    pub attr: String,
    pub ident: String,
    pub ty: String,
}

/// Template data for `<singular>_model.rs`
#[derive(Template)]
#[template(path = "model.rs.txt", escape = "none")]
pub struct ModelTemplateData {
    pub singular: String,
    pub plural: String,
    pub imports: Vec<String>,
    pub fields: Vec<ModelFieldView>,
    /// Body of `V3Model::id`
    pub id_get: String,
    /// Body of `V3Model::set_id`
    pub id_set: String,
    pub non_updatable: Vec<String>,
}

/// A scalar keyword method of the generated filter
#[derive(Debug, Clone)]
pub struct KeywordMethodView {
    pub doc: String,
    pub name: String,
    pub keyword: String,
    /// `TqlType` variant name
    pub tql_type: String,
}

/// A `has_<resource>` method of the generated filter
#[derive(Debug, Clone)]
pub struct NestedMethodView {
    pub doc: String,
    pub name: String,
    pub keyword: String,
    pub filter_type: String,
}

/// Template data for `<singular>_filter.rs`
#[derive(Template)]
#[template(path = "filter.rs.txt", escape = "none")]
pub struct FilterTemplateData {
    pub singular: String,
    pub plural: String,
    pub imports: Vec<String>,
    pub keywords: Vec<KeywordMethodView>,
    pub nested: Vec<NestedMethodView>,
}

/// An `add_<item>` method of the generated item wrapper
#[derive(Debug, Clone)]
pub struct AdderView {
    pub name: String,
    /// Human readable item name for the doc comment
    pub label: String,
    /// Model field holding the collection
    pub field: String,
    /// Element model type
    pub model: String,
    /// Prefixed `Args:` block of the element type, may be empty
    pub args_doc: String,
}

/// Template data for `<singular>.rs`
#[derive(Template)]
#[template(path = "object.rs.txt", escape = "none")]
pub struct ObjectTemplateData {
    pub singular: String,
    pub plural: String,
    pub singular_snake: String,
    pub plural_snake: String,
    pub endpoint: String,
    pub imports: Vec<String>,
    /// Args block for the constructor, prefixed with `    /// `; may be empty
    pub args_doc: String,
    pub adders: Vec<AdderView>,
}

/// Write a fully rendered artifact over an existing file.
///
/// Rendering happens before this is called, so a failed render never leaves a
/// truncated file behind.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_artifact(path: &Path, rendered: &str) -> std::io::Result<()> {
    let mut text = rendered.trim_end().to_string();
    text.push('\n');
    fs::write(path, text)?;
    info!(path = %path.display(), "Generated file");
    Ok(())
}
