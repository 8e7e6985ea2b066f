//! # Generator Module
//!
//! Turns resource schemas into the Rust source of the v3 SDK: per resource
//! type a TQL filter, a model family and an object wrapper.
//!
//! ## Architecture
//!
//! ```text
//! Schema (file or API) → ResourceSchema → ModelRegistry (declare, bind) → askama templates → files
//! ```
//!
//! 1. **Loading** - [`crate::schema::SchemaLoader`] reads the property set
//! 2. **Formatting** - pure helpers resolve property types and wrap descriptions
//! 3. **Binding** - [`ModelRegistry`] resolves relations between models in two phases
//! 4. **Rendering** - templates under `templates/` produce the source text
//! 5. **Writing** - the text replaces an existing file; missing targets are an error
//!
//! ## Generated Structure
//!
//! ```text
//! src/v3/
//! ├── indicators/
//! │   ├── indicator.rs          # Indicators / Indicator wrappers
//! │   ├── indicator_filter.rs   # IndicatorFilter
//! │   └── indicator_model.rs    # IndicatorsModel, IndicatorDataModel, IndicatorModel
//! └── security/
//!     └── users/
//!         └── ...
//! ```
//!
//! The generator only overwrites: module files are created (and registered in
//! their parent `mod.rs`) by hand once, after which every run refreshes them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tcv3::generator::{GenKind, Generator, GeneratorConfig};
//! use tcv3::schema::{ObjectType, SchemaSource};
//!
//! let generator = Generator::new(GeneratorConfig {
//!     root: "sdk".into(),
//!     schema_source: SchemaSource::Directory("schemas".into()),
//!     format: false,
//! });
//! generator.generate_type(ObjectType::Indicators, &GenKind::ALL)?;
//! ```

mod args;
mod error;
mod filter;
mod format;
mod model;
mod object;
mod project;
mod templates;


pub use args::{generate_args_doc, NESTED_TYPE_NAMES};
pub use error::GeneratorError;
pub use filter::{filter_keywords, generate_filter, FilterKeyword};
pub use format::{
    camel_case, format_description, format_type, lower_camel_case, normalize_description,
    prefix_lines, rust_identifier, rust_primitive, snake_case, wrap_text, TypeName, DOC_WIDTH,
};
pub use model::{
    generate_model, BoundField, BoundModel, FieldKind, ModelRef, ModelRegistry,
};
pub use object::generate_object;
pub use project::{format_files, output_path, GenKind, Generator, GeneratorConfig};
pub use templates::write_artifact;
