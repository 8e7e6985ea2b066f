use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::format::format_files;
use crate::generator::args::generate_args_doc;
use crate::generator::filter::generate_filter;
use crate::generator::model::{generate_model, ModelRegistry};
use crate::generator::object::generate_object;
use crate::generator::templates::write_artifact;
use crate::generator::GeneratorError;
use crate::schema::{ObjectType, ResourceSchema, SchemaLoader, SchemaSource};

/// The artifacts generated per resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GenKind {
    Filter,
    Model,
    Object,
}

impl GenKind {
    pub const ALL: [GenKind; 3] = [GenKind::Filter, GenKind::Model, GenKind::Object];

    pub fn file_name(&self, object_type: ObjectType) -> String {
        match self {
            GenKind::Filter => format!("{}_filter.rs", object_type.singular()),
            GenKind::Model => format!("{}_model.rs", object_type.singular()),
            GenKind::Object => format!("{}.rs", object_type.singular()),
        }
    }
}

/// Generator settings, passed explicitly to every run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Root of the crate receiving generated code (holds `src/`)
    pub root: PathBuf,
    pub schema_source: SchemaSource,
    /// Run rustfmt over written files
    pub format: bool,
}

/// `<root>/src/<module_path>/<type>/<file>`
pub fn output_path(root: &Path, object_type: ObjectType, kind: GenKind) -> PathBuf {
    root.join("src")
        .join(object_type.module_path())
        .join(object_type.as_str())
        .join(kind.file_name(object_type))
}

/// Drives schema loading, rendering and writing.
#[derive(Debug, Clone)]
pub struct Generator {
    config: GeneratorConfig,
    loader: SchemaLoader,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        let loader = SchemaLoader::new(config.schema_source.clone());
        Self { config, loader }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn load(&self, object_type: ObjectType) -> Result<ResourceSchema, GeneratorError> {
        self.loader.load(object_type)
    }

    /// Render one artifact into a string.
    pub fn render(
        &self,
        schema: &ResourceSchema,
        registry: &ModelRegistry,
        kind: GenKind,
    ) -> Result<String, GeneratorError> {
        match kind {
            GenKind::Filter => generate_filter(schema, registry),
            GenKind::Model => generate_model(schema, registry),
            GenKind::Object => generate_object(schema, registry, |target| {
                match self.load(target) {
                    Ok(target_schema) => Some(target_schema),
                    Err(e) => {
                        debug!(resource = %target, error = %e, "No schema for adder docs");
                        None
                    }
                }
            }),
        }
    }

    /// The `Args:` block for `object_type`, indented by `indent_blocks` levels
    /// of four spaces. Nested and non-updatable properties are included.
    pub fn args_doc(
        &self,
        object_type: ObjectType,
        indent_blocks: usize,
    ) -> Result<String, GeneratorError> {
        let schema = self.load(object_type)?;
        let base = " ".repeat(indent_blocks * 4);
        let continuation = format!("{base}    ");
        generate_args_doc(&schema, &base, &continuation, true, true)
    }

    /// Generate `kinds` for a single type.
    ///
    /// Every other catalogue type is assumed to already have its module in the
    /// target tree. Targets must exist; if any is missing nothing is written.
    ///
    /// # Errors
    ///
    /// Returns the first loading, rendering or writing error.
    pub fn generate_type(
        &self,
        object_type: ObjectType,
        kinds: &[GenKind],
    ) -> Result<Vec<PathBuf>, GeneratorError> {
        let schema = self.load(object_type)?;
        let mut registry = ModelRegistry::with_catalogue();
        registry.declare_schema(&schema);
        self.write_kinds(&schema, &registry, kinds)
    }

    /// Generate `kinds` for every catalogue type.
    ///
    /// Schemas are loaded and declared first, then each is bound and written,
    /// so relations resolve regardless of order. A type that fails is logged
    /// and skipped; the failures are returned once every type was attempted.
    pub fn generate_all(&self, kinds: &[GenKind]) -> Vec<(ObjectType, GeneratorError)> {
        let mut failures = Vec::new();
        let mut registry = ModelRegistry::new();
        let mut schemas = Vec::new();

        for object_type in ObjectType::ALL {
            match self.load(object_type) {
                Ok(schema) => {
                    registry.declare_schema(&schema);
                    schemas.push(schema);
                }
                Err(e) => {
                    error!(resource = %object_type, error = %e, "Failed to load schema");
                    failures.push((object_type, e));
                }
            }
        }

        for schema in &schemas {
            if let Err(e) = self.write_kinds(schema, &registry, kinds) {
                error!(resource = %schema.object_type, error = %e, "Generation failed");
                failures.push((schema.object_type, e));
            }
        }

        if failures.is_empty() {
            info!(types = schemas.len(), "Generated all types");
        } else {
            warn!(failed = failures.len(), "Generation finished with failures");
        }
        failures
    }

    fn write_kinds(
        &self,
        schema: &ResourceSchema,
        registry: &ModelRegistry,
        kinds: &[GenKind],
    ) -> Result<Vec<PathBuf>, GeneratorError> {
        let object_type = schema.object_type;
        let targets: Vec<(GenKind, PathBuf)> = kinds
            .iter()
            .map(|kind| (*kind, output_path(&self.config.root, object_type, *kind)))
            .collect();

        if let Some((_, path)) = targets.iter().find(|(_, path)| !path.is_file()) {
            return Err(GeneratorError::OutputTargetMissing {
                resource: object_type,
                path: path.clone(),
            });
        }

        let mut rendered = Vec::with_capacity(targets.len());
        for (kind, path) in targets {
            rendered.push((path, self.render(schema, registry, kind)?));
        }

        let mut written = Vec::with_capacity(rendered.len());
        for (path, text) in rendered {
            write_artifact(&path, &text)?;
            written.push(path);
        }

        if self.config.format {
            format_files(&written)?;
        }
        Ok(written)
    }
}
