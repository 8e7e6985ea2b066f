mod format;
mod generate;

pub use format::format_files;
pub use generate::{output_path, GenKind, Generator, GeneratorConfig};
