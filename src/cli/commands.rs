use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

use crate::generator::{GenKind, Generator, GeneratorConfig};
use crate::schema::{ObjectType, SchemaSource};

/// Command-line interface for the v3 SDK generator
///
/// Regenerates filter, model and object modules of the SDK from resource
/// schemas.
#[derive(Parser, Debug)]
#[command(name = "tcv3-gen")]
#[command(about = "Generate v3 API SDK code from resource schemas", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding `<type>.json` / `<type>.yaml` schema documents
    #[arg(long, global = true, default_value = "schemas", env = "TCV3_SCHEMAS")]
    pub schemas: PathBuf,

    /// Fetch schemas from this API instead of the schema directory
    #[arg(long, global = true, env = "TCV3_API_URL")]
    pub api_url: Option<String>,

    /// Header sent with API requests, as `Name: value` (repeatable)
    #[arg(long = "header", global = true, value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Root of the crate receiving generated code
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Run rustfmt over written files
    #[arg(long, global = true, default_value_t = false)]
    pub fmt: bool,
}

/// Which artifacts `all` generates
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GenType {
    All,
    Filter,
    Model,
    Object,
}

impl GenType {
    pub fn kinds(&self) -> &'static [GenKind] {
        match self {
            GenType::All => &GenKind::ALL,
            GenType::Filter => &[GenKind::Filter],
            GenType::Model => &[GenKind::Model],
            GenType::Object => &[GenKind::Object],
        }
    }
}

/// Available generator commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate code for every resource type
    All {
        #[arg(long = "gen_type", alias = "gen-type", value_enum, default_value_t = GenType::All)]
        gen_type: GenType,
    },
    /// Print the `Args:` documentation block for a type
    Args {
        #[arg(long = "type", value_enum)]
        type_: ObjectType,

        /// Indentation level, four spaces each
        #[arg(long = "indent_blocks", alias = "indent-blocks", default_value_t = 1)]
        indent_blocks: usize,
    },
    /// Generate filter, model and object code for a type
    Code {
        #[arg(long = "type", value_enum)]
        type_: ObjectType,
    },
    /// Generate the TQL filter for a type
    Filter {
        #[arg(long = "type", value_enum)]
        type_: ObjectType,
    },
    /// Generate the models for a type
    Model {
        #[arg(long = "type", value_enum)]
        type_: ObjectType,
    },
    /// Generate the object wrappers for a type
    Object {
        #[arg(long = "type", value_enum)]
        type_: ObjectType,
    },
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("invalid header '{raw}', expected 'Name: value'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

impl GlobalArgs {
    pub fn generator_config(&self) -> anyhow::Result<GeneratorConfig> {
        let schema_source = match &self.api_url {
            Some(api_url) => SchemaSource::Remote {
                api_url: api_url.clone(),
                headers: self
                    .headers
                    .iter()
                    .map(|h| parse_header(h))
                    .collect::<anyhow::Result<_>>()?,
            },
            None => SchemaSource::Directory(self.schemas.clone()),
        };
        Ok(GeneratorConfig {
            root: self.root.clone(),
            schema_source,
            format: self.fmt,
        })
    }
}

fn generate_one(generator: &Generator, object_type: ObjectType, kinds: &[GenKind]) -> anyhow::Result<()> {
    let written = generator
        .generate_type(object_type, kinds)
        .with_context(|| format!("generation failed for {object_type}"))?;
    info!(resource = %object_type, files = written.len(), "Generation complete");
    Ok(())
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns an error when any requested type fails to generate. For `all` the
/// remaining types are still generated and every failure is listed.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let generator = Generator::new(cli.global.generator_config()?);
    match cli.command {
        Commands::All { gen_type } => {
            let failures = generator.generate_all(gen_type.kinds());
            if !failures.is_empty() {
                let listed: Vec<String> = failures
                    .iter()
                    .map(|(object_type, e)| format!("  {object_type}: {e}"))
                    .collect();
                bail!(
                    "{} type(s) failed to generate:\n{}",
                    failures.len(),
                    listed.join("\n")
                );
            }
            Ok(())
        }
        Commands::Args {
            type_,
            indent_blocks,
        } => {
            let doc = generator.args_doc(type_, indent_blocks)?;
            println!("{doc}");
            Ok(())
        }
        Commands::Code { type_ } => generate_one(&generator, type_, &GenKind::ALL),
        Commands::Filter { type_ } => generate_one(&generator, type_, &[GenKind::Filter]),
        Commands::Model { type_ } => generate_one(&generator, type_, &[GenKind::Model]),
        Commands::Object { type_ } => generate_one(&generator, type_, &[GenKind::Object]),
    }
}

/// Parse `std::env::args` and run.
pub fn run_from_env() -> anyhow::Result<()> {
    run_cli(Cli::parse())
}
