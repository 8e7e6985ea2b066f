//! # tcv3
//!
//! Tooling for the threat-intelligence platform's v3 REST API.
//!
//! ## Overview
//!
//! The crate has two halves:
//!
//! - a **code generator** that turns per-resource schemas into the filter,
//!   model and object modules of an SDK, and
//! - the **runtime** those generated modules call into, plus a pub/sub
//!   dispatcher for services hosted by the platform.
//!
//! ## Architecture
//!
//! - **[`schema`]** - resource catalogue and schema loading (directory or live API)
//! - **[`generator`]** - name transforms, type binding, askama rendering, file writing
//! - **[`cli`]** - the `tcv3-gen` command line
//! - **[`tql`]** - the TQL query builder generated filters wrap
//! - **[`model`]** - serde helpers and the [`model::V3Model`] trait generated models implement
//! - **[`api`]** - blocking HTTP session, single-object CRUD and paginated collections
//! - **[`service`]** - command dispatch, config tracking and heartbeats over pub/sub
//! - **[`logging`]** - `tracing` subscriber setup and per-session log files
//! - **[`ids`]** - ULID session ids
//!
//! ### Generation Flow
//!
//! ```text
//! tcv3-gen model --type indicators
//!   └─ SchemaLoader::load        schemas/indicators.json  or  OPTIONS /v3/indicators
//!       └─ ModelRegistry::bind   property types -> Rust types / sibling models
//!           └─ askama render     templates/model.rs.txt
//!               └─ write_artifact  src/v3/indicators/indicator_model.rs (must exist)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use tcv3::tql::{Tql, TqlOperator, TqlType};
//!
//! let mut tql = Tql::new();
//! tql.add_filter("summary", TqlOperator::Eq, "1.1.1.1".into(), TqlType::String)
//!     .unwrap();
//! assert_eq!(tql.as_str(), r#"summary = "1.1.1.1""#);
//! ```

pub mod api;
pub mod cli;
pub mod generator;
pub mod ids;
pub mod logging;
pub mod model;
pub mod schema;
pub mod service;
pub mod tql;
