use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use super::types::ResourceSchema;
use super::ObjectType;
use crate::generator::GeneratorError;

/// Where resource schemas come from.
#[derive(Debug, Clone)]
pub enum SchemaSource {
    /// A directory holding `<type>.json` / `<type>.yaml` documents.
    Directory(PathBuf),
    /// The live API: schemas are read with an `OPTIONS` request on each
    /// collection endpoint, TQL keywords from `<endpoint>/tql`.
    Remote {
        api_url: String,
        /// Extra headers sent with every request (e.g. `Authorization`).
        headers: Vec<(String, String)>,
    },
}

/// Loads [`ResourceSchema`]s from a [`SchemaSource`].
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    source: SchemaSource,
}

impl SchemaLoader {
    pub fn new(source: SchemaSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    /// Load the schema for one object type.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be found, fetched or parsed, or
    /// if it has no property set.
    pub fn load(&self, object_type: ObjectType) -> Result<ResourceSchema, GeneratorError> {
        let raw = match &self.source {
            SchemaSource::Directory(dir) => load_from_dir(dir, object_type)?,
            SchemaSource::Remote { api_url, headers } => {
                fetch_remote(api_url, headers, object_type)?
            }
        };
        ResourceSchema::from_value(object_type, raw)
    }
}

fn load_from_dir(dir: &Path, object_type: ObjectType) -> Result<Value, GeneratorError> {
    for ext in ["json", "yaml", "yml"] {
        let path = dir.join(format!("{}.{ext}", object_type.as_str()));
        if !path.is_file() {
            continue;
        }
        debug!(resource = %object_type, path = %path.display(), "Loading schema document");
        let content = std::fs::read_to_string(&path)?;
        let value: Value = if ext == "json" {
            serde_json::from_str(&content).map_err(|e| GeneratorError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| GeneratorError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?
        };
        return Ok(value);
    }
    Err(GeneratorError::SchemaNotFound {
        resource: object_type,
        path: dir.join(format!("{}.json", object_type.as_str())),
    })
}

fn fetch_remote(
    api_url: &str,
    headers: &[(String, String)],
    object_type: ObjectType,
) -> Result<Value, GeneratorError> {
    let fetch_err = |e: reqwest::Error| GeneratorError::Fetch {
        resource: object_type,
        message: e.to_string(),
    };
    let client = reqwest::blocking::Client::new();
    let base = format!("{}{}", api_url.trim_end_matches('/'), object_type.api_endpoint());

    let send = |request: reqwest::blocking::RequestBuilder| {
        headers
            .iter()
            .fold(request, |r, (k, v)| r.header(k.as_str(), v.as_str()))
            .send()
            .and_then(|r| r.error_for_status())
    };

    info!(resource = %object_type, url = %base, "Fetching schema from API");
    let mut schema: Value = send(
        client
            .request(reqwest::Method::OPTIONS, format!("{base}?show=readOnly")),
    )
    .and_then(|r| r.json())
    .map_err(fetch_err)?;

    let tql: Value = send(client.get(format!("{base}/tql")))
        .and_then(|r| r.json())
        .map_err(fetch_err)?;
    let keywords = tql.get("data").cloned().unwrap_or(tql);
    if let Value::Object(map) = &mut schema {
        if keywords.is_array() {
            map.insert("tql".to_string(), keywords);
        }
    }
    Ok(schema)
}
