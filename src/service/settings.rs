use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::ServiceError;

/// Settings of a service process.
///
/// Loaded with [`ServiceSettings::from_env`] (the variables the platform sets
/// when it launches a service) or from a YAML file for local runs:
///
/// ```yaml
/// server_channel: svc-server
/// client_channel: svc-client
/// heartbeat_seconds: 60
/// session_log_dir: log
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Channel commands arrive on (`TC_SERVER_CHANNEL`)
    pub server_channel: String,
    /// Channel acks, events and heartbeats are published to (`TC_CLIENT_CHANNEL`)
    pub client_channel: String,
    /// Heartbeat interval in seconds (`TC_HEARTBEAT_SECONDS`, default 60)
    pub heartbeat_seconds: u64,
    /// Key/value store backing playbook data (`TC_PLAYBOOK_DB_*`)
    pub playbook_db: PlaybookDb,
    /// One log file per webhook session when set (`TC_SESSION_LOG_DIR`)
    pub session_log_dir: Option<PathBuf>,
}

/// Connection settings of the playbook key/value store.
///
/// The dispatcher does not talk to the store itself; hosting code uses these
/// to build the transport handed to [`Service`](super::Service).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PlaybookDb {
    pub db_type: String,
    pub path: String,
    pub port: u16,
    pub context: Option<String>,
}

impl Default for PlaybookDb {
    fn default() -> Self {
        Self {
            db_type: "Redis".to_string(),
            path: "localhost".to_string(),
            port: 6379,
            context: None,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            server_channel: String::new(),
            client_channel: String::new(),
            heartbeat_seconds: 60,
            playbook_db: PlaybookDb::default(),
            session_log_dir: None,
        }
    }
}

impl ServiceSettings {
    /// Load settings from environment variables, defaults for the rest.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let db_defaults = PlaybookDb::default();
        Self {
            server_channel: env::var("TC_SERVER_CHANNEL").unwrap_or_default(),
            client_channel: env::var("TC_CLIENT_CHANNEL").unwrap_or_default(),
            heartbeat_seconds: env::var("TC_HEARTBEAT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.heartbeat_seconds),
            playbook_db: PlaybookDb {
                db_type: env::var("TC_PLAYBOOK_DB_TYPE").unwrap_or(db_defaults.db_type),
                path: env::var("TC_PLAYBOOK_DB_PATH").unwrap_or(db_defaults.path),
                port: env::var("TC_PLAYBOOK_DB_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(db_defaults.port),
                context: env::var("TC_PLAYBOOK_DB_CONTEXT").ok(),
            },
            session_log_dir: env::var("TC_SESSION_LOG_DIR").ok().map(PathBuf::from),
        }
    }

    /// Load settings from a YAML file; missing keys take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path).map_err(|e| ServiceError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ServiceError::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_seconds.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.yaml");
        std::fs::write(
            &path,
            "server_channel: in\nclient_channel: out\nplaybook_db:\n  port: 6380\n",
        )
        .unwrap();
        let settings = ServiceSettings::from_yaml_file(&path).unwrap();
        assert_eq!(settings.server_channel, "in");
        assert_eq!(settings.heartbeat_seconds, 60);
        assert_eq!(settings.playbook_db.port, 6380);
        assert_eq!(settings.playbook_db.db_type, "Redis");
    }

    #[test]
    fn missing_file_is_a_settings_error() {
        let err = ServiceSettings::from_yaml_file(Path::new("/nonexistent/service.yaml"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Settings { .. }));
    }
}
