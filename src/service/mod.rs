//! # Service Module
//!
//! Dispatcher for services that run under the platform's pub/sub control
//! plane: webhook triggers, custom triggers and API services.
//!
//! ## Message Flow
//!
//! ```text
//! server channel ──► Service::handle_message ──► callbacks
//!                           │
//! client channel ◄──────────┴── acks, FireEvent, Heartbeat
//! ```
//!
//! | command        | effect                                                   |
//! |----------------|----------------------------------------------------------|
//! | `CreateConfig` | track the config, ack, create callback                   |
//! | `UpdateConfig` | replace the config, ack, update callback                 |
//! | `DeleteConfig` | drop the config and ack; unknown ids are logged, no ack  |
//! | `WebHookEvent` | ask the webhook callback per config, `FireEvent` on hits |
//! | `RunService`   | run the API callback per config                          |
//! | `Shutdown`     | shutdown callback, ack, unsubscribe, stop heartbeat      |
//!
//! The transport is a [`PubSub`] implementation; [`MemoryBroker`] keeps
//! everything in-process.
//!
//! ```rust
//! use std::sync::Arc;
//! use tcv3::service::{MemoryBroker, PubSub, Service, ServiceHandlers, ServiceSettings};
//!
//! let broker = Arc::new(MemoryBroker::new());
//! let client = broker.subscribe("out").unwrap();
//! let settings = ServiceSettings {
//!     server_channel: "in".into(),
//!     client_channel: "out".into(),
//!     ..Default::default()
//! };
//! let mut service = Service::new(broker, settings, ServiceHandlers::new());
//! service.handle_message(r#"{"command": "CreateConfig", "configId": "1", "config": {}}"#);
//! assert!(client.try_recv().unwrap().contains("Acknowledged"));
//! ```

mod command;
mod dispatcher;
mod metrics;
mod pubsub;
mod settings;

use std::fmt;
use std::path::PathBuf;

pub use command::{
    Ack, AckType, Command, Metric, OutboundEvent, Reply, RunServiceEvent, WebhookEvent,
};
pub use dispatcher::{
    Heartbeat, RunServiceContext, Service, ServiceHandlers, ServiceState, WebhookContext,
};
pub use metrics::ServiceMetrics;
pub use pubsub::{MemoryBroker, PubSub, PubSubError, Subscription};
pub use settings::{PlaybookDb, ServiceSettings};

/// Errors that stop a service from starting or running.
#[derive(Debug)]
pub enum ServiceError {
    NoServerChannel,
    PubSub(PubSubError),
    Spawn(std::io::Error),
    Settings { path: PathBuf, message: String },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NoServerChannel => f.write_str("no server channel provided"),
            ServiceError::PubSub(e) => write!(f, "{e}"),
            ServiceError::Spawn(e) => write!(f, "failed to spawn service thread: {e}"),
            ServiceError::Settings { path, message } => {
                write!(f, "invalid service settings {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::PubSub(e) => Some(e),
            ServiceError::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PubSubError> for ServiceError {
    fn from(e: PubSubError) -> Self {
        ServiceError::PubSub(e)
    }
}
