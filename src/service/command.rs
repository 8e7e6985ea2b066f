use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::SessionId;

/// Commands received on the server channel.
///
/// Decoding is strict about the `command` tag: a message without it, or with
/// an unknown one, fails to decode and is dropped by the dispatcher.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    CreateConfig {
        config_id: String,
        #[serde(default)]
        config: Value,
    },
    #[serde(rename_all = "camelCase")]
    UpdateConfig {
        config_id: String,
        #[serde(default)]
        config: Value,
    },
    #[serde(rename_all = "camelCase")]
    DeleteConfig { config_id: String },
    RunService(RunServiceEvent),
    WebHookEvent(WebhookEvent),
    Shutdown,
}

/// An inbound HTTP request forwarded to webhook trigger services.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookEvent {
    /// Correlates the request with the playbook execution it fires
    pub request_key: Option<String>,
    pub method: Option<String>,
    pub headers: Value,
    pub query_params: Value,
    /// Reference to the stored request body
    pub body: Value,
}

/// An inbound request for API services.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunServiceEvent {
    pub method: Option<String>,
    pub headers: Value,
    pub query_params: Value,
    pub body_session_id: Option<String>,
    pub response_body_session_id: Option<String>,
}

/// Messages published on the client channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Ack(Ack),
    Event(OutboundEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AckType {
    CreateConfig,
    UpdateConfig,
    DeleteConfig,
    Shutdown,
}

/// `{"status": "Acknowledged", "type": ..., "configId": ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub ack_type: AckType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
}

impl Ack {
    pub fn new(ack_type: AckType, config_id: Option<&str>) -> Self {
        Self {
            status: "Acknowledged",
            ack_type,
            config_id: config_id.map(str::to_string),
        }
    }
}

/// Metric counters carried by a heartbeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    FireEvent {
        config_id: String,
        request_key: Option<String>,
        session_id: SessionId,
    },
    Heartbeat { metric: Metric },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_commands_by_tag() {
        let cmd: Command = serde_json::from_value(json!({
            "command": "CreateConfig", "configId": "c1", "config": {"a": 1}
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::CreateConfig {
                config_id: "c1".into(),
                config: json!({"a": 1})
            }
        );

        let cmd: Command = serde_json::from_value(json!({
            "command": "WebHookEvent", "requestKey": "rk", "method": "POST"
        }))
        .unwrap();
        match cmd {
            Command::WebHookEvent(event) => {
                assert_eq!(event.request_key.as_deref(), Some("rk"));
                assert_eq!(event.method.as_deref(), Some("POST"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_or_unknown_command() {
        assert!(serde_json::from_value::<Command>(json!({"foo": "bar"})).is_err());
        assert!(serde_json::from_value::<Command>(json!({"command": "Reboot"})).is_err());
    }

    #[test]
    fn encodes_replies() {
        let ack = Reply::Ack(Ack::new(AckType::DeleteConfig, Some("c1")));
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({"status": "Acknowledged", "type": "DeleteConfig", "configId": "c1"})
        );
        let shutdown = Reply::Ack(Ack::new(AckType::Shutdown, None));
        assert_eq!(
            serde_json::to_value(&shutdown).unwrap(),
            json!({"status": "Acknowledged", "type": "Shutdown"})
        );
        let heartbeat = Reply::Event(OutboundEvent::Heartbeat {
            metric: Metric { hits: 2, misses: 1 },
        });
        assert_eq!(
            serde_json::to_value(&heartbeat).unwrap(),
            json!({"command": "Heartbeat", "metric": {"hits": 2, "misses": 1}})
        );
    }
}
