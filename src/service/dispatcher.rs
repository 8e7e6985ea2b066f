use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, trace, warn};

use super::command::{
    Ack, AckType, Command, OutboundEvent, Reply, RunServiceEvent, WebhookEvent,
};
use super::metrics::ServiceMetrics;
use super::pubsub::PubSub;
use super::settings::ServiceSettings;
use super::ServiceError;
use crate::ids::SessionId;
use crate::logging::with_session_log;

/// Lifecycle of a [`Service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Subscribed,
    ShuttingDown,
    Terminated,
}

/// What a webhook callback gets to decide whether to fire.
#[derive(Debug)]
pub struct WebhookContext<'a> {
    pub session_id: SessionId,
    pub config_id: &'a str,
    pub config: &'a Value,
    pub event: &'a WebhookEvent,
}

/// What a run-service callback gets for one tracked config.
#[derive(Debug)]
pub struct RunServiceContext<'a> {
    pub config_id: &'a str,
    pub config: &'a Value,
    pub event: &'a RunServiceEvent,
}

type WebhookFn = Box<dyn FnMut(&WebhookContext<'_>) -> anyhow::Result<bool> + Send>;
type RunServiceFn = Box<dyn FnMut(&RunServiceContext<'_>) -> anyhow::Result<()> + Send>;
type ConfigFn = Box<dyn FnMut(&str, &Value) + Send>;
type DeleteFn = Box<dyn FnMut(&str) + Send>;
type ShutdownFn = Box<dyn FnMut() + Send>;

/// Callbacks a service registers; all optional.
#[derive(Default)]
pub struct ServiceHandlers {
    webhook: Option<WebhookFn>,
    run_service: Option<RunServiceFn>,
    create_config: Option<ConfigFn>,
    update_config: Option<ConfigFn>,
    delete_config: Option<DeleteFn>,
    shutdown: Option<ShutdownFn>,
}

impl ServiceHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide per tracked config whether a webhook event fires a playbook.
    ///
    /// `Ok(true)` counts a hit and publishes `FireEvent`; `Ok(false)`, an error
    /// or a panic count a miss.
    pub fn on_webhook(
        mut self,
        f: impl FnMut(&WebhookContext<'_>) -> anyhow::Result<bool> + Send + 'static,
    ) -> Self {
        self.webhook = Some(Box::new(f));
        self
    }

    pub fn on_run_service(
        mut self,
        f: impl FnMut(&RunServiceContext<'_>) -> anyhow::Result<()> + Send + 'static,
    ) -> Self {
        self.run_service = Some(Box::new(f));
        self
    }

    pub fn on_create_config(mut self, f: impl FnMut(&str, &Value) + Send + 'static) -> Self {
        self.create_config = Some(Box::new(f));
        self
    }

    pub fn on_update_config(mut self, f: impl FnMut(&str, &Value) + Send + 'static) -> Self {
        self.update_config = Some(Box::new(f));
        self
    }

    pub fn on_delete_config(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.delete_config = Some(Box::new(f));
        self
    }

    pub fn on_shutdown(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.shutdown = Some(Box::new(f));
        self
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Background thread publishing `Heartbeat` messages until stopped.
#[derive(Debug)]
pub struct Heartbeat {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Heartbeat {
    pub fn start<P: PubSub>(
        broker: Arc<P>,
        channel: String,
        interval: Duration,
        metrics: Arc<ServiceMetrics>,
    ) -> Result<Self, ServiceError> {
        let (stop, stopped) = mpsc::channel::<()>();
        info!(interval_secs = interval.as_secs_f64(), "Starting heartbeat thread");
        let handle = std::thread::Builder::new()
            .name("tcv3-heartbeat".to_string())
            .spawn(move || loop {
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let metric = metrics.snapshot();
                        let message = Reply::Event(OutboundEvent::Heartbeat { metric });
                        match serde_json::to_string(&message) {
                            Ok(text) => {
                                if let Err(e) = broker.publish(&channel, &text) {
                                    warn!(error = %e, "Heartbeat publish failed");
                                } else {
                                    info!(hits = metric.hits, misses = metric.misses, "Heartbeat sent");
                                }
                            }
                            Err(e) => error!(error = %e, "Heartbeat encoding failed"),
                        }
                    }
                    // stop requested or the service is gone
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(ServiceError::Spawn)?;
        Ok(Self { stop, handle })
    }

    pub fn stop(self) {
        if self.stop.send(()).is_err() {
            debug!("Heartbeat thread already stopped");
        }
        if self.handle.join().is_err() {
            error!("Heartbeat thread panicked");
        }
    }
}

/// Pub/sub command dispatcher for trigger and API services.
///
/// Commands arrive on the server channel and are handled one at a time on
/// the dispatch thread; replies go to the client channel. Only the dispatch
/// thread touches the config map; the heartbeat thread reads the metric
/// counters.
pub struct Service<P: PubSub> {
    broker: Arc<P>,
    settings: ServiceSettings,
    handlers: ServiceHandlers,
    configs: BTreeMap<String, Value>,
    metrics: Arc<ServiceMetrics>,
    state: ServiceState,
}

impl<P: PubSub> Service<P> {
    pub fn new(broker: Arc<P>, settings: ServiceSettings, handlers: ServiceHandlers) -> Self {
        Self {
            broker,
            settings,
            handlers,
            configs: BTreeMap::new(),
            metrics: Arc::new(ServiceMetrics::new()),
            state: ServiceState::Idle,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn configs(&self) -> &BTreeMap<String, Value> {
        &self.configs
    }

    pub fn metrics(&self) -> Arc<ServiceMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    fn publish<T: Serialize>(&self, message: &T) {
        let text = match serde_json::to_string(message) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to encode reply");
                return;
            }
        };
        debug!(channel = %self.settings.client_channel, message = %text, "Publishing");
        if let Err(e) = self.broker.publish(&self.settings.client_channel, &text) {
            error!(error = %e, channel = %self.settings.client_channel, "Publish failed");
        }
    }

    fn ack(&self, ack_type: AckType, config_id: Option<&str>) {
        self.publish(&Reply::Ack(Ack::new(ack_type, config_id)));
    }

    /// Decode and handle one raw message from the server channel.
    ///
    /// Malformed messages and messages without a known `command` are logged
    /// and dropped without an ack. Returns the state after handling.
    pub fn handle_message(&mut self, raw: &str) -> ServiceState {
        trace!(message = %raw, "Received message");
        match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.handle_command(command),
            Err(e) => warn!(error = %e, message = %raw, "Dropping malformed message"),
        }
        self.state
    }

    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::CreateConfig { config_id, config } => {
                if self.configs.contains_key(&config_id) {
                    warn!(config_id = %config_id, "CreateConfig for an already tracked config, replacing it");
                }
                info!(config_id = %config_id, "Create config");
                self.configs.insert(config_id.clone(), config.clone());
                self.ack(AckType::CreateConfig, Some(&config_id));
                if let Some(f) = self.handlers.create_config.as_mut() {
                    f(&config_id, &config);
                }
            }
            Command::UpdateConfig { config_id, config } => {
                info!(config_id = %config_id, "Update config");
                self.configs.insert(config_id.clone(), config.clone());
                self.ack(AckType::UpdateConfig, Some(&config_id));
                if let Some(f) = self.handlers.update_config.as_mut() {
                    f(&config_id, &config);
                }
            }
            Command::DeleteConfig { config_id } => {
                if self.configs.remove(&config_id).is_none() {
                    error!(
                        config_id = %config_id,
                        "ConfigOperationError: delete of unknown config"
                    );
                    return;
                }
                info!(config_id = %config_id, "Delete config");
                self.ack(AckType::DeleteConfig, Some(&config_id));
                if let Some(f) = self.handlers.delete_config.as_mut() {
                    f(&config_id);
                }
            }
            Command::WebHookEvent(event) => self.handle_webhook(&event),
            Command::RunService(event) => self.handle_run_service(&event),
            Command::Shutdown => {
                info!("A shutdown command was received on server channel. Service is shutting down.");
                if let Some(f) = self.handlers.shutdown.as_mut() {
                    f();
                }
                self.ack(AckType::Shutdown, None);
                self.state = ServiceState::ShuttingDown;
            }
        }
    }

    fn handle_webhook(&mut self, event: &WebhookEvent) {
        // Held outside `self.handlers` so each FireEvent can be published
        // before the next config's callback runs.
        let Some(mut callback) = self.handlers.webhook.take() else {
            warn!("WebHookEvent received but no webhook callback registered");
            return;
        };
        for (config_id, config) in &self.configs {
            let session_id = SessionId::new();
            let ctx = WebhookContext {
                session_id,
                config_id,
                config,
                event,
            };
            let mut invoke = || {
                trace!(config_id = %config_id, session_id = %session_id, "Trigger callback");
                catch_unwind(AssertUnwindSafe(|| callback(&ctx)))
            };
            let outcome = match &self.settings.session_log_dir {
                Some(dir) => with_session_log(dir, &session_id.to_string(), invoke),
                None => invoke(),
            };
            match outcome {
                Ok(Ok(true)) => {
                    self.metrics.record_hit();
                    self.publish(&Reply::Event(OutboundEvent::FireEvent {
                        config_id: config_id.clone(),
                        request_key: event.request_key.clone(),
                        session_id,
                    }));
                }
                Ok(Ok(false)) => self.metrics.record_miss(),
                Ok(Err(e)) => {
                    error!(config_id = %config_id, session_id = %session_id, error = %e, "CallbackFault: webhook callback failed");
                    self.metrics.record_miss();
                }
                Err(panic) => {
                    error!(
                        config_id = %config_id,
                        session_id = %session_id,
                        panic_message = %panic_message(panic.as_ref()),
                        "CallbackFault: webhook callback panicked"
                    );
                    self.metrics.record_miss();
                }
            }
        }
        self.handlers.webhook = Some(callback);
    }

    fn handle_run_service(&mut self, event: &RunServiceEvent) {
        let Some(callback) = self.handlers.run_service.as_mut() else {
            warn!("RunService received but no run-service callback registered");
            return;
        };
        for (config_id, config) in &self.configs {
            let ctx = RunServiceContext {
                config_id,
                config,
                event,
            };
            match catch_unwind(AssertUnwindSafe(|| callback(&ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(config_id = %config_id, error = %e, "CallbackFault: run-service callback failed")
                }
                Err(panic) => error!(
                    config_id = %config_id,
                    panic_message = %panic_message(panic.as_ref()),
                    "CallbackFault: run-service callback panicked"
                ),
            }
        }
    }

    /// Subscribe to the server channel and dispatch until `Shutdown` arrives
    /// or the transport closes.
    ///
    /// A heartbeat thread runs for the duration and is stopped before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Fails if no server channel is configured, the subscription cannot be
    /// made, or the heartbeat thread cannot be spawned.
    pub fn run(&mut self) -> Result<(), ServiceError> {
        if self.settings.server_channel.is_empty() {
            return Err(ServiceError::NoServerChannel);
        }
        let subscription = self.broker.subscribe(&self.settings.server_channel)?;
        self.state = ServiceState::Subscribed;
        info!(channel = %self.settings.server_channel, "Subscribed to server channel");

        let heartbeat = Heartbeat::start(
            Arc::clone(&self.broker),
            self.settings.client_channel.clone(),
            self.settings.heartbeat_interval(),
            Arc::clone(&self.metrics),
        )?;

        while let Some(message) = subscription.recv() {
            if self.handle_message(&message) == ServiceState::ShuttingDown {
                break;
            }
        }

        subscription.unsubscribe();
        heartbeat.stop();
        self.state = ServiceState::Terminated;
        info!("Service terminated");
        Ok(())
    }

    /// Run the dispatch loop on its own thread.
    ///
    /// The service is handed back when the loop ends so its final state and
    /// configs can be inspected.
    pub fn custom_trigger(mut self) -> Result<JoinHandle<Result<Self, ServiceError>>, ServiceError> {
        std::thread::Builder::new()
            .name("tcv3-service".to_string())
            .spawn(move || {
                self.run()?;
                Ok(self)
            })
            .map_err(ServiceError::Spawn)
    }
}
