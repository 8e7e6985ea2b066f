#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tcv3::service::{
    MemoryBroker, PubSub, Service, ServiceError, ServiceHandlers, ServiceSettings, ServiceState,
};

const SERVER: &str = "svc-server";
const CLIENT: &str = "svc-client";
const WAIT: Duration = Duration::from_secs(5);

fn settings() -> ServiceSettings {
    ServiceSettings {
        server_channel: SERVER.to_string(),
        client_channel: CLIENT.to_string(),
        heartbeat_seconds: 3600,
        ..Default::default()
    }
}

fn next_reply(sub: &tcv3::service::Subscription) -> Value {
    serde_json::from_str(&sub.recv_timeout(WAIT).unwrap()).unwrap()
}

fn create(id: &str) -> String {
    json!({"command": "CreateConfig", "configId": id, "config": {"name": id}}).to_string()
}

fn webhook(key: &str) -> String {
    json!({"command": "WebHookEvent", "requestKey": key, "method": "POST"}).to_string()
}

#[test]
fn test_config_lifecycle_is_acknowledged() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let mut service = Service::new(Arc::clone(&broker), settings(), ServiceHandlers::new());

    service.handle_message(&create("7"));
    assert_eq!(
        next_reply(&client),
        json!({"status": "Acknowledged", "type": "CreateConfig", "configId": "7"})
    );

    service.handle_message(
        &json!({"command": "UpdateConfig", "configId": "7", "config": {"name": "new"}}).to_string(),
    );
    assert_eq!(next_reply(&client)["type"], "UpdateConfig");
    assert_eq!(service.configs()["7"], json!({"name": "new"}));

    service.handle_message(&json!({"command": "DeleteConfig", "configId": "7"}).to_string());
    assert_eq!(next_reply(&client)["type"], "DeleteConfig");
    assert!(service.configs().is_empty());
}

#[test]
fn test_delete_of_unknown_config_sends_no_ack() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let mut service = Service::new(Arc::clone(&broker), settings(), ServiceHandlers::new());

    service.handle_message(&json!({"command": "DeleteConfig", "configId": "nope"}).to_string());
    assert!(client.try_recv().is_none());
    assert_eq!(service.state(), ServiceState::Idle);
}

#[test]
fn test_create_then_double_delete_acks_twice() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let mut service = Service::new(Arc::clone(&broker), settings(), ServiceHandlers::new());

    let delete = json!({"command": "DeleteConfig", "configId": "c1"}).to_string();
    service.handle_message(&create("c1"));
    service.handle_message(&delete);
    service.handle_message(&delete);

    assert_eq!(next_reply(&client)["type"], "CreateConfig");
    assert_eq!(next_reply(&client)["type"], "DeleteConfig");
    assert!(client.try_recv().is_none());
    assert_eq!(service.state(), ServiceState::Idle);
}

#[test]
fn test_malformed_messages_are_dropped() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let mut service = Service::new(Arc::clone(&broker), settings(), ServiceHandlers::new());

    service.handle_message(r#"{"foo":"bar"}"#);
    service.handle_message("not json");
    service.handle_message(r#"{"configId": "1"}"#);
    service.handle_message(r#"{"command": "Explode"}"#);
    assert!(client.try_recv().is_none());
    assert!(service.configs().is_empty());
}

#[test]
fn test_webhook_hits_fire_events_and_count() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let handlers = ServiceHandlers::new().on_webhook(|ctx| Ok(ctx.config_id == "a"));
    let mut service = Service::new(Arc::clone(&broker), settings(), handlers);

    service.handle_message(&create("a"));
    service.handle_message(&create("b"));
    next_reply(&client);
    next_reply(&client);

    service.handle_message(&webhook("req-1"));
    let fired = next_reply(&client);
    assert_eq!(fired["command"], "FireEvent");
    assert_eq!(fired["configId"], "a");
    assert_eq!(fired["requestKey"], "req-1");
    assert_eq!(fired["sessionId"].as_str().unwrap().len(), 26);
    assert!(client.try_recv().is_none());

    let metric = service.metrics().snapshot();
    assert_eq!((metric.hits, metric.misses), (1, 1));
}

#[test]
fn test_failing_callback_counts_as_miss() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let handlers = ServiceHandlers::new().on_webhook(|ctx| match ctx.config_id {
        "panics" => panic!("callback blew up"),
        "errors" => Err(anyhow::anyhow!("bad config")),
        _ => Ok(true),
    });
    let mut service = Service::new(Arc::clone(&broker), settings(), handlers);

    for id in ["errors", "ok", "panics"] {
        service.handle_message(&create(id));
        next_reply(&client);
    }
    service.handle_message(&webhook("req-2"));

    let fired = next_reply(&client);
    assert_eq!(fired["configId"], "ok");
    assert!(client.try_recv().is_none());
    let metric = service.metrics().snapshot();
    assert_eq!((metric.hits, metric.misses), (1, 2));
}

#[test]
fn test_run_service_reaches_every_config() {
    let broker = Arc::new(MemoryBroker::new());
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let handlers = ServiceHandlers::new().on_run_service(move |ctx| {
        assert_eq!(ctx.event.method.as_deref(), Some("GET"));
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let mut service = Service::new(Arc::clone(&broker), settings(), handlers);

    service.handle_message(&create("1"));
    service.handle_message(&create("2"));
    service.handle_message(&json!({"command": "RunService", "method": "GET"}).to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shutdown_ends_run_loop() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let shutdowns = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&shutdowns);
    let handlers = ServiceHandlers::new().on_shutdown(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let service = Service::new(Arc::clone(&broker), settings(), handlers);

    let handle = service.custom_trigger().unwrap();
    let deadline = std::time::Instant::now() + WAIT;
    while broker.subscriber_count(SERVER) == 0 {
        assert!(std::time::Instant::now() < deadline, "service never subscribed");
        std::thread::sleep(Duration::from_millis(10));
    }

    broker.publish(SERVER, &create("x")).unwrap();
    broker
        .publish(SERVER, &json!({"command": "Shutdown"}).to_string())
        .unwrap();

    let service = handle.join().unwrap().unwrap();
    assert_eq!(service.state(), ServiceState::Terminated);
    assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    assert_eq!(broker.subscriber_count(SERVER), 0);
    assert_eq!(next_reply(&client)["type"], "CreateConfig");
    assert_eq!(
        next_reply(&client),
        json!({"status": "Acknowledged", "type": "Shutdown"})
    );
}

#[test]
fn test_heartbeat_publishes_metrics() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let metrics = Arc::new(tcv3::service::ServiceMetrics::new());
    metrics.record_hit();
    let heartbeat = tcv3::service::Heartbeat::start(
        Arc::clone(&broker),
        CLIENT.to_string(),
        Duration::from_millis(20),
        Arc::clone(&metrics),
    )
    .unwrap();

    let beat = next_reply(&client);
    heartbeat.stop();
    assert_eq!(beat, json!({"command": "Heartbeat", "metric": {"hits": 1, "misses": 0}}));
}

#[test]
fn test_run_without_server_channel_fails() {
    let broker = Arc::new(MemoryBroker::new());
    let mut service = Service::new(
        broker,
        ServiceSettings::default(),
        ServiceHandlers::new(),
    );
    assert!(matches!(service.run(), Err(ServiceError::NoServerChannel)));
}

#[test]
fn test_session_logs_are_written_per_webhook() {
    let logs = tempfile::tempdir().unwrap();
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let handlers = ServiceHandlers::new().on_webhook(|_| {
        tracing::info!("evaluating trigger");
        Ok(true)
    });
    let mut svc_settings = settings();
    svc_settings.session_log_dir = Some(logs.path().to_path_buf());
    let mut service = Service::new(Arc::clone(&broker), svc_settings, handlers);

    service.handle_message(&create("1"));
    next_reply(&client);
    service.handle_message(&webhook("req-3"));
    let fired = next_reply(&client);
    let session_id = fired["sessionId"].as_str().unwrap();

    let log = std::fs::read_to_string(logs.path().join(format!("{session_id}.log"))).unwrap();
    assert!(log.contains("evaluating trigger"));
}

#[test]
fn test_fire_event_is_published_before_later_callbacks_finish() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let (entered_tx, entered) = std::sync::mpsc::channel::<()>();
    let (release, released) = std::sync::mpsc::channel::<()>();
    let handlers = ServiceHandlers::new().on_webhook(move |ctx| {
        if ctx.config_id == "c2" {
            entered_tx.send(()).unwrap();
            released.recv_timeout(WAIT).unwrap();
        }
        Ok(true)
    });
    let service = Service::new(Arc::clone(&broker), settings(), handlers);
    let handle = service.custom_trigger().unwrap();
    let deadline = std::time::Instant::now() + WAIT;
    while broker.subscriber_count(SERVER) == 0 {
        assert!(std::time::Instant::now() < deadline, "service never subscribed");
        std::thread::sleep(Duration::from_millis(10));
    }

    broker.publish(SERVER, &create("c1")).unwrap();
    broker.publish(SERVER, &create("c2")).unwrap();
    broker.publish(SERVER, &webhook("req-4")).unwrap();
    next_reply(&client);
    next_reply(&client);

    entered.recv_timeout(WAIT).unwrap();
    let first = next_reply(&client);
    assert_eq!(first["command"], "FireEvent");
    assert_eq!(first["configId"], "c1");

    release.send(()).unwrap();
    assert_eq!(next_reply(&client)["configId"], "c2");
    broker
        .publish(SERVER, &json!({"command": "Shutdown"}).to_string())
        .unwrap();
    let service = handle.join().unwrap().unwrap();
    assert_eq!(service.metrics().snapshot().hits, 2);
}

#[test]
fn test_unusable_session_log_dir_does_not_stop_dispatch() {
    let logs = tempfile::tempdir().unwrap();
    let blocker = logs.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let handlers = ServiceHandlers::new().on_webhook(|_| Ok(true));
    let mut svc_settings = settings();
    svc_settings.session_log_dir = Some(blocker.join("sessions"));
    let mut service = Service::new(Arc::clone(&broker), svc_settings, handlers);

    service.handle_message(&create("1"));
    next_reply(&client);
    service.handle_message(&webhook("req-5"));

    assert_eq!(next_reply(&client)["command"], "FireEvent");
    assert_eq!(service.metrics().snapshot().hits, 1);
    service.handle_message(&webhook("req-6"));
    assert_eq!(next_reply(&client)["requestKey"], "req-6");
}

#[test]
fn test_create_for_tracked_config_replaces_it() {
    let broker = Arc::new(MemoryBroker::new());
    let client = broker.subscribe(CLIENT).unwrap();
    let mut service = Service::new(Arc::clone(&broker), settings(), ServiceHandlers::new());
    let logs = common::log_capture::Captured::default();
    let mut config = tcv3::logging::LogConfig::default_dev();
    config.log_level = "warn".to_string();
    config.format = tcv3::logging::LogFormat::Json;

    tracing::subscriber::with_default(
        tcv3::logging::build_subscriber(&config, logs.clone()),
        || {
            service.handle_message(&create("dup"));
            service.handle_message(
                &json!({"command": "CreateConfig", "configId": "dup", "config": {"v": 2}})
                    .to_string(),
            );
        },
    );

    let logged = logs.contents();
    assert_eq!(logged.matches("already tracked").count(), 1);
    assert_eq!(next_reply(&client)["type"], "CreateConfig");
    assert_eq!(next_reply(&client)["type"], "CreateConfig");
    assert_eq!(service.configs().len(), 1);
    assert_eq!(service.configs()["dup"], json!({"v": 2}));
}
