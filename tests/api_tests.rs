#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use common::mock_api::serve;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tcv3::api::{ApiError, ObjectCollection, ObjectItem, Session};
use tcv3::model::V3Model;
use tcv3::tql::{Tql, TqlOperator, TqlType};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TagModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl V3Model for TagModel {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    fn non_updatable() -> &'static [&'static str] {
        &["name"]
    }
}

const ENDPOINT: &str = "/v3/tags";

fn tag(id: i64, name: &str) -> Value {
    json!({"id": id, "name": name})
}

#[test]
fn test_submit_without_id_posts() {
    let (base, log, server) = serve(|_| vec![(
        201,
        json!({"data": tag(12, "malware"), "status": "Success"}).to_string(),
    )]);
    let session = Session::new(&base).unwrap();
    let mut item = ObjectItem::new(
        session,
        ENDPOINT,
        TagModel {
            name: Some("malware".into()),
            ..Default::default()
        },
    );

    item.submit().unwrap();
    server.join().unwrap();

    assert_eq!(item.model().id, Some(12));
    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "POST");
    assert_eq!(log[0].url, "/api/v3/tags");
    let sent: Value = serde_json::from_str(&log[0].body).unwrap();
    assert_eq!(sent, json!({"name": "malware"}));
}

#[test]
fn test_submit_with_id_puts_without_non_updatable_fields() {
    let (base, log, server) = serve(|_| vec![(
        200,
        json!({"data": {"id": 12, "name": "malware", "description": "bad"}}).to_string(),
    )]);
    let session = Session::new(&base).unwrap();
    let mut item = ObjectItem::new(
        session,
        ENDPOINT,
        TagModel {
            id: Some(12),
            name: Some("malware".into()),
            description: Some("bad".into()),
        },
    );

    item.submit().unwrap();
    server.join().unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "PUT");
    assert_eq!(log[0].url, "/api/v3/tags/12");
    let sent: Value = serde_json::from_str(&log[0].body).unwrap();
    assert_eq!(sent, json!({"id": 12, "description": "bad"}));
}

#[test]
fn test_get_requests_fields() {
    let (base, log, server) = serve(|_| vec![(
        200,
        json!({"data": {"id": 3, "name": "apt", "description": "group"}}).to_string(),
    )]);
    let session = Session::new(&base).unwrap().with_header("Authorization", "TC key");
    let mut item = ObjectItem::new(
        session,
        ENDPOINT,
        TagModel {
            id: Some(3),
            ..Default::default()
        },
    );

    let model = item.get(&["description"]).unwrap().clone();
    server.join().unwrap();

    assert_eq!(model.description.as_deref(), Some("group"));
    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "GET");
    assert_eq!(log[0].url, "/api/v3/tags/3?fields=description");
}

#[test]
fn test_get_without_id_is_an_error() {
    let session = Session::new("http://127.0.0.1:9/api").unwrap();
    let mut item = ObjectItem::new(session, ENDPOINT, TagModel::default());
    assert!(matches!(item.get(&[]), Err(ApiError::MissingId)));
}

#[test]
fn test_collection_follows_next_links() {
    let (base, log, server) = serve(|origin| {
        vec![
            (
                200,
                json!({
                    "data": [tag(1, "a"), tag(2, "b")],
                    "next": format!("{origin}/api/v3/tags?resultStart=2&resultLimit=2"),
                })
                .to_string(),
            ),
            (200, json!({"data": [tag(3, "c")]}).to_string()),
        ]
    });
    let session = Session::new(&base).unwrap();
    let collection = ObjectCollection::<TagModel>::new(session, ENDPOINT).result_limit(2);
    let mut tql = Tql::new();
    tql.add_filter("name", TqlOperator::Ne, "x".into(), TqlType::String)
        .unwrap();

    let ids: Vec<i64> = collection
        .iter(&tql)
        .map(|item| item.unwrap().id.unwrap())
        .collect();
    server.join().unwrap();

    assert_eq!(ids, vec![1, 2, 3]);
    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[0].url,
        "/api/v3/tags?tql=name+%21%3D+%22x%22&resultStart=0&resultLimit=2"
    );
    assert_eq!(log[1].url, "/api/v3/tags?resultStart=2&resultLimit=2");
}

#[test]
fn test_collection_error_ends_iteration() {
    let (base, _log, server) = serve(|_| vec![(401, r#"{"message": "denied"}"#.to_string())]);
    let session = Session::new(&base).unwrap();
    let collection = ObjectCollection::<TagModel>::new(session, ENDPOINT);

    let results: Vec<_> = collection.iter(&Tql::new()).collect();
    server.join().unwrap();

    assert_eq!(results.len(), 1);
    match &results[0] {
        Err(ApiError::Status { code, body }) => {
            assert_eq!(*code, 401);
            assert!(body.contains("denied"));
        }
        other => panic!("Expected status error, got {other:?}"),
    }
}
