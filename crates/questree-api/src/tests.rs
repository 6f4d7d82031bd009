//! Router tests driving `api_router` with in-memory requests.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use questree_core::{
  backend::QuestionnaireBackend,
  question::{NewQuestion, QuestionType},
  section::NewSection,
};
use questree_session::QuestionnaireStore;
use questree_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

type Store = Arc<QuestionnaireStore<SqliteStore>>;

async fn make_store() -> Store {
  let backend = SqliteStore::open_in_memory().await.unwrap();
  let store = QuestionnaireStore::new(backend);
  store.load().await.unwrap();
  Arc::new(store)
}

async fn send(
  store: &Store,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(json) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(json.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(store.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

async fn create_section(store: &Store, name: &str) -> i64 {
  let (status, body) =
    send(store, "POST", "/sections", Some(json!({ "name": name }))).await;
  assert_eq!(status, StatusCode::CREATED);
  body["id"].as_i64().unwrap()
}

async fn create_question(store: &Store, body: Value) -> i64 {
  let (status, body) = send(store, "POST", "/questions", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["id"].as_i64().unwrap()
}

// ── Sections ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sections_are_appended_and_listed_in_order() {
  let store = make_store().await;
  let (status, first) = send(
    &store,
    "POST",
    "/sections",
    Some(json!({ "name": "Intro", "description": "hello" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(first["order_index"], 0);
  assert_eq!(first["description"], "hello");

  create_section(&store, "Health").await;

  let (status, list) = send(&store, "GET", "/sections", None).await;
  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = list
    .as_array()
    .unwrap()
    .iter()
    .map(|s| s["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["Intro", "Health"]);
}

#[tokio::test]
async fn blank_section_name_is_rejected() {
  let store = make_store().await;
  let (status, body) =
    send(&store, "POST", "/sections", Some(json!({ "name": "  " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn missing_section_returns_404() {
  let store = make_store().await;
  let (status, body) =
    send(&store, "PATCH", "/sections/42", Some(json!({ "name": "x" }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());

  let (status, _) = send(&store, "DELETE", "/sections/42", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_and_delete_section() {
  let store = make_store().await;
  let id = create_section(&store, "Intro").await;

  let (status, body) = send(
    &store,
    "PATCH",
    &format!("/sections/{id}"),
    Some(json!({ "name": "Welcome", "description": null })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["name"], "Welcome");
  assert_eq!(body["description"], Value::Null);

  let (status, _) = send(&store, "DELETE", &format!("/sections/{id}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, list) = send(&store, "GET", "/sections", None).await;
  assert_eq!(list, json!([]));
}

#[tokio::test]
async fn reorder_sections_and_questions() {
  let store = make_store().await;
  let a = create_section(&store, "A").await;
  let b = create_section(&store, "B").await;

  let (status, _) =
    send(&store, "POST", "/sections/reorder", Some(json!({ "ids": [b, a] }))).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, list) = send(&store, "GET", "/sections", None).await;
  assert_eq!(list[0]["id"], b);

  let q1 = create_question(
    &store,
    json!({ "section_id": a, "text": "one", "type": "text" }),
  )
  .await;
  let q2 = create_question(
    &store,
    json!({ "section_id": a, "text": "two", "type": "text", "order_index": 1 }),
  )
  .await;

  let (status, _) = send(
    &store,
    "POST",
    &format!("/sections/{a}/reorder"),
    Some(json!({ "ids": [q2, q1] })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, tree) = send(&store, "GET", "/tree", None).await;
  assert_eq!(tree[0]["id"], b);
  let questions = &tree[1]["questions"];
  assert_eq!(questions[0]["id"], q2);
  assert_eq!(questions[1]["id"], q1);
}

// ── Questions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn question_subtree_visibility_and_delete() {
  let store = make_store().await;
  let section = create_section(&store, "Health").await;
  let parent = create_question(
    &store,
    json!({ "section_id": section, "text": "Smoker?", "type": "yes_no" }),
  )
  .await;
  let child = create_question(
    &store,
    json!({
      "section_id": section,
      "parent_id": parent,
      "text": "How many per day?",
      "type": "number",
      "condition": { "parent_value": "yes", "action": "show" },
    }),
  )
  .await;

  let (status, node) =
    send(&store, "GET", &format!("/questions/{parent}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(node["type"], "yesno");
  assert_eq!(node["children"][0]["id"], child);

  for (query, expected) in [("?answer=yes", true), ("?answer=no", false), ("", false)] {
    let (status, body) =
      send(&store, "GET", &format!("/questions/{child}/visible{query}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["visible"], expected, "answer query {query:?}");
  }
  let (_, body) =
    send(&store, "GET", &format!("/questions/{parent}/visible"), None).await;
  assert_eq!(body["visible"], true);

  let (status, deleted) =
    send(&store, "DELETE", &format!("/questions/{parent}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(deleted, json!([parent, child]));

  let (status, _) = send(&store, "GET", &format!("/questions/{child}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_question_clears_nullable_fields() {
  let store = make_store().await;
  let section = create_section(&store, "A").await;
  let id = create_question(
    &store,
    json!({ "section_id": section, "text": "Age", "type": "number", "notes": "years" }),
  )
  .await;

  let (status, body) = send(
    &store,
    "PATCH",
    &format!("/questions/{id}"),
    Some(json!({ "notes": null, "is_required": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["notes"], Value::Null);
  assert_eq!(body["is_required"], true);
  assert_eq!(body["text"], "Age");
}

#[tokio::test]
async fn create_question_with_unknown_placement_is_rejected() {
  let store = make_store().await;
  let section = create_section(&store, "A").await;

  let (status, _) = send(
    &store,
    "POST",
    "/questions",
    Some(json!({ "section_id": 999, "text": "q", "type": "text" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &store,
    "POST",
    "/questions",
    Some(json!({ "section_id": section, "parent_id": 999, "text": "q", "type": "text" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn move_question_between_sections() {
  let store = make_store().await;
  let from = create_section(&store, "From").await;
  let to = create_section(&store, "To").await;
  let parent = create_question(
    &store,
    json!({ "section_id": from, "text": "parent", "type": "group" }),
  )
  .await;
  let child = create_question(
    &store,
    json!({ "section_id": from, "parent_id": parent, "text": "child", "type": "text" }),
  )
  .await;

  let (status, body) = send(
    &store,
    "POST",
    &format!("/questions/{parent}/move"),
    Some(json!({ "parent_id": child, "section_id": from })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("cannot move"));

  let (status, _) = send(
    &store,
    "POST",
    &format!("/questions/{parent}/move"),
    Some(json!({ "section_id": to })),
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, tree) = send(&store, "GET", "/tree", None).await;
  assert_eq!(tree[0]["questions"], json!([]));
  assert_eq!(tree[1]["questions"][0]["id"], parent);
  assert_eq!(tree[1]["questions"][0]["children"][0]["section_id"], to);
}

#[tokio::test]
async fn patch_question_cannot_create_a_cycle() {
  let store = make_store().await;
  let section = create_section(&store, "A").await;
  let parent = create_question(
    &store,
    json!({ "section_id": section, "text": "parent", "type": "group" }),
  )
  .await;
  let child = create_question(
    &store,
    json!({ "section_id": section, "parent_id": parent, "text": "child", "type": "text" }),
  )
  .await;

  let (status, body) = send(
    &store,
    "PATCH",
    &format!("/questions/{parent}"),
    Some(json!({ "parent_id": child })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("cannot move"));

  let (status, tree) = send(&store, "GET", "/tree", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(tree[0]["questions"][0]["id"], parent);
  assert_eq!(tree[0]["questions"][0]["children"][0]["id"], child);
}

#[tokio::test]
async fn unknown_question_returns_404() {
  let store = make_store().await;
  for (method, uri) in [
    ("GET", "/questions/7"),
    ("DELETE", "/questions/7"),
    ("GET", "/questions/7/visible?answer=yes"),
  ] {
    let (status, body) = send(&store, method, uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    assert!(body["error"].is_string());
  }
}

// ── Tree ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn broken_structure_is_reported_as_conflict() {
  let store = make_store().await;
  let backend = store.backend();
  let a = backend
    .insert_section(NewSection { name: "A".into(), description: None, order_index: 0 })
    .await
    .unwrap();
  let b = backend
    .insert_section(NewSection { name: "B".into(), description: None, order_index: 1 })
    .await
    .unwrap();
  let parent = backend
    .insert_question(NewQuestion::new(a.id, "in A", QuestionType::Text))
    .await
    .unwrap();
  let mut stray = NewQuestion::new(b.id, "in B, parent in A", QuestionType::Text);
  stray.parent_id = Some(parent.id);
  backend.insert_question(stray).await.unwrap();
  store.load().await.unwrap();

  let (status, body) = send(&store, "GET", "/tree", None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].is_string());
}
