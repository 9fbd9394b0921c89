//! End-to-end tests driving the router with a scripted text model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration as ChronoDuration, Utc};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use notebook_server::ai::{AiGateway, SharedModel, TextModel};
use notebook_server::schema::{ContentMode, FileFormat, FileRecord, FileStatus};
use notebook_server::server::{self, AppState};
use notebook_server::storage::FileStorage;
use notebook_server::store::MemoryStore;

/// Always replies with the same text.
struct ScriptedModel(String);

#[async_trait]
impl TextModel for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Always fails at the transport level.
struct FailingModel;

#[async_trait]
impl TextModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("model unreachable")
    }
}

/// Replies with fixed text and records every prompt it sees.
struct RecordingModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextModel for RecordingModel {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

const ANALYSIS_REPLY: &str =
    "```json\n{\"summary\": \"Quarterly sales data.\", \"tags\": [\"finance\", \"data\"]}\n```";

async fn test_app(model: SharedModel) -> (Router, AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path()));
    storage.init().await.unwrap();

    let state = AppState {
        files: Arc::new(MemoryStore::new()),
        sessions: Arc::new(MemoryStore::new()),
        gateway: Arc::new(AiGateway::new(model)),
        storage,
    };
    (server::router(state.clone()), state, dir)
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn multipart_upload(filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/files/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Poll the file detail route until the status leaves `analyzing`.
async fn wait_for_settled(app: &Router, id: &str) -> Value {
    for _ in 0..200 {
        let response = app.clone().oneshot(get(&format!("/api/files/{id}"))).await.unwrap();
        let body = body_json(response).await;
        if body["data"]["status"] != "analyzing" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("file {id} never left analyzing");
}

fn chat_message(role: &str, content: &str) -> Value {
    json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "role": role,
        "content": content,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

fn seed_file(state: &AppState, id: &str, name: &str, tags: &[&str], summary: &str, age_mins: i64) {
    let record = FileRecord {
        id: id.to_string(),
        name: name.to_string(),
        format: FileFormat::Csv,
        size: "1.0 KB".to_string(),
        uploaded_at: Utc::now() - ChronoDuration::minutes(age_mins),
        summary: summary.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        file_path: state.storage.base_dir().join(format!("{id}.csv")),
        content_mode: ContentMode::Summary,
        status: FileStatus::Ready,
        error_message: None,
        content: Some(format!("parsed content of {name}")),
    };
    state.files.insert(id.to_string(), record);
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Enterprise NotebookLM API is running");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_route_gets_enveloped_404() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    let response = app.oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn upload_rejects_unsupported_extension_before_any_record() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel(ANALYSIS_REPLY.into()))).await;

    let response = app
        .clone()
        .oneshot(multipart_upload("evil.exe", b"MZ"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains(".exe"));

    let listing = body_json(app.oneshot(get("/api/files")).await.unwrap()).await;
    assert_eq!(listing["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn upload_answers_202_then_reaches_ready() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel(ANALYSIS_REPLY.into()))).await;

    let response = app
        .clone()
        .oneshot(multipart_upload("sales.csv", b"region,revenue\nEU,100\nUS,200\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "analyzing");
    assert_eq!(body["data"]["name"], "sales.csv");
    assert_eq!(body["data"]["format"], "csv");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let settled = wait_for_settled(&app, &id).await;
    assert_eq!(settled["data"]["status"], "ready");
    assert_eq!(settled["data"]["summary"], "Quarterly sales data.");
    let tags = settled["data"]["tags"].as_array().unwrap();
    assert!(!tags.is_empty() && tags.len() <= 10);

    let content = body_json(
        app.oneshot(get(&format!("/api/files/{id}/content"))).await.unwrap(),
    )
    .await;
    let text = content["data"]["content"].as_str().unwrap();
    assert!(text.contains("CSV File with 2 rows and 2 columns."));
    assert!(text.contains("Row 1: EU | 100"));
}

#[tokio::test]
async fn upload_records_error_when_analysis_fails() {
    let (app, _, _dir) = test_app(Arc::new(FailingModel)).await;

    let response = app
        .clone()
        .oneshot(multipart_upload("sales.csv", b"a,b\n1,2\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let id = body_json(response).await["data"]["id"].as_str().unwrap().to_string();

    let settled = wait_for_settled(&app, &id).await;
    assert_eq!(settled["data"]["status"], "error");
    let message = settled["data"]["errorMessage"].as_str().unwrap();
    assert!(message.contains("AI analysis failed"));
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    let boundary = "b";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/files/upload")
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn listing_filters_by_tag_and_search_and_sorts_newest_first() {
    let (app, state, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    seed_file(&state, "f1", "budget.csv", &["finance"], "annual budget", 30);
    seed_file(&state, "f2", "hiring.csv", &["HR"], "hiring plan", 20);
    seed_file(&state, "f3", "q3.csv", &["finance", "data"], "q3 numbers", 10);

    let all = body_json(app.clone().oneshot(get("/api/files")).await.unwrap()).await;
    let names: Vec<&str> = all["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["q3.csv", "hiring.csv", "budget.csv"]);

    let finance =
        body_json(app.clone().oneshot(get("/api/files?tags=finance")).await.unwrap()).await;
    assert_eq!(finance["data"].as_array().unwrap().len(), 2);

    let either =
        body_json(app.clone().oneshot(get("/api/files?tags=HR,data")).await.unwrap()).await;
    assert_eq!(either["data"].as_array().unwrap().len(), 2);

    let search =
        body_json(app.clone().oneshot(get("/api/files?search=HIRING")).await.unwrap()).await;
    let found = search["data"].as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "hiring.csv");
}

#[tokio::test]
async fn delete_removes_listing_entry_and_orphaned_tags() {
    let (app, state, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    seed_file(&state, "f1", "budget.csv", &["finance", "data"], "", 10);
    seed_file(&state, "f2", "metrics.csv", &["data"], "", 5);

    let tags = body_json(app.clone().oneshot(get("/api/files/tags/all")).await.unwrap()).await;
    assert_eq!(tags["data"], json!(["data", "finance"]));

    let response = app.clone().oneshot(delete("/api/files/f1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let listing = body_json(app.clone().oneshot(get("/api/files")).await.unwrap()).await;
    assert_eq!(listing["data"].as_array().unwrap().len(), 1);

    let tags = body_json(app.clone().oneshot(get("/api/files/tags/all")).await.unwrap()).await;
    assert_eq!(tags["data"], json!(["data"]));

    let response = app.oneshot(delete("/api/files/f1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_detail_404_for_unknown_id() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    let response = app.oneshot(get("/api/files/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "File not found");
}

#[tokio::test]
async fn chat_skips_unknown_ids_and_uses_summaries() {
    let model = RecordingModel::new("EU grew fastest.");
    let (app, state, _dir) = test_app(model.clone()).await;
    seed_file(&state, "f1", "sales.csv", &["finance"], "sales by region", 5);

    let request = post_json(
        "/api/chat",
        &json!({
            "message": "Which region grew fastest?",
            "contextFileIds": ["f1", "does-not-exist"],
            "contextType": "summary",
        }),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], "assistant");
    assert_eq!(body["data"]["content"], "EU grew fastest.");
    assert_eq!(body["data"]["contextFiles"], json!(["f1", "does-not-exist"]));

    let prompts = model.prompts.lock();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("--- File 1: sales.csv ---"));
    assert!(prompts[0].contains("sales by region"));
    assert!(!prompts[0].contains("--- File 2:"));
}

#[tokio::test]
async fn chat_full_mode_feeds_parsed_content() {
    let model = RecordingModel::new("ok");
    let (app, state, _dir) = test_app(model.clone()).await;
    seed_file(&state, "f1", "sales.csv", &[], "short summary", 5);

    let request = post_json(
        "/api/chat",
        &json!({
            "message": "details please",
            "contextFileIds": ["f1"],
            "contextType": "full",
        }),
    );
    app.oneshot(request).await.unwrap();

    let prompts = model.prompts.lock();
    assert!(prompts[0].contains("parsed content of sales.csv"));
}

#[tokio::test]
async fn chat_requires_a_message() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    let response = app
        .oneshot(post_json("/api/chat", &json!({ "message": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Message is required");
}

#[tokio::test]
async fn chat_transport_failure_is_a_500() {
    let (app, _, _dir) = test_app(Arc::new(FailingModel)).await;
    let response = app
        .oneshot(post_json("/api/chat", &json!({ "message": "hello" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("AI chat failed"));
}

#[tokio::test]
async fn export_markdown_and_docx_relabel() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;
    let messages = json!([
        chat_message("user", "What happened in Q3?"),
        chat_message("assistant", "Revenue grew 12%."),
    ]);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/chat/export",
            &json!({ "messages": messages, "format": "markdown", "sessionName": "q3" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["mimeType"], "text/markdown");
    assert!(body["data"]["filename"].as_str().unwrap().ends_with(".md"));
    let content = body["data"]["content"].as_str().unwrap();
    assert!(content.starts_with("# q3"));
    assert!(content.contains("**User**:\n\nWhat happened in Q3?"));
    assert!(content.contains("**AI Assistant**:\n\nRevenue grew 12%."));

    let response = app
        .oneshot(post_json(
            "/api/chat/export",
            &json!({ "messages": messages, "format": "docx" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["mimeType"],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert!(body["data"]["filename"].as_str().unwrap().ends_with(".docx"));
    // Relabeled, not converted: still Markdown.
    assert!(body["data"]["content"].as_str().unwrap().starts_with("# Conversation"));
}

#[tokio::test]
async fn export_guards_empty_conversations_and_bad_formats() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/chat/export",
            &json!({ "messages": [], "format": "markdown" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Messages are required");

    let response = app
        .oneshot(post_json(
            "/api/chat/export",
            &json!({ "messages": [chat_message("user", "hi")], "format": "pdf" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid format"));
}

#[tokio::test]
async fn session_save_round_trip() {
    let (app, _, dir) = test_app(Arc::new(ScriptedModel(ANALYSIS_REPLY.into()))).await;
    let messages = json!([
        chat_message("user", "Summarize the budget."),
        chat_message("assistant", "It is balanced."),
        chat_message("user", "Thanks."),
    ]);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/sessions",
            &json!({ "name": "Budget review", "messages": messages, "contextFileIds": ["f1"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], "Budget review.md");
    assert_eq!(body["data"]["summary"], "Quarterly sales data.");
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();
    let file_id = body["data"]["fileId"].as_str().unwrap().to_string();

    let session = body_json(
        app.clone()
            .oneshot(get(&format!("/api/sessions/{session_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(session["data"]["messages"].as_array().unwrap().len(), 3);
    assert_eq!(session["data"]["contextFileIds"], json!(["f1"]));

    let file = body_json(
        app.clone()
            .oneshot(get(&format!("/api/files/{file_id}")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(file["data"]["format"], "markdown");
    assert_eq!(file["data"]["status"], "ready");

    let transcript_path = dir.path().join(format!("session_{session_id}.md"));
    let on_disk = std::fs::read_to_string(transcript_path).unwrap();
    assert!(on_disk.starts_with("# Budget review"));
    assert!(on_disk.contains("## Summary"));
    assert!(on_disk.contains("It is balanced."));
}

#[tokio::test]
async fn session_summary_failure_degrades_to_default() {
    let (app, _, _dir) = test_app(Arc::new(FailingModel)).await;
    let response = app
        .oneshot(post_json(
            "/api/sessions",
            &json!({ "name": "Broken", "messages": [chat_message("user", "hi")] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["summary"], "Conversation session");
    assert_eq!(body["data"]["tags"], json!(["conversation", "analysis"]));
}

#[tokio::test]
async fn session_save_requires_name_and_messages() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel("".into()))).await;

    let response = app
        .clone()
        .oneshot(post_json("/api/sessions", &json!({ "name": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json(
            "/api/sessions",
            &json!({ "name": "", "messages": [] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sessions_list_newest_first_with_counts() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel(ANALYSIS_REPLY.into()))).await;

    for name in ["first", "second"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/sessions",
                &json!({ "name": name, "messages": [chat_message("user", "hi")] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let body = body_json(app.oneshot(get("/api/sessions")).await.unwrap()).await;
    let sessions = body["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["name"], "second");
    assert_eq!(sessions[0]["messageCount"], 1);
}

#[tokio::test]
async fn session_delete_then_404() {
    let (app, _, _dir) = test_app(Arc::new(ScriptedModel(ANALYSIS_REPLY.into()))).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/sessions",
            &json!({ "name": "temp", "messages": [chat_message("user", "hi")] }),
        ))
        .await
        .unwrap();
    let session_id = body_json(response).await["data"]["sessionId"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/sessions/{session_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);

    let response = app
        .oneshot(delete(&format!("/api/sessions/{session_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Session not found");
}
