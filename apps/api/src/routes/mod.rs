pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::shell::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        // File intake
        .route(
            "/api/v1/sessions/:id/resumes",
            post(handlers::handle_select_resumes),
        )
        .route(
            "/api/v1/sessions/:id/resumes/:index",
            delete(handlers::handle_remove_resume),
        )
        .route(
            "/api/v1/sessions/:id/job-description",
            post(handlers::handle_select_job_description),
        )
        .route(
            "/api/v1/sessions/:id/job-description/:index",
            delete(handlers::handle_remove_job_description),
        )
        // Processing and navigation
        .route("/api/v1/sessions/:id/process", post(handlers::handle_process))
        .route("/api/v1/sessions/:id/clear", post(handlers::handle_clear))
        .route("/api/v1/sessions/:id/view", put(handlers::handle_set_view))
        // Results and detail
        .route(
            "/api/v1/sessions/:id/records",
            get(handlers::handle_list_records),
        )
        .route(
            "/api/v1/sessions/:id/records/:record_id",
            get(handlers::handle_open_detail),
        )
        .route(
            "/api/v1/sessions/:id/records/:record_id/download",
            get(handlers::handle_download),
        )
        .route(
            "/api/v1/sessions/:id/detail",
            delete(handlers::handle_close_detail),
        )
        // Questions
        .route("/api/v1/sessions/:id/questions", post(handlers::handle_ask))
        .route(
            "/api/v1/sessions/:id/notifications",
            get(handlers::handle_notifications),
        )
        .layer(body_limit)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::{Config, QaBackend};
    use crate::detail::download::DownloadHandles;
    use crate::processing::MockProcessor;
    use crate::qa::MockAnswerer;
    use crate::shell::SessionStore;

    const BOUNDARY: &str = "cv-analyzer-test-boundary";

    fn test_state() -> AppState {
        AppState {
            config: Config {
                port: 0,
                rust_log: "debug".to_string(),
                max_upload_bytes: 1024 * 1024,
                processing_delay: Duration::ZERO,
                answer_delay: Duration::ZERO,
                qa_backend: QaBackend::Mock,
                anthropic_api_key: None,
                mock_seed: Some(11),
                session_ttl: Duration::from_secs(60),
            },
            sessions: SessionStore::new(),
            processor: Arc::new(MockProcessor::new(Duration::ZERO, Some(11))),
            answerer: Arc::new(MockAnswerer::new(Duration::ZERO)),
            downloads: DownloadHandles::new(),
        }
    }

    fn multipart(uri: &str, files: &[(&str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = send(app, empty(Method::POST, "/api/v1/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    /// Uploads three résumés and a job description, then processes them.
    async fn processed_session(app: &Router) -> String {
        let id = new_session(app).await;
        let uri = format!("/api/v1/sessions/{id}/resumes");
        send(
            app,
            multipart(&uri, &[("a.pdf", "A"), ("b.docx", "B"), ("c.doc", "C")]),
        )
        .await;
        let uri = format!("/api/v1/sessions/{id}/job-description");
        send(app, multipart(&uri, &[("jd.pdf", "JD")])).await;

        let (status, body) = send(app, empty(Method::POST, &format!("/api/v1/sessions/{id}/process"))).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        id
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state());
        let (status, body) = send(&app, empty(Method::GET, "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["processor"], "mock");
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_types_with_warning() {
        let app = build_router(test_state());
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            multipart(
                &format!("/api/v1/sessions/{id}/resumes"),
                &[("a.pdf", "A"), ("notes.txt", "N"), ("c.DOCX", "C")],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], 2);
        assert_eq!(body["rejected"], 1);
        assert_eq!(body["files"][0]["name"], "a.pdf");
        assert_eq!(body["files"][1]["name"], "c.DOCX");
        assert_eq!(body["notification"]["level"], "warning");
    }

    #[tokio::test]
    async fn test_job_description_selection_is_replaced() {
        let app = build_router(test_state());
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/job-description");

        send(&app, multipart(&uri, &[("old.pdf", "1")])).await;
        let (_, body) = send(&app, multipart(&uri, &[("new.pdf", "2"), ("extra.pdf", "3")])).await;

        let names: Vec<&str> = body["files"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["new.pdf", "extra.pdf"]);
    }

    #[tokio::test]
    async fn test_remove_out_of_range_is_validation_error() {
        let app = build_router(test_state());
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            empty(Method::DELETE, &format!("/api/v1/sessions/{id}/resumes/3")),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_process_without_resumes() {
        let app = build_router(test_state());
        let id = new_session(&app).await;

        let (status, body) = send(&app, empty(Method::POST, &format!("/api/v1/sessions/{id}/process"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Please upload at least one resume file");
    }

    #[tokio::test]
    async fn test_processing_with_job_description_ranks_and_bands() {
        let app = build_router(test_state());
        let id = processed_session(&app).await;

        let (_, session) = send(&app, empty(Method::GET, &format!("/api/v1/sessions/{id}"))).await;
        assert_eq!(session["view"], "results");
        assert_eq!(session["recordCount"], 3);
        assert_eq!(session["processing"], false);

        let (status, all) = send(&app, empty(Method::GET, &format!("/api/v1/sessions/{id}/records"))).await;
        assert_eq!(status, StatusCode::OK);
        let scores: Vec<u64> = all["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["fitmentScore"].as_u64().unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        let mut banded = 0;
        for band in ["highMatch", "mediumMatch", "lowMatch"] {
            let (_, body) = send(
                &app,
                empty(Method::GET, &format!("/api/v1/sessions/{id}/records?band={band}")),
            )
            .await;
            banded += body["records"].as_array().unwrap().len();
        }
        assert_eq!(banded, 3);
        assert_eq!(all["counts"]["all"], 3);
    }

    #[tokio::test]
    async fn test_results_view_requires_records() {
        let app = build_router(test_state());
        let id = new_session(&app).await;

        let (status, body) = send(
            &app,
            json_request(Method::PUT, &format!("/api/v1/sessions/{id}/view"), json!({ "view": "results" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "No results to display. Please upload and process files first."
        );
    }

    #[tokio::test]
    async fn test_detail_and_download_leave_records_untouched() {
        let app = build_router(test_state());
        let id = processed_session(&app).await;
        let records_uri = format!("/api/v1/sessions/{id}/records");

        let (_, before) = send(&app, empty(Method::GET, &records_uri)).await;
        let record = &before["records"][0];
        let record_id = record["id"].as_str().unwrap();

        let (status, detail) = send(
            &app,
            empty(Method::GET, &format!("{records_uri}/{record_id}")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["name"], record["name"]);
        assert!(detail["linkedinUrl"].as_str().unwrap().starts_with("https://linkedin.com/in/"));

        let (_, session) = send(&app, empty(Method::GET, &format!("/api/v1/sessions/{id}"))).await;
        assert_eq!(session["detail"]["state"], "open");
        assert_eq!(session["detail"]["recordId"], record_id);

        let resp = app
            .clone()
            .oneshot(empty(Method::GET, &format!("{records_uri}/{record_id}/download")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains(record["originalFile"]["name"].as_str().unwrap()));
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.len() as u64, record["originalFile"]["size"].as_u64().unwrap());

        let (_, after) = send(&app, empty(Method::GET, &records_uri)).await;
        assert_eq!(before, after);

        let (status, _) = send(&app, empty(Method::DELETE, &format!("/api/v1/sessions/{id}/detail"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_unknown_record_and_session() {
        let app = build_router(test_state());
        let id = processed_session(&app).await;

        let (status, _) = send(
            &app,
            empty(Method::GET, &format!("/api/v1/sessions/{id}/records/{}", uuid::Uuid::new_v4())),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            empty(Method::GET, &format!("/api/v1/sessions/{}", uuid::Uuid::new_v4())),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_questions() {
        let app = build_router(test_state());
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/questions");

        let (status, body) = send(&app, json_request(Method::POST, &uri, json!({ "question": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Please enter a question");

        let (status, body) = send(&app, json_request(Method::POST, &uri, json!({ "question": "Who?" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "No resumes available to analyze");

        let id = processed_session(&app).await;
        let uri = format!("/api/v1/sessions/{id}/questions");
        let (status, body) = send(
            &app,
            json_request(Method::POST, &uri, json!({ "question": "Who is currently employed?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["answer"].as_str().unwrap().contains("currently employed"));
    }

    #[tokio::test]
    async fn test_clear_resets_session_and_notifications_drain() {
        let app = build_router(test_state());
        let id = processed_session(&app).await;

        let (status, snapshot) = send(&app, empty(Method::POST, &format!("/api/v1/sessions/{id}/clear"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["view"], "upload");
        assert_eq!(snapshot["recordCount"], 0);
        assert_eq!(snapshot["resumes"].as_array().unwrap().len(), 0);

        let uri = format!("/api/v1/sessions/{id}/notifications");
        let (_, body) = send(&app, empty(Method::GET, &uri)).await;
        let notes = body["notifications"].as_array().unwrap();
        assert_eq!(notes.last().unwrap()["message"], "Successfully processed 3 resumes");

        let (_, body) = send(&app, empty(Method::GET, &uri)).await;
        assert!(body["notifications"].as_array().unwrap().is_empty());
    }
}
