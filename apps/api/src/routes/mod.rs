pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::comparison::handlers as comparison;
use crate::essay::handlers as essay;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Essay API
        .route("/api/v1/essays/analyze", post(essay::handle_analyze))
        .route("/api/v1/essays/change-type", post(essay::handle_change_type))
        .route("/api/v1/essays/grammar", post(essay::handle_grammar))
        .route("/api/v1/essays/download", post(essay::handle_download))
        .route("/api/v1/essays/:id", get(essay::handle_get_analysis))
        // Comparison API
        .route("/api/v1/compare", post(comparison::handle_compare))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::docx::DOCX_CONTENT_TYPE;
    use crate::llm_client::testing::ScriptedGateway;
    use crate::llm_client::{GeminiClient, LlmGateway};

    const BOUNDARY: &str = "essay-test-boundary";
    const LONG_ESSAY: &str = "I remember the journey well. It was a personal story of what happened that summer by the lake.";

    fn router_with(gateway: Arc<dyn LlmGateway>) -> Router {
        let config = Config::for_tests();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState {
            db,
            gateway,
            config,
        })
    }

    fn multipart(parts: &[(&str, &str, &str)]) -> Request<Body> {
        let mut body = String::new();
        for (field, filename, content) in parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::post("/api/v1/compare")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_service_and_model_state() {
        let app = router_with(Arc::new(GeminiClient::new(None, Config::for_tests().llm_timeout)));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "essay-api");
        assert_eq!(body["model_available"], false);
    }

    #[tokio::test]
    async fn test_compare_returns_structural_diff_and_prose() {
        let gateway = ScriptedGateway::new()
            .reply("characteristics of Draft 1", "Plain.")
            .reply("characteristics of Draft 2", "Warmer.")
            .reply("key differences", "- Adds an ending.");
        let app = router_with(Arc::new(gateway));

        let request = multipart(&[
            ("essay1", "draft1.txt", "The cat sat.\nIt was happy."),
            ("essay2", "draft2.txt", "The cat sat.\nIt was very happy.\nThe end."),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["file1_name"], "draft1.txt");
        assert_eq!(body["comparison"]["summary"]["ratio"], 0.4);
        assert_eq!(body["comparison"]["summary"]["opcodes"][1]["tag"], "replace");
        assert_eq!(
            body["comparison"]["summary"]["opcodes"][1]["revised_text_snippet"],
            "It was very happy.\nThe end."
        );
        assert_eq!(body["comparison"]["rendered_view"]["rows"][2]["kind"], "inserted");
        assert_eq!(body["analysis"]["key_differences"], "- Adds an ending.");
    }

    #[tokio::test]
    async fn test_compare_missing_second_file_is_bad_request() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let request = multipart(&[("essay1", "draft1.txt", "Only one draft.")]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_compare_rejects_disallowed_extension() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let request = multipart(&[
            ("essay1", "draft1.txt", "First."),
            ("essay2", "draft2.exe", "Second."),
        ]);
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grammar_falls_back_when_model_fails() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let response = app
            .oneshot(post_json(
                "/api/v1/essays/grammar",
                json!({ "essay_text": "Their going to the park." }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["fallback"], true);
        assert_eq!(body["overall_score"], "75");
    }

    #[tokio::test]
    async fn test_grammar_requires_text() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let response = app
            .oneshot(post_json("/api/v1/essays/grammar", json!({ "essay_text": "  " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_change_type_returns_requested_type() {
        let gateway = ScriptedGateway::new().reply(
            "specializing in Persuasive Essays",
            r#"{"essay_type": "Narrative Essay", "essay_score": "70",
                "corrected_essay": "You <ins>must</ins> act now.", "suggestions": []}"#,
        );
        let app = router_with(Arc::new(gateway));
        let response = app
            .oneshot(post_json(
                "/api/v1/essays/change-type",
                json!({
                    "essay_text": "You <del>should</del> act now.",
                    "target_essay_type": "Persuasive Essay"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["essay_type"], "Persuasive Essay");
        assert_eq!(body["essay_score"], "70");
        assert_eq!(body["criteria"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_change_type_rejects_unknown_type() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let response = app
            .oneshot(post_json(
                "/api/v1/essays/change-type",
                json!({ "essay_text": "Some text.", "target_essay_type": "Haiku" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Argumentative Essay"));
    }

    #[tokio::test]
    async fn test_analyze_without_model_is_service_unavailable() {
        let app = router_with(Arc::new(GeminiClient::new(None, Config::for_tests().llm_timeout)));
        let mut request = multipart(&[("file", "essay.txt", LONG_ESSAY)]);
        *request.uri_mut() = "/api/v1/essays/analyze".parse().unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_analyze_rejects_short_essay() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let mut request = multipart(&[("file", "essay.txt", "Too short.")]);
        *request.uri_mut() = "/api/v1/essays/analyze".parse().unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_returns_docx_attachment() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let response = app
            .oneshot(post_json(
                "/api/v1/essays/download",
                json!({
                    "final_text": "First <ins>paragraph</ins>.\n\nSecond paragraph.",
                    "title": "My Essay"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], DOCX_CONTENT_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"My_Essay_final.docx\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_get_analysis_rejects_malformed_id() {
        let app = router_with(Arc::new(ScriptedGateway::new()));
        let response = app
            .oneshot(Request::get("/api/v1/essays/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
