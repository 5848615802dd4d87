//! HTTP API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes live under `/api/`. Remedy routes are mounted twice, under
//! `/api/remedies/` and directly under `/api/`, for older clients.
//!
//! Layers (outermost → innermost):
//! 1. Request logging → 2. CORS → 3. Body size limit

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::error::{ApiError, ROUTE_NOT_FOUND};
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the full API router over a connected `CoreState`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    let max_upload_bytes = ctx.core.max_upload_bytes;

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/api/health", get(endpoints::health::check))
        .route("/api/logtest", get(endpoints::health::log_test))
        .route(
            "/api/prescriptions/upload",
            post(endpoints::prescriptions::upload),
        )
        .route("/api/analysis/:id", get(endpoints::analysis::get))
        .route("/api/analysis/:id/report", get(endpoints::analysis::report))
        .nest("/api/journal", journal_routes())
        .merge(remedy_routes("/api/remedies"))
        .merge(remedy_routes("/api"))
        .fallback(route_not_found)
        .with_state(ctx);

    routes
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
}

/// Router used when required configuration is missing: every request
/// answers 500 naming the missing variables.
pub fn misconfigured_router(missing: Vec<String>) -> Router {
    Router::new()
        .fallback(move || {
            let missing = missing.clone();
            async move { ApiError::Misconfigured(missing) }
        })
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
}

fn journal_routes() -> Router<ApiContext> {
    Router::new()
        .route("/health", get(endpoints::journal::health))
        .route("/add", post(endpoints::journal::add))
        .route("/delete/:id", delete(endpoints::journal::delete))
        .route("/:user_id", get(endpoints::journal::list))
        .route("/:user_id/report", get(endpoints::journal::report))
}

fn remedy_routes(prefix: &str) -> Router<ApiContext> {
    Router::new()
        .route(
            &format!("{prefix}/search-and-summarize"),
            post(endpoints::remedies::search_and_summarize),
        )
        .route(&format!("{prefix}/chat"), post(endpoints::chat::send))
        .route(&format!("{prefix}/seed"), get(endpoints::remedies::seed))
        .route(
            &format!("{prefix}/diagnose"),
            get(endpoints::remedies::diagnose),
        )
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound(ROUTE_NOT_FOUND.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::remedies::{seed_remedies, RemedyStore};
    use crate::test_support::{
        MockGenerator, MockJournalStore, MockOcr, MockRemedyStore, SAMPLE_ANALYSIS_REPLY,
    };

    const BOUNDARY: &str = "medask-test-boundary";

    fn base_core() -> CoreState {
        CoreState::new(
            Arc::new(MockOcr::text("Amlodipine 5mg once daily")),
            Arc::new(MockRemedyStore::new(seed_remedies())),
        )
    }

    fn full_core() -> Arc<CoreState> {
        Arc::new(
            base_core()
                .with_generator(Arc::new(MockGenerator::replying(SAMPLE_ANALYSIS_REPLY)))
                .with_journal(Arc::new(MockJournalStore::new())),
        )
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/prescriptions/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> Response {
        app.oneshot(req).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ── health & fallback ───────────────────────────────────

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = send(api_router(full_core()), get_request("/api/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Backend healthy");
        assert!(json["uptimeSecs"].is_u64());
        assert_eq!(json["analysesHeld"], 0);
    }

    #[tokio::test]
    async fn logtest_answers() {
        let response = send(api_router(full_core()), get_request("/api/logtest")).await;
        let json = json_body(response).await;
        assert_eq!(json["message"], "Log test route hit!");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = send(api_router(full_core()), get_request("/api/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "API route not found");
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let req = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = send(api_router(full_core()), req).await;
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    // ── error mode ──────────────────────────────────────────

    #[tokio::test]
    async fn misconfigured_router_answers_500_everywhere() {
        let app = misconfigured_router(vec!["MONGODB_URI".into(), "SUPABASE_URL".into()]);
        for uri in ["/api/health", "/anything/else"] {
            let response = send(app.clone(), get_request(uri)).await;
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let json = json_body(response).await;
            assert_eq!(json["success"], false);
            assert_eq!(
                json["message"],
                "Server misconfigured. Missing env vars: MONGODB_URI, SUPABASE_URL"
            );
        }
    }

    // ── upload & analysis ───────────────────────────────────

    #[tokio::test]
    async fn upload_without_body_is_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/api/prescriptions/upload")
            .body(Body::empty())
            .unwrap();
        let response = send(api_router(full_core()), req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "No file uploaded.");
    }

    #[tokio::test]
    async fn upload_with_wrong_field_is_400() {
        let req = multipart_request("document", "rx.jpg", b"\xFF\xD8\xFFimage");
        let response = send(api_router(full_core()), req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "No file uploaded.");
    }

    #[tokio::test]
    async fn upload_analyses_and_stores() {
        let core = full_core();
        let app = api_router(core.clone());

        let response = send(
            app.clone(),
            multipart_request("image", "rx.jpg", b"\xFF\xD8\xFFimage"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        let id = json["analysisId"].as_str().unwrap().to_string();
        assert!(id.starts_with("analysis_"));
        assert_eq!(json["analysis"]["medicines"][0]["name"], "Amlodipine");
        assert_eq!(json["analysis"]["overallRiskLevel"], "Low");
        assert_eq!(json["analysis"]["fileName"], "rx.jpg");
        assert_eq!(core.analyses.count(), 1);

        let response = send(app.clone(), get_request(&format!("/api/analysis/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["analysis"]["summary"], "This prescription is for managing hypertension.");

        let response = send(app, get_request(&format!("/api/analysis/{id}/report"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("MedASK_Analysis_rx.pdf"));
        let bytes = to_bytes(response.into_body(), 10 * 1024 * 1024).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn upload_over_body_limit_is_file_upload_error() {
        let core = Arc::new(
            base_core()
                .with_generator(Arc::new(MockGenerator::replying(SAMPLE_ANALYSIS_REPLY)))
                .with_max_upload_bytes(64),
        );
        let response = send(
            api_router(core.clone()),
            multipart_request("image", "big.jpg", &vec![0u8; 4096]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().starts_with("File upload error: "));
        assert_eq!(core.analyses.count(), 0);
    }

    #[tokio::test]
    async fn upload_of_empty_file_is_no_file() {
        let core = full_core();
        let response = send(api_router(core.clone()), multipart_request("image", "rx.jpg", b"")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "No file uploaded.");
        assert_eq!(core.analyses.count(), 0);
    }

    #[tokio::test]
    async fn upload_accepts_reply_with_null_and_single_string_fields() {
        let reply = r#"```json
{"summary":"Pain relief.","medicines":[{"name":"Ibuprofen","dosage":null,"warnings":"Take with food"}],"overallRiskLevel":"Low","recommendations":"Stay hydrated"}
```"#;
        let core = Arc::new(base_core().with_generator(Arc::new(MockGenerator::replying(reply))));
        let response = send(
            api_router(core),
            multipart_request("image", "rx.jpg", b"\xFF\xD8\xFFimage"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["analysis"]["medicines"][0]["dosage"], "");
        assert_eq!(json["analysis"]["medicines"][0]["warnings"], json!(["Take with food"]));
        assert_eq!(json["analysis"]["recommendations"], json!(["Stay hydrated"]));
    }

    #[tokio::test]
    async fn upload_with_ocr_failure_is_500_with_detail() {
        let core = Arc::new(
            CoreState::new(
                Arc::new(MockOcr::failing()),
                Arc::new(MockRemedyStore::new(vec![])),
            )
            .with_generator(Arc::new(MockGenerator::replying(SAMPLE_ANALYSIS_REPLY))),
        );
        let response = send(
            api_router(core),
            multipart_request("image", "rx.jpg", b"\xFF\xD8\xFFimage"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().starts_with("Google Vision API failed"));
        assert!(json["error"].as_str().unwrap().contains("403"));
    }

    #[tokio::test]
    async fn upload_with_blocked_generation_carries_reason() {
        let core = Arc::new(base_core().with_generator(Arc::new(MockGenerator::blocked("SAFETY"))));
        let response = send(
            api_router(core),
            multipart_request("image", "rx.jpg", b"\xFF\xD8\xFFimage"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["message"], "AI content generation failed or was blocked.");
        assert_eq!(json["reason"], "SAFETY");
    }

    #[tokio::test]
    async fn unknown_analysis_is_404() {
        let response = send(api_router(full_core()), get_request("/api/analysis/analysis_1")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Prescription not found");

        let response = send(
            api_router(full_core()),
            get_request("/api/analysis/analysis_1/report"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ── chat ────────────────────────────────────────────────

    #[tokio::test]
    async fn chat_requires_message() {
        let response = send(
            api_router(full_core()),
            json_request("POST", "/api/chat", json!({})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Message is required");
    }

    #[tokio::test]
    async fn chat_without_model_is_500() {
        let response = send(
            api_router(Arc::new(base_core())),
            json_request("POST", "/api/chat", json!({ "message": "hello" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["message"], "AI service unavailable");
    }

    #[tokio::test]
    async fn chat_failure_message_is_the_error() {
        let core = Arc::new(base_core().with_generator(Arc::new(MockGenerator::failing())));
        let response = send(
            api_router(core),
            json_request("POST", "/api/remedies/chat", json!({ "message": "hello" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert!(json["message"].as_str().unwrap().contains("model overloaded"));
    }

    #[tokio::test]
    async fn chat_returns_reply() {
        let core = Arc::new(base_core().with_generator(Arc::new(MockGenerator::replying("Drink water."))));
        let response = send(
            api_router(core),
            json_request("POST", "/api/chat", json!({ "message": "hello" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["reply"], "Drink water.");
    }

    // ── remedies ────────────────────────────────────────────

    #[tokio::test]
    async fn search_requires_conditions() {
        let response = send(
            api_router(full_core()),
            json_request(
                "POST",
                "/api/remedies/search-and-summarize",
                json!({ "conditions": [] }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["message"],
            "Please provide at least one ailment or condition to search for."
        );
    }

    #[tokio::test]
    async fn search_without_model_returns_raw_results_on_both_mounts() {
        for uri in ["/api/remedies/search-and-summarize", "/api/search-and-summarize"] {
            let response = send(
                api_router(Arc::new(base_core())),
                json_request("POST", uri, json!({ "conditions": ["headache"] })),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            let json = json_body(response).await;
            assert_eq!(json["success"], true);
            assert_eq!(json["summary"], "Found 1 remedies for headache.");
            assert_eq!(json["remedies"][0]["remedy"], "Peppermint Oil Application");
            assert!(json.get("searchInfo").is_none());
        }
    }

    #[tokio::test]
    async fn search_with_model_carries_search_info() {
        let response = send(
            api_router(full_core()),
            json_request(
                "POST",
                "/api/remedies/search-and-summarize",
                json!({ "conditions": ["headache"] }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["searchInfo"]["totalResults"], 1);
        assert_eq!(
            json["searchInfo"]["searchMethod"],
            "Atlas Search with AI Enhancement"
        );
        assert_eq!(json["remedies"][0]["originalData"]["ailment"], "Headache");
    }

    #[tokio::test]
    async fn search_with_both_paths_down_is_500() {
        let core = Arc::new(CoreState::new(
            Arc::new(MockOcr::text("Rx")),
            Arc::new(
                MockRemedyStore::new(seed_remedies())
                    .with_atlas_failure()
                    .with_regex_failure(),
            ),
        ));
        let response = send(
            api_router(core),
            json_request(
                "POST",
                "/api/remedies/search-and-summarize",
                json!({ "conditions": ["headache"] }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["message"],
            "Search service temporarily unavailable. Please try again later."
        );
    }

    #[tokio::test]
    async fn seed_refuses_populated_collection() {
        let response = send(api_router(full_core()), get_request("/api/remedies/seed")).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn seed_fills_empty_collection() {
        let core = Arc::new(CoreState::new(
            Arc::new(MockOcr::text("Rx")),
            Arc::new(MockRemedyStore::new(vec![])),
        ));
        let response = send(api_router(core.clone()), get_request("/api/seed")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(core.remedies().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn diagnose_reports_collection_state() {
        let response = send(api_router(full_core()), get_request("/api/remedies/diagnose")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["diagnostics"]["connection"], "Success");
        assert_eq!(json["diagnostics"]["remedyCount"], 5);
    }

    // ── journal ─────────────────────────────────────────────

    #[tokio::test]
    async fn journal_add_list_delete_round_trip() {
        let app = api_router(full_core());

        let response = send(
            app.clone(),
            json_request(
                "POST",
                "/api/journal/add",
                json!({
                    "user_id": "u1",
                    "date": "2026-10-01",
                    "mood": "good",
                    "symptoms": "headache, nausea",
                    "medications": ["Ibuprofen"],
                }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["entry"]["symptoms"], json!(["headache", "nausea"]));
        let id = json["entry"]["id"].to_string();

        let response = send(app.clone(), get_request("/api/journal/u1")).await;
        let json = json_body(response).await;
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/api/journal/delete/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = send(app.clone(), req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "success": true }));

        let response = send(app, get_request("/api/journal/u1")).await;
        let json = json_body(response).await;
        assert!(json["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn journal_add_requires_fields() {
        let response = send(
            api_router(full_core()),
            json_request("POST", "/api/journal/add", json!({ "user_id": "u1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["message"], "Missing required fields.");
    }

    #[tokio::test]
    async fn journal_without_store_is_503() {
        let response = send(api_router(Arc::new(base_core())), get_request("/api/journal/u1")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(response).await["message"],
            "Database service is unavailable."
        );
    }

    #[tokio::test]
    async fn journal_store_error_is_500_with_message() {
        let core = Arc::new(base_core().with_journal(Arc::new(MockJournalStore::failing())));
        let response = send(api_router(core), get_request("/api/journal/u1")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["message"],
            "relation \"journal_entries\" does not exist"
        );
    }

    #[tokio::test]
    async fn journal_health_is_not_a_user_id() {
        let response = send(api_router(Arc::new(base_core())), get_request("/api/journal/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Journal routes healthy");
    }

    #[tokio::test]
    async fn journal_report_summarizes_range() {
        let app = api_router(full_core());
        for (date, mood, symptoms) in [
            ("2026-10-01", "good", "headache"),
            ("2026-10-02", "bad", "headache, fatigue"),
            ("2026-09-01", "great", "cough"),
        ] {
            let response = send(
                app.clone(),
                json_request(
                    "POST",
                    "/api/journal/add",
                    json!({ "user_id": "u1", "date": date, "mood": mood, "symptoms": symptoms }),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = send(
            app.clone(),
            get_request("/api/journal/u1/report?from=2026-10-01&to=2026-10-31"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["report"]["totalEntries"], 2);
        assert_eq!(json["report"]["avgMood"], 3.0);
        assert_eq!(json["report"]["topSymptoms"][0]["symptom"], "headache");
        assert_eq!(json["report"]["topSymptoms"][0]["count"], 2);

        let response = send(app, get_request("/api/journal/u1/report?from=2026-10-31&to=2026-10-01")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
