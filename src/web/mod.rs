// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP API for the SecondLook web client

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::advisor::{Advisor, AnalyzeRequest, QuestionsRequest, ReasoningRequest};
use crate::assessment::{apply_answers, AnalysisResult, ConfidenceOverlay, Question, QuestionAnswer};
use crate::config::AppConfig;
use crate::{Result, SecondLookError};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    /// Absent when no API key is configured
    pub advisor: Option<Advisor>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let advisor = Advisor::from_config(&config)?;
        if advisor.is_none() {
            warn!(
                "{} not set; model-backed endpoints will answer 503",
                config.ai_engine.api_key_env
            );
        }
        Ok(Self { config, advisor })
    }

    fn advisor(&self) -> Result<&Advisor> {
        self.advisor
            .as_ref()
            .ok_or_else(|| SecondLookError::MissingApiKey(self.config.ai_engine.api_key_env.clone()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for SecondLookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.limits.max_body_bytes;

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/analyze-item", post(api_analyze_item))
        .route("/api/generate-questions", post(api_generate_questions))
        .route("/api/generate-reasoning", post(api_generate_reasoning))
        .route("/api/recalculate-confidence", post(api_recalculate_confidence))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Parse a JSON body ourselves so malformed input gets the API's own 400 message
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|_| SecondLookError::InvalidRequest("Invalid JSON body".to_string()))
}

// === API Handlers ===

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    api_key_configured: bool,
    model: String,
}

async fn api_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        api_key_configured: state.advisor.is_some(),
        model: state.config.ai_engine.model.clone(),
    })
}

async fn api_analyze_item(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AnalysisResult>> {
    let advisor = state.advisor()?;
    let request: AnalyzeRequest = parse_body(&body)?;
    let result = advisor.analyze_item(&request).await?;
    Ok(Json(result))
}

#[derive(Serialize, Deserialize)]
struct QuestionsResponse {
    questions: Vec<Question>,
}

async fn api_generate_questions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<QuestionsResponse>> {
    let advisor = state.advisor()?;
    let request: QuestionsRequest = parse_body(&body)?;
    let questions = advisor.generate_questions(&request).await?;
    Ok(Json(QuestionsResponse { questions }))
}

#[derive(Serialize, Deserialize)]
struct ReasoningResponse {
    reasoning: String,
}

async fn api_generate_reasoning(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ReasoningResponse>> {
    let advisor = state.advisor()?;
    let request: ReasoningRequest = parse_body(&body)?;
    let reasoning = advisor.generate_reasoning(&request).await?;
    Ok(Json(ReasoningResponse { reasoning }))
}

#[derive(Deserialize)]
struct RecalculateRequest {
    analysis: AnalysisResult,
    #[serde(default)]
    answers: Vec<QuestionAnswer>,
}

/// Pure heuristic, so it works without an API key
async fn api_recalculate_confidence(body: Bytes) -> Result<Json<ConfidenceOverlay>> {
    let request: RecalculateRequest = parse_body(&body)?;
    let answered: Vec<QuestionAnswer> = request.answers.into_iter().filter(|a| a.answered).collect();
    Ok(Json(apply_answers(&request.analysis, &answered)))
}

async fn fallback() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorBody { error: "Not found".to_string() }))
}

/// Start the web server
pub async fn start_server(config: AppConfig) -> Result<()> {
    let state = Arc::new(AppState::from_config(config.clone())?);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("SecondLook API listening on http://{}", addr);

    let router = create_router(state).fallback(fallback);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SecondLookError::Config(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::testing::{StubBackend, ANALYSIS_REPLY};
    use crate::assessment::{Confidence, REASONING_PLACEHOLDER};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router_with(backend: Option<Arc<StubBackend>>) -> Router {
        let config = AppConfig::default();
        let advisor = backend.map(|b| Advisor::new(b, config.clone()));
        create_router(Arc::new(AppState { config, advisor }))
    }

    async fn post_json(router: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn analyze_body(photos: usize) -> String {
        let photos: Vec<String> = (0..photos).map(|i| format!("data:image/jpeg;base64,P{}", i)).collect();
        json!({"photos": photos, "price": "180", "notes": "Smells of smoke"}).to_string()
    }

    #[tokio::test]
    async fn test_zero_photos_is_400() {
        let router = router_with(Some(StubBackend::replying(ANALYSIS_REPLY)));
        let (status, body) = post_json(router, "/api/analyze-item", analyze_body(0)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "At least one photo is required");
    }

    #[tokio::test]
    async fn test_missing_key_is_503() {
        let router = router_with(None);
        let (status, body) = post_json(router, "/api/analyze-item", analyze_body(1)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "OPENAI_API_KEY not configured");
    }

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let router = router_with(Some(StubBackend::replying(ANALYSIS_REPLY)));
        let (status, body) = post_json(router, "/api/analyze-item", "{photos:".to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let router = router_with(Some(StubBackend::replying(ANALYSIS_REPLY)));
        let (status, body) = post_json(router, "/api/analyze-item", analyze_body(4)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Mid-century Teak Sideboard");
        assert_eq!(body["insights"][0]["reasoning"], REASONING_PLACEHOLDER);
        assert_eq!(body["questions"].as_array().unwrap().len(), 2);
        assert_eq!(body["fairValueRange"], json!([400.0, 600.0]));
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_502() {
        let router = router_with(Some(StubBackend::replying(r#"{"title": "Chair"}"#)));
        let (status, body) = post_json(router, "/api/analyze-item", analyze_body(1)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Invalid response format");
    }

    #[tokio::test]
    async fn test_upstream_error_is_502() {
        let router = router_with(Some(StubBackend::failing("Incorrect API key provided")));
        let (status, body) = post_json(router, "/api/generate-reasoning", "{}".to_string()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Incorrect API key provided");
    }

    #[tokio::test]
    async fn test_questions_empty_without_insights() {
        let backend = StubBackend::replying("[]");
        let router = router_with(Some(backend.clone()));
        let (status, body) = post_json(router, "/api/generate-questions", "{}".to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"questions": []}));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_questions_missing_key_is_503() {
        let router = router_with(None);
        let (status, _) = post_json(router, "/api/generate-questions", "{}".to_string()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_reasoning_success() {
        let router = router_with(Some(StubBackend::replying("The dovetails suggest hand work.")));
        let body = json!({"label": "Age", "value": "1890s", "confidence": "Low"}).to_string();
        let (status, body) = post_json(router, "/api/generate-reasoning", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reasoning"], "The dovetails suggest hand work.");
    }

    #[tokio::test]
    async fn test_null_fields_take_defaults() {
        let backend = StubBackend::replying("Dovetail joints point to hand work.");
        let router = router_with(Some(backend.clone()));
        let body = json!({"label": "Age", "value": null, "confidence": null}).to_string();
        let (status, _) = post_json(router, "/api/generate-reasoning", body).await;
        assert_eq!(status, StatusCode::OK);
        assert!(backend.seen.lock().unwrap()[0].user.contains("Medium"));

        let router = router_with(Some(StubBackend::replying(ANALYSIS_REPLY)));
        let body = json!({"photos": ["data:image/jpeg;base64,P0"], "price": null, "notes": null}).to_string();
        let (status, _) = post_json(router, "/api/analyze-item", body).await;
        assert_eq!(status, StatusCode::OK);

        let backend = StubBackend::replying("[]");
        let router = router_with(Some(backend.clone()));
        let body = json!({"insightsNeedingHelp": null, "overallAnalysis": null}).to_string();
        let (status, body) = post_json(router, "/api/generate-questions", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"questions": []}));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_questions_accept_lowercase_tier() {
        let reply = r#"[{"id":"q1","text":"Any maker's mark?","answerType":"photo","helpsInsights":["Age"]}]"#;
        let backend = StubBackend::replying(reply);
        let router = router_with(Some(backend.clone()));
        let body = json!({
            "insightsNeedingHelp": [{"label": "Age", "value": "1960s", "confidence": "low"}]
        })
        .to_string();

        let (status, body) = post_json(router, "/api/generate-questions", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["questions"][0]["id"], "q1");
        assert!(backend.seen.lock().unwrap()[0].user.contains("- Age: \"1960s\" (Low confidence)"));
    }

    #[tokio::test]
    async fn test_recalculate_without_key() {
        let analysis = crate::assessment::coerce::coerce_analysis(ANALYSIS_REPLY, 2).unwrap();
        let body = json!({
            "analysis": analysis,
            "answers": [
                {"questionId": "q1", "helpsInsights": ["Age", "Est. Savings"], "answerType": "photo", "answered": true, "answerPhoto": "data:image/jpeg;base64,AAAA"},
                {"questionId": "q2", "helpsInsights": ["Age", "Est. Savings"], "answerType": "text", "answered": true, "answerText": "An estate sale"},
                {"questionId": "q3", "helpsInsights": ["Age"], "answerType": "text", "answered": false, "answerText": "ignored"}
            ]
        })
        .to_string();

        let (status, body) = post_json(router_with(None), "/api/recalculate-confidence", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updates"]["Age"], "High");
        assert_eq!(body["updates"]["Est. Savings"], "High");
        assert_eq!(body["analysis"]["recommendation"]["confidence"], "High");
        assert!(body["updates"].get("Materials").is_none());

        let parsed: ConfidenceOverlay = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.analysis.insights[1].confidence, Confidence::High);
    }

    #[tokio::test]
    async fn test_health_reports_key_state() {
        let response = router_with(None)
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["apiKeyConfigured"], false);
        assert_eq!(body["model"], "gpt-4o-mini");
    }
}
