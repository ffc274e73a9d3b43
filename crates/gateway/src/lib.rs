//! HTTP gateway for the lab follow-up recommendation service.
//!
//! Three routes: `GET /` (service descriptor), `GET /health` (FHIR target
//! visibility), `POST /evaluate` (fetch the trigger observation, run the
//! pipeline, return the structured output). The observation fetch is the
//! only load-bearing upstream call at this boundary; its failures map to
//! distinct HTTP statuses so callers can tell a bad reference from a bad
//! FHIR server.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use labfollowup_agent::LabFollowupPipeline;
use labfollowup_config::ServerConfig;
use labfollowup_core::error::FhirError;
use labfollowup_core::{
    CaseDescriptor, CaseRequest, ClinicalRecommendationOutput, Error, FhirReader,
};

/// Shared handles for all routes. Built once at startup; every field is a
/// cheap clone.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LabFollowupPipeline>,
    pub fhir: Arc<dyn FhirReader>,
    pub fhir_base_url: String,
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/evaluate", post(evaluate_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server. Runs until the process is stopped.
pub async fn serve(server: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    status: &'static str,
    version: &'static str,
}

async fn root_handler() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "Lab Follow-up Recommendation Service",
        status: "operational",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    fhir: FhirHealth,
}

#[derive(Serialize)]
struct FhirHealth {
    base_url: String,
    configured: bool,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        fhir: FhirHealth {
            configured: !state.fhir_base_url.is_empty(),
            base_url: state.fhir_base_url,
        },
    })
}

async fn evaluate_handler(
    State(state): State<AppState>,
    Json(request): Json<CaseRequest>,
) -> Result<Json<ClinicalRecommendationOutput>, ApiError> {
    let observation = state
        .fhir
        .fetch_observation(&request.trigger_observation_ref)
        .await
        .map_err(ApiError::from_fhir)?;

    // The case carries the reconstructed reference from the fetch, not the
    // raw request string, so bare and prefixed forms converge here.
    let case = CaseDescriptor {
        case_id: request.resolve_case_id(),
        patient_ref: observation.patient_ref.clone(),
        trigger_observation_ref: observation.observation_ref.clone(),
        lab_result: observation.lab_result(),
    };

    info!(
        case_id = %case.case_id,
        patient_ref = %case.patient_ref,
        observation = %case.trigger_observation_ref,
        test = %case.lab_result.test_name,
        value = case.lab_result.value,
        status = %case.lab_result.status,
        "Evaluation requested"
    );

    let output = state
        .pipeline
        .run(&case)
        .await
        .map_err(ApiError::from_pipeline)?;

    Ok(Json(output))
}

// --- Error mapping ---

/// Error body for every non-2xx response.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

/// A handler failure with its HTTP status already decided.
struct ApiError {
    status: StatusCode,
    error: &'static str,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, error: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            error,
            detail: detail.into(),
        }
    }

    /// Boundary mapping for the trigger observation fetch: not-found 404,
    /// upstream non-success 502, unreachable 503, anything else 500.
    fn from_fhir(err: FhirError) -> Self {
        match &err {
            FhirError::NotFound { resource } => Self::new(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Observation '{resource}' not found in FHIR server"),
            ),
            FhirError::UpstreamStatus { .. } => Self::new(
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                format!("Error fetching observation from FHIR server: {err}"),
            ),
            FhirError::Unreachable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "fhir_unreachable",
                format!("Cannot connect to FHIR server: {err}"),
            ),
            FhirError::MalformedResource(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                format!("Unexpected error processing observation: {err}"),
            ),
        }
    }

    /// A pipeline failure never exposes partial output; the malformed-output
    /// case gets its own label so callers can distinguish it from transport
    /// trouble.
    fn from_pipeline(err: Error) -> Self {
        error!(error = %err, "Pipeline run failed");
        match err {
            Error::MalformedOutput { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "pipeline_failed",
                "Pipeline failed: could not generate structured output",
            ),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                format!("Internal server error: {other}"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.error.to_string(),
            detail: self.detail,
        });
        (self.status, body).into_response()
    }
}
