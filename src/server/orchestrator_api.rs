use axum::{
    routing::{ get, post },
    Router,
    extract::{ Path, Query, State },
    response::{ IntoResponse, Response },
    Json,
};
use std::sync::Arc;

use super::cors_layer;
use super::streaming::{ sse_response_with_header, CLONE_EVENT };
use crate::config::CloneConfig;
use crate::error::ServiceError;
use crate::models::clone::{
    ClonesListing,
    CloneResponse,
    InvocationQuery,
    MultiQuery,
    MultiResponse,
    OwnerVerification,
    ServiceHealth,
    ServiceStatus,
    VerifyOwnerParams,
};
use crate::orchestrator::CloneOrchestrator;

pub const SERVICE_NAME: &str = "PRIMEX Clone Orchestrator";
pub const HEALTH_SERVICE_ID: &str = "primex-orchestrator";

pub fn build_router(orchestrator: Arc<CloneOrchestrator>) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/health", get(health_handler))
        .route("/clones", get(clones_handler))
        .route("/clone/{name}", get(clone_handler))
        .route("/invoke", post(invoke_handler))
        .route("/invoke/multi", post(invoke_multi_handler))
        .route("/verify-owner", post(verify_owner_handler))
        .layer(cors_layer())
        .with_state(orchestrator)
}

async fn status_handler(
    State(orchestrator): State<Arc<CloneOrchestrator>>
) -> Json<ServiceStatus> {
    let config = orchestrator.config();
    Json(ServiceStatus {
        status: "online".to_string(),
        service: SERVICE_NAME.to_string(),
        owner: config.loyalty().owner.clone().unwrap_or_else(|| "Unknown".to_string()),
        available_clones: config.clones().len(),
        clones: config.clone_names(),
    })
}

async fn health_handler() -> Json<ServiceHealth> {
    Json(ServiceHealth {
        status: "healthy".to_string(),
        service: HEALTH_SERVICE_ID.to_string(),
    })
}

async fn clones_handler(State(orchestrator): State<Arc<CloneOrchestrator>>) -> Response {
    let config = orchestrator.config();
    Json(ClonesListing {
        clones: config.clones(),
        loyalty_core: config.loyalty(),
    }).into_response()
}

async fn clone_handler(
    State(orchestrator): State<Arc<CloneOrchestrator>>,
    Path(name): Path<String>
) -> Result<Json<CloneConfig>, ServiceError> {
    orchestrator.get_clone(&name).cloned().map(Json)
}

async fn invoke_handler(
    State(orchestrator): State<Arc<CloneOrchestrator>>,
    Json(query): Json<InvocationQuery>
) -> Result<Response, ServiceError> {
    if query.stream {
        let (header, fragments) = orchestrator.invoke_stream(&query).await?;
        return Ok(sse_response_with_header(CLONE_EVENT, &header, fragments).into_response());
    }
    let response: CloneResponse = orchestrator.invoke(&query).await?;
    Ok(Json(response).into_response())
}

async fn invoke_multi_handler(
    State(orchestrator): State<Arc<CloneOrchestrator>>,
    Json(multi): Json<MultiQuery>
) -> Json<MultiResponse> {
    let results = orchestrator.invoke_multi(&multi.queries, multi.concurrent).await;
    Json(MultiResponse { results })
}

async fn verify_owner_handler(
    State(orchestrator): State<Arc<CloneOrchestrator>>,
    Query(params): Query<VerifyOwnerParams>
) -> Json<OwnerVerification> {
    Json(orchestrator.verify_owner(&params.owner_name, &params.security_key))
}
