//! HTTP surface of the service.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{debug, error, info};
use trun_models::run::store::TestRunStore;
use trun_web::{
    prelude::Result as TrunWebResult,
    testrun::{RunTestsRequest, RunTestsResponse, TestResultsApi, fetch_runs, record_run},
};

use crate::orchestrator::Orchestrator;
use crate::prelude::*;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn TestRunStore>,
    pub orchestrator: Arc<Orchestrator>,
}

impl ApiState {
    pub fn new(store: Arc<dyn TestRunStore>, orchestrator: Orchestrator) -> Self {
        Self {
            store,
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Builds the application router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/runtests", post(run_tests))
        .route("/testresults", get(test_results))
        .route("/health", get(health))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the API on a background task.
///
/// Returns the bound address, which differs from `addr` when port 0 was
/// requested, together with the server task handle.
pub async fn setup_api(
    addr: &str,
    state: ApiState,
) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    debug!("listening on {local_addr}");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok((local_addr, handle))
}

async fn run_tests(
    State(state): State<ApiState>,
    Json(payload): Json<RunTestsRequest>,
) -> RunTestsResponse {
    let source_link = match payload.validated_source_link() {
        Ok(link) => link,
        Err(err) => {
            info!("Rejected test run request: {err}");
            return RunTestsResponse::Rejected(err.to_string());
        }
    };

    let outcome = state.orchestrator.run(source_link).await;
    let stored = record_run(
        state.store.clone(),
        source_link,
        outcome.success,
        &outcome.output,
    )
    .await;

    match (outcome.success, stored) {
        (true, Ok(_)) => RunTestsResponse::Passed(outcome.output),
        (true, Err(err)) => {
            error!("Failed to store successful run for {source_link}: {err}");
            RunTestsResponse::Failed(err.to_string())
        }
        (false, Ok(_)) => RunTestsResponse::Failed(outcome.output),
        (false, Err(err)) => {
            error!("Failed to store failed run for {source_link}: {err}");
            RunTestsResponse::Failed(outcome.output)
        }
    }
}

async fn test_results(State(state): State<ApiState>) -> TrunWebResult<Json<TestResultsApi>> {
    let results = fetch_runs(state.store.clone()).await?;
    Ok(Json(results))
}

async fn health(State(state): State<ApiState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "store": state.store.backend_tag(),
    }))
}
