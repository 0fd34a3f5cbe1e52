//! Test run payloads and store access for web handlers.

use std::sync::Arc;

use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trun_models::run::{
    store::TestRunStore,
    testrun::{TestRunCreate, TestRunDb},
};
use uuid::Uuid;

use crate::prelude::*;

/// Body of `POST /runtests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTestsRequest {
    /// Repository to clone and test.
    #[serde(default, alias = "githubLink")]
    pub source_link: String,
}

impl RunTestsRequest {
    /// Returns the trimmed source link, rejecting blank ones.
    pub fn validated_source_link(&self) -> Result<&str> {
        let link = self.source_link.trim();
        if link.is_empty() {
            return Err(Error::MissingSourceLink);
        }
        Ok(link)
    }
}

/// A stored test run as returned by `GET /testresults`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunApi {
    pub id: Uuid,
    pub source_link: String,
    pub success: bool,
    pub output: String,
    pub created_at: DateTime<Utc>,
}

impl From<TestRunDb> for TestRunApi {
    fn from(value: TestRunDb) -> Self {
        Self {
            id: value.id,
            source_link: value.source_link,
            success: value.success,
            output: value.output,
            created_at: value.created_at,
        }
    }
}

/// Body of a successful `GET /testresults`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultsApi {
    pub test_results: Vec<TestRunApi>,
}

/// Outcome of `POST /runtests`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunTestsResponse {
    /// Every step succeeded. Carries the run output.
    Passed(String),
    /// A step or the persistence of the outcome failed. Carries the reason.
    Failed(String),
    /// The request was invalid and nothing ran.
    Rejected(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunTestsPassedBody<'a> {
    success: bool,
    test_results: &'a str,
}

#[derive(Serialize)]
struct RunTestsFailedBody<'a> {
    success: bool,
    error: &'a str,
}

impl IntoResponse for RunTestsResponse {
    fn into_response(self) -> axum::response::Response {
        match &self {
            RunTestsResponse::Passed(output) => (
                StatusCode::OK,
                Json(RunTestsPassedBody {
                    success: true,
                    test_results: output,
                }),
            )
                .into_response(),
            RunTestsResponse::Failed(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunTestsFailedBody {
                    success: false,
                    error,
                }),
            )
                .into_response(),
            RunTestsResponse::Rejected(error) => (
                StatusCode::BAD_REQUEST,
                Json(RunTestsFailedBody {
                    success: false,
                    error,
                }),
            )
                .into_response(),
        }
    }
}

/// Stores one test run outcome.
///
/// The store is synchronous, so the write runs on the blocking pool.
pub async fn record_run(
    store: Arc<dyn TestRunStore>,
    source_link: &str,
    success: bool,
    output: &str,
) -> Result<TestRunApi> {
    let run = TestRunCreate {
        source_link: source_link.to_string(),
        success,
        output: output.to_string(),
    };
    let stored = tokio::task::spawn_blocking(move || store.append(run)).await??;
    Ok(stored.into())
}

/// Fetches every stored test run in storage order.
pub async fn fetch_runs(store: Arc<dyn TestRunStore>) -> Result<TestResultsApi> {
    let runs = tokio::task::spawn_blocking(move || store.list()).await??;
    Ok(TestResultsApi {
        test_results: runs.into_iter().map(TestRunApi::from).collect(),
    })
}
