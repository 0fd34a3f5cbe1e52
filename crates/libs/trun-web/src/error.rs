//! Main Crate Error

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Models(#[from] trun_models::error::Error),

    #[error("Store task failed: {0}")]
    StoreTask(#[from] tokio::task::JoinError),

    #[error("sourceLink must not be empty")]
    MissingSourceLink,
}

impl Error {
    /// HTTP status matching this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MissingSourceLink => StatusCode::BAD_REQUEST,
            Error::Models(_) | Error::StoreTask(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!("Creating API error response for error: {:?}", self);
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn store_errors_are_internal_server_errors() {
        let err = Error::Models(trun_models::error::Error::Unavailable(String::from(
            "reads are disabled",
        )));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Store unavailable: reads are disabled");
    }

    #[test]
    fn missing_source_link_is_a_bad_request() {
        assert_eq!(Error::MissingSourceLink.status(), StatusCode::BAD_REQUEST);
    }
}
