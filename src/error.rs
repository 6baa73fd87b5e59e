use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::web::models::ErrorReply;

/// Everything that can go wrong while serving a chat request.
///
/// Client mistakes and upstream failures share a status code: every variant
/// is answered with `500 {"error": ...}` carrying the `Display` text.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Message is required")]
    EmptyMessage,

    #[error("Marshal error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Request creation error: {0}")]
    RequestBuild(#[source] reqwest::Error),

    #[error("API call error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Read response error: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("API error ({status}): {body}")]
    UpstreamStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Unmarshal error: {0}")]
    Decode(#[source] serde_json::Error),

    /// The provider answered 200 but with an empty `choices` array.
    #[error("API error: upstream returned no choices")]
    NoChoices,
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        error!("Chat request failed: {}", self);
        HttpResponse::build(self.status_code()).json(ErrorReply {
            error: self.to_string(),
        })
    }
}
