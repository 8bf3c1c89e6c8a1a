// src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::token::TokenError;

/// Terminal failures of the bootstrap flow. Response bodies stay generic.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("invalid payload")]
    InvalidPayload(#[source] serde_json::Error),
    #[error("invalid signature")]
    Unauthorized,
    #[error("token issuance failed")]
    IssuanceFailed(#[from] TokenError),
    #[error("response encoding failed")]
    EncodingFailed(#[source] serde_json::Error),
}

impl BootstrapError {
    pub fn status(&self) -> StatusCode {
        match self {
            BootstrapError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            BootstrapError::Unauthorized => StatusCode::UNAUTHORIZED,
            BootstrapError::IssuanceFailed(_) | BootstrapError::EncodingFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BootstrapError {
    fn into_response(self) -> Response {
        let body = match &self {
            BootstrapError::InvalidPayload(_) | BootstrapError::Unauthorized => self.to_string(),
            BootstrapError::IssuanceFailed(e) => {
                error!("bootstrap issuance: {e}");
                "internal".into()
            }
            BootstrapError::EncodingFailed(e) => {
                error!("bootstrap encoding: {e}");
                "internal".into()
            }
        };
        (self.status(), body).into_response()
    }
}
