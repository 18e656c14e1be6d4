// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gantry_engine::RuntimeError;
use serde_json::json;
use thiserror::Error;

/// Request failure, rendered as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Body missing, malformed or of the wrong shape
    #[error(transparent)]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Runtime(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Runtime(_) => StatusCode::BAD_REQUEST,
            ApiError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Runtime(e) => e.to_string(),
            ApiError::Body(rejection) => rejection.body_text(),
        };
        tracing::debug!(status = status.as_u16(), %detail, "request rejected");
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
