// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::fmt;

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    ModelNotFound {
        model: String,
        available_models: Vec<String>,
    },
    InternalError(String),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        ApiError::ValidationError {
            field: field.to_string(),
            message: format!("Missing required field: {}", field),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.message(),
            error_type: self.error_type().to_string(),
            details: self.details(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::ValidationError { .. } => "validation_error",
            ApiError::ModelNotFound { .. } => "model_not_found",
            ApiError::InternalError(_) => "internal_error",
        }
    }

    /// Client-facing message, without the category prefix used in logs
    fn message(&self) -> String {
        match self {
            ApiError::InvalidRequest(msg) | ApiError::InternalError(msg) => msg.clone(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::ModelNotFound { model, .. } => format!("Unknown model: {}", model),
        }
    }

    fn details(&self) -> Option<HashMap<String, serde_json::Value>> {
        let (key, value) = match self {
            ApiError::ValidationError { field, .. } => ("field", json!(field)),
            ApiError::ModelNotFound {
                available_models, ..
            } => ("available_models", json!(available_models)),
            ApiError::InvalidRequest(_) | ApiError::InternalError(_) => return None,
        };
        Some(HashMap::from([(key.to_string(), value)]))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::ModelNotFound { .. } => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::ModelNotFound { model, .. } => write!(f, "Model '{}' not found", model),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
