//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Raised while compiling a model schema or registering a handler. Fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("primary key not found in model {model}")]
    MissingPrimaryKey { model: String },
    #[error("duplicate primary key for field: {field} (model {model})")]
    DuplicatePrimaryKey { model: String, field: String },
    #[error("duplicate field {field} in model {model}")]
    DuplicateField { model: String, field: String },
    #[error("field {field} of model {model} cannot be a primary key ({storage_type})")]
    UnsupportedPrimaryKey {
        model: String,
        field: String,
        storage_type: String,
    },
    #[error("request parameter must be the last named parameter in function: {handler}({signature})")]
    RequestParameterPosition { handler: String, signature: String },
    #[error("invalid method {method} for handler {handler}")]
    InvalidMethod { handler: String, method: String },
    #[error("invalid path pattern {path} for handler {handler}")]
    InvalidPath { handler: String, path: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config load: {0}")]
    Load(String),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("validation: {0}")]
    Validation(String),
}

/// Application error kinds a handler may return; converted to [`ApiErrorBody`] by the request adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid value for {field}: {message}")]
    Value { field: String, message: String },
    #[error("{field} not found: {message}")]
    NotFound { field: String, message: String },
    #[error("permission denied: {message}")]
    Permission { message: String },
}

/// Wire contract for application errors: `{ "error", "data", "message" }`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    pub error: String,
    pub data: String,
    pub message: String,
}

impl ApiError {
    pub fn value(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Value {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn permission(message: impl Into<String>) -> Self {
        ApiError::Permission {
            message: message.into(),
        }
    }

    pub fn body(&self) -> ApiErrorBody {
        let (error, data, message) = match self {
            ApiError::Value { field, message } => ("Value : Invalid", field.as_str(), message),
            ApiError::NotFound { field, message } => ("Value : Not Found", field.as_str(), message),
            ApiError::Permission { message } => ("Permission : Forbidden", "Permission", message),
        };
        ApiErrorBody {
            error: error.to_string(),
            data: data.to_string(),
            message: message.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Body could not be read; keeps the extractor's status (e.g. 413 past the body limit).
    #[error("rejected: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Api(e) => return (StatusCode::OK, Json(e.body())).into_response(),
            AppError::Definition(_) => (StatusCode::INTERNAL_SERVER_ERROR, "definition_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Rejected { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                (*status, "payload_too_large")
            }
            AppError::Rejected { status, .. } => (*status, "bad_request"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_body_carries_field_and_message() {
        let body = ApiError::not_found("blog", "no such blog").body();
        assert_eq!(body.error, "Value : Not Found");
        assert_eq!(body.data, "blog");
        assert_eq!(body.message, "no such blog");
    }

    #[test]
    fn permission_body_uses_fixed_data() {
        let body = ApiError::permission("admin only").body();
        assert_eq!(body.error, "Permission : Forbidden");
        assert_eq!(body.data, "Permission");
    }

    #[test]
    fn bad_request_maps_to_400() {
        let res = AppError::BadRequest("Missing Content-Type.".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rejection_keeps_its_status() {
        let res = AppError::Rejected {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn api_error_is_data_not_failure() {
        let res = AppError::Api(ApiError::value("email", "bad")).into_response();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
