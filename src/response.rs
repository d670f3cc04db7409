//! Handler return values and their HTTP rendering.

use crate::error::ApiError;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// What a handler hands back; passed through to the client unchanged.
#[derive(Debug)]
pub enum Payload {
    Html(String),
    Text(String),
    Json(Value),
    /// Pre-built response, e.g. with a custom status.
    Response(Response),
}

impl Payload {
    pub fn json<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        Ok(Payload::Json(serde_json::to_value(data)?))
    }

    pub fn with_status(status: StatusCode, body: Value) -> Self {
        Payload::Response((status, Json(body)).into_response())
    }
}

impl From<ApiError> for Payload {
    fn from(e: ApiError) -> Self {
        Payload::Json(serde_json::to_value(e.body()).unwrap_or(Value::Null))
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Json(v)
    }
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        match self {
            Payload::Html(s) => Html(s).into_response(),
            Payload::Text(s) => s.into_response(),
            Payload::Json(v) => Json(v).into_response(),
            Payload::Response(r) => r,
        }
    }
}
