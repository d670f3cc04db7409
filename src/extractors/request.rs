//! Request metadata handed to handlers that declare a `request` parameter.

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap, Method, Uri},
};
use std::sync::Arc;

/// Declared capture names of the matched route, in pattern order. The router names captures by
/// position; this restores the names the handler declared.
#[derive(Clone, Debug)]
pub struct CaptureNames(pub Arc<[String]>);

/// Method, URI, headers and path-captured segments of the inbound request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Named path segments in pattern order, e.g. `name` for `/greeting/{name}`.
    pub match_info: Vec<(String, String)>,
}

impl RequestContext {
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Lowercased media type without parameters, e.g. `application/json`.
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }

    pub fn match_value(&self, name: &str) -> Option<&str> {
        self.match_info
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let match_info = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map(|Path(p)| p)
            .unwrap_or_default();
        let match_info = match parts.extensions.get::<CaptureNames>() {
            Some(CaptureNames(names)) => names
                .iter()
                .cloned()
                .zip(match_info.into_iter().map(|(_, v)| v))
                .collect(),
            None => match_info,
        };
        Ok(RequestContext {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            match_info,
        })
    }
}
