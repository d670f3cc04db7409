//! Binding plan: built once per handler, replayed on every matching request.
//!
//! A request moves through collect → merge path → validate → invoke. Keyword data is read from
//! the query string (GET) or the body (POST) only when the handler declares keyword parameters;
//! path segments always win over same-named keywords; missing required keywords are a bad
//! request; application errors returned by the handler become the structured error payload.

use crate::binding::kwargs::Kwargs;
use crate::binding::signature::{classify, ParamClassification, Signature};
use crate::error::{AppError, DefinitionError};
use crate::extractors::RequestContext;
use crate::response::Payload;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerResult = Result<Payload, AppError>;
pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;
pub type Handler = Arc<dyn Fn(AppState, Kwargs) -> HandlerFuture + Send + Sync>;

/// Box an async function or closure as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(AppState, Kwargs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |state: AppState, kw: Kwargs| -> HandlerFuture { Box::pin(f(state, kw)) })
}

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

fn rejected(status: StatusCode, message: String) -> AppError {
    AppError::Rejected { status, message }
}

/// First occurrence of each key wins.
fn pairs_to_map(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.entry(k).or_insert(Value::String(v));
    }
    map
}

#[derive(Clone)]
pub struct BindingPlan {
    pub handler_name: String,
    pub signature: Signature,
    pub params: ParamClassification,
    handler: Handler,
}

impl std::fmt::Debug for BindingPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingPlan")
            .field("handler_name", &self.handler_name)
            .field("signature", &self.signature.to_string())
            .field("params", &self.params)
            .finish()
    }
}

impl BindingPlan {
    pub fn new(handler_name: &str, signature: Signature, handler: Handler) -> Result<Self, DefinitionError> {
        let params = classify(handler_name, &signature)?;
        Ok(BindingPlan {
            handler_name: handler_name.to_string(),
            signature,
            params,
            handler,
        })
    }

    /// Run the whole plan for one request.
    pub async fn call(&self, state: AppState, req: Request) -> HandlerResult {
        let (mut parts, body) = req.into_parts();
        let ctx = RequestContext::from_request_parts(&mut parts, &state)
            .await
            .unwrap_or_else(|never| match never {});
        let req = Request::from_parts(parts, body);
        let raw = self.collect_raw(&ctx, req, &state).await?;
        let kw = self.merge_path(raw, &ctx);
        let kw = self.validate(kw, ctx)?;
        self.invoke(state, kw).await
    }

    /// Keyword data from the query string or body; `None` when the handler takes no keywords or
    /// the request carries none.
    pub async fn collect_raw(
        &self,
        ctx: &RequestContext,
        req: Request,
        state: &AppState,
    ) -> Result<Option<Map<String, Value>>, AppError> {
        if !self.params.needs_keywords() {
            return Ok(None);
        }
        if ctx.method == Method::GET {
            return match ctx.query_string().filter(|qs| !qs.is_empty()) {
                Some(qs) => {
                    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(qs)
                        .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e)))?;
                    Ok(Some(pairs_to_map(pairs)))
                }
                None => Ok(None),
            };
        }
        if ctx.method != Method::POST {
            return Ok(None);
        }
        let Some(ct) = ctx.content_type() else {
            return Err(AppError::BadRequest("Missing Content-Type.".into()));
        };
        if ct.starts_with(JSON) {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            let params: Value = serde_json::from_slice(&bytes)
                .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
            return match params {
                Value::Object(map) => Ok(Some(map)),
                _ => Err(AppError::BadRequest("JSON body must be object.".into())),
            };
        }
        if ct.starts_with(FORM) {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| AppError::BadRequest(format!("Invalid form body: {}", e)))?;
            return Ok(Some(pairs_to_map(pairs)));
        }
        if ct.starts_with(MULTIPART) {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?;
            let mut pairs = Vec::new();
            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| rejected(e.status(), e.body_text()))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let text = field
                    .text()
                    .await
                    .map_err(|e| rejected(e.status(), e.body_text()))?;
                pairs.push((name, text));
            }
            return Ok(Some(pairs_to_map(pairs)));
        }
        Err(AppError::BadRequest(format!(
            "Unsupported Content-Type: {}",
            ct
        )))
    }

    /// Prune to declared keywords unless the handler takes arbitrary ones, then overlay path
    /// segments. Without raw data the working set is exactly the path segments.
    pub fn merge_path(&self, raw: Option<Map<String, Value>>, ctx: &RequestContext) -> Map<String, Value> {
        let Some(mut kw) = raw else {
            return ctx
                .match_info
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
        };
        if !self.params.var_keyword {
            kw.retain(|k, _| self.params.named.contains(k));
        }
        for (k, v) in &ctx.match_info {
            if kw.contains_key(k) {
                tracing::warn!(handler = %self.handler_name, "Duplicate arg name in named arg and kw args: {}", k);
            }
            kw.insert(k.clone(), Value::String(v.clone()));
        }
        kw
    }

    /// Inject the request object when declared and check required keywords; the first missing
    /// one is reported.
    pub fn validate(&self, kw: Map<String, Value>, ctx: RequestContext) -> Result<Kwargs, AppError> {
        let mut kw = Kwargs::new(kw);
        if self.params.request {
            kw = kw.with_request(ctx);
        }
        if let Some(missing) = self.params.required.iter().find(|name| !kw.contains(name)) {
            return Err(AppError::BadRequest(format!("Missing argument: {}", missing)));
        }
        Ok(kw)
    }

    /// Call the handler. Application errors are the only failures turned into data here.
    pub async fn invoke(&self, state: AppState, kw: Kwargs) -> HandlerResult {
        tracing::info!(handler = %self.handler_name, "call with args: {:?}", kw.names());
        match (self.handler)(state, kw).await {
            Err(AppError::Api(e)) => {
                tracing::info!(handler = %self.handler_name, error = %e, "api error");
                Ok(Payload::from(e))
            }
            other => other,
        }
    }
}
