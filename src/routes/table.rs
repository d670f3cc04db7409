//! Route table: (method, path pattern) → binding plan, turned into an axum router.

use crate::binding::{BindingPlan, Handler, Signature};
use crate::error::DefinitionError;
use crate::extractors::CaptureNames;
use crate::routes::HandlerDecl;
use crate::state::AppState;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::Method;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

fn capture_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_]*)\}$").expect("static pattern"))
}

/// `/u/{id}/posts/{slug}` → (`/u/:p0/posts/:p1`, `[id, slug]`).
///
/// Captures are named by position in the router so patterns that differ only in capture names
/// share one router path. `None` for malformed patterns: no leading slash, braces that do not
/// span a whole segment, or a capture name used twice.
pub(crate) fn router_path(pattern: &str) -> Option<(String, Vec<String>)> {
    let rest = pattern.strip_prefix('/')?;
    let mut names: Vec<String> = Vec::new();
    let mut segments = Vec::new();
    for segment in rest.split('/') {
        if !segment.contains(['{', '}']) {
            segments.push(segment.to_string());
            continue;
        }
        let name = capture_re().captures(segment)?[1].to_string();
        if names.contains(&name) {
            return None;
        }
        segments.push(format!(":p{}", names.len()));
        names.push(name);
    }
    Some((format!("/{}", segments.join("/")), names))
}

#[derive(Clone, Debug)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    pub plan: Arc<BindingPlan>,
    filter: MethodFilter,
    router_path: String,
    captures: CaptureNames,
}

#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every handler declared under `namespace` (a module path) into a new table.
    pub fn scan(namespace: &str) -> Result<Self, DefinitionError> {
        let mut table = Self::new();
        table.scan_into(namespace)?;
        Ok(table)
    }

    /// Register declared handlers whose module is `namespace` or nested below it.
    pub fn scan_into(&mut self, namespace: &str) -> Result<usize, DefinitionError> {
        let nested = format!("{}::", namespace);
        let mut decls: Vec<&HandlerDecl> = inventory::iter::<HandlerDecl>
            .into_iter()
            .filter(|d| d.module == namespace || d.module.starts_with(&nested))
            .collect();
        decls.sort_by_key(|d| (d.module, d.name, d.path, d.method));
        for decl in &decls {
            self.add_decl(decl)?;
        }
        tracing::info!(namespace = %namespace, count = decls.len(), "scanned handlers");
        Ok(decls.len())
    }

    pub fn add_decl(&mut self, decl: &HandlerDecl) -> Result<(), DefinitionError> {
        let call = decl.call;
        let handler: Handler = Arc::new(call);
        self.add(decl.method, decl.path, decl.name, (decl.signature)(), handler)
    }

    /// Classify the signature, build the plan and store it. A later registration for the same
    /// method and path shape (`/u/{id}` and `/u/{name}` alike) replaces the earlier one.
    pub fn add(
        &mut self,
        method: &str,
        path: &str,
        name: &str,
        signature: Signature,
        handler: Handler,
    ) -> Result<(), DefinitionError> {
        let invalid_method = || DefinitionError::InvalidMethod {
            handler: name.to_string(),
            method: method.to_string(),
        };
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| invalid_method())?;
        let filter = MethodFilter::try_from(method.clone()).map_err(|_| invalid_method())?;
        let (router_path, captures) = router_path(path).ok_or_else(|| DefinitionError::InvalidPath {
            handler: name.to_string(),
            path: path.to_string(),
        })?;
        tracing::info!("add route {} {} => {}({})", method, path, name, signature);
        let plan = Arc::new(BindingPlan::new(name, signature, handler)?);
        let entry = RouteEntry {
            method,
            path: path.to_string(),
            plan,
            filter,
            router_path,
            captures: CaptureNames(Arc::from(captures)),
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.method == entry.method && e.router_path == entry.router_path)
        {
            Some(existing) => {
                tracing::warn!(
                    "route {} {} re-registered as {}: {} replaces {}",
                    entry.method,
                    existing.path,
                    entry.path,
                    entry.plan.handler_name,
                    existing.plan.handler_name
                );
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
        Ok(())
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| &e.method == method && e.path == path)
    }

    /// Router serving every entry, with request bodies capped at `config.server.max_body_bytes`.
    pub fn into_router(self, state: AppState) -> Router {
        let limit = state.config.server.max_body_bytes;
        let mut order: Vec<String> = Vec::new();
        let mut by_path: HashMap<String, MethodRouter<AppState>> = HashMap::new();
        for entry in self.entries {
            let plan = entry.plan;
            let captures = entry.captures;
            let endpoint = move |State(state): State<AppState>, mut req: Request| async move {
                req.extensions_mut().insert(captures);
                plan.call(state, req).await
            };
            let method_router = match by_path.remove(&entry.router_path) {
                Some(existing) => existing.on(entry.filter, endpoint),
                None => {
                    order.push(entry.router_path.clone());
                    on(entry.filter, endpoint)
                }
            };
            by_path.insert(entry.router_path, method_router);
        }
        let mut router = Router::new();
        for path in order {
            if let Some(method_router) = by_path.remove(&path) {
                router = router.route(&path, method_router);
            }
        }
        router
            .layer(DefaultBodyLimit::disable())
            .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(limit)))
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{handler, Kwargs};
    use crate::config::AppConfig;
    use crate::response::Payload;
    use crate::service::Database;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn text(s: &'static str) -> Handler {
        handler(move |_, _| async move { Ok(Payload::Text(s.to_string())) })
    }

    fn echo() -> Handler {
        handler(|_, kw: Kwargs| async move { Ok(Payload::Json(Value::Object(kw.into_values()))) })
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn patterns_translate_to_positional_router_captures() {
        assert_eq!(router_path("/greeting/{name}"), Some(("/greeting/:p0".into(), names(&["name"]))));
        assert_eq!(router_path("/a/{x}/b/{y_2}"), Some(("/a/:p0/b/:p1".into(), names(&["x", "y_2"]))));
        assert_eq!(router_path("/"), Some(("/".into(), vec![])));
        assert_eq!(router_path("no-slash"), None);
        assert_eq!(router_path("/bad/{1x}"), None);
        assert_eq!(router_path("/bad/{x"), None);
        assert_eq!(router_path("/bad/{x}.json"), None);
        assert_eq!(router_path("/bad/{x}/{x}"), None);
    }

    #[test]
    fn same_shape_with_other_capture_name_replaces() {
        let mut t = RouteTable::new();
        t.add("GET", "/u/{id}", "by_id", Signature::new(), text("1")).unwrap();
        t.add("GET", "/u/{name}", "by_name", Signature::new(), text("2")).unwrap();
        assert_eq!(t.entries().len(), 1);
        assert_eq!(t.lookup(&Method::GET, "/u/{name}").unwrap().plan.handler_name, "by_name");
    }

    async fn send(router: Router, req: axum::http::Request<Body>) -> Value {
        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn overlapping_capture_names_build_one_router() {
        let mut t = RouteTable::new();
        t.add("GET", "/u/{id}", "get_user", Signature::new().keyword("id"), echo()).unwrap();
        t.add("POST", "/u/{name}", "rename", Signature::new().var_keyword("kw"), echo()).unwrap();
        t.add("GET", "/u/{user}/posts/{post}", "post", Signature::new().keyword("post"), echo()).unwrap();
        t.add("GET", "/u/new", "form", Signature::new(), echo()).unwrap();
        let config = AppConfig::default();
        let router = t.into_router(AppState::new(Database::connect_lazy(&config.db), config));

        let get = |uri: &str| axum::http::Request::get(uri).body(Body::empty()).unwrap();
        assert_eq!(send(router.clone(), get("/u/7")).await, json!({"id": "7"}));
        assert_eq!(
            send(router.clone(), get("/u/7/posts/9")).await,
            json!({"user": "7", "post": "9"})
        );
        assert_eq!(send(router.clone(), get("/u/new")).await, json!({}));
        let post = axum::http::Request::post("/u/ann")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"x": 1}"#))
            .unwrap();
        assert_eq!(send(router, post).await, json!({"x": 1, "name": "ann"}));
    }

    #[test]
    fn last_registration_wins() {
        let mut t = RouteTable::new();
        t.add("GET", "/", "first", Signature::new(), text("1")).unwrap();
        t.add("get", "/", "second", Signature::new(), text("2")).unwrap();
        t.add("POST", "/", "third", Signature::new(), text("3")).unwrap();
        assert_eq!(t.entries().len(), 2);
        assert_eq!(t.lookup(&Method::GET, "/").unwrap().plan.handler_name, "second");
    }

    #[test]
    fn bad_declarations_fail_registration() {
        let mut t = RouteTable::new();
        assert!(matches!(
            t.add("GE T", "/", "h", Signature::new(), text("")),
            Err(DefinitionError::InvalidMethod { .. })
        ));
        assert!(matches!(
            t.add("GET", "x", "h", Signature::new(), text("")),
            Err(DefinitionError::InvalidPath { .. })
        ));
        assert!(matches!(
            t.add("GET", "/", "h", Signature::new().request().positional("x"), text("")),
            Err(DefinitionError::RequestParameterPosition { .. })
        ));
        assert!(t.entries().is_empty());
    }
}
