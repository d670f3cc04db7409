//! HTML pages and the `/api/users` JSON endpoints.

use crate::models::User;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use webplan::{ApiError, AppState, FindAll, HandlerResult, Kwargs, Model, Payload, Signature};

/// Module path handlers in this file are registered under.
pub const NAMESPACE: &str = module_path!();

const PAGE_SIZE: u64 = 10;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9.\-_]+@[a-z0-9\-_]+(\.[a-z0-9\-_]+){1,4}$").expect("static pattern"))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Page {
    pub page_index: u64,
    pub page_size: u64,
    pub item_count: u64,
    pub page_count: u64,
    pub offset: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Page {
    /// Clamp `page_index` into range; an empty result set is always page 1 of 0.
    pub fn new(item_count: u64, page_index: u64, page_size: u64) -> Self {
        let page_count = item_count.div_ceil(page_size);
        let page_index = if item_count == 0 || page_index == 0 || page_index > page_count {
            1
        } else {
            page_index
        };
        let offset = if item_count == 0 { 0 } else { page_size * (page_index - 1) };
        Page {
            page_index,
            page_size,
            item_count,
            page_count,
            offset,
            has_next: page_index < page_count,
            has_previous: page_index > 1,
        }
    }
}

/// `page` may arrive as a query string or a JSON number.
fn page_index(raw: Option<Value>) -> Result<u64, ApiError> {
    let invalid = || ApiError::value("page", "page must be a positive integer");
    match raw {
        None => Ok(1),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

async fn index(_state: AppState, _kw: Kwargs) -> HandlerResult {
    Ok(Payload::Html("<h1>Awesome, webplan !</h1>".into()))
}

async fn greeting(_state: AppState, mut kw: Kwargs) -> HandlerResult {
    let name: String = kw.require("name")?;
    Ok(Payload::Html(format!("<h1>Awesome: greeting {} !</h1>", name)))
}

async fn api_users(state: AppState, mut kw: Kwargs) -> HandlerResult {
    let index = page_index(kw.take("page")?)?;
    let count = User::find_number(&state.db, "count(\"id\")", None, vec![])
        .await?
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let page = Page::new(count, index, PAGE_SIZE);
    if count == 0 {
        return Ok(Payload::Json(json!({ "page": page, "users": [] })));
    }
    let users = User::find_all(
        &state.db,
        FindAll::new()
            .order_by("\"created_at\" desc")
            .limit((page.offset, page.page_size)),
    )
    .await?;
    Ok(Payload::Json(json!({ "page": page, "users": users })))
}

async fn api_register(state: AppState, mut kw: Kwargs) -> HandlerResult {
    let email: String = kw.require("email")?;
    let name: String = kw.require("name")?;
    let email = email.trim().to_lowercase();
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::value("name", "name must not be empty").into());
    }
    if !email_re().is_match(&email) {
        return Err(ApiError::value("email", "invalid email address").into());
    }
    let existing = User::find_all(
        &state.db,
        FindAll::new().filter("\"email\" = ?", vec![json!(email)]).limit(1u64),
    )
    .await?;
    if !existing.is_empty() {
        return Err(ApiError::value("email", "Email is already in use.").into());
    }
    let mut user = User {
        email: Some(email),
        name: Some(name),
        ..Default::default()
    };
    user.save(&state.db).await?;
    tracing::info!(id = ?user.id, "registered user");
    Ok(Payload::json(&user)?)
}

async fn api_get_user(state: AppState, mut kw: Kwargs) -> HandlerResult {
    let id: String = kw.require("id")?;
    match User::find(&state.db, json!(id)).await? {
        Some(user) => Ok(Payload::json(&user)?),
        None => Err(ApiError::not_found("user", format!("user {} does not exist", id)).into()),
    }
}

webplan::route!(GET "/", index, Signature::new().request());
webplan::route!(GET "/greeting/{name}", greeting, Signature::new().keyword("name").keyword("request"));
webplan::route!(GET "/api/users", api_users, Signature::new().optional("page"));
webplan::route!(POST "/api/users", api_register, Signature::new().keyword("email").keyword("name"));
webplan::route!(GET "/api/users/{id}", api_get_user, Signature::new().keyword("id"));
