//! Keyword arguments a handler is invoked with.

use crate::binding::signature::REQUEST_PARAM;
use crate::error::{ApiError, AppError};
use crate::extractors::RequestContext;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Default)]
pub struct Kwargs {
    values: Map<String, Value>,
    request: Option<RequestContext>,
}

impl Kwargs {
    pub fn new(values: Map<String, Value>) -> Self {
        Kwargs {
            values,
            request: None,
        }
    }

    /// Inject the request object under the reserved `request` name.
    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.values.remove(REQUEST_PARAM);
        self.request = Some(request);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        if name == REQUEST_PARAM && self.request.is_some() {
            return true;
        }
        self.values.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn request(&self) -> Option<&RequestContext> {
        self.request.as_ref()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_values(self) -> Map<String, Value> {
        self.values
    }

    /// Names present, with `request` last when injected.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        if self.request.is_some() {
            names.push(REQUEST_PARAM);
        }
        names
    }

    /// Remove and decode `name`; `Ok(None)` when absent.
    pub fn take<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>, AppError> {
        match self.values.remove(name) {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    /// Remove and decode `name`; a missing or undecodable value is a value error for that field.
    pub fn require<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, ApiError> {
        let v = self
            .values
            .remove(name)
            .ok_or_else(|| ApiError::value(name, format!("{} is required", name)))?;
        serde_json::from_value(v).map_err(|e| ApiError::value(name, e.to_string()))
    }

    /// Decode the whole working set into a struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        Ok(serde_json::from_value(Value::Object(self.values.clone()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kw(v: Value) -> Kwargs {
        match v {
            Value::Object(m) => Kwargs::new(m),
            _ => unreachable!(),
        }
    }

    #[test]
    fn take_and_require_decode_values() {
        let mut k = kw(json!({"name": "Ruhua", "page": 2}));
        assert_eq!(k.str("name"), Some("Ruhua"));
        assert_eq!(k.take::<u32>("page").unwrap(), Some(2));
        assert_eq!(k.take::<u32>("page").unwrap(), None);
        assert_eq!(k.require::<String>("name").unwrap(), "Ruhua");
        assert_eq!(
            k.require::<String>("name").unwrap_err(),
            ApiError::value("name", "name is required")
        );
    }

    #[test]
    fn request_counts_as_present_only_when_injected() {
        let k = kw(json!({"request": "spoofed"}));
        assert!(k.contains("request"));
        assert!(k.request().is_none());
        let ctx = RequestContext {
            method: axum::http::Method::GET,
            uri: "/x".parse().unwrap(),
            headers: Default::default(),
            match_info: vec![],
        };
        let k = k.with_request(ctx);
        assert!(k.get("request").is_none());
        assert!(k.contains("request"));
        assert_eq!(k.names(), vec!["request"]);
    }
}
