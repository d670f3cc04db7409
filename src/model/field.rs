//! Field descriptors: one column's storage type, key flag and default.

use serde_json::{Number, Value};
use std::fmt;

/// Logical column kind; fixes the storage type and whether the field may be a primary key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
}

impl FieldKind {
    pub fn can_be_primary_key(&self) -> bool {
        matches!(self, FieldKind::String | FieldKind::Integer | FieldKind::Float)
    }

    /// Reshape a loosely typed value (path segments and form fields arrive as strings) into the
    /// JSON shape bound for this kind. Values that do not convert are returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        match (*self, value) {
            (FieldKind::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (FieldKind::Float, Value::String(s)) => {
                match s.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                    Some(n) => Value::Number(n),
                    None => Value::String(s),
                }
            }
            (FieldKind::Float, Value::Number(n)) => match n.as_f64().and_then(Number::from_f64) {
                Some(f) => Value::Number(f),
                None => Value::Number(n),
            },
            (FieldKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => Value::Bool(true),
                "false" | "0" | "off" | "no" => Value::Bool(false),
                _ => Value::String(s),
            },
            (FieldKind::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Value::Bool(false),
                Some(1) => Value::Bool(true),
                _ => Value::Number(n),
            },
            (FieldKind::String | FieldKind::Text, Value::Number(n)) => Value::String(n.to_string()),
            (FieldKind::String | FieldKind::Text, Value::Bool(b)) => Value::String(b.to_string()),
            (_, value) => value,
        }
    }
}

/// Default for a field: a literal, or a zero-argument producer evaluated each time it is needed.
#[derive(Clone)]
pub enum FieldDefault {
    Literal(Value),
    Producer(fn() -> Value),
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::Literal(v) => v.clone(),
            FieldDefault::Producer(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Literal(v) => write!(f, "Literal({})", v),
            FieldDefault::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub storage_type: String,
    pub primary_key: bool,
    pub default: Option<FieldDefault>,
}

impl Field {
    fn new(name: &str, kind: FieldKind, storage_type: &str, default: Option<FieldDefault>) -> Self {
        Field {
            name: name.to_string(),
            kind,
            storage_type: storage_type.to_string(),
            primary_key: false,
            default,
        }
    }

    /// `varchar(100)`, no default.
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldKind::String, "varchar(100)", None)
    }

    /// `boolean`, defaults to false.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Boolean, "boolean", Some(FieldDefault::Literal(Value::Bool(false))))
    }

    /// `bigint`, defaults to 0.
    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldKind::Integer, "bigint", Some(FieldDefault::Literal(Value::from(0))))
    }

    /// `double precision`, defaults to 0.0.
    pub fn float(name: &str) -> Self {
        Self::new(name, FieldKind::Float, "double precision", Some(FieldDefault::Literal(Value::from(0.0))))
    }

    /// `text`, no default.
    pub fn text(name: &str) -> Self {
        Self::new(name, FieldKind::Text, "text", None)
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Override the storage type, e.g. `varchar(50)`.
    pub fn ddl(mut self, storage_type: &str) -> Self {
        self.storage_type = storage_type.to_string();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Literal(value.into()));
        self
    }

    pub fn default_with(mut self, producer: fn() -> Value) -> Self {
        self.default = Some(FieldDefault::Producer(producer));
        self
    }

    pub fn no_default(mut self) -> Self {
        self.default = None;
        self
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{:?}, {}:{}>", self.kind, self.storage_type, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Value {
        Value::from(7)
    }

    #[test]
    fn constructors_carry_storage_defaults() {
        assert_eq!(Field::integer("n").default.map(|d| d.resolve()), Some(Value::from(0)));
        assert_eq!(Field::boolean("b").default.map(|d| d.resolve()), Some(Value::Bool(false)));
        assert!(Field::string("s").default.is_none());
        assert_eq!(Field::float("f").storage_type, "double precision");
        assert_eq!(Field::string("s").ddl("varchar(50)").storage_type, "varchar(50)");
    }

    #[test]
    fn producer_default_is_called() {
        let f = Field::integer("n").default_with(counter);
        assert_eq!(f.default.map(|d| d.resolve()), Some(Value::from(7)));
    }

    #[test]
    fn float_coercion_keeps_fraction_and_binds_as_float() {
        let v = FieldKind::Float.coerce(Value::from(3));
        assert_eq!(v.as_i64(), None);
        assert_eq!(v.as_f64(), Some(3.0));
        let v = FieldKind::Float.coerce(Value::from("1760000000.123456"));
        assert_eq!(v.as_f64(), Some(1760000000.123456));
        assert_eq!(FieldKind::Boolean.coerce(Value::from(0)), Value::Bool(false));
        assert_eq!(FieldKind::Integer.coerce(Value::Null), Value::Null);
    }

    #[test]
    fn only_scalar_kinds_can_key() {
        assert!(FieldKind::String.can_be_primary_key());
        assert!(!FieldKind::Boolean.can_be_primary_key());
        assert!(!FieldKind::Text.can_be_primary_key());
    }
}
