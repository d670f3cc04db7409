//! Convert serde_json::Value to types that sqlx can bind.

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. Converts from serde_json::Value.
///
/// Each variant declares its own parameter type; `Null` is sent untyped so the server infers it
/// from the column it lands in.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Json(Value),
}

impl SqlValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    SqlValue::I64(i)
                } else if let Some(f) = n.as_f64() {
                    SqlValue::F64(f)
                } else {
                    SqlValue::Json(v.clone())
                }
            }
            Value::String(s) => SqlValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Json(v.clone()),
        }
    }
}

impl<'q> Encode<'q, Postgres> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            SqlValue::Null => IsNull::Yes,
            SqlValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            SqlValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::String(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
            SqlValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            SqlValue::Null => PgTypeInfo::with_oid(Oid(0)),
            SqlValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            SqlValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            SqlValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            SqlValue::String(_) => <String as Type<Postgres>>::type_info(),
            SqlValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for SqlValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_keep_integer_precision() {
        assert_eq!(SqlValue::from_json(&json!(42)), SqlValue::I64(42));
        assert_eq!(SqlValue::from_json(&json!(1.5)), SqlValue::F64(1.5));
    }

    #[test]
    fn structured_values_bind_as_json() {
        let v = json!({"a": [1, 2]});
        assert_eq!(SqlValue::from_json(&v), SqlValue::Json(v.clone()));
        assert_eq!(SqlValue::from_json(&Value::Null), SqlValue::Null);
    }
}
