//! Declared models: a fixed-shape record type per table, its compiled schema, and the
//! find/save/update/remove accessors routed through [`Database`].
//!
//! A model is a serde struct (every column an `Option<_>`, absent = not yet set) that returns its
//! compiled [`ModelSchema`] from a per-type static:
//!
//! ```ignore
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct User { id: Option<String>, email: Option<String> }
//!
//! impl Model for User {
//!     fn schema() -> Result<&'static ModelSchema, DefinitionError> {
//!         webplan::model_schema!("users", [Field::string("id").primary_key(), Field::string("email")])
//!     }
//! }
//! ```

mod field;
mod schema;

pub use field::{Field, FieldDefault, FieldKind};
pub use schema::{FindAll, ModelSchema};

use crate::error::{AppError, DefinitionError};
use crate::service::{Database, Row};
use crate::sql::Limit;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Compile a schema once per model type and hand out the shared reference afterwards.
#[macro_export]
macro_rules! model_schema {
    ($table:expr, [$($field:expr),* $(,)?]) => {{
        static SCHEMA: ::std::sync::OnceLock<
            ::std::result::Result<$crate::model::ModelSchema, $crate::error::DefinitionError>,
        > = ::std::sync::OnceLock::new();
        SCHEMA
            .get_or_init(|| $crate::model::ModelSchema::compile($table, ::std::vec![$($field),*]))
            .as_ref()
            .map_err(::std::clone::Clone::clone)
    }};
}

/// Compile the model's schema now so definition errors surface at startup.
pub fn register<M: Model>() -> Result<&'static ModelSchema, DefinitionError> {
    let schema = M::schema()?;
    tracing::info!(table = %schema.table, primary_key = %schema.primary_key, "registered model");
    Ok(schema)
}

fn is_absent(v: Option<&Value>) -> bool {
    matches!(v, None | Some(Value::Null))
}

#[async_trait]
pub trait Model: Serialize + DeserializeOwned + Send + Sync {
    fn schema() -> Result<&'static ModelSchema, DefinitionError>;

    fn from_row(row: Row) -> Result<Self, AppError> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }

    /// Current field values keyed by field name.
    fn to_row(&self) -> Result<Row, AppError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(AppError::Decode(serde::ser::Error::custom(format!(
                "model must serialize to an object, got {}",
                other
            )))),
        }
    }

    /// Raw current value; `None` when unset.
    fn value(&self, name: &str) -> Result<Option<Value>, AppError> {
        let mut row = self.to_row()?;
        Ok(row.remove(name).filter(|v| !v.is_null()))
    }

    /// Current value, or the field's default resolved and cached onto `self`.
    fn value_or_default(&mut self, name: &str) -> Result<Option<Value>, AppError> {
        let schema = Self::schema()?;
        let mut values = write_values(self, schema, &[name], true)?;
        Ok(values.pop().filter(|v| !v.is_null()))
    }

    /// Lookup by primary key. `pk` may be a request string (`"7"` for an integer key).
    async fn find(db: &Database, pk: Value) -> Result<Option<Self>, AppError> {
        let schema = Self::schema()?;
        let pk = schema.coerce(&schema.primary_key, pk);
        let mut rows = db.select(&schema.select_by_pk, &[pk], Some(Limit::Count(1))).await?;
        rows.pop().map(Self::from_row).transpose()
    }

    async fn find_all(db: &Database, query: FindAll) -> Result<Vec<Self>, AppError> {
        let schema = Self::schema()?;
        let (sql, args) = schema.find_all_sql(&query);
        let rows = db.select(&sql, &args, None).await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    async fn find_number(
        db: &Database,
        select_expr: &str,
        where_clause: Option<&str>,
        args: Vec<Value>,
    ) -> Result<Option<Value>, AppError> {
        let schema = Self::schema()?;
        let sql = schema.find_number_sql(select_expr, where_clause);
        let mut rows = db.select(&sql, &args, Some(Limit::Count(1))).await?;
        Ok(rows.pop().and_then(|mut r| r.remove("_num_")))
    }

    /// Insert; unset fields fall back to their defaults. Returns the affected-row count.
    async fn save(&mut self, db: &Database) -> Result<u64, AppError> {
        let schema = Self::schema()?;
        let args = write_values(self, schema, &ordered_columns(schema), true)?;
        let rows = db.execute(&schema.insert, &args, db.autocommit()).await?;
        if rows != 1 {
            tracing::warn!(table = %schema.table, "failed to insert record: affected rows: {}", rows);
        }
        Ok(rows)
    }

    async fn update(&self, db: &Database) -> Result<u64, AppError> {
        let schema = Self::schema()?;
        let Some(sql) = schema.update.as_deref() else {
            tracing::warn!(table = %schema.table, "nothing to update: model has no non-key fields");
            return Ok(0);
        };
        let row = self.to_row()?;
        let args: Vec<Value> = ordered_columns(schema)
            .iter()
            .map(|name| schema.coerce(name, row.get(*name).cloned().unwrap_or(Value::Null)))
            .collect();
        let rows = db.execute(sql, &args, db.autocommit()).await?;
        if rows != 1 {
            tracing::warn!(table = %schema.table, "failed to update by primary key: affected rows: {}", rows);
        }
        Ok(rows)
    }

    /// Delete the backing row. The instance itself is left as is.
    async fn remove(&self, db: &Database) -> Result<u64, AppError> {
        let schema = Self::schema()?;
        let pk = schema.coerce(&schema.primary_key, self.value(&schema.primary_key)?.unwrap_or(Value::Null));
        let rows = db.execute(&schema.delete, &[pk], db.autocommit()).await?;
        if rows != 1 {
            tracing::warn!(table = %schema.table, "failed to remove by primary key: affected rows: {}", rows);
        }
        Ok(rows)
    }
}

/// Non-key fields in declaration order, then the primary key.
fn ordered_columns(schema: &ModelSchema) -> Vec<&str> {
    schema
        .fields
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(schema.primary_key.as_str()))
        .collect()
}

/// Values for `names` in order. With `use_defaults`, unset fields take their declared default,
/// which is then written back onto `model`.
fn write_values<M: Model>(
    model: &mut M,
    schema: &ModelSchema,
    names: &[&str],
    use_defaults: bool,
) -> Result<Vec<Value>, AppError> {
    let mut row = model.to_row()?;
    let mut materialized = false;
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let current = row.get(*name);
        if use_defaults && is_absent(current) {
            if let Some(default) = schema.field(name).and_then(|f| f.default.as_ref()) {
                let value = default.resolve();
                tracing::debug!("using default value for {}: {}", name, value);
                row.insert(name.to_string(), value.clone());
                materialized = true;
                out.push(schema.coerce(name, value));
                continue;
            }
        }
        out.push(schema.coerce(name, current.cloned().unwrap_or(Value::Null)));
    }
    if materialized {
        *model = M::from_row(row)?;
    }
    Ok(out)
}
