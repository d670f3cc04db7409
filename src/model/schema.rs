//! Model schema: field list split around the primary key, plus the four compiled statements.

use crate::error::DefinitionError;
use crate::model::field::Field;
use crate::sql::{placeholders, quoted, Limit};
use serde_json::Value;
use std::collections::HashSet;

/// Immutable once compiled; shared by every instance of the model type.
#[derive(Clone, Debug)]
pub struct ModelSchema {
    pub table: String,
    pub primary_key: String,
    /// Non-key fields in declaration order; this is the positional order of statement values.
    pub fields: Vec<String>,
    pub mappings: Vec<Field>,
    pub select: String,
    /// `select` narrowed to one primary key value.
    pub select_by_pk: String,
    pub insert: String,
    /// `None` when the model has no non-key fields.
    pub update: Option<String>,
    pub delete: String,
}

/// Filter, ordering and row window appended to the compiled select, in that order.
#[derive(Clone, Debug, Default)]
pub struct FindAll {
    pub where_clause: Option<String>,
    pub args: Vec<Value>,
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.where_clause = Some(clause.into());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }
}

impl ModelSchema {
    pub fn compile(table: &str, declared: Vec<Field>) -> Result<Self, DefinitionError> {
        tracing::info!(table = %table, "found model");
        let mut primary_key: Option<String> = None;
        let mut fields = Vec::new();
        let mut seen = HashSet::new();
        for f in &declared {
            tracing::debug!(table = %table, "  found mapping: {} ==> {}", f.name, f);
            if !seen.insert(f.name.as_str()) {
                return Err(DefinitionError::DuplicateField {
                    model: table.to_string(),
                    field: f.name.clone(),
                });
            }
            if !f.primary_key {
                fields.push(f.name.clone());
                continue;
            }
            if primary_key.is_some() {
                return Err(DefinitionError::DuplicatePrimaryKey {
                    model: table.to_string(),
                    field: f.name.clone(),
                });
            }
            if !f.kind.can_be_primary_key() {
                return Err(DefinitionError::UnsupportedPrimaryKey {
                    model: table.to_string(),
                    field: f.name.clone(),
                    storage_type: f.storage_type.clone(),
                });
            }
            primary_key = Some(f.name.clone());
        }
        let primary_key = primary_key.ok_or_else(|| DefinitionError::MissingPrimaryKey {
            model: table.to_string(),
        })?;

        let q_table = quoted(table);
        let q_pk = quoted(&primary_key);
        let escaped: Vec<String> = fields.iter().map(|f| quoted(f)).collect();
        let columns: Vec<String> = escaped.iter().cloned().chain(std::iter::once(q_pk.clone())).collect();

        let select = format!(
            "SELECT {} FROM {}",
            std::iter::once(q_pk.clone())
                .chain(escaped.iter().cloned())
                .collect::<Vec<_>>()
                .join(", "),
            q_table
        );
        let select_by_pk = format!("{} WHERE {}=?", select, q_pk);
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            q_table,
            columns.join(", "),
            placeholders(columns.len())
        );
        let update = if escaped.is_empty() {
            None
        } else {
            Some(format!(
                "UPDATE {} SET {} WHERE {}=?",
                q_table,
                escaped.iter().map(|f| format!("{}=?", f)).collect::<Vec<_>>().join(", "),
                q_pk
            ))
        };
        let delete = format!("DELETE FROM {} WHERE {}=?", q_table, q_pk);

        Ok(ModelSchema {
            table: table.to_string(),
            primary_key,
            fields,
            mappings: declared,
            select,
            select_by_pk,
            insert,
            update,
            delete,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.mappings.iter().find(|f| f.name == name)
    }

    /// `value` shaped for the column `name` is stored in; unknown names pass through.
    pub fn coerce(&self, name: &str, value: Value) -> Value {
        match self.field(name) {
            Some(f) => f.kind.coerce(value),
            None => value,
        }
    }

    /// Compiled select extended with where → order by → limit; limit values follow the caller's args.
    pub fn find_all_sql(&self, query: &FindAll) -> (String, Vec<Value>) {
        let mut sql = vec![self.select.clone()];
        let mut args = query.args.clone();
        if let Some(w) = query.where_clause.as_deref().filter(|w| !w.is_empty()) {
            sql.push("WHERE".into());
            sql.push(w.to_string());
        }
        if let Some(o) = query.order_by.as_deref().filter(|o| !o.is_empty()) {
            sql.push("ORDER BY".into());
            sql.push(o.to_string());
        }
        if let Some(limit) = &query.limit {
            let (clause, limit_args) = limit.clause();
            sql.push(clause.into());
            args.extend(limit_args);
        }
        (sql.join(" "), args)
    }

    /// `SELECT <expr> _num_ FROM <table> [WHERE ...]`; the scalar is read back from `_num_`.
    pub fn find_number_sql(&self, select_expr: &str, where_clause: Option<&str>) -> String {
        let mut sql = format!("SELECT {} _num_ FROM {}", select_expr, quoted(&self.table));
        if let Some(w) = where_clause.filter(|w| !w.is_empty()) {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        sql
    }

    /// Bootstrap DDL from declared storage types.
    pub fn create_table_sql(&self) -> String {
        let cols: Vec<String> = self
            .mappings
            .iter()
            .map(|f| {
                let not_null = if f.primary_key { " NOT NULL" } else { "" };
                format!("{} {}{}", quoted(&f.name), f.storage_type, not_null)
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
            quoted(&self.table),
            cols.join(", "),
            quoted(&self.primary_key)
        )
    }
}
