use serde::{Deserialize, Serialize};
use serde_json::Value;
use webplan::{DefinitionError, Field, Model, ModelSchema};

/// Sortable unique id: 15-digit millisecond timestamp, 32 hex chars of uuid, `000`.
pub fn next_id() -> Value {
    let millis = chrono::Utc::now().timestamp_millis();
    Value::String(format!("{:015}{}000", millis, uuid::Uuid::new_v4().simple()))
}

fn now() -> Value {
    let micros = chrono::Utc::now().timestamp_micros();
    Value::from(micros as f64 / 1_000_000.0)
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin: Option<bool>,
    pub created_at: Option<f64>,
}

impl Model for User {
    fn schema() -> Result<&'static ModelSchema, DefinitionError> {
        webplan::model_schema!(
            "users",
            [
                Field::string("id").primary_key().ddl("varchar(50)").default_with(next_id),
                Field::string("email").ddl("varchar(50)"),
                Field::string("name").ddl("varchar(50)"),
                Field::boolean("admin"),
                Field::float("created_at").default_with(now),
            ]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fixed_width_and_unique() {
        let a = next_id();
        let b = next_id();
        let a = a.as_str().unwrap();
        assert_eq!(a.len(), 50);
        assert!(a.ends_with("000"));
        assert_ne!(a, b.as_str().unwrap());
    }

    #[test]
    fn user_schema_compiles() {
        let schema = webplan::register::<User>().unwrap();
        assert_eq!(schema.primary_key, "id");
        assert_eq!(schema.fields, vec!["email", "name", "admin", "created_at"]);
    }

    #[test]
    fn defaults_fill_id_and_timestamp() {
        let mut user = User {
            email: Some("a@b.c".into()),
            ..Default::default()
        };
        assert!(user.value_or_default("id").unwrap().is_some());
        assert!(user.id.is_some());
        assert_eq!(user.value("name").unwrap(), None);
    }
}
