//! webplan: inspect a definition once, compile a reusable plan, replay it per call.
//!
//! Models compile to parameterized SELECT/INSERT/UPDATE/DELETE templates executed through a
//! pooled PostgreSQL connection; handlers compile to binding plans that pull their keyword
//! arguments out of query strings, bodies and path segments.

pub mod binding;
pub mod config;
pub mod error;
pub mod extractors;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use inventory;

pub use binding::{handler, BindingPlan, Handler, HandlerResult, Kwargs, Signature};
pub use config::{load_config, load_config_from_env, AppConfig, DbConfig, ServerConfig};
pub use error::{ApiError, ApiErrorBody, AppError, ConfigError, DefinitionError};
pub use extractors::RequestContext;
pub use model::{register, Field, FindAll, Model, ModelSchema};
pub use response::Payload;
pub use routes::{HandlerDecl, RouteTable};
pub use service::{Database, Row};
pub use sql::Limit;
pub use state::AppState;
