//! Database access: pooled executor and row decoding.

mod executor;
mod row;
pub use executor::Database;
pub use row::{row_to_map, Row};
