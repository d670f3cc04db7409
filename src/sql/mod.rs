//! Safe SQL text: identifiers from model definitions only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
