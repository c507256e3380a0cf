//! Safe SQL builder for the PostgreSQL document store: identifiers from descriptors only, values as parameters.

mod builder;
pub mod params;
pub use builder::*;
pub use params::*;
