//! service-core: shared infrastructure for the document acknowledgment client.
pub mod config;
pub mod error;
pub mod observability;

pub use error::CoreError;
pub use tracing;
