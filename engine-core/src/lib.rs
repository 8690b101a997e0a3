//! engine-core: Shared infrastructure for the extraction and matching engines.
pub mod error;
pub mod models;
pub mod observability;
pub mod utils;

pub use anyhow;
pub use chrono;
pub use rust_decimal;
pub use serde;
pub use serde_json;
pub use tracing;
pub use uuid;
