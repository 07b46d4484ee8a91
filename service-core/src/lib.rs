//! service-core: Shared infrastructure for the SSO service suite.
pub mod auth;
pub mod authz;
pub mod config;
pub mod error;
pub mod identity;
pub mod observability;
pub mod tool;

pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
