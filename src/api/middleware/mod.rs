//! API middleware components

pub mod logging;
pub mod metrics;
pub mod user_key;

pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use user_key::{RequireUserKey, USER_KEY_HEADER};
