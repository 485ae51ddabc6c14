//! API 서버용 HTTP middleware.

mod metrics;
mod rate_limit;

pub use metrics::metrics_layer;
pub use rate_limit::{login_rate_limit, RateLimitConfig, RateLimitResult, RateLimiter};
