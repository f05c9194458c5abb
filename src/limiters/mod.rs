//! Local admission gates shared by limiter executors.

pub mod concurrency;
pub mod rate;

pub use concurrency::{ConcurrencyLimiter, ConcurrencyPermit, LocalConcurrencyLimiter};
pub use rate::{LocalRateLimiter, RateLimiter};
