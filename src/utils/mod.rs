pub mod retry;

pub use retry::{Backoff, IsTransient, RetryConfig};
