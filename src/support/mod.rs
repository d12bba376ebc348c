pub mod errors;
pub mod retry;
pub mod shutdown;

pub use errors::{AppError, DomainError, InfraError};
pub use retry::{retry_on_conflict, retry_with_backoff, RetryConfig};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
