pub mod fallback;
pub mod internal;
pub mod retry;
pub mod shutdown;
pub mod supervisor;
pub mod sync;

pub use fallback::FallBack;
pub use internal::InternalDispatcher;
pub use retry::{ExponentialBackoff, FixedDelay, RetryHandler, RetryStrategy};
pub use shutdown::Shutdown;
pub use supervisor::{Component, Supervisor};
pub use sync::Deposit;
