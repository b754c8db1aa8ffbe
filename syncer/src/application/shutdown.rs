use std::sync::Arc;
use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

use crate::utils::logging;

/// Process-wide cancellation with a set-once critical cause. A
/// component that hits an unrecoverable error calls [`handle_crit`];
/// every loop observes the token and drains.
///
/// [`handle_crit`]: Shutdown::handle_crit
#[derive(Clone)]
pub struct Shutdown {
    token: CancellationToken,
    cause: Arc<OnceLock<String>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Cancel the process with a tagged cause. Only the first caller
    /// records its cause; later calls are no-ops.
    pub fn handle_crit(&self, cause: String) {
        if self.cause.set(cause.clone()).is_ok() {
            logging::log_error(&format!("critical error, shutting down: {}", cause));
        }
        self.token.cancel();
    }

    /// Orderly shutdown without a critical cause (signal handling)
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The recorded critical cause, if any
    pub fn cause(&self) -> Option<&str> {
        self.cause.get().map(|s| s.as_str())
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_critical_cause_wins() {
        let shutdown = Shutdown::new();
        shutdown.handle_crit("db gone".to_string());
        shutdown.handle_crit("rpc gone".to_string());
        assert!(shutdown.is_cancelled());
        assert_eq!(shutdown.cause(), Some("db gone"));
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();
        let handle = tokio::spawn(async move {
            observer.cancelled().await;
            true
        });
        shutdown.cancel();
        assert!(handle.await.unwrap());
        assert_eq!(shutdown.cause(), None);
    }
}
