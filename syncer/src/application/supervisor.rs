use async_trait::async_trait;

use crate::application::shutdown::Shutdown;
use crate::domain::errors::WorkerError;
use crate::utils::logging;

/// A long-running service piece owned by the supervisor. `start` and
/// `close` are idempotent.
#[async_trait]
pub trait Component: Send {
    fn name(&self) -> &'static str;

    /// Spawn the component's tasks
    fn start(&mut self) -> Result<(), WorkerError>;

    /// Wait for the component's tasks to drain. Called after the root
    /// cancellation has fired.
    async fn close(&mut self) -> Result<(), WorkerError>;
}

/// Starts components in declared order and stops them in reverse. A
/// component that fails to start cancels the process.
pub struct Supervisor {
    shutdown: Shutdown,
    components: Vec<Box<dyn Component>>,
}

impl Supervisor {
    pub fn new(shutdown: Shutdown) -> Self {
        Self {
            shutdown,
            components: Vec::new(),
        }
    }

    pub fn register(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    pub fn start_all(&mut self) -> Result<(), WorkerError> {
        for component in self.components.iter_mut() {
            logging::log_info(&format!("starting {}", component.name()));
            if let Err(e) = component.start() {
                self.shutdown
                    .handle_crit(format!("failed to start {}: {}", component.name(), e));
                return Err(e);
            }
        }
        Ok(())
    }

    /// Cancel the root context and close every component, newest first
    pub async fn stop_all(&mut self) {
        self.shutdown.cancel();
        for component in self.components.iter_mut().rev() {
            if let Err(e) = component.close().await {
                logging::log_error(&format!("failed to close {}: {}", component.name(), e));
            }
        }
        logging::log_info("all components stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
    }

    #[async_trait]
    impl Component for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn start(&mut self) -> Result<(), WorkerError> {
            if self.fail_start {
                return Err(WorkerError::ProcessingError("boom".to_string()));
            }
            self.log.lock().unwrap().push(format!("start {}", self.name));
            Ok(())
        }

        async fn close(&mut self) -> Result<(), WorkerError> {
            self.log.lock().unwrap().push(format!("close {}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn starts_in_order_and_stops_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Shutdown::new();
        let mut supervisor = Supervisor::new(shutdown.clone());
        for name in ["deposit", "internal", "fallback"] {
            supervisor.register(Box::new(Recorder {
                name,
                log: log.clone(),
                fail_start: false,
            }));
        }

        supervisor.start_all().unwrap();
        supervisor.stop_all().await;

        assert!(shutdown.is_cancelled());
        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[
                "start deposit",
                "start internal",
                "start fallback",
                "close fallback",
                "close internal",
                "close deposit",
            ]
        );
    }

    #[tokio::test]
    async fn start_failure_cancels_the_process() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Shutdown::new();
        let mut supervisor = Supervisor::new(shutdown.clone());
        supervisor.register(Box::new(Recorder {
            name: "deposit",
            log: log.clone(),
            fail_start: false,
        }));
        supervisor.register(Box::new(Recorder {
            name: "broken",
            log: log.clone(),
            fail_start: true,
        }));

        assert!(supervisor.start_all().is_err());
        assert!(shutdown.is_cancelled());
        assert!(shutdown.cause().unwrap().contains("broken"));
    }
}
