use std::error::Error;
use std::fmt;

use crate::infrastructure::node::NodeClientError;
use crate::infrastructure::persistence::DbError;

/// Error type for the worker loops (ingestion, dispatch, fallback)
#[derive(Debug)]
pub enum WorkerError {
    NodeClientError(NodeClientError),
    DbError(DbError),
    ConfigError(String),
    ProcessingError(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::NodeClientError(e) => write!(f, "Node client error: {}", e),
            WorkerError::DbError(e) => write!(f, "Database error: {}", e),
            WorkerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            WorkerError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl Error for WorkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerError::NodeClientError(e) => Some(e),
            WorkerError::DbError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NodeClientError> for WorkerError {
    fn from(error: NodeClientError) -> Self {
        WorkerError::NodeClientError(error)
    }
}

impl From<DbError> for WorkerError {
    fn from(error: DbError) -> Self {
        WorkerError::DbError(error)
    }
}
