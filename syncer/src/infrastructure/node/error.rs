use std::error::Error;
use std::fmt;

/// Represents errors that can occur talking to the wallet node
#[derive(Debug)]
pub enum NodeClientError {
    /// Transport-level error from the HTTP client
    TransportError(reqwest::Error),
    /// The node answered with a non-success status or error payload
    RpcError(String),
    /// The node answered with a body we could not decode
    ResponseError(String),
}

impl fmt::Display for NodeClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeClientError::TransportError(e) => write!(f, "Node transport error: {}", e),
            NodeClientError::RpcError(msg) => write!(f, "Node RPC error: {}", msg),
            NodeClientError::ResponseError(msg) => write!(f, "Node response error: {}", msg),
        }
    }
}

impl Error for NodeClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NodeClientError::TransportError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NodeClientError {
    fn from(error: reqwest::Error) -> Self {
        NodeClientError::TransportError(error)
    }
}
