pub mod client;
pub mod error;
pub mod types;

pub use client::WalletNodeClient;
pub use error::NodeClientError;
pub use types::{
    ChainRpc, FeeEstimate, NodeTx, NodeVin, NodeVout, SignedTxRequest, SignedTxResponse,
    UnsignedTxRequest, UnsignedTxResponse, UnsignedVin, UnsignedVout,
};
