use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::models::BlockHeader;
use crate::infrastructure::node::error::NodeClientError;

/// An input of a raw transaction as reported by the wallet node.
/// `address` may be a `|`-joined multi-address string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeVin {
    pub address: String,
    pub index: u32,
    pub amount: u64,
}

/// An output of a raw transaction as reported by the wallet node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeVout {
    pub address: String,
    pub index: u32,
    pub amount: u64,
}

/// A raw transaction with pre-extracted input/output addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTx {
    pub hash: String,
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub vins: Vec<NodeVin>,
    #[serde(default)]
    pub vouts: Vec<NodeVout>,
}

/// Fee-rate estimate from the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub fee_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedVin {
    pub hash: String,
    pub index: u32,
    pub amount: u64,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedVout {
    pub address: String,
    pub amount: u64,
    pub index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedTxRequest {
    pub consumer_token: String,
    pub chain: String,
    pub network: String,
    pub fee: String,
    pub vins: Vec<UnsignedVin>,
    pub vouts: Vec<UnsignedVout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedTxResponse {
    pub sign_hashes: Vec<String>,
    pub tx_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTxRequest {
    pub consumer_token: String,
    pub chain: String,
    pub network: String,
    pub tx_data: String,
    pub signatures: Vec<String>,
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTxResponse {
    pub signed_tx_data: String,
}

/// Typed facade over the wallet-node RPC. Stateless; timeouts and
/// network errors surface to callers unchanged.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Header at `height`, or the chain tip when `height` is `None`
    async fn get_block_header(&self, height: Option<u64>)
        -> Result<BlockHeader, NodeClientError>;

    /// All transactions of the block at `height`
    async fn get_block_by_number(&self, height: u64) -> Result<Vec<NodeTx>, NodeClientError>;

    /// Transaction detail by hash
    async fn get_transaction_by_hash(&self, hash: &str) -> Result<NodeTx, NodeClientError>;

    /// Current fee-rate estimate
    async fn get_fee(&self) -> Result<FeeEstimate, NodeClientError>;

    /// Broadcast a signed transaction, returning its hash
    async fn send_tx(&self, signed_hex: &str) -> Result<String, NodeClientError>;

    /// Construct an unsigned transaction and its message hashes
    async fn create_unsigned_transaction(
        &self,
        request: &UnsignedTxRequest,
    ) -> Result<UnsignedTxResponse, NodeClientError>;

    /// Assemble a fully-signed transaction from signatures
    async fn build_signed_transaction(
        &self,
        request: &SignedTxRequest,
    ) -> Result<SignedTxResponse, NodeClientError>;

    /// Derive an address from a public key
    async fn export_address_by_public_key(
        &self,
        format: &str,
        public_key: &str,
    ) -> Result<String, NodeClientError>;
}
