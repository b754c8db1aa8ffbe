use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::config::NodeConfig;
use crate::domain::models::BlockHeader;
use crate::infrastructure::node::error::NodeClientError;
use crate::infrastructure::node::types::{
    ChainRpc, FeeEstimate, NodeTx, SignedTxRequest, SignedTxResponse, UnsignedTxRequest,
    UnsignedTxResponse,
};
use crate::utils::logging;

/// HTTP client for the wallet-node service
pub struct WalletNodeClient {
    client: Client,
    base_url: String,
    chain: String,
    network: String,
    coin: String,
}

impl WalletNodeClient {
    /// Create a new wallet-node client
    pub fn new(config: &NodeConfig) -> Self {
        logging::log_info(&format!("Using wallet node at {}", config.url));
        WalletNodeClient {
            client: Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            chain: config.chain.clone(),
            network: config.network.clone(),
            coin: config.coin.clone(),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NodeClientError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            return Err(NodeClientError::RpcError(format!(
                "{} returned status {}",
                path,
                response.status()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NodeClientError::ResponseError(format!("decoding {}: {}", path, e)))
    }
}

#[async_trait]
impl ChainRpc for WalletNodeClient {
    async fn get_block_header(
        &self,
        height: Option<u64>,
    ) -> Result<BlockHeader, NodeClientError> {
        let body = json!({
            "chain": self.chain,
            "network": self.network,
            "height": height,
        });
        self.post("block/header", &body).await
    }

    async fn get_block_by_number(&self, height: u64) -> Result<Vec<NodeTx>, NodeClientError> {
        let body = json!({
            "chain": self.chain,
            "network": self.network,
            "height": height,
        });
        self.post("block/txs", &body).await
    }

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<NodeTx, NodeClientError> {
        let body = json!({
            "chain": self.chain,
            "network": self.network,
            "hash": hash,
        });
        self.post("tx/detail", &body).await
    }

    async fn get_fee(&self) -> Result<FeeEstimate, NodeClientError> {
        let body = json!({
            "chain": self.chain,
            "network": self.network,
            "coin": self.coin,
        });
        self.post("tx/fee", &body).await
    }

    async fn send_tx(&self, signed_hex: &str) -> Result<String, NodeClientError> {
        #[derive(serde::Deserialize)]
        struct SendTxResponse {
            tx_hash: String,
        }

        let body = json!({
            "chain": self.chain,
            "network": self.network,
            "raw_tx": signed_hex,
        });
        let resp: SendTxResponse = self.post("tx/send", &body).await?;
        Ok(resp.tx_hash)
    }

    async fn create_unsigned_transaction(
        &self,
        request: &UnsignedTxRequest,
    ) -> Result<UnsignedTxResponse, NodeClientError> {
        self.post("tx/create-unsign", request).await
    }

    async fn build_signed_transaction(
        &self,
        request: &SignedTxRequest,
    ) -> Result<SignedTxResponse, NodeClientError> {
        self.post("tx/build-signed", request).await
    }

    async fn export_address_by_public_key(
        &self,
        format: &str,
        public_key: &str,
    ) -> Result<String, NodeClientError> {
        #[derive(serde::Deserialize)]
        struct ExportAddressResponse {
            address: String,
        }

        let body = json!({
            "chain": self.chain,
            "network": self.network,
            "format": format,
            "public_key": public_key,
        });
        let resp: ExportAddressResponse = self.post("address/export", &body).await?;
        Ok(resp.address)
    }
}
