use std::sync::Arc;

use crate::domain::errors::WorkerError;
use crate::domain::models::BlockHeader;
use crate::infrastructure::node::ChainRpc;
use crate::utils::logging;

/// Confirmations-aware header cursor. `next_headers` hands out
/// contiguous headers whose height sits at least `confirmations` below
/// the chain tip, starting right after the seed header. The cursor
/// advances as headers are handed out; the producer keeps its own
/// buffer to replay a range that failed to persist.
pub struct BatchBlocks {
    rpc: Arc<dyn ChainRpc>,
    last: BlockHeader,
    confirmations: u64,
}

impl BatchBlocks {
    pub fn new(rpc: Arc<dyn ChainRpc>, from_header: BlockHeader, confirmations: u64) -> Self {
        Self {
            rpc,
            last: from_header,
            confirmations,
        }
    }

    /// Height of the last header handed out (or the seed)
    pub fn last_height(&self) -> u64 {
        self.last.number
    }

    /// Up to `count` contiguous headers starting at `last + 1`, capped
    /// at `tip - confirmations`. Returns an empty vec when the chain
    /// has not grown far enough.
    pub async fn next_headers(&mut self, count: u64) -> Result<Vec<BlockHeader>, WorkerError> {
        let tip = self.rpc.get_block_header(None).await?;
        if tip.number < self.confirmations {
            return Ok(Vec::new());
        }

        let max_height = tip.number - self.confirmations;
        let start = self.last.number + 1;
        if start > max_height {
            return Ok(Vec::new());
        }

        let end = max_height.min(start + count.saturating_sub(1));
        let mut headers = Vec::with_capacity((end - start + 1) as usize);
        let mut prev = self.last.clone();

        for height in start..=end {
            let header = self.rpc.get_block_header(Some(height)).await?;
            if header.prev_hash != prev.hash {
                logging::log_error(&format!(
                    "header {} does not extend {}: prev_hash {} != {}",
                    header.number, prev.number, header.prev_hash, prev.hash
                ));
                return Err(WorkerError::ProcessingError(format!(
                    "chain discontinuity at height {}",
                    height
                )));
            }
            prev = header.clone();
            headers.push(header);
        }

        if let Some(last) = headers.last() {
            self.last = last.clone();
        }
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::infrastructure::node::{
        FeeEstimate, NodeClientError, NodeTx, SignedTxRequest, SignedTxResponse,
        UnsignedTxRequest, UnsignedTxResponse,
    };

    struct MockRpc {
        headers: Vec<BlockHeader>,
    }

    impl MockRpc {
        fn chain(length: u64) -> Self {
            let mut headers = Vec::new();
            for n in 0..length {
                headers.push(BlockHeader {
                    hash: format!("h{}", n),
                    prev_hash: if n == 0 {
                        "genesis".to_string()
                    } else {
                        format!("h{}", n - 1)
                    },
                    number: n,
                    timestamp: 1_700_000_000 + n,
                });
            }
            Self { headers }
        }
    }

    #[async_trait]
    impl ChainRpc for MockRpc {
        async fn get_block_header(
            &self,
            height: Option<u64>,
        ) -> Result<BlockHeader, NodeClientError> {
            let header = match height {
                Some(h) => self.headers.get(h as usize),
                None => self.headers.last(),
            };
            header
                .cloned()
                .ok_or_else(|| NodeClientError::RpcError("no such header".to_string()))
        }

        async fn get_block_by_number(&self, _: u64) -> Result<Vec<NodeTx>, NodeClientError> {
            Ok(Vec::new())
        }

        async fn get_transaction_by_hash(&self, _: &str) -> Result<NodeTx, NodeClientError> {
            Err(NodeClientError::RpcError("unused".to_string()))
        }

        async fn get_fee(&self) -> Result<FeeEstimate, NodeClientError> {
            Err(NodeClientError::RpcError("unused".to_string()))
        }

        async fn send_tx(&self, _: &str) -> Result<String, NodeClientError> {
            Err(NodeClientError::RpcError("unused".to_string()))
        }

        async fn create_unsigned_transaction(
            &self,
            _: &UnsignedTxRequest,
        ) -> Result<UnsignedTxResponse, NodeClientError> {
            Err(NodeClientError::RpcError("unused".to_string()))
        }

        async fn build_signed_transaction(
            &self,
            _: &SignedTxRequest,
        ) -> Result<SignedTxResponse, NodeClientError> {
            Err(NodeClientError::RpcError("unused".to_string()))
        }

        async fn export_address_by_public_key(
            &self,
            _: &str,
            _: &str,
        ) -> Result<String, NodeClientError> {
            Err(NodeClientError::RpcError("unused".to_string()))
        }
    }

    fn seed(rpc: &MockRpc, n: u64) -> BlockHeader {
        rpc.headers[n as usize].clone()
    }

    #[tokio::test]
    async fn yields_contiguous_headers_below_confirmation_window() {
        let rpc = MockRpc::chain(10); // tip at 9
        let first = seed(&rpc, 0);
        let mut cursor = BatchBlocks::new(Arc::new(rpc), first, 2);

        let batch = cursor.next_headers(3).await.unwrap();
        assert_eq!(
            batch.iter().map(|h| h.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );

        let batch = cursor.next_headers(3).await.unwrap();
        assert_eq!(
            batch.iter().map(|h| h.number).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );

        // tip 9 - confirmations 2 = 7 is the last eligible height
        let batch = cursor.next_headers(3).await.unwrap();
        assert_eq!(batch.iter().map(|h| h.number).collect::<Vec<_>>(), vec![7]);

        assert!(cursor.next_headers(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_when_tip_is_within_confirmations() {
        let rpc = MockRpc::chain(3); // tip at 2
        let first = seed(&rpc, 0);
        let mut cursor = BatchBlocks::new(Arc::new(rpc), first, 6);
        assert!(cursor.next_headers(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_discontinuous_headers() {
        let mut rpc = MockRpc::chain(10);
        rpc.headers[4].prev_hash = "forked".to_string();
        let first = seed(&rpc, 0);
        let mut cursor = BatchBlocks::new(Arc::new(rpc), first, 0);

        let err = cursor.next_headers(10).await.unwrap_err();
        assert!(matches!(err, WorkerError::ProcessingError(_)));
    }

    #[tokio::test]
    async fn headers_link_to_the_seed() {
        let rpc = MockRpc::chain(10);
        let mid = seed(&rpc, 5);
        let mut cursor = BatchBlocks::new(Arc::new(rpc), mid, 0);

        let batch = cursor.next_headers(2).await.unwrap();
        assert_eq!(batch[0].number, 6);
        assert_eq!(batch[0].prev_hash, "h5");
        assert_eq!(cursor.last_height(), 7);
    }
}
