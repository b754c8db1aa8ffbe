use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::application::shutdown::Shutdown;
use crate::config::ChainConfig;
use crate::domain::errors::WorkerError;
use crate::domain::models::{BlockHeader, TxStatus};
use crate::infrastructure::node::ChainRpc;
use crate::infrastructure::persistence::repositories::{
    BlocksRepository, BusinessRepository, DepositsRepository, InternalsRepository,
    TransactionsRepository, WithdrawsRepository,
};
use crate::infrastructure::persistence::{DbError, Store};
use crate::utils::logging;

/// Reorg monitor. Each tick compares the stored tip against the node's
/// header at the same height; on divergence it walks down to the fork
/// point, marks affected per-tenant rows `Fallback` and truncates the
/// stored chain above the fork.
pub struct FallBack {
    store: Store,
    rpc: Arc<dyn ChainRpc>,
    interval: Duration,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
    started: AtomicBool,
}

impl FallBack {
    pub fn new(
        config: &ChainConfig,
        store: Store,
        rpc: Arc<dyn ChainRpc>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            store,
            rpc,
            interval: Duration::from_millis(config.worker_interval_ms),
            shutdown,
            tasks: Vec::new(),
            started: AtomicBool::new(false),
        }
    }

    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        logging::log_info("starting fallback monitor");

        let store = self.store.clone();
        let rpc = self.rpc.clone();
        let shutdown = self.shutdown.clone();
        let interval = self.interval;

        self.tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = tick(&store, rpc.as_ref()).await {
                            logging::log_error(&format!("fallback check failed: {}", e));
                        }
                    }
                    _ = shutdown.cancelled() => {
                        logging::log_info("stopping fallback monitor");
                        break;
                    }
                }
            }
        }));

        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), WorkerError> {
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        logging::log_info("fallback monitor stopped");
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::application::supervisor::Component for FallBack {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        FallBack::start(self)
    }

    async fn close(&mut self) -> Result<(), WorkerError> {
        FallBack::close(self).await
    }
}

async fn tick(store: &Store, rpc: &dyn ChainRpc) -> Result<(), WorkerError> {
    let Some(stored_tip) = BlocksRepository::latest_block(store.conn()).await? else {
        return Ok(());
    };

    let canonical = rpc.get_block_header(Some(stored_tip.number)).await?;
    if canonical.hash == stored_tip.hash {
        return Ok(());
    }

    logging::log_warning(&format!(
        "chain diverged at height {}: stored {} canonical {}",
        stored_tip.number, stored_tip.hash, canonical.hash
    ));

    let store_lookup = |height: u64| BlocksRepository::query_block_by_number(store.conn(), height);
    let fork_point = find_fork_point(store_lookup, rpc, stored_tip.number).await?;

    logging::log_warning(&format!(
        "rolling back to fork point at height {}",
        fork_point
    ));

    let business_list = BusinessRepository::query_business_list(store.conn()).await?;
    let uids: Vec<String> = business_list
        .into_iter()
        .map(|b| b.business_uid)
        .collect();

    store
        .transaction(move |txn| {
            Box::pin(async move {
                for uid in &uids {
                    TransactionsRepository::mark_status_above(
                        txn,
                        uid,
                        fork_point,
                        TxStatus::Fallback,
                    )
                    .await?;
                    DepositsRepository::mark_status_above(txn, uid, fork_point, TxStatus::Fallback)
                        .await?;
                    WithdrawsRepository::mark_status_above(
                        txn,
                        uid,
                        fork_point,
                        TxStatus::Fallback,
                    )
                    .await?;
                    InternalsRepository::mark_status_above(
                        txn,
                        uid,
                        fork_point,
                        TxStatus::Fallback,
                    )
                    .await?;
                }
                BlocksRepository::truncate_above(txn, fork_point).await?;
                Ok(())
            })
        })
        .await?;

    Ok(())
}

/// Highest height at which the stored chain still matches the node.
/// Walks downward from `from - 1`; heights with no stored row are
/// skipped. Reaching the bottom yields 0.
async fn find_fork_point<F, Fut>(
    stored_at: F,
    rpc: &dyn ChainRpc,
    from: u64,
) -> Result<u64, WorkerError>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<Option<BlockHeader>, DbError>>,
{
    let mut height = from;
    while height > 0 {
        height -= 1;
        let Some(stored) = stored_at(height).await? else {
            continue;
        };
        let canonical = rpc.get_block_header(Some(height)).await?;
        if canonical.hash == stored.hash {
            return Ok(height);
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use crate::infrastructure::node::{
        FeeEstimate, NodeClientError, NodeTx, SignedTxRequest, SignedTxResponse,
        UnsignedTxRequest, UnsignedTxResponse,
    };

    struct CanonicalChain {
        headers: HashMap<u64, BlockHeader>,
    }

    #[async_trait]
    impl ChainRpc for CanonicalChain {
        async fn get_block_header(
            &self,
            height: Option<u64>,
        ) -> Result<BlockHeader, NodeClientError> {
            let height = height.expect("tip lookups unused in this test");
            self.headers
                .get(&height)
                .cloned()
                .ok_or_else(|| NodeClientError::RpcError("no header".to_string()))
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

    fn header(number: u64, hash: &str) -> BlockHeader {
        BlockHeader {
            hash: hash.to_string(),
            prev_hash: String::new(),
            number,
            timestamp: 0,
        }
    }

    fn chains(
        forked_from: u64,
        length: u64,
    ) -> (HashMap<u64, BlockHeader>, HashMap<u64, BlockHeader>) {
        let mut stored = HashMap::new();
        let mut canonical = HashMap::new();
        for n in 0..length {
            canonical.insert(n, header(n, &format!("c{}", n)));
            let stored_hash = if n <= forked_from {
                format!("c{}", n)
            } else {
                format!("s{}", n)
            };
            stored.insert(n, header(n, &stored_hash));
        }
        (stored, canonical)
    }

    #[tokio::test]
    async fn finds_the_highest_common_height() {
        let (stored, canonical) = chains(5, 10);
        let rpc = CanonicalChain { headers: canonical };

        let fork = find_fork_point(
            |h| {
                let stored = stored.clone();
                async move { Ok(stored.get(&h).cloned()) }
            },
            &rpc,
            9,
        )
        .await
        .unwrap();

        assert_eq!(fork, 5);
    }

    #[tokio::test]
    async fn full_divergence_falls_back_to_zero() {
        let (mut stored, canonical) = chains(0, 6);
        // even the genesis-adjacent block differs
        stored.insert(0, header(0, "s0"));
        let rpc = CanonicalChain { headers: canonical };

        let fork = find_fork_point(
            |h| {
                let stored = stored.clone();
                async move { Ok(stored.get(&h).cloned()) }
            },
            &rpc,
            5,
        )
        .await
        .unwrap();

        assert_eq!(fork, 0);
    }

    #[tokio::test]
    async fn skips_gaps_in_the_stored_chain() {
        let (mut stored, canonical) = chains(4, 10);
        stored.remove(&4); // gap right at the fork point
        let rpc = CanonicalChain { headers: canonical };

        let fork = find_fork_point(
            |h| {
                let stored = stored.clone();
                async move { Ok(stored.get(&h).cloned()) }
            },
            &rpc,
            9,
        )
        .await
        .unwrap();

        assert_eq!(fork, 3);
    }
}
