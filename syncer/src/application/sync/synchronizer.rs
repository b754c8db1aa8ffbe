use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::shutdown::Shutdown;
use crate::application::sync::block_cursor::BatchBlocks;
use crate::domain::errors::WorkerError;
use crate::domain::models::{BlockHeader, ClassifiedTx, TxType};
use crate::domain::services::{TenantContext, TxClassifier};
use crate::infrastructure::node::ChainRpc;
use crate::infrastructure::persistence::repositories::{
    AddressesRepository, BlocksRepository, BusinessRepository,
};
use crate::infrastructure::persistence::Store;
use crate::utils::logging;

/// Per-tenant slice of one produced batch
#[derive(Debug, Clone)]
pub struct TxBatch {
    pub block_height: u64,
    pub transactions: Vec<ClassifiedTx>,
}

/// One produced batch: tenant uid -> classified activity
pub type BusinessBatch = HashMap<String, TxBatch>;

/// Producer half of the ingestion loop. Each tick pulls a header range
/// from the cursor, classifies every transaction for every tenant, and
/// hands the result to the consumer over a bounded channel. A range
/// that fails to process is retained and replayed on the next tick.
pub struct BlockSynchronizer {
    rpc: Arc<dyn ChainRpc>,
    store: Store,
    cursor: BatchBlocks,
    headers: Vec<BlockHeader>,
    batch_sender: mpsc::Sender<BusinessBatch>,
    header_buffer_size: u64,
    interval: Duration,
    shutdown: Shutdown,
}

impl BlockSynchronizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rpc: Arc<dyn ChainRpc>,
        store: Store,
        cursor: BatchBlocks,
        batch_sender: mpsc::Sender<BusinessBatch>,
        header_buffer_size: u64,
        interval: Duration,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            rpc,
            store,
            cursor,
            headers: Vec::new(),
            batch_sender,
            header_buffer_size,
            interval,
            shutdown,
        }
    }

    /// Run until cancellation. Dropping the sender on exit closes the
    /// channel and drains the consumer.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = self.shutdown.cancelled() => {
                    logging::log_info("shutting down batch producer");
                    break;
                }
            }
        }
    }

    async fn tick(&mut self) {
        if !self.headers.is_empty() {
            logging::log_info("retrying previous batch");
        } else {
            match self.cursor.next_headers(self.header_buffer_size).await {
                Ok(new_headers) if new_headers.is_empty() => {
                    logging::log_debug("no new headers");
                }
                Ok(new_headers) => self.headers = new_headers,
                Err(e) => logging::log_error(&format!("failed to fetch headers: {}", e)),
            }
        }

        match self.process_batch().await {
            Ok(()) => self.headers.clear(),
            Err(e) => logging::log_error(&format!("failed to process batch: {}", e)),
        }
    }

    async fn process_batch(&mut self) -> Result<(), WorkerError> {
        if self.headers.is_empty() {
            return Ok(());
        }

        let mut batch: BusinessBatch = HashMap::new();

        for header in &self.headers {
            logging::log_info(&format!("sync block data, height {}", header.number));

            let tx_list = self.rpc.get_block_by_number(header.number).await?;
            let business_list = BusinessRepository::query_business_list(self.store.conn()).await?;

            for business in &business_list {
                let uid = business.business_uid.as_str();
                let hot_wallet =
                    AddressesRepository::query_hot_wallet_info(self.store.conn(), uid).await?;
                let cold_wallet =
                    AddressesRepository::query_cold_wallet_info(self.store.conn(), uid).await?;
                let ctx = TenantContext {
                    business_uid: business.business_uid.clone(),
                    hot_wallet: hot_wallet.address,
                    cold_wallet: cold_wallet.address,
                };

                let mut classified = Vec::new();
                for tx in &tx_list {
                    let labeled = TxClassifier::classify(&self.store, &ctx, tx, header).await?;
                    // A tenant only persists transactions that matched
                    // one of its flows.
                    if labeled.tx_type != TxType::Unknown {
                        classified.push(labeled);
                    }
                }

                let entry = batch
                    .entry(business.business_uid.clone())
                    .or_insert_with(|| TxBatch {
                        block_height: header.number,
                        transactions: Vec::new(),
                    });
                entry.block_height = header.number;
                entry.transactions.extend(classified);
            }
        }

        // A tick always signals progress, even with nothing classified
        if self.batch_sender.send(batch).await.is_err() {
            return Err(WorkerError::ProcessingError(
                "batch consumer is gone".to_string(),
            ));
        }

        BlocksRepository::store_blocks(self.store.conn(), &self.headers).await?;
        logging::log_info(&format!("stored {} block headers", self.headers.len()));
        Ok(())
    }
}
