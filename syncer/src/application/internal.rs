use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::retry::RetryHandler;
use crate::application::shutdown::Shutdown;
use crate::config::ChainConfig;
use crate::domain::errors::WorkerError;
use crate::domain::models::{AddressType, ChildTxRow, LockDelta, TxStatus};
use crate::infrastructure::node::ChainRpc;
use crate::infrastructure::persistence::repositories::{
    BalancesRepository, BusinessRepository, ChildTxsRepository, InternalsRepository,
    WithdrawsRepository,
};
use crate::infrastructure::persistence::{DbError, Store};
use crate::utils::{logging, unix_now};

/// A broadcast that succeeded this tick and awaits its status commit
#[derive(Clone)]
struct SentTx {
    guid: Uuid,
    tx_hash: String,
    status: TxStatus,
}

/// Periodically drains signed-but-unbroadcast internal and withdraw
/// rows, broadcasts them, and commits status plus lock-balance updates
/// for the rows that actually went out. A rejected broadcast is skipped
/// and retried on the next tick.
pub struct InternalDispatcher {
    store: Store,
    rpc: Arc<dyn ChainRpc>,
    interval: Duration,
    shutdown: Shutdown,
    tasks: Vec<JoinHandle<()>>,
    started: AtomicBool,
}

impl InternalDispatcher {
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
        logging::log_info("starting internal dispatcher");

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
                            shutdown.handle_crit(format!("internal dispatcher: {}", e));
                            break;
                        }
                    }
                    _ = shutdown.cancelled() => {
                        logging::log_info("stopping internal dispatcher");
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
        logging::log_info("internal dispatcher stopped");
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::application::supervisor::Component for InternalDispatcher {
    fn name(&self) -> &'static str {
        "internal"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        InternalDispatcher::start(self)
    }

    async fn close(&mut self) -> Result<(), WorkerError> {
        InternalDispatcher::close(self).await
    }
}

async fn tick(store: &Store, rpc: &dyn ChainRpc) -> Result<(), WorkerError> {
    let business_list = match BusinessRepository::query_business_list(store.conn()).await {
        Ok(list) => list,
        Err(e) => {
            logging::log_error(&format!("query business list failed: {}", e));
            return Ok(());
        }
    };

    for business in &business_list {
        let uid = business.business_uid.as_str();

        let internals = match InternalsRepository::unsent_internals(store.conn(), uid).await {
            Ok(rows) => rows,
            Err(e) => {
                logging::log_error(&format!("query unsent internals failed: {}", e));
                continue;
            }
        };
        let withdraws = match WithdrawsRepository::unsent_withdraws(store.conn(), uid).await {
            Ok(rows) => rows,
            Err(e) => {
                logging::log_error(&format!("query unsent withdraws failed: {}", e));
                continue;
            }
        };

        let mut locks: Vec<LockDelta> = Vec::new();
        let mut sent_internals: Vec<SentTx> = Vec::new();
        let mut sent_withdraws: Vec<SentTx> = Vec::new();

        for internal in &internals {
            if let Some(sent) = broadcast(
                store,
                rpc,
                uid,
                internal.guid,
                &internal.tx_sign_hex,
                TxStatus::Success,
                &mut locks,
            )
            .await?
            {
                sent_internals.push(sent);
            }
        }
        for withdraw in &withdraws {
            if let Some(sent) = broadcast(
                store,
                rpc,
                uid,
                withdraw.guid,
                &withdraw.tx_sign_hex,
                TxStatus::Withdrawed,
                &mut locks,
            )
            .await?
            {
                sent_withdraws.push(sent);
            }
        }

        if sent_internals.is_empty() && sent_withdraws.is_empty() {
            continue;
        }

        let retry = RetryHandler::new();
        let uid_owned = uid.to_string();
        retry
            .execute_with_retry(
                || {
                    let store = store.clone();
                    let uid = uid_owned.clone();
                    let locks = locks.clone();
                    let sent_internals = sent_internals.clone();
                    let sent_withdraws = sent_withdraws.clone();
                    async move {
                        store
                            .transaction(move |txn| {
                                Box::pin(async move {
                                    commit_dispatch(
                                        txn,
                                        &uid,
                                        &locks,
                                        &sent_internals,
                                        &sent_withdraws,
                                    )
                                    .await
                                })
                            })
                            .await
                    }
                },
                "persist dispatch batch",
            )
            .await?;
    }

    Ok(())
}

/// Broadcast one candidate. Returns None (and logs) when the node
/// rejects it; the row stays pending for the next tick.
async fn broadcast(
    store: &Store,
    rpc: &dyn ChainRpc,
    business_uid: &str,
    guid: Uuid,
    tx_sign_hex: &str,
    success_status: TxStatus,
    locks: &mut Vec<LockDelta>,
) -> Result<Option<SentTx>, WorkerError> {
    let legs = ChildTxsRepository::query_child_txs_by_parent(
        store.conn(),
        business_uid,
        &guid.to_string(),
    )
    .await?;

    match rpc.send_tx(tx_sign_hex).await {
        Ok(tx_hash) => {
            locks.extend(lock_deltas_for_legs(&legs));
            logging::log_info(&format!("broadcast {} as {}", guid, tx_hash));
            Ok(Some(SentTx {
                guid,
                tx_hash,
                status: success_status,
            }))
        }
        Err(e) => {
            logging::log_error(&format!("send transaction {} failed: {}", guid, e));
            Ok(None)
        }
    }
}

/// Every leg locks its amount on both sides of the movement: the
/// sending address (type 0) and the receiving address (type 1).
fn lock_deltas_for_legs(legs: &[ChildTxRow]) -> Vec<LockDelta> {
    let mut deltas = Vec::new();
    for leg in legs {
        let amount = U256::from_str(&leg.amount).unwrap_or_default();
        if !leg.from_address.is_empty() {
            deltas.push(LockDelta {
                address: leg.from_address.clone(),
                address_type: AddressType::User,
                amount,
                acquire: true,
            });
        }
        if !leg.to_address.is_empty() {
            deltas.push(LockDelta {
                address: leg.to_address.clone(),
                address_type: AddressType::Hot,
                amount,
                acquire: true,
            });
        }
    }
    deltas
}

async fn commit_dispatch(
    conn: &sea_orm::DatabaseTransaction,
    business_uid: &str,
    locks: &[LockDelta],
    sent_internals: &[SentTx],
    sent_withdraws: &[SentTx],
) -> Result<(), DbError> {
    if !locks.is_empty() {
        BalancesRepository::update_balances(conn, business_uid, locks, unix_now()).await?;
    }
    for sent in sent_internals {
        InternalsRepository::mark_internal_sent(
            conn,
            business_uid,
            sent.guid,
            &sent.tx_hash,
            sent.status,
        )
        .await?;
    }
    for sent in sent_withdraws {
        WithdrawsRepository::mark_withdraw_sent(
            conn,
            business_uid,
            sent.guid,
            &sent.tx_hash,
            sent.status,
        )
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(from: &str, to: &str, amount: &str) -> ChildTxRow {
        ChildTxRow {
            guid: Uuid::new_v4(),
            hash: "0x00".to_string(),
            tx_id: "parent".to_string(),
            tx_index: 0,
            tx_type: "withdraw".to_string(),
            from_address: from.to_string(),
            to_address: to.to_string(),
            amount: amount.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn locks_both_sides_of_every_leg() {
        let deltas = lock_deltas_for_legs(&[leg("A1", "H1", "30000")]);

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].address, "A1");
        assert_eq!(deltas[0].address_type, AddressType::User);
        assert_eq!(deltas[1].address, "H1");
        assert_eq!(deltas[1].address_type, AddressType::Hot);
        assert!(deltas.iter().all(|d| d.acquire));
        assert!(deltas.iter().all(|d| d.amount == U256::from(30000u64)));
    }

    #[test]
    fn skips_empty_addresses() {
        let deltas = lock_deltas_for_legs(&[leg("", "H1", "100")]);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].address, "H1");
    }
}
