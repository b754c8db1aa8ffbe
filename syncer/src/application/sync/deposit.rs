use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::application::retry::RetryHandler;
use crate::application::shutdown::Shutdown;
use crate::application::sync::block_cursor::BatchBlocks;
use crate::application::sync::synchronizer::{BlockSynchronizer, BusinessBatch, TxBatch};
use crate::config::ChainConfig;
use crate::domain::errors::WorkerError;
use crate::domain::models::{
    AddressType, BalanceDelta, BalanceDirection, ChildTxRow, ClassifiedTx, DepositRow,
    InternalRow, LegTag, LockDelta, TransactionRow, TxStatus, TxType, VinRow, VoutRow,
    WithdrawRow,
};
use crate::domain::services::AddressBook;
use crate::infrastructure::node::ChainRpc;
use crate::infrastructure::persistence::repositories::{
    BalancesRepository, BlocksRepository, BusinessRepository, ChildTxsRepository,
    DepositsRepository, InternalsRepository, TransactionsRepository, VinsRepository,
    VoutsRepository, WithdrawsRepository,
};
use crate::infrastructure::persistence::{DbError, Store};
use crate::utils::{logging, unix_now};

/// The ingestion worker: a producer task advancing the cursor and a
/// consumer task materializing classified activity per tenant.
pub struct Deposit {
    store: Store,
    rpc: Arc<dyn ChainRpc>,
    confirmations: u64,
    shutdown: Shutdown,
    producer: Option<BlockSynchronizer>,
    receiver: Option<mpsc::Receiver<BusinessBatch>>,
    tasks: Vec<JoinHandle<()>>,
    started: AtomicBool,
}

impl Deposit {
    /// Build the worker, resolving the cursor seed: highest stored
    /// block, else the configured starting height, else the chain tip.
    pub async fn new(
        config: &ChainConfig,
        store: Store,
        rpc: Arc<dyn ChainRpc>,
        shutdown: Shutdown,
    ) -> Result<Self, WorkerError> {
        let from_header = match BlocksRepository::latest_block(store.conn()).await? {
            Some(header) => {
                logging::log_info(&format!("resuming sync from block {}", header.number));
                header
            }
            None if config.starting_height > 0 => {
                rpc.get_block_header(Some(config.starting_height)).await?
            }
            None => rpc.get_block_header(None).await?,
        };

        let (sender, receiver) = mpsc::channel(1);
        let cursor = BatchBlocks::new(rpc.clone(), from_header, config.confirmations);
        let producer = BlockSynchronizer::new(
            rpc.clone(),
            store.clone(),
            cursor,
            sender,
            config.blocks_step,
            Duration::from_millis(config.synchronizer_interval_ms),
            shutdown.clone(),
        );

        Ok(Self {
            store,
            rpc,
            confirmations: config.confirmations,
            shutdown,
            producer: Some(producer),
            receiver: Some(receiver),
            tasks: Vec::new(),
            started: AtomicBool::new(false),
        })
    }

    pub fn start(&mut self) -> Result<(), WorkerError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        logging::log_info("starting deposit worker");

        let producer = self.producer.take().ok_or_else(|| {
            WorkerError::ProcessingError("deposit producer already consumed".to_string())
        })?;
        self.tasks.push(tokio::spawn(producer.run()));

        let mut receiver = self.receiver.take().ok_or_else(|| {
            WorkerError::ProcessingError("deposit receiver already consumed".to_string())
        })?;
        let store = self.store.clone();
        let rpc = self.rpc.clone();
        let confirmations = self.confirmations;
        let shutdown = self.shutdown.clone();

        self.tasks.push(tokio::spawn(async move {
            // Drains until the producer drops the sender at shutdown
            while let Some(batch) = receiver.recv().await {
                logging::log_info(&format!("deposit batch for {} tenants", batch.len()));
                if let Err(e) = handle_batch(&store, rpc.as_ref(), confirmations, batch).await {
                    shutdown.handle_crit(format!("deposit worker: {}", e));
                    break;
                }
            }
            logging::log_info("deposit consumer drained");
        }));

        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), WorkerError> {
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        logging::log_info("deposit worker stopped");
        Ok(())
    }
}

#[async_trait::async_trait]
impl crate::application::supervisor::Component for Deposit {
    fn name(&self) -> &'static str {
        "deposit"
    }

    fn start(&mut self) -> Result<(), WorkerError> {
        Deposit::start(self)
    }

    async fn close(&mut self) -> Result<(), WorkerError> {
        Deposit::close(self).await
    }
}

/// Everything one tenant commit writes, prepared outside the
/// transaction so retries replay identical rows.
#[derive(Clone, Default)]
struct PreparedBatch {
    transactions: Vec<TransactionRow>,
    deposits: Vec<DepositRow>,
    deposit_legs: Vec<ChildTxRow>,
    withdraws: Vec<WithdrawRow>,
    withdraw_legs: Vec<ChildTxRow>,
    internals: Vec<InternalRow>,
    internal_legs: Vec<ChildTxRow>,
    vins: Vec<VinRow>,
    vouts: Vec<VoutRow>,
    balance_deltas: Vec<BalanceDelta>,
    lock_releases: Vec<LockDelta>,
    /// (spending tx hash, producing vout address, spend height)
    spent_marks: Vec<(String, String, u64)>,
}

async fn handle_batch(
    store: &Store,
    rpc: &dyn ChainRpc,
    confirmations: u64,
    batch: BusinessBatch,
) -> Result<(), WorkerError> {
    let business_list = BusinessRepository::query_business_list(store.conn()).await?;

    for business in &business_list {
        let Some(entry) = batch.get(&business.business_uid) else {
            continue;
        };
        logging::log_info(&format!(
            "handle business flow, business {}, latest block {}, txn {}",
            business.business_uid,
            entry.block_height,
            entry.transactions.len()
        ));

        let prepared = prepare_batch(store, rpc, &business.business_uid, entry).await?;

        let retry = RetryHandler::new();
        let uid = business.business_uid.clone();
        let block_height = entry.block_height;
        retry
            .execute_with_retry(
                || {
                    let store = store.clone();
                    let uid = uid.clone();
                    let prepared = prepared.clone();
                    async move {
                        store
                            .transaction(move |txn| {
                                Box::pin(async move {
                                    commit_batch(txn, &uid, block_height, confirmations, &prepared)
                                        .await
                                })
                            })
                            .await
                    }
                },
                "persist business batch",
            )
            .await?;
    }
    Ok(())
}

async fn prepare_batch(
    store: &Store,
    rpc: &dyn ChainRpc,
    business_uid: &str,
    entry: &TxBatch,
) -> Result<PreparedBatch, WorkerError> {
    let mut prepared = PreparedBatch::default();

    for tx in &entry.transactions {
        // Sanity fetch; the detail path is also where richer fields
        // (scripts, witnesses) would come from.
        let detail = rpc.get_transaction_by_hash(&tx.hash).await?;
        logging::log_debug(&format!("fetched transaction detail for {}", detail.hash));

        let now = unix_now();
        prepared.transactions.push(build_transaction(tx, now));
        prepared.vins.extend(build_vins(tx, now));
        prepared.vouts.extend(build_vouts(tx, now));
        prepared
            .balance_deltas
            .extend(build_balance_deltas(store, business_uid, tx).await?);

        match tx.tx_type {
            TxType::Deposit => {
                let (deposit, legs) = build_deposit(tx, now);
                prepared.deposits.push(deposit);
                prepared.deposit_legs.extend(legs);
            }
            TxType::Withdraw => {
                let (withdraw, legs) = build_withdraw(tx, now);
                prepared.lock_releases.extend(build_lock_releases(&legs));
                prepared.withdraws.push(withdraw);
                prepared.withdraw_legs.extend(legs);
            }
            TxType::Collection | TxType::Hot2Cold | TxType::Cold2Hot => {
                let (internal, legs) = build_internal(tx, now);
                prepared.lock_releases.extend(build_lock_releases(&legs));
                prepared.internals.push(internal);
                prepared.internal_legs.extend(legs);
            }
            TxType::Unknown => {}
        }

        for vout in &tx.vouts {
            prepared
                .spent_marks
                .push((tx.hash.clone(), vout.address.clone(), tx.block_number));
        }
    }

    Ok(prepared)
}

async fn commit_batch(
    conn: &sea_orm::DatabaseTransaction,
    business_uid: &str,
    batch_height: u64,
    confirmations: u64,
    prepared: &PreparedBatch,
) -> Result<(), DbError> {
    if !prepared.deposits.is_empty() {
        DepositsRepository::store_deposits(conn, business_uid, &prepared.deposits).await?;
        ChildTxsRepository::store_child_txs(conn, business_uid, &prepared.deposit_legs).await?;
    }

    DepositsRepository::update_deposits_confirms(conn, business_uid, batch_height, confirmations)
        .await?;

    if !prepared.balance_deltas.is_empty() {
        BalancesRepository::update_or_create(
            conn,
            business_uid,
            &prepared.balance_deltas,
            unix_now(),
        )
        .await?;
    }

    if !prepared.withdraws.is_empty() {
        WithdrawsRepository::update_withdraw_status(
            conn,
            business_uid,
            TxStatus::Withdrawed,
            &prepared.withdraws,
        )
        .await?;
        ChildTxsRepository::store_child_txs(conn, business_uid, &prepared.withdraw_legs).await?;
    }

    if !prepared.internals.is_empty() {
        InternalsRepository::update_internal_status(
            conn,
            business_uid,
            TxStatus::Success,
            &prepared.internals,
        )
        .await?;
        ChildTxsRepository::store_child_txs(conn, business_uid, &prepared.internal_legs).await?;
    }

    if !prepared.transactions.is_empty() {
        TransactionsRepository::store_transactions(conn, business_uid, &prepared.transactions)
            .await?;
    }

    if !prepared.vins.is_empty() {
        VinsRepository::store_vins(conn, business_uid, &prepared.vins).await?;
    }
    if !prepared.vouts.is_empty() {
        VoutsRepository::store_vouts(conn, business_uid, &prepared.vouts).await?;
    }

    // Mark the producing outputs consumed by this batch as spent
    for (tx_hash, address, height) in &prepared.spent_marks {
        VinsRepository::update_vins_spent(conn, business_uid, tx_hash, address, tx_hash, *height)
            .await?;
    }

    if !prepared.lock_releases.is_empty() {
        BalancesRepository::update_balances(
            conn,
            business_uid,
            &prepared.lock_releases,
            unix_now(),
        )
        .await?;
    }

    Ok(())
}

fn parse_fee(fee: &str) -> U256 {
    U256::from_str(fee).unwrap_or_default()
}

fn build_transaction(tx: &ClassifiedTx, now: u64) -> TransactionRow {
    TransactionRow {
        guid: Uuid::new_v4(),
        hash: tx.hash.clone(),
        block_hash: tx.block_hash.clone(),
        block_number: tx.block_number,
        fee: parse_fee(&tx.fee),
        tx_type: tx.tx_type,
        status: TxStatus::Success,
        timestamp: now,
    }
}

/// Vin rows come from the transaction's inputs
fn build_vins(tx: &ClassifiedTx, now: u64) -> Vec<VinRow> {
    tx.vins
        .iter()
        .map(|vin| VinRow {
            guid: Uuid::new_v4(),
            address: vin.address.clone(),
            tx_id: tx.hash.clone(),
            vout: vin.vout,
            script: String::new(),
            witness: String::new(),
            amount: vin.amount,
            spend_tx_hash: String::new(),
            spend_block_height: 0,
            is_spend: false,
            timestamp: now,
        })
        .collect()
}

/// Vout rows come from the transaction's outputs
fn build_vouts(tx: &ClassifiedTx, now: u64) -> Vec<VoutRow> {
    tx.vouts
        .iter()
        .map(|vout| VoutRow {
            guid: Uuid::new_v4(),
            address: vout.address.clone(),
            n: vout.index,
            script: String::new(),
            amount: vout.amount,
            timestamp: now,
        })
        .collect()
}

fn build_deposit(tx: &ClassifiedTx, now: u64) -> (DepositRow, Vec<ChildTxRow>) {
    let guid = Uuid::new_v4();
    let legs = tx
        .vouts
        .iter()
        .map(|vout| leg(guid, tx, LegTag::Deposit, vout.index, &vout.address, vout.amount, now))
        .collect();

    let deposit = DepositRow {
        guid,
        block_hash: tx.block_hash.clone(),
        block_number: tx.block_number,
        hash: tx.hash.clone(),
        fee: parse_fee(&tx.fee),
        status: TxStatus::UnSafe,
        timestamp: now,
    };
    (deposit, legs)
}

fn build_withdraw(tx: &ClassifiedTx, now: u64) -> (WithdrawRow, Vec<ChildTxRow>) {
    let guid = Uuid::new_v4();
    let legs = tx
        .vins
        .iter()
        .map(|vin| leg(guid, tx, LegTag::Withdraw, vin.vout, &vin.address, vin.amount, now))
        .collect();

    let withdraw = WithdrawRow {
        guid,
        block_hash: tx.block_hash.clone(),
        block_number: tx.block_number,
        hash: tx.hash.clone(),
        fee: parse_fee(&tx.fee),
        lock_time: 0,
        version: "0x00".to_string(),
        tx_sign_hex: String::new(),
        status: TxStatus::Withdrawed,
        timestamp: now,
    };
    (withdraw, legs)
}

/// Internal transfers ledger both sides of the movement:
/// collection tags the hot-wallet outputs `hot_input` and the user
/// inputs `user_output`; hot2cold tags `cold_input`/`hot_output`;
/// cold2hot tags `hot_input`/`cold_output`.
fn build_internal(tx: &ClassifiedTx, now: u64) -> (InternalRow, Vec<ChildTxRow>) {
    let guid = Uuid::new_v4();
    let (vout_tag, vin_tag) = match tx.tx_type {
        TxType::Hot2Cold => (LegTag::ColdInput, LegTag::HotOutput),
        TxType::Cold2Hot => (LegTag::HotInput, LegTag::ColdOutput),
        _ => (LegTag::HotInput, LegTag::UserOutput),
    };

    let mut legs = Vec::with_capacity(tx.vouts.len() + tx.vins.len());
    for vout in &tx.vouts {
        legs.push(leg(guid, tx, vout_tag, vout.index, &vout.address, vout.amount, now));
    }
    for vin in &tx.vins {
        legs.push(leg(guid, tx, vin_tag, vin.vout, &vin.address, vin.amount, now));
    }

    let internal = InternalRow {
        guid,
        block_hash: tx.block_hash.clone(),
        block_number: tx.block_number,
        hash: tx.hash.clone(),
        fee: parse_fee(&tx.fee),
        tx_sign_hex: String::new(),
        status: TxStatus::Success,
        timestamp: now,
    };
    (internal, legs)
}

fn leg(
    parent: Uuid,
    tx: &ClassifiedTx,
    tag: LegTag,
    tx_index: u32,
    to_address: &str,
    amount: U256,
    now: u64,
) -> ChildTxRow {
    ChildTxRow {
        guid: Uuid::new_v4(),
        hash: tx.hash.clone(),
        tx_id: parent.to_string(),
        tx_index,
        tx_type: tag.as_str().to_string(),
        from_address: String::new(),
        to_address: to_address.to_string(),
        amount: amount.to_string(),
        timestamp: now,
    }
}

/// Confirmed balance movement, restricted to addresses the tenant owns:
/// inbound flows credit the receiving outputs, outbound flows debit the
/// spending inputs. A `|`-joined input debits once, to the first owned
/// candidate.
async fn build_balance_deltas<B: AddressBook + ?Sized>(
    book: &B,
    business_uid: &str,
    tx: &ClassifiedTx,
) -> Result<Vec<BalanceDelta>, DbError> {
    let mut deltas = Vec::new();

    if matches!(
        tx.tx_type,
        TxType::Deposit | TxType::Collection | TxType::Hot2Cold | TxType::Cold2Hot
    ) {
        for vout in &tx.vouts {
            if book.address_kind(business_uid, &vout.address).await?.is_some() {
                deltas.push(BalanceDelta {
                    address: vout.address.clone(),
                    amount: vout.amount,
                    direction: BalanceDirection::Credit,
                });
            }
        }
    }

    if matches!(
        tx.tx_type,
        TxType::Withdraw | TxType::Collection | TxType::Hot2Cold | TxType::Cold2Hot
    ) {
        for vin in &tx.vins {
            for candidate in vin.address.split('|') {
                if book.address_kind(business_uid, candidate).await?.is_some() {
                    deltas.push(BalanceDelta {
                        address: candidate.to_string(),
                        amount: vin.amount,
                        direction: BalanceDirection::Debit,
                    });
                    break;
                }
            }
        }
    }

    Ok(deltas)
}

/// A confirmed internal/withdraw releases the locks its dispatch took
fn build_lock_releases(legs: &[ChildTxRow]) -> Vec<LockDelta> {
    legs.iter()
        .filter(|leg| !leg.to_address.is_empty())
        .map(|leg| LockDelta {
            address: leg.to_address.clone(),
            address_type: type_for_tag(&leg.tx_type),
            amount: U256::from_str(&leg.amount).unwrap_or_default(),
            acquire: false,
        })
        .collect()
}

fn type_for_tag(tag: &str) -> AddressType {
    match tag {
        "hot_input" | "hot_output" => AddressType::Hot,
        "cold_input" | "cold_output" => AddressType::Cold,
        _ => AddressType::User,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(
        tx_type: TxType,
        vins: Vec<(&str, u32, u64)>,
        vouts: Vec<(&str, u32, u64)>,
    ) -> ClassifiedTx {
        ClassifiedTx {
            business_uid: "T1".to_string(),
            block_number: 100,
            block_hash: "bh100".to_string(),
            hash: "0xaa".to_string(),
            fee: "1200".to_string(),
            tx_type,
            vins: vins
                .into_iter()
                .map(|(address, vout, amount)| crate::domain::models::TxVin {
                    address: address.to_string(),
                    vout,
                    amount: U256::from(amount),
                })
                .collect(),
            vouts: vouts
                .into_iter()
                .map(|(address, index, amount)| crate::domain::models::TxVout {
                    address: address.to_string(),
                    index,
                    amount: U256::from(amount),
                })
                .collect(),
        }
    }

    fn sum(legs: &[ChildTxRow]) -> U256 {
        legs.iter()
            .map(|l| U256::from_str(&l.amount).unwrap())
            .fold(U256::ZERO, |acc, a| acc + a)
    }

    #[test]
    fn deposit_legs_cover_the_outputs() {
        let tx = classified(
            TxType::Deposit,
            vec![("U1", 0, 60000)],
            vec![("A1", 0, 50000), ("U1", 1, 9000)],
        );
        let (deposit, legs) = build_deposit(&tx, 42);

        assert_eq!(deposit.status, TxStatus::UnSafe);
        assert_eq!(deposit.block_number, 100);
        assert_eq!(deposit.fee, U256::from(1200u64));
        assert_eq!(legs.len(), 2);
        assert!(legs.iter().all(|l| l.tx_type == "deposit"));
        assert!(legs.iter().all(|l| l.tx_id == deposit.guid.to_string()));
        assert_eq!(legs[0].to_address, "A1");
        assert_eq!(legs[0].amount, "50000");
        assert_eq!(sum(&legs), U256::from(59000u64));
    }

    #[test]
    fn withdraw_legs_cover_the_inputs() {
        let tx = classified(TxType::Withdraw, vec![("H1", 0, 70000)], vec![("U2", 0, 69000)]);
        let (withdraw, legs) = build_withdraw(&tx, 42);

        assert_eq!(withdraw.status, TxStatus::Withdrawed);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].tx_type, "withdraw");
        assert_eq!(legs[0].to_address, "H1");
        assert_eq!(sum(&legs), U256::from(70000u64));
    }

    #[test]
    fn collection_tags_hot_inputs_and_user_outputs() {
        let tx = classified(TxType::Collection, vec![("A1", 0, 30000)], vec![("H1", 0, 29000)]);
        let (internal, legs) = build_internal(&tx, 42);

        assert_eq!(internal.status, TxStatus::Success);
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].tx_type, "hot_input");
        assert_eq!(legs[0].to_address, "H1");
        assert_eq!(legs[1].tx_type, "user_output");
        assert_eq!(legs[1].to_address, "A1");
    }

    #[test]
    fn hot2cold_tags_cold_inputs_and_hot_outputs() {
        let tx = classified(TxType::Hot2Cold, vec![("H1", 0, 90000)], vec![("C1", 0, 89000)]);
        let (_, legs) = build_internal(&tx, 42);

        assert_eq!(legs[0].tx_type, "cold_input");
        assert_eq!(legs[0].to_address, "C1");
        assert_eq!(legs[1].tx_type, "hot_output");
        assert_eq!(legs[1].to_address, "H1");
    }

    #[test]
    fn cold2hot_tags_hot_inputs_and_cold_outputs() {
        let tx = classified(TxType::Cold2Hot, vec![("C1", 0, 40000)], vec![("H1", 0, 39000)]);
        let (_, legs) = build_internal(&tx, 42);

        assert_eq!(legs[0].tx_type, "hot_input");
        assert_eq!(legs[0].to_address, "H1");
        assert_eq!(legs[1].tx_type, "cold_output");
        assert_eq!(legs[1].to_address, "C1");
    }

    #[test]
    fn vin_rows_come_from_inputs_and_vout_rows_from_outputs() {
        let tx = classified(
            TxType::Deposit,
            vec![("U1", 3, 60000)],
            vec![("A1", 0, 50000)],
        );
        let vins = build_vins(&tx, 42);
        let vouts = build_vouts(&tx, 42);

        assert_eq!(vins.len(), 1);
        assert_eq!(vins[0].address, "U1");
        assert_eq!(vins[0].vout, 3);
        assert_eq!(vins[0].tx_id, "0xaa");
        assert!(!vins[0].is_spend);

        assert_eq!(vouts.len(), 1);
        assert_eq!(vouts[0].address, "A1");
        assert_eq!(vouts[0].n, 0);
        assert_eq!(vouts[0].amount, U256::from(50000u64));
    }

    #[test]
    fn unparsable_fee_defaults_to_zero() {
        let mut tx = classified(TxType::Deposit, vec![], vec![]);
        tx.fee = "not-a-number".to_string();
        let row = build_transaction(&tx, 42);
        assert_eq!(row.fee, U256::ZERO);
    }

    #[test]
    fn lock_releases_mirror_the_legs() {
        let tx = classified(TxType::Collection, vec![("A1", 0, 30000)], vec![("H1", 0, 29000)]);
        let (_, legs) = build_internal(&tx, 42);
        let releases = build_lock_releases(&legs);

        assert_eq!(releases.len(), 2);
        assert!(releases.iter().all(|r| !r.acquire));
        assert_eq!(releases[0].address, "H1");
        assert_eq!(releases[0].address_type, AddressType::Hot);
        assert_eq!(releases[1].address, "A1");
        assert_eq!(releases[1].address_type, AddressType::User);
    }

    struct StaticBook(Vec<(&'static str, AddressType)>);

    #[async_trait::async_trait]
    impl AddressBook for StaticBook {
        async fn address_kind(
            &self,
            _uid: &str,
            address: &str,
        ) -> Result<Option<AddressType>, DbError> {
            Ok(self
                .0
                .iter()
                .find(|(a, _)| *a == address)
                .map(|(_, t)| *t))
        }
    }

    #[tokio::test]
    async fn balance_deltas_only_touch_owned_addresses() {
        let book = StaticBook(vec![("A1", AddressType::User), ("H1", AddressType::Hot)]);
        let tx = classified(
            TxType::Collection,
            vec![("A1", 0, 30000), ("U9", 1, 500)],
            vec![("H1", 0, 29000), ("U8", 1, 400)],
        );
        let deltas = build_balance_deltas(&book, "T1", &tx).await.unwrap();

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].address, "H1");
        assert_eq!(deltas[0].direction, BalanceDirection::Credit);
        assert_eq!(deltas[1].address, "A1");
        assert_eq!(deltas[1].direction, BalanceDirection::Debit);
    }

    #[tokio::test]
    async fn joint_inputs_debit_once() {
        let book = StaticBook(vec![("A1", AddressType::User), ("A2", AddressType::User)]);
        let tx = classified(TxType::Collection, vec![("A1|A2", 0, 10000)], vec![]);
        let deltas = build_balance_deltas(&book, "T1", &tx).await.unwrap();

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].address, "A1");
        assert_eq!(deltas[0].amount, U256::from(10000u64));
    }
}
