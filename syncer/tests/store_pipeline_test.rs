//! Store-level pipeline tests. These need a PostgreSQL instance and are
//! ignored by default.
//!
//! Run with: DATABASE_URL=postgres://... cargo test --test store_pipeline_test -- --ignored

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::U256;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use uuid::Uuid;

use wallet_syncer::config::DatabaseConfig;
use wallet_syncer::domain::models::{
    AddressRow, AddressType, DepositRow, TxStatus, VinRow,
};
use wallet_syncer::domain::services::{AddressBook, TenantContext, TxClassifier};
use wallet_syncer::domain::models::BlockHeader;
use wallet_syncer::infrastructure::node::{NodeTx, NodeVin, NodeVout};
use wallet_syncer::infrastructure::persistence::repositories::{
    AddressesRepository, BusinessRepository, DepositsRepository, VinsRepository,
};
use wallet_syncer::infrastructure::persistence::{tables, Store};

async fn connect_store() -> Option<Store> {
    dotenv::dotenv().ok();
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            println!("DATABASE_URL not set, skipping");
            return None;
        }
    };
    let store = Store::connect(&DatabaseConfig { url })
        .await
        .expect("failed to connect to database");
    Migrator::up(store.conn(), None)
        .await
        .expect("failed to run migrations");
    Some(store)
}

fn fresh_uid(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("{}{}", prefix, nanos)
}

async fn register_tenant(store: &Store, uid: &str) {
    BusinessRepository::store_business(store.conn(), uid, "http://localhost/notify", 1)
        .await
        .expect("failed to store business");
    tables::create_tables_from_template(store.conn(), uid)
        .await
        .expect("failed to template tenant tables");

    let rows = vec![
        address(uid, "A1", AddressType::User),
        address(uid, "H1", AddressType::Hot),
        address(uid, "C1", AddressType::Cold),
    ];
    AddressesRepository::store_addresses(store.conn(), uid, &rows)
        .await
        .expect("failed to store addresses");
}

fn address(uid: &str, name: &str, address_type: AddressType) -> AddressRow {
    AddressRow {
        guid: Uuid::new_v4(),
        address: format!("{}_{}", name, uid),
        address_type,
        public_key: format!("pk_{}", name),
        timestamp: 1,
    }
}

async fn count(store: &Store, table: &str, uid: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) AS cnt FROM {}_{}", table, uid);
    let row = store
        .conn()
        .query_one(Statement::from_string(DbBackend::Postgres, sql))
        .await
        .expect("count query failed")
        .expect("count query returned nothing");
    row.try_get("", "cnt").expect("count column missing")
}

#[tokio::test]
#[ignore]
async fn classifier_reads_the_stored_address_book() {
    let Some(store) = connect_store().await else {
        return;
    };
    let uid = fresh_uid("it_cls_");
    register_tenant(&store, &uid).await;

    let ctx = TenantContext {
        business_uid: uid.clone(),
        hot_wallet: format!("H1_{}", uid),
        cold_wallet: format!("C1_{}", uid),
    };
    let kind = store
        .address_kind(&uid, &format!("A1_{}", uid))
        .await
        .expect("lookup failed");
    assert_eq!(kind, Some(AddressType::User));

    let tx = NodeTx {
        hash: "0xaa".to_string(),
        fee: "1000".to_string(),
        vins: vec![NodeVin {
            address: "unknown_source".to_string(),
            index: 0,
            amount: 60000,
        }],
        vouts: vec![NodeVout {
            address: format!("A1_{}", uid),
            index: 0,
            amount: 50000,
        }],
    };
    let block = BlockHeader {
        hash: "bh100".to_string(),
        prev_hash: "bh99".to_string(),
        number: 100,
        timestamp: 1,
    };
    let classified = TxClassifier::classify(&store, &ctx, &tx, &block)
        .await
        .expect("classification failed");
    assert_eq!(classified.tx_type.as_str(), "deposit");
}

#[tokio::test]
#[ignore]
async fn deposit_rows_are_idempotent_and_promoted_by_confirms() {
    let Some(store) = connect_store().await else {
        return;
    };
    let uid = fresh_uid("it_dep_");
    register_tenant(&store, &uid).await;

    let deposit = DepositRow {
        guid: Uuid::new_v4(),
        block_hash: "bh100".to_string(),
        block_number: 100,
        hash: "0xaa".to_string(),
        fee: U256::from(1000u64),
        status: TxStatus::UnSafe,
        timestamp: 1,
    };

    // Replaying the same deposit must not duplicate it
    for _ in 0..2 {
        DepositsRepository::store_deposits(store.conn(), &uid, &[deposit.clone()])
            .await
            .expect("store deposit failed");
    }
    assert_eq!(count(&store, "deposits", &uid).await, 1);

    // 102 - 100 < 3: stays UnSafe
    DepositsRepository::update_deposits_confirms(store.conn(), &uid, 102, 3)
        .await
        .expect("confirm update failed");
    let row = store
        .conn()
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            format!("SELECT status FROM deposits_{} WHERE hash = '0xaa'", uid),
        ))
        .await
        .unwrap()
        .unwrap();
    let status: i16 = row.try_get("", "status").unwrap();
    assert_eq!(status, TxStatus::UnSafe.as_i16());

    // 103 - 100 >= 3: promoted
    DepositsRepository::update_deposits_confirms(store.conn(), &uid, 103, 3)
        .await
        .expect("confirm update failed");
    let row = store
        .conn()
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            format!("SELECT status FROM deposits_{} WHERE hash = '0xaa'", uid),
        ))
        .await
        .unwrap()
        .unwrap();
    let status: i16 = row.try_get("", "status").unwrap();
    assert_eq!(status, TxStatus::Safe.as_i16());
}

#[tokio::test]
#[ignore]
async fn spent_vins_round_trip() {
    let Some(store) = connect_store().await else {
        return;
    };
    let uid = fresh_uid("it_vin_");
    register_tenant(&store, &uid).await;

    let vin = VinRow {
        guid: Uuid::new_v4(),
        address: format!("A1_{}", uid),
        tx_id: "0xaa".to_string(),
        vout: 0,
        script: String::new(),
        witness: String::new(),
        amount: U256::from(50000u64),
        spend_tx_hash: String::new(),
        spend_block_height: 0,
        is_spend: false,
        timestamp: 1,
    };
    VinsRepository::store_vins(store.conn(), &uid, &[vin.clone()])
        .await
        .expect("store vin failed");

    VinsRepository::update_vins_spent(store.conn(), &uid, "0xaa", &vin.address, "0xbb", 105)
        .await
        .expect("spend update failed");

    let found = VinsRepository::query_vin_by_tx_id(store.conn(), &uid, &vin.address, "0xaa")
        .await
        .expect("query failed")
        .expect("vin missing");
    assert!(found.is_spend);
    assert_eq!(found.spend_tx_hash, "0xbb");
    assert_eq!(found.spend_block_height, 105);
    assert_eq!(found.amount, U256::from(50000u64));
}

#[tokio::test]
#[ignore]
async fn atomic_commit_rolls_back_together() {
    let Some(store) = connect_store().await else {
        return;
    };
    let uid = fresh_uid("it_txn_");
    register_tenant(&store, &uid).await;

    let deposit = DepositRow {
        guid: Uuid::new_v4(),
        block_hash: "bh200".to_string(),
        block_number: 200,
        hash: "0xcc".to_string(),
        fee: U256::from(1000u64),
        status: TxStatus::UnSafe,
        timestamp: 1,
    };

    let uid_in = uid.clone();
    let result: Result<(), _> = store
        .transaction(move |txn| {
            Box::pin(async move {
                DepositsRepository::store_deposits(txn, &uid_in, &[deposit]).await?;
                Err(wallet_syncer::infrastructure::persistence::DbError::QueryError(
                    "forced rollback".to_string(),
                ))
            })
        })
        .await;

    assert!(result.is_err());
    assert_eq!(count(&store, "deposits", &uid).await, 0);
}
