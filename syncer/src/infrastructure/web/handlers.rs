use std::sync::Arc;

use alloy_primitives::U256;
use axum::extract::State;
use axum::response::Json;
use uuid::Uuid;

use crate::domain::models::{
    AddressRow, AddressType, BalanceRow, ChildTxRow, TxStatus, WithdrawRow,
};
use crate::infrastructure::node::{ChainRpc, UnsignedTxRequest, UnsignedVin, UnsignedVout};
use crate::infrastructure::persistence::repositories::{
    AddressesRepository, BalancesRepository, BusinessRepository, ChildTxsRepository,
    VinsRepository, WithdrawsRepository,
};
use crate::infrastructure::persistence::{tables, Store};
use crate::infrastructure::web::types::*;
use crate::utils::{logging, unix_now};

/// Satoshis per coin, applied to the node's coin-denominated fee rate
const SATS_PER_COIN: f64 = 1e8;
/// Flat virtual-size estimate for a hot-wallet withdraw
const WITHDRAW_VBYTES_ESTIMATE: f64 = 380.0;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub rpc: Arc<dyn ChainRpc>,
    pub consumer_token: String,
    pub chain: String,
    pub network: String,
}

pub(crate) fn estimate_withdraw_fee(fee_rate: f64) -> U256 {
    let sats = fee_rate * SATS_PER_COIN * WITHDRAW_VBYTES_ESTIMATE;
    if sats <= 0.0 {
        return U256::ZERO;
    }
    U256::from(sats as u128)
}

pub(crate) fn join_sign_hashes(hashes: &[String]) -> String {
    let mut joined = String::new();
    for hash in hashes {
        joined.push_str(hash);
        joined.push('|');
    }
    joined
}

/// POST /business/register: insert the tenant and template its tables
pub async fn business_register(
    State(state): State<AppState>,
    Json(request): Json<BusinessRegisterRequest>,
) -> Json<BusinessRegisterResponse> {
    if request.request_id.is_empty() || request.notify_url.is_empty() {
        return Json(BusinessRegisterResponse {
            code: ReturnCode::Error,
            msg: "invalid params".to_string(),
        });
    }
    if !tables::valid_business_uid(&request.request_id) {
        return Json(BusinessRegisterResponse {
            code: ReturnCode::Error,
            msg: "request id must be alphanumeric".to_string(),
        });
    }

    if let Err(e) = BusinessRepository::store_business(
        state.store.conn(),
        &request.request_id,
        &request.notify_url,
        unix_now(),
    )
    .await
    {
        logging::log_error(&format!("store business failed: {}", e));
        return Json(BusinessRegisterResponse {
            code: ReturnCode::Error,
            msg: "store db fail".to_string(),
        });
    }

    if let Err(e) =
        tables::create_tables_from_template(state.store.conn(), &request.request_id).await
    {
        logging::log_error(&format!("create tenant tables failed: {}", e));
        return Json(BusinessRegisterResponse {
            code: ReturnCode::Error,
            msg: "create tenant tables fail".to_string(),
        });
    }

    Json(BusinessRegisterResponse {
        code: ReturnCode::Success,
        msg: "config business success".to_string(),
    })
}

/// POST /addresses/export: derive an address per public key, persist
/// the address book rows and their zero balances
pub async fn export_addresses(
    State(state): State<AppState>,
    Json(request): Json<ExportAddressesRequest>,
) -> Json<ExportAddressesResponse> {
    let error = |msg: &str| {
        Json(ExportAddressesResponse {
            code: ReturnCode::Error,
            msg: msg.to_string(),
            addresses: Vec::new(),
        })
    };

    let mut exported = Vec::new();
    let mut address_rows = Vec::new();
    let mut balance_rows = Vec::new();
    let now = unix_now();

    for key in &request.public_keys {
        let address = match state
            .rpc
            .export_address_by_public_key(&key.format, &key.public_key)
            .await
        {
            Ok(address) => address,
            Err(e) => {
                logging::log_error(&format!("derive address failed: {}", e));
                return error("derive address fail");
            }
        };

        let address_type = AddressType::from_i16(key.address_type);
        address_rows.push(AddressRow {
            guid: Uuid::new_v4(),
            address: address.clone(),
            address_type,
            public_key: key.public_key.clone(),
            timestamp: now,
        });
        balance_rows.push(BalanceRow {
            guid: Uuid::new_v4(),
            address: address.clone(),
            address_type,
            balance: U256::ZERO,
            lock_balance: U256::ZERO,
            timestamp: now,
        });
        exported.push(ExportedAddress {
            address_type: key.address_type,
            address,
        });
    }

    if let Err(e) =
        AddressesRepository::store_addresses(state.store.conn(), &request.request_id, &address_rows)
            .await
    {
        logging::log_error(&format!("store addresses failed: {}", e));
        return error("store address to db fail");
    }
    if let Err(e) =
        BalancesRepository::store_balances(state.store.conn(), &request.request_id, &balance_rows)
            .await
    {
        logging::log_error(&format!("store balances failed: {}", e));
        return error("store balance to db fail");
    }

    Json(ExportAddressesResponse {
        code: ReturnCode::Success,
        msg: "generate address success".to_string(),
        addresses: exported,
    })
}

/// POST /withdraw/unsigned: fee estimate, hot-wallet vin selection,
/// unsigned construction via the node, and a WaitSign withdraw row
pub async fn build_unsigned_transaction(
    State(state): State<AppState>,
    Json(request): Json<UnsignedWithdrawRequest>,
) -> Json<UnsignedWithdrawResponse> {
    let error = |msg: &str| {
        Json(UnsignedWithdrawResponse {
            code: ReturnCode::Error,
            msg: msg.to_string(),
            return_tx_hashes: Vec::new(),
        })
    };

    if request.consumer_token != state.consumer_token {
        return error("consumer token is error");
    }

    let fee_estimate = match state.rpc.get_fee().await {
        Ok(estimate) => estimate,
        Err(e) => {
            logging::log_error(&format!("get fee failed: {}", e));
            return error("get fee fail");
        }
    };
    let fee = estimate_withdraw_fee(fee_estimate.fee_rate);

    let hot_wallet = match AddressesRepository::query_hot_wallet_info(
        state.store.conn(),
        &request.request_id,
    )
    .await
    {
        Ok(wallet) => wallet,
        Err(e) => {
            logging::log_error(&format!("query hot wallet failed: {}", e));
            return error("hot wallet not configured");
        }
    };

    let unspent = match VinsRepository::query_unspent_by_address(
        state.store.conn(),
        &request.request_id,
        &hot_wallet.address,
    )
    .await
    {
        Ok(vins) => vins,
        Err(e) => {
            logging::log_error(&format!("query unspent vins failed: {}", e));
            return error("query vins fail");
        }
    };

    let vins: Vec<UnsignedVin> = unspent
        .iter()
        .map(|vin| UnsignedVin {
            hash: vin.tx_id.clone(),
            index: vin.vout,
            amount: vin.amount.try_into().unwrap_or(u64::MAX),
            address: hot_wallet.address.clone(),
        })
        .collect();

    let mut vouts = Vec::with_capacity(request.txn.len());
    for txn in &request.txn {
        let Ok(amount) = txn.value.parse::<u64>() else {
            return error("invalid withdraw value");
        };
        vouts.push(UnsignedVout {
            address: txn.to.clone(),
            amount,
            index: 0,
        });
    }

    let unsigned_request = UnsignedTxRequest {
        consumer_token: request.consumer_token.clone(),
        chain: state.chain.clone(),
        network: state.network.clone(),
        fee: fee.to_string(),
        vins,
        vouts,
    };
    let unsigned = match state.rpc.create_unsigned_transaction(&unsigned_request).await {
        Ok(response) => response,
        Err(e) => {
            logging::log_error(&format!("create unsigned transaction failed: {}", e));
            return error("create unsign transaction fail");
        }
    };

    let withdraw = WithdrawRow {
        guid: Uuid::new_v4(),
        block_hash: "0x00".to_string(),
        block_number: 0,
        hash: "0x00".to_string(),
        fee,
        lock_time: 0,
        version: "0x00".to_string(),
        tx_sign_hex: String::new(),
        status: TxStatus::WaitSign,
        timestamp: unix_now(),
    };
    if let Err(e) =
        WithdrawsRepository::store_withdraw(state.store.conn(), &request.request_id, &withdraw)
            .await
    {
        logging::log_error(&format!("store withdraw failed: {}", e));
        return error("store withdraw fail");
    }

    Json(UnsignedWithdrawResponse {
        code: ReturnCode::Success,
        msg: "create unsign transaction success".to_string(),
        return_tx_hashes: vec![ReturnTransactionHashes {
            transaction_uuid: withdraw.guid.to_string(),
            un_sign_tx: join_sign_hashes(&unsigned.sign_hashes),
            tx_data: unsigned.tx_data,
        }],
    })
}

/// POST /withdraw/signed: assemble the signed transaction and attach
/// it to the pending withdraw
pub async fn build_signed_transaction(
    State(state): State<AppState>,
    Json(request): Json<SignedWithdrawRequest>,
) -> Json<SignedWithdrawResponse> {
    let error = |msg: &str| {
        Json(SignedWithdrawResponse {
            code: ReturnCode::Error,
            msg: msg.to_string(),
            return_sign_txn: Vec::new(),
        })
    };

    if request.consumer_token != state.consumer_token {
        return error("consumer token is error");
    }
    let Some(first) = request.sign_txn.first() else {
        return error("empty signature list");
    };
    let Ok(withdraw_guid) = Uuid::parse_str(&first.transaction_uuid) else {
        return error("invalid transaction uuid");
    };

    let hot_wallet = match AddressesRepository::query_hot_wallet_info(
        state.store.conn(),
        &request.request_id,
    )
    .await
    {
        Ok(wallet) => wallet,
        Err(e) => {
            logging::log_error(&format!("query hot wallet failed: {}", e));
            return error("hot wallet not configured");
        }
    };

    let signed_request = crate::infrastructure::node::SignedTxRequest {
        consumer_token: request.consumer_token.clone(),
        chain: state.chain.clone(),
        network: state.network.clone(),
        tx_data: first.tx_data.clone(),
        signatures: request
            .sign_txn
            .iter()
            .map(|s| s.signature.clone())
            .collect(),
        public_keys: vec![hot_wallet.public_key],
    };
    let signed = match state.rpc.build_signed_transaction(&signed_request).await {
        Ok(response) => response,
        Err(e) => {
            logging::log_error(&format!("build signed transaction failed: {}", e));
            return error("build signed transaction fail");
        }
    };

    if let Err(e) = WithdrawsRepository::update_signed_tx_by_guid(
        state.store.conn(),
        &request.request_id,
        withdraw_guid,
        &signed.signed_tx_data,
    )
    .await
    {
        logging::log_error(&format!("update withdraw failed: {}", e));
        return error("update withdraw fail");
    }

    Json(SignedWithdrawResponse {
        code: ReturnCode::Success,
        msg: "build signed transaction success".to_string(),
        return_sign_txn: vec![ReturnSignedTransaction {
            transaction_uuid: first.transaction_uuid.clone(),
            signed_tx: signed.signed_tx_data,
        }],
    })
}

/// POST /withdraw/submit: persist the withdraw and its ledger legs in
/// one store transaction
pub async fn submit_withdraw(
    State(state): State<AppState>,
    Json(request): Json<SubmitWithdrawRequest>,
) -> Json<SubmitWithdrawResponse> {
    let error = |msg: &str| {
        Json(SubmitWithdrawResponse {
            code: ReturnCode::Error,
            msg: msg.to_string(),
        })
    };

    if request.consumer_token != state.consumer_token {
        return error("consumer token is error");
    }

    let hot_wallet = match AddressesRepository::query_hot_wallet_info(
        state.store.conn(),
        &request.request_id,
    )
    .await
    {
        Ok(wallet) => wallet,
        Err(e) => {
            logging::log_error(&format!("query hot wallet failed: {}", e));
            return error("hot wallet not configured");
        }
    };

    let now = unix_now();
    let withdraw = WithdrawRow {
        guid: Uuid::new_v4(),
        block_hash: "0x00".to_string(),
        block_number: 0,
        hash: "0x00".to_string(),
        fee: U256::ZERO,
        lock_time: 0,
        version: "0x00".to_string(),
        tx_sign_hex: String::new(),
        status: TxStatus::WaitSign,
        timestamp: now,
    };
    let legs: Vec<ChildTxRow> = request
        .withdraw_list
        .iter()
        .map(|item| ChildTxRow {
            guid: Uuid::new_v4(),
            hash: "0x00".to_string(),
            tx_id: withdraw.guid.to_string(),
            tx_index: 0,
            tx_type: "withdraw".to_string(),
            from_address: hot_wallet.address.clone(),
            to_address: item.address.clone(),
            amount: item.value.clone(),
            timestamp: now,
        })
        .collect();

    let uid = request.request_id.clone();
    let result = state
        .store
        .transaction(move |txn| {
            Box::pin(async move {
                if !legs.is_empty() {
                    ChildTxsRepository::store_child_txs(txn, &uid, &legs).await?;
                }
                WithdrawsRepository::store_withdraw(txn, &uid, &withdraw).await?;
                Ok(())
            })
        })
        .await;

    match result {
        Ok(()) => Json(SubmitWithdrawResponse {
            code: ReturnCode::Success,
            msg: "submit withdraw success".to_string(),
        }),
        Err(e) => {
            logging::log_error(&format!("persist withdraw batch failed: {}", e));
            error("submit withdraw fail")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_estimate_scales_by_coin_and_size() {
        // 0.00000002 coin/vB -> 2 sat/vB -> 760 sats for 380 vbytes
        assert_eq!(estimate_withdraw_fee(0.00000002), U256::from(760u64));
        assert_eq!(estimate_withdraw_fee(0.0), U256::ZERO);
        assert_eq!(estimate_withdraw_fee(-1.0), U256::ZERO);
    }

    #[test]
    fn sign_hashes_join_with_separator() {
        let joined = join_sign_hashes(&["aa".to_string(), "bb".to_string()]);
        assert_eq!(joined, "aa|bb|");
        assert_eq!(join_sign_hashes(&[]), "");
    }
}
