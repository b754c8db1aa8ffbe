use alloy_primitives::U256;
use uuid::Uuid;

use super::transaction::{AddressType, TxStatus, TxType};

/// A tenant-owned address with its ownership class
#[derive(Debug, Clone)]
pub struct AddressRow {
    pub guid: Uuid,
    pub address: String,
    pub address_type: AddressType,
    pub public_key: String,
    pub timestamp: u64,
}

/// An observed transaction input
#[derive(Debug, Clone)]
pub struct VinRow {
    pub guid: Uuid,
    pub address: String,
    pub tx_id: String,
    pub vout: u32,
    pub script: String,
    pub witness: String,
    pub amount: U256,
    pub spend_tx_hash: String,
    pub spend_block_height: u64,
    pub is_spend: bool,
    pub timestamp: u64,
}

/// An observed transaction output
#[derive(Debug, Clone)]
pub struct VoutRow {
    pub guid: Uuid,
    pub address: String,
    pub n: u32,
    pub script: String,
    pub amount: U256,
    pub timestamp: u64,
}

/// A classified transaction record
#[derive(Debug, Clone)]
pub struct TransactionRow {
    pub guid: Uuid,
    pub hash: String,
    pub block_hash: String,
    pub block_number: u64,
    pub fee: U256,
    pub tx_type: TxType,
    pub status: TxStatus,
    pub timestamp: u64,
}

/// A deposit projection of a transaction
#[derive(Debug, Clone)]
pub struct DepositRow {
    pub guid: Uuid,
    pub block_hash: String,
    pub block_number: u64,
    pub hash: String,
    pub fee: U256,
    pub status: TxStatus,
    pub timestamp: u64,
}

/// A withdraw projection of a transaction
#[derive(Debug, Clone)]
pub struct WithdrawRow {
    pub guid: Uuid,
    pub block_hash: String,
    pub block_number: u64,
    pub hash: String,
    pub fee: U256,
    pub lock_time: u64,
    pub version: String,
    pub tx_sign_hex: String,
    pub status: TxStatus,
    pub timestamp: u64,
}

/// An internal-transfer projection of a transaction
#[derive(Debug, Clone)]
pub struct InternalRow {
    pub guid: Uuid,
    pub block_hash: String,
    pub block_number: u64,
    pub hash: String,
    pub fee: U256,
    pub tx_sign_hex: String,
    pub status: TxStatus,
    pub timestamp: u64,
}

/// One ledger leg of a value movement, attached to a parent row by guid
#[derive(Debug, Clone)]
pub struct ChildTxRow {
    pub guid: Uuid,
    pub hash: String,
    pub tx_id: String,
    pub tx_index: u32,
    pub tx_type: String,
    pub from_address: String,
    pub to_address: String,
    pub amount: String,
    pub timestamp: u64,
}

/// Aggregate per-address balance
#[derive(Debug, Clone)]
pub struct BalanceRow {
    pub guid: Uuid,
    pub address: String,
    pub address_type: AddressType,
    pub balance: U256,
    pub lock_balance: U256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceDirection {
    Credit,
    Debit,
}

/// A signed change to an address balance
#[derive(Debug, Clone)]
pub struct BalanceDelta {
    pub address: String,
    pub amount: U256,
    pub direction: BalanceDirection,
}

/// A change to an address lock balance. `acquire` grows the lock when a
/// transfer enters flight; releases are floored at zero on confirmation.
#[derive(Debug, Clone)]
pub struct LockDelta {
    pub address: String,
    pub address_type: AddressType,
    pub amount: U256,
    pub acquire: bool,
}
