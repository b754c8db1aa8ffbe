use alloy_primitives::U256;

/// Classification of an on-chain transaction relative to one tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Deposit,
    Withdraw,
    Collection,
    Hot2Cold,
    Cold2Hot,
    Unknown,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Deposit => "deposit",
            TxType::Withdraw => "withdraw",
            TxType::Collection => "collection",
            TxType::Hot2Cold => "hot2cold",
            TxType::Cold2Hot => "cold2hot",
            TxType::Unknown => "unknown",
        }
    }

    /// True for collection / hot2cold / cold2hot
    pub fn is_internal(&self) -> bool {
        matches!(self, TxType::Collection | TxType::Hot2Cold | TxType::Cold2Hot)
    }
}

/// Persisted transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    UnSafe = 0,
    Safe = 1,
    Success = 2,
    WaitSign = 3,
    Withdrawed = 4,
    Fallback = 5,
}

impl TxStatus {
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }
}

/// Address ownership class within a tenant's address book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressType {
    User = 0,
    Hot = 1,
    Cold = 2,
}

impl AddressType {
    pub fn as_i16(&self) -> i16 {
        *self as i16
    }

    pub fn from_i16(value: i16) -> Self {
        match value {
            1 => AddressType::Hot,
            2 => AddressType::Cold,
            _ => AddressType::User,
        }
    }
}

/// Tag of a child-transaction ledger leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegTag {
    Deposit,
    Withdraw,
    HotInput,
    HotOutput,
    ColdInput,
    ColdOutput,
    UserOutput,
}

impl LegTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegTag::Deposit => "deposit",
            LegTag::Withdraw => "withdraw",
            LegTag::HotInput => "hot_input",
            LegTag::HotOutput => "hot_output",
            LegTag::ColdInput => "cold_input",
            LegTag::ColdOutput => "cold_output",
            LegTag::UserOutput => "user_output",
        }
    }
}

/// An input of a classified transaction. `address` may be a `|`-joined
/// multi-address string as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxVin {
    pub address: String,
    pub vout: u32,
    pub amount: U256,
}

/// An output of a classified transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxVout {
    pub address: String,
    pub index: u32,
    pub amount: U256,
}

/// A transaction labeled against one tenant's address book
#[derive(Debug, Clone)]
pub struct ClassifiedTx {
    pub business_uid: String,
    pub block_number: u64,
    pub block_hash: String,
    pub hash: String,
    pub fee: String,
    pub tx_type: TxType,
    pub vins: Vec<TxVin>,
    pub vouts: Vec<TxVout>,
}
