use serde::{Deserialize, Serialize};

/// A canonical chain header as reported by the wallet node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: String,
    pub prev_hash: String,
    pub number: u64,
    pub timestamp: u64,
}
