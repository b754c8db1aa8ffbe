use serde::{Deserialize, Serialize};

/// Outcome code carried by every API response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnCode {
    Success,
    Error,
}

#[derive(Debug, Deserialize)]
pub struct BusinessRegisterRequest {
    pub request_id: String,
    pub notify_url: String,
}

#[derive(Debug, Serialize)]
pub struct BusinessRegisterResponse {
    pub code: ReturnCode,
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct PublicKeyItem {
    #[serde(rename = "type")]
    pub address_type: i16,
    pub format: String,
    pub public_key: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportAddressesRequest {
    pub request_id: String,
    pub public_keys: Vec<PublicKeyItem>,
}

#[derive(Debug, Serialize)]
pub struct ExportedAddress {
    #[serde(rename = "type")]
    pub address_type: i16,
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ExportAddressesResponse {
    pub code: ReturnCode,
    pub msg: String,
    pub addresses: Vec<ExportedAddress>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawTxn {
    pub to: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct UnsignedWithdrawRequest {
    pub request_id: String,
    pub consumer_token: String,
    pub txn: Vec<WithdrawTxn>,
}

#[derive(Debug, Serialize)]
pub struct ReturnTransactionHashes {
    pub transaction_uuid: String,
    pub un_sign_tx: String,
    pub tx_data: String,
}

#[derive(Debug, Serialize)]
pub struct UnsignedWithdrawResponse {
    pub code: ReturnCode,
    pub msg: String,
    pub return_tx_hashes: Vec<ReturnTransactionHashes>,
}

#[derive(Debug, Deserialize)]
pub struct SignedTxnItem {
    pub transaction_uuid: String,
    pub signature: String,
    pub tx_data: String,
}

#[derive(Debug, Deserialize)]
pub struct SignedWithdrawRequest {
    pub request_id: String,
    pub consumer_token: String,
    pub sign_txn: Vec<SignedTxnItem>,
}

#[derive(Debug, Serialize)]
pub struct ReturnSignedTransaction {
    pub transaction_uuid: String,
    pub signed_tx: String,
}

#[derive(Debug, Serialize)]
pub struct SignedWithdrawResponse {
    pub code: ReturnCode,
    pub msg: String,
    pub return_sign_txn: Vec<ReturnSignedTransaction>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitWithdrawItem {
    pub address: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitWithdrawRequest {
    pub request_id: String,
    pub consumer_token: String,
    pub withdraw_list: Vec<SubmitWithdrawItem>,
}

#[derive(Debug, Serialize)]
pub struct SubmitWithdrawResponse {
    pub code: ReturnCode,
    pub msg: String,
}
