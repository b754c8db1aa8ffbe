mod block;
mod rows;
mod transaction;

pub use block::BlockHeader;
pub use rows::{
    AddressRow, BalanceDelta, BalanceDirection, BalanceRow, ChildTxRow, DepositRow, InternalRow,
    LockDelta, TransactionRow, VinRow, VoutRow, WithdrawRow,
};
pub use transaction::{AddressType, ClassifiedTx, LegTag, TxStatus, TxType, TxVin, TxVout};
