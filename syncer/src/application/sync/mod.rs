pub mod block_cursor;
pub mod deposit;
pub mod synchronizer;

pub use block_cursor::BatchBlocks;
pub use deposit::Deposit;
pub use synchronizer::{BlockSynchronizer, BusinessBatch, TxBatch};
