pub mod addresses_repository;
pub mod balances_repository;
pub mod blocks_repository;
pub mod business_repository;
pub mod child_txs_repository;
pub mod deposits_repository;
pub mod internals_repository;
pub mod transactions_repository;
pub mod vins_repository;
pub mod vouts_repository;
pub mod withdraws_repository;

pub use addresses_repository::AddressesRepository;
pub use balances_repository::BalancesRepository;
pub use blocks_repository::BlocksRepository;
pub use business_repository::BusinessRepository;
pub use child_txs_repository::ChildTxsRepository;
pub use deposits_repository::DepositsRepository;
pub use internals_repository::InternalsRepository;
pub use transactions_repository::TransactionsRepository;
pub use vins_repository::VinsRepository;
pub use vouts_repository::VoutsRepository;
pub use withdraws_repository::WithdrawsRepository;
