pub mod classifier;

pub use classifier::{AddressBook, TenantContext, TxClassifier};
