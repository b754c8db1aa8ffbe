pub mod entities;
pub mod error;
pub mod repositories;
pub mod tables;

pub use error::DbError;

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};

use crate::config::DatabaseConfig;
use crate::domain::models::AddressType;
use crate::domain::services::classifier::AddressBook;
use crate::utils::logging;

/// Shared handle to the wallet database. All writes that must be atomic
/// go through [`Store::transaction`]; repository functions accept any
/// `ConnectionTrait` so the same code runs on the pool connection and
/// inside a transaction.
#[derive(Clone)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /// Connect to the database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        match Database::connect(&config.url).await {
            Ok(conn) => {
                logging::log_info("Database connection established");
                Ok(Store { conn })
            }
            Err(e) => Err(DbError::ConnectionError(format!(
                "Failed to connect to database: {}",
                e
            ))),
        }
    }

    /// Wrap an existing connection (tests)
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Store { conn }
    }

    /// The underlying connection, for non-transactional reads
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Run `f` inside a database transaction. Every write performed on
    /// the handle commits or rolls back together.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'c> FnOnce(
                &'c DatabaseTransaction,
            )
                -> Pin<Box<dyn Future<Output = Result<T, DbError>> + Send + 'c>>
            + Send,
    {
        self.conn
            .transaction::<_, T, DbError>(f)
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db) => DbError::SeaOrmError(db),
                TransactionError::Transaction(inner) => inner,
            })
    }
}

#[async_trait]
impl AddressBook for Store {
    async fn address_kind(
        &self,
        business_uid: &str,
        address: &str,
    ) -> Result<Option<AddressType>, DbError> {
        repositories::AddressesRepository::address_exist(&self.conn, business_uid, address).await
    }
}
