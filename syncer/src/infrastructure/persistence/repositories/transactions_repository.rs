use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::{TransactionRow, TxStatus};
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's classified transactions (`transactions_<uid>`)
pub struct TransactionsRepository;

impl TransactionsRepository {
    /// Insert classified transactions; replays collide on hash and are
    /// ignored.
    pub async fn store_transactions<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[TransactionRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("transactions", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, hash, block_hash, block_number, fee, tx_type, status, timestamp) \
                 VALUES ($1, $2, $3, $4, $5::numeric, $6, $7, $8) ON CONFLICT (hash) DO NOTHING",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.hash.clone().into(),
                    row.block_hash.clone().into(),
                    (row.block_number as i64).into(),
                    row.fee.to_string().into(),
                    row.tx_type.as_str().into(),
                    row.status.as_i16().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Mark every transaction above `block_number` with the given status
    /// (reorg fallback).
    pub async fn mark_status_above<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        block_number: u64,
        status: TxStatus,
    ) -> Result<u64, DbError> {
        let sql = format!(
            "UPDATE {} SET status = $1 WHERE block_number > $2",
            tenant_table("transactions", business_uid)
        );
        let res = conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [status.as_i16().into(), (block_number as i64).into()],
            ))
            .await?;
        Ok(res.rows_affected())
    }
}
