use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::{DepositRow, TxStatus};
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's deposits (`deposits_<uid>`)
pub struct DepositsRepository;

impl DepositsRepository {
    /// Insert confirmed-on-chain deposits; replays collide on hash and
    /// are ignored.
    pub async fn store_deposits<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[DepositRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("deposits", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, block_hash, block_number, hash, fee, status, timestamp) \
                 VALUES ($1, $2, $3, $4, $5::numeric, $6, $7) ON CONFLICT (hash) DO NOTHING",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.block_hash.clone().into(),
                    (row.block_number as i64).into(),
                    row.hash.clone().into(),
                    row.fee.to_string().into(),
                    row.status.as_i16().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Promote deposits that have gathered enough confirmations:
    /// a deposit at height h becomes Safe once batch_height - h >= confirmations.
    pub async fn update_deposits_confirms<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        batch_height: u64,
        confirmations: u64,
    ) -> Result<u64, DbError> {
        if batch_height < confirmations {
            return Ok(0);
        }
        let promote_below = batch_height - confirmations;

        let sql = format!(
            "UPDATE {} SET status = $1 WHERE status = $2 AND block_number <= $3",
            tenant_table("deposits", business_uid)
        );
        let res = conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    TxStatus::Safe.as_i16().into(),
                    TxStatus::UnSafe.as_i16().into(),
                    (promote_below as i64).into(),
                ],
            ))
            .await?;
        Ok(res.rows_affected())
    }

    /// Reorg fallback marking
    pub async fn mark_status_above<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        block_number: u64,
        status: TxStatus,
    ) -> Result<u64, DbError> {
        let sql = format!(
            "UPDATE {} SET status = $1 WHERE block_number > $2",
            tenant_table("deposits", business_uid)
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
