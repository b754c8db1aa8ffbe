use std::str::FromStr;

use alloy_primitives::U256;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use uuid::Uuid;

use crate::domain::models::{TxStatus, WithdrawRow};
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's withdraws (`withdraws_<uid>`)
pub struct WithdrawsRepository;

impl WithdrawsRepository {
    /// Insert a withdraw submitted through the API (status WaitSign,
    /// placeholder hash until broadcast).
    pub async fn store_withdraw<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        row: &WithdrawRow,
    ) -> Result<(), DbError> {
        let sql = format!(
            "INSERT INTO {} (guid, block_hash, block_number, hash, fee, lock_time, version, \
             tx_sign_hex, status, timestamp) \
             VALUES ($1, $2, $3, $4, $5::numeric, $6, $7, $8, $9, $10)",
            tenant_table("withdraws", business_uid)
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
                (row.lock_time as i64).into(),
                row.version.clone().into(),
                row.tx_sign_hex.clone().into(),
                row.status.as_i16().into(),
                (row.timestamp as i64).into(),
            ],
        ))
        .await?;
        Ok(())
    }

    /// Record withdraws observed on chain. A row broadcast by this
    /// service is matched by hash and updated; an externally-broadcast
    /// withdraw materializes as a fresh row.
    pub async fn update_withdraw_status<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        status: TxStatus,
        rows: &[WithdrawRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("withdraws", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, block_hash, block_number, hash, fee, lock_time, version, \
                 tx_sign_hex, status, timestamp) \
                 VALUES ($1, $2, $3, $4, $5::numeric, $6, $7, $8, $9, $10) \
                 ON CONFLICT (hash) WHERE hash <> '0x00' DO UPDATE SET \
                 status = EXCLUDED.status, block_hash = EXCLUDED.block_hash, \
                 block_number = EXCLUDED.block_number",
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
                    (row.lock_time as i64).into(),
                    row.version.clone().into(),
                    row.tx_sign_hex.clone().into(),
                    status.as_i16().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Attach the assembled signed transaction to a pending withdraw
    pub async fn update_signed_tx_by_guid<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        guid: Uuid,
        tx_sign_hex: &str,
    ) -> Result<u64, DbError> {
        let sql = format!(
            "UPDATE {} SET tx_sign_hex = $1 WHERE guid = $2",
            tenant_table("withdraws", business_uid)
        );
        let res = conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [tx_sign_hex.into(), guid.into()],
            ))
            .await?;
        Ok(res.rows_affected())
    }

    /// Signed-but-unbroadcast withdraws
    pub async fn unsent_withdraws<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
    ) -> Result<Vec<WithdrawRow>, DbError> {
        let sql = format!(
            "SELECT guid, block_hash, block_number, hash, fee::text AS fee, lock_time, version, \
             tx_sign_hex, status, timestamp \
             FROM {} WHERE status = $1 AND tx_sign_hex <> ''",
            tenant_table("withdraws", business_uid)
        );
        let rows = conn
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [TxStatus::WaitSign.as_i16().into()],
            ))
            .await?;
        rows.iter().map(Self::row_to_withdraw).collect()
    }

    /// Record a successful broadcast
    pub async fn mark_withdraw_sent<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        guid: Uuid,
        tx_hash: &str,
        status: TxStatus,
    ) -> Result<u64, DbError> {
        let sql = format!(
            "UPDATE {} SET hash = $1, status = $2 WHERE guid = $3",
            tenant_table("withdraws", business_uid)
        );
        let res = conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [tx_hash.into(), status.as_i16().into(), guid.into()],
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
            tenant_table("withdraws", business_uid)
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

    fn row_to_withdraw(row: &sea_orm::QueryResult) -> Result<WithdrawRow, DbError> {
        let map_err = |e: sea_orm::DbErr| DbError::QueryError(e.to_string());
        let fee: String = row.try_get("", "fee").map_err(map_err)?;
        let status: i16 = row.try_get("", "status").map_err(map_err)?;
        Ok(WithdrawRow {
            guid: row.try_get("", "guid").map_err(map_err)?,
            block_hash: row.try_get("", "block_hash").map_err(map_err)?,
            block_number: row.try_get::<i64>("", "block_number").map_err(map_err)? as u64,
            hash: row.try_get("", "hash").map_err(map_err)?,
            fee: U256::from_str(&fee)
                .map_err(|e| DbError::QueryError(format!("bad fee {}: {}", fee, e)))?,
            lock_time: row.try_get::<i64>("", "lock_time").map_err(map_err)? as u64,
            version: row.try_get("", "version").map_err(map_err)?,
            tx_sign_hex: row.try_get("", "tx_sign_hex").map_err(map_err)?,
            status: status_from_i16(status),
            timestamp: row.try_get::<i64>("", "timestamp").map_err(map_err)? as u64,
        })
    }
}

pub(crate) fn status_from_i16(value: i16) -> TxStatus {
    match value {
        0 => TxStatus::UnSafe,
        1 => TxStatus::Safe,
        2 => TxStatus::Success,
        4 => TxStatus::Withdrawed,
        5 => TxStatus::Fallback,
        _ => TxStatus::WaitSign,
    }
}
