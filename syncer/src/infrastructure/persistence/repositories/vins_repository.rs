use std::str::FromStr;

use alloy_primitives::U256;
use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::VinRow;
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's observed inputs (`vins_<uid>`)
pub struct VinsRepository;

impl VinsRepository {
    /// Insert observed inputs. Replays collide on (tx_id, vout, address)
    /// and are ignored.
    pub async fn store_vins<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[VinRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("vins", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, address, tx_id, vout, script, witness, amount, \
                 spend_tx_hash, spend_block_height, is_spend, timestamp) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7::numeric, $8, $9, $10, $11) \
                 ON CONFLICT (tx_id, vout, address) DO NOTHING",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.address.clone().into(),
                    row.tx_id.clone().into(),
                    (row.vout as i32).into(),
                    row.script.clone().into(),
                    row.witness.clone().into(),
                    row.amount.to_string().into(),
                    row.spend_tx_hash.clone().into(),
                    (row.spend_block_height as i64).into(),
                    row.is_spend.into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Mark the inputs matching (tx_id, address) as spent
    pub async fn update_vins_spent<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        tx_id: &str,
        address: &str,
        spend_tx_hash: &str,
        spend_block_height: u64,
    ) -> Result<u64, DbError> {
        let sql = format!(
            "UPDATE {} SET is_spend = TRUE, spend_tx_hash = $1, spend_block_height = $2 \
             WHERE tx_id = $3 AND address = $4",
            tenant_table("vins", business_uid)
        );
        let res = conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    spend_tx_hash.into(),
                    (spend_block_height as i64).into(),
                    tx_id.into(),
                    address.into(),
                ],
            ))
            .await?;
        Ok(res.rows_affected())
    }

    /// Input row for (address, tx_id), if observed
    pub async fn query_vin_by_tx_id<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        address: &str,
        tx_id: &str,
    ) -> Result<Option<VinRow>, DbError> {
        let sql = format!(
            "SELECT guid, address, tx_id, vout, script, witness, amount::text AS amount, \
             spend_tx_hash, spend_block_height, is_spend, timestamp \
             FROM {} WHERE tx_id = $1 AND address = $2",
            tenant_table("vins", business_uid)
        );
        let row = conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [tx_id.into(), address.into()],
            ))
            .await?;
        row.map(|r| Self::row_to_vin(&r)).transpose()
    }

    /// Unspent inputs credited to an address, oldest first. Used for
    /// hot-wallet vin selection when building a withdraw.
    pub async fn query_unspent_by_address<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        address: &str,
    ) -> Result<Vec<VinRow>, DbError> {
        let sql = format!(
            "SELECT guid, address, tx_id, vout, script, witness, amount::text AS amount, \
             spend_tx_hash, spend_block_height, is_spend, timestamp \
             FROM {} WHERE address = $1 AND is_spend = FALSE ORDER BY timestamp ASC",
            tenant_table("vins", business_uid)
        );
        let rows = conn
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [address.into()],
            ))
            .await?;
        rows.iter().map(Self::row_to_vin).collect()
    }

    fn row_to_vin(row: &sea_orm::QueryResult) -> Result<VinRow, DbError> {
        let map_err = |e: sea_orm::DbErr| DbError::QueryError(e.to_string());
        let amount: String = row.try_get("", "amount").map_err(map_err)?;
        Ok(VinRow {
            guid: row.try_get("", "guid").map_err(map_err)?,
            address: row.try_get("", "address").map_err(map_err)?,
            tx_id: row.try_get("", "tx_id").map_err(map_err)?,
            vout: row.try_get::<i32>("", "vout").map_err(map_err)? as u32,
            script: row.try_get("", "script").map_err(map_err)?,
            witness: row.try_get("", "witness").map_err(map_err)?,
            amount: U256::from_str(&amount)
                .map_err(|e| DbError::QueryError(format!("bad amount {}: {}", amount, e)))?,
            spend_tx_hash: row.try_get("", "spend_tx_hash").map_err(map_err)?,
            spend_block_height: row.try_get::<i64>("", "spend_block_height").map_err(map_err)?
                as u64,
            is_spend: row.try_get("", "is_spend").map_err(map_err)?,
            timestamp: row.try_get::<i64>("", "timestamp").map_err(map_err)? as u64,
        })
    }
}
