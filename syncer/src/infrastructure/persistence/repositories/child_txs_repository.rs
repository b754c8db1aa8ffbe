use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::ChildTxRow;
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's ledger legs (`child_txs_<uid>`)
pub struct ChildTxsRepository;

impl ChildTxsRepository {
    /// Insert ledger legs. A replayed leg collides on its natural key
    /// (hash, tx_index, tx_type, from, to) and is ignored.
    pub async fn store_child_txs<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[ChildTxRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("child_txs", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, hash, tx_id, tx_index, tx_type, from_address, to_address, \
                 amount, timestamp) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (hash, tx_index, tx_type, from_address, to_address) DO NOTHING",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.hash.clone().into(),
                    row.tx_id.clone().into(),
                    (row.tx_index as i32).into(),
                    row.tx_type.clone().into(),
                    row.from_address.clone().into(),
                    row.to_address.clone().into(),
                    row.amount.clone().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Legs attached to a parent row guid
    pub async fn query_child_txs_by_parent<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        parent_tx_id: &str,
    ) -> Result<Vec<ChildTxRow>, DbError> {
        let sql = format!(
            "SELECT guid, hash, tx_id, tx_index, tx_type, from_address, to_address, amount, timestamp \
             FROM {} WHERE tx_id = $1",
            tenant_table("child_txs", business_uid)
        );
        let rows = conn
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [parent_tx_id.into()],
            ))
            .await?;
        rows.iter().map(Self::row_to_child_tx).collect()
    }

    fn row_to_child_tx(row: &sea_orm::QueryResult) -> Result<ChildTxRow, DbError> {
        let map_err = |e: sea_orm::DbErr| DbError::QueryError(e.to_string());
        Ok(ChildTxRow {
            guid: row.try_get("", "guid").map_err(map_err)?,
            hash: row.try_get("", "hash").map_err(map_err)?,
            tx_id: row.try_get("", "tx_id").map_err(map_err)?,
            tx_index: row.try_get::<i32>("", "tx_index").map_err(map_err)? as u32,
            tx_type: row.try_get("", "tx_type").map_err(map_err)?,
            from_address: row.try_get("", "from_address").map_err(map_err)?,
            to_address: row.try_get("", "to_address").map_err(map_err)?,
            amount: row.try_get("", "amount").map_err(map_err)?,
            timestamp: row.try_get::<i64>("", "timestamp").map_err(map_err)? as u64,
        })
    }
}
