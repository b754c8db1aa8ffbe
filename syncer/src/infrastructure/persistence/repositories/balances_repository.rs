use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::{BalanceDelta, BalanceDirection, BalanceRow, LockDelta};
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's aggregate balances (`balances_<uid>`)
pub struct BalancesRepository;

impl BalancesRepository {
    /// Insert zero balances for freshly derived addresses
    pub async fn store_balances<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[BalanceRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("balances", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, address, address_type, balance, lock_balance, timestamp) \
                 VALUES ($1, $2, $3, $4::numeric, $5::numeric, $6) ON CONFLICT (address) DO NOTHING",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.address.clone().into(),
                    row.address_type.as_i16().into(),
                    row.balance.to_string().into(),
                    row.lock_balance.to_string().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Apply confirmed balance changes, creating rows for addresses the
    /// export flow has not seen yet. New rows take their type from the
    /// tenant address book, defaulting to user.
    pub async fn update_or_create<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        deltas: &[BalanceDelta],
        timestamp: u64,
    ) -> Result<(), DbError> {
        let balances = tenant_table("balances", business_uid);
        let address = tenant_table("address", business_uid);

        for delta in deltas {
            match delta.direction {
                BalanceDirection::Credit => {
                    let sql = format!(
                        "INSERT INTO {balances} (guid, address, address_type, balance, lock_balance, timestamp) \
                         SELECT gen_random_uuid(), $1, \
                         COALESCE((SELECT address_type FROM {address} a WHERE a.address = $1), 0), \
                         $2::numeric, 0, $3 \
                         ON CONFLICT (address) DO UPDATE SET balance = {balances}.balance + EXCLUDED.balance",
                    );
                    conn.execute(Statement::from_sql_and_values(
                        DbBackend::Postgres,
                        sql,
                        [
                            delta.address.clone().into(),
                            delta.amount.to_string().into(),
                            (timestamp as i64).into(),
                        ],
                    ))
                    .await?;
                }
                BalanceDirection::Debit => {
                    let sql = format!(
                        "UPDATE {balances} SET balance = GREATEST(balance - $1::numeric, 0) \
                         WHERE address = $2",
                    );
                    conn.execute(Statement::from_sql_and_values(
                        DbBackend::Postgres,
                        sql,
                        [delta.amount.to_string().into(), delta.address.clone().into()],
                    ))
                    .await?;
                }
            }
        }
        Ok(())
    }

    /// Apply lock-balance changes: acquisitions when a transfer enters
    /// flight, releases (floored at zero) when it confirms.
    pub async fn update_balances<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        deltas: &[LockDelta],
        timestamp: u64,
    ) -> Result<(), DbError> {
        let balances = tenant_table("balances", business_uid);

        for delta in deltas {
            if delta.acquire {
                let sql = format!(
                    "INSERT INTO {balances} (guid, address, address_type, balance, lock_balance, timestamp) \
                     VALUES (gen_random_uuid(), $1, $2, 0, $3::numeric, $4) \
                     ON CONFLICT (address) DO UPDATE SET \
                     lock_balance = {balances}.lock_balance + EXCLUDED.lock_balance",
                );
                conn.execute(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    sql,
                    [
                        delta.address.clone().into(),
                        delta.address_type.as_i16().into(),
                        delta.amount.to_string().into(),
                        (timestamp as i64).into(),
                    ],
                ))
                .await?;
            } else {
                let sql = format!(
                    "UPDATE {balances} SET lock_balance = GREATEST(lock_balance - $1::numeric, 0) \
                     WHERE address = $2",
                );
                conn.execute(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    sql,
                    [delta.amount.to_string().into(), delta.address.clone().into()],
                ))
                .await?;
            }
        }
        Ok(())
    }
}
