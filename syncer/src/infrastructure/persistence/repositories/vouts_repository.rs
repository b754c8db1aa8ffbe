use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::VoutRow;
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's observed outputs (`vouts_<uid>`)
pub struct VoutsRepository;

impl VoutsRepository {
    pub async fn store_vouts<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[VoutRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("vouts", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, address, n, script, amount, timestamp) \
                 VALUES ($1, $2, $3, $4, $5::numeric, $6)",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.address.clone().into(),
                    (row.n as i32).into(),
                    row.script.clone().into(),
                    row.amount.to_string().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }
}
