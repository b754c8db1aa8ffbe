use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::domain::models::{AddressRow, AddressType};
use crate::infrastructure::persistence::error::DbError;
use crate::infrastructure::persistence::tables::tenant_table;

/// Repository for a tenant's address book (`address_<uid>`)
pub struct AddressesRepository;

impl AddressesRepository {
    /// Insert derived addresses. Re-exports of a known address are ignored.
    pub async fn store_addresses<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        rows: &[AddressRow],
    ) -> Result<(), DbError> {
        let table = tenant_table("address", business_uid);
        for row in rows {
            let sql = format!(
                "INSERT INTO {} (guid, address, address_type, public_key, timestamp) \
                 VALUES ($1, $2, $3, $4, $5) ON CONFLICT (address) DO NOTHING",
                table
            );
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [
                    row.guid.into(),
                    row.address.clone().into(),
                    row.address_type.as_i16().into(),
                    row.public_key.clone().into(),
                    (row.timestamp as i64).into(),
                ],
            ))
            .await?;
        }
        Ok(())
    }

    /// Ownership class of an address within this tenant's book, if any
    pub async fn address_exist<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        address: &str,
    ) -> Result<Option<AddressType>, DbError> {
        let sql = format!(
            "SELECT address_type FROM {} WHERE address = $1",
            tenant_table("address", business_uid)
        );
        let row = conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [address.into()],
            ))
            .await?;

        match row {
            Some(row) => {
                let address_type: i16 = row
                    .try_get("", "address_type")
                    .map_err(|e| DbError::QueryError(e.to_string()))?;
                Ok(Some(AddressType::from_i16(address_type)))
            }
            None => Ok(None),
        }
    }

    /// The tenant's hot wallet (address_type = 1)
    pub async fn query_hot_wallet_info<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
    ) -> Result<AddressRow, DbError> {
        Self::query_wallet(conn, business_uid, AddressType::Hot).await
    }

    /// The tenant's cold wallet (address_type = 2)
    pub async fn query_cold_wallet_info<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
    ) -> Result<AddressRow, DbError> {
        Self::query_wallet(conn, business_uid, AddressType::Cold).await
    }

    async fn query_wallet<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        wallet_type: AddressType,
    ) -> Result<AddressRow, DbError> {
        let sql = format!(
            "SELECT guid, address, address_type, public_key, timestamp FROM {} WHERE address_type = $1",
            tenant_table("address", business_uid)
        );
        let row = conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [wallet_type.as_i16().into()],
            ))
            .await?
            .ok_or_else(|| {
                DbError::NotFound(format!(
                    "tenant {} has no wallet of type {}",
                    business_uid,
                    wallet_type.as_i16()
                ))
            })?;

        Self::row_to_address(&row)
    }

    fn row_to_address(row: &sea_orm::QueryResult) -> Result<AddressRow, DbError> {
        let map_err = |e: sea_orm::DbErr| DbError::QueryError(e.to_string());
        Ok(AddressRow {
            guid: row.try_get("", "guid").map_err(map_err)?,
            address: row.try_get("", "address").map_err(map_err)?,
            address_type: AddressType::from_i16(
                row.try_get::<i16>("", "address_type").map_err(map_err)?,
            ),
            public_key: row.try_get("", "public_key").map_err(map_err)?,
            timestamp: row.try_get::<i64>("", "timestamp").map_err(map_err)? as u64,
        })
    }
}
