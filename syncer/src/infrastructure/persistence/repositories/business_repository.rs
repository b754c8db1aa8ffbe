use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::infrastructure::persistence::entities::business;
use crate::infrastructure::persistence::error::DbError;

/// Repository for the global tenant registry
pub struct BusinessRepository;

impl BusinessRepository {
    /// Insert a tenant. The unique index on `business_uid` rejects
    /// duplicate registrations.
    pub async fn store_business<C: ConnectionTrait>(
        conn: &C,
        business_uid: &str,
        notify_url: &str,
        timestamp: u64,
    ) -> Result<(), DbError> {
        let model = business::ActiveModel {
            guid: Set(Uuid::new_v4()),
            business_uid: Set(business_uid.to_string()),
            notify_url: Set(notify_url.to_string()),
            timestamp: Set(timestamp as i64),
        };
        model.insert(conn).await?;
        Ok(())
    }

    /// All registered tenants, oldest first
    pub async fn query_business_list<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Vec<business::Model>, DbError> {
        let rows = business::Entity::find()
            .order_by_asc(business::Column::Timestamp)
            .all(conn)
            .await?;
        Ok(rows)
    }
}
