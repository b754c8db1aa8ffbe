use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::models::BlockHeader;
use crate::infrastructure::persistence::entities::blocks;
use crate::infrastructure::persistence::error::DbError;

/// Repository for the global canonical header chain
pub struct BlocksRepository;

impl BlocksRepository {
    /// Append headers. Replayed heights are ignored through the hash
    /// primary key, keeping the producer idempotent across retries.
    pub async fn store_blocks<C: ConnectionTrait>(
        conn: &C,
        headers: &[BlockHeader],
    ) -> Result<(), DbError> {
        if headers.is_empty() {
            return Ok(());
        }

        let models: Vec<blocks::ActiveModel> = headers
            .iter()
            .map(|h| blocks::ActiveModel {
                hash: Set(h.hash.clone()),
                prev_hash: Set(h.prev_hash.clone()),
                number: Set(h.number as i64),
                timestamp: Set(h.timestamp as i64),
            })
            .collect();

        let insert = blocks::Entity::insert_many(models).on_conflict(
            OnConflict::column(blocks::Column::Hash)
                .do_nothing()
                .to_owned(),
        );
        match insert.exec(conn).await {
            // The whole range was a replay; nothing new to insert
            Err(sea_orm::DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(e.into()),
            Ok(_) => Ok(()),
        }
    }

    /// Highest stored header, if any
    pub async fn latest_block<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Option<BlockHeader>, DbError> {
        let row = blocks::Entity::find()
            .order_by_desc(blocks::Column::Number)
            .one(conn)
            .await?;
        Ok(row.map(Self::to_header))
    }

    /// Stored header at an exact height
    pub async fn query_block_by_number<C: ConnectionTrait>(
        conn: &C,
        number: u64,
    ) -> Result<Option<BlockHeader>, DbError> {
        let row = blocks::Entity::find()
            .filter(blocks::Column::Number.eq(number as i64))
            .one(conn)
            .await?;
        Ok(row.map(Self::to_header))
    }

    /// Drop every header above `number` (reorg truncation)
    pub async fn truncate_above<C: ConnectionTrait>(conn: &C, number: u64) -> Result<u64, DbError> {
        let res = blocks::Entity::delete_many()
            .filter(blocks::Column::Number.gt(number as i64))
            .exec(conn)
            .await?;
        Ok(res.rows_affected)
    }

    fn to_header(model: blocks::Model) -> BlockHeader {
        BlockHeader {
            hash: model.hash,
            prev_hash: model.prev_hash,
            number: model.number as u64,
            timestamp: model.timestamp as u64,
        }
    }
}
