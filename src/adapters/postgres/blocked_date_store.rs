use crate::domain::{BlockedDate, FacilityId};
use crate::ports::blocked_date_store::{BlockedDateStore as BlockedDateStoreTrait, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::slot_lock_key;

fn map_row_to_blocked_date(row: &PgRow) -> BlockedDate {
    BlockedDate {
        facility_id: FacilityId::new(row.get("facility_id")),
        date: row.get("blocked_on"),
        reason: row.get("reason"),
    }
}

/// BlockedDateStoreのPostgreSQL実装
///
/// (facility_id, blocked_on) の主キーで重複登録を防ぐ。
pub struct BlockedDateStore {
    pool: PgPool,
}

impl BlockedDateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockedDateStoreTrait for BlockedDateStore {
    /// 同じ (施設, 日付) の予約確保とはアドバイザリロックで直列化する
    async fn add(&self, blocked_date: BlockedDate) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(slot_lock_key(blocked_date.facility_id, blocked_date.date))
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO blocked_dates (facility_id, blocked_on, reason)
            VALUES ($1, $2, $3)
            ON CONFLICT (facility_id, blocked_on) DO NOTHING
            "#,
        )
        .bind(blocked_date.facility_id.value())
        .bind(blocked_date.date)
        .bind(&blocked_date.reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(&self, facility_id: FacilityId) -> Result<Vec<BlockedDate>> {
        let rows = sqlx::query(
            r#"
            SELECT facility_id, blocked_on, reason
            FROM blocked_dates
            WHERE facility_id = $1
            ORDER BY blocked_on ASC
            "#,
        )
        .bind(facility_id.value())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(map_row_to_blocked_date).collect())
    }

    async fn find(&self, facility_id: FacilityId, date: NaiveDate) -> Result<Option<BlockedDate>> {
        let row = sqlx::query(
            r#"
            SELECT facility_id, blocked_on, reason
            FROM blocked_dates
            WHERE facility_id = $1 AND blocked_on = $2
            "#,
        )
        .bind(facility_id.value())
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_row_to_blocked_date))
    }

    async fn remove(&self, facility_id: FacilityId, date: NaiveDate) -> Result<bool> {
        let result = sqlx::query("DELETE FROM blocked_dates WHERE facility_id = $1 AND blocked_on = $2")
            .bind(facility_id.value())
            .bind(date)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove_all(&self, facility_id: FacilityId) -> Result<()> {
        sqlx::query("DELETE FROM blocked_dates WHERE facility_id = $1")
            .bind(facility_id.value())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
