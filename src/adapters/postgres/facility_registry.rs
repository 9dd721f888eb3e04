use crate::domain::{Availability, Facility, FacilityId, FacilityKind, FacilitySpec};
use crate::ports::facility_registry::{FacilityRegistry as FacilityRegistryTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

/// PostgreSQLの行データをFacilityに変換する
fn map_row_to_facility(row: &PgRow) -> Result<Facility> {
    let capacity_i32: i32 = row.get("capacity");
    let capacity = u32::try_from(capacity_i32)
        .map_err(|_| invalid_data(format!("capacity out of range: {}", capacity_i32)))?;

    let kind_str: &str = row.get("kind");
    let kind = FacilityKind::from_str(kind_str).map_err(invalid_data)?;

    let availability_str: &str = row.get("availability");
    let availability = Availability::from_str(availability_str).map_err(invalid_data)?;

    Ok(Facility {
        facility_id: FacilityId::new(row.get("id")),
        name: row.get("name"),
        kind,
        capacity,
        hourly_rate: row.get("hourly_rate"),
        availability,
    })
}

/// FacilityRegistryのPostgreSQL実装
pub struct FacilityRegistry {
    pool: PgPool,
}

impl FacilityRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FacilityRegistryTrait for FacilityRegistry {
    async fn list(&self) -> Result<Vec<Facility>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, kind, capacity, hourly_rate, availability
            FROM facilities
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_facility).collect()
    }

    async fn get(&self, facility_id: FacilityId) -> Result<Option<Facility>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, kind, capacity, hourly_rate, availability
            FROM facilities
            WHERE id = $1
            "#,
        )
        .bind(facility_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_facility).transpose()
    }

    /// IDはBIGSERIALで採番する
    async fn insert(&self, spec: FacilitySpec) -> Result<Facility> {
        let capacity = i32::try_from(spec.capacity)
            .map_err(|_| invalid_data(format!("capacity out of range: {}", spec.capacity)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO facilities (name, kind, capacity, hourly_rate, availability)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&spec.name)
        .bind(spec.kind.as_str())
        .bind(capacity)
        .bind(spec.hourly_rate)
        .bind(Availability::Available.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Facility::from_spec(FacilityId::new(row.get("id")), spec))
    }

    async fn save(&self, facility: &Facility) -> Result<bool> {
        let capacity = i32::try_from(facility.capacity)
            .map_err(|_| invalid_data(format!("capacity out of range: {}", facility.capacity)))?;

        let result = sqlx::query(
            r#"
            UPDATE facilities
            SET name = $2, kind = $3, capacity = $4, hourly_rate = $5, availability = $6
            WHERE id = $1
            "#,
        )
        .bind(facility.facility_id.value())
        .bind(&facility.name)
        .bind(facility.kind.as_str())
        .bind(capacity)
        .bind(facility.hourly_rate)
        .bind(facility.availability.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 予約停止日は外部キーのON DELETE CASCADEで削除される
    async fn delete(&self, facility_id: FacilityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM facilities WHERE id = $1")
            .bind(facility_id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
