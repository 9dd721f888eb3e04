use crate::domain::{
    ApprovalStatus, Availability, Booking, BookingDetails, BookingId, BookingKey, BookingKind,
    DurationHours, FacilityId, NewBooking, TimeSlot, UnavailableReason, UserId,
};
use crate::ports::booking_ledger::{BookingLedger as BookingLedgerTrait, Result, ReserveOutcome};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::{invalid_data, slot_lock_key};

/// 予約種別ごとのテーブル名と種別固有の列
fn table_of(kind: BookingKind) -> (&'static str, &'static str) {
    match kind {
        BookingKind::Sport => ("sport_bookings", "court_number"),
        BookingKind::Event => ("event_bookings", "venue_id"),
    }
}

const KINDS: [BookingKind; 2] = [BookingKind::Sport, BookingKind::Event];

fn select_columns(kind: BookingKind) -> String {
    let (table, detail) = table_of(kind);
    format!(
        "SELECT id, facility_id, requester_id, booking_date, start_time, duration_hours, \
         status, {detail}, created_at, updated_at FROM {table}"
    )
}

/// PostgreSQLの行データをBookingに変換する
///
/// 利用時間と利用枠はドメインの検証を通して復元する。
fn map_row_to_booking(kind: BookingKind, row: &PgRow) -> Result<Booking> {
    let duration_i32: i32 = row.get("duration_hours");
    let duration = DurationHours::try_from(i64::from(duration_i32))
        .map_err(|e| invalid_data(format!("duration_hours {}: {:?}", duration_i32, e)))?;

    let slot = TimeSlot::new(row.get("booking_date"), row.get("start_time"), duration)
        .map_err(|e| invalid_data(format!("stored slot is invalid: {:?}", e)))?;

    let status_str: &str = row.get("status");
    let status = ApprovalStatus::from_str(status_str).map_err(invalid_data)?;

    let details = match kind {
        BookingKind::Sport => {
            let court_i32: i32 = row.get("court_number");
            let court_number = u32::try_from(court_i32)
                .map_err(|_| invalid_data(format!("court_number out of range: {}", court_i32)))?;
            BookingDetails::Sport { court_number }
        }
        BookingKind::Event => BookingDetails::Event {
            venue_id: row.get("venue_id"),
        },
    };

    Ok(Booking {
        booking_id: BookingId::new(row.get("id")),
        facility_id: FacilityId::new(row.get("facility_id")),
        requester_id: UserId::from_uuid(row.get("requester_id")),
        slot,
        status,
        details,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// BookingLedgerのPostgreSQL実装
///
/// スポーツ予約とホール予約を別テーブルに保存し、IDはテーブルごとに採番する。
pub struct BookingLedger {
    pool: PgPool,
}

impl BookingLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 両テーブルから条件に合う予約を集める
    async fn collect_bookings(&self, requester_id: Option<UserId>) -> Result<Vec<Booking>> {
        let mut bookings = Vec::new();
        for kind in KINDS {
            let sql = format!(
                "{} WHERE $1::UUID IS NULL OR requester_id = $1",
                select_columns(kind)
            );
            let rows = sqlx::query(&sql)
                .bind(requester_id.map(|id| id.value()))
                .fetch_all(&self.pool)
                .await?;
            for row in &rows {
                bookings.push(map_row_to_booking(kind, row)?);
            }
        }
        Ok(bookings)
    }
}

#[async_trait]
impl BookingLedgerTrait for BookingLedger {
    /// 予約枠を不可分に確保する
    ///
    /// 1つのトランザクション内で (施設, 日付) のアドバイザリロックを取り、
    /// 施設行を`FOR SHARE`で読んで稼働状態を、続けて予約停止日と
    /// 両テーブルの重なりを確認してから挿入する。ロックはコミットで解放される。
    /// 稼働状態の切り替えは施設行の更新、予約停止日の登録は同じアドバイザリ
    /// ロックで待たされるため、他プロセスの書き込みとも直列化される。
    async fn reserve(&self, booking: NewBooking) -> Result<ReserveOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(slot_lock_key(booking.facility_id, booking.slot.date))
            .execute(&mut *tx)
            .await?;

        let facility = sqlx::query("SELECT availability FROM facilities WHERE id = $1 FOR SHARE")
            .bind(booking.facility_id.value())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                invalid_data(format!("facility {} does not exist", booking.facility_id))
            })?;
        let availability_str: &str = facility.get("availability");
        let availability = Availability::from_str(availability_str).map_err(invalid_data)?;
        if availability == Availability::Maintenance {
            tx.rollback().await?;
            return Ok(ReserveOutcome::Refused(UnavailableReason::Maintenance));
        }

        let blocked = sqlx::query(
            "SELECT 1 AS blocked FROM blocked_dates WHERE facility_id = $1 AND blocked_on = $2",
        )
        .bind(booking.facility_id.value())
        .bind(booking.slot.date)
        .fetch_optional(&mut *tx)
        .await?;
        if blocked.is_some() {
            tx.rollback().await?;
            return Ok(ReserveOutcome::Refused(UnavailableReason::BlockedDate));
        }

        // 半開区間の重なり: existing.start < new.end AND new.start < existing.end
        let span = booking.slot.span();
        let mut conflicts = Vec::new();
        for kind in KINDS {
            let (table, _) = table_of(kind);
            let sql = format!(
                r#"
                SELECT id
                FROM {table}
                WHERE facility_id = $1
                  AND booking_date = $2
                  AND status IN ('pending', 'approved')
                  AND EXTRACT(EPOCH FROM start_time) < $4
                  AND $3 < EXTRACT(EPOCH FROM start_time) + duration_hours * 3600
                "#
            );
            let rows = sqlx::query(&sql)
                .bind(booking.facility_id.value())
                .bind(booking.slot.date)
                .bind(i64::from(span.start))
                .bind(i64::from(span.end))
                .fetch_all(&mut *tx)
                .await?;
            conflicts.extend(
                rows.iter()
                    .map(|row| BookingKey::new(kind, BookingId::new(row.get("id")))),
            );
        }

        if !conflicts.is_empty() {
            tx.rollback().await?;
            conflicts.sort();
            return Ok(ReserveOutcome::Clashed(conflicts));
        }

        let duration = i32::try_from(booking.slot.duration.value())
            .map_err(|_| invalid_data("duration_hours out of range".to_string()))?;
        let (table, detail_column) = table_of(booking.kind());

        let sql = format!(
            r#"
            INSERT INTO {table} (
                facility_id, requester_id, booking_date, start_time, duration_hours,
                status, {detail_column}, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#
        );
        let query = sqlx::query(&sql)
            .bind(booking.facility_id.value())
            .bind(booking.requester_id.value())
            .bind(booking.slot.date)
            .bind(booking.slot.start_time)
            .bind(duration)
            .bind(ApprovalStatus::Pending.as_str());
        let query = match booking.details {
            BookingDetails::Sport { court_number } => {
                let court = i32::try_from(court_number)
                    .map_err(|_| invalid_data(format!("court_number out of range: {}", court_number)))?;
                query.bind(court)
            }
            BookingDetails::Event { venue_id } => query.bind(venue_id),
        };
        let row = query
            .bind(booking.requested_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let booking_id = BookingId::new(row.get("id"));
        Ok(ReserveOutcome::Reserved(booking.into_booking(booking_id)))
    }

    async fn get(&self, key: BookingKey) -> Result<Option<Booking>> {
        let sql = format!("{} WHERE id = $1", select_columns(key.kind));
        let row = sqlx::query(&sql)
            .bind(key.id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref()
            .map(|row| map_row_to_booking(key.kind, row))
            .transpose()
    }

    async fn find_active(&self, facility_id: FacilityId, date: NaiveDate) -> Result<Vec<Booking>> {
        let mut bookings = Vec::new();
        for kind in KINDS {
            let sql = format!(
                "{} WHERE facility_id = $1 AND booking_date = $2 AND status IN ('pending', 'approved')",
                select_columns(kind)
            );
            let rows = sqlx::query(&sql)
                .bind(facility_id.value())
                .bind(date)
                .fetch_all(&self.pool)
                .await?;
            for row in &rows {
                bookings.push(map_row_to_booking(kind, row)?);
            }
        }
        Ok(bookings)
    }

    /// 比較交換：ステータスが`expected`のままの行だけを更新する
    async fn transition(&self, updated: &Booking, expected: ApprovalStatus) -> Result<bool> {
        let (table, _) = table_of(updated.kind());
        let sql = format!(
            "UPDATE {table} SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4"
        );
        let result = sqlx::query(&sql)
            .bind(updated.status.as_str())
            .bind(updated.updated_at)
            .bind(updated.booking_id.value())
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_all(&self) -> Result<Vec<Booking>> {
        self.collect_bookings(None).await
    }

    async fn list_by_requester(&self, requester_id: UserId) -> Result<Vec<Booking>> {
        self.collect_bookings(Some(requester_id)).await
    }

    async fn count_by_facility(&self, facility_id: FacilityId) -> Result<usize> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sport_bookings WHERE facility_id = $1)
                + (SELECT COUNT(*) FROM event_bookings WHERE facility_id = $1) AS total
            "#,
        )
        .bind(facility_id.value())
        .fetch_one(&self.pool)
        .await?;

        let total: i64 = row.get("total");
        usize::try_from(total).map_err(|_| invalid_data(format!("negative count: {}", total)))
    }
}
