pub mod blocked_date_store;
pub mod booking_ledger;
pub mod facility_registry;

// パブリックに型を再エクスポート
pub use blocked_date_store::BlockedDateStore as PostgresBlockedDateStore;
pub use booking_ledger::BookingLedger as PostgresBookingLedger;
pub use facility_registry::FacilityRegistry as PostgresFacilityRegistry;

/// 行データの値がドメインの型に収まらない場合のエラー
fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// (施設, 日付) のアドバイザリロックのキー
///
/// 予約の確保と予約停止日の登録が同じキーで直列化される。
fn slot_lock_key(facility_id: crate::domain::FacilityId, date: chrono::NaiveDate) -> String {
    format!("{}:{}", facility_id, date)
}
