use crate::domain::{BlockedDate, FacilityId};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約停止日ストアポート
///
/// 施設ごとの終日受付停止日を保持する。予約台帳とは独立している。
#[async_trait]
pub trait BlockedDateStore: Send + Sync {
    /// 予約停止日を追加する
    ///
    /// 同じ施設・同じ日付が既に登録されている場合は何もせずfalseを返す。
    async fn add(&self, blocked_date: BlockedDate) -> Result<bool>;

    /// 施設の予約停止日を日付昇順で返す
    async fn list(&self, facility_id: FacilityId) -> Result<Vec<BlockedDate>>;

    /// 特定の日付の予約停止日を取得する
    ///
    /// スロット割り当ての判定に使用される。
    async fn find(
        &self,
        facility_id: FacilityId,
        date: NaiveDate,
    ) -> Result<Option<BlockedDate>>;

    /// 予約停止日を削除する
    ///
    /// 存在しない場合はfalseを返す。
    async fn remove(&self, facility_id: FacilityId, date: NaiveDate) -> Result<bool>;

    /// 施設の予約停止日をすべて削除する
    ///
    /// 施設削除時に呼ばれる。
    async fn remove_all(&self, facility_id: FacilityId) -> Result<()>;
}
