use crate::domain::{
    ApprovalStatus, Booking, BookingKey, FacilityId, NewBooking, UnavailableReason, UserId,
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 予約確保の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Pendingとして保存された
    Reserved(Booking),
    /// 枠を占有している既存予約と重なったため保存しなかった
    Clashed(Vec<BookingKey>),
    /// 確保の時点で施設がメンテナンス中、または予約停止日だった
    ///
    /// 複数プロセスで台帳を共有する実装だけが返す。
    Refused(UnavailableReason),
}

/// 予約台帳ポート
///
/// スポーツ予約とホール予約を1つの抽象の裏で永続化する。
/// 種別ごとにIDを採番し、外部には`BookingKey`で識別させる。
#[async_trait]
pub trait BookingLedger: Send + Sync {
    /// 予約枠を確保する
    ///
    /// 同じ施設・同じ日付でPending/Approvedの予約との重なり確認と保存を
    /// 1つの不可分な操作として行う。重なりがあれば保存せず`Clashed`を返す。
    /// 並行して呼ばれても重なる予約が両方保存されることはない。
    async fn reserve(&self, booking: NewBooking) -> Result<ReserveOutcome>;

    /// キーで予約を取得する
    async fn get(&self, key: BookingKey) -> Result<Option<Booking>>;

    /// 施設・日付で枠を占有している予約（Pending/Approved）を取得する
    async fn find_active(&self, facility_id: FacilityId, date: NaiveDate) -> Result<Vec<Booking>>;

    /// 現在のステータスが`expected`の場合に限り、ステータスと更新日時を書き換える
    ///
    /// 同じ予約への並行更新を直列化するための比較交換。
    /// 書き換えた場合はtrue、ステータスが既に変わっていた場合はfalseを返す。
    async fn transition(&self, updated: &Booking, expected: ApprovalStatus) -> Result<bool>;

    /// 全予約を返す（順序は規定しない）
    async fn list_all(&self) -> Result<Vec<Booking>>;

    /// 申請者の全予約を返す（順序は規定しない）
    async fn list_by_requester(&self, requester_id: UserId) -> Result<Vec<Booking>>;

    /// 施設を参照している予約の件数（ステータスを問わない）
    async fn count_by_facility(&self, facility_id: FacilityId) -> Result<usize>;
}
