use chrono::{DateTime, NaiveDate, Utc};

/// 時計ポート
///
/// 「今日」はコミュニティのタイムゾーンで決まるため、実装側が解釈する。
/// テストでは固定時刻の実装を注入する。
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// コミュニティのタイムゾーンでの今日の日付
    fn today(&self) -> NaiveDate;
}
