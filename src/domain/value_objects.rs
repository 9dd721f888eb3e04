use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 施設ID - 施設カタログの集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FacilityId(i64);

impl FacilityId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for FacilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 予約ID - 種別ごとの台帳内で一意な連番
///
/// 単体では種別を区別できないため、外部に出すときは必ず`BookingKey`を使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(i64);

impl BookingId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 居住者ID - 本人確認コンテキストへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 施設の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityKind {
    /// スポーツコート
    Sport,
    /// イベントホール
    Event,
}

impl FacilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacilityKind::Sport => "sport",
            FacilityKind::Event => "event",
        }
    }
}

impl FromStr for FacilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sport" => Ok(FacilityKind::Sport),
            "event" => Ok(FacilityKind::Event),
            _ => Err(format!("Invalid facility kind: {}", s)),
        }
    }
}

/// 予約の種別
///
/// 施設種別と1対1に対応する。予約キーの接頭辞（S/E）を決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Sport,
    Event,
}

impl BookingKind {
    /// この種別の予約を受け付ける施設種別
    pub fn facility_kind(&self) -> FacilityKind {
        match self {
            BookingKind::Sport => FacilityKind::Sport,
            BookingKind::Event => FacilityKind::Event,
        }
    }

    fn prefix(&self) -> char {
        match self {
            BookingKind::Sport => 'S',
            BookingKind::Event => 'E',
        }
    }
}

/// 予約キー - 種別と種別内IDの組
///
/// 統合ビューでレコードを一意に識別する。文字列表現（`S-12`, `E-7`）は
/// シリアライズ境界でのみ使い、業務ロジックでは常にこの型で扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookingKey {
    pub kind: BookingKind,
    pub id: BookingId,
}

impl BookingKey {
    pub fn new(kind: BookingKind, id: BookingId) -> Self {
        Self { kind, id }
    }

    pub fn sport(id: i64) -> Self {
        Self::new(BookingKind::Sport, BookingId::new(id))
    }

    pub fn event(id: i64) -> Self {
        Self::new(BookingKind::Event, BookingId::new(id))
    }
}

impl fmt::Display for BookingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.id.value())
    }
}

/// 予約キーのパースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBookingKeyError(pub String);

impl fmt::Display for ParseBookingKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid booking key: {}", self.0)
    }
}

impl std::error::Error for ParseBookingKeyError {}

impl FromStr for BookingKey {
    type Err = ParseBookingKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBookingKeyError(s.to_string());
        let (prefix, id) = s.split_once('-').ok_or_else(err)?;
        let kind = match prefix {
            "S" => BookingKind::Sport,
            "E" => BookingKind::Event,
            _ => return Err(err()),
        };
        let id: i64 = id.parse().map_err(|_| err())?;
        if id <= 0 {
            return Err(err());
        }
        Ok(Self::new(kind, BookingId::new(id)))
    }
}

impl Serialize for BookingKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BookingKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 利用時間エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// 0以下の時間は指定できない
    NotPositive,
    /// 表現できないほど長い
    TooLong,
}

/// 利用時間（時間単位）
///
/// 不変条件：1時間以上。
/// 型で制約を強制し、0や負の値を作成できないようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DurationHours(u32);

impl DurationHours {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for DurationHours {
    type Error = DurationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value <= 0 {
            return Err(DurationError::NotPositive);
        }
        // 日をまたぐかどうかはスロット側で検証する
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DurationError::TooLong)
    }
}

/// 施設の稼働状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// 予約受付中
    Available,
    /// メンテナンス中（新規予約不可）
    Maintenance,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Maintenance => "maintenance",
        }
    }

    /// Available と Maintenance を入れ替える
    pub fn toggled(self) -> Self {
        match self {
            Availability::Available => Availability::Maintenance,
            Availability::Maintenance => Availability::Available,
        }
    }
}

impl FromStr for Availability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Availability::Available),
            "maintenance" => Ok(Availability::Maintenance),
            _ => Err(format!("Invalid availability: {}", s)),
        }
    }
}

/// 承認ステータス
///
/// Pendingが初期状態、Approved/Rejectedは終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// 枠を占有している状態か（Pending または Approved）
    pub fn holds_slot(&self) -> bool {
        !matches!(self, ApprovalStatus::Rejected)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            _ => Err(format!("Invalid approval status: {}", s)),
        }
    }
}

/// 管理者の判断
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// 判断の結果として遷移する状態
    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        }
    }
}
