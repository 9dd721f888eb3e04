use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Availability, FacilityId, FacilityKind, FacilitySpecError};

/// 施設の登録・更新内容
///
/// IDと稼働状態を除いた、管理者が指定する属性。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilitySpec {
    pub name: String,
    pub kind: FacilityKind,
    pub capacity: u32,
    /// 1時間あたりの料金（最小通貨単位）
    pub hourly_rate: i64,
}

impl FacilitySpec {
    /// 施設属性のバリデーション
    ///
    /// ビジネスルール：
    /// - 名前は空白以外を含むこと
    /// - 定員は1以上
    /// - 料金は0以上（無料施設あり）
    pub fn validate(&self) -> Result<(), FacilitySpecError> {
        if self.name.trim().is_empty() {
            return Err(FacilitySpecError::EmptyName);
        }
        if self.capacity == 0 {
            return Err(FacilitySpecError::ZeroCapacity);
        }
        if self.hourly_rate < 0 {
            return Err(FacilitySpecError::NegativeRate);
        }
        Ok(())
    }
}

/// 施設 - 予約可能な共用設備
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub facility_id: FacilityId,
    pub name: String,
    pub kind: FacilityKind,
    pub capacity: u32,
    pub hourly_rate: i64,
    pub availability: Availability,
}

impl Facility {
    /// 新規登録された施設は予約受付中で始まる
    pub fn from_spec(facility_id: FacilityId, spec: FacilitySpec) -> Self {
        Self {
            facility_id,
            name: spec.name,
            kind: spec.kind,
            capacity: spec.capacity,
            hourly_rate: spec.hourly_rate,
            availability: Availability::Available,
        }
    }

    /// 属性を差し替える。稼働状態は切り替え操作でのみ変わるので保持する。
    pub fn apply_spec(self, spec: FacilitySpec) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            capacity: spec.capacity,
            hourly_rate: spec.hourly_rate,
            ..self
        }
    }

    pub fn toggle_availability(self) -> Self {
        Self {
            availability: self.availability.toggled(),
            ..self
        }
    }

    pub fn is_under_maintenance(&self) -> bool {
        self.availability == Availability::Maintenance
    }
}

/// 予約停止日 - 施設ごとの終日受付停止
///
/// 予約とは独立しており、登録しても既存の予約には影響しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDate {
    pub facility_id: FacilityId,
    pub date: NaiveDate,
    pub reason: String,
}
