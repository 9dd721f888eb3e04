use chrono::NaiveDate;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::domain::FacilityId;

/// キーごとのロックを保持する表
///
/// 誰も保持していないエントリはガードの破棄時に取り除く。
#[derive(Debug)]
struct LockTable<K: Eq + Hash, L> {
    entries: DashMap<K, Arc<L>>,
}

impl<K: Eq + Hash, L> Default for LockTable<K, L> {
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy, L: Default> LockTable<K, L> {
    fn checkout(&self, key: K) -> Arc<L> {
        // DashMapのシャードロックはawaitの前に手放す
        self.entries.entry(key).or_default().value().clone()
    }

    /// 表以外に参照が残っていなければエントリを消す
    ///
    /// 判定と削除はシャードロックの中で行われるため、
    /// `checkout`直後の参照を取りこぼすことはない。
    fn release(&self, key: &K) {
        self.entries
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// 施設単位と (施設, 日付) 単位の排他ロック
///
/// - 施設ロック：予約申請と予約停止日の操作は共有で、施設の更新・削除・
///   稼働状態の切り替えは排他で取る。申請中の施設が消えたり種別や
///   稼働状態が変わったりしない。
/// - 枠ロック：予約停止日の確認・予約枠の確保・予約停止日の登録を
///   同じキーの上で直列化する。
///
/// 取得順序は必ず施設ロック → 枠ロック。
#[derive(Debug, Default)]
pub struct SlotLocks {
    facilities: LockTable<FacilityId, RwLock<()>>,
    slots: LockTable<(FacilityId, NaiveDate), Mutex<()>>,
}

enum FacilityLock {
    Shared { _guard: OwnedRwLockReadGuard<()> },
    Exclusive { _guard: OwnedRwLockWriteGuard<()> },
}

/// 施設ロックのガード。破棄すると解放される。
pub struct FacilityGuard<'a> {
    lock: Option<FacilityLock>,
    facility_id: FacilityId,
    locks: &'a SlotLocks,
}

impl Drop for FacilityGuard<'_> {
    fn drop(&mut self) {
        drop(self.lock.take());
        self.locks.facilities.release(&self.facility_id);
    }
}

/// 枠ロックのガード。破棄すると解放される。
pub struct SlotGuard<'a> {
    lock: Option<OwnedMutexGuard<()>>,
    key: (FacilityId, NaiveDate),
    locks: &'a SlotLocks,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        drop(self.lock.take());
        self.locks.slots.release(&self.key);
    }
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 施設ロックを共有で取得する
    pub async fn share_facility(&self, facility_id: FacilityId) -> FacilityGuard<'_> {
        let lock = self.facilities.checkout(facility_id).read_owned().await;
        FacilityGuard {
            lock: Some(FacilityLock::Shared { _guard: lock }),
            facility_id,
            locks: self,
        }
    }

    /// 施設ロックを排他で取得する
    pub async fn exclusive_facility(&self, facility_id: FacilityId) -> FacilityGuard<'_> {
        let lock = self.facilities.checkout(facility_id).write_owned().await;
        FacilityGuard {
            lock: Some(FacilityLock::Exclusive { _guard: lock }),
            facility_id,
            locks: self,
        }
    }

    /// (施設, 日付) の枠ロックを取得する
    pub async fn acquire(&self, facility_id: FacilityId, date: NaiveDate) -> SlotGuard<'_> {
        let key = (facility_id, date);
        let lock = self.slots.checkout(key).lock_owned().await;
        SlotGuard {
            lock: Some(lock),
            key,
            locks: self,
        }
    }

    /// 表に残っているロックの数（施設ロックと枠ロックの合計）
    pub fn tracked(&self) -> usize {
        self.facilities.len() + self.slots.len()
    }
}
