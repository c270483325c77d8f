//! IdGenerator port - ID 生成の抽象化
//!
//! スプレッドシートのように採番してくれるサーバーがないバックエンドで使う。
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（`TASK-01HZ...`）

use crate::domain::{CommentId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は衝突しにくい ID を生成
///
/// # ULID の特性
/// - 時刻でソート可能
/// - 複数セッションから同時に生成しても調整不要
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_comment_id(&self) -> CommentId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// Clock を使って ULID の時刻部分を決めるので、FixedClock で
/// タイムスタンプ部分を固定できる。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::with_prefix(self.next_ulid())
    }

    fn generate_comment_id(&self) -> CommentId {
        CommentId::with_prefix(self.next_ulid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_task_id();

        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("TASK-"));
        assert!(id_gen.generate_comment_id().as_str().starts_with("CMT-"));
    }

    #[test]
    fn ulid_generator_with_fixed_clock_shares_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_task_id();

        // ランダム部分があるので ID は異なるが、timestamp 部分は同じ
        assert_ne!(id1, id2);
        let ulid1: Ulid = id1.as_str()["TASK-".len()..].parse().unwrap();
        let ulid2: Ulid = id2.as_str()["TASK-".len()..].parse().unwrap();
        assert_eq!(ulid1.timestamp_ms(), ulid2.timestamp_ms());
        assert_eq!(ulid1.timestamp_ms(), fixed_time.timestamp_millis() as u64);
    }
}
