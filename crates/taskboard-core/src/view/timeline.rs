//! Timeline - ガントチャートのレイアウト計算
//!
//! タスク一覧（フィルタ前）から、共通の日付軸・月/日ヘッダー・
//! 各タスクのバー（開始オフセットと日数）・今日マーカーの位置を計算する。
//! I/O なしの純粋関数。同じ入力（と同じ today）からは常に同じ結果になる。
//!
//! # アルゴリズム
//! 1. タスクが空なら today を中心に前後 15 日（計 31 日）の窓
//! 2. それ以外は `min(start) - 2日` 〜 `max(due) + 2日`
//! 3. 軸上の日を月ラベルごとにまとめる（初出順）
//! 4. today が軸内なら today のオフセット、外なら None
//! 5. 各バー: offset = max(0, start - 軸開始)、duration = max(1, due - start + 1)

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::domain::{Task, TaskId};

/// 軸の前後に足す余白（日）
pub const PADDING_DAYS: i64 = 2;

/// タスクがないときの窓の片側（日）
pub const EMPTY_HALF_WINDOW_DAYS: i64 = 15;

/// 1 日分の列幅（px）
pub const DAY_WIDTH_PX: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayHeader {
    pub date: NaiveDate,
    /// 日（1〜31）
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthHeader {
    /// 例: "2024年1月"
    pub label: String,
    pub days: Vec<DayHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bar {
    pub task_id: TaskId,
    /// 軸開始からの日数
    pub offset: i64,
    /// 日数（常に 1 以上）
    pub duration: i64,
}

impl Bar {
    pub fn left_px(&self) -> i64 {
        self.offset * i64::from(DAY_WIDTH_PX)
    }

    pub fn width_px(&self) -> i64 {
        self.duration * i64::from(DAY_WIDTH_PX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineLayout {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_days: i64,
    pub months: Vec<MonthHeader>,
    pub today_offset: Option<i64>,
    /// 入力順
    pub bars: Vec<Bar>,
}

impl TimelineLayout {
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        let (start, end) = axis_bounds(tasks, today);
        let total_days = day_span(start, end) + 1;

        let today_offset = (start..=end)
            .contains(&today)
            .then(|| day_span(start, today));

        let bars = tasks
            .iter()
            .map(|task| Bar {
                task_id: task.id.clone(),
                offset: day_span(start, task.start_date).max(0),
                duration: (day_span(task.start_date, task.due_date) + 1).max(1),
            })
            .collect();

        Self {
            start,
            end,
            total_days,
            months: month_headers(start, end),
            today_offset,
            bars,
        }
    }

    pub fn bar_for(&self, task_id: &TaskId) -> Option<&Bar> {
        self.bars.iter().find(|bar| &bar.task_id == task_id)
    }

    pub fn width_px(&self) -> i64 {
        self.total_days * i64::from(DAY_WIDTH_PX)
    }
}

fn axis_bounds(tasks: &[Task], today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let min_start = tasks.iter().map(|task| task.start_date).min();
    let max_due = tasks.iter().map(|task| task.due_date).max();
    match (min_start, max_due) {
        (Some(min), Some(max)) => (
            min - Duration::days(PADDING_DAYS),
            max + Duration::days(PADDING_DAYS),
        ),
        _ => (
            today - Duration::days(EMPTY_HALF_WINDOW_DAYS),
            today + Duration::days(EMPTY_HALF_WINDOW_DAYS),
        ),
    }
}

/// `to - from` の日数（負もあり得る）
pub fn day_span(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

fn month_label(date: NaiveDate) -> String {
    format!("{}年{}月", date.year(), date.month())
}

fn month_headers(start: NaiveDate, end: NaiveDate) -> Vec<MonthHeader> {
    let mut months: Vec<MonthHeader> = Vec::new();
    for date in start.iter_days().take_while(|date| *date <= end) {
        let label = month_label(date);
        let day = DayHeader {
            date,
            day: date.day(),
        };
        match months.last_mut() {
            Some(month) if month.label == label => month.days.push(day),
            _ => months.push(MonthHeader {
                label,
                days: vec![day],
            }),
        }
    }
    months
}
