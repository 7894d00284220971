// ==========================================
// 机台排产系统 - 工作日历
// ==========================================
// 工作日 = 周一至周五，日索引 d 对应第 d 个工作日
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 默认工作日数量
pub const DEFAULT_HORIZON_WORKING_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingCalendar {
    working_days: Vec<NaiveDate>,
}

impl WorkingCalendar {
    /// 从 start 起（含）取 count 个连续工作日
    pub fn build(start: NaiveDate, count: usize) -> Self {
        let mut working_days = Vec::with_capacity(count);
        let mut date = start;
        while working_days.len() < count {
            if is_working_day(date) {
                working_days.push(date);
            }
            date += Duration::days(1);
        }
        Self { working_days }
    }

    /// 日索引对应的日期（超出日历返回 None）
    pub fn date(&self, day: usize) -> Option<NaiveDate> {
        self.working_days.get(day).copied()
    }

    pub fn working_days(&self) -> &[NaiveDate] {
        &self.working_days
    }

    pub fn len(&self) -> usize {
        self.working_days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working_days.is_empty()
    }
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_weekend() {
        // 2026-10-16 周五
        let friday = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let calendar = WorkingCalendar::build(friday, 3);
        assert_eq!(
            calendar.working_days(),
            &[
                friday,
                NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
                NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            ]
        );
        assert_eq!(calendar.date(3), None);
    }

    #[test]
    fn test_weekend_start_rolls_to_monday() {
        let saturday = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let calendar = WorkingCalendar::build(saturday, 1);
        assert_eq!(calendar.date(0), NaiveDate::from_ymd_opt(2026, 10, 19));
    }
}
