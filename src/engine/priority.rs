// ==========================================
// 机台排产系统 - 需求行优先级评分
// ==========================================
// 评分规则:
// - 库存低于最低库存 → +50
// - 发货日为空 → +10（视为每天都可能发货）
// - 否则：今天是发货日 → +100，明天是发货日 → +20
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

pub const CRITICAL_STOCK_BONUS: i32 = 50;
pub const NO_SHIPPING_DAYS_BONUS: i32 = 10;
pub const SHIPPING_TODAY_BONUS: i32 = 100;
pub const SHIPPING_TOMORROW_BONUS: i32 = 20;

/// 评分输入（单条需求行的库存与发货信息）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStockInfo {
    pub stock: Option<i64>,
    /// None = 数据源没有最低库存列
    pub min_stock: Option<i64>,
    pub shipping_days: String,
}

// ==========================================
// LinePriorityScorer - 优先级评分器
// ==========================================
pub struct LinePriorityScorer {
    today: Weekday,
}

impl LinePriorityScorer {
    pub fn new(plan_date: NaiveDate) -> Self {
        Self {
            today: plan_date.weekday(),
        }
    }

    pub fn score(&self, info: &LineStockInfo) -> i32 {
        let mut score = 0;

        let critical = info
            .min_stock
            .map(|min| info.stock.unwrap_or(0) < min)
            .unwrap_or(false);
        if critical {
            score += CRITICAL_STOCK_BONUS;
        }

        if info.shipping_days.trim().is_empty() {
            score += NO_SHIPPING_DAYS_BONUS;
        } else {
            let shipping = parse_shipping_days(&info.shipping_days);
            if shipping.contains(&self.today.num_days_from_monday()) {
                score += SHIPPING_TODAY_BONUS;
            }
            if shipping.contains(&self.today.succ().num_days_from_monday()) {
                score += SHIPPING_TOMORROW_BONUS;
            }
        }
        score
    }
}

/// 解析发货日（忽略大小写，按子串查找 Пн..Вс 与 Mon..Sun，不要求分隔符）
///
/// # 返回
/// 周一为 0 的星期序号集合，未出现任何星期名时为空
pub fn parse_shipping_days(raw: &str) -> BTreeSet<u32> {
    let lowered = raw.to_lowercase();
    WEEKDAY_NAMES
        .iter()
        .filter(|(_, names)| names.iter().any(|name| lowered.contains(name)))
        .map(|(weekday, _)| weekday.num_days_from_monday())
        .collect()
}

const WEEKDAY_NAMES: [(Weekday, [&str; 2]); 7] = [
    (Weekday::Mon, ["пн", "mon"]),
    (Weekday::Tue, ["вт", "tue"]),
    (Weekday::Wed, ["ср", "wed"]),
    (Weekday::Thu, ["чт", "thu"]),
    (Weekday::Fri, ["пт", "fri"]),
    (Weekday::Sat, ["сб", "sat"]),
    (Weekday::Sun, ["вс", "sun"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn info(stock: Option<i64>, min_stock: Option<i64>, shipping: &str) -> LineStockInfo {
        LineStockInfo {
            stock,
            min_stock,
            shipping_days: shipping.to_string(),
        }
    }

    #[test]
    fn test_empty_shipping_days_scores_ten() {
        let scorer = LinePriorityScorer::new(friday());
        assert_eq!(scorer.score(&info(None, None, "")), 10);
        assert_eq!(scorer.score(&info(Some(5), Some(10), "  ")), 60);
    }

    #[test]
    fn test_today_and_tomorrow_bonus() {
        let scorer = LinePriorityScorer::new(friday());
        assert_eq!(scorer.score(&info(None, None, "Пт")), 100);
        assert_eq!(scorer.score(&info(None, None, "Сб")), 20);
        assert_eq!(scorer.score(&info(None, None, "пт, сб")), 120);
        assert_eq!(scorer.score(&info(None, None, "Mon Tue")), 0);
    }

    #[test]
    fn test_critical_stock_requires_min_stock() {
        let scorer = LinePriorityScorer::new(friday());
        assert_eq!(scorer.score(&info(Some(0), None, "Пн")), 0);
        assert_eq!(scorer.score(&info(None, Some(1), "Пн")), 50);
        assert_eq!(scorer.score(&info(Some(3), Some(3), "Пн")), 0);
    }

    #[test]
    fn test_shipping_days_matched_without_separator() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let scorer = LinePriorityScorer::new(monday);
        assert_eq!(scorer.score(&info(None, None, "ПнСр")), 100);
        assert_eq!(scorer.score(&info(None, None, "Пн/Ср")), 100);
        assert_eq!(scorer.score(&info(None, None, "пнвт")), 120);
    }

    #[test]
    fn test_unrecognised_shipping_days_score_zero() {
        let scorer = LinePriorityScorer::new(friday());
        assert_eq!(scorer.score(&info(None, None, "xyz")), 0);
        assert_eq!(scorer.score(&info(Some(1), Some(5), "по заказу")), 50);
    }

    #[test]
    fn test_parse_shipping_days_ignores_unknown() {
        let days = parse_shipping_days("Пн, Ср; fri., xyz");
        assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![0, 2, 4]);
    }
}
