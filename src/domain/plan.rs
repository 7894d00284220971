// ==========================================
// 机台排产系统 - 排产台账领域模型
// ==========================================
// 职责: 机台日台账、剩余产能表、需求行分配表、缺口与投影行
// 红线: 台账条目插入顺序即均衡器扫描顺序，不得重排
// 红线: 任意 (日, 机台) 剩余产能不得为负
// ==========================================

use crate::domain::types::{AllocationKey, BatchKey, MachineDayKey, ProductClass};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// LedgerEntry / MachineDayLedger - 单机台单日台账
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub key: AllocationKey,
    pub qty: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDayLedger {
    entries: Vec<LedgerEntry>,
}

impl MachineDayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加分配量（已存在的分配键原位累加，新键追加到末尾）
    pub fn add(&mut self, key: AllocationKey, qty: u64) {
        if qty == 0 {
            return;
        }
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => entry.qty += qty,
            None => self.entries.push(LedgerEntry { key, qty }),
        }
    }

    /// 整条移除分配键，返回其数量
    pub fn remove(&mut self, key: &AllocationKey) -> Option<u64> {
        let pos = self.entries.iter().position(|e| &e.key == key)?;
        Some(self.entries.remove(pos).qty)
    }

    pub fn get(&self, key: &AllocationKey) -> u64 {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| e.qty)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.qty).sum()
    }

    /// 满足过滤条件的批次分配量之和
    pub fn filtered_total<F>(&self, mut filter: F) -> u64
    where
        F: FnMut(&BatchKey) -> bool,
    {
        self.entries
            .iter()
            .filter(|e| filter(&e.key.batch_key))
            .map(|e| e.qty)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ==========================================
// MachineSchedule - 全部机台日台账 (day, machine_id) → ledger
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSchedule {
    days: BTreeMap<MachineDayKey, MachineDayLedger>,
}

impl MachineSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, day: usize, machine_id: &str, key: AllocationKey, qty: u64) {
        if qty == 0 {
            return;
        }
        self.days
            .entry(MachineDayKey::new(day, machine_id))
            .or_default()
            .add(key, qty);
    }

    pub fn ledger(&self, day: usize, machine_id: &str) -> Option<&MachineDayLedger> {
        self.days.get(&MachineDayKey::new(day, machine_id))
    }

    /// 机台当日总负荷
    pub fn load(&self, day: usize, machine_id: &str) -> u64 {
        self.ledger(day, machine_id)
            .map(MachineDayLedger::total)
            .unwrap_or(0)
    }

    /// 将一条分配整体从 donor 挪到 receiver，返回挪动数量（不存在时为 0）
    pub fn move_entry(
        &mut self,
        day: usize,
        donor_id: &str,
        receiver_id: &str,
        key: &AllocationKey,
    ) -> u64 {
        let donor_key = MachineDayKey::new(day, donor_id);
        let qty = match self.days.get_mut(&donor_key).and_then(|l| l.remove(key)) {
            Some(qty) => qty,
            None => return 0,
        };
        if self.days.get(&donor_key).is_some_and(MachineDayLedger::is_empty) {
            self.days.remove(&donor_key);
        }
        self.add(day, receiver_id, key.clone(), qty);
        qty
    }

    /// 按 (day, machine_id) 升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&MachineDayKey, &MachineDayLedger)> {
        self.days.iter()
    }

    /// 指定日的所有机台台账
    pub fn day(&self, day: usize) -> impl Iterator<Item = (&MachineDayKey, &MachineDayLedger)> {
        self.days.iter().filter(move |(k, _)| k.day == day)
    }

    pub fn total(&self) -> u64 {
        self.days.values().map(MachineDayLedger::total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(MachineDayLedger::is_empty)
    }
}

// ==========================================
// FreeCapacityTable - 剩余产能表 (day, machine_id) → free
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeCapacityTable {
    free: BTreeMap<MachineDayKey, u64>,
}

impl FreeCapacityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, day: usize, machine_id: &str, capacity: u64) {
        self.free.insert(MachineDayKey::new(day, machine_id), capacity);
    }

    pub fn get(&self, day: usize, machine_id: &str) -> u64 {
        self.free
            .get(&MachineDayKey::new(day, machine_id))
            .copied()
            .unwrap_or(0)
    }

    /// 扣减剩余产能，扣减量超过剩余时截断为 0
    pub fn consume(&mut self, day: usize, machine_id: &str, qty: u64) {
        if let Some(free) = self.free.get_mut(&MachineDayKey::new(day, machine_id)) {
            *free = free.saturating_sub(qty);
        }
    }
}

// ==========================================
// LineAssignments - 需求行按日分配量 line_index → day → qty
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAssignments {
    by_line: BTreeMap<usize, BTreeMap<usize, u64>>,
}

impl LineAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, line_index: usize, day: usize, qty: u64) {
        if qty == 0 {
            return;
        }
        *self
            .by_line
            .entry(line_index)
            .or_default()
            .entry(day)
            .or_insert(0) += qty;
    }

    pub fn get(&self, line_index: usize, day: usize) -> u64 {
        self.by_line
            .get(&line_index)
            .and_then(|days| days.get(&day))
            .copied()
            .unwrap_or(0)
    }

    pub fn line_total(&self, line_index: usize) -> u64 {
        self.by_line
            .get(&line_index)
            .map(|days| days.values().sum())
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.by_line.values().flat_map(|d| d.values()).sum()
    }
}

// ==========================================
// Shortage - 视野内无法满足的批次缺口
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineShortage {
    pub line_index: usize,
    pub brand: String,
    pub remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub product_class: ProductClass,
    pub remaining: u64,
    pub lines: Vec<LineShortage>,
}

// ==========================================
// 投影行
// ==========================================

/// 需求行 × 日 投影（按需求行 index 升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProjectionRow {
    pub line_index: usize,
    pub brand: String,
    pub product_class: ProductClass,
    pub required_qty: u64,
    pub day_qty: Vec<u64>, // 长度 = 视野天数 H+1
    pub shortage: u64,
}

/// 台账展开行（按 日 → 机台ID → 台账顺序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub day: usize,
    pub date: Option<NaiveDate>,
    pub machine_id: String,
    pub machine_name: String,
    pub product_type: String,
    pub category: String,
    pub formula: String,
    pub brand: String,
    pub qty: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(formula: &str, brand: &str) -> AllocationKey {
        AllocationKey::new(ProductClass::new("ПП", "Соевый соус", formula), brand)
    }

    #[test]
    fn test_ledger_accumulates_in_place() {
        let mut ledger = MachineDayLedger::new();
        ledger.add(key("F1", "A"), 10);
        ledger.add(key("F2", "B"), 5);
        ledger.add(key("F1", "A"), 7);
        ledger.add(key("F3", "C"), 0);

        assert_eq!(ledger.entries().len(), 2);
        assert_eq!(ledger.entries()[0].qty, 17);
        assert_eq!(ledger.total(), 22);
    }

    #[test]
    fn test_move_entry_moves_whole_allocation() {
        let mut schedule = MachineSchedule::new();
        schedule.add(0, "m1", key("F1", "A"), 40);
        schedule.add(0, "m1", key("F1", "B"), 10);

        let moved = schedule.move_entry(0, "m1", "m2", &key("F1", "A"));
        assert_eq!(moved, 40);
        assert_eq!(schedule.load(0, "m1"), 10);
        assert_eq!(schedule.load(0, "m2"), 40);
        assert_eq!(schedule.total(), 50);

        // 不存在的分配键不产生移动
        assert_eq!(schedule.move_entry(0, "m1", "m2", &key("F9", "Z")), 0);
    }

    #[test]
    fn test_free_capacity_never_negative() {
        let mut free = FreeCapacityTable::new();
        free.set(0, "m1", 30);
        free.consume(0, "m1", 50);
        assert_eq!(free.get(0, "m1"), 0);
        assert_eq!(free.get(1, "m1"), 0);
    }

    #[test]
    fn test_line_assignments_totals() {
        let mut assignments = LineAssignments::new();
        assignments.add(0, 0, 30);
        assignments.add(0, 1, 10);
        assignments.add(1, 0, 5);
        assert_eq!(assignments.get(0, 1), 10);
        assert_eq!(assignments.get(1, 2), 0);
        assert_eq!(assignments.line_total(0), 40);
        assert_eq!(assignments.total(), 45);
    }
}
