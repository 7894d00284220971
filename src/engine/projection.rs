// ==========================================
// 机台排产系统 - 排产结果投影
// ==========================================
// 职责: (a) 需求行 × 日 数量表 (b) 台账展开行
// 红线: 只读投影，不修改任何状态
// ==========================================

use crate::domain::demand::BatchSet;
use crate::domain::plan::{LedgerRow, LineAssignments, LineProjectionRow, MachineSchedule};
use crate::engine::calendar::WorkingCalendar;
use crate::engine::registry::MachineRegistry;

pub struct PlanProjector<'a> {
    registry: &'a MachineRegistry,
    calendar: &'a WorkingCalendar,
    horizon_days: usize,
}

impl<'a> PlanProjector<'a> {
    pub fn new(registry: &'a MachineRegistry, calendar: &'a WorkingCalendar, horizon_days: usize) -> Self {
        Self {
            registry,
            calendar,
            horizon_days,
        }
    }

    /// 需求行投影（按需求行 index 升序，缺失日补 0）
    pub fn line_rows(&self, batches: &BatchSet, assignments: &LineAssignments) -> Vec<LineProjectionRow> {
        batches
            .lines_by_index()
            .into_iter()
            .map(|line| LineProjectionRow {
                line_index: line.index(),
                brand: line.brand().to_string(),
                product_class: line.product_class().clone(),
                required_qty: line.required_qty(),
                day_qty: (0..self.horizon_days)
                    .map(|day| assignments.get(line.index(), day))
                    .collect(),
                shortage: line.remaining(),
            })
            .collect()
    }

    /// 台账展开行（日 → 机台ID → 台账顺序，跳过数量为 0 的条目）
    pub fn ledger_rows(&self, schedule: &MachineSchedule) -> Vec<LedgerRow> {
        let mut rows = Vec::new();
        for (key, ledger) in schedule.iter() {
            let machine_name = self
                .registry
                .get(&key.machine_id)
                .map(|m| m.name.clone())
                .unwrap_or_else(|| key.machine_id.clone());
            for entry in ledger.entries().iter().filter(|e| e.qty > 0) {
                let class = &entry.key.batch_key;
                rows.push(LedgerRow {
                    day: key.day,
                    date: self.calendar.date(key.day),
                    machine_id: key.machine_id.clone(),
                    machine_name: machine_name.clone(),
                    product_type: class.product_type.clone(),
                    category: class.category.clone(),
                    formula: class.formula.clone(),
                    brand: entry.key.brand.clone(),
                    qty: entry.qty,
                });
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::machine::Machine;
    use crate::domain::types::{AllocationKey, ProductClass};
    use chrono::NaiveDate;

    #[test]
    fn test_ledger_rows_ordered_by_day_then_machine() {
        let registry = MachineRegistry::from_machines(vec![
            Machine::new("b_line", "Линия B", Vec::<String>::new(), Vec::<String>::new(), 100, 1, true),
            Machine::new("a_line", "Линия A", Vec::<String>::new(), Vec::<String>::new(), 100, 1, true),
        ]);
        // 2026-10-16 为周五
        let calendar = WorkingCalendar::build(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(), 3);
        let class = ProductClass::new("ПП", "Соевый соус", "F1");

        let mut schedule = MachineSchedule::new();
        schedule.add(1, "a_line", AllocationKey::new(class.clone(), "X"), 5);
        schedule.add(0, "b_line", AllocationKey::new(class.clone(), "Y"), 7);
        schedule.add(0, "a_line", AllocationKey::new(class.clone(), "Z"), 3);

        let rows = PlanProjector::new(&registry, &calendar, 3).ledger_rows(&schedule);
        let order: Vec<(usize, &str, &str)> = rows
            .iter()
            .map(|r| (r.day, r.machine_id.as_str(), r.brand.as_str()))
            .collect();
        assert_eq!(order, vec![(0, "a_line", "Z"), (0, "b_line", "Y"), (1, "a_line", "X")]);
        assert_eq!(rows[0].machine_name, "Линия A");
        assert_eq!(rows[2].date, NaiveDate::from_ymd_opt(2026, 10, 19));
    }
}
