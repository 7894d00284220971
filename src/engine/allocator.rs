// ==========================================
// 机台排产系统 - 产能约束批次分配引擎
// ==========================================
// 规则:
// - 视野 = 当天 + max_shift_days 个后续工作日 (共 H+1 天)
// - 批次按优先级降序一次性稳定排序（同优先级保持首次出现顺序）
// - 外层按日、内层按批次：当天产能先由高优先级批次耗尽
// - 视野结束仍有剩余的批次记为缺口，不是错误
// 红线: 任意 (日, 机台) 台账总量不超过日产能
// 红线: 批次初始量 = 已分配量 + 最终剩余量
// ==========================================
// 输入: 批次集合 + 排产上下文
// 输出: 机台日台账 + 需求行按日分配 + 缺口 + 事件
// ==========================================

use crate::domain::demand::{Batch, BatchSet};
use crate::domain::plan::{
    FreeCapacityTable, LineAssignments, LineShortage, MachineSchedule, Shortage,
};
use crate::domain::types::AllocationKey;
use crate::engine::candidate_resolver::CandidateResolver;
use crate::engine::events::{PlanningEvent, PlanningEventLog};
use crate::engine::registry::PlanningContext;
use std::cmp::Reverse;
use tracing::{debug, info, instrument};

// ==========================================
// AllocationOutcome - 分配结果
// ==========================================
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub batches: BatchSet, // 需求行 remaining 已更新
    pub schedule: MachineSchedule,
    pub assignments: LineAssignments,
    pub free: FreeCapacityTable,
    pub shortages: Vec<Shortage>,
    pub events: PlanningEventLog,
}

// ==========================================
// AllocationEngine - 贪心分配引擎
// ==========================================
pub struct AllocationEngine<'a> {
    context: &'a PlanningContext,
    max_shift_days: usize,
}

impl<'a> AllocationEngine<'a> {
    /// # 参数
    /// - `context`: 只读排产上下文（机台 + 路由）
    /// - `max_shift_days`: 允许顺延的工作日数 H
    pub fn new(context: &'a PlanningContext, max_shift_days: usize) -> Self {
        Self {
            context,
            max_shift_days,
        }
    }

    /// 视野天数 H+1
    pub fn horizon_days(&self) -> usize {
        self.max_shift_days + 1
    }

    /// 初始化剩余产能表（仅启用机台）
    fn init_free_capacity(&self) -> FreeCapacityTable {
        let mut free = FreeCapacityTable::new();
        for day in 0..self.horizon_days() {
            for machine in self.context.registry.active_machines() {
                free.set(day, &machine.machine_id, machine.daily_capacity);
            }
        }
        free
    }

    /// 执行分配
    #[instrument(skip(self, batches), fields(
        batches_count = batches.len(),
        horizon_days = self.horizon_days()
    ))]
    pub fn allocate(&self, mut batches: BatchSet) -> AllocationOutcome {
        let resolver = CandidateResolver::new(self.context);
        let mut free = self.init_free_capacity();
        let mut schedule = MachineSchedule::new();
        let mut assignments = LineAssignments::new();
        let mut events = PlanningEventLog::new();

        // 批次处理顺序：优先级降序，稳定排序
        let mut order: Vec<usize> = (0..batches.len()).collect();
        order.sort_by_key(|&pos| Reverse(batches.batches()[pos].priority()));

        for day in 0..self.horizon_days() {
            for &pos in &order {
                let Some(batch) = batches.batch_mut(pos) else {
                    continue;
                };
                if batch.remaining() == 0 {
                    continue;
                }

                let candidates = resolver.resolve(batch.key());
                if candidates.is_empty() {
                    events.record(PlanningEvent::NoEligibleMachine {
                        day,
                        batch_key: batch.key().clone(),
                    });
                    continue;
                }

                let mut remaining = batch.remaining();
                for machine in candidates {
                    let take = free.get(day, &machine.machine_id).min(remaining);
                    if take == 0 {
                        continue;
                    }

                    let real_take = Self::distribute(
                        batch,
                        take,
                        day,
                        &machine.machine_id,
                        &mut schedule,
                        &mut assignments,
                    );
                    free.consume(day, &machine.machine_id, real_take);
                    remaining -= real_take;

                    debug!(
                        day,
                        machine_id = %machine.machine_id,
                        batch = %batch.key(),
                        qty = real_take,
                        "批次分配到机台"
                    );

                    if remaining == 0 {
                        break;
                    }
                }
            }
        }

        let shortages = Self::collect_shortages(&batches, &mut events);
        info!(
            allocated = schedule.total(),
            shortages = shortages.len(),
            "批次分配完成"
        );

        AllocationOutcome {
            batches,
            schedule,
            assignments,
            free,
            shortages,
            events,
        }
    }

    /// 将 take 按插入顺序分摊到批次需求行，返回实际消耗量
    fn distribute(
        batch: &mut Batch,
        take: u64,
        day: usize,
        machine_id: &str,
        schedule: &mut MachineSchedule,
        assignments: &mut LineAssignments,
    ) -> u64 {
        let batch_key = batch.key().clone();
        let mut still_needed = take;
        let mut consumed_total = 0;

        for line in batch.lines_mut() {
            if still_needed == 0 {
                break;
            }
            let consumed = line.consume(still_needed);
            if consumed == 0 {
                continue;
            }
            still_needed -= consumed;
            consumed_total += consumed;

            assignments.add(line.index(), day, consumed);
            schedule.add(
                day,
                machine_id,
                AllocationKey::new(batch_key.clone(), line.brand()),
                consumed,
            );
        }
        consumed_total
    }

    fn collect_shortages(batches: &BatchSet, events: &mut PlanningEventLog) -> Vec<Shortage> {
        let mut shortages = Vec::new();
        for batch in batches.batches() {
            let remaining = batch.remaining();
            if remaining == 0 {
                continue;
            }
            events.record(PlanningEvent::Shortage {
                batch_key: batch.key().clone(),
                remaining,
            });
            shortages.push(Shortage {
                product_class: batch.key().clone(),
                remaining,
                lines: batch
                    .lines()
                    .iter()
                    .filter(|l| l.remaining() > 0)
                    .map(|l| LineShortage {
                        line_index: l.index(),
                        brand: l.brand().to_string(),
                        remaining: l.remaining(),
                    })
                    .collect(),
            });
        }
        shortages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::demand::DemandRecord;
    use crate::domain::machine::Machine;
    use crate::engine::batch_builder::BatchBuilder;
    use crate::engine::registry::{MachineRegistry, RoutingTable};

    fn context(machines: Vec<Machine>) -> PlanningContext {
        PlanningContext::new(MachineRegistry::from_machines(machines), RoutingTable::empty())
    }

    fn machine(id: &str, cap: u64) -> Machine {
        Machine::new(id, id, Vec::<String>::new(), Vec::<String>::new(), cap, 1, true)
    }

    fn record(index: usize, brand: &str, formula: &str, qty: u64, priority: i32) -> DemandRecord {
        DemandRecord {
            index,
            brand: brand.to_string(),
            product_type: "ПП".to_string(),
            category: "Соевый соус".to_string(),
            formula: formula.to_string(),
            required_qty: qty,
            priority,
        }
    }

    #[test]
    fn test_single_batch_spills_over_horizon() {
        let ctx = context(vec![machine("m1", 50)]);
        let batches = BatchBuilder::build(&[record(0, "A", "F1", 120, 0)]).unwrap();
        let outcome = AllocationEngine::new(&ctx, 2).allocate(batches);

        assert_eq!(outcome.assignments.get(0, 0), 50);
        assert_eq!(outcome.assignments.get(0, 1), 50);
        assert_eq!(outcome.assignments.get(0, 2), 20);
        assert_eq!(outcome.batches.total_remaining(), 0);
        assert!(outcome.shortages.is_empty());
    }

    #[test]
    fn test_shortage_reported_not_raised() {
        let ctx = context(vec![machine("m1", 10)]);
        let batches = BatchBuilder::build(&[record(0, "A", "F1", 45, 0)]).unwrap();
        let outcome = AllocationEngine::new(&ctx, 2).allocate(batches);

        assert_eq!(outcome.shortages.len(), 1);
        assert_eq!(outcome.shortages[0].remaining, 15);
        assert_eq!(outcome.shortages[0].lines[0].brand, "A");
        assert_eq!(outcome.events.count("Shortage"), 1);
    }

    #[test]
    fn test_no_eligible_machine_recorded_each_day() {
        let restricted = Machine::new("m1", "m1", vec!["Имбирь"], Vec::<String>::new(), 100, 1, true);
        let ctx = context(vec![restricted]);
        let batches = BatchBuilder::build(&[record(0, "A", "F1", 10, 0)]).unwrap();
        let outcome = AllocationEngine::new(&ctx, 2).allocate(batches);

        assert_eq!(outcome.events.count("NoEligibleMachine"), 3);
        assert_eq!(outcome.schedule.total(), 0);
        assert_eq!(outcome.shortages[0].remaining, 10);
    }

    #[test]
    fn test_inactive_machine_has_no_capacity() {
        let inactive = Machine::new("m1", "m1", Vec::<String>::new(), Vec::<String>::new(), 100, 1, false);
        let ctx = context(vec![inactive]);
        let outcome = AllocationEngine::new(&ctx, 0).allocate(BatchBuilder::build(&[record(0, "A", "F1", 10, 0)]).unwrap());
        assert_eq!(outcome.free.get(0, "m1"), 0);
        assert_eq!(outcome.schedule.total(), 0);
    }
}
