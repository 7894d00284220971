// ==========================================
// 机台排产系统 - 双机对称均衡器
// ==========================================
// 规则:
// - 仅对配置的双机规则生效，两台机优先级不同则不动作
// - 按日独立处理：只统计/挪动满足过滤条件的台账条目
// - desired_move = min(接收方剩余产能, (donor负荷 - receiver负荷) / 2)
// - 条目整条挪动，数量超过剩余额度的条目不挪
// 红线: 一个 (批次, 品牌) 分配永不拆分到两台机上
// 红线: 接收方剩余产能按当日总负荷计算，挪动后不超产能
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::plan::MachineSchedule;
use crate::domain::types::{AllocationKey, BatchKey};
use crate::engine::events::{BalanceSkipReason, PlanningEvent, PlanningEventLog};
use crate::engine::registry::PlanningContext;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

// ==========================================
// BalanceFilter - 参与均衡的批次过滤条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceFilter {
    /// 类型精确匹配（None/空 = 不限）
    #[serde(default)]
    pub product_type: Option<String>,
    /// 品类包含子串，忽略大小写（None/空 = 不限）
    #[serde(default)]
    pub category_contains: Option<String>,
}

impl BalanceFilter {
    pub fn matches(&self, key: &BatchKey) -> bool {
        if let Some(pt) = self.product_type.as_deref().map(str::trim) {
            if !pt.is_empty() && key.product_type != pt {
                return false;
            }
        }
        if let Some(needle) = self.category_contains.as_deref().map(str::trim) {
            if !needle.is_empty()
                && !key
                    .category
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

// ==========================================
// TwinBalanceRule - 双机均衡规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwinBalanceRule {
    pub machine_a: String,
    pub machine_b: String,
    #[serde(default)]
    pub filter: BalanceFilter,
}

impl TwinBalanceRule {
    pub fn new(machine_a: impl Into<String>, machine_b: impl Into<String>, filter: BalanceFilter) -> Self {
        Self {
            machine_a: machine_a.into(),
            machine_b: machine_b.into(),
            filter,
        }
    }

    /// 默认规则：两条酱油 ПП 灌装线
    pub fn soy_sauce_pp() -> Self {
        Self::new(
            "soy_pp_1",
            "soy_pp_2",
            BalanceFilter {
                product_type: Some("ПП".to_string()),
                category_contains: Some("соев".to_string()),
            },
        )
    }
}

// ==========================================
// SymmetricBalancer - 双机均衡器
// ==========================================
pub struct SymmetricBalancer<'a> {
    context: &'a PlanningContext,
    rules: &'a [TwinBalanceRule],
    horizon_days: usize,
}

/// 单日单向的均衡参数
struct DayMove<'m> {
    day: usize,
    donor: &'m Machine,
    receiver: &'m Machine,
    donor_load: u64,
    receiver_load: u64,
    desired_move: u64,
}

impl<'a> SymmetricBalancer<'a> {
    pub fn new(context: &'a PlanningContext, rules: &'a [TwinBalanceRule], horizon_days: usize) -> Self {
        Self {
            context,
            rules,
            horizon_days,
        }
    }

    /// 对台账执行均衡（原位修改），返回事件日志
    #[instrument(skip(self, schedule), fields(rules = self.rules.len(), horizon_days = self.horizon_days))]
    pub fn balance(&self, schedule: &mut MachineSchedule) -> PlanningEventLog {
        let mut events = PlanningEventLog::new();
        for rule in self.rules {
            self.balance_rule(rule, schedule, &mut events);
        }
        info!(
            moved = events.count("BalanceMoved"),
            skipped_days = events.count("BalanceDaySkipped"),
            "双机均衡完成"
        );
        events
    }

    fn balance_rule(&self, rule: &TwinBalanceRule, schedule: &mut MachineSchedule, events: &mut PlanningEventLog) {
        let registry = &self.context.registry;

        let mut twins = Vec::with_capacity(2);
        for id in [&rule.machine_a, &rule.machine_b] {
            match registry.get(id) {
                Some(m) if m.active => twins.push(m),
                Some(_) => events.record(PlanningEvent::BalancerTwinInactive {
                    machine_id: id.clone(),
                }),
                None => events.record(PlanningEvent::BalancerTwinMissing {
                    machine_id: id.clone(),
                }),
            }
        }
        let [a, b] = twins.as_slice() else {
            return;
        };

        // 优先级不同：首选机台应先排满，不做均衡
        if a.priority != b.priority {
            events.record(PlanningEvent::BalancerPriorityGuard {
                machine_a: a.machine_id.clone(),
                machine_b: b.machine_id.clone(),
                priority_a: a.priority,
                priority_b: b.priority,
            });
            return;
        }

        for day in 0..self.horizon_days {
            match self.plan_day(day, a, b, &rule.filter, schedule) {
                Ok(day_move) => self.apply_day(&day_move, &rule.filter, schedule, events),
                Err(reason) => events.record(PlanningEvent::BalanceDaySkipped {
                    day,
                    machine_a: a.machine_id.clone(),
                    machine_b: b.machine_id.clone(),
                    reason,
                }),
            }
        }
    }

    /// 计算单日挪动方向与额度
    fn plan_day<'m>(
        &self,
        day: usize,
        a: &'m Machine,
        b: &'m Machine,
        filter: &BalanceFilter,
        schedule: &MachineSchedule,
    ) -> Result<DayMove<'m>, BalanceSkipReason> {
        let filtered_load = |m: &Machine| {
            schedule
                .ledger(day, &m.machine_id)
                .map(|l| l.filtered_total(|k| filter.matches(k)))
                .unwrap_or(0)
        };
        let load_a = filtered_load(a);
        let load_b = filtered_load(b);

        if load_a == 0 && load_b == 0 {
            return Err(BalanceSkipReason::NoLoad);
        }
        if load_a.abs_diff(load_b) <= 1 {
            return Err(BalanceSkipReason::AlreadyBalanced);
        }

        let free_a = a.daily_capacity.saturating_sub(schedule.load(day, &a.machine_id));
        let free_b = b.daily_capacity.saturating_sub(schedule.load(day, &b.machine_id));
        if free_a == 0 && free_b == 0 {
            return Err(BalanceSkipReason::NoFreeCapacity);
        }

        let (donor, receiver, donor_load, receiver_load, receiver_free) = if load_a > load_b {
            (a, b, load_a, load_b, free_b)
        } else {
            (b, a, load_b, load_a, free_a)
        };
        let desired_move = receiver_free.min((donor_load - receiver_load) / 2);
        if desired_move == 0 {
            return Err(BalanceSkipReason::ZeroDesiredMove);
        }

        Ok(DayMove {
            day,
            donor,
            receiver,
            donor_load,
            receiver_load,
            desired_move,
        })
    }

    /// 按台账顺序整条挪动，额度用尽即停
    fn apply_day(
        &self,
        day_move: &DayMove<'_>,
        filter: &BalanceFilter,
        schedule: &mut MachineSchedule,
        events: &mut PlanningEventLog,
    ) {
        let DayMove { day, donor, receiver, .. } = *day_move;

        // 先快照 donor 条目，挪动过程中台账会变化
        let entries: Vec<(AllocationKey, u64)> = schedule
            .ledger(day, &donor.machine_id)
            .map(|l| {
                l.entries()
                    .iter()
                    .filter(|e| filter.matches(&e.key.batch_key) && receiver.admits(&e.key.batch_key))
                    .map(|e| (e.key.clone(), e.qty))
                    .collect()
            })
            .unwrap_or_default();

        let mut budget = day_move.desired_move;
        let mut moved_any = false;
        for (key, qty) in entries {
            if budget == 0 {
                break;
            }
            if qty > budget {
                continue;
            }
            let moved = schedule.move_entry(day, &donor.machine_id, &receiver.machine_id, &key);
            budget -= moved;
            moved_any = true;
            events.record(PlanningEvent::BalanceMoved {
                day,
                donor: donor.machine_id.clone(),
                receiver: receiver.machine_id.clone(),
                key,
                qty: moved,
            });
        }

        if !moved_any {
            events.record(PlanningEvent::BalanceResidualSkew {
                day,
                donor: donor.machine_id.clone(),
                receiver: receiver.machine_id.clone(),
                donor_load: day_move.donor_load,
                receiver_load: day_move.receiver_load,
                desired_move: day_move.desired_move,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductClass;
    use crate::engine::registry::{MachineRegistry, RoutingTable};

    fn soy_key(formula: &str, brand: &str) -> AllocationKey {
        AllocationKey::new(ProductClass::new("ПП", "Соевый соус", formula), brand)
    }

    fn twins(priority_b: i32) -> PlanningContext {
        let m = |id: &str, priority: i32| {
            Machine::new(id, id, Vec::<String>::new(), Vec::<String>::new(), 50, priority, true)
        };
        PlanningContext::new(
            MachineRegistry::from_machines(vec![m("soy_pp_1", 1), m("soy_pp_2", priority_b)]),
            RoutingTable::empty(),
        )
    }

    #[test]
    fn test_filter_matches_type_and_category_case_insensitive() {
        let filter = TwinBalanceRule::soy_sauce_pp().filter;
        assert!(filter.matches(&ProductClass::new("ПП", "Соевый соус", "F1")));
        assert!(!filter.matches(&ProductClass::new("Стекло", "Соевый соус", "F1")));
        assert!(!filter.matches(&ProductClass::new("ПП", "Имбирь", "F1")));
        assert!(BalanceFilter::default().matches(&ProductClass::new("X", "Y", "Z")));
    }

    #[test]
    fn test_single_entry_larger_than_budget_stays() {
        let ctx = twins(1);
        let rules = vec![TwinBalanceRule::soy_sauce_pp()];
        let mut schedule = MachineSchedule::new();
        schedule.add(0, "soy_pp_1", soy_key("F1", "A"), 40);

        let events = SymmetricBalancer::new(&ctx, &rules, 1).balance(&mut schedule);

        assert_eq!(schedule.load(0, "soy_pp_1"), 40);
        assert_eq!(schedule.load(0, "soy_pp_2"), 0);
        assert_eq!(events.count("BalanceResidualSkew"), 1);
    }

    #[test]
    fn test_moves_only_entries_that_fit() {
        let ctx = twins(1);
        let rules = vec![TwinBalanceRule::soy_sauce_pp()];
        let mut schedule = MachineSchedule::new();
        schedule.add(0, "soy_pp_1", soy_key("F1", "A"), 30);
        schedule.add(0, "soy_pp_1", soy_key("F1", "B"), 20);

        let events = SymmetricBalancer::new(&ctx, &rules, 1).balance(&mut schedule);

        // desired_move = min(50, 50/2) = 25：30 放不下，20 整条挪走
        assert_eq!(schedule.load(0, "soy_pp_1"), 30);
        assert_eq!(schedule.load(0, "soy_pp_2"), 20);
        assert_eq!(events.count("BalanceMoved"), 1);
    }

    #[test]
    fn test_priority_guard_leaves_ledger_untouched() {
        let ctx = twins(2);
        let rules = vec![TwinBalanceRule::soy_sauce_pp()];
        let mut schedule = MachineSchedule::new();
        schedule.add(0, "soy_pp_1", soy_key("F1", "A"), 10);
        schedule.add(0, "soy_pp_1", soy_key("F1", "B"), 10);
        let before = schedule.clone();

        let events = SymmetricBalancer::new(&ctx, &rules, 3).balance(&mut schedule);

        assert_eq!(schedule, before);
        assert_eq!(events.count("BalancerPriorityGuard"), 1);
    }

    #[test]
    fn test_missing_twin_is_noop() {
        let ctx = twins(1);
        let rules = vec![TwinBalanceRule::new("soy_pp_1", "ghost", BalanceFilter::default())];
        let mut schedule = MachineSchedule::new();
        schedule.add(0, "soy_pp_1", soy_key("F1", "A"), 10);

        let events = SymmetricBalancer::new(&ctx, &rules, 1).balance(&mut schedule);

        assert_eq!(schedule.load(0, "soy_pp_1"), 10);
        assert_eq!(events.count("BalancerTwinMissing"), 1);
    }

    #[test]
    fn test_skip_reasons_recorded() {
        let ctx = twins(1);
        let rules = vec![TwinBalanceRule::soy_sauce_pp()];
        let mut schedule = MachineSchedule::new();
        schedule.add(1, "soy_pp_1", soy_key("F1", "A"), 11);
        schedule.add(1, "soy_pp_2", soy_key("F1", "B"), 10);

        let events = SymmetricBalancer::new(&ctx, &rules, 2).balance(&mut schedule);

        let reasons: Vec<BalanceSkipReason> = events
            .events()
            .iter()
            .filter_map(|e| match e {
                PlanningEvent::BalanceDaySkipped { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect();
        assert_eq!(
            reasons,
            vec![BalanceSkipReason::NoLoad, BalanceSkipReason::AlreadyBalanced]
        );
    }
}
