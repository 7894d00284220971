// ==========================================
// SymmetricBalancer 集成测试
// ==========================================
// 测试目标: 分配后双机均衡的整条挪动、优先级保护、产能约束
// ==========================================


use machine_plan_aps::config::PlannerSettings;
use machine_plan_aps::domain::{AllocationKey, MachineSchedule, ProductClass};
use machine_plan_aps::engine::{MachinePlanOrchestrator, SymmetricBalancer, TwinBalanceRule};
use test_helpers::{context, plan_date, soy_machine, soy_record, SOY_CATEGORY, SOY_TYPE};

fn key(brand: &str) -> AllocationKey {
    AllocationKey::new(ProductClass::new(SOY_TYPE, SOY_CATEGORY, "F1"), brand)
}

fn settings(max_shift_days: usize) -> PlannerSettings {
    PlannerSettings {
        max_shift_days,
        ..PlannerSettings::default()
    }
}

#[test]
fn test_entry_larger_than_desired_move_is_not_split() {
    let ctx = context(
        vec![soy_machine("soy_pp_1", 50, 1), soy_machine("soy_pp_2", 50, 1)],
        vec![],
    );
    let rules = vec![TwinBalanceRule::soy_sauce_pp()];
    let mut schedule = MachineSchedule::new();
    schedule.add(0, "soy_pp_1", key("A"), 40);

    let events = SymmetricBalancer::new(&ctx, &rules, 1).balance(&mut schedule);

    // desired_move = min(50, 40 / 2) = 20 < 40
    assert_eq!(schedule.load(0, "soy_pp_1"), 40);
    assert_eq!(schedule.load(0, "soy_pp_2"), 0);
    assert_eq!(events.count("BalanceResidualSkew"), 1);
    assert_eq!(events.count("BalanceMoved"), 0);
}

#[test]
fn test_pipeline_balances_twin_lines() {
    let ctx = context(
        vec![soy_machine("soy_pp_1", 100, 1), soy_machine("soy_pp_2", 100, 1)],
        vec![],
    );
    let records = vec![
        soy_record(0, "A", "F1", 30, 0),
        soy_record(1, "B", "F1", 30, 0),
        soy_record(2, "C", "F1", 20, 0),
    ];

    let plan = MachinePlanOrchestrator::new(settings(2))
        .execute(&ctx, &records, plan_date())
        .unwrap();

    // 分配后全部落在 soy_pp_1 (80 vs 0)，desired_move = 40，只有 A(30) 可整条挪动
    assert_eq!(plan.schedule.load(0, "soy_pp_1"), 50);
    assert_eq!(plan.schedule.load(0, "soy_pp_2"), 30);
    assert_eq!(plan.schedule.ledger(0, "soy_pp_2").unwrap().get(&key("A")), 30);
    assert_eq!(plan.events.count("BalanceMoved"), 1);
    assert_eq!(plan.events.count("BalanceDaySkipped"), 2);

    // 每个 (批次, 品牌) 只出现在一台机上
    let on_both = ["A", "B", "C"].iter().any(|brand| {
        plan.schedule.ledger(0, "soy_pp_1").map(|l| l.get(&key(brand))).unwrap_or(0) > 0
            && plan.schedule.ledger(0, "soy_pp_2").map(|l| l.get(&key(brand))).unwrap_or(0) > 0
    });
    assert!(!on_both);
    assert_eq!(plan.total_allocated(), 80);
}

#[test]
fn test_priority_guard_leaves_preferred_machine_loaded() {
    let ctx = context(
        vec![soy_machine("soy_pp_1", 100, 1), soy_machine("soy_pp_2", 100, 2)],
        vec![],
    );
    let plan = MachinePlanOrchestrator::new(settings(0))
        .execute(&ctx, &[soy_record(0, "A", "F1", 30, 0), soy_record(1, "B", "F1", 30, 0)], plan_date())
        .unwrap();

    assert_eq!(plan.schedule.load(0, "soy_pp_1"), 60);
    assert_eq!(plan.schedule.load(0, "soy_pp_2"), 0);
    assert_eq!(plan.events.count("BalancerPriorityGuard"), 1);
}

#[test]
fn test_receiver_capacity_respected() {
    let ctx = context(
        vec![soy_machine("soy_pp_1", 100, 1), soy_machine("soy_pp_2", 30, 1)],
        vec![],
    );
    let rules = vec![TwinBalanceRule::soy_sauce_pp()];
    let mut schedule = MachineSchedule::new();
    schedule.add(0, "soy_pp_1", key("A"), 10);
    schedule.add(0, "soy_pp_1", key("B"), 10);
    schedule.add(0, "soy_pp_1", key("C"), 60);
    schedule.add(0, "soy_pp_2", key("D"), 25);

    SymmetricBalancer::new(&ctx, &rules, 1).balance(&mut schedule);

    // receiver 剩余 5，任何 10 的条目都放不下
    assert!(schedule.load(0, "soy_pp_2") <= 30);
    assert_eq!(schedule.load(0, "soy_pp_2"), 25);
    assert_eq!(schedule.total(), 105);
}

#[test]
fn test_missing_twin_is_noop() {
    let ctx = context(vec![soy_machine("soy_pp_1", 100, 1)], vec![]);
    let rules = vec![TwinBalanceRule::soy_sauce_pp()];
    let mut schedule = MachineSchedule::new();
    schedule.add(0, "soy_pp_1", key("A"), 80);
    let before = schedule.clone();

    let events = SymmetricBalancer::new(&ctx, &rules, 3).balance(&mut schedule);

    assert_eq!(schedule, before);
    assert_eq!(events.count("BalancerTwinMissing"), 1);
}
