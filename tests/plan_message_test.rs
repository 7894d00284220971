// ==========================================
// 排产消息集成测试
// ==========================================
// 测试目标: 今日/后续消息只列有负荷的机台，机台按优先级排列
// ==========================================


use machine_plan_aps::config::PlannerSettings;
use machine_plan_aps::engine::MachinePlanOrchestrator;
use machine_plan_aps::logging;
use machine_plan_aps::report::format_machine_plan_message;
use test_helpers::{context, machine, plan_date, soy_record};

#[test]
fn test_today_message_skips_machines_without_day_zero_load() {
    logging::init_test();
    let ctx = context(
        vec![machine("m_idle", 50, 9), machine("m_busy", 50, 1)],
        vec![],
    );
    let plan = MachinePlanOrchestrator::new(PlannerSettings::default())
        .execute(&ctx, &[soy_record(0, "Kikkoman", "F1", 30, 0)], plan_date())
        .unwrap();

    let messages = format_machine_plan_message(&plan, &ctx.registry);
    assert!(messages.today.contains("m_busy"));
    assert!(messages.today.contains("Kikkoman"));
    assert!(!messages.today.contains("m_idle"));
    assert!(messages.future.is_none());
}

#[test]
fn test_future_message_lists_machines_by_priority() {
    logging::init_test();
    let ctx = context(
        vec![machine("m_low", 20, 5), machine("m_high", 20, 1)],
        vec![],
    );
    let plan = MachinePlanOrchestrator::new(PlannerSettings::default())
        .execute(&ctx, &[soy_record(0, "A", "F1", 70, 0)], plan_date())
        .unwrap();

    let messages = format_machine_plan_message(&plan, &ctx.registry);
    let future = messages.future.expect("第 1 天有排产");
    let high = future.find("m_high").unwrap();
    let low = future.find("m_low").unwrap();
    assert!(high < low);
    assert!(!messages.today.is_empty());
}
