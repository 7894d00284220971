// ==========================================
// MachinePlanRepository 集成测试
// ==========================================
// 测试目标: 排产结果整体入库/读回、错误日志、事务原子性
// ==========================================


use machine_plan_aps::config::PlannerSettings;
use machine_plan_aps::engine::{MachinePlan, MachinePlanOrchestrator};
use machine_plan_aps::logging;
use machine_plan_aps::repository::{MachinePlanRepository, RepositoryError};
use test_helpers::{context, create_test_db, machine, plan_date, soy_record};

fn sample_plan() -> MachinePlan {
    let ctx = context(vec![machine("m1", 50, 1), machine("m2", 20, 2)], vec![]);
    let records = vec![
        soy_record(0, "A", "F1", 90, 0),
        soy_record(1, "B", "F2", 80, 10),
        soy_record(2, "C", "F1", 100, 0),
    ];
    MachinePlanOrchestrator::new(PlannerSettings::default())
        .execute(&ctx, &records, plan_date())
        .expect("排产失败")
}

#[test]
fn test_save_and_load_round_trip() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = MachinePlanRepository::new(&db_path).expect("Failed to create repository");
    let plan = sample_plan();

    repo.save_plan(&plan).unwrap();

    let run = repo.find_run(&plan.run_id).unwrap().expect("run should exist");
    assert_eq!(run.plan_date, "2026-10-16");
    assert_eq!(run.horizon_days, 3);
    assert_eq!(run.total_required, plan.total_required());
    assert_eq!(run.total_allocated, plan.total_allocated());
    assert_eq!(run.total_shortage, plan.total_shortage());
    assert!(run.total_shortage > 0);

    let working_days: Vec<String> = serde_json::from_str(&run.working_days_json).unwrap();
    assert_eq!(working_days[0], "2026-10-16");
    assert_eq!(working_days[1], "2026-10-19");

    assert_eq!(repo.load_line_rows(&plan.run_id).unwrap(), plan.line_rows);
    assert_eq!(repo.load_ledger_rows(&plan.run_id).unwrap(), plan.ledger_rows);
}

#[test]
fn test_latest_run_for_date() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = MachinePlanRepository::new(&db_path).expect("Failed to create repository");
    let first = sample_plan();
    let second = sample_plan();
    repo.save_plan(&first).unwrap();
    repo.save_plan(&second).unwrap();

    let latest = repo.latest_run_for_date(plan_date()).unwrap().unwrap();
    assert_eq!(latest.run_id, second.run_id);
    assert!(repo
        .latest_run_for_date(plan_date().succ_opt().unwrap())
        .unwrap()
        .is_none());
}

#[test]
fn test_duplicate_run_rolls_back() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = MachinePlanRepository::new(&db_path).expect("Failed to create repository");
    let plan = sample_plan();
    repo.save_plan(&plan).unwrap();

    let mut duplicate = sample_plan();
    duplicate.run_id = plan.run_id.clone();
    let result = repo.save_plan(&duplicate);
    assert!(matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))));

    // 原记录未被破坏
    assert_eq!(repo.load_ledger_rows(&plan.run_id).unwrap(), plan.ledger_rows);
}

#[test]
fn test_delete_run_cascades() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = MachinePlanRepository::new(&db_path).expect("Failed to create repository");
    let plan = sample_plan();
    repo.save_plan(&plan).unwrap();

    repo.delete_run(&plan.run_id).unwrap();

    assert!(repo.find_run(&plan.run_id).unwrap().is_none());
    assert!(repo.load_line_rows(&plan.run_id).unwrap().is_empty());
    assert!(repo.load_ledger_rows(&plan.run_id).unwrap().is_empty());
}

#[test]
fn test_error_log_written_without_plan_rows() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let repo = MachinePlanRepository::new(&db_path).expect("Failed to create repository");

    let id = repo.log_error("Sen Soy", "配方为空").unwrap();
    assert!(id > 0);

    let errors = repo.list_errors(5).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source, "Sen Soy");
    assert!(repo.latest_run_for_date(plan_date()).unwrap().is_none());
}
