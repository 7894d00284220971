// ==========================================
// 机台排产系统 - 命令行入口
// ==========================================
// 用法:
//   machine-plan-aps <plan_file> <brands_file> <machines_file> [routing_file]
//                    [--db <path>] [--date <YYYY-MM-DD>] [--out <dir>]
//                    [--locale <zh-CN|en>] [--notify-file <path>]
// 流程: 读配置 → 导入机台/需求 → 排产 → 入库 → 导出 CSV → 通知
// 致命错误: 写 error_log + 通知，退出码非 0
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use machine_plan_aps::config::{ConfigManager, PlannerSettings};
use machine_plan_aps::db::default_db_path;
use machine_plan_aps::engine::{MachinePlan, MachinePlanOrchestrator, PlanningContext};
use machine_plan_aps::error::PlanningResult;
use machine_plan_aps::importer::{DemandImporter, MachineSettingsLoader};
use machine_plan_aps::report::{
    format_fatal_error, format_machine_plan_message, format_shortage_message, notify_chunked,
    CsvPlanExporter, FileNotifier, LogNotifier, PlanNotifier,
};
use machine_plan_aps::repository::MachinePlanRepository;
use machine_plan_aps::{i18n, logging};
use std::path::PathBuf;
use tracing::{error, info, warn};

const USAGE: &str = "用法: machine-plan-aps <plan_file> <brands_file> <machines_file> [routing_file] \
[--db <path>] [--date <YYYY-MM-DD>] [--out <dir>] [--locale <zh-CN|en>] [--notify-file <path>]";

#[derive(Debug)]
struct CliArgs {
    plan_file: PathBuf,
    brands_file: PathBuf,
    machines_file: PathBuf,
    routing_file: Option<PathBuf>,
    db_path: PathBuf,
    plan_date: NaiveDate,
    out_dir: PathBuf,
    locale: Option<String>,
    notify_file: Option<PathBuf>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut db_path = None;
    let mut plan_date = None;
    let mut out_dir = None;
    let mut locale = None;
    let mut notify_file = None;

    let mut args = args;
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| anyhow!("{} 缺少参数值", flag));
        match arg.as_str() {
            "--db" => db_path = Some(PathBuf::from(value("--db")?)),
            "--date" => {
                let raw = value("--date")?;
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("日期格式错误: {}", raw))?;
                plan_date = Some(date);
            }
            "--out" => out_dir = Some(PathBuf::from(value("--out")?)),
            "--locale" => locale = Some(value("--locale")?),
            "--notify-file" => notify_file = Some(PathBuf::from(value("--notify-file")?)),
            flag if flag.starts_with("--") => bail!("未知参数: {}", flag),
            _ => positional.push(PathBuf::from(&arg)),
        }
    }

    if !(3..=4).contains(&positional.len()) {
        bail!("需要 3 或 4 个文件参数，实际 {}", positional.len());
    }
    let mut positional = positional.into_iter();
    let (Some(plan_file), Some(brands_file), Some(machines_file)) =
        (positional.next(), positional.next(), positional.next())
    else {
        bail!("缺少文件参数");
    };

    Ok(CliArgs {
        plan_file,
        brands_file,
        machines_file,
        routing_file: positional.next(),
        db_path: db_path.unwrap_or_else(default_db_path),
        plan_date: plan_date.unwrap_or_else(|| Local::now().date_naive()),
        out_dir: out_dir.unwrap_or_else(|| PathBuf::from("output")),
        locale,
        notify_file,
    })
}

#[tokio::main]
async fn main() {
    logging::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if let Some(locale) = &args.locale {
        if !i18n::set_locale(locale) {
            warn!(locale = %locale, current = %i18n::current_locale(), "不支持的语言，沿用当前语言");
        }
    }

    info!("==================================================");
    info!("{} v{}", machine_plan_aps::APP_NAME, machine_plan_aps::VERSION);
    info!("==================================================");

    if let Err(e) = run(&args).await {
        error!(error = %format!("{:#}", e), "排产失败");
        std::process::exit(1);
    }
}

async fn run(args: &CliArgs) -> Result<()> {
    if let Some(parent) = args.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }
    let db_path = args.db_path.to_string_lossy().to_string();
    info!(db_path = %db_path, plan_date = %args.plan_date, "使用数据库");

    let repo = MachinePlanRepository::new(&db_path).context("无法打开排产结果库")?;
    let config = ConfigManager::new(&db_path).map_err(|e| anyhow!("无法打开配置库: {}", e))?;
    let notifier: Box<dyn PlanNotifier> = match &args.notify_file {
        Some(path) => Box::new(FileNotifier::new(path)),
        None => Box::new(LogNotifier),
    };

    match build_plan(args, &config).await {
        Ok((plan, context)) => publish(args, &repo, notifier.as_ref(), &plan, &context),
        Err(e) => {
            repo.log_error(e.origin(), e.message())
                .context("写入错误日志失败")?;
            let message = format_fatal_error(e.origin(), e.message());
            let max_len = PlannerSettings::default().notify_max_message_len;
            if let Err(notify_err) = notify_chunked(notifier.as_ref(), &message, max_len) {
                warn!(error = %notify_err, "致命错误通知发送失败");
            }
            Err(e.into())
        }
    }
}

/// 读取配置、导入数据、执行排产（任何一步失败都不产生输出）
async fn build_plan(
    args: &CliArgs,
    config: &ConfigManager,
) -> PlanningResult<(MachinePlan, PlanningContext)> {
    let orchestrator = MachinePlanOrchestrator::from_config(config).await?;
    let context =
        MachineSettingsLoader::load_context(&args.machines_file, args.routing_file.as_deref())?;
    let records = DemandImporter::new(args.plan_date).load(&args.plan_file, &args.brands_file)?;
    let plan = orchestrator.execute(&context, &records, args.plan_date)?;
    Ok((plan, context))
}

fn publish(
    args: &CliArgs,
    repo: &MachinePlanRepository,
    notifier: &dyn PlanNotifier,
    plan: &MachinePlan,
    context: &PlanningContext,
) -> Result<()> {
    repo.save_plan(plan).context("保存排产结果失败")?;

    let exported = CsvPlanExporter::new(&args.out_dir)
        .export(plan)
        .context("导出 CSV 失败")?;
    info!(
        line_plan = %exported.line_plan.display(),
        machine_plan = %exported.machine_plan.display(),
        "CSV 已导出"
    );

    let max_len = plan.settings.notify_max_message_len;
    let mut messages = format_machine_plan_message(plan, &context.registry).into_vec();
    if plan.has_shortage() {
        messages.push(format_shortage_message(&plan.shortages));
    }
    for message in &messages {
        if let Err(e) = notify_chunked(notifier, message, max_len) {
            warn!(channel = notifier.name(), error = %e, "排产通知发送失败");
        }
    }

    info!(
        run_id = %plan.run_id,
        total_required = plan.total_required(),
        total_allocated = plan.total_allocated(),
        total_shortage = plan.total_shortage(),
        "排产完成"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<CliArgs> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args_with_flags() {
        let parsed = args(&[
            "plan.xlsx",
            "brands.csv",
            "machines.csv",
            "routing.csv",
            "--date",
            "2026-10-16",
            "--out",
            "/tmp/out",
        ])
        .unwrap();
        assert_eq!(parsed.routing_file, Some(PathBuf::from("routing.csv")));
        assert_eq!(parsed.plan_date, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(parsed.out_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_parse_args_rejects_bad_input() {
        assert!(args(&["plan.xlsx", "brands.csv"]).is_err());
        assert!(args(&["a", "b", "c", "--date", "16.10.2026"]).is_err());
        assert!(args(&["a", "b", "c", "--db"]).is_err());
        assert!(args(&["a", "b", "c", "--verbose"]).is_err());
    }
}

