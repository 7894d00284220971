// ==========================================
// 机台排产系统 - 排产消息格式化
// ==========================================
// 今日消息: 第 0 天有负荷的机台，按 配方 → 品牌 分组
// 后续消息: 第 1..=H 天，每天一个标题，只列有负荷的机台
// 机台顺序: 优先级升序，同优先级保持声明顺序
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::plan::{LedgerRow, Shortage};
use crate::engine::orchestrator::MachinePlan;
use crate::engine::registry::MachineRegistry;
use crate::i18n::{t, t_with_args};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// 格式化后的排产消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanMessages {
    pub today: String,
    pub future: Option<String>,
}

impl PlanMessages {
    pub fn into_vec(self) -> Vec<String> {
        let mut messages = vec![self.today];
        messages.extend(self.future);
        messages
    }
}

// 配方 → 品牌 → 数量
type FormulaGroups<'a> = BTreeMap<&'a str, BTreeMap<&'a str, u64>>;

/// 生成机台排产消息
///
/// 台账为空时只返回一条"计划为空"消息
pub fn format_machine_plan_message(plan: &MachinePlan, registry: &MachineRegistry) -> PlanMessages {
    if plan.ledger_rows.is_empty() {
        return PlanMessages {
            today: t("report.plan_empty"),
            future: None,
        };
    }

    let machines = ordered_machines(registry);

    // 今日
    let mut today = vec![t_with_args(
        "report.today_header",
        &[("date", date_label(plan.date_of(0)).as_str())],
    )];
    for machine in &machines {
        let groups = group_rows(&plan.ledger_rows, 0, machine.machine_id.as_str());
        if !groups.is_empty() {
            push_machine_block(&mut today, machine, &groups);
        }
    }

    // 后续
    let mut future = vec![t("report.future_header")];
    let mut has_future = false;
    for day in 1..plan.horizon_days() {
        let mut day_lines = Vec::new();
        for machine in &machines {
            let groups = group_rows(&plan.ledger_rows, day, machine.machine_id.as_str());
            if !groups.is_empty() {
                push_machine_block(&mut day_lines, machine, &groups);
            }
        }
        if day_lines.is_empty() {
            continue;
        }
        has_future = true;
        future.push(String::new());
        future.push(t_with_args(
            "report.day_header",
            &[("day", day.to_string().as_str()), ("date", date_label(plan.date_of(day)).as_str())],
        ));
        future.extend(day_lines);
    }

    PlanMessages {
        today: today.join("\n"),
        future: has_future.then(|| future.join("\n")),
    }
}

/// 缺口汇总消息
pub fn format_shortage_message(shortages: &[Shortage]) -> String {
    if shortages.is_empty() {
        return t("report.no_shortage");
    }

    let mut lines = vec![t("report.shortage_header")];
    for shortage in shortages {
        let class = &shortage.product_class;
        lines.push(t_with_args(
            "report.shortage_line",
            &[
                ("type", class.product_type.as_str()),
                ("category", class.category.as_str()),
                ("formula", class.formula.as_str()),
                ("qty", shortage.remaining.to_string().as_str()),
            ],
        ));
        for line in &shortage.lines {
            lines.push(format!("  - {}: {}", line.brand, line.remaining));
        }
    }
    lines.join("\n")
}

/// 致命错误消息
pub fn format_fatal_error(source: &str, message: &str) -> String {
    t_with_args("report.fatal_error", &[("source", source), ("message", message)])
}

/// 按行边界切分消息，每段不超过 max_len 个字符
///
/// 单行超长时在字符边界处硬切
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();

        if line_len > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_len) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        // 加上换行符后的长度
        let needed = if current.is_empty() { line_len } else { current_len + 1 + line_len };
        if needed > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn ordered_machines(registry: &MachineRegistry) -> Vec<&Machine> {
    let mut machines: Vec<&Machine> = registry.active_machines().collect();
    machines.sort_by_key(|m| m.priority);
    machines
}

fn group_rows<'a>(rows: &'a [LedgerRow], day: usize, machine_id: &str) -> FormulaGroups<'a> {
    let mut groups: FormulaGroups<'a> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.day == day && r.machine_id == machine_id) {
        *groups
            .entry(row.formula.as_str())
            .or_default()
            .entry(row.brand.as_str())
            .or_insert(0) += row.qty;
    }
    groups
}

fn push_machine_block(lines: &mut Vec<String>, machine: &Machine, groups: &FormulaGroups<'_>) {
    let total: u64 = groups.values().flat_map(|brands| brands.values()).sum();
    lines.push(t_with_args(
        "report.machine_line",
        &[
            ("name", machine.name.as_str()),
            ("id", machine.machine_id.as_str()),
            ("total", total.to_string().as_str()),
        ],
    ));
    for (formula, brands) in groups {
        let formula_total: u64 = brands.values().sum();
        lines.push(format!(
            "  {}",
            t_with_args(
                "report.formula_line",
                &[("formula", *formula), ("total", formula_total.to_string().as_str())],
            )
        ));
        for (brand, qty) in brands {
            lines.push(format!(
                "    {}",
                t_with_args("report.brand_line", &[("brand", *brand), ("qty", qty.to_string().as_str())])
            ));
        }
    }
}

fn date_label(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}
