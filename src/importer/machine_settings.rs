// ==========================================
// 机台排产系统 - 机台与路由配置导入
// ==========================================
// 机台表必需列: Machine_ID, Name, Category_Allowed, Type_Allowed,
//               Daily_Capacity_cases, Priority, Active
// 路由表: Тип|Type, Категория|Category, Рецептура|Formula, Preferred_Machine_ID
//         (有数据行时必需), Priority / Active 可选
// 红线: 机台/路由来源不可读或缺列 → 配置错误，整次排产中止
// ==========================================

use crate::domain::machine::{Machine, RoutingRule, DEFAULT_PRIORITY};
use crate::domain::types::ProductClass;
use crate::engine::registry::{MachineRegistry, PlanningContext, RoutingTable};
use crate::error::PlanningResult;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{cell, RawSheet, UniversalFileParser};
use crate::importer::value_parser::{parse_bool, parse_int, parse_list};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const MACHINE_COLUMNS: [&str; 7] = [
    "Machine_ID",
    "Name",
    "Category_Allowed",
    "Type_Allowed",
    "Daily_Capacity_cases",
    "Priority",
    "Active",
];

const TYPE_COLUMNS: [&str; 2] = ["Тип", "Type"];
const CATEGORY_COLUMNS: [&str; 2] = ["Категория", "Category"];
const FORMULA_COLUMNS: [&str; 2] = ["Рецептура", "Formula"];
const PREFERRED_MACHINE_COLUMN: &str = "Preferred_Machine_ID";

// ==========================================
// MachineSettingsLoader - 机台/路由加载器
// ==========================================
pub struct MachineSettingsLoader;

impl MachineSettingsLoader {
    /// 加载排产上下文（机台表 + 可选路由表）
    ///
    /// # 错误
    /// - 任一来源不可读或缺列 → `PlanningError::Configuration`
    #[instrument(skip_all, fields(machines = %machines_path.display()))]
    pub fn load_context(machines_path: &Path, routing_path: Option<&Path>) -> PlanningResult<PlanningContext> {
        let machines_source = machines_path.display().to_string();
        let sheet = UniversalFileParser
            .parse(machines_path)
            .map_err(|e| e.into_configuration(&machines_source))?;
        let registry = Self::machines_from_sheet(&sheet)
            .map_err(|e| e.into_configuration(&machines_source))?;

        let routing = match routing_path {
            Some(path) => {
                let routing_source = path.display().to_string();
                let sheet = UniversalFileParser
                    .parse(path)
                    .map_err(|e| e.into_configuration(&routing_source))?;
                Self::routing_from_sheet(&sheet).map_err(|e| e.into_configuration(&routing_source))?
            }
            None => RoutingTable::empty(),
        };

        info!(
            machines = registry.len(),
            active_machines = registry.active_count(),
            routing_rules = routing.len(),
            "机台配置加载完成"
        );
        Ok(PlanningContext::new(registry, routing))
    }

    /// 机台表 → 注册表
    pub fn machines_from_sheet(sheet: &RawSheet) -> ImportResult<MachineRegistry> {
        sheet.require_columns(&MACHINE_COLUMNS)?;

        let mut registry = MachineRegistry::new();
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let machine_id = cell(row, "Machine_ID");
            if machine_id.is_empty() {
                continue;
            }

            let capacity = match parse_int(cell(row, "Daily_Capacity_cases")) {
                Ok(Some(v)) if v > 0 => v as u64,
                _ => {
                    debug!(row = row_idx + 2, machine_id, "日产能为空/非正/非数字，丢弃机台");
                    continue;
                }
            };
            let priority = match parse_int(cell(row, "Priority")) {
                Ok(Some(v)) => i32::try_from(v).unwrap_or(DEFAULT_PRIORITY),
                _ => DEFAULT_PRIORITY,
            };

            registry.insert(Machine::new(
                machine_id,
                cell(row, "Name"),
                parse_list(cell(row, "Category_Allowed")),
                parse_list(cell(row, "Type_Allowed")),
                capacity,
                priority,
                parse_bool(cell(row, "Active")),
            ));
        }
        Ok(registry)
    }

    /// 路由表 → 路由规则（空表合法）
    pub fn routing_from_sheet(sheet: &RawSheet) -> ImportResult<RoutingTable> {
        if sheet.is_empty() {
            return Ok(RoutingTable::empty());
        }

        let type_col = sheet.find_column(&TYPE_COLUMNS).unwrap_or(TYPE_COLUMNS[0]);
        let category_col = sheet.find_column(&CATEGORY_COLUMNS).unwrap_or(CATEGORY_COLUMNS[0]);
        let formula_col = sheet.find_column(&FORMULA_COLUMNS).unwrap_or(FORMULA_COLUMNS[0]);
        sheet.require_columns(&[type_col, category_col, formula_col, PREFERRED_MACHINE_COLUMN])?;

        let has_priority = sheet.has_column("Priority");
        let has_active = sheet.has_column("Active");

        let mut rules = Vec::new();
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            let preferred = cell(row, PREFERRED_MACHINE_COLUMN);
            if preferred.is_empty() {
                warn!(row = row_idx + 2, "路由规则缺少 Preferred_Machine_ID，丢弃");
                continue;
            }

            let priority = if has_priority {
                match parse_int(cell(row, "Priority")) {
                    Ok(None) => DEFAULT_PRIORITY,
                    Ok(Some(v)) => match i32::try_from(v) {
                        Ok(p) => p,
                        Err(_) => {
                            warn!(row = row_idx + 2, value = v, "路由规则优先级越界，丢弃");
                            continue;
                        }
                    },
                    Err(_) => {
                        warn!(row = row_idx + 2, value = cell(row, "Priority"), "路由规则优先级格式错误，丢弃");
                        continue;
                    }
                }
            } else {
                DEFAULT_PRIORITY
            };
            let active = if has_active {
                parse_bool(cell(row, "Active"))
            } else {
                true
            };

            rules.push(RoutingRule::new(
                ProductClass::new(
                    cell(row, type_col),
                    cell(row, category_col),
                    cell(row, formula_col),
                ),
                preferred,
                priority,
                active,
            ));
        }
        Ok(RoutingTable::new(rules))
    }
}
