// ==========================================
// 机台排产系统 - 配置层
// ==========================================
// 职责: 排产参数读取与校验
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod planner_config_trait;
pub mod planner_settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use planner_config_trait::{ConfigReadResult, PlannerConfigReader};
pub use planner_settings::PlannerSettings;
