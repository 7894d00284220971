// ==========================================
// 机台排产系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 产能约束下的批次分配 + 双机均衡
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 统一排产错误
pub mod error;

// 引擎层 - 分配与均衡
pub mod engine;

// 导入层 - 外部表格
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据仓储层 - 排产结果持久化
pub mod repository;

// 报告层 - 消息/通知/CSV
pub mod report;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{DemandRecord, Machine, ProductClass, RoutingRule};
pub use engine::{MachinePlan, MachinePlanOrchestrator, PlanningContext};
pub use error::{PlanningError, PlanningResult};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "机台排产系统";
