// ==========================================
// 机台排产系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod machine_plan_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use machine_plan_repo::{ErrorLogEntity, MachinePlanRepository, PlanRunEntity};
