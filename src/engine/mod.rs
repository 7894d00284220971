// ==========================================
// 机台排产系统 - 引擎层
// ==========================================
// 职责: 批次构建、产能分配、双机均衡、投影
// 红线: Engine 不拼 SQL, 不读文件; 所有跳过/缺口必须输出事件
// ==========================================

pub mod allocator;
pub mod balancer;
pub mod batch_builder;
pub mod calendar;
pub mod candidate_resolver;
pub mod events;
pub mod orchestrator;
pub mod priority;
pub mod projection;
pub mod registry;

// 重导出核心引擎
pub use allocator::{AllocationEngine, AllocationOutcome};
pub use balancer::{BalanceFilter, SymmetricBalancer, TwinBalanceRule};
pub use batch_builder::BatchBuilder;
pub use calendar::{is_working_day, WorkingCalendar, DEFAULT_HORIZON_WORKING_DAYS};
pub use candidate_resolver::CandidateResolver;
pub use events::{BalanceSkipReason, PlanningEvent, PlanningEventLog};
pub use orchestrator::{MachinePlan, MachinePlanOrchestrator};
pub use priority::{parse_shipping_days, LinePriorityScorer, LineStockInfo};
pub use projection::PlanProjector;
pub use registry::{MachineRegistry, PlanningContext, RoutingTable};
