// ==========================================
// 机台排产系统 - 领域模型层
// ==========================================
// 职责: 定义需求行、批次、机台、路由规则、台账等领域实体
// 红线: 不含数据访问逻辑，不含引擎逻辑
// ==========================================

pub mod demand;
pub mod machine;
pub mod plan;
pub mod types;

// 重导出核心类型
pub use demand::{Batch, BatchSet, DemandLine, DemandRecord};
pub use machine::{Machine, RoutingRule, DEFAULT_PRIORITY};
pub use plan::{
    FreeCapacityTable, LedgerEntry, LedgerRow, LineAssignments, LineProjectionRow, LineShortage,
    MachineDayLedger, MachineSchedule, Shortage,
};
pub use types::{AllocationKey, BatchKey, MachineDayKey, ProductClass};
