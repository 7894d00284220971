// ==========================================
// 机台排产系统 - 引擎编排器
// ==========================================
// 用途: 协调 批次构建 → 分配 → 双机均衡 → 投影 的执行顺序
// 红线: 致命错误在产生任何输出前返回；缺口与跳过只记录不报错
// ==========================================

use crate::config::PlannerConfigReader;
use crate::config::PlannerSettings;
use crate::domain::demand::DemandRecord;
use crate::domain::plan::{LedgerRow, LineProjectionRow, MachineSchedule, Shortage};
use crate::engine::allocator::AllocationEngine;
use crate::engine::balancer::SymmetricBalancer;
use crate::engine::batch_builder::BatchBuilder;
use crate::engine::calendar::WorkingCalendar;
use crate::engine::events::PlanningEventLog;
use crate::engine::projection::PlanProjector;
use crate::engine::registry::PlanningContext;
use crate::error::{PlanningError, PlanningResult};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// MachinePlan - 一次排产的结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachinePlan {
    pub run_id: String,
    pub plan_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub settings: PlannerSettings,

    // 日历
    pub working_days: Vec<NaiveDate>,

    // 投影输出
    pub line_rows: Vec<LineProjectionRow>,
    pub ledger_rows: Vec<LedgerRow>,

    // 均衡后的台账（以投影行对外输出）
    #[serde(skip)]
    pub schedule: MachineSchedule,

    // 非致命结果
    pub shortages: Vec<Shortage>,
    pub events: PlanningEventLog,
}

impl MachinePlan {
    /// 视野天数 H+1
    pub fn horizon_days(&self) -> usize {
        self.settings.horizon_days()
    }

    pub fn date_of(&self, day: usize) -> Option<NaiveDate> {
        self.working_days.get(day).copied()
    }

    pub fn total_required(&self) -> u64 {
        self.line_rows.iter().map(|r| r.required_qty).sum()
    }

    pub fn total_allocated(&self) -> u64 {
        self.ledger_rows.iter().map(|r| r.qty).sum()
    }

    pub fn total_shortage(&self) -> u64 {
        self.shortages.iter().map(|s| s.remaining).sum()
    }

    pub fn has_shortage(&self) -> bool {
        !self.shortages.is_empty()
    }
}

// ==========================================
// MachinePlanOrchestrator - 引擎编排器
// ==========================================
pub struct MachinePlanOrchestrator {
    settings: PlannerSettings,
}

impl MachinePlanOrchestrator {
    pub fn new(settings: PlannerSettings) -> Self {
        Self { settings }
    }

    /// 从配置读取器创建
    pub async fn from_config<C>(config: &C) -> PlanningResult<Self>
    where
        C: PlannerConfigReader + ?Sized,
    {
        Ok(Self::new(PlannerSettings::load(config).await?))
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// 执行完整排产流程
    ///
    /// # 参数
    /// - context: 机台与路由（只读）
    /// - records: 已完成品牌补全的需求记录（输入顺序即 index 顺序）
    /// - plan_date: 排产日期（日索引 0）
    ///
    /// # 返回
    /// 排产结果；配置/数据错误时返回 Err 且不产生任何结果
    #[instrument(skip(self, context, records), fields(
        records_count = records.len(),
        machines = context.registry.len(),
        plan_date = %plan_date
    ))]
    pub fn execute(
        &self,
        context: &PlanningContext,
        records: &[DemandRecord],
        plan_date: NaiveDate,
    ) -> PlanningResult<MachinePlan> {
        info!("开始执行机台排产流程");

        // ==========================================
        // 步骤1: 参数与机台校验
        // ==========================================
        debug!("步骤1: 校验排产参数与机台");
        self.settings.validate()?;
        if context.registry.active_count() == 0 {
            return Err(PlanningError::configuration(
                "machines",
                "没有任何启用且产能大于 0 的机台",
            ));
        }

        // ==========================================
        // 步骤2: 批次构建
        // ==========================================
        debug!("步骤2: 按产品类别构建批次");
        let batches = BatchBuilder::build(records)?;
        info!(batches = batches.len(), total_qty = batches.total_required(), "批次构建完成");

        // ==========================================
        // 步骤3: 产能约束分配
        // ==========================================
        debug!("步骤3: 执行批次分配");
        let allocator = AllocationEngine::new(context, self.settings.max_shift_days);
        let outcome = allocator.allocate(batches);
        let mut schedule = outcome.schedule;
        let mut events = outcome.events;

        // ==========================================
        // 步骤4: 双机均衡
        // ==========================================
        debug!("步骤4: 执行双机均衡");
        let balancer = SymmetricBalancer::new(
            context,
            &self.settings.twin_balance_rules,
            self.settings.horizon_days(),
        );
        events.extend(balancer.balance(&mut schedule));

        // ==========================================
        // 步骤5: 投影
        // ==========================================
        debug!("步骤5: 生成投影");
        let calendar = WorkingCalendar::build(plan_date, self.settings.horizon_working_days);
        let projector = PlanProjector::new(&context.registry, &calendar, self.settings.horizon_days());
        let line_rows = projector.line_rows(&outcome.batches, &outcome.assignments);
        let ledger_rows = projector.ledger_rows(&schedule);

        let plan = MachinePlan {
            run_id: Uuid::new_v4().to_string(),
            plan_date,
            created_at: Local::now().naive_local(),
            settings: self.settings.clone(),
            working_days: calendar.working_days().to_vec(),
            line_rows,
            ledger_rows,
            schedule,
            shortages: outcome.shortages,
            events,
        };

        info!(
            run_id = %plan.run_id,
            total_required = plan.total_required(),
            total_allocated = plan.total_allocated(),
            total_shortage = plan.total_shortage(),
            ledger_rows = plan.ledger_rows.len(),
            events = plan.events.len(),
            "机台排产流程完成"
        );
        Ok(plan)
    }
}
