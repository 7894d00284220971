// ==========================================
// 机台排产系统 - 候选机台解析
// ==========================================
// 规则:
// 1) 启用且精确匹配的路由规则，按规则优先级升序，目标机台去重（首次出现为准）
// 2) 追加能力过滤通过的启用机台（声明顺序），已列出的不再重复
// 3) 剔除未知/停用/能力不符的机台，按机台优先级稳定升序
// 红线: 返回结果只依赖输入顺序与稳定排序，结果确定
// ==========================================

use crate::domain::machine::Machine;
use crate::domain::types::ProductClass;
use crate::engine::registry::PlanningContext;
use tracing::trace;

// ==========================================
// CandidateResolver - 候选机台解析器
// ==========================================
pub struct CandidateResolver<'a> {
    context: &'a PlanningContext,
}

impl<'a> CandidateResolver<'a> {
    pub fn new(context: &'a PlanningContext) -> Self {
        Self { context }
    }

    /// 解析产品类别的候选机台（有序，可能为空）
    pub fn resolve(&self, class: &ProductClass) -> Vec<&'a Machine> {
        let context: &'a PlanningContext = self.context;
        let registry = &context.registry;

        // 步骤1: 路由规则指定的机台
        let mut ids: Vec<&'a str> = Vec::new();
        for rule in context.routing.rules_for(class) {
            let id = rule.preferred_machine_id.as_str();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        // 步骤2: 能力过滤通过的启用机台
        for machine in registry.active_machines() {
            if machine.admits(class) && !ids.contains(&machine.machine_id.as_str()) {
                ids.push(machine.machine_id.as_str());
            }
        }

        // 步骤3: 映射为机台并复核
        let mut candidates: Vec<&'a Machine> = ids
            .into_iter()
            .filter_map(|id| registry.get(id))
            .filter(|m| m.active && m.admits(class))
            .collect();
        candidates.sort_by_key(|m| m.priority);

        trace!(
            batch = %class,
            candidates = ?candidates.iter().map(|m| m.machine_id.as_str()).collect::<Vec<_>>(),
            "候选机台解析完成"
        );
        candidates
    }
}
