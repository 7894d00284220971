// ==========================================
// 机台排产系统 - 机台注册表与路由表
// ==========================================
// 职责: 按声明顺序保存机台定义与路由规则，组成只读排产上下文
// 红线: 上下文在一次排产中不可变，不使用全局状态
// ==========================================

use crate::domain::machine::{Machine, RoutingRule};
use crate::domain::types::ProductClass;
use tracing::debug;

// ==========================================
// MachineRegistry - 机台注册表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MachineRegistry {
    machines: Vec<Machine>,
}

impl MachineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由机台列表构建（重复ID以后者为准，保留首次声明位置）
    pub fn from_machines(machines: impl IntoIterator<Item = Machine>) -> Self {
        let mut registry = Self::new();
        for machine in machines {
            registry.insert(machine);
        }
        registry
    }

    /// 注册机台（产能为 0 的机台直接丢弃）
    ///
    /// # 返回
    /// 是否已注册
    pub fn insert(&mut self, machine: Machine) -> bool {
        if machine.machine_id.is_empty() || machine.daily_capacity == 0 {
            debug!(machine_id = %machine.machine_id, "机台ID为空或日产能为 0，丢弃");
            return false;
        }
        match self
            .machines
            .iter_mut()
            .find(|m| m.machine_id == machine.machine_id)
        {
            Some(existing) => {
                debug!(machine_id = %machine.machine_id, "机台ID重复，以后一条定义为准");
                *existing = machine;
            }
            None => self.machines.push(machine),
        }
        true
    }

    pub fn get(&self, machine_id: &str) -> Option<&Machine> {
        self.machines.iter().find(|m| m.machine_id == machine_id)
    }

    pub fn contains(&self, machine_id: &str) -> bool {
        self.get(machine_id).is_some()
    }

    /// 声明顺序位置
    pub fn position(&self, machine_id: &str) -> Option<usize> {
        self.machines.iter().position(|m| m.machine_id == machine_id)
    }

    /// 全部机台（声明顺序）
    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// 启用机台（声明顺序）
    pub fn active_machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter().filter(|m| m.active)
    }

    pub fn active_count(&self) -> usize {
        self.active_machines().count()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

// ==========================================
// RoutingTable - 路由表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
}

impl RoutingTable {
    pub fn new(rules: Vec<RoutingRule>) -> Self {
        Self { rules }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// 精确匹配给定产品类别的启用规则，按规则优先级稳定升序
    pub fn rules_for(&self, class: &ProductClass) -> Vec<&RoutingRule> {
        let mut rules: Vec<&RoutingRule> =
            self.rules.iter().filter(|r| r.applies_to(class)).collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ==========================================
// PlanningContext - 一次排产的只读上下文
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PlanningContext {
    pub registry: MachineRegistry,
    pub routing: RoutingTable,
}

impl PlanningContext {
    pub fn new(registry: MachineRegistry, routing: RoutingTable) -> Self {
        Self { registry, routing }
    }
}
