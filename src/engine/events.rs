// ==========================================
// 机台排产系统 - 排产事件日志
// ==========================================
// 职责: 记录非致命的跳过/挪动/缺口事件，替代只打日志的做法
// 说明: 事件在记录时同时输出 tracing 日志，事件日志随排产结果返回
// ==========================================

use crate::domain::types::{AllocationKey, BatchKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

// ==========================================
// 均衡跳过原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceSkipReason {
    /// 两台机当日过滤后负荷均为 0
    NoLoad,
    /// 负荷差 <= 1
    AlreadyBalanced,
    /// 两台机均无剩余产能
    NoFreeCapacity,
    /// 计算出的挪动量为 0（接收方已满）
    ZeroDesiredMove,
}

impl BalanceSkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            BalanceSkipReason::NoLoad => "NoLoad",
            BalanceSkipReason::AlreadyBalanced => "AlreadyBalanced",
            BalanceSkipReason::NoFreeCapacity => "NoFreeCapacity",
            BalanceSkipReason::ZeroDesiredMove => "ZeroDesiredMove",
        }
    }
}

// ==========================================
// 排产事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlanningEvent {
    /// 某日某批次没有任何可用机台
    NoEligibleMachine { day: usize, batch_key: BatchKey },
    /// 视野结束后批次仍有剩余
    Shortage { batch_key: BatchKey, remaining: u64 },
    /// 双机规则中的机台不在机台表中
    BalancerTwinMissing { machine_id: String },
    /// 双机规则中的机台已停用
    BalancerTwinInactive { machine_id: String },
    /// 双机优先级不同，均衡器不动作
    BalancerPriorityGuard {
        machine_a: String,
        machine_b: String,
        priority_a: i32,
        priority_b: i32,
    },
    /// 某日跳过均衡
    BalanceDaySkipped {
        day: usize,
        machine_a: String,
        machine_b: String,
        reason: BalanceSkipReason,
    },
    /// 整条分配从 donor 挪到 receiver
    BalanceMoved {
        day: usize,
        donor: String,
        receiver: String,
        key: AllocationKey,
        qty: u64,
    },
    /// 没有任何整条分配能装入挪动额度，保留负荷差
    BalanceResidualSkew {
        day: usize,
        donor: String,
        receiver: String,
        donor_load: u64,
        receiver_load: u64,
        desired_move: u64,
    },
}

impl PlanningEvent {
    /// 事件类型标识
    pub fn kind(&self) -> &str {
        match self {
            PlanningEvent::NoEligibleMachine { .. } => "NoEligibleMachine",
            PlanningEvent::Shortage { .. } => "Shortage",
            PlanningEvent::BalancerTwinMissing { .. } => "BalancerTwinMissing",
            PlanningEvent::BalancerTwinInactive { .. } => "BalancerTwinInactive",
            PlanningEvent::BalancerPriorityGuard { .. } => "BalancerPriorityGuard",
            PlanningEvent::BalanceDaySkipped { .. } => "BalanceDaySkipped",
            PlanningEvent::BalanceMoved { .. } => "BalanceMoved",
            PlanningEvent::BalanceResidualSkew { .. } => "BalanceResidualSkew",
        }
    }

    fn trace(&self) {
        match self {
            PlanningEvent::NoEligibleMachine { day, batch_key } => {
                warn!(day, batch = %batch_key, "无可用机台，批次当日跳过");
            }
            PlanningEvent::Shortage { batch_key, remaining } => {
                warn!(batch = %batch_key, remaining, "视野内产能不足，批次存在缺口");
            }
            PlanningEvent::BalancerTwinMissing { machine_id } => {
                info!(machine_id = %machine_id, "双机均衡: 机台不存在，跳过");
            }
            PlanningEvent::BalancerTwinInactive { machine_id } => {
                info!(machine_id = %machine_id, "双机均衡: 机台已停用，跳过");
            }
            PlanningEvent::BalancerPriorityGuard {
                machine_a,
                machine_b,
                priority_a,
                priority_b,
            } => {
                info!(
                    machine_a = %machine_a,
                    machine_b = %machine_b,
                    priority_a,
                    priority_b,
                    "双机均衡: 优先级不同，跳过"
                );
            }
            PlanningEvent::BalanceDaySkipped { day, reason, .. } => {
                debug!(day, reason = reason.as_str(), "双机均衡: 当日跳过");
            }
            PlanningEvent::BalanceMoved {
                day,
                donor,
                receiver,
                key,
                qty,
            } => {
                info!(day, donor = %donor, receiver = %receiver, key = %key, qty, "双机均衡: 整条挪动");
            }
            PlanningEvent::BalanceResidualSkew {
                day,
                donor_load,
                receiver_load,
                desired_move,
                ..
            } => {
                debug!(
                    day,
                    donor_load, receiver_load, desired_move, "双机均衡: 无可整条挪动的分配，保留负荷差"
                );
            }
        }
    }
}

// ==========================================
// PlanningEventLog - 事件日志（按记录顺序）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningEventLog {
    events: Vec<PlanningEvent>,
}

impl PlanningEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录事件（同时输出 tracing 日志）
    pub fn record(&mut self, event: PlanningEvent) {
        event.trace();
        self.events.push(event);
    }

    pub fn events(&self) -> &[PlanningEvent] {
        &self.events
    }

    /// 按类型统计事件数量
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    /// 合并另一个日志（保持顺序）
    pub fn extend(&mut self, other: PlanningEventLog) {
        self.events.extend(other.events);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProductClass;

    #[test]
    fn test_event_log_keeps_order_and_counts() {
        let mut log = PlanningEventLog::new();
        let batch = ProductClass::new("ПП", "Соевый соус", "F1");
        log.record(PlanningEvent::NoEligibleMachine {
            day: 0,
            batch_key: batch.clone(),
        });
        log.record(PlanningEvent::Shortage {
            batch_key: batch,
            remaining: 20,
        });
        log.record(PlanningEvent::BalancerTwinMissing {
            machine_id: "soy_pp_2".to_string(),
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[0].kind(), "NoEligibleMachine");
        assert_eq!(log.count("Shortage"), 1);
        assert_eq!(log.count("BalanceMoved"), 0);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = PlanningEvent::BalanceDaySkipped {
            day: 1,
            machine_a: "soy_pp_1".to_string(),
            machine_b: "soy_pp_2".to_string(),
            reason: BalanceSkipReason::AlreadyBalanced,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"BalanceDaySkipped\""));
        assert!(json.contains("AlreadyBalanced"));
    }
}
