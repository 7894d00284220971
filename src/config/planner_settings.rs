// ==========================================
// 机台排产系统 - 排产参数
// ==========================================
// 职责: 一次排产使用的不可变参数（读取自配置并校验）
// ==========================================

use crate::config::config_manager::defaults;
use crate::config::planner_config_trait::PlannerConfigReader;
use crate::engine::balancer::TwinBalanceRule;
use crate::error::{PlanningError, PlanningResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_SOURCE: &str = "config_kv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerSettings {
    pub max_shift_days: usize,
    pub horizon_working_days: usize,
    pub twin_balance_rules: Vec<TwinBalanceRule>,
    pub notify_max_message_len: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            max_shift_days: defaults::MAX_SHIFT_DAYS,
            horizon_working_days: defaults::HORIZON_WORKING_DAYS,
            twin_balance_rules: vec![TwinBalanceRule::soy_sauce_pp()],
            notify_max_message_len: defaults::NOTIFY_MAX_MESSAGE_LEN,
        }
    }
}

impl PlannerSettings {
    /// 从配置读取器加载并校验
    ///
    /// # 错误
    /// - 读取失败或参数不合法 → `PlanningError::Configuration`
    pub async fn load<C>(config: &C) -> PlanningResult<Self>
    where
        C: PlannerConfigReader + ?Sized,
    {
        let read_err = |e: Box<dyn std::error::Error + Send + Sync>| {
            PlanningError::configuration(CONFIG_SOURCE, e.to_string())
        };

        let settings = Self {
            max_shift_days: config.get_max_shift_days().await.map_err(read_err)?,
            horizon_working_days: config.get_horizon_working_days().await.map_err(read_err)?,
            twin_balance_rules: config.get_twin_balance_rules().await.map_err(read_err)?,
            notify_max_message_len: config.get_notify_max_message_len().await.map_err(read_err)?,
        };
        settings.validate()?;

        debug!(?settings, "排产参数加载完成");
        Ok(settings)
    }

    /// 视野天数 H+1
    pub fn horizon_days(&self) -> usize {
        self.max_shift_days + 1
    }

    pub fn validate(&self) -> PlanningResult<()> {
        if self.horizon_working_days < self.horizon_days() {
            return Err(PlanningError::configuration(
                CONFIG_SOURCE,
                format!(
                    "horizon_working_days={} 小于视野天数 max_shift_days+1={}",
                    self.horizon_working_days,
                    self.horizon_days()
                ),
            ));
        }
        if self.notify_max_message_len == 0 {
            return Err(PlanningError::configuration(
                CONFIG_SOURCE,
                "notify_max_message_len 必须大于 0",
            ));
        }
        for rule in &self.twin_balance_rules {
            if rule.machine_a.trim().is_empty()
                || rule.machine_b.trim().is_empty()
                || rule.machine_a == rule.machine_b
            {
                return Err(PlanningError::configuration(
                    CONFIG_SOURCE,
                    format!(
                        "双机均衡规则无效: {} / {}",
                        rule.machine_a, rule.machine_b
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        let settings = PlannerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.horizon_days(), 3);
    }

    #[test]
    fn test_calendar_shorter_than_horizon_rejected() {
        let settings = PlannerSettings {
            max_shift_days: 5,
            horizon_working_days: 5,
            ..PlannerSettings::default()
        };
        assert!(settings.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_twin_rule_with_same_machine_rejected() {
        let settings = PlannerSettings {
            twin_balance_rules: vec![TwinBalanceRule::new("m1", "m1", Default::default())],
            ..PlannerSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
