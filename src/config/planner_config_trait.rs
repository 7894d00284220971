// ==========================================
// 机台排产系统 - 排产配置读取 Trait
// ==========================================
// 职责: 定义排产所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::engine::balancer::TwinBalanceRule;
use async_trait::async_trait;
use std::error::Error;

pub type ConfigReadResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// PlannerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait PlannerConfigReader: Send + Sync {
    // ===== 视野配置 =====

    /// 允许顺延的工作日数 H（视野 = H+1 天）
    ///
    /// # 默认值
    /// - 2
    async fn get_max_shift_days(&self) -> ConfigReadResult<usize>;

    /// 工作日历长度
    ///
    /// # 默认值
    /// - 5
    async fn get_horizon_working_days(&self) -> ConfigReadResult<usize>;

    // ===== 均衡配置 =====

    /// 双机均衡规则列表（JSON 数组）
    ///
    /// # 默认值
    /// - soy_pp_1 / soy_pp_2，类型 ПП，品类包含 "соев"
    async fn get_twin_balance_rules(&self) -> ConfigReadResult<Vec<TwinBalanceRule>>;

    // ===== 通知配置 =====

    /// 单条通知消息最大长度
    ///
    /// # 默认值
    /// - 4000
    async fn get_notify_max_message_len(&self) -> ConfigReadResult<usize>;
}
