// ==========================================
// 机台排产系统 - 统一排产错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定:
// - Configuration / Data 为致命错误，整次排产中止，不产生任何输出
// - 缺口 (Shortage)、无可用机台 均不是错误，记录在结果与事件日志中
// ==========================================

use thiserror::Error;

/// 排产错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    /// 机台/路由配置不可读或缺少必需字段
    #[error("配置错误 [{source_name}]: {message}")]
    Configuration {
        source_name: String,
        message: String,
    },

    /// 需求数据不可用（缺配方、数量非数字等），brand 指出问题品牌
    #[error("数据错误 (品牌: {brand}): {message}")]
    Data { brand: String, message: String },
}

impl PlanningError {
    pub fn configuration(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        PlanningError::Configuration {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn data(brand: impl Into<String>, message: impl Into<String>) -> Self {
        PlanningError::Data {
            brand: brand.into(),
            message: message.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PlanningError::Configuration { .. })
    }

    pub fn is_data(&self) -> bool {
        matches!(self, PlanningError::Data { .. })
    }

    /// 出错位置（配置来源名或品牌），写入 error_log.source
    pub fn origin(&self) -> &str {
        match self {
            PlanningError::Configuration { source_name, .. } => source_name,
            PlanningError::Data { brand, .. } => brand,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PlanningError::Configuration { message, .. } | PlanningError::Data { message, .. } => message,
        }
    }
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
