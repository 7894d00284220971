// ==========================================
// 机台排产系统 - 领域类型定义
// ==========================================
// 职责: 产品类别、台账复合键
// 红线: 所有键类型必须全序 (Ord)，排产结果不得依赖哈希迭代顺序
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 产品类别 (Product Class)
// ==========================================
// 三元组 (类型, 品类, 配方)，同一类别的需求行合并为一个批次
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductClass {
    pub product_type: String, // 类型 (如 "ПП")
    pub category: String,     // 品类 (如 "Соевый соус")
    pub formula: String,      // 配方
}

impl ProductClass {
    /// 创建产品类别（三个字段均去除首尾空白）
    pub fn new(
        product_type: impl AsRef<str>,
        category: impl AsRef<str>,
        formula: impl AsRef<str>,
    ) -> Self {
        Self {
            product_type: product_type.as_ref().trim().to_string(),
            category: category.as_ref().trim().to_string(),
            formula: formula.as_ref().trim().to_string(),
        }
    }

    pub fn has_formula(&self) -> bool {
        !self.formula.is_empty()
    }
}

impl fmt::Display for ProductClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}||{}||{}", self.product_type, self.category, self.formula)
    }
}

/// 批次键：批次按产品类别精确分组
pub type BatchKey = ProductClass;

// ==========================================
// 机台日键 (day, machine_id)
// ==========================================
// day = 0 表示当天，1 表示 +1 工作日，依此类推
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineDayKey {
    pub day: usize,
    pub machine_id: String,
}

impl MachineDayKey {
    pub fn new(day: usize, machine_id: impl Into<String>) -> Self {
        Self {
            day,
            machine_id: machine_id.into(),
        }
    }
}

impl fmt::Display for MachineDayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}@{}", self.day, self.machine_id)
    }
}

// ==========================================
// 分配键 (batch_key, brand)
// ==========================================
// 均衡时的原子转移单元：同一分配键只能整体挪动，不可拆分
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AllocationKey {
    pub batch_key: BatchKey,
    pub brand: String,
}

impl AllocationKey {
    pub fn new(batch_key: BatchKey, brand: impl Into<String>) -> Self {
        Self {
            batch_key,
            brand: brand.into(),
        }
    }
}

impl fmt::Display for AllocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}##{}", self.batch_key, self.brand)
    }
}
