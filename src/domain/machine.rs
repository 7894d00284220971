// ==========================================
// 机台排产系统 - 机台与路由规则领域模型
// ==========================================
// 红线: 运行期间机台定义不可变
// ==========================================

use crate::domain::types::ProductClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 未配置优先级时的默认值（与机台表/路由表约定一致）
pub const DEFAULT_PRIORITY: i32 = 100;

// ==========================================
// Machine - 生产机台
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub machine_id: String,
    pub name: String,
    pub allowed_categories: BTreeSet<String>, // 空集 = 不限品类
    pub allowed_types: BTreeSet<String>,      // 空集 = 不限类型
    pub daily_capacity: u64,                  // 日产能（箱）
    pub priority: i32,                        // 越小越优先
    pub active: bool,
}

impl Machine {
    /// 创建机台（名称为空时回落为机台ID，过滤空白的品类/类型项）
    pub fn new<I, J, S, T>(
        machine_id: impl AsRef<str>,
        name: impl AsRef<str>,
        categories: I,
        types: J,
        daily_capacity: u64,
        priority: i32,
        active: bool,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let machine_id = machine_id.as_ref().trim().to_string();
        let name = match name.as_ref().trim() {
            "" => machine_id.clone(),
            n => n.to_string(),
        };

        Self {
            machine_id,
            name,
            allowed_categories: normalize_set(categories),
            allowed_types: normalize_set(types),
            daily_capacity,
            priority,
            active,
        }
    }

    /// 能力过滤：机台能否生产给定 (类型, 品类)
    ///
    /// 规则：
    /// - 允许品类非空且品类不在其中 → 否
    /// - 允许类型非空且类型不在其中 → 否
    /// - 需求侧品类/类型为空时不参与过滤
    pub fn can_produce(&self, product_type: &str, category: &str) -> bool {
        let pt = product_type.trim();
        let cat = category.trim();

        if !self.allowed_categories.is_empty() && !cat.is_empty() && !self.allowed_categories.contains(cat)
        {
            return false;
        }
        if !self.allowed_types.is_empty() && !pt.is_empty() && !self.allowed_types.contains(pt) {
            return false;
        }
        true
    }

    pub fn admits(&self, class: &ProductClass) -> bool {
        self.can_produce(&class.product_type, &class.category)
    }
}

fn normalize_set<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ==========================================
// RoutingRule - 路由规则 (产品类别 → 首选机台)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub product_class: ProductClass,
    pub preferred_machine_id: String,
    pub priority: i32,
    pub active: bool,
}

impl RoutingRule {
    pub fn new(
        product_class: ProductClass,
        preferred_machine_id: impl AsRef<str>,
        priority: i32,
        active: bool,
    ) -> Self {
        Self {
            product_class,
            preferred_machine_id: preferred_machine_id.as_ref().trim().to_string(),
            priority,
            active,
        }
    }

    /// 规则是否参与给定产品类别的候选解析（必须启用且精确匹配）
    pub fn applies_to(&self, class: &ProductClass) -> bool {
        self.active && &self.product_class == class
    }
}
