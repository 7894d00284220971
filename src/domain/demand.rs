// ==========================================
// 机台排产系统 - 需求行与批次领域模型
// ==========================================
// 红线: 一条需求行只属于一个批次
// 红线: 批次剩余量 = 成员需求行剩余量之和（任何时刻可重算）
// ==========================================

use crate::domain::types::{BatchKey, ProductClass};
use crate::error::{PlanningError, PlanningResult};
use serde::{Deserialize, Serialize};

// ==========================================
// DemandRecord - 需求输入记录（外部协作方已完成品牌参考补全）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub index: usize,
    pub brand: String,
    pub product_type: String,
    pub category: String,
    pub formula: String,
    pub required_qty: u64,
    pub priority: i32,
}

impl DemandRecord {
    pub fn product_class(&self) -> ProductClass {
        ProductClass::new(&self.product_type, &self.category, &self.formula)
    }
}

// ==========================================
// DemandLine - 需求行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandLine {
    index: usize,
    brand: String,
    product_class: ProductClass,
    required_qty: u64,
    priority: i32,
    remaining: u64,
}

impl DemandLine {
    /// 创建需求行
    ///
    /// # 错误
    /// - 配方为空 → `PlanningError::Data`（指出品牌）
    pub fn new(
        index: usize,
        brand: impl AsRef<str>,
        product_class: ProductClass,
        required_qty: u64,
        priority: i32,
    ) -> PlanningResult<Self> {
        let brand = brand.as_ref().trim().to_string();
        if !product_class.has_formula() {
            return Err(PlanningError::data(
                brand,
                format!("需求行 {} 配方为空，无法排产", index),
            ));
        }

        Ok(Self {
            index,
            brand,
            product_class,
            required_qty,
            priority,
            remaining: required_qty,
        })
    }

    pub fn from_record(record: &DemandRecord) -> PlanningResult<Self> {
        Self::new(
            record.index,
            &record.brand,
            record.product_class(),
            record.required_qty,
            record.priority,
        )
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn product_class(&self) -> &ProductClass {
        &self.product_class
    }

    pub fn required_qty(&self) -> u64 {
        self.required_qty
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn allocated(&self) -> u64 {
        self.required_qty - self.remaining
    }

    /// 消耗至多 `qty`，返回实际消耗量（剩余量单调不增）
    pub fn consume(&mut self, qty: u64) -> u64 {
        let taken = qty.min(self.remaining);
        self.remaining -= taken;
        taken
    }
}

// ==========================================
// Batch - 批次（同一产品类别的需求行集合）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    key: BatchKey,
    priority: i32,
    lines: Vec<DemandLine>,
}

impl Batch {
    pub fn new(key: BatchKey) -> Self {
        Self {
            key,
            priority: 0,
            lines: Vec::new(),
        }
    }

    /// 追加需求行，批次优先级取成员最大值
    pub fn push_line(&mut self, line: DemandLine) {
        if self.lines.is_empty() || line.priority() > self.priority {
            self.priority = line.priority();
        }
        self.lines.push(line);
    }

    pub fn key(&self) -> &BatchKey {
        &self.key
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn lines(&self) -> &[DemandLine] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [DemandLine] {
        &mut self.lines
    }

    pub fn required(&self) -> u64 {
        self.lines.iter().map(DemandLine::required_qty).sum()
    }

    pub fn remaining(&self) -> u64 {
        self.lines.iter().map(DemandLine::remaining).sum()
    }
}

// ==========================================
// BatchSet - 批次集合（保持批次键首次出现顺序）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSet {
    batches: Vec<Batch>,
}

impl BatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, key: &BatchKey) -> Option<usize> {
        self.batches.iter().position(|b| b.key() == key)
    }

    pub fn get(&self, key: &BatchKey) -> Option<&Batch> {
        self.batches.iter().find(|b| b.key() == key)
    }

    /// 取出（不存在时创建）给定键的批次
    pub fn entry(&mut self, key: &BatchKey) -> &mut Batch {
        let pos = match self.position(key) {
            Some(pos) => pos,
            None => {
                self.batches.push(Batch::new(key.clone()));
                self.batches.len() - 1
            }
        };
        &mut self.batches[pos]
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn batch_mut(&mut self, pos: usize) -> Option<&mut Batch> {
        self.batches.get_mut(pos)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// 所有需求行（按原始 index 升序）
    pub fn lines_by_index(&self) -> Vec<&DemandLine> {
        let mut lines: Vec<&DemandLine> = self.batches.iter().flat_map(|b| b.lines()).collect();
        lines.sort_by_key(|l| l.index());
        lines
    }

    pub fn total_required(&self) -> u64 {
        self.batches.iter().map(Batch::required).sum()
    }

    pub fn total_remaining(&self) -> u64 {
        self.batches.iter().map(Batch::remaining).sum()
    }
}
