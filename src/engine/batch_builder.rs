// ==========================================
// 机台排产系统 - 批次构建
// ==========================================
// 职责: 按产品类别 (类型, 品类, 配方) 精确分组需求行
// 红线: 批次按首次出现顺序排列，批次内需求行保持输入顺序
// ==========================================

use crate::domain::demand::{BatchSet, DemandLine, DemandRecord};
use crate::error::PlanningResult;
use tracing::{debug, instrument};

pub struct BatchBuilder;

impl BatchBuilder {
    /// 构建批次集合
    ///
    /// # 错误
    /// - 任一需求行配方为空 → `PlanningError::Data`
    #[instrument(skip(records), fields(records_count = records.len()))]
    pub fn build(records: &[DemandRecord]) -> PlanningResult<BatchSet> {
        let mut set = BatchSet::new();
        for record in records {
            let line = DemandLine::from_record(record)?;
            let key = line.product_class().clone();
            set.entry(&key).push_line(line);
        }

        debug!(batches = set.len(), "批次构建完成");
        Ok(set)
    }
}
