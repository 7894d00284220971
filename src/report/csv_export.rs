// ==========================================
// 机台排产系统 - CSV 导出
// ==========================================
// 输出:
// - line_plan_<date>.csv: Index, Brand, Required, M0..MH, Shortage
// - machine_plan_<date>.csv: 台账展开行
// ==========================================

use crate::engine::orchestrator::MachinePlan;
use crate::report::error::{ReportError, ReportResult};
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const MACHINE_PLAN_HEADER: [&str; 9] = [
    "Day",
    "Date",
    "Machine_ID",
    "Machine_Name",
    "Type",
    "Category",
    "Formula",
    "Brand",
    "Qty",
];

/// 导出结果路径
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub line_plan: PathBuf,
    pub machine_plan: PathBuf,
}

pub struct CsvPlanExporter {
    out_dir: PathBuf,
}

impl CsvPlanExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// 导出两张表（输出目录不存在时创建）
    #[instrument(skip(self, plan), fields(run_id = %plan.run_id, out_dir = %self.out_dir.display()))]
    pub fn export(&self, plan: &MachinePlan) -> ReportResult<ExportedFiles> {
        fs::create_dir_all(&self.out_dir).map_err(|e| ReportError::OutputDirError {
            path: self.out_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let date = plan.plan_date.format("%Y-%m-%d");
        let files = ExportedFiles {
            line_plan: self.out_dir.join(format!("line_plan_{}.csv", date)),
            machine_plan: self.out_dir.join(format!("machine_plan_{}.csv", date)),
        };

        self.write_line_plan(plan, &files.line_plan)?;
        self.write_machine_plan(plan, &files.machine_plan)?;

        info!(
            line_plan = %files.line_plan.display(),
            machine_plan = %files.machine_plan.display(),
            "排产结果已导出 CSV"
        );
        Ok(files)
    }

    fn write_line_plan(&self, plan: &MachinePlan, path: &Path) -> ReportResult<()> {
        let mut wtr = Writer::from_path(path)?;

        let mut header = vec!["Index".to_string(), "Brand".to_string(), "Required".to_string()];
        header.extend((0..plan.horizon_days()).map(|day| format!("M{}", day)));
        header.push("Shortage".to_string());
        wtr.write_record(&header)?;

        for row in &plan.line_rows {
            let mut record = vec![
                row.line_index.to_string(),
                row.brand.clone(),
                row.required_qty.to_string(),
            ];
            record.extend(row.day_qty.iter().map(u64::to_string));
            record.push(row.shortage.to_string());
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_machine_plan(&self, plan: &MachinePlan, path: &Path) -> ReportResult<()> {
        let mut wtr = Writer::from_path(path)?;
        wtr.write_record(MACHINE_PLAN_HEADER)?;

        for row in &plan.ledger_rows {
            wtr.write_record([
                row.day.to_string(),
                row.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
                row.machine_id.clone(),
                row.machine_name.clone(),
                row.product_type.clone(),
                row.category.clone(),
                row.formula.clone(),
                row.brand.clone(),
                row.qty.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
