// ==========================================
// 机台排产系统 - 需求导入与品牌参考补全
// ==========================================
// 流程:
// 1) 读取当日计划表（必需列 ПЛАН）
// 2) 关联品牌参考：优先 1С Имя ↔ brand_1c，否则 Бренд ↔ Бренд；同键取第一行
// 3) 参考表非空的 类型/品类/配方/发货日 覆盖计划表的值
// 4) 配方缺失 → 数据错误（列出全部品牌）
// 5) ПЛАН 非数字 → 数据错误；ПЛАН <= 0 的行过滤；过滤后为空 → 数据错误
// 6) 按库存与发货日计算优先级
// ==========================================

use crate::domain::demand::DemandRecord;
use crate::engine::priority::{LinePriorityScorer, LineStockInfo};
use crate::error::{PlanningError, PlanningResult};
use crate::importer::error::ImportError;
use crate::importer::file_parser::{cell, RawSheet, UniversalFileParser};
use crate::importer::value_parser::parse_int;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, instrument};

// ===== 计划表列 =====
pub const PLAN_QTY_COLUMN: &str = "ПЛАН";
pub const PLAN_1C_COLUMN: &str = "1С Имя";
pub const BRAND_COLUMN: &str = "Бренд";
pub const STOCK_COLUMN: &str = "Остаток";
pub const MIN_STOCK_COLUMN: &str = "Мин.Ост";

// ===== 品牌参考列 =====
pub const REF_1C_COLUMN: &str = "brand_1c";
pub const TYPE_COLUMN: &str = "Тип";
pub const CATEGORY_COLUMN: &str = "Категория";
pub const FORMULA_COLUMN: &str = "Рецептура";
pub const SHIPPING_DAYS_COLUMN: &str = "Shipping_Days";

const REFERENCE_COLUMNS: [&str; 6] = [
    REF_1C_COLUMN,
    BRAND_COLUMN,
    TYPE_COLUMN,
    CATEGORY_COLUMN,
    FORMULA_COLUMN,
    SHIPPING_DAYS_COLUMN,
];

/// 参考表覆盖的字段
const CANONICAL_FIELDS: [&str; 4] = [TYPE_COLUMN, CATEGORY_COLUMN, FORMULA_COLUMN, SHIPPING_DAYS_COLUMN];

// ==========================================
// DemandImporter - 需求导入器
// ==========================================
pub struct DemandImporter {
    scorer: LinePriorityScorer,
}

impl DemandImporter {
    pub fn new(plan_date: NaiveDate) -> Self {
        Self {
            scorer: LinePriorityScorer::new(plan_date),
        }
    }

    /// 读取计划表与品牌参考并生成需求记录
    ///
    /// # 错误
    /// - 文件不可读、缺列、缺配方、数量非数字、过滤后为空 → `PlanningError::Data`
    #[instrument(skip_all, fields(plan = %plan_path.display(), brands = %brands_path.display()))]
    pub fn load(&self, plan_path: &Path, brands_path: &Path) -> PlanningResult<Vec<DemandRecord>> {
        let plan_source = plan_path.display().to_string();
        let brands_source = brands_path.display().to_string();

        let plan = UniversalFileParser
            .parse(plan_path)
            .map_err(|e| e.into_data(&plan_source))?;
        let brands = UniversalFileParser
            .parse(brands_path)
            .map_err(|e| e.into_data(&brands_source))?;

        self.enrich(&plan, &brands, &plan_source, &brands_source)
    }

    /// 计划表 + 品牌参考 → 需求记录（index = 过滤后的位置）
    pub fn enrich(
        &self,
        plan: &RawSheet,
        brands: &RawSheet,
        plan_source: &str,
        brands_source: &str,
    ) -> PlanningResult<Vec<DemandRecord>> {
        // 步骤1: 计划表结构检查
        if plan.is_empty() {
            return Err(ImportError::EmptySheet("计划表没有数据行".to_string()).into_data(plan_source));
        }
        plan.require_columns(&[PLAN_QTY_COLUMN])
            .map_err(|e| e.into_data(plan_source))?;

        // 步骤2: 关联键与参考表
        brands
            .require_columns(&REFERENCE_COLUMNS)
            .map_err(|e| e.into_data(brands_source))?;
        let (plan_key_col, ref_key_col) = if plan.has_column(PLAN_1C_COLUMN) {
            (PLAN_1C_COLUMN, REF_1C_COLUMN)
        } else if plan.has_column(BRAND_COLUMN) {
            (BRAND_COLUMN, BRAND_COLUMN)
        } else {
            return Err(ImportError::MissingColumns {
                columns: vec![PLAN_1C_COLUMN.to_string(), BRAND_COLUMN.to_string()],
            }
            .into_data(plan_source));
        };
        let reference = Self::reference_index(brands, ref_key_col);
        debug!(join_key = plan_key_col, reference_keys = reference.len(), "品牌参考索引完成");

        // 步骤3: 覆盖为参考表的规范值
        let enriched: Vec<EnrichedRow> = plan
            .rows
            .iter()
            .map(|row| EnrichedRow::build(row, reference.get(cell(row, plan_key_col).trim()).copied(), plan_key_col))
            .collect();

        // 步骤4: 配方检查（列出全部缺失品牌，去重保持顺序）
        let mut missing: Vec<String> = Vec::new();
        for row in enriched.iter().filter(|r| r.formula.is_empty()) {
            if !missing.contains(&row.brand) {
                missing.push(row.brand.clone());
            }
        }
        if !missing.is_empty() {
            return Err(ImportError::MissingFormula { brands: missing }.into_data(brands_source));
        }

        // 步骤5: 数量解析与过滤
        let has_min_stock = plan.has_column(MIN_STOCK_COLUMN);
        let mut records = Vec::new();
        for (row_idx, row) in enriched.iter().enumerate() {
            let qty = match parse_int(&row.qty_raw) {
                Ok(v) => v.unwrap_or(0),
                Err(_) => {
                    return Err(ImportError::TypeConversionError {
                        row: row_idx + 2,
                        field: PLAN_QTY_COLUMN.to_string(),
                        value: row.qty_raw.clone(),
                        brand: Some(row.brand.clone()),
                    }
                    .into_data(plan_source));
                }
            };
            if qty <= 0 {
                continue;
            }

            // 步骤6: 优先级
            let stock_info = LineStockInfo {
                stock: parse_int(&row.stock_raw).ok().flatten(),
                min_stock: has_min_stock.then(|| parse_int(&row.min_stock_raw).ok().flatten().unwrap_or(0)),
                shipping_days: row.shipping_days.clone(),
            };

            records.push(DemandRecord {
                index: records.len(),
                brand: row.brand.clone(),
                product_type: row.product_type.clone(),
                category: row.category.clone(),
                formula: row.formula.clone(),
                required_qty: qty as u64,
                priority: self.scorer.score(&stock_info),
            });
        }

        if records.is_empty() {
            return Err(PlanningError::data(
                "",
                format!("[{}] 过滤 ПЛАН > 0 后计划为空", plan_source),
            ));
        }

        info!(
            plan_rows = plan.rows.len(),
            demand_lines = records.len(),
            total_qty = records.iter().map(|r| r.required_qty).sum::<u64>(),
            "需求导入完成"
        );
        Ok(records)
    }

    /// 参考表索引：键 → 第一行
    fn reference_index<'s>(brands: &'s RawSheet, key_col: &str) -> BTreeMap<&'s str, &'s HashMap<String, String>> {
        let mut index = BTreeMap::new();
        for row in &brands.rows {
            let key = cell(row, key_col).trim();
            if key.is_empty() {
                continue;
            }
            index.entry(key).or_insert(row);
        }
        index
    }
}

// ==========================================
// EnrichedRow - 补全后的计划行
// ==========================================
struct EnrichedRow {
    brand: String,
    product_type: String,
    category: String,
    formula: String,
    shipping_days: String,
    qty_raw: String,
    stock_raw: String,
    min_stock_raw: String,
}

impl EnrichedRow {
    fn build(
        row: &HashMap<String, String>,
        reference: Option<&HashMap<String, String>>,
        key_col: &str,
    ) -> Self {
        let canonical = |field: &str| -> String {
            reference
                .map(|r| cell(r, field).trim())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| cell(row, field).trim())
                .to_string()
        };
        let [product_type, category, formula, shipping_days] = CANONICAL_FIELDS.map(canonical);

        let brand = match cell(row, BRAND_COLUMN).trim() {
            "" => cell(row, key_col).trim().to_string(),
            b => b.to_string(),
        };

        Self {
            brand,
            product_type,
            category,
            formula,
            shipping_days,
            qty_raw: cell(row, PLAN_QTY_COLUMN).to_string(),
            stock_raw: cell(row, STOCK_COLUMN).to_string(),
            min_stock_raw: cell(row, MIN_STOCK_COLUMN).to_string(),
        }
    }
}
