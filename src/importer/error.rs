// ==========================================
// 机台排产系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 机台/路由来源的错误 → 配置错误；计划/品牌参考来源的错误 → 数据错误
// ==========================================

use crate::error::PlanningError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构错误 =====
    #[error("缺少必需列: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("表为空: {0}")]
    EmptySheet(String),

    // ===== 数据错误 =====
    #[error("类型转换失败 (行 {row}, 字段 {field}, 值 '{value}')")]
    TypeConversionError {
        row: usize,
        field: String,
        value: String,
        brand: Option<String>,
    },

    #[error("以下品牌在品牌参考中找不到配方: {}", .brands.join(", "))]
    MissingFormula { brands: Vec<String> },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 转换为配置错误（机台表 / 路由表）
    pub fn into_configuration(self, source_name: &str) -> PlanningError {
        PlanningError::configuration(source_name, self.to_string())
    }

    /// 转换为数据错误（计划 / 品牌参考），尽量保留问题品牌
    pub fn into_data(self, source_name: &str) -> PlanningError {
        let brand = match &self {
            ImportError::TypeConversionError {
                brand: Some(brand), ..
            } => brand.clone(),
            ImportError::MissingFormula { brands } => brands.join(", "),
            _ => String::new(),
        };
        PlanningError::data(brand, format!("[{}] {}", source_name, self))
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_all() {
        let err = ImportError::MissingColumns {
            columns: vec!["Priority".to_string(), "Active".to_string()],
        };
        assert_eq!(err.to_string(), "缺少必需列: Priority, Active");
        assert!(err.into_configuration("machines.csv").is_configuration());
    }

    #[test]
    fn test_into_data_keeps_brand() {
        let err = ImportError::TypeConversionError {
            row: 3,
            field: "ПЛАН".to_string(),
            value: "abc".to_string(),
            brand: Some("Sen Soy".to_string()),
        };
        match err.into_data("plan.csv") {
            PlanningError::Data { brand, message } => {
                assert_eq!(brand, "Sen Soy");
                assert!(message.contains("plan.csv"));
                assert!(message.contains("ПЛАН"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
