// ==========================================
// 机台排产系统 - 导入层
// ==========================================
// 职责: 外部表格导入（机台、路由、当日计划、品牌参考）
// 支持: Excel, CSV
// ==========================================

pub mod demand_importer;
pub mod error;
pub mod file_parser;
pub mod machine_settings;
pub mod value_parser;

// 重导出核心类型
pub use demand_importer::DemandImporter;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawSheet, UniversalFileParser};
pub use machine_settings::MachineSettingsLoader;
pub use value_parser::{parse_bool, parse_int, parse_list};
