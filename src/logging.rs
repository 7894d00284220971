// ==========================================
// 机台排产系统 - 日志初始化
// ==========================================
// 默认过滤: 本 crate info，依赖库 warn；RUST_LOG 优先
// 输出格式: MACHINE_PLAN_LOG_FORMAT=json 时输出 JSON 行，否则文本
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FORMAT_ENV: &str = "MACHINE_PLAN_LOG_FORMAT";

const DEFAULT_FILTER: &str = "warn,machine_plan_aps=info";
const TEST_FILTER: &str = "warn,machine_plan_aps=debug";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 解析格式名，未知值按文本处理
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|raw| Self::parse(&raw))
            .unwrap_or(LogFormat::Text)
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 初始化命令行日志
///
/// # 环境变量
/// - RUST_LOG: 覆盖默认过滤，例如 RUST_LOG=machine_plan_aps::engine=trace
/// - MACHINE_PLAN_LOG_FORMAT: text（默认）或 json
pub fn init() {
    let builder = fmt()
        .with_env_filter(env_filter(DEFAULT_FILTER))
        .with_target(true)
        .with_line_number(true);

    let result = match LogFormat::from_env() {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("日志系统已初始化，忽略重复初始化: {}", e);
    }
}

/// 测试用日志（写入测试输出，可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter(TEST_FILTER))
        .with_test_writer()
        .try_init();
}
