// ==========================================
// 机台排产系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (scope_id + key → value)
// ==========================================

use crate::config::planner_config_trait::{ConfigReadResult, PlannerConfigReader};
use crate::db::open_sqlite_connection;
use crate::engine::balancer::TwinBalanceRule;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（config_kv 表不存在时自动创建）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigReadResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    fn ensure_table(&self) -> ConfigReadResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
                scope_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigReadResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigReadResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigReadResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 解析非负整数配置，格式错误时回落默认值
    fn get_usize_or_default(&self, key: &str, default: usize) -> ConfigReadResult<usize> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<usize>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!(config_key = key, raw_value = %value, default, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }
}

// ==========================================
// PlannerConfigReader Trait 实现
// ==========================================
#[async_trait]
impl PlannerConfigReader for ConfigManager {
    async fn get_max_shift_days(&self) -> ConfigReadResult<usize> {
        self.get_usize_or_default(config_keys::MAX_SHIFT_DAYS, defaults::MAX_SHIFT_DAYS)
    }

    async fn get_horizon_working_days(&self) -> ConfigReadResult<usize> {
        self.get_usize_or_default(
            config_keys::HORIZON_WORKING_DAYS,
            defaults::HORIZON_WORKING_DAYS,
        )
    }

    async fn get_twin_balance_rules(&self) -> ConfigReadResult<Vec<TwinBalanceRule>> {
        let Some(value) = self.get_config_value(config_keys::TWIN_BALANCE_RULES)? else {
            return Ok(vec![TwinBalanceRule::soy_sauce_pp()]);
        };
        let rules: Vec<TwinBalanceRule> = serde_json::from_str(&value).unwrap_or_else(|e| {
            warn!(
                config_key = config_keys::TWIN_BALANCE_RULES,
                raw_value = %value,
                error = %e,
                "双机均衡规则格式错误，使用默认规则"
            );
            vec![TwinBalanceRule::soy_sauce_pp()]
        });
        Ok(rules)
    }

    async fn get_notify_max_message_len(&self) -> ConfigReadResult<usize> {
        self.get_usize_or_default(
            config_keys::NOTIFY_MAX_MESSAGE_LEN,
            defaults::NOTIFY_MAX_MESSAGE_LEN,
        )
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 视野
    pub const MAX_SHIFT_DAYS: &str = "max_shift_days";
    pub const HORIZON_WORKING_DAYS: &str = "horizon_working_days";

    // 双机均衡 (JSON 数组)
    pub const TWIN_BALANCE_RULES: &str = "twin_balance_rules";

    // 通知
    pub const NOTIFY_MAX_MESSAGE_LEN: &str = "notify_max_message_len";
}

pub mod defaults {
    pub const MAX_SHIFT_DAYS: usize = 2;
    pub const HORIZON_WORKING_DAYS: usize = 5;
    pub const NOTIFY_MAX_MESSAGE_LEN: usize = 4000;
}
