// ==========================================
// 机台排产系统 - 排产结果仓储
// ==========================================
// 职责:
// - 管理 plan_run / plan_line_day / machine_plan_row / error_log
// - 一次排产结果在单个事务内整体写入
// 红线: 致命错误只写 error_log，不写任何计划行
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::plan::{LedgerRow, LineProjectionRow};
use crate::domain::types::ProductClass;
use crate::engine::orchestrator::MachinePlan;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct PlanRunEntity {
    pub run_id: String,
    pub plan_date: String, // YYYY-MM-DD
    pub created_at: String,
    pub horizon_days: usize,
    pub working_days_json: String,
    pub total_required: u64,
    pub total_allocated: u64,
    pub total_shortage: u64,
    pub settings_json: String,
    pub events_json: String,
}

#[derive(Debug, Clone)]
pub struct ErrorLogEntity {
    pub id: i64,
    pub logged_at: String,
    pub source: String,
    pub message: String,
}

pub struct MachinePlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MachinePlanRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS plan_run (
              run_id TEXT PRIMARY KEY,
              plan_date TEXT NOT NULL,
              created_at TEXT NOT NULL,
              horizon_days INTEGER NOT NULL,
              working_days_json TEXT NOT NULL,
              total_required INTEGER NOT NULL,
              total_allocated INTEGER NOT NULL,
              total_shortage INTEGER NOT NULL,
              settings_json TEXT NOT NULL,
              events_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_plan_run_date
              ON plan_run(plan_date, created_at);

            CREATE TABLE IF NOT EXISTS plan_line_day (
              run_id TEXT NOT NULL REFERENCES plan_run(run_id) ON DELETE CASCADE,
              line_index INTEGER NOT NULL,
              day INTEGER NOT NULL,
              brand TEXT NOT NULL,
              product_type TEXT NOT NULL,
              category TEXT NOT NULL,
              formula TEXT NOT NULL,
              required_qty INTEGER NOT NULL,
              qty INTEGER NOT NULL,
              shortage INTEGER NOT NULL,
              PRIMARY KEY (run_id, line_index, day)
            );

            CREATE TABLE IF NOT EXISTS machine_plan_row (
              run_id TEXT NOT NULL REFERENCES plan_run(run_id) ON DELETE CASCADE,
              seq INTEGER NOT NULL,
              day INTEGER NOT NULL,
              plan_date TEXT,
              machine_id TEXT NOT NULL,
              machine_name TEXT NOT NULL,
              product_type TEXT NOT NULL,
              category TEXT NOT NULL,
              formula TEXT NOT NULL,
              brand TEXT NOT NULL,
              qty INTEGER NOT NULL,
              PRIMARY KEY (run_id, seq)
            );

            CREATE INDEX IF NOT EXISTS idx_machine_plan_row_machine_day
              ON machine_plan_row(run_id, machine_id, day);

            CREATE TABLE IF NOT EXISTS error_log (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              logged_at TEXT NOT NULL,
              source TEXT NOT NULL,
              message TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 保存一次排产结果（单事务）
    ///
    /// # 错误
    /// - run_id 重复 → UniqueConstraintViolation（事务回滚，无残留行）
    #[instrument(skip(self, plan), fields(run_id = %plan.run_id, plan_date = %plan.plan_date))]
    pub fn save_plan(&self, plan: &MachinePlan) -> RepositoryResult<()> {
        let working_days: Vec<String> = plan
            .working_days
            .iter()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .collect();
        let working_days_json = serde_json::to_string(&working_days)?;
        let settings_json = serde_json::to_string(&plan.settings)?;
        let events_json = serde_json::to_string(&plan.events)?;

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO plan_run (
              run_id, plan_date, created_at, horizon_days, working_days_json,
              total_required, total_allocated, total_shortage, settings_json, events_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                plan.run_id,
                plan.plan_date.format(DATE_FORMAT).to_string(),
                plan.created_at.format(DATETIME_FORMAT).to_string(),
                plan.horizon_days() as i64,
                working_days_json,
                plan.total_required() as i64,
                plan.total_allocated() as i64,
                plan.total_shortage() as i64,
                settings_json,
                events_json,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO plan_line_day (
                  run_id, line_index, day, brand, product_type, category, formula,
                  required_qty, qty, shortage
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )?;
            for row in &plan.line_rows {
                for (day, qty) in row.day_qty.iter().enumerate() {
                    stmt.execute(params![
                        plan.run_id,
                        row.line_index as i64,
                        day as i64,
                        row.brand,
                        row.product_class.product_type,
                        row.product_class.category,
                        row.product_class.formula,
                        row.required_qty as i64,
                        *qty as i64,
                        row.shortage as i64,
                    ])?;
                }
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO machine_plan_row (
                  run_id, seq, day, plan_date, machine_id, machine_name,
                  product_type, category, formula, brand, qty
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )?;
            for (seq, row) in plan.ledger_rows.iter().enumerate() {
                stmt.execute(params![
                    plan.run_id,
                    seq as i64,
                    row.day as i64,
                    row.date.map(|d| d.format(DATE_FORMAT).to_string()),
                    row.machine_id,
                    row.machine_name,
                    row.product_type,
                    row.category,
                    row.formula,
                    row.brand,
                    row.qty as i64,
                ])?;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        info!(
            line_rows = plan.line_rows.len(),
            ledger_rows = plan.ledger_rows.len(),
            "排产结果已保存"
        );
        Ok(())
    }

    /// 删除一次排产结果（明细级联删除）
    pub fn delete_run(&self, run_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM plan_run WHERE run_id = ?1", params![run_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "plan_run".to_string(),
                id: run_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn find_run(&self, run_id: &str) -> RepositoryResult<Option<PlanRunEntity>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                r#"
                SELECT run_id, plan_date, created_at, horizon_days, working_days_json,
                       total_required, total_allocated, total_shortage, settings_json, events_json
                FROM plan_run WHERE run_id = ?1
                "#,
                params![run_id],
                Self::map_run,
            )
            .optional()?;
        Ok(run)
    }

    /// 指定日期的最近一次排产
    pub fn latest_run_for_date(&self, plan_date: NaiveDate) -> RepositoryResult<Option<PlanRunEntity>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                r#"
                SELECT run_id, plan_date, created_at, horizon_days, working_days_json,
                       total_required, total_allocated, total_shortage, settings_json, events_json
                FROM plan_run
                WHERE plan_date = ?1
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
                "#,
                params![plan_date.format(DATE_FORMAT).to_string()],
                Self::map_run,
            )
            .optional()?;
        Ok(run)
    }

    /// 台账行（保持写入顺序）
    pub fn load_ledger_rows(&self, run_id: &str) -> RepositoryResult<Vec<LedgerRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT day, plan_date, machine_id, machine_name, product_type, category,
                   formula, brand, qty
            FROM machine_plan_row
            WHERE run_id = ?1
            ORDER BY seq
            "#,
        )?;
        let raw = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    LedgerRow {
                        day: 0,
                        date: None,
                        machine_id: row.get(2)?,
                        machine_name: row.get(3)?,
                        product_type: row.get(4)?,
                        category: row.get(5)?,
                        formula: row.get(6)?,
                        brand: row.get(7)?,
                        qty: row.get::<_, i64>(8)? as u64,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(day, date, mut row)| {
                row.day = day as usize;
                row.date = date.as_deref().map(parse_date).transpose()?;
                Ok(row)
            })
            .collect()
    }

    /// 需求行投影（按 line_index 升序，日数量按 day 升序还原）
    pub fn load_line_rows(&self, run_id: &str) -> RepositoryResult<Vec<LineProjectionRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT line_index, day, brand, product_type, category, formula,
                   required_qty, qty, shortage
            FROM plan_line_day
            WHERE run_id = ?1
            ORDER BY line_index, day
            "#,
        )?;
        let mut rows = stmt.query(params![run_id])?;

        let mut result: Vec<LineProjectionRow> = Vec::new();
        while let Some(row) = rows.next()? {
            let line_index = row.get::<_, i64>(0)? as usize;
            let qty = row.get::<_, i64>(7)? as u64;

            match result.last_mut() {
                Some(last) if last.line_index == line_index => last.day_qty.push(qty),
                _ => result.push(LineProjectionRow {
                    line_index,
                    brand: row.get(2)?,
                    product_class: ProductClass::new(
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ),
                    required_qty: row.get::<_, i64>(6)? as u64,
                    day_qty: vec![qty],
                    shortage: row.get::<_, i64>(8)? as u64,
                }),
            }
        }
        debug!(run_id, lines = result.len(), "读取需求行投影");
        Ok(result)
    }

    // ==========================================
    // 错误日志
    // ==========================================

    /// 写入错误日志，返回自增 id
    pub fn log_error(&self, source: &str, message: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO error_log (logged_at, source, message) VALUES (?1, ?2, ?3)",
            params![
                Local::now().naive_local().format(DATETIME_FORMAT).to_string(),
                source,
                message
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 最近的错误日志（新 → 旧）
    pub fn list_errors(&self, limit: usize) -> RepositoryResult<Vec<ErrorLogEntity>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, logged_at, source, message FROM error_log ORDER BY id DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(ErrorLogEntity {
                    id: row.get(0)?,
                    logged_at: row.get(1)?,
                    source: row.get(2)?,
                    message: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlanRunEntity> {
        Ok(PlanRunEntity {
            run_id: row.get(0)?,
            plan_date: row.get(1)?,
            created_at: row.get(2)?,
            horizon_days: row.get::<_, i64>(3)? as usize,
            working_days_json: row.get(4)?,
            total_required: row.get::<_, i64>(5)? as u64,
            total_allocated: row.get::<_, i64>(6)? as u64,
            total_shortage: row.get::<_, i64>(7)? as u64,
            settings_json: row.get(8)?,
            events_json: row.get(9)?,
        })
    }
}

fn parse_date(raw: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| RepositoryError::FieldValueError {
        field: "plan_date".to_string(),
        message: format!("{}: {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> MachinePlanRepository {
        let conn = open_sqlite_connection(":memory:").unwrap();
        MachinePlanRepository::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_error_log_newest_first() {
        let repo = repo();
        repo.log_error("plan.csv", "ПЛАН 非数字").unwrap();
        repo.log_error("machines.csv", "缺少列").unwrap();

        let errors = repo.list_errors(10).unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].source, "machines.csv");
        assert_eq!(repo.list_errors(1).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_run_is_none() {
        let repo = repo();
        assert!(repo.find_run("nope").unwrap().is_none());
        assert!(matches!(
            repo.delete_run("nope"),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
