//! SQLite database for TestForge scripts and results

use crate::types::{
    ExecutionResult, GeneratedScript, ResolvedResult, ResultStats, StatusCounts, TestKind,
    TestStatus,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const SCRIPT_COLUMNS: &str = "id, name, description, language, code, created_at";

const RESULT_COLUMNS: &str =
    "r.id, r.script_id, r.status, r.test_type, r.execution_time, r.output, r.error_message, r.created_at";

/// Database wrapper for script and result persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;

        // Enable WAL mode for better concurrency
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Generated test scripts (append-only)
            CREATE TABLE IF NOT EXISTS test_scripts (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                language TEXT NOT NULL,
                code TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- Execution results (append-only). script_id is not a foreign key:
            -- scripts removed by hand leave their results behind.
            CREATE TABLE IF NOT EXISTS test_results (
                id TEXT PRIMARY KEY,
                script_id TEXT NOT NULL,
                status TEXT NOT NULL,
                test_type TEXT NOT NULL,
                execution_time REAL NOT NULL DEFAULT 0,
                output TEXT NOT NULL,
                error_message TEXT,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_test_results_script ON test_results(script_id);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    // ========================================================================
    // Scripts
    // ========================================================================

    /// Insert a generated script
    pub fn insert_script(&self, script: &GeneratedScript) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO test_scripts (id, name, description, language, code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                script.id,
                script.name,
                script.description,
                script.language.as_str(),
                script.code,
                script.created_at.timestamp_millis(),
            ],
        )?;

        debug!("Inserted test script with id {}", script.id);
        Ok(())
    }

    /// Get a script by ID
    pub fn get_script(&self, id: &str) -> Result<Option<GeneratedScript>> {
        let conn = self.conn.lock();

        let raw = conn
            .query_row(
                &format!("SELECT {} FROM test_scripts WHERE id = ?1", SCRIPT_COLUMNS),
                params![id],
                |row| RawScript::from_row(row, 0),
            )
            .optional()?;

        raw.map(RawScript::parse).transpose()
    }

    /// List all scripts, newest first
    pub fn list_scripts(&self) -> Result<Vec<GeneratedScript>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM test_scripts ORDER BY created_at DESC, rowid DESC",
            SCRIPT_COLUMNS
        ))?;

        let rows = stmt.query_map([], |row| RawScript::from_row(row, 0))?;

        let mut scripts = Vec::new();
        for row in rows {
            scripts.push(row?.parse()?);
        }

        Ok(scripts)
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Append an execution result
    pub fn insert_result(&self, result: &ExecutionResult) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO test_results
                (id, script_id, status, test_type, execution_time, output, error_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                result.id,
                result.script_id,
                result.status.as_str(),
                result.test_type.as_str(),
                result.execution_time,
                result.output,
                result.error_message,
                result.created_at.timestamp_millis(),
            ],
        )?;

        debug!(
            "Inserted test result {} for script {} ({})",
            result.id, result.script_id, result.status
        );
        Ok(())
    }

    /// List all results with their scripts resolved, newest first
    pub fn list_results(&self) -> Result<Vec<ResolvedResult>> {
        self.query_resolved(None)
    }

    /// List results for one script, newest first
    pub fn list_results_for_script(&self, script_id: &str) -> Result<Vec<ResolvedResult>> {
        self.query_resolved(Some(script_id))
    }

    fn query_resolved(&self, script_id: Option<&str>) -> Result<Vec<ResolvedResult>> {
        let conn = self.conn.lock();

        let script_columns = SCRIPT_COLUMNS
            .split(", ")
            .map(|c| format!("s.{}", c))
            .collect::<Vec<_>>()
            .join(", ");
        let filter = if script_id.is_some() {
            "WHERE r.script_id = ?1"
        } else {
            ""
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {} FROM test_results r
             LEFT JOIN test_scripts s ON s.id = r.script_id
             {}
             ORDER BY r.created_at DESC, r.rowid DESC",
            RESULT_COLUMNS, script_columns, filter
        ))?;

        let map_row = |row: &Row<'_>| -> rusqlite::Result<(RawResult, Option<RawScript>)> {
            let result = RawResult::from_row(row)?;
            let script_id: Option<String> = row.get(8)?;
            let script = match script_id {
                Some(_) => Some(RawScript::from_row(row, 8)?),
                None => None,
            };
            Ok((result, script))
        };

        let rows = match script_id {
            Some(id) => stmt.query_map(params![id], map_row)?.collect::<Vec<_>>(),
            None => stmt.query_map([], map_row)?.collect::<Vec<_>>(),
        };

        let mut results = Vec::new();
        for row in rows {
            let (result, script) = row?;
            results.push(ResolvedResult {
                result: result.parse()?,
                script: script.map(RawScript::parse).transpose()?,
            });
        }

        Ok(results)
    }

    /// Aggregate pass/fail counts per test kind
    pub fn result_stats(&self) -> Result<ResultStats> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT test_type, status, COUNT(*), COALESCE(SUM(execution_time), 0.0)
             FROM test_results GROUP BY test_type, status",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        let mut unit = StatusCounts::default();
        let mut regression = StatusCounts::default();
        let mut total_time = 0.0;

        for row in rows {
            let (kind, status, count, time) = row?;
            let status: TestStatus = status.parse()?;
            let count = count.max(0) as u64;
            match kind.parse::<TestKind>()? {
                TestKind::Unit => unit.add(status, count),
                TestKind::Regression => regression.add(status, count),
            }
            total_time += time;
        }

        let total = unit.total + regression.total;
        let average_execution_time = if total == 0 {
            0.0
        } else {
            total_time / total as f64
        };

        Ok(ResultStats {
            total,
            passed: unit.passed + regression.passed,
            failed: unit.failed + regression.failed,
            unit_tests: unit,
            regression_tests: regression,
            average_execution_time,
        })
    }
}

fn parse_timestamp(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Internal(format!("invalid stored timestamp {}", millis)))
}

/// Raw script row before parsing
struct RawScript {
    id: String,
    name: String,
    description: String,
    language: String,
    code: String,
    created_at: i64,
}

impl RawScript {
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            description: row.get(offset + 2)?,
            language: row.get(offset + 3)?,
            code: row.get(offset + 4)?,
            created_at: row.get(offset + 5)?,
        })
    }

    fn parse(self) -> Result<GeneratedScript> {
        Ok(GeneratedScript {
            id: self.id,
            name: self.name,
            description: self.description,
            language: self.language.parse()?,
            code: self.code,
            created_at: parse_timestamp(self.created_at)?,
        })
    }
}

/// Raw result row before parsing
struct RawResult {
    id: String,
    script_id: String,
    status: String,
    test_type: String,
    execution_time: f64,
    output: String,
    error_message: Option<String>,
    created_at: i64,
}

impl RawResult {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            script_id: row.get(1)?,
            status: row.get(2)?,
            test_type: row.get(3)?,
            execution_time: row.get(4)?,
            output: row.get(5)?,
            error_message: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn parse(self) -> Result<ExecutionResult> {
        Ok(ExecutionResult {
            id: self.id,
            script_id: self.script_id,
            status: self.status.parse()?,
            test_type: self.test_type.parse()?,
            execution_time: self.execution_time,
            output: self.output,
            error_message: self.error_message,
            created_at: parse_timestamp(self.created_at)?,
        })
    }
}
