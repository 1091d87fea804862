//! Prediction and error audit logs.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use crate::store::jsonable::to_jsonable;
use crate::store::{Database, StoreError};

/// One persisted prediction log row.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionLogRow {
    pub id: i64,
    pub created_at: String,
    pub endpoint: String,
    pub requested_by: Option<String>,
    pub employee_id: Option<i64>,
    pub latency_ms: Option<i64>,
    pub status: String,
    pub payload: Value,
    pub output: Value,
}

impl Database {
    /// Insert-or-overwrite the prediction log entry for one employee.
    ///
    /// With an employee id the most recent existing row (highest internal
    /// id) is overwritten in place, keeping its creation timestamp; without
    /// one a new row is always inserted. Returns the persisted row with the
    /// generated id populated.
    #[allow(clippy::too_many_arguments)]
    pub fn upsert_prediction_log(
        &self,
        endpoint: &str,
        requested_by: Option<&str>,
        employee_id: Option<i64>,
        latency_ms: Option<i64>,
        status: &str,
        payload: &Value,
        output: &Value,
    ) -> Result<PredictionLogRow, StoreError> {
        let payload = serde_json::to_string(&to_jsonable(payload))?;
        let output = serde_json::to_string(&to_jsonable(output))?;
        let conn = self.lock()?;

        let existing: Option<i64> = match employee_id {
            Some(id) => conn
                .query_row(
                    "SELECT id FROM prediction_log WHERE employee_id = ?1 \
                     ORDER BY id DESC LIMIT 1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };

        let row_id = match existing {
            Some(row_id) => {
                conn.execute(
                    "UPDATE prediction_log SET endpoint = ?1, requested_by = ?2, \
                     latency_ms = ?3, status = ?4, payload = ?5, output = ?6 \
                     WHERE id = ?7",
                    params![endpoint, requested_by, latency_ms, status, payload, output, row_id],
                )?;
                debug!(row_id, endpoint, "prediction log overwritten");
                row_id
            }
            None => {
                conn.execute(
                    "INSERT INTO prediction_log \
                     (created_at, endpoint, requested_by, employee_id, latency_ms, status, payload, output) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        Utc::now().to_rfc3339(),
                        endpoint,
                        requested_by,
                        employee_id,
                        latency_ms,
                        status,
                        payload,
                        output
                    ],
                )?;
                conn.last_insert_rowid()
            }
        };

        fetch_log_row(&conn, row_id)
    }

    /// Most recent prediction log row for an employee, if any.
    pub fn latest_prediction_log(
        &self,
        employee_id: i64,
    ) -> Result<Option<PredictionLogRow>, StoreError> {
        let conn = self.lock()?;
        let row_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM prediction_log WHERE employee_id = ?1 \
                 ORDER BY id DESC LIMIT 1",
                params![employee_id],
                |row| row.get(0),
            )
            .optional()?;
        match row_id {
            Some(row_id) => fetch_log_row(&conn, row_id).map(Some),
            None => Ok(None),
        }
    }

    /// Append an error log row (no natural key, always inserted).
    pub fn insert_error_log(
        &self,
        endpoint: Option<&str>,
        http_status: Option<i64>,
        error_class: Option<&str>,
        error_message: Option<&str>,
        context: &Value,
    ) -> Result<i64, StoreError> {
        let context = serde_json::to_string(&to_jsonable(context))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO error_log \
             (created_at, endpoint, http_status, error_class, error_message, context) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Utc::now().to_rfc3339(),
                endpoint,
                http_status,
                error_class,
                error_message,
                context
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

fn fetch_log_row(conn: &Connection, row_id: i64) -> Result<PredictionLogRow, StoreError> {
    let (id, created_at, endpoint, requested_by, employee_id, latency_ms, status, payload, output) =
        conn.query_row(
            "SELECT id, created_at, endpoint, requested_by, employee_id, latency_ms, status, \
             payload, output FROM prediction_log WHERE id = ?1",
            params![row_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            },
        )?;

    Ok(PredictionLogRow {
        id,
        created_at,
        endpoint,
        requested_by,
        employee_id,
        latency_ms,
        status,
        payload: serde_json::from_str(&payload)?,
        output: serde_json::from_str(&output)?,
    })
}
