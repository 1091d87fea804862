//! SQLite persistence: prediction/error audit logs and the read-only
//! employee features mart.

pub mod employees;
pub mod jsonable;
pub mod logs;

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

pub use employees::EmployeeFeatures;
pub use logs::PredictionLogRow;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("database lock poisoned")]
    Poisoned,
    #[error("stored payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle over the service database.
///
/// Every operation is a short-lived unit of work on the shared connection;
/// no transaction is held across calls.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (creating if needed) the database file and bootstrap the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            ",
        )?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        info!(path = %path.display(), "database schema ready");
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS prediction_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                requested_by TEXT,
                employee_id INTEGER,
                latency_ms INTEGER,
                status TEXT NOT NULL DEFAULT 'OK',
                payload TEXT NOT NULL,
                output TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_prediction_log_employee_id
                ON prediction_log(employee_id);
            CREATE TABLE IF NOT EXISTS error_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TEXT NOT NULL,
                endpoint TEXT,
                http_status INTEGER,
                error_class TEXT,
                error_message TEXT,
                context TEXT NOT NULL DEFAULT '{}'
            );
            CREATE TABLE IF NOT EXISTS employee_features (
                id_employee INTEGER PRIMARY KEY,
                a_quitte_l_entreprise TEXT,
                age REAL,
                nombre_experiences_precedentes REAL,
                annees_dans_le_poste_actuel REAL,
                satisfaction_employee_environnement REAL,
                note_evaluation_precedente REAL,
                niveau_hierarchique_poste REAL,
                satisfaction_employee_nature_travail REAL,
                satisfaction_employee_equipe REAL,
                satisfaction_employee_equilibre_pro_perso REAL,
                note_evaluation_actuelle REAL,
                augementation_salaire_precedente REAL,
                nombre_participation_pee REAL,
                nb_formations_suivies REAL,
                distance_domicile_travail REAL,
                niveau_education REAL,
                annees_depuis_la_derniere_promotion REAL,
                annes_sous_responsable_actuel REAL,
                anciennete_log REAL,
                annee_experience_totale_log REAL,
                genre TEXT,
                statut_marital TEXT,
                departement TEXT,
                poste TEXT,
                heure_supplementaires TEXT,
                domaine_etude TEXT,
                frequence_deplacement TEXT
            );
            ",
        )?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_bootstrap_is_idempotent() {
        let db = Database::in_memory().unwrap();
        db.init_schema().unwrap();

        let conn = db.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN \
                 ('prediction_log', 'error_log', 'employee_features')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
