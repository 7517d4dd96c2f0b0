//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must run record `validate()` before SQL mutations.
//! - Repositories refuse to operate on unmigrated connections (`try_new`).
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::ModelError;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod evidence_repo;
pub mod leave_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod staffing_repo;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error shared by all aggregates.
#[derive(Debug)]
pub enum RepoError {
    /// Record-level invariant violated before any write.
    Validation(ModelError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist (or is soft-deleted).
    NotFound { entity: &'static str, id: Uuid },
    /// Guarded multi-step write lost against a concurrent state change.
    Conflict { entity: &'static str, id: Uuid },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict { entity, id } => {
                write!(f, "{entity} changed concurrently: {id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "repository requires column `{column}` in table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for RepoError {
    fn from(value: ModelError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tables and columns one repository depends on.
pub(crate) struct TableRequirement {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// Rejects connections that have not been migrated to the current schema.
pub(crate) fn ensure_migrated(
    conn: &Connection,
    requirements: &[TableRequirement],
) -> RepoResult<()> {
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected = latest_version();
    if actual < expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    for requirement in requirements {
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
        let mut rows = stmt.query([requirement.table])?;
        let mut columns: HashSet<String> = HashSet::new();
        while let Some(row) = rows.next()? {
            columns.insert(row.get(0)?);
        }
        if columns.is_empty() {
            return Err(RepoError::MissingRequiredTable(requirement.table));
        }
        for column in requirement.columns {
            if !columns.contains(*column) {
                return Err(RepoError::MissingRequiredColumn {
                    table: requirement.table,
                    column,
                });
            }
        }
    }

    Ok(())
}

pub(crate) fn date_to_db(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_db_date(
    value: &str,
    table: &'static str,
    column: &'static str,
) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{value}` in {table}.{column}"))
    })
}

pub(crate) fn parse_db_uuid(
    value: &str,
    table: &'static str,
    column: &'static str,
) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid `{value}` in {table}.{column}"))
    })
}

pub(crate) fn parse_db_bool(
    value: i64,
    table: &'static str,
    column: &'static str,
) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {table}.{column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}
