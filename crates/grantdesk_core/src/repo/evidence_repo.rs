//! Evidence repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist expected-spend records derived from period allocations.
//! - Make re-generation idempotent via the `(period, category)` unique index.
//!
//! # Invariants
//! - `insert_if_absent` never duplicates a `(period, category)` pair and
//!   reports whether a row was actually written.

use super::{
    date_to_db, ensure_migrated, parse_db_date, parse_db_uuid, RepoError, RepoResult,
    TableRequirement,
};
use crate::model::evidence::{EvidenceId, EvidenceItem, EvidenceStatus};
use crate::model::project::{BudgetCategory, PeriodId};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const EVIDENCE_SELECT_SQL: &str = "SELECT
    uuid,
    period_uuid,
    category,
    amount,
    due_date,
    status
FROM evidence_items";

/// Repository interface for evidence items.
pub trait EvidenceRepository {
    /// Inserts unless a row already exists for the item's
    /// `(period, category)`; returns whether a row was written.
    fn insert_if_absent(&self, item: &EvidenceItem) -> RepoResult<bool>;
    fn list_by_period(&self, period_uuid: PeriodId) -> RepoResult<Vec<EvidenceItem>>;
    /// Planned items whose due date is strictly before `today`.
    fn list_overdue(&self, today: NaiveDate) -> RepoResult<Vec<EvidenceItem>>;
    fn mark_spent(&self, id: EvidenceId) -> RepoResult<()>;
}

/// SQLite-backed evidence repository.
pub struct SqliteEvidenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEvidenceRepository<'conn> {
    /// Binds to a migrated connection; rejects unmigrated schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(
            conn,
            &[TableRequirement {
                table: "evidence_items",
                columns: &["uuid", "period_uuid", "category", "amount", "due_date", "status"],
            }],
        )?;
        Ok(Self { conn })
    }
}

impl EvidenceRepository for SqliteEvidenceRepository<'_> {
    fn insert_if_absent(&self, item: &EvidenceItem) -> RepoResult<bool> {
        item.validate()?;

        let changed = self.conn.execute(
            "INSERT INTO evidence_items (
                uuid,
                period_uuid,
                category,
                amount,
                due_date,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (period_uuid, category) DO NOTHING;",
            params![
                item.uuid.to_string(),
                item.period_uuid.to_string(),
                item.category.as_db(),
                item.amount,
                date_to_db(item.due_date),
                item.status.as_db(),
            ],
        )?;

        Ok(changed == 1)
    }

    fn list_by_period(&self, period_uuid: PeriodId) -> RepoResult<Vec<EvidenceItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVIDENCE_SELECT_SQL}
             WHERE period_uuid = ?1
             ORDER BY category ASC;"
        ))?;
        let mut rows = stmt.query([period_uuid.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_evidence_row(row)?);
        }
        Ok(items)
    }

    fn list_overdue(&self, today: NaiveDate) -> RepoResult<Vec<EvidenceItem>> {
        let mut stmt = self.conn.prepare(&format!(
            "{EVIDENCE_SELECT_SQL}
             WHERE status = 'planned'
               AND due_date < ?1
             ORDER BY due_date ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([date_to_db(today)])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_evidence_row(row)?);
        }
        Ok(items)
    }

    fn mark_spent(&self, id: EvidenceId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE evidence_items
             SET
                status = 'spent',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "evidence_item",
                id,
            });
        }

        Ok(())
    }
}

fn parse_evidence_row(row: &Row<'_>) -> RepoResult<EvidenceItem> {
    let uuid_text: String = row.get("uuid")?;
    let period_text: String = row.get("period_uuid")?;
    let due_text: String = row.get("due_date")?;

    let category_text: String = row.get("category")?;
    let category = BudgetCategory::parse_db(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in evidence_items.category"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = EvidenceStatus::parse_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in evidence_items.status"
        ))
    })?;

    let item = EvidenceItem {
        uuid: parse_db_uuid(&uuid_text, "evidence_items", "uuid")?,
        period_uuid: parse_db_uuid(&period_text, "evidence_items", "period_uuid")?,
        category,
        amount: row.get("amount")?,
        due_date: parse_db_date(&due_text, "evidence_items", "due_date")?,
        status,
    };
    item.validate()?;
    Ok(item)
}
