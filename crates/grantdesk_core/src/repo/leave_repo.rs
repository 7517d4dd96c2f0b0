//! Leave repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist annual balances and leave requests.
//! - Run request approval (insert + balance deduction) and cancellation
//!   (status flip + refund) as single transactions.
//!
//! # Invariants
//! - Balance deduction uses a guarded UPDATE; an exhausted balance aborts
//!   the transaction instead of going negative.
//! - Cancellation refunds exactly the request's `deducted_days`.

use super::{
    date_to_db, ensure_migrated, parse_db_date, parse_db_uuid, RepoError, RepoResult,
    TableRequirement,
};
use crate::model::leave::{
    LeaveBalance, LeaveKind, LeaveRequest, LeaveRequestId, LeaveStatus,
};
use crate::model::staffing::EmployeeId;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const REQUEST_SELECT_SQL: &str = "SELECT
    uuid,
    employee_uuid,
    kind,
    start_date,
    end_date,
    deducted_days,
    status
FROM leave_requests";

/// Repository interface for leave accounting.
pub trait LeaveRepository {
    fn get_balance(&self, employee_uuid: EmployeeId, year: i32)
        -> RepoResult<Option<LeaveBalance>>;
    /// Creates or replaces the balance row for `(employee, year)`.
    fn upsert_balance(&self, balance: &LeaveBalance) -> RepoResult<()>;
    /// Whether a non-cancelled request of this employee overlaps the window.
    fn has_overlapping_request(
        &self,
        employee_uuid: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<bool>;
    /// Inserts the request and deducts its days from the start-year balance
    /// in one transaction.
    fn insert_request_and_deduct(&self, request: &LeaveRequest) -> RepoResult<()>;
    fn get_request(&self, id: LeaveRequestId) -> RepoResult<Option<LeaveRequest>>;
    fn list_requests(&self, employee_uuid: EmployeeId) -> RepoResult<Vec<LeaveRequest>>;
    /// Cancels an approved request and refunds its deduction in one
    /// transaction. Already-cancelled requests yield `Conflict`.
    fn cancel_request_and_refund(&self, id: LeaveRequestId) -> RepoResult<()>;
}

/// SQLite-backed leave repository.
pub struct SqliteLeaveRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLeaveRepository<'conn> {
    /// Binds to a migrated connection; rejects unmigrated schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(
            conn,
            &[
                TableRequirement {
                    table: "leave_balances",
                    columns: &["employee_uuid", "year", "total_days", "used_days"],
                },
                TableRequirement {
                    table: "leave_requests",
                    columns: &[
                        "uuid",
                        "employee_uuid",
                        "kind",
                        "start_date",
                        "end_date",
                        "deducted_days",
                        "status",
                    ],
                },
            ],
        )?;
        Ok(Self { conn })
    }
}

impl LeaveRepository for SqliteLeaveRepository<'_> {
    fn get_balance(
        &self,
        employee_uuid: EmployeeId,
        year: i32,
    ) -> RepoResult<Option<LeaveBalance>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_uuid, year, total_days, used_days
             FROM leave_balances
             WHERE employee_uuid = ?1 AND year = ?2;",
        )?;
        let mut rows = stmt.query(params![employee_uuid.to_string(), year])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let uuid_text: String = row.get("employee_uuid")?;
        Ok(Some(LeaveBalance {
            employee_uuid: parse_db_uuid(&uuid_text, "leave_balances", "employee_uuid")?,
            year: row.get("year")?,
            total_days: row.get("total_days")?,
            used_days: row.get("used_days")?,
        }))
    }

    fn upsert_balance(&self, balance: &LeaveBalance) -> RepoResult<()> {
        balance.validate()?;

        self.conn.execute(
            "INSERT INTO leave_balances (employee_uuid, year, total_days, used_days)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (employee_uuid, year) DO UPDATE SET
                total_days = excluded.total_days,
                used_days = excluded.used_days;",
            params![
                balance.employee_uuid.to_string(),
                balance.year,
                balance.total_days,
                balance.used_days,
            ],
        )?;

        Ok(())
    }

    fn has_overlapping_request(
        &self,
        employee_uuid: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM leave_requests
                WHERE employee_uuid = ?1
                  AND status != 'cancelled'
                  AND start_date <= ?3
                  AND end_date >= ?2
            );",
            params![employee_uuid.to_string(), date_to_db(start), date_to_db(end)],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_request_and_deduct(&self, request: &LeaveRequest) -> RepoResult<()> {
        request.validate()?;

        let year = year_of(request.start_date);
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO leave_requests (
                uuid,
                employee_uuid,
                kind,
                start_date,
                end_date,
                deducted_days,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                request.uuid.to_string(),
                request.employee_uuid.to_string(),
                request.kind.as_db(),
                date_to_db(request.start_date),
                date_to_db(request.end_date),
                request.deducted_days,
                request.status.as_db(),
            ],
        )?;

        // Guarded deduction: zero rows changed means the balance row is
        // missing or cannot absorb the deduction; abort via rollback-on-drop.
        let changed = tx.execute(
            "UPDATE leave_balances
             SET used_days = used_days + ?1
             WHERE employee_uuid = ?2
               AND year = ?3
               AND used_days + ?1 <= total_days;",
            params![
                request.deducted_days,
                request.employee_uuid.to_string(),
                year,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::Conflict {
                entity: "leave_balance",
                id: request.employee_uuid,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn get_request(&self, id: LeaveRequestId) -> RepoResult<Option<LeaveRequest>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REQUEST_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_request_row(row)?));
        }
        Ok(None)
    }

    fn list_requests(&self, employee_uuid: EmployeeId) -> RepoResult<Vec<LeaveRequest>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REQUEST_SELECT_SQL}
             WHERE employee_uuid = ?1
             ORDER BY start_date ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([employee_uuid.to_string()])?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(parse_request_row(row)?);
        }
        Ok(requests)
    }

    fn cancel_request_and_refund(&self, id: LeaveRequestId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let Some(request) = ({
            let mut stmt = tx.prepare(&format!("{REQUEST_SELECT_SQL} WHERE uuid = ?1;"))?;
            let mut rows = stmt.query([id.to_string()])?;
            match rows.next()? {
                Some(row) => Some(parse_request_row(row)?),
                None => None,
            }
        }) else {
            return Err(RepoError::NotFound {
                entity: "leave_request",
                id,
            });
        };

        // Status guard keeps a double cancel from refunding twice.
        let changed = tx.execute(
            "UPDATE leave_requests
             SET
                status = 'cancelled',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND status = 'approved';",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::Conflict {
                entity: "leave_request",
                id,
            });
        }

        tx.execute(
            "UPDATE leave_balances
             SET used_days = MAX(0, used_days - ?1)
             WHERE employee_uuid = ?2
               AND year = ?3;",
            params![
                request.deducted_days,
                request.employee_uuid.to_string(),
                year_of(request.start_date),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }
}

fn year_of(date: NaiveDate) -> i32 {
    use chrono::Datelike;
    date.year()
}

fn parse_request_row(row: &Row<'_>) -> RepoResult<LeaveRequest> {
    let uuid_text: String = row.get("uuid")?;
    let employee_text: String = row.get("employee_uuid")?;
    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    let kind_text: String = row.get("kind")?;
    let kind = LeaveKind::parse_db(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in leave_requests.kind"))
    })?;

    let status_text: String = row.get("status")?;
    let status = LeaveStatus::parse_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in leave_requests.status"
        ))
    })?;

    let request = LeaveRequest {
        uuid: parse_db_uuid(&uuid_text, "leave_requests", "uuid")?,
        employee_uuid: parse_db_uuid(&employee_text, "leave_requests", "employee_uuid")?,
        kind,
        start_date: parse_db_date(&start_text, "leave_requests", "start_date")?,
        end_date: parse_db_date(&end_text, "leave_requests", "end_date")?,
        deducted_days: row.get("deducted_days")?,
        status,
    };
    request.validate()?;
    Ok(request)
}
