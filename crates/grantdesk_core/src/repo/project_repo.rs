//! Project and budget-period repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `projects`, `budget_periods` and
//!   `period_allocations`.
//! - Persist a period and its allocations atomically.
//!
//! # Invariants
//! - Write paths call record `validate()` before SQL mutations.
//! - Periods are always loaded together with their allocations.

use super::{
    bool_to_int, date_to_db, ensure_migrated, parse_db_bool, parse_db_date, parse_db_uuid,
    RepoError, RepoResult, TableRequirement,
};
use crate::model::project::{
    BudgetCategory, BudgetPeriod, PeriodAllocation, PeriodId, Project, ProjectId, ProjectStatus,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    uuid,
    code,
    title,
    start_date,
    end_date,
    total_budget,
    status,
    is_deleted
FROM projects";

const PERIOD_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    period_no,
    start_date,
    end_date,
    total_amount
FROM budget_periods";

/// Repository interface for project and budget-period operations.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn update_project(&self, project: &Project) -> RepoResult<()>;
    fn get_project(&self, id: ProjectId, include_deleted: bool) -> RepoResult<Option<Project>>;
    fn list_projects(&self, include_deleted: bool) -> RepoResult<Vec<Project>>;
    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<()>;
    /// Persists one period with its allocations in a single transaction.
    fn create_period(&self, period: &BudgetPeriod) -> RepoResult<PeriodId>;
    fn get_period(&self, id: PeriodId) -> RepoResult<Option<BudgetPeriod>>;
    fn list_periods(&self, project_uuid: ProjectId) -> RepoResult<Vec<BudgetPeriod>>;
    /// Active projects whose end date equals `date` (notification scans).
    fn list_projects_ending_on(&self, date: NaiveDate) -> RepoResult<Vec<Project>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Binds to a migrated connection; rejects unmigrated schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(
            conn,
            &[
                TableRequirement {
                    table: "projects",
                    columns: &[
                        "uuid",
                        "code",
                        "title",
                        "start_date",
                        "end_date",
                        "total_budget",
                        "status",
                        "is_deleted",
                    ],
                },
                TableRequirement {
                    table: "budget_periods",
                    columns: &[
                        "uuid",
                        "project_uuid",
                        "period_no",
                        "start_date",
                        "end_date",
                        "total_amount",
                    ],
                },
                TableRequirement {
                    table: "period_allocations",
                    columns: &["period_uuid", "category", "amount", "cash_amount", "in_kind_amount"],
                },
            ],
        )?;
        Ok(Self { conn })
    }

    fn load_allocations(&self, period_uuid: PeriodId) -> RepoResult<Vec<PeriodAllocation>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, amount, cash_amount, in_kind_amount
             FROM period_allocations
             WHERE period_uuid = ?1
             ORDER BY category ASC;",
        )?;
        let mut rows = stmt.query([period_uuid.to_string()])?;
        let mut allocations = Vec::new();
        while let Some(row) = rows.next()? {
            let category_text: String = row.get("category")?;
            let category = BudgetCategory::parse_db(&category_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid category `{category_text}` in period_allocations.category"
                ))
            })?;
            allocations.push(PeriodAllocation {
                category,
                amount: row.get("amount")?,
                cash_amount: row.get("cash_amount")?,
                in_kind_amount: row.get("in_kind_amount")?,
            });
        }
        Ok(allocations)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;

        self.conn.execute(
            "INSERT INTO projects (
                uuid,
                code,
                title,
                start_date,
                end_date,
                total_budget,
                status,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                project.uuid.to_string(),
                project.code.as_str(),
                project.title.as_str(),
                date_to_db(project.start_date),
                date_to_db(project.end_date),
                project.total_budget,
                project.status.as_db(),
                bool_to_int(project.is_deleted),
            ],
        )?;

        Ok(project.uuid)
    }

    fn update_project(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;

        let changed = self.conn.execute(
            "UPDATE projects
             SET
                code = ?1,
                title = ?2,
                start_date = ?3,
                end_date = ?4,
                total_budget = ?5,
                status = ?6,
                is_deleted = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?8;",
            params![
                project.code.as_str(),
                project.title.as_str(),
                date_to_db(project.start_date),
                date_to_db(project.end_date),
                project.total_budget,
                project.status.as_db(),
                bool_to_int(project.is_deleted),
                project.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id: project.uuid,
            });
        }

        Ok(())
    }

    fn get_project(&self, id: ProjectId, include_deleted: bool) -> RepoResult<Option<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }

        Ok(None)
    }

    fn list_projects(&self, include_deleted: bool) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY code ASC;"
        ))?;
        let mut rows = stmt.query(params![bool_to_int(include_deleted)])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn soft_delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project",
                id,
            });
        }

        Ok(())
    }

    fn create_period(&self, period: &BudgetPeriod) -> RepoResult<PeriodId> {
        period.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO budget_periods (
                uuid,
                project_uuid,
                period_no,
                start_date,
                end_date,
                total_amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                period.uuid.to_string(),
                period.project_uuid.to_string(),
                period.period_no,
                date_to_db(period.start_date),
                date_to_db(period.end_date),
                period.total_amount,
            ],
        )?;
        for allocation in &period.allocations {
            tx.execute(
                "INSERT INTO period_allocations (
                    period_uuid,
                    category,
                    amount,
                    cash_amount,
                    in_kind_amount
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    period.uuid.to_string(),
                    allocation.category.as_db(),
                    allocation.amount,
                    allocation.cash_amount,
                    allocation.in_kind_amount,
                ],
            )?;
        }
        tx.commit()?;

        Ok(period.uuid)
    }

    fn get_period(&self, id: PeriodId) -> RepoResult<Option<BudgetPeriod>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERIOD_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let mut period = parse_period_row(row)?;
        period.allocations = self.load_allocations(period.uuid)?;
        Ok(Some(period))
    }

    fn list_periods(&self, project_uuid: ProjectId) -> RepoResult<Vec<BudgetPeriod>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERIOD_SELECT_SQL}
             WHERE project_uuid = ?1
             ORDER BY period_no ASC;"
        ))?;
        let mut rows = stmt.query([project_uuid.to_string()])?;
        let mut periods = Vec::new();
        while let Some(row) = rows.next()? {
            periods.push(parse_period_row(row)?);
        }
        drop(rows);
        drop(stmt);

        for period in &mut periods {
            period.allocations = self.load_allocations(period.uuid)?;
        }
        Ok(periods)
    }

    fn list_projects_ending_on(&self, date: NaiveDate) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE end_date = ?1
               AND is_deleted = 0
               AND status != 'closed'
             ORDER BY code ASC;"
        ))?;
        let mut rows = stmt.query([date_to_db(date)])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_db_uuid(&uuid_text, "projects", "uuid")?;

    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in projects.status"))
    })?;

    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    let project = Project {
        uuid,
        code: row.get("code")?,
        title: row.get("title")?,
        start_date: parse_db_date(&start_text, "projects", "start_date")?,
        end_date: parse_db_date(&end_text, "projects", "end_date")?,
        total_budget: row.get("total_budget")?,
        status,
        is_deleted: parse_db_bool(row.get("is_deleted")?, "projects", "is_deleted")?,
    };
    project.validate()?;
    Ok(project)
}

fn parse_period_row(row: &Row<'_>) -> RepoResult<BudgetPeriod> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;
    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    Ok(BudgetPeriod {
        uuid: parse_db_uuid(&uuid_text, "budget_periods", "uuid")?,
        project_uuid: parse_db_uuid(&project_text, "budget_periods", "project_uuid")?,
        period_no: row.get("period_no")?,
        start_date: parse_db_date(&start_text, "budget_periods", "start_date")?,
        end_date: parse_db_date(&end_text, "budget_periods", "end_date")?,
        total_amount: row.get("total_amount")?,
        allocations: Vec::new(),
    })
}
