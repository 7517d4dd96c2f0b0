//! Staffing repository: employees, project members, salary contracts.
//!
//! # Responsibility
//! - Provide persistence APIs consumed by the participation validator and
//!   the notification scheduler.
//! - Keep the cross-project membership query inside the repository boundary.
//!
//! # Invariants
//! - Member listings exclude soft-deleted rows unless stated otherwise.
//! - `update_participation_rate` is the only rate write path besides full
//!   member updates (used by the validator's auto-fix).

use super::{
    bool_to_int, date_to_db, ensure_migrated, parse_db_bool, parse_db_date, parse_db_uuid,
    RepoError, RepoResult, TableRequirement,
};
use crate::model::project::ProjectId;
use crate::model::staffing::{
    ContractId, Employee, EmployeeId, MemberId, ProjectMember, SalaryContract,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const MEMBER_SELECT_SQL: &str = "SELECT
    uuid,
    project_uuid,
    employee_uuid,
    participation_rate,
    monthly_amount,
    start_date,
    end_date,
    is_deleted
FROM project_members";

const CONTRACT_SELECT_SQL: &str = "SELECT
    uuid,
    employee_uuid,
    annual_salary,
    start_date,
    end_date
FROM salary_contracts";

/// Repository interface for staffing data.
pub trait StaffingRepository {
    fn create_employee(&self, employee: &Employee) -> RepoResult<EmployeeId>;
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn create_member(&self, member: &ProjectMember) -> RepoResult<MemberId>;
    fn get_member(&self, id: MemberId) -> RepoResult<Option<ProjectMember>>;
    /// Active members of one project.
    fn list_members(&self, project_uuid: ProjectId) -> RepoResult<Vec<ProjectMember>>;
    /// Active membership rows of one employee, excluding one member record.
    ///
    /// Date filtering stays in the validator; this returns all candidates.
    fn list_other_memberships(
        &self,
        employee_uuid: EmployeeId,
        exclude_member: MemberId,
    ) -> RepoResult<Vec<ProjectMember>>;
    /// Direct rate UPDATE used by the validator's auto-fix path.
    fn update_participation_rate(&self, member: MemberId, rate: u32) -> RepoResult<()>;
    fn create_contract(&self, contract: &SalaryContract) -> RepoResult<ContractId>;
    fn list_contracts(&self, employee_uuid: EmployeeId) -> RepoResult<Vec<SalaryContract>>;
    /// Contracts whose fixed end date equals `date` (notification scans).
    fn list_contracts_ending_on(&self, date: NaiveDate) -> RepoResult<Vec<SalaryContract>>;
}

/// SQLite-backed staffing repository.
pub struct SqliteStaffingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStaffingRepository<'conn> {
    /// Binds to a migrated connection; rejects unmigrated schemas.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_migrated(
            conn,
            &[
                TableRequirement {
                    table: "employees",
                    columns: &["uuid", "name", "email"],
                },
                TableRequirement {
                    table: "project_members",
                    columns: &[
                        "uuid",
                        "project_uuid",
                        "employee_uuid",
                        "participation_rate",
                        "monthly_amount",
                        "start_date",
                        "end_date",
                        "is_deleted",
                    ],
                },
                TableRequirement {
                    table: "salary_contracts",
                    columns: &["uuid", "employee_uuid", "annual_salary", "start_date", "end_date"],
                },
            ],
        )?;
        Ok(Self { conn })
    }
}

impl StaffingRepository for SqliteStaffingRepository<'_> {
    fn create_employee(&self, employee: &Employee) -> RepoResult<EmployeeId> {
        employee.validate()?;

        self.conn.execute(
            "INSERT INTO employees (uuid, name, email) VALUES (?1, ?2, ?3);",
            params![
                employee.uuid.to_string(),
                employee.name.as_str(),
                employee.email.as_deref(),
            ],
        )?;

        Ok(employee.uuid)
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name, email FROM employees WHERE uuid = ?1;")?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let uuid_text: String = row.get("uuid")?;
        Ok(Some(Employee {
            uuid: parse_db_uuid(&uuid_text, "employees", "uuid")?,
            name: row.get("name")?,
            email: row.get("email")?,
        }))
    }

    fn create_member(&self, member: &ProjectMember) -> RepoResult<MemberId> {
        member.validate()?;

        self.conn.execute(
            "INSERT INTO project_members (
                uuid,
                project_uuid,
                employee_uuid,
                participation_rate,
                monthly_amount,
                start_date,
                end_date,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                member.uuid.to_string(),
                member.project_uuid.to_string(),
                member.employee_uuid.to_string(),
                member.participation_rate,
                member.monthly_amount,
                date_to_db(member.start_date),
                date_to_db(member.end_date),
                bool_to_int(member.is_deleted),
            ],
        )?;

        Ok(member.uuid)
    }

    fn get_member(&self, id: MemberId) -> RepoResult<Option<ProjectMember>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }
        Ok(None)
    }

    fn list_members(&self, project_uuid: ProjectId) -> RepoResult<Vec<ProjectMember>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL}
             WHERE project_uuid = ?1
               AND is_deleted = 0
             ORDER BY start_date ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_uuid.to_string()])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn list_other_memberships(
        &self,
        employee_uuid: EmployeeId,
        exclude_member: MemberId,
    ) -> RepoResult<Vec<ProjectMember>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBER_SELECT_SQL}
             WHERE employee_uuid = ?1
               AND uuid != ?2
               AND is_deleted = 0
             ORDER BY start_date ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![
            employee_uuid.to_string(),
            exclude_member.to_string()
        ])?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row)?);
        }
        Ok(members)
    }

    fn update_participation_rate(&self, member: MemberId, rate: u32) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE project_members
             SET
                participation_rate = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2
               AND is_deleted = 0;",
            params![rate, member.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "project_member",
                id: member,
            });
        }

        Ok(())
    }

    fn create_contract(&self, contract: &SalaryContract) -> RepoResult<ContractId> {
        contract.validate()?;

        self.conn.execute(
            "INSERT INTO salary_contracts (
                uuid,
                employee_uuid,
                annual_salary,
                start_date,
                end_date
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                contract.uuid.to_string(),
                contract.employee_uuid.to_string(),
                contract.annual_salary,
                date_to_db(contract.start_date),
                contract.end_date.map(date_to_db),
            ],
        )?;

        Ok(contract.uuid)
    }

    fn list_contracts(&self, employee_uuid: EmployeeId) -> RepoResult<Vec<SalaryContract>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTRACT_SELECT_SQL}
             WHERE employee_uuid = ?1
             ORDER BY start_date ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([employee_uuid.to_string()])?;
        let mut contracts = Vec::new();
        while let Some(row) = rows.next()? {
            contracts.push(parse_contract_row(row)?);
        }
        Ok(contracts)
    }

    fn list_contracts_ending_on(&self, date: NaiveDate) -> RepoResult<Vec<SalaryContract>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTRACT_SELECT_SQL}
             WHERE end_date = ?1
             ORDER BY uuid ASC;"
        ))?;
        let mut rows = stmt.query([date_to_db(date)])?;
        let mut contracts = Vec::new();
        while let Some(row) = rows.next()? {
            contracts.push(parse_contract_row(row)?);
        }
        Ok(contracts)
    }
}

fn parse_member_row(row: &Row<'_>) -> RepoResult<ProjectMember> {
    let uuid_text: String = row.get("uuid")?;
    let project_text: String = row.get("project_uuid")?;
    let employee_text: String = row.get("employee_uuid")?;
    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    let member = ProjectMember {
        uuid: parse_db_uuid(&uuid_text, "project_members", "uuid")?,
        project_uuid: parse_db_uuid(&project_text, "project_members", "project_uuid")?,
        employee_uuid: parse_db_uuid(&employee_text, "project_members", "employee_uuid")?,
        participation_rate: row.get("participation_rate")?,
        monthly_amount: row.get("monthly_amount")?,
        start_date: parse_db_date(&start_text, "project_members", "start_date")?,
        end_date: parse_db_date(&end_text, "project_members", "end_date")?,
        is_deleted: parse_db_bool(row.get("is_deleted")?, "project_members", "is_deleted")?,
    };
    member.validate()?;
    Ok(member)
}

fn parse_contract_row(row: &Row<'_>) -> RepoResult<SalaryContract> {
    let uuid_text: String = row.get("uuid")?;
    let employee_text: String = row.get("employee_uuid")?;
    let start_text: String = row.get("start_date")?;
    let end_text: Option<String> = row.get("end_date")?;

    let end_date = match end_text {
        Some(value) => Some(parse_db_date(&value, "salary_contracts", "end_date")?),
        None => None,
    };

    let contract = SalaryContract {
        uuid: parse_db_uuid(&uuid_text, "salary_contracts", "uuid")?,
        employee_uuid: parse_db_uuid(&employee_text, "salary_contracts", "employee_uuid")?,
        annual_salary: row.get("annual_salary")?,
        start_date: parse_db_date(&start_text, "salary_contracts", "start_date")?,
        end_date,
    };
    contract.validate()?;
    Ok(contract)
}
