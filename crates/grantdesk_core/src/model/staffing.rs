//! Staffing domain model: employees, project members, salary contracts.
//!
//! # Responsibility
//! - Define participation records audited by the participation validator.
//! - Provide the interval-overlap predicates shared by validator checks.
//!
//! # Invariants
//! - A member's participation window is inclusive on both ends.
//! - A stored `participation_rate` above 100 is legal at write time; the
//!   validator reports it instead of the repository rejecting it.

use super::{require_non_negative, require_range, ModelError, ModelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EmployeeId = Uuid;
pub type MemberId = Uuid;
pub type ContractId = Uuid;

/// Minimal employee record referenced by members, contracts and leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub uuid: EmployeeId,
    pub name: String,
    pub email: Option<String>,
}

impl Employee {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            email: None,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() {
            return Err(ModelError::NilUuid { entity: "employee" });
        }
        if self.name.trim().is_empty() {
            return Err(ModelError::BlankField {
                entity: "employee",
                field: "name",
            });
        }
        Ok(())
    }
}

/// Participation record binding one employee to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub uuid: MemberId,
    pub project_uuid: Uuid,
    pub employee_uuid: EmployeeId,
    /// Percent of full-time committed to this project (nominal 0-100).
    pub participation_rate: u32,
    /// Declared monthly participation pay in currency units.
    pub monthly_amount: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_deleted: bool,
}

impl ProjectMember {
    pub fn new(
        project_uuid: Uuid,
        employee_uuid: EmployeeId,
        participation_rate: u32,
        monthly_amount: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            project_uuid,
            employee_uuid,
            participation_rate,
            monthly_amount,
            start_date,
            end_date,
            is_deleted: false,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() || self.project_uuid.is_nil() || self.employee_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "project_member",
            });
        }
        require_range("project_member", self.start_date, self.end_date)?;
        require_non_negative("project_member", "monthly_amount", self.monthly_amount)?;
        Ok(())
    }

    /// Inclusive interval overlap with another member's window.
    pub fn overlaps(&self, other: &ProjectMember) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}

/// Employment contract used as the reference amount for participation pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryContract {
    pub uuid: ContractId,
    pub employee_uuid: EmployeeId,
    pub annual_salary: i64,
    pub start_date: NaiveDate,
    /// `None` means open-ended.
    pub end_date: Option<NaiveDate>,
}

impl SalaryContract {
    pub fn new(
        employee_uuid: EmployeeId,
        annual_salary: i64,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            employee_uuid,
            annual_salary,
            start_date,
            end_date,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() || self.employee_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "salary_contract",
            });
        }
        require_non_negative("salary_contract", "annual_salary", self.annual_salary)?;
        if let Some(end) = self.end_date {
            require_range("salary_contract", self.start_date, end)?;
        }
        Ok(())
    }

    /// Whether this contract's validity intersects the inclusive window
    /// `[start, end]`. Open-ended contracts intersect every window starting
    /// before or at their own start's horizon.
    pub fn covers_window(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date.map_or(true, |ce| ce >= start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn member_overlap_is_inclusive_on_boundaries() {
        let project = Uuid::new_v4();
        let employee = Uuid::new_v4();
        let first = ProjectMember::new(
            project,
            employee,
            50,
            0,
            date(2024, 1, 1),
            date(2024, 6, 30),
        );
        let second = ProjectMember::new(
            project,
            employee,
            50,
            0,
            date(2024, 6, 30),
            date(2024, 12, 31),
        );
        assert!(first.overlaps(&second));
        assert!(second.overlaps(&first));

        let disjoint = ProjectMember::new(
            project,
            employee,
            50,
            0,
            date(2024, 7, 1),
            date(2024, 12, 31),
        );
        assert!(!first.overlaps(&disjoint));
    }

    #[test]
    fn contract_window_intersection() {
        let employee = Uuid::new_v4();
        let bounded = SalaryContract::new(
            employee,
            48_000_000,
            date(2024, 7, 1),
            Some(date(2024, 12, 31)),
        );
        // Member window ends before the contract starts.
        assert!(!bounded.covers_window(date(2024, 1, 1), date(2024, 6, 30)));
        assert!(bounded.covers_window(date(2024, 6, 30), date(2024, 7, 1)));

        let open_ended = SalaryContract::new(employee, 48_000_000, date(2020, 1, 1), None);
        assert!(open_ended.covers_window(date(2024, 1, 1), date(2024, 12, 31)));
    }
}
