//! Project and budget-period domain model.
//!
//! # Responsibility
//! - Define the project record that owns budget periods and members.
//! - Define per-period category allocations with cash/in-kind splits.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another project.
//! - `is_deleted` is the source of truth for tombstone state.
//! - Category amounts of one period may drift from its total by at most one
//!   currency unit per allocated category (independent rounding).

use super::{require_non_negative, require_range, ModelError, ModelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a project.
pub type ProjectId = Uuid;

/// Stable identifier for a budget period.
pub type PeriodId = Uuid;

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Contracted but not yet started.
    Planned,
    /// Within the execution window.
    Active,
    /// Final report submitted, no further spending.
    Closed,
}

impl ProjectStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "planned" => Some(Self::Planned),
            "active" => Some(Self::Active),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Budget category of R&D grant spending.
///
/// Wire names are stable snake_case identifiers; the Korean labels are the
/// vocabulary used on generated human-facing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetCategory {
    Personnel,
    Material,
    Activity,
    Indirect,
}

impl BudgetCategory {
    /// All categories in canonical order.
    pub const ALL: [BudgetCategory; 4] = [
        Self::Personnel,
        Self::Material,
        Self::Activity,
        Self::Indirect,
    ];

    pub fn as_db(self) -> &'static str {
        match self {
            Self::Personnel => "personnel",
            Self::Material => "material",
            Self::Activity => "activity",
            Self::Indirect => "indirect",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "personnel" => Some(Self::Personnel),
            "material" => Some(Self::Material),
            "activity" => Some(Self::Activity),
            "indirect" => Some(Self::Indirect),
            _ => None,
        }
    }

    /// Korean ledger label used on evidence and notification records.
    pub fn label_ko(self) -> &'static str {
        match self {
            Self::Personnel => "인건비",
            Self::Material => "재료비",
            Self::Activity => "연구활동비",
            Self::Indirect => "간접비",
        }
    }
}

/// Canonical project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable global ID used for linking and auditing.
    pub uuid: ProjectId,
    /// Agency-assigned project code, unique across the store.
    pub code: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Total contracted budget in currency units.
    pub total_budget: i64,
    pub status: ProjectStatus,
    /// Soft delete tombstone.
    pub is_deleted: bool,
}

impl Project {
    /// Creates a new project with a generated stable ID.
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_budget: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            code: code.into(),
            title: title.into(),
            start_date,
            end_date,
            total_budget,
            status: ProjectStatus::Planned,
            is_deleted: false,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() {
            return Err(ModelError::NilUuid { entity: "project" });
        }
        if self.code.trim().is_empty() {
            return Err(ModelError::BlankField {
                entity: "project",
                field: "code",
            });
        }
        if self.title.trim().is_empty() {
            return Err(ModelError::BlankField {
                entity: "project",
                field: "title",
            });
        }
        require_range("project", self.start_date, self.end_date)?;
        require_non_negative("project", "total_budget", self.total_budget)?;
        Ok(())
    }

    pub fn is_active_record(&self) -> bool {
        !self.is_deleted
    }
}

/// One category's share of a budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAllocation {
    pub category: BudgetCategory,
    /// Category amount; equals `cash_amount + in_kind_amount`.
    pub amount: i64,
    pub cash_amount: i64,
    pub in_kind_amount: i64,
}

impl PeriodAllocation {
    /// Creates an all-cash allocation.
    pub fn cash(category: BudgetCategory, amount: i64) -> Self {
        Self {
            category,
            amount,
            cash_amount: amount,
            in_kind_amount: 0,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        require_non_negative("allocation", "amount", self.amount)?;
        require_non_negative("allocation", "cash_amount", self.cash_amount)?;
        require_non_negative("allocation", "in_kind_amount", self.in_kind_amount)?;
        if self.cash_amount + self.in_kind_amount != self.amount {
            return Err(ModelError::AllocationSplitMismatch {
                category: self.category,
                amount: self.amount,
                cash: self.cash_amount,
                in_kind: self.in_kind_amount,
            });
        }
        Ok(())
    }
}

/// One annual (or otherwise contracted) execution period of a project budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub uuid: PeriodId,
    pub project_uuid: ProjectId,
    /// 1-based sequence number within the project.
    pub period_no: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: i64,
    /// Category splits; at most one entry per category.
    pub allocations: Vec<PeriodAllocation>,
}

impl BudgetPeriod {
    pub fn new(
        project_uuid: ProjectId,
        period_no: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_amount: i64,
        allocations: Vec<PeriodAllocation>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            project_uuid,
            period_no,
            start_date,
            end_date,
            total_amount,
            allocations,
        }
    }

    /// Validates period-level invariants.
    ///
    /// The allocated sum is allowed to miss `total_amount` by at most one
    /// currency unit per allocated category; each category amount is rounded
    /// independently and no reconciliation pass runs afterwards.
    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() || self.project_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "budget_period",
            });
        }
        require_range("budget_period", self.start_date, self.end_date)?;
        require_non_negative("budget_period", "total_amount", self.total_amount)?;

        let mut seen: Vec<BudgetCategory> = Vec::with_capacity(self.allocations.len());
        for allocation in &self.allocations {
            allocation.validate()?;
            if seen.contains(&allocation.category) {
                return Err(ModelError::DuplicateAllocationCategory {
                    category: allocation.category,
                });
            }
            seen.push(allocation.category);
        }

        if !self.allocations.is_empty() {
            let allocated: i64 = self.allocations.iter().map(|a| a.amount).sum();
            let tolerance = self.allocations.len() as i64;
            if (allocated - self.total_amount).abs() > tolerance {
                return Err(ModelError::AllocationDrift {
                    total: self.total_amount,
                    allocated,
                    tolerance,
                });
            }
        }

        Ok(())
    }

    /// Returns the allocation for one category, if present.
    pub fn allocation(&self, category: BudgetCategory) -> Option<&PeriodAllocation> {
        self.allocations.iter().find(|a| a.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn project_validate_rejects_reversed_range() {
        let project = Project::new("P-001", "Sensor R&D", date(2024, 6, 1), date(2024, 1, 1), 0);
        assert!(matches!(
            project.validate(),
            Err(ModelError::InvalidDateRange { entity: "project", .. })
        ));
    }

    #[test]
    fn period_validate_accepts_one_unit_drift_per_category() {
        let project = Uuid::new_v4();
        // 1001 split 33/33/34 rounds to 330+330+340 = 1000.
        let period = BudgetPeriod::new(
            project,
            1,
            date(2024, 1, 1),
            date(2024, 12, 31),
            1001,
            vec![
                PeriodAllocation::cash(BudgetCategory::Personnel, 330),
                PeriodAllocation::cash(BudgetCategory::Material, 330),
                PeriodAllocation::cash(BudgetCategory::Activity, 340),
            ],
        );
        period.validate().unwrap();
    }

    #[test]
    fn period_validate_rejects_drift_beyond_tolerance() {
        let period = BudgetPeriod::new(
            Uuid::new_v4(),
            1,
            date(2024, 1, 1),
            date(2024, 12, 31),
            1000,
            vec![
                PeriodAllocation::cash(BudgetCategory::Personnel, 500),
                PeriodAllocation::cash(BudgetCategory::Material, 490),
            ],
        );
        assert!(matches!(
            period.validate(),
            Err(ModelError::AllocationDrift { total: 1000, allocated: 990, .. })
        ));
    }

    #[test]
    fn allocation_validate_rejects_split_mismatch() {
        let allocation = PeriodAllocation {
            category: BudgetCategory::Personnel,
            amount: 100,
            cash_amount: 70,
            in_kind_amount: 20,
        };
        assert!(matches!(
            allocation.validate(),
            Err(ModelError::AllocationSplitMismatch { amount: 100, cash: 70, in_kind: 20, .. })
        ));
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let period = BudgetPeriod::new(
            Uuid::new_v4(),
            1,
            date(2024, 1, 1),
            date(2024, 12, 31),
            200,
            vec![
                PeriodAllocation::cash(BudgetCategory::Indirect, 100),
                PeriodAllocation::cash(BudgetCategory::Indirect, 100),
            ],
        );
        assert!(matches!(
            period.validate(),
            Err(ModelError::DuplicateAllocationCategory {
                category: BudgetCategory::Indirect
            })
        ));
    }
}
