//! Domain model for R&D project administration.
//!
//! # Responsibility
//! - Define canonical, validated records for projects, budgets, staffing,
//!   evidence, leave and notifications.
//! - Keep write-path invariants in one place (`validate()` per record).
//!
//! # Invariants
//! - Every persisted record is identified by a stable UUID.
//! - Date ranges are inclusive and must satisfy `end >= start` where both
//!   ends are fixed.
//! - Deletion of projects and members is represented by soft-delete
//!   tombstones, not hard delete.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod evidence;
pub mod leave;
pub mod notification;
pub mod project;
pub mod staffing;

pub use project::BudgetCategory;

pub type ModelResult<T> = Result<T, ModelError>;

/// Validation error shared by all domain records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Nil UUID supplied for a record identity.
    NilUuid { entity: &'static str },
    /// Required text field is blank after trim.
    BlankField {
        entity: &'static str,
        field: &'static str,
    },
    /// End date earlier than start date.
    InvalidDateRange {
        entity: &'static str,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Currency amount below zero.
    NegativeAmount {
        entity: &'static str,
        field: &'static str,
        value: i64,
    },
    /// Cash plus in-kind does not reconstruct the category amount.
    AllocationSplitMismatch {
        category: BudgetCategory,
        amount: i64,
        cash: i64,
        in_kind: i64,
    },
    /// Same category allocated twice within one period.
    DuplicateAllocationCategory { category: BudgetCategory },
    /// Category amounts drift from the period total beyond rounding tolerance.
    AllocationDrift {
        total: i64,
        allocated: i64,
        tolerance: i64,
    },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid { entity } => write!(f, "{entity} uuid must not be nil"),
            Self::BlankField { entity, field } => {
                write!(f, "{entity}.{field} must not be blank")
            }
            Self::InvalidDateRange { entity, start, end } => {
                write!(f, "{entity} end date ({end}) must be >= start date ({start})")
            }
            Self::NegativeAmount {
                entity,
                field,
                value,
            } => write!(f, "{entity}.{field} must be >= 0, got {value}"),
            Self::AllocationSplitMismatch {
                category,
                amount,
                cash,
                in_kind,
            } => write!(
                f,
                "allocation for {} must satisfy cash ({cash}) + in_kind ({in_kind}) == amount ({amount})",
                category.as_db()
            ),
            Self::DuplicateAllocationCategory { category } => {
                write!(f, "category {} allocated more than once", category.as_db())
            }
            Self::AllocationDrift {
                total,
                allocated,
                tolerance,
            } => write!(
                f,
                "allocated sum {allocated} drifts from period total {total} beyond tolerance {tolerance}"
            ),
        }
    }
}

impl Error for ModelError {}

pub(crate) fn require_range(
    entity: &'static str,
    start: NaiveDate,
    end: NaiveDate,
) -> ModelResult<()> {
    if end < start {
        return Err(ModelError::InvalidDateRange { entity, start, end });
    }
    Ok(())
}

pub(crate) fn require_non_negative(
    entity: &'static str,
    field: &'static str,
    value: i64,
) -> ModelResult<()> {
    if value < 0 {
        return Err(ModelError::NegativeAmount {
            entity,
            field,
            value,
        });
    }
    Ok(())
}
