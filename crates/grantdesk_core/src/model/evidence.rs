//! Spending-evidence domain model.
//!
//! # Responsibility
//! - Define the per-period, per-category expected-spend record derived from
//!   budget allocations.
//!
//! # Invariants
//! - At most one evidence item exists per `(period, category)` pair; the
//!   storage unique index is the idempotency guard for re-generation.

use super::{require_non_negative, BudgetCategory, ModelError, ModelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EvidenceId = Uuid;

/// Evidence lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    /// Generated, spend not yet documented.
    Planned,
    /// Spend documented and closed.
    Spent,
}

impl EvidenceStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Spent => "spent",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "planned" => Some(Self::Planned),
            "spent" => Some(Self::Spent),
            _ => None,
        }
    }
}

/// Expected-spend record for one budget category of one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub uuid: EvidenceId,
    pub period_uuid: Uuid,
    pub category: BudgetCategory,
    pub amount: i64,
    /// Period end plus one calendar month.
    pub due_date: NaiveDate,
    pub status: EvidenceStatus,
}

impl EvidenceItem {
    pub fn new(
        period_uuid: Uuid,
        category: BudgetCategory,
        amount: i64,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            period_uuid,
            category,
            amount,
            due_date,
            status: EvidenceStatus::Planned,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() || self.period_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "evidence_item",
            });
        }
        require_non_negative("evidence_item", "amount", self.amount)?;
        Ok(())
    }
}
