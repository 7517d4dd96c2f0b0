//! Leave domain model: annual balances and working-day-based requests.
//!
//! # Responsibility
//! - Define leave requests whose deduction is expressed in working days,
//!   not calendar days.
//!
//! # Invariants
//! - Half-day and quarter-day requests cover exactly one calendar date.
//! - `deducted_days` is fixed at approval time and refunded on cancel.

use super::{require_non_negative, require_range, ModelError, ModelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type LeaveRequestId = Uuid;

/// Granularity of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveKind {
    /// One or more calendar days; deducts the working-day count in range.
    FullDay,
    /// Single date; deducts 0.5 days.
    HalfDay,
    /// Single date; deducts 0.25 days.
    QuarterDay,
}

impl LeaveKind {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::FullDay => "full_day",
            Self::HalfDay => "half_day",
            Self::QuarterDay => "quarter_day",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "full_day" => Some(Self::FullDay),
            "half_day" => Some(Self::HalfDay),
            "quarter_day" => Some(Self::QuarterDay),
            _ => None,
        }
    }

    /// Whether this kind must cover exactly one calendar date.
    pub fn is_single_day(self) -> bool {
        matches!(self, Self::HalfDay | Self::QuarterDay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    Approved,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "approved" => Some(Self::Approved),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Approved (or later cancelled) leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub uuid: LeaveRequestId,
    pub employee_uuid: Uuid,
    pub kind: LeaveKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Balance deduction in days (0.25 granularity).
    pub deducted_days: f64,
    pub status: LeaveStatus,
}

impl LeaveRequest {
    pub fn new(
        employee_uuid: Uuid,
        kind: LeaveKind,
        start_date: NaiveDate,
        end_date: NaiveDate,
        deducted_days: f64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            employee_uuid,
            kind,
            start_date,
            end_date,
            deducted_days,
            status: LeaveStatus::Approved,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() || self.employee_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "leave_request",
            });
        }
        require_range("leave_request", self.start_date, self.end_date)?;
        if self.deducted_days < 0.0 {
            return Err(ModelError::NegativeAmount {
                entity: "leave_request",
                field: "deducted_days",
                value: self.deducted_days as i64,
            });
        }
        Ok(())
    }
}

/// Annual leave balance for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBalance {
    pub employee_uuid: Uuid,
    pub year: i32,
    pub total_days: f64,
    pub used_days: f64,
}

impl LeaveBalance {
    pub fn new(employee_uuid: Uuid, year: i32, total_days: f64) -> Self {
        Self {
            employee_uuid,
            year,
            total_days,
            used_days: 0.0,
        }
    }

    pub fn remaining(&self) -> f64 {
        self.total_days - self.used_days
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.employee_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "leave_balance",
            });
        }
        require_non_negative("leave_balance", "total_days", self.total_days as i64)?;
        Ok(())
    }
}
