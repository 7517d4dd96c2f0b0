//! Notification domain model.
//!
//! # Responsibility
//! - Define the reminder record produced by date-driven scheduler scans.
//!
//! # Invariants
//! - `(reference_type, reference_uuid, notification_type, scheduled_date)`
//!   is unique; scans rely on it for idempotent insertion.

use super::{ModelError, ModelResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type NotificationId = Uuid;

/// Entity kind a notification points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    SalaryContract,
    Project,
    EvidenceItem,
}

impl ReferenceType {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::SalaryContract => "salary_contract",
            Self::Project => "project",
            Self::EvidenceItem => "evidence_item",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "salary_contract" => Some(Self::SalaryContract),
            "project" => Some(Self::Project),
            "evidence_item" => Some(Self::EvidenceItem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Lead-time reminder ahead of an expiry date.
    ExpiryReminder,
    /// Daily reminder for an item past its due date.
    Overdue,
}

impl NotificationType {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::ExpiryReminder => "expiry_reminder",
            Self::Overdue => "overdue",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "expiry_reminder" => Some(Self::ExpiryReminder),
            "overdue" => Some(Self::Overdue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Normal,
    High,
}

impl NotificationPriority {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Read,
}

impl NotificationStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Read => "read",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "read" => Some(Self::Read),
            _ => None,
        }
    }
}

/// Reminder record created by scheduler scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub uuid: NotificationId,
    pub reference_type: ReferenceType,
    pub reference_uuid: Uuid,
    pub notification_type: NotificationType,
    /// The day the scan produced this reminder.
    pub scheduled_date: NaiveDate,
    pub priority: NotificationPriority,
    pub status: NotificationStatus,
    pub message: String,
}

impl Notification {
    pub fn new(
        reference_type: ReferenceType,
        reference_uuid: Uuid,
        notification_type: NotificationType,
        scheduled_date: NaiveDate,
        priority: NotificationPriority,
        message: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            reference_type,
            reference_uuid,
            notification_type,
            scheduled_date,
            priority,
            status: NotificationStatus::Pending,
            message: message.into(),
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        if self.uuid.is_nil() || self.reference_uuid.is_nil() {
            return Err(ModelError::NilUuid {
                entity: "notification",
            });
        }
        if self.message.trim().is_empty() {
            return Err(ModelError::BlankField {
                entity: "notification",
                field: "message",
            });
        }
        Ok(())
    }
}
