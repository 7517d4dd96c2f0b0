//! Core domain logic for grantdesk.
//! This crate is the single source of truth for business invariants.

pub mod api;
pub mod calendar;
pub mod db;
pub mod docstore;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{ApiError, ApiErrorKind, ApiResponse};
pub use calendar::WorkCalendar;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::evidence::{EvidenceItem, EvidenceStatus};
pub use model::leave::{LeaveBalance, LeaveKind, LeaveRequest, LeaveStatus};
pub use model::notification::{
    Notification, NotificationPriority, NotificationStatus, NotificationType, ReferenceType,
};
pub use model::project::{
    BudgetCategory, BudgetPeriod, PeriodAllocation, Project, ProjectStatus,
};
pub use model::staffing::{Employee, ProjectMember, SalaryContract};
pub use model::{ModelError, ModelResult};
pub use repo::evidence_repo::{EvidenceRepository, SqliteEvidenceRepository};
pub use repo::leave_repo::{LeaveRepository, SqliteLeaveRepository};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::staffing_repo::{SqliteStaffingRepository, StaffingRepository};
pub use repo::{RepoError, RepoResult};
pub use service::budget_service::{
    allocate, AllocationError, BudgetService, BudgetServiceError, PlanPeriodRequest,
};
pub use service::leave_service::{LeaveService, LeaveServiceError, RequestLeave};
pub use service::notification_service::{
    NotificationService, NotificationServiceError, ScanOutcome, EXPIRY_LEAD_DAYS,
};
pub use service::participation_service::{
    audit_member, Finding, FindingDetail, FindingKind, FixHint, FixKind, FixOutcome,
    FixRequest, ParticipationError, ParticipationService, Severity,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
