//! Date-driven notification scans.
//!
//! # Responsibility
//! - Produce expiry reminders at fixed lead times for salary contracts and
//!   project end dates.
//! - Produce daily overdue reminders for planned evidence past its due date.
//!
//! # Invariants
//! - Scans are batch operations triggered on demand; there is no timer loop.
//! - Re-running a scan for the same day never duplicates a reminder; the
//!   storage dedup key also covers concurrent batch invocations.

use crate::model::notification::{
    Notification, NotificationPriority, NotificationType, ReferenceType,
};
use crate::repo::evidence_repo::EvidenceRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::staffing_repo::StaffingRepository;
use crate::repo::RepoError;
use chrono::{Days, NaiveDate};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Days ahead of an expiry date at which reminders fire.
pub const EXPIRY_LEAD_DAYS: [u64; 4] = [90, 60, 30, 7];

/// Outcome of one scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Reminders written by this run.
    pub created: u32,
    /// Matches already covered by an existing reminder.
    pub deduplicated: u32,
}

/// Errors from notification use-cases.
#[derive(Debug)]
pub enum NotificationServiceError {
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for NotificationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotificationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for NotificationServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Scheduler facade over the entity sources and the notification store.
pub struct NotificationService<P, S, E, N>
where
    P: ProjectRepository,
    S: StaffingRepository,
    E: EvidenceRepository,
    N: NotificationRepository,
{
    projects: P,
    staffing: S,
    evidence: E,
    notifications: N,
}

impl<P, S, E, N> NotificationService<P, S, E, N>
where
    P: ProjectRepository,
    S: StaffingRepository,
    E: EvidenceRepository,
    N: NotificationRepository,
{
    pub fn new(projects: P, staffing: S, evidence: E, notifications: N) -> Self {
        Self {
            projects,
            staffing,
            evidence,
            notifications,
        }
    }

    /// Creates lead-time expiry reminders for contracts and projects whose
    /// end date is exactly `today + lead` for one of [`EXPIRY_LEAD_DAYS`].
    pub fn scan_expiries(&self, today: NaiveDate) -> Result<ScanOutcome, NotificationServiceError> {
        let mut outcome = ScanOutcome::default();

        for lead in EXPIRY_LEAD_DAYS {
            let Some(target) = today.checked_add_days(Days::new(lead)) else {
                continue;
            };
            let priority = priority_for_lead(lead);

            for contract in self.staffing.list_contracts_ending_on(target)? {
                let notification = Notification::new(
                    ReferenceType::SalaryContract,
                    contract.uuid,
                    NotificationType::ExpiryReminder,
                    today,
                    priority,
                    format!("salary contract expires in {lead} days ({target})"),
                );
                self.record(&notification, &mut outcome)?;
            }

            for project in self.projects.list_projects_ending_on(target)? {
                let notification = Notification::new(
                    ReferenceType::Project,
                    project.uuid,
                    NotificationType::ExpiryReminder,
                    today,
                    priority,
                    format!("project {} ends in {lead} days ({target})", project.code),
                );
                self.record(&notification, &mut outcome)?;
            }
        }

        info!(
            "event=notify_scan module=notification status=ok scan=expiry created={} deduplicated={}",
            outcome.created, outcome.deduplicated
        );

        Ok(outcome)
    }

    /// Creates one overdue reminder per planned evidence item past due,
    /// at most once per day.
    pub fn scan_overdue(&self, today: NaiveDate) -> Result<ScanOutcome, NotificationServiceError> {
        let mut outcome = ScanOutcome::default();

        for item in self.evidence.list_overdue(today)? {
            let notification = Notification::new(
                ReferenceType::EvidenceItem,
                item.uuid,
                NotificationType::Overdue,
                today,
                NotificationPriority::High,
                format!(
                    "{} evidence of {} was due {}",
                    item.category.label_ko(),
                    item.amount,
                    item.due_date
                ),
            );
            self.record(&notification, &mut outcome)?;
        }

        info!(
            "event=notify_scan module=notification status=ok scan=overdue created={} deduplicated={}",
            outcome.created, outcome.deduplicated
        );

        Ok(outcome)
    }

    fn record(
        &self,
        notification: &Notification,
        outcome: &mut ScanOutcome,
    ) -> Result<(), NotificationServiceError> {
        if self.notifications.insert_if_absent(notification)? {
            outcome.created += 1;
        } else {
            outcome.deduplicated += 1;
        }
        Ok(())
    }
}

fn priority_for_lead(lead: u64) -> NotificationPriority {
    match lead {
        0..=7 => NotificationPriority::High,
        8..=30 => NotificationPriority::Normal,
        _ => NotificationPriority::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::priority_for_lead;
    use crate::model::notification::NotificationPriority;

    #[test]
    fn lead_time_priorities() {
        assert_eq!(priority_for_lead(7), NotificationPriority::High);
        assert_eq!(priority_for_lead(30), NotificationPriority::Normal);
        assert_eq!(priority_for_lead(60), NotificationPriority::Low);
        assert_eq!(priority_for_lead(90), NotificationPriority::Low);
    }
}
