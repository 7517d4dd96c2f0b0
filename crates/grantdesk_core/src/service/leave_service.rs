//! Leave request use-cases.
//!
//! # Responsibility
//! - Validate leave requests against the work calendar, duplicates and
//!   balances before any write.
//! - Approve (insert + deduct) and cancel (flip + refund) atomically.
//!
//! # Invariants
//! - Full-day requests deduct the working-day count in range, never the raw
//!   calendar span.
//! - Half/quarter-day requests cover one date and are rejected outright when
//!   that date is non-working.
//! - All checks run before the transaction; a failed check writes nothing.

use crate::calendar::WorkCalendar;
use crate::model::leave::{LeaveKind, LeaveRequest, LeaveRequestId};
use crate::model::staffing::EmployeeId;
use crate::repo::leave_repo::LeaveRepository;
use crate::repo::RepoError;
use chrono::{Datelike, NaiveDate};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input for one leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLeave {
    pub employee_uuid: EmployeeId,
    pub kind: LeaveKind,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Errors from leave use-cases.
#[derive(Debug)]
pub enum LeaveServiceError {
    /// End date earlier than start date.
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    /// Half/quarter-day request spans more than one date.
    SingleDayKindSpansRange { kind: LeaveKind },
    /// Single-day request targets a weekend day or holiday.
    NonWorkingDay(NaiveDate),
    /// Full-day range contains no working day to deduct.
    NoWorkingDays { start: NaiveDate, end: NaiveDate },
    /// A non-cancelled request already overlaps the window.
    DuplicateRequest { start: NaiveDate, end: NaiveDate },
    /// No balance row exists for the employee and year.
    BalanceNotFound { employee_uuid: EmployeeId, year: i32 },
    /// Remaining balance cannot absorb the deduction.
    InsufficientBalance { requested: f64, remaining: f64 },
    /// Target request does not exist.
    RequestNotFound(LeaveRequestId),
    /// Cancel on an already-cancelled request.
    AlreadyCancelled(LeaveRequestId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for LeaveServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDateRange { start, end } => {
                write!(f, "leave end date ({end}) must be >= start date ({start})")
            }
            Self::SingleDayKindSpansRange { kind } => {
                write!(f, "{} leave must cover exactly one date", kind.as_db())
            }
            Self::NonWorkingDay(date) => {
                write!(f, "leave date {date} is a weekend day or holiday")
            }
            Self::NoWorkingDays { start, end } => {
                write!(f, "no working days between {start} and {end}")
            }
            Self::DuplicateRequest { start, end } => {
                write!(f, "an existing leave request overlaps {start}..{end}")
            }
            Self::BalanceNotFound {
                employee_uuid,
                year,
            } => write!(f, "no leave balance for employee {employee_uuid} in {year}"),
            Self::InsufficientBalance {
                requested,
                remaining,
            } => write!(
                f,
                "leave balance insufficient: requested {requested} days, {remaining} remaining"
            ),
            Self::RequestNotFound(id) => write!(f, "leave request not found: {id}"),
            Self::AlreadyCancelled(id) => {
                write!(f, "leave request already cancelled: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LeaveServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LeaveServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Leave accounting facade.
pub struct LeaveService<R: LeaveRepository> {
    repo: R,
    calendar: WorkCalendar,
}

impl<R: LeaveRepository> LeaveService<R> {
    pub fn new(repo: R, calendar: WorkCalendar) -> Self {
        Self { repo, calendar }
    }

    /// Validates and approves one leave request.
    ///
    /// # Contract
    /// - Every check runs before any write; a rejection leaves the store
    ///   untouched.
    /// - On success the request row and the balance deduction commit in one
    ///   transaction.
    pub fn request_leave(&self, input: &RequestLeave) -> Result<LeaveRequest, LeaveServiceError> {
        if input.end_date < input.start_date {
            return Err(LeaveServiceError::InvalidDateRange {
                start: input.start_date,
                end: input.end_date,
            });
        }
        if input.kind.is_single_day() && input.start_date != input.end_date {
            return Err(LeaveServiceError::SingleDayKindSpansRange { kind: input.kind });
        }

        let deducted_days = match input.kind {
            LeaveKind::FullDay => {
                let days = self
                    .calendar
                    .working_days(input.start_date, input.end_date);
                if days == 0 {
                    return Err(LeaveServiceError::NoWorkingDays {
                        start: input.start_date,
                        end: input.end_date,
                    });
                }
                f64::from(days)
            }
            LeaveKind::HalfDay | LeaveKind::QuarterDay => {
                if self.calendar.is_non_working(input.start_date) {
                    return Err(LeaveServiceError::NonWorkingDay(input.start_date));
                }
                if input.kind == LeaveKind::HalfDay {
                    0.5
                } else {
                    0.25
                }
            }
        };

        if self
            .repo
            .has_overlapping_request(input.employee_uuid, input.start_date, input.end_date)?
        {
            return Err(LeaveServiceError::DuplicateRequest {
                start: input.start_date,
                end: input.end_date,
            });
        }

        let year = input.start_date.year();
        let balance = self
            .repo
            .get_balance(input.employee_uuid, year)?
            .ok_or(LeaveServiceError::BalanceNotFound {
                employee_uuid: input.employee_uuid,
                year,
            })?;
        if balance.remaining() < deducted_days {
            return Err(LeaveServiceError::InsufficientBalance {
                requested: deducted_days,
                remaining: balance.remaining(),
            });
        }

        let request = LeaveRequest::new(
            input.employee_uuid,
            input.kind,
            input.start_date,
            input.end_date,
            deducted_days,
        );
        match self.repo.insert_request_and_deduct(&request) {
            Ok(()) => {}
            // The guarded deduction lost against a concurrent approval.
            Err(RepoError::Conflict { .. }) => {
                return Err(LeaveServiceError::InsufficientBalance {
                    requested: deducted_days,
                    remaining: balance.remaining(),
                });
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=leave_request module=leave status=ok employee={} kind={} days={}",
            input.employee_uuid,
            input.kind.as_db(),
            deducted_days
        );

        Ok(request)
    }

    /// Cancels an approved request and refunds its deduction.
    pub fn cancel_leave(&self, id: LeaveRequestId) -> Result<(), LeaveServiceError> {
        match self.repo.cancel_request_and_refund(id) {
            Ok(()) => {
                info!("event=leave_cancel module=leave status=ok request={id}");
                Ok(())
            }
            Err(RepoError::NotFound { .. }) => Err(LeaveServiceError::RequestNotFound(id)),
            Err(RepoError::Conflict { .. }) => Err(LeaveServiceError::AlreadyCancelled(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Lists an employee's requests, newest windows last.
    pub fn list_requests(
        &self,
        employee_uuid: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, LeaveServiceError> {
        Ok(self.repo.list_requests(employee_uuid)?)
    }
}
