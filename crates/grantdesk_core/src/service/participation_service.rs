//! Participation-rate audit use-cases.
//!
//! # Responsibility
//! - Audit a project's members against rate bounds, contract coverage,
//!   declared pay and cross-project totals.
//! - Apply reviewed rate adjustments through the repository.
//!
//! # Invariants
//! - Audit checks are pure functions of already-loaded rows and never write.
//! - Findings are advisory; rule violations are data, not errors.
//! - Auto-fix applies participation-rate adjustments only; every other fix
//!   kind is reported as unsupported instead of failing the batch.

use crate::model::project::ProjectId;
use crate::model::staffing::{MemberId, ProjectMember, SalaryContract};
use crate::repo::staffing_repo::StaffingRepository;
use crate::repo::RepoError;
use crate::service::budget_service::round_half_up;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Finding weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Needs review but does not block the project record.
    Warning,
    /// Violates a funding rule.
    Error,
}

/// Machine-readable finding classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    RateOutOfBounds,
    ContractMissing,
    ContractPeriodMismatch,
    AmountMismatch,
    DuplicateParticipation,
}

impl FindingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateOutOfBounds => "rate_out_of_bounds",
            Self::ContractMissing => "contract_missing",
            Self::ContractPeriodMismatch => "contract_period_mismatch",
            Self::AmountMismatch => "amount_mismatch",
            Self::DuplicateParticipation => "duplicate_participation",
        }
    }
}

/// Raw numbers backing one finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindingDetail {
    RateOutOfBounds {
        rate: u32,
    },
    ContractMissing,
    ContractPeriodMismatch {
        contract_count: usize,
    },
    AmountMismatch {
        declared_monthly: i64,
        expected_monthly: i64,
    },
    DuplicateParticipation {
        combined_rate: u32,
        other_members: Vec<MemberId>,
    },
}

impl FindingDetail {
    pub fn kind(&self) -> FindingKind {
        match self {
            Self::RateOutOfBounds { .. } => FindingKind::RateOutOfBounds,
            Self::ContractMissing => FindingKind::ContractMissing,
            Self::ContractPeriodMismatch { .. } => FindingKind::ContractPeriodMismatch,
            Self::AmountMismatch { .. } => FindingKind::AmountMismatch,
            Self::DuplicateParticipation { .. } => FindingKind::DuplicateParticipation,
        }
    }
}

/// Reviewed adjustment the auto-fix path can carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    AdjustParticipationRate,
    AdjustMonthlyAmount,
    ExtendContract,
}

/// Suggested remediation attached to a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixHint {
    pub kind: FixKind,
    pub old_value: i64,
    pub new_value: i64,
}

/// One advisory audit result for one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub member_uuid: MemberId,
    pub message: String,
    pub suggested_fix: Option<FixHint>,
    pub detail: FindingDetail,
}

impl Finding {
    pub fn kind(&self) -> FindingKind {
        self.detail.kind()
    }
}

/// Requested fix application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixRequest {
    pub kind: FixKind,
    pub member_uuid: MemberId,
    pub old_value: i64,
    pub new_value: i64,
}

/// Per-request outcome of an auto-fix batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    Applied {
        member_uuid: MemberId,
        new_rate: u32,
    },
    /// Stored rate no longer matches `old_value`; nothing was written.
    Stale {
        member_uuid: MemberId,
        stored_rate: u32,
    },
    /// Fix kind has no automated write path.
    Unsupported {
        member_uuid: MemberId,
        kind: FixKind,
    },
    MemberNotFound {
        member_uuid: MemberId,
    },
    /// Requested rate outside 0-100.
    InvalidRate {
        member_uuid: MemberId,
        value: i64,
    },
}

/// Errors from participation use-cases.
#[derive(Debug)]
pub enum ParticipationError {
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ParticipationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ParticipationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ParticipationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Participation audit facade.
pub struct ParticipationService<R: StaffingRepository> {
    staffing: R,
}

impl<R: StaffingRepository> ParticipationService<R> {
    pub fn new(staffing: R) -> Self {
        Self { staffing }
    }

    /// Audits every active member of one project.
    ///
    /// Returns the full advisory finding list; an empty list means the
    /// project passed all checks.
    pub fn validate_project(
        &self,
        project_uuid: ProjectId,
    ) -> Result<Vec<Finding>, ParticipationError> {
        let members = self.staffing.list_members(project_uuid)?;

        let mut findings = Vec::new();
        for member in &members {
            let contracts = self.staffing.list_contracts(member.employee_uuid)?;
            let others = self
                .staffing
                .list_other_memberships(member.employee_uuid, member.uuid)?;
            findings.extend(audit_member(member, &contracts, &others));
        }

        info!(
            "event=participation_audit module=participation status=ok project={} members={} findings={}",
            project_uuid,
            members.len(),
            findings.len()
        );

        Ok(findings)
    }

    /// Applies reviewed fixes; only participation-rate adjustments write.
    pub fn apply_fixes(
        &self,
        fixes: &[FixRequest],
    ) -> Result<Vec<FixOutcome>, ParticipationError> {
        let mut outcomes = Vec::with_capacity(fixes.len());

        for fix in fixes {
            if fix.kind != FixKind::AdjustParticipationRate {
                outcomes.push(FixOutcome::Unsupported {
                    member_uuid: fix.member_uuid,
                    kind: fix.kind,
                });
                continue;
            }
            if !(0..=100).contains(&fix.new_value) {
                outcomes.push(FixOutcome::InvalidRate {
                    member_uuid: fix.member_uuid,
                    value: fix.new_value,
                });
                continue;
            }
            let Some(member) = self.staffing.get_member(fix.member_uuid)? else {
                outcomes.push(FixOutcome::MemberNotFound {
                    member_uuid: fix.member_uuid,
                });
                continue;
            };
            if i64::from(member.participation_rate) != fix.old_value {
                outcomes.push(FixOutcome::Stale {
                    member_uuid: fix.member_uuid,
                    stored_rate: member.participation_rate,
                });
                continue;
            }

            let new_rate = fix.new_value as u32;
            self.staffing
                .update_participation_rate(fix.member_uuid, new_rate)?;
            outcomes.push(FixOutcome::Applied {
                member_uuid: fix.member_uuid,
                new_rate,
            });
        }

        let applied = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, FixOutcome::Applied { .. }))
            .count();
        info!(
            "event=participation_fix module=participation status=ok requested={} applied={}",
            fixes.len(),
            applied
        );

        Ok(outcomes)
    }
}

/// Audits one member against contracts and the employee's other memberships.
///
/// Pure function over loaded rows; the order of findings is fixed: rate
/// bound, contract coverage, amount consistency, cross-project overlap.
pub fn audit_member(
    member: &ProjectMember,
    contracts: &[SalaryContract],
    other_memberships: &[ProjectMember],
) -> Vec<Finding> {
    let mut findings = Vec::new();

    if member.participation_rate > 100 {
        findings.push(Finding {
            severity: Severity::Error,
            member_uuid: member.uuid,
            message: format!(
                "participation rate {}% exceeds the 100% bound",
                member.participation_rate
            ),
            suggested_fix: Some(FixHint {
                kind: FixKind::AdjustParticipationRate,
                old_value: i64::from(member.participation_rate),
                new_value: 100,
            }),
            detail: FindingDetail::RateOutOfBounds {
                rate: member.participation_rate,
            },
        });
    }

    let covering = contracts
        .iter()
        .find(|contract| contract.covers_window(member.start_date, member.end_date));
    match covering {
        None if contracts.is_empty() => {
            findings.push(Finding {
                severity: Severity::Error,
                member_uuid: member.uuid,
                message: "no salary contract on file for the participation window".to_string(),
                suggested_fix: None,
                detail: FindingDetail::ContractMissing,
            });
        }
        None => {
            findings.push(Finding {
                severity: Severity::Warning,
                member_uuid: member.uuid,
                message: format!(
                    "none of {} salary contract(s) intersects the participation window {}..{}",
                    contracts.len(),
                    member.start_date,
                    member.end_date
                ),
                suggested_fix: None,
                detail: FindingDetail::ContractPeriodMismatch {
                    contract_count: contracts.len(),
                },
            });
        }
        Some(contract) => {
            let expected_monthly = round_half_up(
                contract.annual_salary * i64::from(member.participation_rate),
                1200,
            );
            // Flag declared pay more than 10% above the contract-derived
            // expectation.
            if member.monthly_amount * 10 > expected_monthly * 11 {
                findings.push(Finding {
                    severity: Severity::Warning,
                    member_uuid: member.uuid,
                    message: format!(
                        "declared monthly amount {} exceeds expected {} by more than 10%",
                        member.monthly_amount, expected_monthly
                    ),
                    suggested_fix: Some(FixHint {
                        kind: FixKind::AdjustMonthlyAmount,
                        old_value: member.monthly_amount,
                        new_value: expected_monthly,
                    }),
                    detail: FindingDetail::AmountMismatch {
                        declared_monthly: member.monthly_amount,
                        expected_monthly,
                    },
                });
            }
        }
    }

    let overlapping: Vec<&ProjectMember> = other_memberships
        .iter()
        .filter(|other| !other.is_deleted && member.overlaps(other))
        .collect();
    let others_sum: u32 = overlapping
        .iter()
        .map(|other| other.participation_rate)
        .sum();
    let combined_rate = member.participation_rate + others_sum;
    if combined_rate > 100 {
        let suggested = 100u32.saturating_sub(others_sum);
        findings.push(Finding {
            severity: Severity::Error,
            member_uuid: member.uuid,
            message: format!(
                "combined participation across {} overlapping project(s) reaches {combined_rate}%",
                overlapping.len() + 1
            ),
            suggested_fix: Some(FixHint {
                kind: FixKind::AdjustParticipationRate,
                old_value: i64::from(member.participation_rate),
                new_value: i64::from(suggested),
            }),
            detail: FindingDetail::DuplicateParticipation {
                combined_rate,
                other_members: overlapping.iter().map(|other| other.uuid).collect(),
            },
        });
    }

    findings
}
