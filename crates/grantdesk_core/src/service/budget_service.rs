//! Budget allocation and evidence generation use-cases.
//!
//! # Responsibility
//! - Split a period total into category amounts by percentage.
//! - Persist planned periods and derive evidence items from allocations.
//!
//! # Invariants
//! - Category amounts are rounded half-up independently; no reconciliation
//!   pass runs, so the allocated sum may drift from the total by at most one
//!   currency unit per category.
//! - Evidence generation is idempotent per `(period, category)`.

use crate::model::evidence::EvidenceItem;
use crate::model::project::{
    BudgetCategory, BudgetPeriod, PeriodAllocation, PeriodId, ProjectId,
};
use crate::repo::evidence_repo::EvidenceRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::RepoError;
use chrono::{Months, NaiveDate};
use log::info;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from the pure allocation arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Period total below zero.
    NegativeTotal(i64),
    /// Percentage values do not sum to exactly 100.
    PercentagesNotHundred { sum: u32 },
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeTotal(total) => {
                write!(f, "period total must be >= 0, got {total}")
            }
            Self::PercentagesNotHundred { sum } => {
                write!(f, "category percentages must sum to 100, got {sum}")
            }
        }
    }
}

impl Error for AllocationError {}

/// Splits `total` into category amounts by percentage.
///
/// Each amount is `total * pct / 100` rounded half-up in integer arithmetic.
/// The rounded amounts are returned as-is; callers must tolerate a drift of
/// up to one currency unit per category against `total`.
pub fn allocate(
    total: i64,
    percentages: &BTreeMap<BudgetCategory, u32>,
) -> Result<BTreeMap<BudgetCategory, i64>, AllocationError> {
    if total < 0 {
        return Err(AllocationError::NegativeTotal(total));
    }
    let sum: u32 = percentages.values().sum();
    if sum != 100 {
        return Err(AllocationError::PercentagesNotHundred { sum });
    }

    Ok(percentages
        .iter()
        .map(|(category, pct)| (*category, round_half_up(total * i64::from(*pct), 100)))
        .collect())
}

/// Round-half-up division for non-negative numerators.
pub(crate) fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2) / denominator
}

/// Input for planning one budget period.
#[derive(Debug, Clone)]
pub struct PlanPeriodRequest {
    pub project_uuid: ProjectId,
    /// 1-based sequence number within the project.
    pub period_no: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_amount: i64,
    pub percentages: BTreeMap<BudgetCategory, u32>,
    /// Cash share of every category amount; the remainder is in-kind.
    pub cash_percent: u32,
}

impl PlanPeriodRequest {
    /// All-cash plan with the given percentage map.
    pub fn all_cash(
        project_uuid: ProjectId,
        period_no: u32,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_amount: i64,
        percentages: BTreeMap<BudgetCategory, u32>,
    ) -> Self {
        Self {
            project_uuid,
            period_no,
            start_date,
            end_date,
            total_amount,
            percentages,
            cash_percent: 100,
        }
    }
}

/// Errors from budget use-cases.
#[derive(Debug)]
pub enum BudgetServiceError {
    Allocation(AllocationError),
    ProjectNotFound(ProjectId),
    PeriodNotFound(PeriodId),
    /// Period end date has no representable date one month later.
    InvalidPeriodEnd { end: NaiveDate },
    Repo(RepoError),
}

impl Display for BudgetServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allocation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::PeriodNotFound(id) => write!(f, "budget period not found: {id}"),
            Self::InvalidPeriodEnd { end } => {
                write!(f, "no evidence due date one month after period end {end}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BudgetServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AllocationError> for BudgetServiceError {
    fn from(value: AllocationError) -> Self {
        Self::Allocation(value)
    }
}

impl From<RepoError> for BudgetServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Budget planning and evidence generation facade.
pub struct BudgetService<P: ProjectRepository, E: EvidenceRepository> {
    projects: P,
    evidence: E,
}

impl<P: ProjectRepository, E: EvidenceRepository> BudgetService<P, E> {
    pub fn new(projects: P, evidence: E) -> Self {
        Self { projects, evidence }
    }

    /// Computes category allocations and persists the period atomically.
    ///
    /// # Contract
    /// - Fails with `ProjectNotFound` before any write when the owning
    ///   project does not resolve.
    /// - Category amounts follow [`allocate`]; cash/in-kind follow the same
    ///   rounding rule applied to `cash_percent`.
    pub fn plan_period(
        &self,
        request: &PlanPeriodRequest,
    ) -> Result<BudgetPeriod, BudgetServiceError> {
        if self
            .projects
            .get_project(request.project_uuid, false)?
            .is_none()
        {
            return Err(BudgetServiceError::ProjectNotFound(request.project_uuid));
        }

        let amounts = allocate(request.total_amount, &request.percentages)?;
        let allocations = amounts
            .into_iter()
            .map(|(category, amount)| {
                let cash = round_half_up(amount * i64::from(request.cash_percent.min(100)), 100);
                PeriodAllocation {
                    category,
                    amount,
                    cash_amount: cash,
                    in_kind_amount: amount - cash,
                }
            })
            .collect();

        let period = BudgetPeriod::new(
            request.project_uuid,
            request.period_no,
            request.start_date,
            request.end_date,
            request.total_amount,
            allocations,
        );
        self.projects.create_period(&period)?;

        info!(
            "event=period_plan module=budget status=ok project={} period_no={} total={}",
            request.project_uuid, request.period_no, request.total_amount
        );

        Ok(period)
    }

    /// Creates one evidence item per non-zero category allocation.
    ///
    /// # Contract
    /// - Due date is the period end plus one calendar month (end-of-month
    ///   clamped).
    /// - Returns only newly inserted items; re-invocation returns an empty
    ///   list because `(period, category)` is unique in storage.
    pub fn generate_evidence(
        &self,
        period_uuid: PeriodId,
    ) -> Result<Vec<EvidenceItem>, BudgetServiceError> {
        let period = self
            .projects
            .get_period(period_uuid)?
            .ok_or(BudgetServiceError::PeriodNotFound(period_uuid))?;

        let due_date = period
            .end_date
            .checked_add_months(Months::new(1))
            .ok_or(BudgetServiceError::InvalidPeriodEnd {
                end: period.end_date,
            })?;

        let mut created = Vec::new();
        let mut skipped = 0u32;
        for allocation in &period.allocations {
            if allocation.amount == 0 {
                continue;
            }
            let item = EvidenceItem::new(
                period.uuid,
                allocation.category,
                allocation.amount,
                due_date,
            );
            if self.evidence.insert_if_absent(&item)? {
                created.push(item);
            } else {
                skipped += 1;
            }
        }

        info!(
            "event=evidence_generate module=budget status=ok period={} created={} skipped={}",
            period.uuid,
            created.len(),
            skipped
        );

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::{allocate, round_half_up, AllocationError};
    use crate::model::project::BudgetCategory;
    use std::collections::BTreeMap;

    fn percentages(entries: &[(BudgetCategory, u32)]) -> BTreeMap<BudgetCategory, u32> {
        entries.iter().copied().collect()
    }

    #[test]
    fn standard_split_matches_expected_amounts() {
        let split = allocate(
            200_000_000,
            &percentages(&[
                (BudgetCategory::Personnel, 40),
                (BudgetCategory::Material, 30),
                (BudgetCategory::Activity, 20),
                (BudgetCategory::Indirect, 10),
            ]),
        )
        .unwrap();

        assert_eq!(split[&BudgetCategory::Personnel], 80_000_000);
        assert_eq!(split[&BudgetCategory::Material], 60_000_000);
        assert_eq!(split[&BudgetCategory::Activity], 40_000_000);
        assert_eq!(split[&BudgetCategory::Indirect], 20_000_000);
    }

    #[test]
    fn rounding_drift_stays_within_one_unit_per_category() {
        let pcts = percentages(&[
            (BudgetCategory::Personnel, 33),
            (BudgetCategory::Material, 33),
            (BudgetCategory::Activity, 33),
            (BudgetCategory::Indirect, 1),
        ]);
        for total in [1, 7, 99, 101, 1001, 12_345_677, 999_999_999] {
            let split = allocate(total, &pcts).unwrap();
            let sum: i64 = split.values().sum();
            let drift = (sum - total).abs();
            assert!(
                drift <= pcts.len() as i64,
                "total {total}: drift {drift} exceeds tolerance"
            );
        }
    }

    #[test]
    fn drift_is_real_not_reconciled() {
        // 1001 * 33% rounds to 330 three times; the sum misses the total.
        let split = allocate(
            1001,
            &percentages(&[
                (BudgetCategory::Personnel, 33),
                (BudgetCategory::Material, 33),
                (BudgetCategory::Activity, 34),
            ]),
        )
        .unwrap();
        let sum: i64 = split.values().sum();
        assert_eq!(sum, 1000);
    }

    #[test]
    fn malformed_percentages_are_rejected() {
        let err = allocate(
            1000,
            &percentages(&[
                (BudgetCategory::Personnel, 50),
                (BudgetCategory::Material, 40),
            ]),
        )
        .unwrap_err();
        assert_eq!(err, AllocationError::PercentagesNotHundred { sum: 90 });

        let err = allocate(-1, &percentages(&[(BudgetCategory::Personnel, 100)])).unwrap_err();
        assert_eq!(err, AllocationError::NegativeTotal(-1));
    }

    #[test]
    fn round_half_up_behaves_like_host_rounding() {
        assert_eq!(round_half_up(5, 10), 1);
        assert_eq!(round_half_up(4, 10), 0);
        assert_eq!(round_half_up(15, 10), 2);
        assert_eq!(round_half_up(0, 10), 0);
    }
}
