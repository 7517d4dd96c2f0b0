use chrono::NaiveDate;
use grantdesk_core::db::open_db_in_memory;
use grantdesk_core::{
    BudgetCategory, BudgetService, BudgetServiceError, EvidenceRepository, EvidenceStatus,
    PlanPeriodRequest, Project, ProjectRepository, SqliteEvidenceRepository,
    SqliteProjectRepository,
};
use std::collections::BTreeMap;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seeded_period<'a>(
    conn: &'a rusqlite::Connection,
    percentages: BTreeMap<BudgetCategory, u32>,
    end: NaiveDate,
) -> (
    BudgetService<SqliteProjectRepository<'a>, SqliteEvidenceRepository<'a>>,
    grantdesk_core::BudgetPeriod,
) {
    let projects = SqliteProjectRepository::try_new(conn).unwrap();
    let project = Project::new(
        "GD-EV-001",
        "Evidence fixture",
        date(2024, 1, 1),
        end,
        50_000_000,
    );
    projects.create_project(&project).unwrap();

    let service = BudgetService::new(
        SqliteProjectRepository::try_new(conn).unwrap(),
        SqliteEvidenceRepository::try_new(conn).unwrap(),
    );
    let period = service
        .plan_period(&PlanPeriodRequest::all_cash(
            project.uuid,
            1,
            date(2024, 1, 1),
            end,
            50_000_000,
            percentages,
        ))
        .unwrap();
    (service, period)
}

#[test]
fn one_item_per_non_zero_category() {
    let conn = open_db_in_memory().unwrap();
    // Indirect carries 0%; only three categories may produce evidence.
    let percentages = [
        (BudgetCategory::Personnel, 50),
        (BudgetCategory::Material, 30),
        (BudgetCategory::Activity, 20),
        (BudgetCategory::Indirect, 0),
    ]
    .into_iter()
    .collect();
    let (service, period) = seeded_period(&conn, percentages, date(2024, 12, 31));

    let created = service.generate_evidence(period.uuid).unwrap();
    assert_eq!(created.len(), 3);
    for item in &created {
        assert_eq!(item.status, EvidenceStatus::Planned);
        assert_eq!(
            item.amount,
            period.allocation(item.category).unwrap().amount
        );
        assert_ne!(item.category, BudgetCategory::Indirect);
    }
}

#[test]
fn due_date_is_period_end_plus_one_month() {
    let conn = open_db_in_memory().unwrap();
    let percentages = [(BudgetCategory::Personnel, 100)].into_iter().collect();
    // End-of-month clamp: one month after Jan 31 is Feb 29 in a leap year.
    let (service, period) = seeded_period(&conn, percentages, date(2024, 1, 31));

    let created = service.generate_evidence(period.uuid).unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].due_date, date(2024, 2, 29));
}

#[test]
fn regeneration_inserts_nothing() {
    // The (period, category) unique index makes re-generation a no-op
    // instead of duplicating rows.
    let conn = open_db_in_memory().unwrap();
    let percentages = [
        (BudgetCategory::Personnel, 40),
        (BudgetCategory::Material, 30),
        (BudgetCategory::Activity, 20),
        (BudgetCategory::Indirect, 10),
    ]
    .into_iter()
    .collect();
    let (service, period) = seeded_period(&conn, percentages, date(2024, 12, 31));

    let first = service.generate_evidence(period.uuid).unwrap();
    assert_eq!(first.len(), 4);

    let second = service.generate_evidence(period.uuid).unwrap();
    assert!(second.is_empty());

    let evidence = SqliteEvidenceRepository::try_new(&conn).unwrap();
    assert_eq!(evidence.list_by_period(period.uuid).unwrap().len(), 4);
}

#[test]
fn unknown_period_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let service = BudgetService::new(
        SqliteProjectRepository::try_new(&conn).unwrap(),
        SqliteEvidenceRepository::try_new(&conn).unwrap(),
    );
    assert!(matches!(
        service.generate_evidence(Uuid::new_v4()),
        Err(BudgetServiceError::PeriodNotFound(_))
    ));
}

#[test]
fn mark_spent_transitions_and_guards_not_found() {
    let conn = open_db_in_memory().unwrap();
    let percentages = [(BudgetCategory::Material, 100)].into_iter().collect();
    let (service, period) = seeded_period(&conn, percentages, date(2024, 12, 31));
    let created = service.generate_evidence(period.uuid).unwrap();

    let evidence = SqliteEvidenceRepository::try_new(&conn).unwrap();
    evidence.mark_spent(created[0].uuid).unwrap();
    let reloaded = evidence.list_by_period(period.uuid).unwrap();
    assert_eq!(reloaded[0].status, EvidenceStatus::Spent);

    assert!(matches!(
        evidence.mark_spent(Uuid::new_v4()),
        Err(grantdesk_core::RepoError::NotFound { .. })
    ));
}
