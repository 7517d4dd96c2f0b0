use chrono::NaiveDate;
use grantdesk_core::db::open_db_in_memory;
use grantdesk_core::{
    Employee, FindingKind, FixKind, FixOutcome, FixRequest, ParticipationService, Project,
    ProjectMember, ProjectRepository, SalaryContract, Severity, SqliteProjectRepository,
    SqliteStaffingRepository, StaffingRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn seed_project(conn: &Connection, code: &str) -> Project {
    let projects = SqliteProjectRepository::try_new(conn).unwrap();
    let project = Project::new(
        code,
        "Participation fixture",
        date(2024, 1, 1),
        date(2024, 12, 31),
        0,
    );
    projects.create_project(&project).unwrap();
    project
}

fn seed_employee(conn: &Connection, name: &str) -> Employee {
    let staffing = SqliteStaffingRepository::try_new(conn).unwrap();
    let employee = Employee::new(name);
    staffing.create_employee(&employee).unwrap();
    employee
}

fn seed_member(
    conn: &Connection,
    project: &Project,
    employee: &Employee,
    rate: u32,
    monthly: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> ProjectMember {
    let staffing = SqliteStaffingRepository::try_new(conn).unwrap();
    let member = ProjectMember::new(project.uuid, employee.uuid, rate, monthly, start, end);
    staffing.create_member(&member).unwrap();
    member
}

#[test]
fn clean_member_produces_no_findings() {
    let conn = open_db_in_memory().unwrap();
    let project = seed_project(&conn, "GD-PV-001");
    let employee = seed_employee(&conn, "Kim Jiwoo");
    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    staffing
        .create_contract(&SalaryContract::new(
            employee.uuid,
            48_000_000,
            date(2023, 1, 1),
            None,
        ))
        .unwrap();
    seed_member(
        &conn,
        &project,
        &employee,
        50,
        2_000_000,
        date(2024, 1, 1),
        date(2024, 12, 31),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let findings = service.validate_project(project.uuid).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
}

#[test]
fn rate_above_bound_is_an_error_finding() {
    let conn = open_db_in_memory().unwrap();
    let project = seed_project(&conn, "GD-PV-002");
    let employee = seed_employee(&conn, "Lee Haneul");
    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    staffing
        .create_contract(&SalaryContract::new(
            employee.uuid,
            60_000_000,
            date(2023, 1, 1),
            None,
        ))
        .unwrap();
    let member = seed_member(
        &conn,
        &project,
        &employee,
        120,
        0,
        date(2024, 1, 1),
        date(2024, 12, 31),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let findings = service.validate_project(project.uuid).unwrap();

    let rate_finding = findings
        .iter()
        .find(|f| f.kind() == FindingKind::RateOutOfBounds)
        .expect("rate bound finding");
    assert_eq!(rate_finding.severity, Severity::Error);
    assert_eq!(rate_finding.member_uuid, member.uuid);
    let hint = rate_finding.suggested_fix.expect("rate fix hint");
    assert_eq!(hint.kind, FixKind::AdjustParticipationRate);
    assert_eq!(hint.old_value, 120);
    assert_eq!(hint.new_value, 100);
}

#[test]
fn missing_and_mismatched_contracts_are_distinguished() {
    let conn = open_db_in_memory().unwrap();
    let project = seed_project(&conn, "GD-PV-003");

    // No contracts at all.
    let uncontracted = seed_employee(&conn, "Park Dahye");
    seed_member(
        &conn,
        &project,
        &uncontracted,
        30,
        0,
        date(2024, 1, 1),
        date(2024, 6, 30),
    );

    // A contract exists but only for the second half of the year.
    let mismatched = seed_employee(&conn, "Choi Minseo");
    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    staffing
        .create_contract(&SalaryContract::new(
            mismatched.uuid,
            36_000_000,
            date(2024, 7, 1),
            Some(date(2024, 12, 31)),
        ))
        .unwrap();
    seed_member(
        &conn,
        &project,
        &mismatched,
        30,
        0,
        date(2024, 1, 1),
        date(2024, 6, 30),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let findings = service.validate_project(project.uuid).unwrap();

    let missing = findings
        .iter()
        .find(|f| f.kind() == FindingKind::ContractMissing)
        .expect("contract_missing finding");
    assert_eq!(missing.severity, Severity::Error);

    let mismatch = findings
        .iter()
        .find(|f| f.kind() == FindingKind::ContractPeriodMismatch)
        .expect("contract_period_mismatch finding");
    assert_eq!(mismatch.severity, Severity::Warning);
}

#[test]
fn declared_amount_over_ten_percent_is_flagged() {
    let conn = open_db_in_memory().unwrap();
    let project = seed_project(&conn, "GD-PV-004");
    let employee = seed_employee(&conn, "Jung Woojin");
    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    // 48M annual at 50% -> expected monthly 2,000,000.
    staffing
        .create_contract(&SalaryContract::new(
            employee.uuid,
            48_000_000,
            date(2023, 1, 1),
            None,
        ))
        .unwrap();

    // Exactly +10% stays unflagged.
    seed_member(
        &conn,
        &project,
        &employee,
        50,
        2_200_000,
        date(2024, 1, 1),
        date(2024, 3, 31),
    );
    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let findings = service.validate_project(project.uuid).unwrap();
    assert!(
        findings
            .iter()
            .all(|f| f.kind() != FindingKind::AmountMismatch),
        "boundary amount should pass: {findings:?}"
    );

    // One unit above the +10% boundary is flagged.
    let second_project = seed_project(&conn, "GD-PV-004B");
    seed_member(
        &conn,
        &second_project,
        &employee,
        50,
        2_200_001,
        date(2024, 4, 1),
        date(2024, 6, 30),
    );
    let findings = service.validate_project(second_project.uuid).unwrap();
    let mismatch = findings
        .iter()
        .find(|f| f.kind() == FindingKind::AmountMismatch)
        .expect("amount_mismatch finding");
    assert_eq!(mismatch.severity, Severity::Warning);
    let hint = mismatch.suggested_fix.expect("amount fix hint");
    assert_eq!(hint.kind, FixKind::AdjustMonthlyAmount);
    assert_eq!(hint.new_value, 2_000_000);
}

#[test]
fn cross_project_overlap_is_flagged_only_above_hundred() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_project(&conn, "GD-PV-005");
    let second = seed_project(&conn, "GD-PV-006");
    let employee = seed_employee(&conn, "Han Seoyeon");
    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    staffing
        .create_contract(&SalaryContract::new(
            employee.uuid,
            50_000_000,
            date(2023, 1, 1),
            None,
        ))
        .unwrap();

    let member = seed_member(
        &conn,
        &first,
        &employee,
        60,
        0,
        date(2024, 1, 1),
        date(2024, 12, 31),
    );
    // 60 + 40 == 100: still legal, no finding.
    seed_member(
        &conn,
        &second,
        &employee,
        40,
        0,
        date(2024, 6, 1),
        date(2024, 12, 31),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let findings = service.validate_project(first.uuid).unwrap();
    assert!(
        findings
            .iter()
            .all(|f| f.kind() != FindingKind::DuplicateParticipation),
        "sum of exactly 100 must not be flagged: {findings:?}"
    );

    // A third membership pushes the concurrent sum to 110.
    let third = seed_project(&conn, "GD-PV-007");
    seed_member(
        &conn,
        &third,
        &employee,
        10,
        0,
        date(2024, 3, 1),
        date(2024, 8, 31),
    );

    let findings = service.validate_project(first.uuid).unwrap();
    let overlap = findings
        .iter()
        .find(|f| f.kind() == FindingKind::DuplicateParticipation)
        .expect("duplicate_participation finding");
    assert_eq!(overlap.severity, Severity::Error);
    assert_eq!(overlap.member_uuid, member.uuid);
    let hint = overlap.suggested_fix.expect("overlap fix hint");
    assert_eq!(hint.kind, FixKind::AdjustParticipationRate);
    // Others hold 50%, so the suggestion caps this member at 50%.
    assert_eq!(hint.new_value, 50);
}

#[test]
fn disjoint_windows_do_not_count_toward_overlap() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_project(&conn, "GD-PV-008");
    let second = seed_project(&conn, "GD-PV-009");
    let employee = seed_employee(&conn, "Yoon Taeyang");
    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    staffing
        .create_contract(&SalaryContract::new(
            employee.uuid,
            50_000_000,
            date(2023, 1, 1),
            None,
        ))
        .unwrap();

    seed_member(
        &conn,
        &first,
        &employee,
        80,
        0,
        date(2024, 1, 1),
        date(2024, 6, 30),
    );
    seed_member(
        &conn,
        &second,
        &employee,
        80,
        0,
        date(2024, 7, 1),
        date(2024, 12, 31),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    for project in [&first, &second] {
        let findings = service.validate_project(project.uuid).unwrap();
        assert!(
            findings
                .iter()
                .all(|f| f.kind() != FindingKind::DuplicateParticipation),
            "disjoint windows flagged: {findings:?}"
        );
    }
}

#[test]
fn apply_fixes_updates_rates_and_reports_the_rest() {
    let conn = open_db_in_memory().unwrap();
    let project = seed_project(&conn, "GD-PV-010");
    let employee = seed_employee(&conn, "Seo Yuna");
    let member = seed_member(
        &conn,
        &project,
        &employee,
        120,
        0,
        date(2024, 1, 1),
        date(2024, 12, 31),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let outcomes = service
        .apply_fixes(&[
            FixRequest {
                kind: FixKind::AdjustParticipationRate,
                member_uuid: member.uuid,
                old_value: 120,
                new_value: 100,
            },
            FixRequest {
                kind: FixKind::ExtendContract,
                member_uuid: member.uuid,
                old_value: 0,
                new_value: 0,
            },
            FixRequest {
                kind: FixKind::AdjustParticipationRate,
                member_uuid: Uuid::new_v4(),
                old_value: 50,
                new_value: 40,
            },
        ])
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(
        outcomes[0],
        FixOutcome::Applied { new_rate: 100, .. }
    ));
    assert!(matches!(
        outcomes[1],
        FixOutcome::Unsupported {
            kind: FixKind::ExtendContract,
            ..
        }
    ));
    assert!(matches!(outcomes[2], FixOutcome::MemberNotFound { .. }));

    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    let reloaded = staffing.get_member(member.uuid).unwrap().unwrap();
    assert_eq!(reloaded.participation_rate, 100);
}

#[test]
fn stale_and_out_of_range_fixes_do_not_write() {
    let conn = open_db_in_memory().unwrap();
    let project = seed_project(&conn, "GD-PV-011");
    let employee = seed_employee(&conn, "Kang Doyun");
    let member = seed_member(
        &conn,
        &project,
        &employee,
        90,
        0,
        date(2024, 1, 1),
        date(2024, 12, 31),
    );

    let service = ParticipationService::new(SqliteStaffingRepository::try_new(&conn).unwrap());
    let outcomes = service
        .apply_fixes(&[
            FixRequest {
                kind: FixKind::AdjustParticipationRate,
                member_uuid: member.uuid,
                old_value: 120,
                new_value: 100,
            },
            FixRequest {
                kind: FixKind::AdjustParticipationRate,
                member_uuid: member.uuid,
                old_value: 90,
                new_value: 150,
            },
        ])
        .unwrap();

    assert!(matches!(
        outcomes[0],
        FixOutcome::Stale {
            stored_rate: 90,
            ..
        }
    ));
    assert!(matches!(
        outcomes[1],
        FixOutcome::InvalidRate { value: 150, .. }
    ));

    let staffing = SqliteStaffingRepository::try_new(&conn).unwrap();
    let reloaded = staffing.get_member(member.uuid).unwrap().unwrap();
    assert_eq!(reloaded.participation_rate, 90);
}
