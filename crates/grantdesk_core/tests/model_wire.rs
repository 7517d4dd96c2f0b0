use chrono::NaiveDate;
use grantdesk_core::{
    BudgetCategory, LeaveKind, Notification, NotificationPriority, NotificationType, Project,
    ProjectStatus, ReferenceType,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn project_serialization_uses_expected_wire_fields() {
    let mut project = Project::new(
        "GD-2024-010",
        "Wire check",
        date(2024, 1, 1),
        date(2024, 12, 31),
        400_000_000,
    );
    project.uuid = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    project.status = ProjectStatus::Active;

    let json = serde_json::to_value(&project).unwrap();
    assert_eq!(json["uuid"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["code"], "GD-2024-010");
    assert_eq!(json["start_date"], "2024-01-01");
    assert_eq!(json["end_date"], "2024-12-31");
    assert_eq!(json["total_budget"], 400_000_000_i64);
    assert_eq!(json["status"], "active");
    assert_eq!(json["is_deleted"], false);

    let decoded: Project = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, project);
}

#[test]
fn budget_category_wire_names_are_snake_case() {
    for (category, wire) in [
        (BudgetCategory::Personnel, "personnel"),
        (BudgetCategory::Material, "material"),
        (BudgetCategory::Activity, "activity"),
        (BudgetCategory::Indirect, "indirect"),
    ] {
        assert_eq!(serde_json::to_value(category).unwrap(), wire);
        assert_eq!(category.as_db(), wire);
    }
}

#[test]
fn budget_category_korean_labels() {
    assert_eq!(BudgetCategory::Personnel.label_ko(), "인건비");
    assert_eq!(BudgetCategory::Material.label_ko(), "재료비");
    assert_eq!(BudgetCategory::Activity.label_ko(), "연구활동비");
    assert_eq!(BudgetCategory::Indirect.label_ko(), "간접비");
}

#[test]
fn leave_kind_wire_names_match_db_codec() {
    for (kind, wire) in [
        (LeaveKind::FullDay, "full_day"),
        (LeaveKind::HalfDay, "half_day"),
        (LeaveKind::QuarterDay, "quarter_day"),
    ] {
        assert_eq!(serde_json::to_value(kind).unwrap(), wire);
        assert_eq!(kind.as_db(), wire);
        assert_eq!(LeaveKind::parse_db(wire), Some(kind));
    }
    assert_eq!(LeaveKind::parse_db("sabbatical"), None);
}

#[test]
fn notification_roundtrips_through_json() {
    let notification = Notification::new(
        ReferenceType::SalaryContract,
        Uuid::parse_str("22222222-3333-4444-8555-666666666666").unwrap(),
        NotificationType::ExpiryReminder,
        date(2024, 6, 3),
        NotificationPriority::High,
        "salary contract expires in 7 days",
    );

    let json = serde_json::to_value(&notification).unwrap();
    assert_eq!(json["reference_type"], "salary_contract");
    assert_eq!(json["notification_type"], "expiry_reminder");
    assert_eq!(json["scheduled_date"], "2024-06-03");
    assert_eq!(json["priority"], "high");
    assert_eq!(json["status"], "pending");

    let decoded: Notification = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, notification);
}
