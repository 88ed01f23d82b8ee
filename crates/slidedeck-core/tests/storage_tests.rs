mod common;

use chrono::{Duration, Utc};
use slidedeck_core::storage::PlanRecord;
use slidedeck_core::{ReportRecord, Storage, StorageError};
use tempfile::TempDir;

fn report(id: &str, plan_id: &str) -> ReportRecord {
    ReportRecord {
        id: id.to_string(),
        plan_id: plan_id.to_string(),
        created_at: Utc::now(),
        title: "Electric vehicle market".to_string(),
        template: "Basic".to_string(),
        slides_generated: 4,
        execution_time: 12.5,
        deck_path: "output/report.pptx".into(),
        log_path: "output/report.execution.json".into(),
    }
}

#[test]
fn test_save_and_load_plan() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);

    let record = PlanRecord::new(common::sample_plan(), "Basic")
        .with_source_text(Some("Q3 revenue was $4.2M".to_string()));
    storage.save_plan(&record).unwrap();

    let loaded = storage.load_plan(&record.id).unwrap();
    assert_eq!(loaded.id, record.id);
    assert_eq!(loaded.query, "Electric vehicle market");
    assert_eq!(loaded.template, "Basic");
    assert_eq!(loaded.plan, record.plan);
    assert_eq!(loaded.source_text.as_deref(), Some("Q3 revenue was $4.2M"));
    assert!(temp
        .path()
        .join("data/plans")
        .join(format!("{}.json", record.id))
        .exists());
}

#[test]
fn test_blank_source_text_is_dropped() {
    let record = PlanRecord::new(common::sample_plan(), "Basic").with_source_text(Some("  \n".to_string()));
    assert!(record.source_text.is_none());
}

#[test]
fn test_list_plans_newest_first() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);

    let mut older = PlanRecord::new(common::sample_plan(), "Basic");
    older.created_at = Utc::now() - Duration::hours(1);
    let newer = PlanRecord::new(common::sample_plan(), "Minimal");
    storage.save_plan(&older).unwrap();
    storage.save_plan(&newer).unwrap();

    let summaries = storage.list_plans().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].id, newer.id);
    assert_eq!(summaries[0].sections, 2);
    assert_eq!(summaries[0].total_queries, 4);
    assert_eq!(summaries[1].id, older.id);
}

#[test]
fn test_list_skips_unreadable_records() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);
    storage
        .save_plan(&PlanRecord::new(common::sample_plan(), "Basic"))
        .unwrap();
    std::fs::write(temp.path().join("data/plans/broken.json"), "{not json").unwrap();

    assert_eq!(storage.list_plans().unwrap().len(), 1);
}

#[test]
fn test_missing_plan() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);

    assert!(matches!(storage.load_plan("nope"), Err(StorageError::PlanNotFound(_))));
    assert!(matches!(storage.delete_plan("nope"), Err(StorageError::PlanNotFound(_))));
    // No directory yet is an empty listing
    assert!(storage.list_plans().unwrap().is_empty());
}

#[test]
fn test_delete_plan() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);
    let record = PlanRecord::new(common::sample_plan(), "Basic");
    storage.save_plan(&record).unwrap();

    storage.delete_plan(&record.id).unwrap();
    assert!(matches!(storage.load_plan(&record.id), Err(StorageError::PlanNotFound(_))));
}

#[test]
fn test_invalid_ids_rejected() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);

    for id in ["", "../escape", "a/b", "with space"] {
        assert!(
            matches!(storage.load_plan(id), Err(StorageError::InvalidId(_))),
            "accepted {id:?}"
        );
        assert!(matches!(storage.load_report(id), Err(StorageError::InvalidId(_))));
    }
}

#[test]
fn test_reports_round_trip() {
    let temp = TempDir::new().unwrap();
    let storage = common::storage(&temp);

    let mut first = report("report-1", "plan-1");
    first.created_at = Utc::now() - Duration::minutes(5);
    let second = report("report-2", "plan-2");
    storage.save_report(&first).unwrap();
    storage.save_report(&second).unwrap();

    let loaded = storage.load_report("report-1").unwrap();
    assert_eq!(loaded.plan_id, "plan-1");
    assert_eq!(loaded.slides_generated, 4);

    let ids: Vec<_> = storage.list_reports().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["report-2", "report-1"]);

    storage.delete_report("report-1").unwrap();
    assert!(matches!(
        storage.load_report("report-1"),
        Err(StorageError::ReportNotFound(_))
    ));
    assert!(matches!(
        storage.delete_report("report-1"),
        Err(StorageError::ReportNotFound(_))
    ));
}
