//! Legacy fragment migration against a real store.

use chrono::NaiveDate;
use ktrip_index::{RecordStore, StorageLocation, Store, Table};
use ktrip_runtime::{LegacyMigration, MigrationProgress};
use ktrip_testing::assertions::{assert_lead_emails_pseudonymized, assert_no_temp_files};
use ktrip_testing::{TestWorld, fixtures};
use ktrip_types::Channel;

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()
}

fn store(world: &TestWorld) -> Store {
    Store::open(StorageLocation::in_dir(world.data_dir())).unwrap()
}

#[test]
fn test_full_legacy_export_is_folded_in() {
    let world = TestWorld::new().with_legacy_export();
    let store = store(&world);

    let report = LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.failed().count(), 0);

    let landing = report.dataset(Table::LandingEvents).unwrap();
    assert_eq!(landing.sources, 2);
    assert_eq!(landing.rows_read, 7);
    assert_eq!(landing.skipped, 1);
    assert_eq!(landing.applied, 5);
    assert_eq!(store.count_rows(Table::LandingEvents).unwrap(), 5);

    let analytics = report.dataset(Table::AnalyticsEvents).unwrap();
    assert_eq!((analytics.applied, analytics.skipped), (2, 1));

    let safety = store.fetch_rows_for_date(Table::TripSafety, day()).unwrap();
    assert_eq!(safety.len(), 2);
    assert_eq!(safety[0]["scenario_id"], "S001");
    assert_eq!(safety[0]["resolved"], "yes");

    let reviews = store.fetch_rows_for_date(Table::AppReviews, day()).unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["rating"], "5");
    assert_eq!(reviews[0]["country"], "US");

    assert_eq!(report.dataset(Table::GuardrailChecklist).unwrap().applied, 0);
}

#[test]
fn test_counter_fragments_are_summed() {
    let world = TestWorld::new()
        .with_fragment("20260216_landing_cvr.csv", fixtures::LANDING_CVR_MORNING)
        .with_fragment("landing_cvr.csv", fixtures::LANDING_CVR_EVENING);
    let store = store(&world);

    LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();

    let community = store.fetch_counter(day(), Channel::Community).unwrap().unwrap();
    assert_eq!(
        (
            community.visitors,
            community.pilot_cta,
            community.first_scan_cta,
            community.total_cta
        ),
        (7, 1, 2, 3)
    );
    let referral = store.fetch_counter(day(), Channel::Referral).unwrap().unwrap();
    assert_eq!(referral.visitors, 3);
    assert_eq!(referral.pilot_cta, 0);
}

#[test]
fn test_oversized_counter_fragments_are_capped() {
    let huge = "date,channel,visitors,pilot_cta,first_scan_cta,total_cta\n\
                2026-02-16,community,9e18,0,0,0\n";
    let world = TestWorld::new()
        .with_fragment("20260216_landing_cvr.csv", huge)
        .with_fragment("landing_cvr.csv", huge);
    let store = store(&world);

    let report = LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();

    assert_eq!(report.failed().count(), 0);
    let community = store.fetch_counter(day(), Channel::Community).unwrap().unwrap();
    assert_eq!(community.visitors, i64::MAX);
    assert_eq!(community.total_cta, 0);
}

#[test]
fn test_dry_run_leaves_store_untouched() {
    let world = TestWorld::new().with_legacy_export();
    let store = store(&world);

    let report = LegacyMigration::new(&store, world.legacy_dir())
        .dry_run(true)
        .run(|_| {})
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.dataset(Table::LandingCvrDaily).unwrap().applied, 2);
    assert_eq!(report.dataset(Table::TripSafety).unwrap().applied, 2);
    for table in Table::ALL {
        assert_eq!(store.count_rows(table).unwrap(), 0, "{}", table);
    }
    assert!(!world.mirror_path("landing_cvr.csv").exists());
}

#[test]
fn test_migration_is_repeatable_for_events() {
    let world = TestWorld::new()
        .with_fragment("20260216_landing_events.csv", fixtures::LANDING_EVENTS);
    let store = store(&world);

    let first = LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();
    let second = LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();

    assert_eq!(first.dataset(Table::LandingEvents).unwrap().applied, 4);
    assert_eq!(second.dataset(Table::LandingEvents).unwrap().applied, 0);
    assert_eq!(store.count_rows(Table::LandingEvents).unwrap(), 4);
}

#[test]
fn test_mirrors_exported_without_plaintext() {
    let world = TestWorld::new().with_legacy_export();
    let store = store(&world);

    LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();

    let landing = world.read_mirror("landing_events.csv").unwrap();
    assert_eq!(landing.len(), 6);
    assert_lead_emails_pseudonymized(&landing).unwrap();
    assert_no_temp_files(world.data_dir()).unwrap();
    for table in Table::ALL {
        assert!(store.mirror_path(table).exists(), "{} not exported", table);
    }
}

#[test]
fn test_progress_reports_each_dataset() {
    let world = TestWorld::new().with_legacy_export();
    let store = store(&world);
    let mut started = 0;
    let mut skipped = 0;
    let mut exported = None;

    LegacyMigration::new(&store, world.legacy_dir())
        .run(|progress| match progress {
            MigrationProgress::DatasetStarted { .. } => started += 1,
            MigrationProgress::RowSkipped { .. } => skipped += 1,
            MigrationProgress::Exported { files } => exported = Some(files),
            _ => {}
        })
        .unwrap();

    assert_eq!(started, Table::ALL.len());
    // tiktok channel, dateless analytics row, blank scenario id
    assert_eq!(skipped, 3);
    assert_eq!(exported, Some(Table::ALL.len()));
}

#[test]
fn test_broken_dataset_does_not_stop_the_others() {
    let world = TestWorld::new()
        .with_fragment("20260216_interview_log.csv", "interview_id,date,quote\nI1,2026-02-16,ok\n");
    // not valid UTF-8
    std::fs::write(
        world.legacy_dir().join("20260216_trip_safety.csv"),
        b"scenario_id,date\nS1,\xff\xfe\n",
    )
    .unwrap();
    let store = store(&world);

    let report = LegacyMigration::new(&store, world.legacy_dir())
        .run(|_| {})
        .unwrap();

    assert!(report.dataset(Table::TripSafety).unwrap().error.is_some());
    assert_eq!(report.failed().count(), 1);
    assert_eq!(report.dataset(Table::InterviewLog).unwrap().applied, 1);
    assert_eq!(store.count_rows(Table::InterviewLog).unwrap(), 1);
}
