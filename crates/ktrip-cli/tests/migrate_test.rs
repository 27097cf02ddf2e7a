use assert_cmd::cargo::cargo_bin_cmd;
use ktrip_testing::TestWorld;
use ktrip_testing::assertions::{
    assert_lead_emails_pseudonymized, assert_mirror_row_count, assert_no_temp_files,
    assert_table_rows,
};
use predicates::prelude::*;

fn status(world: &TestWorld) -> serde_json::Value {
    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("status");
    let output = cmd.output().expect("Failed to run status");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_migrate_legacy_export() {
    let world = TestWorld::new().with_legacy_export();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("migrate")
        .arg("--source-dir")
        .arg(world.legacy_dir());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "landing_events: applied=5 skipped=1 sources=2",
        ))
        .stdout(predicate::str::contains("trip_safety: applied=2 skipped=1 sources=2"))
        .stderr(predicate::str::contains("Exported 10 mirrors"));

    let json = status(&world);
    assert_table_rows(&json, "landing_events", 5).unwrap();
    assert_table_rows(&json, "landing_cvr_daily", 2).unwrap();
    assert_table_rows(&json, "analytics_events", 2).unwrap();
    assert_table_rows(&json, "app_reviews", 1).unwrap();

    let landing = world.read_mirror("landing_events.csv").unwrap();
    assert_mirror_row_count(&landing, 5).unwrap();
    assert_lead_emails_pseudonymized(&landing).unwrap();
    assert_no_temp_files(world.data_dir()).unwrap();
}

#[test]
fn test_migrate_dry_run_writes_nothing() {
    let world = TestWorld::new().with_legacy_export();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("migrate")
        .arg("--source-dir")
        .arg(world.legacy_dir())
        .arg("--dry-run");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("would apply"));

    let json = status(&world);
    assert_table_rows(&json, "landing_events", 0).unwrap();
    assert_table_rows(&json, "landing_cvr_daily", 0).unwrap();
    assert!(!world.mirror_path("landing_events.csv").exists());
}

#[test]
fn test_migrate_reports_failed_dataset() {
    let world = TestWorld::new().with_fragment(
        "20260216_interview_log.csv",
        "interview_id,date,quote\nI1,2026-02-16,ok\n",
    );
    std::fs::write(
        world.legacy_dir().join("trip_safety.csv"),
        b"scenario_id,date\nS1,\xff\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("migrate")
        .arg("--source-dir")
        .arg(world.legacy_dir());
    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("trip_safety: failed"))
        .stderr(predicate::str::contains("1 dataset(s) failed"));

    assert_table_rows(&status(&world), "interview_log", 1).unwrap();
}

#[test]
fn test_migrate_missing_source_dir() {
    let world = TestWorld::new();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("migrate")
        .arg("--source-dir")
        .arg(world.temp_dir().join("nowhere"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Legacy directory not found"));
}
