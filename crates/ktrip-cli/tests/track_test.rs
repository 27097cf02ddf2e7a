use assert_cmd::cargo::cargo_bin_cmd;
use ktrip_testing::TestWorld;
use ktrip_testing::assertions::{assert_lead_emails_pseudonymized, assert_table_rows};
use predicates::prelude::*;

fn track(world: &TestWorld, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("track")
        .args(args)
        .args(["--date", "20260216"]);
    cmd.assert()
}

fn fetch(world: &TestWorld, table: &str) -> serde_json::Value {
    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .args(["fetch", "--table", table, "--date", "2026-02-16"]);
    let output = cmd.output().expect("Failed to run fetch");
    assert!(
        output.status.success(),
        "fetch failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_visit_counts_once_per_session() {
    let world = TestWorld::new();

    track(&world, &["visit", "--session", "s1", "--channel", "community"])
        .success()
        .stdout("recorded\n");
    track(&world, &["visit", "--session", "s1", "--channel", "community"])
        .success()
        .stdout("duplicate\n");

    let counters = fetch(&world, "landing_cvr_daily");
    assert_eq!(counters[0]["channel"], "community");
    assert_eq!(counters[0]["visitors"], "1");

    let mirror = world.read_mirror("landing_cvr.csv").unwrap();
    assert_eq!(mirror[1], vec!["2026-02-16", "community", "1", "0", "0", "0"]);
}

#[test]
fn test_cta_and_lead_flow() {
    let world = TestWorld::new();

    track(&world, &["cta", "--session", "s1", "--channel", "referral", "--cta", "pilot"]).success();
    track(
        &world,
        &["cta", "--session", "s1", "--channel", "referral", "--cta", "first_scan"],
    )
    .success();
    track(
        &world,
        &[
            "lead",
            "--session",
            "s1",
            "--channel",
            "referral",
            "--email",
            "Traveler@Example.com",
            "--consent",
        ],
    )
    .success()
    .stdout("recorded\n");

    let counters = fetch(&world, "landing_cvr_daily");
    assert_eq!(counters[0]["pilot_cta"], "1");
    assert_eq!(counters[0]["first_scan_cta"], "1");
    assert_eq!(counters[0]["total_cta"], "2");

    let mirror = world.read_mirror("landing_events.csv").unwrap();
    assert_eq!(mirror.len(), 4);
    assert_lead_emails_pseudonymized(&mirror).unwrap();
}

#[test]
fn test_lead_without_consent_is_skipped() {
    let world = TestWorld::new();

    track(&world, &["lead", "--session", "s1", "--email", "a@b.co"])
        .success()
        .stdout("skipped: no consent\n");

    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("status");
    let output = cmd.output().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_table_rows(&json, "landing_events", 0).unwrap();
}

#[test]
fn test_invalid_input_fails_cleanly() {
    let world = TestWorld::new();

    track(
        &world,
        &["lead", "--session", "s1", "--email", "nobody", "--consent"],
    )
    .failure()
    .code(1)
    .stderr(predicate::str::contains("valid email"));

    track(&world, &["visit", "--session", " "])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Validation error: session id is required"));

    track(&world, &["cta", "--session", "s1", "--cta", "download"]).failure();
}

#[test]
fn test_session_flag_is_required() {
    let world = TestWorld::new();

    // clap usage error
    track(&world, &["visit"]).failure().code(2);
}

#[test]
fn test_unknown_channel_counts_as_referral() {
    let world = TestWorld::new();

    track(&world, &["visit", "--session", "s1", "--channel", "TikTok"]).success();

    let counters = fetch(&world, "landing_cvr_daily");
    assert_eq!(counters[0]["channel"], "referral");
}
