use assert_cmd::cargo::cargo_bin_cmd;
use ktrip_testing::TestWorld;
use ktrip_testing::assertions::assert_mirror_row_count;
use predicates::prelude::*;

#[test]
fn test_init_creates_database_and_mirrors() {
    let world = TestWorld::new();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("init");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ktrippedia.db"))
        .stdout(predicate::str::contains("(10 files)"));

    assert!(world.db_path().exists());
    let counters = world.read_mirror("landing_cvr.csv").unwrap();
    assert_eq!(
        counters[0],
        vec!["date", "channel", "visitors", "pilot_cta", "first_scan_cta", "total_cta"]
    );
    assert_mirror_row_count(&counters, 0).unwrap();
}

#[test]
fn test_init_is_repeatable() {
    let world = TestWorld::new();

    for _ in 0..2 {
        let mut cmd = cargo_bin_cmd!("ktrip");
        world.configure_command(&mut cmd).arg("init");
        cmd.assert().success();
    }
}

#[test]
fn test_data_dir_defaults_to_cwd_data() {
    let world = TestWorld::new().without_data_dir_flag();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("init");
    cmd.assert().success();

    assert!(world.cwd().join("data").join("ktrippedia.db").exists());
}

#[test]
fn test_env_data_dir_is_used() {
    let world = TestWorld::new().without_data_dir_flag();
    let env_dir = world.temp_dir().join("from-env");
    let world = world.with_env("KTRIPPEDIA_DATA_DIR", env_dir.display().to_string());

    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("init");
    cmd.assert().success();

    assert!(env_dir.join("ktrippedia.db").exists());
    assert!(!world.db_path().exists());
}

#[test]
fn test_config_file_sets_data_dir_and_mirror_dir() {
    let world = TestWorld::new().without_data_dir_flag();
    let data_dir = world.temp_dir().join("kpi");
    let mirror_dir = world.temp_dir().join("mirrors");
    let world = world.with_config(&format!(
        "[storage]\ndata_dir = \"{}\"\nmirror_dir = \"{}\"\n",
        data_dir.display(),
        mirror_dir.display()
    ));

    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("init");
    cmd.assert().success();

    assert!(data_dir.join("ktrippedia.db").exists());
    assert!(mirror_dir.join("landing_events.csv").exists());
    assert!(!data_dir.join("landing_events.csv").exists());
}

#[test]
fn test_write_config_records_data_dir() {
    let world = TestWorld::new().enter_dir("project");

    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("init")
        .arg("--write-config");
    cmd.assert().success();

    let config = std::fs::read_to_string(world.cwd().join("ktrip.toml")).unwrap();
    assert!(config.contains(&world.data_dir().display().to_string()));

    // later commands find the store through the config alone
    let world = world.without_data_dir_flag();
    let mut cmd = cargo_bin_cmd!("ktrip");
    world.configure_command(&mut cmd).arg("status");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(world.db_path().display().to_string()));
}

#[test]
fn test_missing_explicit_config_fails() {
    let world = TestWorld::new();

    let mut cmd = cargo_bin_cmd!("ktrip");
    world
        .configure_command(&mut cmd)
        .arg("--config")
        .arg(world.temp_dir().join("absent.toml"))
        .arg("init");
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("config file not found"));
}
