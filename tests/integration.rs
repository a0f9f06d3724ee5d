//! CLI integration tests against the fixture weapon table.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn weapons_csv() -> PathBuf {
    fixtures_dir().join("weapons.csv")
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_weapon-balance"))
        .args(args)
        .output()
        .expect("run weapon-balance")
}

#[test]
fn score_fixtures_produces_output() {
    let out = tempfile::tempdir().expect("tempdir");
    let out_path = out.path().to_path_buf();
    let output = run(&[
        "score",
        "--data",
        weapons_csv().to_str().unwrap(),
        "--out",
        out_path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "score should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Showing 13 of 13"), "stdout: {}", stdout);
    assert!(stdout.contains("Metrics OK:"));
    assert!(
        out_path.join("report.json").exists(),
        "report.json should exist"
    );
    assert!(
        out_path.join("html").join("index.html").exists(),
        "html/index.html should exist"
    );
    assert!(out_path.join("html").join("anomalies.html").exists());
    assert!(out_path.join("html").join("weapon_il_toro.html").exists());

    let json = std::fs::read_to_string(out_path.join("report.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["rows"].as_array().unwrap().len(), 13);
    assert_eq!(v["chart"].as_array().unwrap().len(), 13);
    assert_eq!(v["sort"]["key"], "Score");
}

#[test]
fn category_filter_narrows_working_set() {
    let output = run(&[
        "score",
        "--data",
        weapons_csv().to_str().unwrap(),
        "--category",
        "SMG",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Showing 2 of 13"), "stdout: {}", stdout);
    assert!(stdout.contains("Stitcher"));
    assert!(!stdout.contains("Kettle"));
}

#[test]
fn weapon_command_prints_detail() {
    let output = run(&[
        "weapon",
        "--data",
        weapons_csv().to_str().unwrap(),
        "--armor",
        "H",
        "--zone",
        "Overall",
        "stitcher",
    ]);
    assert!(
        output.status.success(),
        "weapon command should succeed: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Weapon: Stitcher (SMG)"));
    assert!(stdout.contains("Time to Kill"));
    assert!(stdout.contains("Distance bands"));
}

#[test]
fn unknown_weapon_fails() {
    let output = run(&["weapon", "--data", weapons_csv().to_str().unwrap(), "Nonexistent"]);
    assert!(!output.status.success());
}

#[test]
fn unknown_armor_tier_is_rejected() {
    let output = run(&[
        "score",
        "--data",
        weapons_csv().to_str().unwrap(),
        "--armor",
        "X",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("armor"));
}

#[test]
fn zero_weights_are_reported_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let weights = dir.path().join("weights.toml");
    std::fs::write(
        &weights,
        "ttk = 0\nsustain = 0\nhandling = 0\nrange = 0\nreload = 0\narmor = 0\n",
    )
    .unwrap();
    let output = run(&[
        "score",
        "--data",
        weapons_csv().to_str().unwrap(),
        "--weights",
        weights.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Weights sum to 0"), "stdout: {}", stdout);
}

#[test]
fn config_file_supplies_data_and_controls() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = dir.path().join("run.toml");
    let data = weapons_csv().to_string_lossy().replace('\\', "/");
    std::fs::write(
        &cfg,
        format!(
            "data = \"{}\"\narmor = \"M\"\nzone = \"Body\"\nsearch = \"kett\"\nsort = \"Name\"\n",
            data
        ),
    )
    .unwrap();
    let output = run(&["score", "--config", cfg.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Showing 1 of 13"), "stdout: {}", stdout);
}

fn report_controls(cfg: &std::path::Path, extra: &[&str]) -> serde_json::Value {
    let out = tempfile::tempdir().expect("tempdir");
    let mut args = vec!["score", "--config", cfg.to_str().unwrap()];
    args.extend_from_slice(extra);
    args.extend_from_slice(&["--out", out.path().to_str().unwrap()]);
    let output = run(&args);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = std::fs::read_to_string(out.path().join("report.json")).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    v["controls"].clone()
}

#[test]
fn preset_flag_overrides_config_weights() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = dir.path().join("run.toml");
    let data = weapons_csv().to_string_lossy().replace('\\', "/");
    std::fs::write(
        &cfg,
        format!(
            "data = \"{}\"\n\n[weights]\n{}",
            data, "ttk = 1\nsustain = 1\nhandling = 1\nrange = 1\nreload = 1\narmor = 1\n"
        ),
    )
    .unwrap();

    let from_file = report_controls(&cfg, &[]);
    assert_eq!(from_file["preset"], "CUSTOM");
    assert_eq!(from_file["weights"]["ttk"], 1.0);

    let flagged = report_controls(&cfg, &["--preset", "CQC"]);
    assert_eq!(flagged["preset"], "CQC");
    assert_eq!(flagged["weights"]["ttk"], 35.0);
    assert_eq!(flagged["weights"]["handling"], 25.0);
}

#[test]
fn presets_listed() {
    let output = run(&["presets"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["META", "CQC", "MID", "LONG"] {
        assert!(stdout.contains(name));
    }
    assert!(!stdout.contains("CUSTOM"));
}
