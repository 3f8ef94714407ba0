use assert_cmd::Command;
use predicates::prelude::*;

fn minimal_plan_json() -> &'static str {
    r#"{
        "horizon": { "num_days": 10 },
        "crops": [
            { "id": "wheat", "name": "Wheat", "category": null, "price_per_area": 100.0 }
        ],
        "events": [
            { "id": "sow", "crop_id": "wheat", "name": "Sow", "uses_land": true }
        ],
        "lands": [
            { "id": "L1", "name": "Field 1", "area": 10.0, "tags": null, "blocked_days": null }
        ],
        "workers": [],
        "resources": [],
        "crop_area_bounds": [],
        "fixed_areas": []
    }"#
}

fn write_plan(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("plan.json");
    std::fs::write(&path, minimal_plan_json()).unwrap();
    path
}

#[test]
fn validate_accepts_a_well_formed_plan() {
    let dir = tempfile::tempdir().unwrap();
    let plan_path = write_plan(&dir);

    Command::cargo_bin("farmplan")
        .unwrap()
        .args(["validate", plan_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("plan is valid"));
}

#[test]
fn validate_rejects_an_out_of_range_blocked_day() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let plan = minimal_plan_json().replace("\"blocked_days\": null }", "\"blocked_days\": [99] }");
    std::fs::write(&path, plan).unwrap();

    Command::cargo_bin("farmplan")
        .unwrap()
        .args(["validate", path.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn optimize_solves_the_minimal_plan_and_prints_ok_status() {
    let dir = tempfile::tempdir().unwrap();
    let plan_path = write_plan(&dir);

    Command::cargo_bin("farmplan")
        .unwrap()
        .args([
            "optimize",
            plan_path.to_str().unwrap(),
            "--stages",
            "profit",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"ok\""));
}

#[test]
fn optimize_writes_result_to_the_requested_file() {
    let dir = tempfile::tempdir().unwrap();
    let plan_path = write_plan(&dir);
    let out_path = dir.path().join("result.json");

    Command::cargo_bin("farmplan")
        .unwrap()
        .args([
            "optimize",
            plan_path.to_str().unwrap(),
            "--stages",
            "profit",
            "--out",
            out_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = std::fs::read_to_string(&out_path).unwrap();
    assert!(contents.contains("\"status\": \"ok\""));
}
