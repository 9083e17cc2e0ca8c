// End-to-end tests for the cgrid binary against a generated PEDE workbook.
// Run with: cargo test -p cohortgrid-cli --test cli_tests

mod common;

use std::process::Command;

use common::{stderr, stdout, Cell, Sandbox};

#[test]
fn contracts_export_writes_lineage_without_identifiers() {
    let sb = Sandbox::new(None);
    let out = sb.cgrid(&["contracts", "export"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let contract = sb.read_json("contracts/data_contract_2022.json");
    assert_eq!(contract["year"], 2022);
    assert_eq!(contract["metadata"]["dataset_basename"], "PEDE.xlsx");
    assert_eq!(contract["metadata"]["dataset_sha256"].as_str().unwrap().len(), 64);
    assert!(sb.path("contracts/data_contract_2023.md").exists());

    let text = std::fs::read_to_string(sb.path("contracts/data_contract_2023.json")).unwrap();
    assert!(!text.contains("RA-1"));
}

#[test]
fn validate_reports_and_strict_mode_fails() {
    let sb = Sandbox::new(None);
    assert!(sb.cgrid(&["contracts", "export"]).status.success());

    // 2023 has a blank and an invalid Defasagem, which its contract forbids.
    let lenient = sb.cgrid(&["validate"]);
    assert_eq!(lenient.status.code(), Some(0), "stderr: {}", stderr(&lenient));
    assert!(stdout(&lenient).contains("status: FAIL"));

    let report = sb.read_json("artifacts/data_quality_report.json");
    assert_eq!(report["status"], "FAIL");
    assert_eq!(report["years"][0]["status"], "PASS");
    assert_eq!(report["years"][1]["status"], "FAIL");
    assert!(sb.path("artifacts/data_quality_report.md").exists());

    let strict = sb.cgrid(&["validate", "--strict"]);
    assert_eq!(strict.status.code(), Some(3));
    assert!(stderr(&strict).contains("strict validation failed"));
}

#[test]
fn validate_without_contracts_records_error_findings() {
    let sb = Sandbox::new(None);
    let out = sb.cgrid(&["validate", "--no-markdown"]);
    assert_eq!(out.status.code(), Some(0));

    let report = sb.read_json("artifacts/data_quality_report.json");
    assert_eq!(report["years"][0]["findings"][0]["kind"], "contract_unavailable");
    assert_eq!(report["years"][0]["findings"][0]["enforcement"], "error");
    assert!(!sb.path("artifacts/data_quality_report.md").exists());
}

#[test]
fn pairs_write_feature_split_and_audit() {
    let sb = Sandbox::new(None);
    let out = sb.cgrid(&["pairs", "--pair", "2022:2023"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let split = sb.read_json("artifacts/feature_split_report_2022_2023.json");
    assert_eq!(split["year_t"], 2022);
    assert_eq!(split["year_t1"], 2023);
    let numeric: Vec<&str> = split["numeric_cols"].as_array().unwrap().iter().filter_map(|v| v.as_str()).collect();
    assert!(numeric.contains(&"Mat"));
    assert!(!numeric.contains(&"RA"));

    let audit = sb.read_json("artifacts/temporal_pair_audit_2022_2023.json");
    assert_eq!(audit["total_cohort"], 4);
    assert_eq!(audit["valid"], 2);
    assert_eq!(audit["exclusions"]["missing"], 1);
    assert_eq!(audit["exclusions"]["invalid_token"], 1);
    assert_eq!(audit["meta"]["seed"], 42);
}

#[test]
fn leakage_aborts_with_dedicated_exit_code() {
    let sb = Sandbox::new(Some(("Defasagem_t1", Cell::N(-1.0))));
    let out = sb.cgrid(&["pairs"]);
    assert_eq!(out.status.code(), Some(4));
    let err = stderr(&out);
    assert!(err.contains("leakage detected 2022->2023"), "{err}");
    assert!(err.contains("Defasagem_t1"));
    assert!(!sb.path("artifacts/temporal_pair_audit_2022_2023.json").exists());
}

#[test]
fn harmonize_writes_audits() {
    let sb = Sandbox::new(None);
    let out = sb.cgrid(&["harmonize"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(sb.path("artifacts/category_normalization_report.json").exists());
    assert!(sb.path("artifacts/category_normalization_report.md").exists());

    let mapping = sb.read_json("artifacts/column_mapping_report.json");
    let text = mapping.to_string();
    assert!(text.contains("Matem"));
    assert!(!text.contains("RA-1"));
}

#[test]
fn missing_dataset_exits_with_hint() {
    let sb = Sandbox::new(None);
    let out = Command::new(env!("CARGO_BIN_EXE_cgrid"))
        .current_dir(sb.dir.path())
        .env_remove("DATASET_PATH")
        .arg("--config")
        .arg(sb.path("cgrid.toml"))
        .args(["cohort", "--dataset", "nope.xlsx"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(5));
    assert!(stderr(&out).contains("DATASET_PATH"));
}

#[test]
fn dataset_path_env_is_honored() {
    let sb = Sandbox::new(None);
    let out = Command::new(env!("CARGO_BIN_EXE_cgrid"))
        .current_dir(sb.dir.path())
        .env("DATASET_PATH", sb.path("PEDE.xlsx"))
        .arg("--config")
        .arg(sb.path("cgrid.toml"))
        .args(["cohort", "--no-markdown"])
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(sb.path("artifacts/ra_intersections.json").exists());
}
