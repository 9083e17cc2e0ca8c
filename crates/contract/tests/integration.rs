use cohortgrid_contract::{
    build_contract, load_contract, save_contract, validate, Lineage, Severity, ValidationRun, Verdict,
};
use cohortgrid_core::{RawCell, RawFrame};
use cohortgrid_schema::{harmonize_all, Harmonization};

fn t(s: &str) -> RawCell {
    RawCell::from(s)
}

fn n(v: f64) -> RawCell {
    RawCell::Number(v)
}

fn sheets() -> Vec<RawFrame> {
    let headers = |h: &[&str]| h.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        RawFrame::from_rows(
            2022,
            "PEDE2022",
            headers(&["RA", "Defas", "Idade 22", "Gênero", "Cg"]),
            vec![
                vec![t("RA-1"), n(-1.0), n(12.0), t("Menina"), n(10.0)],
                vec![t("RA-2"), n(0.0), n(14.0), t("Menino"), n(20.0)],
            ],
        ),
        RawFrame::from_rows(
            2023,
            "PEDE2023",
            headers(&["RA", "Defasagem", "Idade", "Gênero"]),
            vec![
                vec![t("RA-1"), n(-2.0), n(13.0), t("Feminino")],
                vec![t("RA-3"), n(15.0), n(40.0), t("Masculino")],
            ],
        ),
    ]
}

#[test]
fn exported_contracts_validate_their_own_data() {
    let doc = Harmonization::embedded().unwrap();
    let harmonized = harmonize_all(sheets(), &doc).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let lineage = Lineage {
        dataset_basename: Some("PEDE.xlsx".into()),
        dataset_sha256: Some("0".repeat(64)),
        generated_at: Some("2026-01-01T00:00:00+00:00".into()),
    };

    for frame in harmonized.frames() {
        save_contract(dir.path(), &build_contract(frame, &doc, &lineage), true).unwrap();
    }

    let mut run = ValidationRun::new("2026-01-01T00:00:00+00:00", true);
    for frame in harmonized.frames() {
        let contract = load_contract(dir.path(), frame.year).unwrap();
        assert_eq!(contract.metadata.dataset_basename.as_deref(), Some("PEDE.xlsx"));
        run.push(validate(frame, &contract).unwrap());
    }

    let y2022 = &run.years[0];
    assert_eq!(y2022.status, Verdict::Pass, "{:?}", y2022.findings);
    assert!(y2022.schema.missing_columns.is_empty());

    // 2023: Defasagem 15 is out of range; age 40 was nulled during
    // normalization and trips the no-missing rule instead.
    let y2023 = &run.years[1];
    assert_eq!(y2023.status, Verdict::Fail);
    let domain_errors: Vec<&str> = y2023
        .findings
        .iter()
        .filter(|f| f.kind == "range" && f.enforcement == Severity::Error)
        .map(|f| f.column.as_str())
        .collect();
    assert_eq!(domain_errors, vec!["Defasagem"]);
    let idade = y2023.findings.iter().find(|f| f.column == "Idade").unwrap();
    assert_eq!((idade.kind.as_str(), idade.enforcement), ("missing", Severity::Error));

    // Cg only exists in 2022; in 2023 it is structural and only informational.
    let cg = y2023.findings.iter().find(|f| f.column == "Cg").unwrap();
    assert_eq!(cg.kind, "structural_missing");
    assert_eq!(cg.enforcement, Severity::Info);

    assert!(run.enforce().is_err());
}

#[test]
fn reports_never_carry_identifier_values() {
    let doc = Harmonization::embedded().unwrap();
    let harmonized = harmonize_all(sheets(), &doc).unwrap();
    let mut run = ValidationRun::new("t", false);
    for frame in harmonized.frames() {
        let contract = build_contract(frame, &doc, &Lineage::default());
        run.push(validate(frame, &contract).unwrap());
    }
    let json = serde_json::to_string(&run).unwrap();
    for id in ["RA-1", "RA-2", "RA-3"] {
        assert!(!json.contains(id));
    }
    assert!(!run.to_markdown().contains("RA-1"));
}
