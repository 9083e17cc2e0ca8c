use cohortgrid_core::{RawCell, RawFrame};
use cohortgrid_pairing::{build_pair, cohort_report, CohortIntersectionStat, PairError, PairOptions};
use cohortgrid_schema::{harmonize_all, Harmonization, Harmonized};
use proptest::prelude::*;

fn t(s: &str) -> RawCell {
    RawCell::from(s)
}

fn n(v: f64) -> RawCell {
    RawCell::Number(v)
}

fn sheet(year: u16, headers: &[&str], rows: Vec<Vec<RawCell>>) -> RawFrame {
    RawFrame::from_rows(year, format!("PEDE{year}"), headers.iter().map(|h| h.to_string()).collect(), rows)
}

fn pede2022(extra: Option<(&str, RawCell)>) -> RawFrame {
    let mut headers = vec!["RA", "Nome", "Idade 22", "INDE 22", "Pedra 22", "Defas", "Matem"];
    let mut rows = vec![
        vec![t("RA-1"), t("Aluno-1"), n(12.0), n(7.1), t("Agata"), n(-1.0), n(6.5)],
        vec![t("RA-2"), t("Aluno-2"), n(13.0), n(5.0), t("Quartzo"), n(0.0), n(4.0)],
        vec![t("RA-3"), t("Aluno-3"), n(9.0), n(6.0), t("Quartzo"), n(1.0), n(5.0)],
        vec![t("RA-4"), t("Aluno-4"), n(10.0), n(8.0), t("Topázio"), n(0.0), n(9.0)],
    ];
    if let Some((name, cell)) = extra {
        headers.push(name);
        for row in &mut rows {
            row.push(cell.clone());
        }
    }
    sheet(2022, &headers, rows)
}

fn pede2023() -> RawFrame {
    sheet(
        2023,
        &["RA", "Nome Anonimizado", "Idade", "INDE 2023", "Pedra 2023", "Defasagem", "Mat"],
        vec![
            vec![t("RA-1"), t("Aluno-1"), n(13.0), n(7.4), t("Ametista"), n(-1.0), n(7.0)],
            vec![t("RA-2"), t("Aluno-2"), n(14.0), n(6.2), t("Quartzo"), t("#N/A"), n(5.5)],
            vec![t("RA-3"), t("Aluno-3"), n(10.0), n(6.6), t("Agata"), RawCell::Empty, n(6.0)],
            vec![t("RA-4"), t("Aluno-4"), n(11.0), n(8.2), t("Topázio"), n(2.0), n(8.0)],
            vec![t("RA-9"), t("Aluno-9"), n(12.0), n(5.1), t("Quartzo"), n(0.0), n(3.0)],
        ],
    )
}

fn harmonized(extra: Option<(&str, RawCell)>) -> (Harmonization, Harmonized) {
    let doc = Harmonization::embedded().unwrap();
    let harmonized = harmonize_all(vec![pede2022(extra), pede2023()], &doc).unwrap();
    (doc, harmonized)
}

fn options(doc: &Harmonization) -> PairOptions {
    PairOptions { pii: doc.pii.iter().cloned().collect(), ..Default::default() }
}

#[test]
fn pair_from_harmonized_sheets() {
    let (doc, h) = harmonized(None);
    let pair = build_pair(h.frame(2022).unwrap(), h.frame(2023).unwrap(), &options(&doc)).unwrap();

    assert_eq!(pair.audit_keys, vec!["RA-1", "RA-4"]);
    assert_eq!(pair.labels, vec![1, 0]);
    assert_eq!(pair.audit.total_cohort, 4);
    assert_eq!(pair.audit.exclusions.missing, 1);
    assert_eq!(pair.audit.exclusions.invalid_token, 1);
    assert_eq!(pair.audit.cohort.intersection, 4);
    assert_eq!(pair.audit.cohort.union, 5);

    let names = pair.features.names();
    for forbidden in ["RA", "Nome_Anon", "INDE 2023", "Pedra 2023"] {
        assert!(!names.contains(&forbidden), "{forbidden} leaked into features");
    }
    assert!(names.contains(&"INDE 22"));
    assert!(names.contains(&"Defasagem"));
    assert_eq!(pair.audit.feature_split.t1_only_dropped, vec!["INDE 2023", "Pedra 2023"]);
    assert_eq!(pair.features.n_rows(), pair.labels.len());
}

#[test]
fn pair_audit_holds_no_identifiers() {
    let (doc, h) = harmonized(None);
    let pair = build_pair(h.frame(2022).unwrap(), h.frame(2023).unwrap(), &options(&doc)).unwrap();
    let json = serde_json::to_string(&pair.audit).unwrap();
    assert!(!json.contains("RA-1"));
    assert!(!json.contains("Aluno"));
    assert!(json.contains("\"seed\":42"));
}

#[test]
fn populated_future_column_aborts_the_pair() {
    let (doc, h) = harmonized(Some(("Defasagem_t1", n(-1.0))));
    let err = build_pair(h.frame(2022).unwrap(), h.frame(2023).unwrap(), &options(&doc)).unwrap_err();
    match err {
        PairError::Leakage { year_t, year_t1, columns } => {
            assert_eq!((year_t, year_t1), (2022, 2023));
            assert_eq!(columns, vec!["Defasagem_t1"]);
        }
        other => panic!("expected leakage, got {other:?}"),
    }
}

#[test]
fn cohort_report_over_harmonized_years() {
    let (_, h) = harmonized(None);
    let report = cohort_report(h.frames(), "RA", &[(2022, 2023)], 0.5, "2026-01-01T00:00:00+00:00").unwrap();
    assert_eq!(report.counts[&2022], 4);
    assert_eq!(report.counts[&2023], 5);
    let stat = &report.pairs["2022_2023"];
    assert!((stat.jaccard - 0.8).abs() < 1e-9);
}

proptest! {
    #[test]
    fn cohort_math_is_consistent(
        a in proptest::collection::btree_set(0u32..200, 0..80),
        b in proptest::collection::btree_set(0u32..200, 0..80),
    ) {
        let shared = a.intersection(&b).count();
        let stat = CohortIntersectionStat::from_counts(2022, a.len(), 2023, b.len(), shared);
        prop_assert_eq!(stat.union, a.union(&b).count());
        prop_assert!((0.0..=1.0).contains(&stat.jaccard));
        prop_assert!((0.0..=1.0).contains(&stat.pct_of_year_a));
        prop_assert!((0.0..=1.0).contains(&stat.pct_of_year_b));
        prop_assert!(stat.jaccard <= stat.pct_of_year_a.max(stat.pct_of_year_b) + 1e-12);
    }
}
