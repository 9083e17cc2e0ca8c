//! Per-column severity policy for the PEDE yearly contracts.
//!
//! Every contract column gets three checks: dtype (always `error`), missing,
//! and domain. Severities depend on the column, the year, and whether the
//! column is original to the year.

use chrono::NaiveDate;

use crate::model::{Domain, DomainRule, MissingRule, Presence, Severity};

const REQUIRED_COMPLETE: &[&str] = &["RA", "Idade", "Defasagem", "Gênero", "Ano ingresso"];
const SCORES: &[&str] = &["INDE", "IAA", "IAN", "IDA", "IEG", "IPS", "IPP", "IPV", "Mat", "Por"];
const OPEN_DOMAIN: &[&str] = &["Escola", "Turma", "Instituição de ensino", "Fase", "Fase_Ideal"];
const STATUS: &[&str] = &["Ativo/ Inativo", "Ativo/ Inativo__dup1"];
const YES_NO: &[&str] = &["Indicado", "Atingiu PV"];
const RANGE_0_10_5: &[&str] = &[
    "INDE", "IAA", "IAN", "IDA", "IEG", "IPS", "IPP", "IPV", "Mat", "Por", "Ing", "INDE 22", "INDE 23", "INDE 2023",
    "INDE 2024",
];
const STONES: &[&str] = &["Pedra_Ano", "Pedra 20", "Pedra 21", "Pedra 22", "Pedra 23", "Pedra 2023", "Pedra 2024"];
const STONE_LABELS: &[&str] = &["Ametista", "Ágata", "Quartzo", "Topázio"];

/// The only year in which `Cg`/`Cf`/`Ct`, `Indicado` and `Atingiu PV` are filled.
const FULL_LAYOUT_YEAR: u16 = 2022;
/// Year in which `Nº Av` is only partially filled.
const PARTIAL_EVALUATION_YEAR: u16 = 2023;
const STATUS_YEAR: u16 = 2024;

fn missing(enforcement: Severity, allow_missing: bool) -> MissingRule {
    MissingRule { enforcement, allow_missing, notes: None }
}

fn noted(mut rule: MissingRule, notes: &str) -> MissingRule {
    rule.notes = Some(notes.to_string());
    rule
}

pub fn missing_rule(year: u16, column: &str, presence: Presence) -> MissingRule {
    if presence == Presence::StructuralOptional {
        return noted(missing(Severity::Info, true), "Coluna estrutural do alinhamento entre anos.");
    }
    match column {
        c if REQUIRED_COMPLETE.contains(&c) => missing(Severity::Error, false),
        "Data_Nasc" => missing(Severity::Warning, false),
        c if SCORES.contains(&c) => missing(Severity::Warning, true),
        "Ing" => noted(missing(Severity::Info, true), "Missing historicamente alto nesta variável."),
        "Nº Av" if year == PARTIAL_EVALUATION_YEAR => missing(Severity::Warning, true),
        "Nº Av" => missing(Severity::Error, false),
        "Cg" | "Cf" | "Ct" if year == FULL_LAYOUT_YEAR => missing(Severity::Error, false),
        "Cg" | "Cf" | "Ct" => noted(missing(Severity::Info, true), "Variável estruturalmente ausente neste ano."),
        c if YES_NO.contains(&c) && year == FULL_LAYOUT_YEAR => missing(Severity::Error, false),
        c if YES_NO.contains(&c) => {
            noted(missing(Severity::Info, true), "Coluna presente mas sem preenchimento neste ano.")
        }
        c if OPEN_DOMAIN.contains(&c) || STATUS.contains(&c) => missing(Severity::Warning, true),
        _ => missing(Severity::Info, true),
    }
}

fn domain(enforcement: Severity, domain: Domain) -> DomainRule {
    DomainRule { enforcement, domain, notes: None }
}

fn range(min: f64, max: f64) -> Domain {
    Domain::Range { min: Some(min), max: Some(max) }
}

fn set(allowed: &[&str]) -> Domain {
    Domain::Set { allowed: allowed.iter().map(|s| s.to_string()).collect() }
}

pub fn domain_rule(year: u16, column: &str, presence: Presence) -> DomainRule {
    let count_severity = if year == FULL_LAYOUT_YEAR { Severity::Warning } else { Severity::Info };
    match column {
        "Data_Nasc" => domain(
            Severity::Warning,
            Domain::DateRange { start: NaiveDate::from_ymd_opt(1990, 1, 1), end: NaiveDate::from_ymd_opt(2030, 12, 31) },
        ),
        "Idade" => domain(Severity::Error, range(3.0, 30.0)),
        "Defasagem" => domain(Severity::Error, range(-10.0, 10.0)),
        c if RANGE_0_10_5.contains(&c) => domain(Severity::Error, range(0.0, 10.5)),
        "Nº Av" => domain(Severity::Error, range(0.0, 10.0)),
        "Ano ingresso" => domain(Severity::Error, range(2010.0, 2030.0)),
        "Cg" => domain(count_severity, range(0.0, 1000.0)),
        "Cf" => domain(count_severity, range(0.0, 300.0)),
        "Ct" => domain(count_severity, range(0.0, 50.0)),
        "Gênero" => domain(Severity::Error, set(&["Feminino", "Masculino"])),
        c if STONES.contains(&c) => domain(Severity::Warning, set(STONE_LABELS)),
        c if YES_NO.contains(&c) => domain(Severity::Warning, set(&["Sim", "Não"])),
        "Ativo/ Inativo" if year == STATUS_YEAR && presence == Presence::Original => {
            domain(Severity::Warning, set(&["Cursando"]))
        }
        _ => domain(Severity::Info, Domain::None),
    }
}

pub fn description_for(column: &str) -> Option<String> {
    let text = match column {
        "RA" => "Identificador do estudante (somente chave/auditoria).",
        "Defasagem" => "Indicador de defasagem escolar.",
        "Data_Nasc" => "Data de nascimento padronizada.",
        "Nome_Anon" => "Campo sensível; em 2022 pode não estar totalmente anonimizado.",
        _ => return None,
    };
    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_columns_are_info_and_may_be_missing() {
        let rule = missing_rule(2023, "Defasagem", Presence::StructuralOptional);
        assert_eq!(rule.enforcement, Severity::Info);
        assert!(rule.allow_missing);
    }

    #[test]
    fn label_and_identity_columns_must_be_complete() {
        for column in ["RA", "Defasagem", "Idade", "Gênero"] {
            let rule = missing_rule(2024, column, Presence::Original);
            assert_eq!(rule.enforcement, Severity::Error, "{column}");
            assert!(!rule.allow_missing);
        }
    }

    #[test]
    fn year_dependent_missing_rules() {
        assert_eq!(missing_rule(2022, "Cg", Presence::Original).enforcement, Severity::Error);
        assert_eq!(missing_rule(2023, "Cg", Presence::Original).enforcement, Severity::Info);
        assert_eq!(missing_rule(2023, "Nº Av", Presence::Original).enforcement, Severity::Warning);
        assert_eq!(missing_rule(2024, "Nº Av", Presence::Original).enforcement, Severity::Error);
        assert_eq!(missing_rule(2022, "Indicado", Presence::Original).enforcement, Severity::Error);
        assert_eq!(missing_rule(2024, "Atingiu PV", Presence::Original).enforcement, Severity::Info);
    }

    #[test]
    fn domains() {
        assert_eq!(domain_rule(2022, "Idade", Presence::Original).domain, range(3.0, 30.0));
        assert_eq!(domain_rule(2022, "INDE 23", Presence::Original).domain, range(0.0, 10.5));
        assert_eq!(domain_rule(2022, "Cf", Presence::Original).enforcement, Severity::Warning);
        assert_eq!(domain_rule(2024, "Cf", Presence::Original).enforcement, Severity::Info);
        assert_eq!(domain_rule(2023, "Pedra_Ano", Presence::Original).domain, set(STONE_LABELS));
        assert_eq!(domain_rule(2024, "Ativo/ Inativo", Presence::Original).domain, set(&["Cursando"]));
        assert_eq!(domain_rule(2023, "Ativo/ Inativo", Presence::StructuralOptional).domain, Domain::None);
        assert_eq!(domain_rule(2023, "Turma", Presence::Original).domain, Domain::None);
    }
}
