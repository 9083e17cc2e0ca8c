use cohortgrid_core::Frame;
use cohortgrid_schema::Harmonization;

use crate::model::{
    ColumnChecks, ColumnContract, ContractMetadata, DataContract, Presence, SchemaRules, Severity, CONTRACT_VERSION,
};
use crate::policy::{description_for, domain_rule, missing_rule};

/// Source dataset identity stamped into every exported contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lineage {
    pub dataset_basename: Option<String>,
    pub dataset_sha256: Option<String>,
    pub generated_at: Option<String>,
}

/// Derive the contract for one aligned year-frame.
///
/// Presence comes from the frame's original columns, dtype from the
/// normalized column, PII from the harmonization document.
pub fn build_contract(frame: &Frame, doc: &Harmonization, lineage: &Lineage) -> DataContract {
    let year = frame.year;
    let columns: Vec<ColumnContract> = frame
        .columns()
        .iter()
        .map(|column| {
            let name = column.name.as_str();
            let presence = if frame.is_original(name) { Presence::Original } else { Presence::StructuralOptional };
            ColumnContract {
                name: name.to_string(),
                dtype: column.dtype(),
                presence,
                pii: doc.is_pii(name),
                description: description_for(name),
                checks: ColumnChecks {
                    dtype: Severity::Error,
                    missing: missing_rule(year, name, presence),
                    domain: domain_rule(year, name, presence),
                },
            }
        })
        .collect();

    let original = columns.iter().filter(|c| c.presence == Presence::Original).count();
    log::info!("Contract built year={} | columns={} original={}", year, columns.len(), original);

    DataContract {
        year,
        metadata: ContractMetadata {
            contract_version: CONTRACT_VERSION.to_string(),
            rows_expected: Some(frame.n_rows()),
            dataset_basename: lineage.dataset_basename.clone(),
            dataset_sha256: lineage.dataset_sha256.clone(),
            generated_at: lineage.generated_at.clone(),
            notes: Some("Presence diferencia colunas originais do ano e colunas estruturais do alinhamento.".into()),
        },
        schema: SchemaRules::default(),
        columns,
    }
}
