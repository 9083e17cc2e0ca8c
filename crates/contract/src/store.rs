use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ContractError;
use crate::model::DataContract;

pub fn contract_path(dir: &Path, year: u16) -> PathBuf {
    dir.join(format!("data_contract_{year}.json"))
}

pub fn markdown_path(dir: &Path, year: u16) -> PathBuf {
    dir.join(format!("data_contract_{year}.md"))
}

/// Load `data_contract_{year}.json` from `dir`.
pub fn load_contract(dir: &Path, year: u16) -> Result<DataContract, ContractError> {
    let path = contract_path(dir, year);
    if !path.exists() {
        return Err(ContractError::Missing { year, path });
    }
    let text = fs::read_to_string(&path).map_err(|source| ContractError::Read { path: path.clone(), source })?;
    let contract: DataContract =
        serde_json::from_str(&text).map_err(|e| ContractError::Parse { path: path.clone(), message: e.to_string() })?;
    if contract.year != year {
        return Err(ContractError::YearMismatch { contract: contract.year, frame: year });
    }
    Ok(contract)
}

/// Write the contract as pretty JSON, plus its Markdown table when asked.
/// Returns the paths written.
pub fn save_contract(dir: &Path, contract: &DataContract, markdown: bool) -> Result<Vec<PathBuf>, ContractError> {
    fs::create_dir_all(dir).map_err(|source| ContractError::Write { path: dir.to_path_buf(), source })?;

    let json_path = contract_path(dir, contract.year);
    let json = serde_json::to_string_pretty(contract)
        .map_err(|e| ContractError::Parse { path: json_path.clone(), message: e.to_string() })?;
    fs::write(&json_path, json + "\n").map_err(|source| ContractError::Write { path: json_path.clone(), source })?;
    let mut written = vec![json_path];

    if markdown {
        let md_path = markdown_path(dir, contract.year);
        fs::write(&md_path, contract.to_markdown())
            .map_err(|source| ContractError::Write { path: md_path.clone(), source })?;
        written.push(md_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContractMetadata, SchemaRules, CONTRACT_VERSION};

    fn empty(year: u16) -> DataContract {
        DataContract {
            year,
            metadata: ContractMetadata {
                contract_version: CONTRACT_VERSION.into(),
                rows_expected: Some(0),
                dataset_basename: None,
                dataset_sha256: None,
                generated_at: None,
                notes: None,
            },
            schema: SchemaRules::default(),
            columns: Vec::new(),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_contract(dir.path(), &empty(2022), true).unwrap();
        assert_eq!(written.len(), 2);
        assert!(markdown_path(dir.path(), 2022).exists());
        assert_eq!(load_contract(dir.path(), 2022).unwrap(), empty(2022));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_contract(dir.path(), 2024).unwrap_err();
        assert!(matches!(err, ContractError::Missing { year: 2024, .. }));
    }

    #[test]
    fn year_in_file_must_match_name() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_string(&empty(2022)).unwrap();
        fs::write(contract_path(dir.path(), 2023), json).unwrap();
        let err = load_contract(dir.path(), 2023).unwrap_err();
        assert!(matches!(err, ContractError::YearMismatch { contract: 2022, frame: 2023 }));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(contract_path(dir.path(), 2022), "{ not json").unwrap();
        assert!(matches!(load_contract(dir.path(), 2022), Err(ContractError::Parse { .. })));
    }
}
