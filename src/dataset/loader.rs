//! Dataset loading and normalization.
//!
//! Locates the CSV payroll file for a chosen municipality, renames source
//! columns to canonical fields through the schema tables in
//! [`crate::dataset::columns`], and coerces installment values to
//! non-negative numbers. A missing file is a normal outcome ("no records"),
//! never an error.

use crate::dataset::columns::{detect_schema, CanonicalField};
use crate::models::{BeneficiaryRecord, Dataset};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failures while reading an existing dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset {path}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row matched no known column map.
    #[error("unrecognized dataset schema in {path} (headers: {headers:?})")]
    UnknownSchema { path: PathBuf, headers: Vec<String> },
}

/// Loads per-municipality payroll datasets from a root directory.
///
/// Two addressing schemes coexist upstream and both are supported:
/// `<root>/<ibge_code>.csv` and `<root>/<state>/<municipality>.csv`.
pub struct DatasetLoader {
    root: PathBuf,
}

impl DatasetLoader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Load by IBGE code: `<root>/<code>.csv`. `Ok(None)` when absent.
    pub fn load_by_code(&self, code: &str) -> Result<Option<Dataset>, DatasetError> {
        let path = self.root.join(format!("{}.csv", code));
        self.load_path(&path, code)
    }

    /// Load by state and municipality name: `<root>/<state>/<name>.csv`.
    /// `Ok(None)` when absent.
    pub fn load_by_name(
        &self,
        state: &str,
        municipality: &str,
    ) -> Result<Option<Dataset>, DatasetError> {
        let path = self
            .root
            .join(state)
            .join(format!("{}.csv", municipality));
        self.load_path(&path, municipality)
    }

    fn load_path(&self, path: &Path, label: &str) -> Result<Option<Dataset>, DatasetError> {
        if !path.exists() {
            debug!("No dataset file at {}", path.display());
            return Ok(None);
        }
        load_file(path, label).map(Some)
    }
}

/// Read one CSV file and normalize it into a [`Dataset`].
fn load_file(path: &Path, label: &str) -> Result<Dataset, DatasetError> {
    let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| DatasetError::Malformed {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let labels: Vec<&str> = headers.iter().collect();

    let schema = detect_schema(&labels).ok_or_else(|| DatasetError::UnknownSchema {
        path: path.to_path_buf(),
        headers: labels.iter().map(|s| s.to_string()).collect(),
    })?;

    // Column index per canonical field, resolved once from the header row.
    let mut id_idx = None;
    let mut name_idx = None;
    let mut tax_id_idx = None;
    let mut value_idx = None;
    for (idx, header) in labels.iter().enumerate() {
        match schema.field_for(header) {
            Some(CanonicalField::RecipientId) => id_idx = Some(idx),
            Some(CanonicalField::RecipientName) => name_idx = Some(idx),
            Some(CanonicalField::NationalTaxId) => tax_id_idx = Some(idx),
            Some(CanonicalField::InstallmentValue) => value_idx = Some(idx),
            None => {}
        }
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|source| DatasetError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

        let cell = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        records.push(BeneficiaryRecord {
            recipient_id: cell(id_idx),
            recipient_name: cell(name_idx).unwrap_or_default(),
            national_tax_id: cell(tax_id_idx),
            installment_value: parse_installment(
                value_idx.and_then(|i| row.get(i)).unwrap_or(""),
            ),
        });
    }

    debug!(
        "Loaded {} rows from {} (schema {})",
        records.len(),
        path.display(),
        schema.name
    );

    Ok(Dataset {
        municipality: label.to_string(),
        schema: schema.name,
        records,
    })
}

/// Coerce a raw installment cell to a non-negative finite number.
///
/// Accepts plain decimals and Brazilian locale strings ("1.234,56",
/// "1234,56"). Empty, non-numeric, NaN, and negative input all become 0.0 so
/// downstream sums never propagate undefined values.
pub fn parse_installment(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let candidate = if trimmed.contains(',') {
        // "1.234,56": dots are thousands separators, the comma is decimal.
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };

    match candidate.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_dataset(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_by_code_pbf_schema() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "2910750.csv",
            "NIS FAVORECIDO,NOME FAVORECIDO,VALOR PARCELA\n\
             12345678901,ANA SILVA,\"600,00\"\n\
             ,*** TITULAR MENOR DE 16 ANOS ***,550\n",
        );

        let loader = DatasetLoader::new(dir.path().to_path_buf());
        let dataset = loader.load_by_code("2910750").unwrap().unwrap();

        assert_eq!(dataset.schema, "pbf-payroll");
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].recipient_name, "ANA SILVA");
        assert_eq!(dataset.records[0].recipient_id.as_deref(), Some("12345678901"));
        assert_eq!(dataset.records[0].installment_value, 600.0);
        assert_eq!(dataset.records[1].recipient_id, None);
        assert_eq!(dataset.records[1].installment_value, 550.0);
    }

    #[test]
    fn test_load_by_name_bpc_schema() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "BA/Fátima.csv",
            "nis,cpf,nome,valor\n\
             111,22233344455,JOSE SANTOS,1412.00\n",
        );

        let loader = DatasetLoader::new(dir.path().to_path_buf());
        let dataset = loader.load_by_name("BA", "Fátima").unwrap().unwrap();

        assert_eq!(dataset.schema, "bpc-payroll");
        assert_eq!(dataset.records[0].national_tax_id.as_deref(), Some("22233344455"));
        assert_eq!(dataset.records[0].installment_value, 1412.0);
    }

    #[test]
    fn test_missing_file_is_absent_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DatasetLoader::new(dir.path().to_path_buf());
        assert!(loader.load_by_code("9999999").unwrap().is_none());
        assert!(loader.load_by_name("BA", "Nada").unwrap().is_none());
    }

    #[test]
    fn test_unknown_schema_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path(), "1.csv", "a,b,c\n1,2,3\n");
        let loader = DatasetLoader::new(dir.path().to_path_buf());
        assert!(matches!(
            loader.load_by_code("1"),
            Err(DatasetError::UnknownSchema { .. })
        ));
    }

    #[test]
    fn test_missing_value_cells_become_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(
            dir.path(),
            "1.csv",
            "nome,valor\nANA,600\nBIA,\nCARLA,abc\n",
        );
        let loader = DatasetLoader::new(dir.path().to_path_buf());
        let dataset = loader.load_by_code("1").unwrap().unwrap();
        let values: Vec<f64> = dataset
            .records
            .iter()
            .map(|r| r.installment_value)
            .collect();
        assert_eq!(values, vec![600.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fixture_tree_both_addressing_schemes() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("dados")
            .join("dados_por_municipio");
        let loader = DatasetLoader::new(root);

        let by_code = loader.load_by_code("2910750").unwrap().unwrap();
        assert_eq!(by_code.schema, "pbf-payroll");
        assert_eq!(by_code.len(), 4);
        assert_eq!(by_code.records[0].installment_value, 650.0);

        let by_name = loader.load_by_name("BA", "Fátima").unwrap().unwrap();
        assert_eq!(by_name.schema, "bpc-payroll");
        assert_eq!(by_name.len(), 3);
        assert_eq!(by_name.records[1].national_tax_id, None);
    }

    #[test]
    fn test_parse_installment_plain_and_locale() {
        assert_eq!(parse_installment("600"), 600.0);
        assert_eq!(parse_installment("599.5"), 599.5);
        assert_eq!(parse_installment("1234,56"), 1234.56);
        assert_eq!(parse_installment("1.234,56"), 1234.56);
        assert_eq!(parse_installment(" 700,00 "), 700.0);
    }

    #[test]
    fn test_parse_installment_invalid_maps_to_zero() {
        assert_eq!(parse_installment(""), 0.0);
        assert_eq!(parse_installment("   "), 0.0);
        assert_eq!(parse_installment("n/a"), 0.0);
        assert_eq!(parse_installment("NaN"), 0.0);
        assert_eq!(parse_installment("-10"), 0.0);
    }
}
