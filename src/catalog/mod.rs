//! Municipality catalog resolution.
//!
//! Two catalog sources exist upstream: a directory tree partitioned by state
//! (state = subfolder, municipality = dataset file stem) and a JSON index
//! shaped as `{"data": [{"Nome", "Uf", "Codigo"}, ...]}`. Both implement the
//! same resolver contract behind a single tagged variant.

use crate::models::Municipality;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Extension of the per-municipality dataset files.
pub const DATASET_EXTENSION: &str = "csv";

/// Failures while resolving the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog root (or a requested state subdirectory) does not exist.
    /// Callers render an empty-state message, not a crash.
    #[error("catalog not found: {0}")]
    Unavailable(PathBuf),

    #[error("failed to read catalog {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog {path}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The JSON catalog document.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    data: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "Nome")]
    name: String,
    #[serde(rename = "Uf")]
    uf: String,
    #[serde(rename = "Codigo")]
    code: String,
}

/// A catalog of states and municipalities, backed by either a directory tree
/// or a JSON index.
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// `<root>/<UF>/<municipality>.csv` layout; names come from the tree.
    Directory(PathBuf),
    /// A single JSON document listing every municipality with its IBGE code.
    Json(PathBuf),
}

impl CatalogSource {
    /// List available state codes, sorted and de-duplicated.
    pub fn list_states(&self) -> Result<Vec<String>, CatalogError> {
        match self {
            CatalogSource::Directory(root) => {
                if !root.exists() {
                    return Err(CatalogError::Unavailable(root.clone()));
                }
                let entries = fs::read_dir(root).map_err(|source| CatalogError::Io {
                    path: root.clone(),
                    source,
                })?;

                let mut states: Vec<String> = entries
                    .flatten()
                    .filter(|entry| entry.path().is_dir())
                    .map(|entry| entry.file_name().to_string_lossy().to_string())
                    .collect();
                states.sort();
                Ok(states)
            }
            CatalogSource::Json(path) => {
                let entries = load_json_catalog(path)?;
                let states: BTreeSet<String> =
                    entries.into_iter().map(|entry| entry.uf).collect();
                Ok(states.into_iter().collect())
            }
        }
    }

    /// List municipalities for one state.
    ///
    /// Directory variant: dataset file stems, sorted. JSON variant: records
    /// with a matching `Uf`, in original catalog order. An empty list is a
    /// valid terminal state.
    pub fn list_municipalities(&self, state: &str) -> Result<Vec<Municipality>, CatalogError> {
        match self {
            CatalogSource::Directory(root) => {
                let state_dir = root.join(state);
                if !state_dir.exists() {
                    return Err(CatalogError::Unavailable(state_dir));
                }
                let entries = fs::read_dir(&state_dir).map_err(|source| CatalogError::Io {
                    path: state_dir.clone(),
                    source,
                })?;

                let mut municipalities: Vec<Municipality> = entries
                    .flatten()
                    .map(|entry| entry.path())
                    .filter(|path| {
                        path.is_file()
                            && path.extension().and_then(|e| e.to_str())
                                == Some(DATASET_EXTENSION)
                    })
                    .filter_map(|path| {
                        path.file_stem()
                            .map(|stem| stem.to_string_lossy().to_string())
                    })
                    .map(|name| Municipality {
                        name,
                        state_code: state.to_string(),
                        ibge_code: None,
                    })
                    .collect();
                municipalities.sort_by(|a, b| a.name.cmp(&b.name));

                debug!(
                    "Found {} municipalities under {}",
                    municipalities.len(),
                    state_dir.display()
                );
                Ok(municipalities)
            }
            CatalogSource::Json(path) => {
                let entries = load_json_catalog(path)?;
                Ok(entries
                    .into_iter()
                    .filter(|entry| entry.uf == state)
                    .map(|entry| Municipality {
                        name: entry.name,
                        state_code: entry.uf,
                        ibge_code: Some(entry.code),
                    })
                    .collect())
            }
        }
    }
}

/// Find a municipality by name, case-insensitively. First match wins.
///
/// Known limitation: two differently-accented names that compare equal
/// case-insensitively would collide; upstream defines no tie-break, so the
/// first catalog entry is returned.
pub fn resolve_code<'a>(
    name: &str,
    municipalities: &'a [Municipality],
) -> Option<&'a Municipality> {
    let wanted = name.to_lowercase();
    municipalities
        .iter()
        .find(|municipality| municipality.name.to_lowercase() == wanted)
}

fn load_json_catalog(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::Unavailable(path.to_path_buf()));
    }
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: CatalogDocument =
        serde_json::from_str(&content).map_err(|source| CatalogError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(document.data)
}
