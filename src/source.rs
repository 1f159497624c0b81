//! Access to the infant records owned by the backend.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{ReportError, Result};
use crate::model::Infant;

/// Supplier of the full infant list.
pub trait InfantSource {
    fn fetch_all_infants(&self) -> Result<Vec<Infant>>;
}

/// Reads a JSON export of the backend's infant list.
///
/// The file may hold either a bare array or the backend's list envelope,
/// `{ "data": [...] }`.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parses the backend's JSON infant list.
pub fn parse_infants(json: &str) -> Result<Vec<Infant>> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| ReportError::Fetch(err.to_string()))?;
    let list = match value {
        serde_json::Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    let infants: Vec<Infant> =
        serde_json::from_value(list).map_err(|err| ReportError::Data(err.to_string()))?;
    Ok(infants)
}

impl InfantSource for JsonFileSource {
    fn fetch_all_infants(&self) -> Result<Vec<Infant>> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            ReportError::Fetch(format!("reading {}: {}", self.path.display(), err))
        })?;
        let infants = parse_infants(&raw)?;
        debug!("loaded {} infant(s) from {}", infants.len(), self.path.display());
        Ok(infants)
    }
}

/// Serves a fixed, in-memory infant list.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    infants: Vec<Infant>,
}

impl StaticSource {
    pub fn new(infants: Vec<Infant>) -> Self {
        Self { infants }
    }
}

impl InfantSource for StaticSource {
    fn fetch_all_infants(&self) -> Result<Vec<Infant>> {
        Ok(self.infants.clone())
    }
}
