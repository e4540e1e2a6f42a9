// Driver input data
// The data file that decides how many jobs and stages the example workflow gets

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid data file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read data file: {0}")]
    Io(#[from] std::io::Error),
}

/// Things to build and environments to deploy to
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Data {
    #[serde(default, alias = "Things")]
    pub things: Vec<String>,

    #[serde(default, alias = "Environments")]
    pub environments: Vec<String>,
}

impl Data {
    pub fn parse(raw: &[u8]) -> Result<Self, DataError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_slice(raw)?)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, DataError> {
        let raw = std::fs::read(path)?;
        Self::parse(&raw)
    }
}
