//! Destinations for finished NTriples output units
//!
//! Each named resource becomes one unit. A unit is only handed over once
//! its complete text exists, so a failed resolution never leaves a
//! half-written file behind.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::ConvertError;

/// One independent piece of output (one `.nt` file)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Sanitized file name, e.g. `X1-X1.nt`
    pub file_name: String,
    /// Identifier (or numbered id) of the resource, for error reports
    pub resource: String,
    /// NTriples text
    pub content: String,
}

/// Trait for receiving output units during conversion
pub trait TripleSink {
    fn write_unit(&mut self, unit: &OutputUnit) -> Result<(), ConvertError>;
}

/// Writes every unit to its own file in a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TripleSink for DirectorySink {
    fn write_unit(&mut self, unit: &OutputUnit) -> Result<(), ConvertError> {
        let path = self.dir.join(&unit.file_name);
        info!("Writing '{}' to file '{}'", unit.resource, path.display());

        fs::write(&path, &unit.content).map_err(|source| ConvertError::Write {
            path: path.clone(),
            resource: unit.resource.clone(),
            source,
        })
    }
}

/// Keeps units in memory, in the order they were produced
#[derive(Debug, Default)]
pub struct MemorySink {
    pub units: Vec<OutputUnit>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of the unit with the given file name
    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.units
            .iter()
            .find(|u| u.file_name == file_name)
            .map(|u| u.content.as_str())
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.file_name.as_str()).collect()
    }
}

impl TripleSink for MemorySink {
    fn write_unit(&mut self, unit: &OutputUnit) -> Result<(), ConvertError> {
        self.units.push(unit.clone());
        Ok(())
    }
}
