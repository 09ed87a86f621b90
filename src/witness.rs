//! JSON files handed to the circuit tooling.
//!
//! All files use plain JSON integers only. Coefficients are written as
//! exact `i128` values so no float formatting ever touches them.

use crate::dct::{CoefficientMatrix, IntensityGrid};
use crate::error::Result;
use crate::hash::HashMatrix;
use crate::matrix::Matrix;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// The witness batch file: `{"dbPhashs": [[[0|1]]]}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFile {
    #[serde(rename = "dbPhashs")]
    pub db_phashs: Vec<Vec<Vec<u8>>>,
}

impl BatchFile {
    pub fn from_hashes<'a>(hashes: impl IntoIterator<Item = &'a HashMatrix>) -> Self {
        Self {
            db_phashs: hashes.into_iter().map(HashMatrix::to_rows).collect(),
        }
    }

    /// Parse every entry, rejecting ragged or non-bit matrices.
    pub fn hashes(&self) -> Result<Vec<HashMatrix>> {
        self.db_phashs
            .iter()
            .map(|rows| HashMatrix::from_rows(rows.clone()))
            .collect()
    }
}

/// Single-image preparation file: the raw grid plus the DCT basis the
/// circuit multiplies it with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedImage {
    pub image: Vec<Vec<u8>>,
    pub dct_coefficients: Vec<Vec<i128>>,
}

impl PreparedImage {
    pub fn new(grid: &IntensityGrid, coefficients: &CoefficientMatrix) -> Self {
        Self {
            image: grid.to_rows(),
            dct_coefficients: coefficients.to_rows(),
        }
    }

    pub fn grid(&self) -> Result<IntensityGrid> {
        Matrix::from_rows(self.image.clone())
    }

    pub fn coefficients(&self) -> Result<CoefficientMatrix> {
        Matrix::from_rows(self.dct_coefficients.clone())
    }
}

/// Input file of the matching circuit. `dbHash` is the decimal Poseidon
/// root of `dbPhashs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInput {
    pub db_hash: String,
    pub threshold: usize,
    pub r2: u64,
    pub image: Vec<Vec<u8>>,
    pub db_phashs: Vec<Vec<Vec<u8>>>,
}

/// Pretty-print `value` to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
