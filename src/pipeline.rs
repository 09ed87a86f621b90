//! End-to-end hashing: coefficients, transform, extraction, sort, threshold.

use crate::bitonic::BitonicNetwork;
use crate::config::PhashConfig;
use crate::dct::{self, CoefficientMatrix, IntensityGrid};
use crate::error::Result;
use crate::hash::{self, HashMatrix};
use crate::matrix::Matrix;
use crate::preprocess;
use crate::witness::PreparedImage;
use image::DynamicImage;
use num_bigint::BigInt;
use std::path::Path;
use std::sync::Arc;

/// Every intermediate value of one hash computation, in circuit order.
#[derive(Clone, Debug)]
pub struct PhashTrace {
    pub transformed: Matrix<BigInt>,
    pub low_freq: Matrix<BigInt>,
    pub sorted: Vec<BigInt>,
    pub median_sum: BigInt,
    pub hash: HashMatrix,
}

/// A configured hasher. Immutable after construction, so it can be shared
/// across rayon workers by reference.
#[derive(Clone, Debug)]
pub struct PhashPipeline {
    config: PhashConfig,
    coefficients: Arc<CoefficientMatrix>,
    network: BitonicNetwork,
}

impl PhashPipeline {
    pub fn new(config: PhashConfig) -> Result<Self> {
        config.validate()?;
        let coefficients = dct::cached_coefficients(config.size, config.scale()?)?;
        let network =
            BitonicNetwork::new(config.hash_size * config.hash_size, config.schedule)?;
        log::debug!(
            "pipeline ready: {}x{} grid, {}x{} hash, scale 2^{}, {} schedule",
            config.size,
            config.size,
            config.hash_size,
            config.hash_size,
            config.scale_bits,
            config.schedule
        );
        Ok(Self {
            config,
            coefficients,
            network,
        })
    }

    /// The default configuration: 32x32 grid, 8x8 hash, 2^64 scale and the
    /// sorting (ascending) stage schedule. Circuits built from the
    /// descending stage loop need `schedule: StageSchedule::Descending`.
    pub fn reference() -> Result<Self> {
        Self::new(PhashConfig::default())
    }

    pub fn config(&self) -> &PhashConfig {
        &self.config
    }

    pub fn coefficients(&self) -> &CoefficientMatrix {
        &self.coefficients
    }

    pub fn network(&self) -> &BitonicNetwork {
        &self.network
    }

    /// Run the full pipeline on `grid`, keeping every intermediate.
    pub fn trace_grid(&self, grid: &IntensityGrid) -> Result<PhashTrace> {
        let transformed = dct::transform(grid, &self.coefficients, &self.coefficients)?;
        let low_freq = dct::extract_low_frequency(&transformed, self.config.hash_size)?;
        let mut sorted = low_freq.as_slice().to_vec();
        self.network.sort(&mut sorted)?;
        let median_sum = hash::median_sum(&sorted)?;
        let hash = hash::threshold_hash(&low_freq, &sorted)?;
        Ok(PhashTrace {
            transformed,
            low_freq,
            sorted,
            median_sum,
            hash,
        })
    }

    pub fn hash_grid(&self, grid: &IntensityGrid) -> Result<HashMatrix> {
        self.trace_grid(grid).map(|trace| trace.hash)
    }

    pub fn hash_image(&self, img: &DynamicImage) -> Result<HashMatrix> {
        let grid = preprocess::grid_from_image(img, self.config.size)?;
        self.hash_grid(&grid)
    }

    pub fn hash_path(&self, path: &Path) -> Result<HashMatrix> {
        let grid = preprocess::load_grid(path, self.config.size)?;
        let hash = self.hash_grid(&grid)?;
        log::debug!("{}: {}", path.display(), hash.to_hex());
        Ok(hash)
    }

    /// Build the single-image preparation file for `path`.
    pub fn prepare_path(&self, path: &Path) -> Result<PreparedImage> {
        let grid = preprocess::load_grid(path, self.config.size)?;
        Ok(PreparedImage::new(&grid, &self.coefficients))
    }
}
