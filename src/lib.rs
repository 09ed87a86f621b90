//! Circuit-compatible perceptual hashing.
//!
//! `zkphash` computes an 8x8 pHash with a fixed-point DCT whose every
//! intermediate value matches a zero-knowledge circuit performing the same
//! computation over field integers. The hash of an image can therefore be
//! published as a commitment and later proven inside the circuit.
//!
//! ```no_run
//! use zkphash::generate_phash;
//!
//! let img = image::open("photo.jpg").unwrap();
//! let hash = generate_phash(&img).unwrap();
//! println!("{}", hash.to_hex());
//! ```

pub mod batch;
pub mod bitonic;
#[cfg(feature = "commit")]
pub mod commit;
pub mod config;
pub mod dct;
pub mod discover;
pub mod error;
pub mod hash;
pub mod matrix;
pub mod pipeline;
pub mod preprocess;
pub mod witness;

pub use batch::{assemble, build_batch, BatchMatch, BatchReport, WitnessBatch};
pub use bitonic::{bitonic_sort, BitonicNetwork, StageSchedule};
pub use config::PhashConfig;
pub use dct::{
    dct1d, extract_low_frequency, generate_coefficients, transform, CoefficientMatrix,
    IntensityGrid,
};
pub use error::{PhashError, Result};
pub use hash::{threshold_hash, HashMatrix};
pub use matrix::Matrix;
pub use pipeline::{PhashPipeline, PhashTrace};
pub use witness::{BatchFile, CircuitInput, PreparedImage};

use image::DynamicImage;

/// Hash `img` with the default configuration.
pub fn generate_phash(img: &DynamicImage) -> Result<HashMatrix> {
    PhashPipeline::reference()?.hash_image(img)
}
