//! Pipeline and batch parameters.
//!
//! Every numeric parameter here is baked into the circuit at compile time;
//! a mismatch does not fail loudly, it silently produces hashes the circuit
//! will never reproduce. The defaults produce a sorted median (ascending
//! stage schedule); set `schedule` to `descending` to reproduce the gate
//! trace of circuits compiled from the descending stage loop.

use crate::bitonic::StageSchedule;
use crate::dct::{REFERENCE_SCALE_BITS, REFERENCE_SIZE};
use crate::error::{PhashError, Result};
use crate::hash::HASH_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Witness batch capacity of the smaller deployed circuit.
pub const DEFAULT_CAPACITY: usize = 128;
/// Hamming distance the matching circuit accepts by default.
pub const DEFAULT_THRESHOLD: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhashConfig {
    /// Edge length of the intensity grid and DCT basis.
    pub size: usize,
    /// Edge length of the low-frequency block and the hash.
    pub hash_size: usize,
    /// Coefficients are scaled by `2^scale_bits`.
    pub scale_bits: u32,
    pub schedule: StageSchedule,
    /// Number of entries in a witness batch.
    pub capacity: usize,
    /// Largest Hamming distance still reported as a match.
    pub threshold: usize,
}

impl Default for PhashConfig {
    fn default() -> Self {
        Self {
            size: REFERENCE_SIZE,
            hash_size: HASH_SIZE,
            scale_bits: REFERENCE_SCALE_BITS,
            schedule: StageSchedule::Ascending,
            capacity: DEFAULT_CAPACITY,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl PhashConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// The fixed-point scale `2^scale_bits`.
    pub fn scale(&self) -> Result<u128> {
        1u128
            .checked_shl(self.scale_bits)
            .ok_or_else(|| PhashError::InvalidScale {
                reason: format!("scale_bits must be below 128, got {}", self.scale_bits),
            })
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(PhashError::InvalidConfig { reason });

        if self.size == 0 {
            return invalid("size must be positive".to_string());
        }
        if self.hash_size == 0 || self.hash_size > self.size {
            return invalid(format!(
                "hash_size must be in 1..={}, got {}",
                self.size, self.hash_size
            ));
        }
        let cells = self.hash_size * self.hash_size;
        if cells < 2 || !cells.is_power_of_two() {
            return invalid(format!(
                "hash_size^2 must be a power of two >= 2 for the sorting network, got {}",
                cells
            ));
        }
        if self.capacity == 0 {
            return invalid("capacity must be positive".to_string());
        }
        self.scale()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_circuit() {
        let config = PhashConfig::default();
        assert_eq!(config.size, 32);
        assert_eq!(config.hash_size, 8);
        assert_eq!(config.scale().unwrap(), 1u128 << 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            PhashConfig::from_json_str(r#"{ "capacity": 500, "schedule": "descending" }"#).unwrap();
        assert_eq!(config.capacity, 500);
        assert_eq!(config.schedule, StageSchedule::Descending);
        assert_eq!(config.size, 32);
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            PhashConfig::from_json_str(r#"{ "scale": 5 }"#),
            Err(PhashError::Json(_))
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            PhashConfig {
                hash_size: 6,
                ..PhashConfig::default()
            },
            PhashConfig {
                hash_size: 64,
                ..PhashConfig::default()
            },
            PhashConfig {
                capacity: 0,
                ..PhashConfig::default()
            },
            PhashConfig {
                size: 0,
                ..PhashConfig::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(PhashError::InvalidConfig { .. })),
                "{:?} should be rejected",
                config
            );
        }
        let wide = PhashConfig {
            scale_bits: 128,
            ..PhashConfig::default()
        };
        assert!(matches!(
            wide.validate(),
            Err(PhashError::InvalidScale { .. })
        ));
    }
}
