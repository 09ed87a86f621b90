//! Median-threshold binarisation and the [`HashMatrix`] it produces.

use crate::error::{PhashError, Result};
use crate::matrix::Matrix;
use std::fmt;
use std::ops::Add;

/// Edge length of the hash matrix (and of the low-frequency block).
pub const HASH_SIZE: usize = 8;

/// A square matrix of hash bits, each cell 0 or 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HashMatrix {
    bits: Matrix<u8>,
}

impl HashMatrix {
    /// The all-zero hash used to pad witness batches.
    pub fn zero(size: usize) -> Result<Self> {
        Ok(Self {
            bits: Matrix::filled(size, size, 0u8)?,
        })
    }

    pub fn from_bits(bits: Matrix<u8>) -> Result<Self> {
        if !bits.is_square() {
            return Err(PhashError::dimension(format!(
                "hash matrix must be square, got {}x{}",
                bits.rows(),
                bits.cols()
            )));
        }
        if let Some(&bad) = bits.as_slice().iter().find(|&&b| b > 1) {
            return Err(PhashError::InvalidBit(bad));
        }
        Ok(Self { bits })
    }

    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self> {
        Self::from_bits(Matrix::from_rows(rows)?)
    }

    pub fn size(&self) -> usize {
        self.bits.rows()
    }

    pub fn bits(&self) -> &Matrix<u8> {
        &self.bits
    }

    pub fn bit(&self, row: usize, col: usize) -> bool {
        self.bits[(row, col)] == 1
    }

    pub fn is_zero(&self) -> bool {
        self.bits.as_slice().iter().all(|&b| b == 0)
    }

    pub fn count_ones(&self) -> usize {
        self.bits.as_slice().iter().filter(|&&b| b == 1).count()
    }

    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.bits.to_rows()
    }

    /// Row-major bits packed MSB first; for an 8x8 hash each row is one byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .as_slice()
            .chunks(8)
            .map(|chunk| {
                let byte = chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b);
                byte << (8 - chunk.len())
            })
            .collect()
    }

    /// Lowercase hex of [`to_bytes`](Self::to_bytes), 16 characters for 8x8.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(encoded: &str, size: usize) -> Result<Self> {
        let bytes = hex::decode(encoded).map_err(|e| PhashError::InvalidHex {
            reason: e.to_string(),
        })?;
        let cells = size * size;
        if bytes.len() != cells.div_ceil(8) {
            return Err(PhashError::InvalidHex {
                reason: format!(
                    "{} bytes cannot encode a {}x{} hash",
                    bytes.len(),
                    size,
                    size
                ),
            });
        }
        let spare = bytes.len() * 8 - cells;
        if spare > 0 && bytes[bytes.len() - 1] & ((1u8 << spare) - 1) != 0 {
            return Err(PhashError::InvalidHex {
                reason: format!("{} trailing padding bits must be zero", spare),
            });
        }
        let bits = (0..cells)
            .map(|idx| (bytes[idx / 8] >> (7 - idx % 8)) & 1)
            .collect();
        Self::from_bits(Matrix::new(size, size, bits)?)
    }

    /// Pack the bits into an integer, bit `row * size + col` least
    /// significant first. This is the leaf encoding of the hash database
    /// commitment. `None` when the hash has more than 64 cells.
    pub fn to_packed(&self) -> Option<u64> {
        if self.bits.as_slice().len() > 64 {
            return None;
        }
        Some(
            self.bits
                .as_slice()
                .iter()
                .enumerate()
                .fold(0u64, |acc, (idx, &b)| acc | (u64::from(b) << idx)),
        )
    }

    /// Number of differing cells.
    pub fn hamming_distance(&self, other: &HashMatrix) -> Result<usize> {
        if self.size() != other.size() {
            return Err(PhashError::dimension(format!(
                "cannot compare {0}x{0} and {1}x{1} hashes",
                self.size(),
                other.size()
            )));
        }
        Ok(self
            .bits
            .as_slice()
            .iter()
            .zip(other.bits.as_slice())
            .filter(|(a, b)| a != b)
            .count())
    }
}

impl fmt::Display for HashMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, row) in self.bits.iter_rows().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            for bit in row {
                write!(f, "{}", bit)?;
            }
        }
        Ok(())
    }
}

/// Sum of the two central values of an even-length sorted sequence.
///
/// Using the sum keeps the threshold integral: comparing `2 * v` against it
/// is the same as comparing `v` against the median.
pub fn median_sum<T>(sorted: &[T]) -> Result<T>
where
    for<'a> &'a T: Add<&'a T, Output = T>,
{
    let n = sorted.len();
    if n < 2 || n % 2 != 0 {
        return Err(PhashError::InvalidInputLength {
            expected: n.max(2).next_multiple_of(2),
            actual: n,
        });
    }
    Ok(&sorted[n / 2 - 1] + &sorted[n / 2])
}

/// Binarise the low-frequency block against the median of `sorted`.
///
/// A cell is 1 iff `2 * value > sorted[n/2 - 1] + sorted[n/2]`; ties give 0.
/// `sorted` must hold exactly one value per cell of `low_freq`.
pub fn threshold_hash<T>(low_freq: &Matrix<T>, sorted: &[T]) -> Result<HashMatrix>
where
    T: Ord,
    for<'a> &'a T: Add<&'a T, Output = T>,
{
    if !low_freq.is_square() {
        return Err(PhashError::dimension(format!(
            "low-frequency block must be square, got {}x{}",
            low_freq.rows(),
            low_freq.cols()
        )));
    }
    let cells = low_freq.as_slice().len();
    if sorted.len() != cells {
        return Err(PhashError::InvalidInputLength {
            expected: cells,
            actual: sorted.len(),
        });
    }

    let threshold = median_sum(sorted)?;
    let bits = low_freq.map(|value| u8::from((value + value) > threshold));
    HashMatrix::from_bits(bits)
}
