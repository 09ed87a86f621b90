//! Fixed-point DCT-II matching the hash circuit.
//!
//! The basis coefficients are pre-scaled by a power of two and rounded to
//! integers, so both transform passes stay integral. No division happens
//! anywhere: after two passes every value carries a factor of `scale^2`, and
//! all accumulation is done in arbitrary precision so nothing wraps.

use crate::error::{PhashError, Result};
use crate::matrix::Matrix;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

/// Edge length of the intensity grid fed to the circuit.
pub const REFERENCE_SIZE: usize = 32;
/// Power of two the circuit scales its coefficients by.
pub const REFERENCE_SCALE_BITS: u32 = 64;
pub const REFERENCE_SCALE: u128 = 1 << REFERENCE_SCALE_BITS;

/// `size x size` grid of luminance samples in `[0, 255]`.
pub type IntensityGrid = Matrix<u8>;
/// Scaled and rounded DCT-II basis, indexed `[frequency][sample]`.
pub type CoefficientMatrix = Matrix<i128>;

/// Generate the `size x size` fixed-point DCT basis.
///
/// `coefficient[j][k] = round(alpha(j) * cos(pi * (2k + 1) * j / 2N) * scale)`
/// with `alpha(0) = sqrt(1/N)` and `alpha(j > 0) = sqrt(2/N)`. The product is
/// formed in double precision in exactly that order and rounded half to
/// even; at the reference scale every product is already an integer.
pub fn generate_coefficients(size: usize, scale: u128) -> Result<CoefficientMatrix> {
    if size == 0 {
        return Err(PhashError::dimension("coefficient matrix size must be positive"));
    }
    if scale == 0 {
        return Err(PhashError::InvalidScale {
            reason: "scale must be positive".to_string(),
        });
    }

    let n = size as f64;
    let scale_f = scale as f64;
    let mut data = Vec::with_capacity(size * size);
    for j in 0..size {
        let alpha = if j == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        for k in 0..size {
            let theta = PI * (2 * k + 1) as f64 * j as f64 / (2 * size) as f64;
            let value = (alpha * theta.cos() * scale_f).round_ties_even();
            let coeff = value.to_i128().ok_or_else(|| PhashError::InvalidScale {
                reason: format!("coefficient ({}, {}) = {:e} does not fit in i128", j, k, value),
            })?;
            data.push(coeff);
        }
    }
    Matrix::new(size, size, data)
}

/// Coefficients for `(size, scale)`, shared for the reference configuration.
///
/// The reference table is built once per process and handed out behind an
/// `Arc`; other configurations are generated on demand.
pub fn cached_coefficients(size: usize, scale: u128) -> Result<Arc<CoefficientMatrix>> {
    static REFERENCE: OnceLock<Arc<CoefficientMatrix>> = OnceLock::new();

    if (size, scale) != (REFERENCE_SIZE, REFERENCE_SCALE) {
        return generate_coefficients(size, scale).map(Arc::new);
    }
    if let Some(table) = REFERENCE.get() {
        return Ok(Arc::clone(table));
    }
    let table = Arc::new(generate_coefficients(size, scale)?);
    log::debug!("built reference {}x{} DCT table", size, size);
    Ok(Arc::clone(REFERENCE.get_or_init(|| table)))
}

/// One-dimensional transform: `out[j] = sum_k input[k] * coeff[j][k]`.
pub fn dct1d(input: &[BigInt], coeff: &CoefficientMatrix) -> Result<Vec<BigInt>> {
    if coeff.cols() != input.len() {
        return Err(PhashError::InvalidInputLength {
            expected: coeff.cols(),
            actual: input.len(),
        });
    }
    let out = coeff
        .iter_rows()
        .map(|basis| {
            input
                .iter()
                .zip(basis)
                .fold(BigInt::zero(), |acc, (x, &c)| acc + x * BigInt::from(c))
        })
        .collect();
    Ok(out)
}

/// Separable 2D transform: every row with `row_coeff`, then every column of
/// the intermediate with `col_coeff`.
pub fn transform(
    grid: &IntensityGrid,
    row_coeff: &CoefficientMatrix,
    col_coeff: &CoefficientMatrix,
) -> Result<Matrix<BigInt>> {
    if !grid.is_square() {
        return Err(PhashError::dimension(format!(
            "intensity grid must be square, got {}x{}",
            grid.rows(),
            grid.cols()
        )));
    }
    let n = grid.rows();
    for (name, coeff) in [("row", row_coeff), ("column", col_coeff)] {
        if coeff.rows() != n || coeff.cols() != n {
            return Err(PhashError::dimension(format!(
                "{} coefficients are {}x{}, grid is {}x{}",
                name,
                coeff.rows(),
                coeff.cols(),
                n,
                n
            )));
        }
    }

    let mut intermediate = Vec::with_capacity(n * n);
    for row in grid.iter_rows() {
        let samples: Vec<BigInt> = row.iter().map(|&px| BigInt::from(px)).collect();
        intermediate.extend(dct1d(&samples, row_coeff)?);
    }
    let intermediate = Matrix::new(n, n, intermediate)?;

    let mut output = vec![BigInt::zero(); n * n];
    for col in 0..n {
        let column = intermediate.column(col);
        for (row, value) in dct1d(&column, col_coeff)?.into_iter().enumerate() {
            output[row * n + col] = value;
        }
    }
    Matrix::new(n, n, output)
}

/// Top-left `k x k` block of a transformed matrix (the low frequencies).
pub fn extract_low_frequency<T: Clone>(transformed: &Matrix<T>, k: usize) -> Result<Matrix<T>> {
    transformed.top_left(k, k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficients_are_deterministic() {
        let a = generate_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap();
        let b = generate_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cached_table_matches_fresh_generation() {
        let cached = cached_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap();
        let again = cached_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap();
        assert!(Arc::ptr_eq(&cached, &again));
        assert_eq!(
            *cached,
            generate_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap()
        );
    }

    #[test]
    fn reference_dc_row_is_flat() {
        let coeffs = generate_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap();
        assert!(coeffs.row(0).iter().all(|&c| c == 3_260_954_456_333_195_776));
        assert_eq!(coeffs[(1, 0)], 4_606_131_040_650_198_016);
        assert_eq!(coeffs[(31, 31)], -226_284_707_652_516_896);
    }

    #[test]
    fn basis_rows_are_nearly_orthonormal() {
        let coeffs = generate_coefficients(REFERENCE_SIZE, REFERENCE_SCALE).unwrap();
        let unit = BigInt::from(REFERENCE_SCALE) * BigInt::from(REFERENCE_SCALE);
        // Rounding noise is bounded by roughly N * scale, far below scale^2 / 2^40.
        let slack = &unit >> 40u32;
        for j in 0..REFERENCE_SIZE {
            for m in 0..REFERENCE_SIZE {
                let dot = coeffs
                    .row(j)
                    .iter()
                    .zip(coeffs.row(m))
                    .fold(BigInt::zero(), |acc, (&a, &b)| {
                        acc + BigInt::from(a) * BigInt::from(b)
                    });
                let expected = if j == m { unit.clone() } else { BigInt::zero() };
                let err = dot - expected;
                assert!(
                    err.magnitude() < slack.magnitude(),
                    "rows {} and {} are off by {}",
                    j,
                    m,
                    err
                );
            }
        }
    }

    #[test]
    fn tiny_basis_rounds_to_nearest() {
        assert_eq!(generate_coefficients(1, 1000).unwrap().to_rows(), vec![vec![1000]]);
        assert_eq!(
            generate_coefficients(2, 1000).unwrap().to_rows(),
            vec![vec![707, 707], vec![707, -707]]
        );
    }

    #[test]
    fn rejects_invalid_arguments() {
        assert!(matches!(
            generate_coefficients(0, REFERENCE_SCALE),
            Err(PhashError::InvalidDimension { .. })
        ));
        assert!(matches!(
            generate_coefficients(8, 0),
            Err(PhashError::InvalidScale { .. })
        ));
        // alpha(0) = 1 for a single sample, so the coefficient equals the scale.
        assert!(matches!(
            generate_coefficients(1, u128::MAX),
            Err(PhashError::InvalidScale { .. })
        ));
    }

    #[test]
    fn dct1d_is_a_plain_dot_product() {
        let coeffs = generate_coefficients(2, 1000).unwrap();
        let out = dct1d(&[BigInt::from(1), BigInt::from(2)], &coeffs).unwrap();
        assert_eq!(out, vec![BigInt::from(2121), BigInt::from(-707)]);
        assert!(matches!(
            dct1d(&[BigInt::from(1)], &coeffs),
            Err(PhashError::InvalidInputLength {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn transform_runs_rows_then_columns() {
        let coeffs = generate_coefficients(2, 1000).unwrap();
        let grid = Matrix::from_rows(vec![vec![1u8, 2], vec![3, 4]]).unwrap();
        let out = transform(&grid, &coeffs, &coeffs).unwrap();
        let expected: Vec<Vec<BigInt>> = vec![
            vec![BigInt::from(4_998_490), BigInt::from(-999_698)],
            vec![BigInt::from(-1_999_396), BigInt::from(0)],
        ];
        assert_eq!(out.to_rows(), expected);
    }

    #[test]
    fn transform_rejects_mismatched_shapes() {
        let coeffs = generate_coefficients(4, 1000).unwrap();
        let grid = Matrix::filled(2, 2, 9u8).unwrap();
        assert!(matches!(
            transform(&grid, &coeffs, &coeffs),
            Err(PhashError::InvalidDimension { .. })
        ));
        let wide = Matrix::filled(2, 4, 9u8).unwrap();
        assert!(transform(&wide, &coeffs, &coeffs).is_err());
    }

    #[test]
    fn low_frequency_block_is_top_left() {
        let m = Matrix::from_fn(32, 32, |r, c| BigInt::from(r * 100 + c)).unwrap();
        let low = extract_low_frequency(&m, 8).unwrap();
        assert_eq!(low.rows(), 8);
        assert_eq!(low[(7, 7)], BigInt::from(707));
        assert!(extract_low_frequency(&m, 33).is_err());
        assert!(extract_low_frequency(&m, 0).is_err());
    }
}
