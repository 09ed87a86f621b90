//! Poseidon commitments the matching circuit takes as public inputs.
//!
//! Hashing follows circomlib: BN254 scalar field, x^5 S-box, one parameter
//! set per input count. The hash database is committed as a binary Merkle
//! tree whose leaves are the packed hashes, zero-padded to a power of two.

use crate::error::{PhashError, Result};
use crate::hash::HashMatrix;
use crate::witness::{BatchFile, CircuitInput, PreparedImage};
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use num_bigint::BigUint;

/// Blinding value used when none is supplied.
pub const DEFAULT_BLINDING: u64 = 123_456_789;

/// circom Poseidon of `inputs`.
pub fn poseidon(inputs: &[Fr]) -> Result<Fr> {
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())?;
    Ok(hasher.hash(inputs)?)
}

/// The packed hash as a field element.
pub fn leaf(hash: &HashMatrix) -> Result<Fr> {
    hash.to_packed().map(Fr::from).ok_or_else(|| {
        PhashError::dimension(format!(
            "a {0}x{0} hash does not fit in one leaf",
            hash.size()
        ))
    })
}

/// Root of the Poseidon tree over `leaves`, padded with zero leaves to the
/// next power of two.
pub fn merkle_root(leaves: &[Fr]) -> Result<Fr> {
    if leaves.is_empty() {
        return Err(PhashError::dimension("cannot commit to zero leaves"));
    }
    let mut level = leaves.to_vec();
    level.resize(leaves.len().next_power_of_two(), Fr::from(0u64));

    let mut hasher = Poseidon::<Fr>::new_circom(2)?;
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| hasher.hash(pair))
            .collect::<std::result::Result<Vec<_>, _>>()?;
    }
    Ok(level[0])
}

/// Merkle root over every entry of a batch, padding included.
pub fn commit_hashes(hashes: &[HashMatrix]) -> Result<Fr> {
    let leaves = hashes.iter().map(leaf).collect::<Result<Vec<_>>>()?;
    let root = merkle_root(&leaves)?;
    log::debug!(
        "committed {} hashes ({} leaves)",
        hashes.len(),
        hashes.len().next_power_of_two()
    );
    Ok(root)
}

/// Canonical base-10 form, as circom input files carry field elements.
pub fn to_decimal(value: &Fr) -> String {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le()).to_string()
}

/// Assemble the matching circuit's input file.
pub fn circuit_input(
    batch: &BatchFile,
    prepared: &PreparedImage,
    threshold: usize,
    r2: u64,
) -> Result<CircuitInput> {
    let hashes = batch.hashes()?;
    let grid = prepared.grid()?;
    let db_hash = commit_hashes(&hashes)?;
    Ok(CircuitInput {
        db_hash: to_decimal(&db_hash),
        threshold,
        r2,
        image: grid.to_rows(),
        db_phashs: batch.db_phashs.clone(),
    })
}
