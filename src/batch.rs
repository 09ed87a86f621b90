//! Fixed-capacity witness batches.
//!
//! The circuit is compiled for exactly `capacity` database entries, so a
//! batch is always that long: real hashes first, in input order, then
//! all-zero padding. Images that fail to hash are logged and skipped.

use crate::error::{PhashError, Result};
use crate::hash::HashMatrix;
use crate::pipeline::PhashPipeline;
use crate::witness::BatchFile;
use rayon::prelude::*;
use std::fmt;
use std::path::PathBuf;

/// Diagnostic counts for one assembled batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Inputs offered to the batch.
    pub discovered: usize,
    /// Inputs dropped because the batch was already full.
    pub truncated: usize,
    /// Inputs that failed to hash.
    pub failed: usize,
    /// Real hashes in the batch.
    pub processed: usize,
    /// Zero entries appended to reach capacity.
    pub padded: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} discovered, {} truncated, {} failed, {} hashed, {} padding",
            self.discovered, self.truncated, self.failed, self.processed, self.padded
        )
    }
}

/// A closest-entry lookup result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchMatch {
    pub index: usize,
    pub distance: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WitnessBatch {
    entries: Vec<HashMatrix>,
    real: usize,
}

impl WitnessBatch {
    /// All entries, padding included. Always `capacity` long.
    pub fn entries(&self) -> &[HashMatrix] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of leading entries that are real hashes.
    pub fn real_len(&self) -> usize {
        self.real
    }

    pub fn to_file(&self) -> BatchFile {
        BatchFile::from_hashes(&self.entries)
    }

    /// Rebuild a batch from its file. The file does not record which entries
    /// are padding, so trailing all-zero entries are treated as padding.
    pub fn from_file(file: &BatchFile) -> Result<Self> {
        let entries = file.hashes()?;
        let first = entries
            .first()
            .ok_or_else(|| PhashError::dimension("witness batch is empty"))?;
        let size = first.size();
        if let Some(odd) = entries.iter().find(|h| h.size() != size) {
            return Err(PhashError::dimension(format!(
                "mixed hash sizes in batch: {} and {}",
                size,
                odd.size()
            )));
        }
        let real = entries
            .iter()
            .rposition(|h| !h.is_zero())
            .map_or(0, |idx| idx + 1);
        Ok(Self { entries, real })
    }

    /// Closest real entry within `threshold` Hamming distance of `hash`.
    /// Ties go to the earliest entry. Padding is never matched; for a batch
    /// read back with [`WitnessBatch::from_file`] that includes any all-zero
    /// hashes at the end, even if they were real images.
    pub fn closest_match(&self, hash: &HashMatrix, threshold: usize) -> Result<Option<BatchMatch>> {
        let mut best: Option<BatchMatch> = None;
        for (index, entry) in self.entries[..self.real].iter().enumerate() {
            let distance = entry.hamming_distance(hash)?;
            if distance <= threshold && best.map_or(true, |b| distance < b.distance) {
                best = Some(BatchMatch { index, distance });
            }
        }
        Ok(best)
    }
}

/// Truncate or zero-pad `hashes` to exactly `capacity` entries.
pub fn assemble(
    hashes: Vec<HashMatrix>,
    capacity: usize,
    hash_size: usize,
) -> Result<(WitnessBatch, BatchReport)> {
    if capacity == 0 {
        return Err(PhashError::InvalidConfig {
            reason: "batch capacity must be positive".to_string(),
        });
    }
    if let Some(odd) = hashes.iter().find(|h| h.size() != hash_size) {
        return Err(PhashError::dimension(format!(
            "expected {0}x{0} hashes, got {1}x{1}",
            hash_size,
            odd.size()
        )));
    }

    let mut report = BatchReport {
        discovered: hashes.len(),
        ..BatchReport::default()
    };
    let mut entries = hashes;
    if entries.len() > capacity {
        report.truncated = entries.len() - capacity;
        log::warn!(
            "{} hashes exceed batch capacity {}, keeping the first {}",
            entries.len(),
            capacity,
            capacity
        );
        entries.truncate(capacity);
    }
    report.processed = entries.len();
    report.padded = capacity - entries.len();

    let zero = HashMatrix::zero(hash_size)?;
    entries.resize(capacity, zero);
    Ok((
        WitnessBatch {
            entries,
            real: report.processed,
        },
        report,
    ))
}

/// Hash `paths` in parallel. The result is in input order; failures are
/// logged and come back as `None`.
pub fn hash_paths(pipeline: &PhashPipeline, paths: &[PathBuf]) -> Vec<Option<HashMatrix>> {
    paths
        .par_iter()
        .map(|path| match pipeline.hash_path(path) {
            Ok(hash) => Some(hash),
            Err(err) => {
                log::warn!("skipping {}: {}", path.display(), err);
                None
            }
        })
        .collect()
}

/// Hash up to `capacity` images and assemble them into a batch.
///
/// Like the reference tooling, the input list is cut to `capacity` before
/// hashing, so failed images leave padding behind rather than pulling in
/// later files.
pub fn build_batch(
    pipeline: &PhashPipeline,
    paths: &[PathBuf],
) -> Result<(WitnessBatch, BatchReport)> {
    let capacity = pipeline.config().capacity;
    let kept = paths.len().min(capacity);
    if paths.len() > capacity {
        log::warn!(
            "found {} images, only the first {} are processed",
            paths.len(),
            capacity
        );
    } else {
        log::info!("processing all {} images", paths.len());
    }

    let outcomes = hash_paths(pipeline, &paths[..kept]);
    let failed = outcomes.iter().filter(|h| h.is_none()).count();
    let hashes: Vec<HashMatrix> = outcomes.into_iter().flatten().collect();

    let (batch, mut report) = assemble(hashes, capacity, pipeline.config().hash_size)?;
    report.discovered = paths.len();
    report.truncated = paths.len() - kept;
    report.failed = failed;
    log::info!("batch assembled: {}", report);
    Ok((batch, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot(idx: usize) -> HashMatrix {
        let mut rows = vec![vec![0u8; 8]; 8];
        rows[idx / 8][idx % 8] = 1;
        HashMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn pads_to_capacity() {
        let hashes: Vec<_> = (0..3).map(one_hot).collect();
        let (batch, report) = assemble(hashes.clone(), 5, 8).unwrap();
        assert_eq!(batch.capacity(), 5);
        assert_eq!(batch.real_len(), 3);
        assert_eq!(&batch.entries()[..3], hashes.as_slice());
        assert!(batch.entries()[3..].iter().all(HashMatrix::is_zero));
        assert_eq!(
            report,
            BatchReport {
                discovered: 3,
                truncated: 0,
                failed: 0,
                processed: 3,
                padded: 2,
            }
        );
    }

    #[test]
    fn truncates_in_input_order() {
        let hashes: Vec<_> = (0..6).map(one_hot).collect();
        let (batch, report) = assemble(hashes.clone(), 4, 8).unwrap();
        assert_eq!(batch.entries(), &hashes[..4]);
        assert_eq!(report.truncated, 2);
        assert_eq!(report.padded, 0);
    }

    #[test]
    fn rejects_zero_capacity_and_mixed_sizes() {
        assert!(matches!(
            assemble(Vec::new(), 0, 8),
            Err(PhashError::InvalidConfig { .. })
        ));
        let small = HashMatrix::zero(4).unwrap();
        assert!(assemble(vec![small], 2, 8).is_err());
    }

    #[test]
    fn file_roundtrip_recovers_real_entries() {
        let (batch, _) = assemble(vec![one_hot(0), one_hot(9)], 4, 8).unwrap();
        let restored = WitnessBatch::from_file(&batch.to_file()).unwrap();
        assert_eq!(restored, batch);
        assert_eq!(restored.real_len(), 2);
    }

    #[test]
    fn closest_match_respects_threshold_and_skips_padding() {
        let (batch, _) = assemble(vec![one_hot(0), one_hot(1)], 8, 8).unwrap();
        // one_hot(1) is distance 0 from itself and 2 from one_hot(0).
        let hit = batch.closest_match(&one_hot(1), 10).unwrap();
        assert_eq!(hit, Some(BatchMatch { index: 1, distance: 0 }));

        // Padding would match at distance 0, but padding is never matched.
        let zero = HashMatrix::zero(8).unwrap();
        assert_eq!(
            batch.closest_match(&zero, 10).unwrap(),
            Some(BatchMatch { index: 0, distance: 1 })
        );
        assert_eq!(batch.closest_match(&one_hot(5), 1).unwrap(), None);
    }

    #[test]
    fn trailing_zero_hash_is_padding_after_reload() {
        let zero = HashMatrix::zero(8).unwrap();
        let (batch, _) = assemble(vec![one_hot(3), zero.clone()], 4, 8).unwrap();
        assert_eq!(batch.real_len(), 2);
        assert_eq!(
            batch.closest_match(&zero, 0).unwrap(),
            Some(BatchMatch { index: 1, distance: 0 })
        );

        let restored = WitnessBatch::from_file(&batch.to_file()).unwrap();
        assert_eq!(restored.real_len(), 1);
        assert_eq!(restored.closest_match(&zero, 0).unwrap(), None);
    }
}
