use proptest::prelude::*;
use zkphash::bitonic::{bitonic_sort_with, SORT_WIDTH};
use zkphash::hash::median_sum;
use zkphash::{assemble, bitonic_sort, threshold_hash, HashMatrix, Matrix, StageSchedule};

fn sorted_copy(values: &[i64]) -> Vec<i64> {
    let mut out = values.to_vec();
    out.sort_unstable();
    out
}

fn hash_strategy() -> impl Strategy<Value = HashMatrix> {
    prop::collection::vec(0u8..=1, 64)
        .prop_map(|bits| HashMatrix::from_bits(Matrix::new(8, 8, bits).unwrap()).unwrap())
}

proptest! {
    #[test]
    fn bitonic_output_is_a_sorted_permutation(values in prop::collection::vec(any::<i64>(), SORT_WIDTH)) {
        let out = bitonic_sort(&values).unwrap();
        prop_assert!(out.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(sorted_copy(&out), sorted_copy(&values));
        prop_assert_eq!(&out, &sorted_copy(&values));
    }

    #[test]
    fn bitonic_is_deterministic(values in prop::collection::vec(-50i64..50, SORT_WIDTH)) {
        for schedule in [StageSchedule::Ascending, StageSchedule::Descending] {
            let first = bitonic_sort_with(&values, schedule).unwrap();
            let second = bitonic_sort_with(&values, schedule).unwrap();
            prop_assert_eq!(&first, &second);
            // Either schedule only ever permutes its input.
            prop_assert_eq!(sorted_copy(&first), sorted_copy(&values));
        }
    }

    #[test]
    fn bitonic_rejects_other_lengths(len in 0usize..200) {
        prop_assume!(len != SORT_WIDTH);
        prop_assert!(bitonic_sort(&vec![0i64; len]).is_err());
    }

    #[test]
    fn threshold_bits_follow_the_strict_rule(values in prop::collection::vec(-1_000_000i64..1_000_000, 64)) {
        let low = Matrix::new(8, 8, values.clone()).unwrap();
        let sorted = bitonic_sort(&values).unwrap();
        let hash = threshold_hash(&low, &sorted).unwrap();
        let threshold = median_sum(&sorted).unwrap();
        prop_assert_eq!(threshold, sorted[31] + sorted[32]);
        for i in 0..8 {
            for j in 0..8 {
                let bit = hash.bits()[(i, j)];
                prop_assert!(bit <= 1);
                prop_assert_eq!(bit == 1, 2 * low[(i, j)] > threshold);
            }
        }
    }

    #[test]
    fn batches_are_always_full(
        hashes in prop::collection::vec(hash_strategy(), 0..40),
        capacity in 1usize..32,
    ) {
        let (batch, report) = assemble(hashes.clone(), capacity, 8).unwrap();
        let kept = hashes.len().min(capacity);
        prop_assert_eq!(batch.capacity(), capacity);
        prop_assert_eq!(batch.real_len(), kept);
        prop_assert_eq!(&batch.entries()[..kept], &hashes[..kept]);
        prop_assert!(batch.entries()[kept..].iter().all(HashMatrix::is_zero));
        prop_assert_eq!(report.processed + report.padded, capacity);
        prop_assert_eq!(report.truncated, hashes.len() - kept);
    }
}
