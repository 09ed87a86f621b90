//! Data-independent bitonic sorting network.
//!
//! The circuit cannot branch on witness values, so sorting is expressed as a
//! static list of compare-and-swap gates. The same gate list drives the
//! native sort here; [`BitonicNetwork::sort_traced`] exposes every
//! intermediate state so traces can be compared layer by layer.

use crate::error::{PhashError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of values the hash circuit sorts (an 8x8 block).
pub const SORT_WIDTH: usize = 64;

/// Order in which the bitonic stages are emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StageSchedule {
    /// Stages 1..=log2(n): the textbook network, always sorts ascending.
    #[default]
    Ascending,
    /// Stages log2(n)..=1, as emitted by circuits built from a descending
    /// stage loop. Same gates per stage, but the result is not sorted in
    /// general.
    Descending,
}

impl fmt::Display for StageSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageSchedule::Ascending => write!(f, "ascending"),
            StageSchedule::Descending => write!(f, "descending"),
        }
    }
}

/// A single compare-and-swap gate. `low < high` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub low: usize,
    pub high: usize,
    /// Leave the smaller value at `low` when set, the larger one otherwise.
    pub ascending: bool,
}

impl Comparator {
    /// Apply the gate in place. Returns whether the two values were swapped.
    pub fn apply<T: Ord>(&self, values: &mut [T]) -> bool {
        let (a, b) = (&values[self.low], &values[self.high]);
        let swap = if self.ascending { a > b } else { a < b };
        if swap {
            values.swap(self.low, self.high);
        }
        swap
    }
}

/// Gates sharing one `(stage, distance)` pair. Gates within a layer touch
/// disjoint indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layer {
    /// Stage `p`; the block direction is taken from bit `p` of the index.
    pub stage: u32,
    /// Swap distance `2^q`.
    pub distance: usize,
    pub comparators: Vec<Comparator>,
}

/// A bitonic network over a power-of-two number of values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitonicNetwork {
    width: usize,
    schedule: StageSchedule,
    layers: Vec<Layer>,
}

impl BitonicNetwork {
    pub fn new(width: usize, schedule: StageSchedule) -> Result<Self> {
        if width < 2 || !width.is_power_of_two() {
            return Err(PhashError::dimension(format!(
                "bitonic network width must be a power of two >= 2, got {}",
                width
            )));
        }
        Ok(Self::build(width.trailing_zeros(), schedule))
    }

    fn build(stages: u32, schedule: StageSchedule) -> Self {
        let width = 1usize << stages;
        let order: Vec<u32> = match schedule {
            StageSchedule::Ascending => (1..=stages).collect(),
            StageSchedule::Descending => (1..=stages).rev().collect(),
        };

        let mut layers = Vec::new();
        for p in order {
            let block = 1usize << p;
            for q in (0..p).rev() {
                let distance = 1usize << q;
                let comparators = (0..width)
                    .filter_map(|i| {
                        let j = i ^ distance;
                        (j > i).then_some(Comparator {
                            low: i,
                            high: j,
                            ascending: i & block == 0,
                        })
                    })
                    .collect();
                layers.push(Layer {
                    stage: p,
                    distance,
                    comparators,
                });
            }
        }

        Self {
            width,
            schedule,
            layers,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn schedule(&self) -> StageSchedule {
        self.schedule
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn stage_count(&self) -> usize {
        self.width.trailing_zeros() as usize
    }

    pub fn comparator_count(&self) -> usize {
        self.layers.iter().map(|l| l.comparators.len()).sum()
    }

    /// Number of layers in each stage, in emission order.
    pub fn stage_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<(u32, usize)> = Vec::new();
        for layer in &self.layers {
            match sizes.last_mut() {
                Some((stage, count)) if *stage == layer.stage => *count += 1,
                _ => sizes.push((layer.stage, 1)),
            }
        }
        sizes.into_iter().map(|(_, count)| count).collect()
    }

    fn check_width(&self, len: usize) -> Result<()> {
        if len != self.width {
            return Err(PhashError::InvalidInputLength {
                expected: self.width,
                actual: len,
            });
        }
        Ok(())
    }

    /// Run every gate over `values` in place.
    pub fn sort<T: Ord>(&self, values: &mut [T]) -> Result<()> {
        self.check_width(values.len())?;
        for layer in &self.layers {
            for gate in &layer.comparators {
                gate.apply(values);
            }
        }
        Ok(())
    }

    /// Like [`sort`](Self::sort), also returning a snapshot after each layer.
    pub fn sort_traced<T: Ord + Clone>(&self, values: &mut [T]) -> Result<Vec<Vec<T>>> {
        self.check_width(values.len())?;
        let mut trace = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            for gate in &layer.comparators {
                gate.apply(values);
            }
            trace.push(values.to_vec());
        }
        Ok(trace)
    }
}

/// The 64-wide ascending network, built once per process.
pub fn reference_network() -> &'static BitonicNetwork {
    static NETWORK: OnceLock<BitonicNetwork> = OnceLock::new();
    NETWORK.get_or_init(|| {
        BitonicNetwork::build(SORT_WIDTH.trailing_zeros(), StageSchedule::Ascending)
    })
}

/// Sort exactly 64 values through the reference network.
pub fn bitonic_sort<T: Ord + Clone>(values: &[T]) -> Result<Vec<T>> {
    let mut out = values.to_vec();
    reference_network().sort(&mut out)?;
    Ok(out)
}

/// Sort exactly 64 values with an explicit stage schedule.
pub fn bitonic_sort_with<T: Ord + Clone>(values: &[T], schedule: StageSchedule) -> Result<Vec<T>> {
    let mut out = values.to_vec();
    match schedule {
        StageSchedule::Ascending => reference_network().sort(&mut out)?,
        StageSchedule::Descending => BitonicNetwork::new(SORT_WIDTH, schedule)?.sort(&mut out)?,
    }
    Ok(out)
}
