//! Per-partition oversampling driver
//!
//! Walks every row of a partition in order and draws `n_synth` synthetic
//! samples per row, choosing between interpolation and noise injection with
//! the safe-distance heuristic. Output is base-row-major: synthetic sample
//! `row * n_synth + draw`.

use crate::data::{Dataset, Sample};
use crate::sampling::knn::NearestNeighborIndex;
use crate::sampling::synth::{PartitionStats, SyntheticSampleGenerator};
use rand::rngs::StdRng;
use rand::Rng;

/// Orchestrates neighbor search and generator selection across one partition.
#[derive(Debug, Clone)]
pub struct PartitionOversampler {
    /// Synthetic samples per base row
    pub n_synth: usize,
    /// Requested neighbor count (clamped to partition size - 1)
    pub k_neighbours: usize,
    /// Noise scale factor for the noise-injection strategy
    pub perturbation: f64,
}

impl PartitionOversampler {
    pub fn new(n_synth: usize, k_neighbours: usize, perturbation: f64) -> Self {
        Self {
            n_synth,
            k_neighbours,
            perturbation,
        }
    }

    /// Produce exactly `partition.n_rows() * n_synth` synthetic samples.
    ///
    /// Per draw: pick one neighbor uniformly among the effective-k candidates.
    /// `safe_distance` is half the distance at index `(effective_k + 1) / 2`
    /// when more than one neighbor exists, else unbounded. A chosen neighbor
    /// strictly inside the safe radius is interpolated toward; otherwise the
    /// base is perturbed with noise capped at the safe radius.
    pub fn process(&self, partition: &Dataset, rng: &mut StdRng) -> Vec<Sample> {
        let n_rows = partition.n_rows();
        let index = NearestNeighborIndex::new(partition.numeric_matrix());
        let table = index.search(self.k_neighbours);
        let stats = PartitionStats::compute(partition);
        let generator = SyntheticSampleGenerator::new(partition, &stats, index.vectors());

        let mut samples = Vec::with_capacity(n_rows * self.n_synth);

        for row in 0..n_rows {
            let dists = &table.distances[row];
            let neighbours = &table.indices[row];
            let effective_k = neighbours.len();

            for _ in 0..self.n_synth {
                if effective_k == 0 {
                    // No eligible neighbor: noise injection is the only option
                    samples.push(generator.perturb(row, self.perturbation, rng));
                    continue;
                }

                let pick = rng.gen_range(0..effective_k);
                let dist = dists[pick];
                let safe_distance = if effective_k > 1 {
                    dists[(effective_k + 1) / 2] / 2.0
                } else {
                    f64::INFINITY
                };

                if dist < safe_distance {
                    samples.push(generator.interpolate(row, neighbours[pick], rng));
                } else {
                    let capped = safe_distance.min(self.perturbation);
                    samples.push(generator.perturb(row, capped, rng));
                }
            }
        }

        samples
    }
}
