//! Synthetic sample generation strategies
//!
//! Two strategies over a base row: interpolation toward a real neighbor, and
//! localized Gaussian noise injection. The oversampler picks between them per
//! draw using the safe-distance heuristic.
//!
//! The interpolation numeric formula is `base + |neighbor - base| * U`, which
//! only ever moves a value in the positive direction of the absolute gap.
//! This asymmetry is part of the algorithm's contract and is kept as is.

use crate::data::{Dataset, Sample};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;

/// Per-partition derived aggregates: empirical categorical value frequencies,
/// numeric column standard deviations, and the label standard deviation.
/// Computed once per partition, read-only thereafter.
#[derive(Debug, Clone)]
pub struct PartitionStats {
    /// Value -> probability mass per categorical column, in deterministic
    /// (sorted) value order; aligned with the dataset's categorical columns
    pub cat_probs: Vec<Vec<(String, f64)>>,
    /// Sample standard deviation per numeric column (0.0 for n <= 1)
    pub num_stds: Vec<f64>,
    /// Sample standard deviation of the label
    pub label_std: f64,
}

impl PartitionStats {
    pub fn compute(data: &Dataset) -> Self {
        let n = data.n_rows();

        let cat_probs = (0..data.cat_cols().len())
            .map(|c| {
                let mut counts: HashMap<&str, usize> = HashMap::new();
                for row in 0..n {
                    *counts.entry(data.cat_value(c, row)).or_insert(0) += 1;
                }
                let mut probs: Vec<(String, f64)> = counts
                    .into_iter()
                    .map(|(value, count)| (value.to_string(), count as f64 / n as f64))
                    .collect();
                probs.sort_by(|a, b| a.0.cmp(&b.0));
                probs
            })
            .collect();

        let num_stds = (0..data.num_cols().len())
            .map(|c| sample_std((0..n).map(|row| data.numeric_value(c, row)), n))
            .collect();

        let label_std = sample_std((0..n).map(|row| data.label(row)), n);

        Self {
            cat_probs,
            num_stds,
            label_std,
        }
    }
}

/// Sample standard deviation (ddof = 1); defined as 0.0 for n <= 1 so a
/// singleton partition degenerates to deterministic copies, never NaN.
fn sample_std(values: impl Iterator<Item = f64> + Clone, n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Produces one synthetic record from a base sample, either by interpolating
/// toward a neighbor or by perturbing the base with partition-scaled noise.
pub struct SyntheticSampleGenerator<'a> {
    data: &'a Dataset,
    stats: &'a PartitionStats,
    vectors: &'a Array2<f64>,
}

impl<'a> SyntheticSampleGenerator<'a> {
    pub fn new(data: &'a Dataset, stats: &'a PartitionStats, vectors: &'a Array2<f64>) -> Self {
        Self {
            data,
            stats,
            vectors,
        }
    }

    /// Interpolation strategy: paired base + neighbor.
    ///
    /// Categorical features are chosen uniformly from {base, neighbor};
    /// numeric features move from base by a uniform fraction of the absolute
    /// gap; the label is the inverse-distance-weighted average of the two
    /// endpoint labels (arithmetic mean when equidistant).
    pub fn interpolate(&self, base: usize, neighbour: usize, rng: &mut StdRng) -> Sample {
        let cat = self
            .data
            .cat_cols()
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let row = if rng.gen::<bool>() { base } else { neighbour };
                (name.clone(), self.data.cat_value(c, row).to_string())
            })
            .collect();

        let mut synth_vector = Vec::with_capacity(self.data.num_cols().len());
        let num: HashMap<String, f64> = self
            .data
            .num_cols()
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let b = self.vectors[[base, c]];
                let v = b + (self.vectors[[neighbour, c]] - b).abs() * rng.gen::<f64>();
                synth_vector.push(v);
                (name.clone(), v)
            })
            .collect();

        let base_dist = self.distance_to(&synth_vector, base);
        let neighbour_dist = self.distance_to(&synth_vector, neighbour);
        let base_label = self.data.label(base);
        let neighbour_label = self.data.label(neighbour);

        let label = if base_dist == neighbour_dist {
            (base_label + neighbour_label) / 2.0
        } else {
            (neighbour_dist * base_label + base_dist * neighbour_label)
                / (base_dist + neighbour_dist)
        };

        Sample { cat, num, label }
    }

    /// Noise-injection strategy: base only.
    ///
    /// Categorical features are resampled from the partition's empirical
    /// value distribution; numeric features and the label get zero-mean
    /// Gaussian noise scaled by the column's standard deviation and the
    /// perturbation factor.
    pub fn perturb(&self, base: usize, perturbation: f64, rng: &mut StdRng) -> Sample {
        let cat = self
            .data
            .cat_cols()
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let value = weighted_choice(&self.stats.cat_probs[c], rng);
                (name.clone(), value.to_string())
            })
            .collect();

        let num = self
            .data
            .num_cols()
            .iter()
            .enumerate()
            .map(|(c, name)| {
                let noise = gaussian(self.stats.num_stds[c] * perturbation, rng);
                (name.clone(), self.vectors[[base, c]] + noise)
            })
            .collect();

        let label = self.data.label(base) + gaussian(self.stats.label_std * perturbation, rng);

        Sample { cat, num, label }
    }

    /// Euclidean distance from a synthetic numeric vector to a partition row
    fn distance_to(&self, synth: &[f64], row: usize) -> f64 {
        synth
            .iter()
            .zip(self.vectors.row(row).iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// Zero-mean Gaussian draw; non-positive sigma degenerates to 0.0
fn gaussian(sigma: f64, rng: &mut StdRng) -> f64 {
    if sigma <= 0.0 {
        return 0.0;
    }
    match Normal::new(0.0, sigma) {
        Ok(normal) => normal.sample(rng),
        Err(_) => 0.0,
    }
}

/// Draw a value from an empirical probability mass by cumulative scan
fn weighted_choice<'a>(probs: &'a [(String, f64)], rng: &mut StdRng) -> &'a str {
    let r = rng.gen::<f64>();
    let mut cumulative = 0.0;
    for (value, p) in probs {
        cumulative += p;
        if r < cumulative {
            return value;
        }
    }
    // Cumulative mass can fall fractionally short of 1.0
    &probs[probs.len() - 1].0
}
