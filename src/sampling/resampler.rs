//! End-to-end resampling orchestration
//!
//! Collects bumps, oversamples rare bumps partition by partition (in
//! parallel), subsamples normal bumps, and reassembles a dataset with the
//! input schema. Rare-bump partitioning goes through the configured
//! [`Clusterer`]; each partition gets its own seeded RNG, so there is no
//! shared mutable random state across workers.

use crate::cluster::{Clusterer, KMeans};
use crate::config::SmognConfig;
use crate::data::{Dataset, Sample};
use crate::error::{Result, SmognError};
use crate::sampling::bump::{assign_sampling_percentages, collect_bumps, Bump, BumpKind};
use crate::sampling::oversample::PartitionOversampler;
use polars::prelude::DataFrame;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

/// SMOGN-style resampler for skewed regression datasets.
pub struct DistributedSmogn {
    config: SmognConfig,
    clusterer: Box<dyn Clusterer>,
}

impl DistributedSmogn {
    /// Validate the configuration and build the resampler with the default
    /// k-means clusterer.
    pub fn new(config: SmognConfig) -> Result<Self> {
        config.validate()?;
        let clusterer = KMeans::new(config.k_partitions)
            .with_init_steps(config.init_steps)
            .with_tol(config.tol)
            .with_max_iter(config.max_iter)
            .with_random_state(config.seed.unwrap_or(42));
        Ok(Self {
            config,
            clusterer: Box::new(clusterer),
        })
    }

    /// Substitute the clustering capability used for rare-bump partitioning
    pub fn with_clusterer(mut self, clusterer: Box<dyn Clusterer>) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn config(&self) -> &SmognConfig {
        &self.config
    }

    /// Rebalance a DataFrame given its per-row relevance scores.
    ///
    /// The output schema (column set and dtypes) matches the input exactly;
    /// row count and order differ. Output rows are the union of the
    /// synthesized rare-bump rows and the retained normal-bump rows.
    pub fn fit_resample(&self, df: &DataFrame, phi: &[f64]) -> Result<DataFrame> {
        if phi.len() != df.height() {
            return Err(SmognError::Data(format!(
                "relevance scores ({}) do not match row count ({})",
                phi.len(),
                df.height()
            )));
        }
        let data = Dataset::from_dataframe(df, &self.config.label_col)?;
        let resampled = self.resample(&data, phi)?;
        resampled.to_dataframe()
    }

    /// Core resampling pass over an already-ingested dataset.
    pub fn resample(&self, data: &Dataset, phi: &[f64]) -> Result<Dataset> {
        let mut bumps = collect_bumps(phi, self.config.threshold);
        assign_sampling_percentages(&mut bumps, &self.config.sampling_strategy);

        let base_seed = self.config.seed.unwrap_or_else(rand::random);
        let mut out = data.empty_like();

        for (bump_idx, bump) in bumps.iter().enumerate() {
            if bump.is_empty() {
                return Err(SmognError::Internal(format!(
                    "bump {bump_idx} covers no rows"
                )));
            }
            let rows = data.slice(bump.start, bump.end);

            match bump.kind {
                BumpKind::Rare => {
                    let synthesized = self.oversample_bump(&rows, bump, bump_idx, base_seed)?;
                    for sample in &synthesized {
                        out.push_sample(sample)?;
                    }
                }
                BumpKind::Normal => {
                    let mut rng = StdRng::seed_from_u64(derive_seed(base_seed, bump_idx, 0));
                    let retained = subsample(&rows, bump.sampling_percentage, &mut rng);
                    debug!(
                        bump = bump_idx,
                        rows = rows.n_rows(),
                        retained = retained.n_rows(),
                        "subsampled normal bump"
                    );
                    out.append(&retained);
                }
            }
        }

        Ok(out)
    }

    /// Partition a rare bump and run the oversampler over every partition in
    /// parallel, concatenating the per-partition outputs.
    fn oversample_bump(
        &self,
        rows: &Dataset,
        bump: &Bump,
        bump_idx: usize,
        base_seed: u64,
    ) -> Result<Vec<Sample>> {
        let n_synth = bump.sampling_percentage.round() as usize;
        debug!(
            bump = bump_idx,
            rows = rows.n_rows(),
            n_synth,
            "oversampling rare bump"
        );
        if n_synth == 0 {
            return Ok(Vec::new());
        }

        let partitions = self.partition(rows)?;
        let oversampler = PartitionOversampler::new(
            n_synth,
            self.config.k_neighbours,
            self.config.perturbation,
        );

        let per_partition: Vec<Vec<Sample>> = partitions
            .par_iter()
            .enumerate()
            .map(|(partition_idx, partition)| {
                let mut rng =
                    StdRng::seed_from_u64(derive_seed(base_seed, bump_idx, partition_idx + 1));
                oversampler.process(partition, &mut rng)
            })
            .collect();

        let mut samples = Vec::new();
        for (partition_idx, batch) in per_partition.into_iter().enumerate() {
            debug!(
                bump = bump_idx,
                partition = partition_idx,
                synthesized = batch.len(),
                "partition oversampling complete"
            );
            samples.extend(batch);
        }
        Ok(samples)
    }

    /// Split a bump's rows into up to `k_partitions` groups via clustering
    /// over the numeric feature columns. Sizes are density-driven; empty
    /// clusters yield no partition; `k` is clamped to the row count.
    fn partition(&self, rows: &Dataset) -> Result<Vec<Dataset>> {
        let k = self.config.k_partitions.min(rows.n_rows()).max(1);
        if k == 1 {
            return Ok(vec![rows.clone()]);
        }

        let ids = self.clusterer.cluster(&rows.numeric_matrix(), k)?;
        if ids.len() != rows.n_rows() {
            return Err(SmognError::Clustering(format!(
                "clusterer returned {} ids for {} rows",
                ids.len(),
                rows.n_rows()
            )));
        }

        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (row, &id) in ids.iter().enumerate() {
            let group = groups.get_mut(id).ok_or_else(|| {
                SmognError::Clustering(format!("partition id {id} out of range (k = {k})"))
            })?;
            group.push(row);
        }

        Ok(groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|g| rows.take(&g))
            .collect())
    }
}

/// Random subsampling without replacement at the given retention rate,
/// preserving relative row order.
fn subsample(rows: &Dataset, fraction: f64, rng: &mut StdRng) -> Dataset {
    let n = rows.n_rows();
    let n_keep = ((n as f64) * fraction).round().min(n as f64) as usize;

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(n_keep);
    indices.sort_unstable();

    rows.take(&indices)
}

/// Independent per-partition seed derived from the base seed, bump index and
/// partition index.
fn derive_seed(base: u64, bump_idx: usize, partition_idx: usize) -> u64 {
    base.wrapping_add((bump_idx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((partition_idx as u64).wrapping_mul(0xD1B5_4A32_D192_ED03))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingStrategy;
    use polars::prelude::*;

    fn make_dataset(n_rare: usize, n_normal: usize) -> (DataFrame, Vec<f64>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut target = Vec::new();
        let mut phi = Vec::new();

        for i in 0..n_rare {
            x.push(50.0 + (i % 5) as f64);
            y.push(50.0 + (i / 5) as f64);
            target.push(100.0 + i as f64);
            phi.push(0.95);
        }
        for i in 0..n_normal {
            x.push((i % 10) as f64);
            y.push((i / 10) as f64);
            target.push(10.0 + i as f64);
            phi.push(0.1);
        }

        let df = DataFrame::new(vec![
            Series::new("x".into(), x).into(),
            Series::new("y".into(), y).into(),
            Series::new("target".into(), target).into(),
        ])
        .unwrap();
        (df, phi)
    }

    #[test]
    fn test_custom_strategy_counts() {
        // 5 rare rows with over = 2.0 -> 10 synthetic rows;
        // 20 normal rows with under = 0.5 -> 10 retained rows.
        let (df, phi) = make_dataset(5, 20);
        let config = SmognConfig::new("target")
            .with_sampling_strategy(SamplingStrategy::Custom { over: 2.0, under: 0.5 })
            .with_k_partitions(2)
            .with_k_neighbours(3)
            .with_seed(42);

        let resampler = DistributedSmogn::new(config).unwrap();
        let out = resampler.fit_resample(&df, &phi).unwrap();
        assert_eq!(out.height(), 20);
    }

    #[test]
    fn test_schema_preserved() {
        let (df, phi) = make_dataset(6, 12);
        let config = SmognConfig::new("target").with_seed(1);
        let resampler = DistributedSmogn::new(config).unwrap();

        let out = resampler.fit_resample(&df, &phi).unwrap();
        assert_eq!(out.get_column_names(), df.get_column_names());
        for (a, b) in out.dtypes().iter().zip(df.dtypes().iter()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_phi_length_mismatch() {
        let (df, _) = make_dataset(4, 4);
        let config = SmognConfig::new("target");
        let resampler = DistributedSmogn::new(config).unwrap();

        let result = resampler.fit_resample(&df, &[0.9, 0.1]);
        assert!(matches!(result, Err(SmognError::Data(_))));
    }

    #[test]
    fn test_invalid_config_rejected_up_front() {
        let config = SmognConfig::new("target").with_threshold(2.0);
        assert!(DistributedSmogn::new(config).is_err());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let (df, phi) = make_dataset(6, 12);
        let config = SmognConfig::new("target").with_seed(99);

        let a = DistributedSmogn::new(config.clone())
            .unwrap()
            .fit_resample(&df, &phi)
            .unwrap();
        let b = DistributedSmogn::new(config)
            .unwrap()
            .fit_resample(&df, &phi)
            .unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn test_subsample_preserves_order() {
        let (df, _) = make_dataset(0, 10);
        let data = Dataset::from_dataframe(&df, "target").unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let kept = subsample(&data, 0.5, &mut rng);
        assert_eq!(kept.n_rows(), 5);
        for i in 1..kept.n_rows() {
            assert!(kept.label(i) > kept.label(i - 1));
        }
    }

    #[test]
    fn test_subsample_full_retention() {
        let (df, _) = make_dataset(0, 8);
        let data = Dataset::from_dataframe(&df, "target").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(subsample(&data, 1.0, &mut rng).n_rows(), 8);
    }
}
