//! Resampler configuration
//!
//! An explicit, immutable configuration record handed to the orchestrator at
//! construction. Validation runs once, before any partition work begins.

use crate::error::{Result, SmognError};
use serde::{Deserialize, Serialize};

/// How many rows each bump should end up with after resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Every bump is resampled toward the average bump size
    /// (`total_rows / n_bumps`).
    Balance,
    /// Fixed per-kind percentages: `over` is the synthetic-samples-per-row
    /// multiplier for rare bumps, `under` the retention fraction for normal
    /// bumps.
    Custom { over: f64, under: f64 },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Balance
    }
}

/// Configuration for [`DistributedSmogn`](crate::sampling::DistributedSmogn).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmognConfig {
    /// Name of the real-valued label column
    pub label_col: String,
    /// Target size per bump
    pub sampling_strategy: SamplingStrategy,
    /// Number of partitions a rare bump is clustered into
    pub k_partitions: usize,
    /// Relevance threshold separating rare from normal rows
    pub threshold: f64,
    /// Neighbor count for the per-partition k-NN search
    pub k_neighbours: usize,
    /// Gaussian noise scale factor for the noise-injection strategy
    pub perturbation: f64,
    /// k-means++ initialization restarts
    pub init_steps: usize,
    /// k-means convergence tolerance on centroid movement
    pub tol: f64,
    /// k-means iteration cap
    pub max_iter: usize,
    /// Random seed (None = entropy-seeded)
    pub seed: Option<u64>,
}

impl SmognConfig {
    /// Create a configuration for the given label column with default knobs.
    pub fn new(label_col: impl Into<String>) -> Self {
        Self {
            label_col: label_col.into(),
            sampling_strategy: SamplingStrategy::Balance,
            k_partitions: 2,
            threshold: 0.8,
            k_neighbours: 5,
            perturbation: 0.02,
            init_steps: 2,
            tol: 1e-4,
            max_iter: 20,
            seed: None,
        }
    }

    /// Set the sampling strategy
    pub fn with_sampling_strategy(mut self, strategy: SamplingStrategy) -> Self {
        self.sampling_strategy = strategy;
        self
    }

    /// Set the partition count for rare-bump clustering
    pub fn with_k_partitions(mut self, k: usize) -> Self {
        self.k_partitions = k;
        self
    }

    /// Set the rarity threshold
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the neighbor count
    pub fn with_k_neighbours(mut self, k: usize) -> Self {
        self.k_neighbours = k;
        self
    }

    /// Set the perturbation factor
    pub fn with_perturbation(mut self, perturbation: f64) -> Self {
        self.perturbation = perturbation;
        self
    }

    /// Set the k-means++ restart count
    pub fn with_init_steps(mut self, init_steps: usize) -> Self {
        self.init_steps = init_steps;
        self
    }

    /// Set the k-means convergence tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the k-means iteration cap
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the random seed for reproducible output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every knob; any violation is fatal before processing starts.
    pub fn validate(&self) -> Result<()> {
        if self.label_col.is_empty() {
            return Err(SmognError::Config("label_col must not be empty".to_string()));
        }
        if self.k_partitions == 0 {
            return Err(SmognError::Config("k_partitions must be >= 1".to_string()));
        }
        if self.k_neighbours == 0 {
            return Err(SmognError::Config("k_neighbours must be >= 1".to_string()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(SmognError::Config(format!(
                "threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        if !(self.perturbation > 0.0) {
            return Err(SmognError::Config(format!(
                "perturbation must be > 0, got {}",
                self.perturbation
            )));
        }
        if self.init_steps == 0 {
            return Err(SmognError::Config("init_steps must be >= 1".to_string()));
        }
        if !(self.tol > 0.0) {
            return Err(SmognError::Config(format!("tol must be > 0, got {}", self.tol)));
        }
        if self.max_iter == 0 {
            return Err(SmognError::Config("max_iter must be >= 1".to_string()));
        }
        if let SamplingStrategy::Custom { over, under } = self.sampling_strategy {
            if over < 0.0 {
                return Err(SmognError::Config(format!(
                    "custom oversampling percentage must be >= 0, got {over}"
                )));
            }
            if !(0.0..=1.0).contains(&under) {
                return Err(SmognError::Config(format!(
                    "custom retention fraction must be in [0, 1], got {under}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SmognConfig::new("target");
        assert_eq!(config.k_partitions, 2);
        assert_eq!(config.threshold, 0.8);
        assert_eq!(config.k_neighbours, 5);
        assert_eq!(config.perturbation, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SmognConfig::new("y")
            .with_k_partitions(4)
            .with_threshold(0.9)
            .with_k_neighbours(3)
            .with_perturbation(0.05)
            .with_seed(7);
        assert_eq!(config.k_partitions, 4);
        assert_eq!(config.threshold, 0.9);
        assert_eq!(config.k_neighbours, 3);
        assert_eq!(config.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(SmognConfig::new("y").with_threshold(0.0).validate().is_err());
        assert!(SmognConfig::new("y").with_threshold(1.0).validate().is_err());
        assert!(SmognConfig::new("y").with_threshold(1.5).validate().is_err());
    }

    #[test]
    fn test_invalid_counts() {
        assert!(SmognConfig::new("y").with_k_partitions(0).validate().is_err());
        assert!(SmognConfig::new("y").with_k_neighbours(0).validate().is_err());
        assert!(SmognConfig::new("y").with_perturbation(0.0).validate().is_err());
    }

    #[test]
    fn test_empty_label() {
        assert!(SmognConfig::new("").validate().is_err());
    }

    #[test]
    fn test_custom_strategy_bounds() {
        let bad = SmognConfig::new("y")
            .with_sampling_strategy(SamplingStrategy::Custom { over: 2.0, under: 1.5 });
        assert!(bad.validate().is_err());

        let ok = SmognConfig::new("y")
            .with_sampling_strategy(SamplingStrategy::Custom { over: 2.0, under: 0.5 });
        assert!(ok.validate().is_ok());
    }
}
