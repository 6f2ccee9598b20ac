//! Clustering capability used to partition rare bumps
//!
//! The partitioner only needs one operation: assign each row of a numeric
//! feature matrix a partition id in `[0, k)`. [`KMeans`] is the shipped
//! implementation; any [`Clusterer`] can be substituted.

use crate::error::{Result, SmognError};
use ndarray::{Array1, Array2};
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Assigns each row of `x` a partition id in `[0, k)`.
pub trait Clusterer: Send + Sync {
    fn cluster(&self, x: &Array2<f64>, k: usize) -> Result<Vec<usize>>;
}

/// K-Means with k-means++ initialization and a configurable number of
/// initialization restarts (best seeding by initial inertia).
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub init_steps: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub random_state: Option<u64>,
    /// Fitted cluster centroids (n_clusters × n_features)
    centroids: Option<Array2<f64>>,
    /// Cluster labels assigned during fit
    pub labels: Option<Array1<usize>>,
    /// Sum of squared distances to nearest centroid
    pub inertia: Option<f64>,
    pub is_fitted: bool,
}

impl Default for KMeans {
    fn default() -> Self {
        Self::new(2)
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            init_steps: 2,
            max_iter: 20,
            tol: 1e-4,
            random_state: Some(42),
            centroids: None,
            labels: None,
            inertia: None,
            is_fitted: false,
        }
    }

    pub fn with_init_steps(mut self, init_steps: usize) -> Self {
        self.init_steps = init_steps.max(1);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// K-means++ initialization: pick centroids spread apart
    fn kmeans_pp_init(x: &Array2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let mut centroids = Array2::zeros((k, n_features));

        // Pick first centroid uniformly at random
        let first = (rng.next_u64() as usize) % n_samples;
        centroids.row_mut(0).assign(&x.row(first));

        for c in 1..k {
            // Compute distances to nearest existing centroid
            let dists: Vec<f64> = (0..n_samples)
                .map(|i| {
                    let row = x.row(i);
                    (0..c)
                        .map(|j| {
                            let diff = &row - &centroids.row(j);
                            diff.mapv(|v| v * v).sum()
                        })
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            // Weighted random selection proportional to D²
            let total: f64 = dists.iter().sum();
            if total <= 0.0 {
                let idx = (rng.next_u64() as usize) % n_samples;
                centroids.row_mut(c).assign(&x.row(idx));
                continue;
            }

            let r = (rng.next_u64() as f64 / u64::MAX as f64) * total;
            let mut cumulative = 0.0;
            let mut chosen = 0;
            for (i, &d) in dists.iter().enumerate() {
                cumulative += d;
                if cumulative >= r {
                    chosen = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&x.row(chosen));
        }

        centroids
    }

    fn euclidean_sq(a: &ndarray::ArrayView1<f64>, b: &ndarray::ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// Inertia of an initial seeding, used to pick the best restart
    fn seeding_inertia(x: &Array2<f64>, centroids: &Array2<f64>) -> f64 {
        (0..x.nrows())
            .map(|i| {
                let row = x.row(i);
                (0..centroids.nrows())
                    .map(|c| Self::euclidean_sq(&row, &centroids.row(c)))
                    .fold(f64::MAX, f64::min)
            })
            .sum()
    }

    /// Fit the model (unsupervised)
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples < self.n_clusters {
            return Err(SmognError::Clustering(format!(
                "n_samples ({}) < n_clusters ({})",
                n_samples, self.n_clusters
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(42));

        // Run k-means++ init_steps times, keep the tightest seeding
        let mut centroids = Self::kmeans_pp_init(x, self.n_clusters, &mut rng);
        let mut best_inertia = Self::seeding_inertia(x, &centroids);
        for _ in 1..self.init_steps {
            let candidate = Self::kmeans_pp_init(x, self.n_clusters, &mut rng);
            let inertia = Self::seeding_inertia(x, &candidate);
            if inertia < best_inertia {
                best_inertia = inertia;
                centroids = candidate;
            }
        }

        let mut labels: Vec<usize> = vec![0; n_samples];

        for _iter in 0..self.max_iter {
            // Assignment step: assign each point to nearest centroid
            let new_labels: Vec<usize> = (0..n_samples)
                .into_par_iter()
                .map(|i| {
                    let row = x.row(i);
                    let mut best_c = 0;
                    let mut best_dist = f64::MAX;
                    for c in 0..self.n_clusters {
                        let d = Self::euclidean_sq(&row, &centroids.row(c));
                        if d < best_dist {
                            best_dist = d;
                            best_c = c;
                        }
                    }
                    best_c
                })
                .collect();

            let changed: usize = new_labels
                .iter()
                .zip(labels.iter())
                .filter(|(a, b)| a != b)
                .count();

            labels = new_labels;

            // Update step: recompute centroids
            let mut new_centroids = Array2::zeros(centroids.dim());
            let mut counts = vec![0usize; self.n_clusters];

            for i in 0..n_samples {
                let c = labels[i];
                counts[c] += 1;
                for j in 0..x.ncols() {
                    new_centroids[[c, j]] += x[[i, j]];
                }
            }

            for c in 0..self.n_clusters {
                if counts[c] > 0 {
                    for j in 0..x.ncols() {
                        new_centroids[[c, j]] /= counts[c] as f64;
                    }
                } else {
                    // Empty cluster: reinitialize randomly
                    let idx = (rng.next_u64() as usize) % n_samples;
                    new_centroids.row_mut(c).assign(&x.row(idx));
                }
            }

            // Centroid movement convergence
            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt();

            centroids = new_centroids;

            if changed == 0 || shift < self.tol {
                break;
            }
        }

        let inertia: f64 = (0..n_samples)
            .map(|i| Self::euclidean_sq(&x.row(i), &centroids.row(labels[i])))
            .sum();

        self.centroids = Some(centroids);
        self.labels = Some(Array1::from_vec(labels));
        self.inertia = Some(inertia);
        self.is_fitted = true;
        Ok(self)
    }

    /// Get cluster centroids
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }
}

impl Clusterer for KMeans {
    fn cluster(&self, x: &Array2<f64>, k: usize) -> Result<Vec<usize>> {
        let mut model = Self {
            n_clusters: k,
            init_steps: self.init_steps,
            max_iter: self.max_iter,
            tol: self.tol,
            random_state: self.random_state,
            centroids: None,
            labels: None,
            inertia: None,
            is_fitted: false,
        };
        model.fit(x)?;
        Ok(model
            .labels
            .map(|l| l.to_vec())
            .unwrap_or_default())
    }
}
