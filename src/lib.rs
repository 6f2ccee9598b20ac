//! SMOGN-style resampling for imbalanced regression on tabular data
//!
//! Rebalances a regression dataset whose label distribution is skewed toward
//! common values: contiguous runs of rare (high-relevance) rows are
//! oversampled by synthesizing new records, while runs of normal rows are
//! randomly thinned.
//!
//! # Modules
//!
//! - [`config`] - Immutable resampler configuration
//! - [`data`] - Tabular row/column model and the polars boundary
//! - [`sampling`] - Bump collection, k-NN search, synthesis, orchestration
//! - [`cluster`] - Clustering capability used to partition rare bumps
//!
//! # Example
//!
//! ```no_run
//! use smogn::prelude::*;
//! use polars::prelude::*;
//!
//! # fn run(df: DataFrame, phi: Vec<f64>) -> smogn::Result<()> {
//! let config = SmognConfig::new("target").with_k_neighbours(5).with_seed(42);
//! let resampler = DistributedSmogn::new(config)?;
//! let rebalanced = resampler.fit_resample(&df, &phi)?;
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod sampling;

pub use error::{Result, SmognError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cluster::{Clusterer, KMeans};
    pub use crate::config::{SamplingStrategy, SmognConfig};
    pub use crate::data::{Dataset, Sample};
    pub use crate::error::{Result, SmognError};
    pub use crate::sampling::{
        collect_bumps, Bump, BumpKind, DistributedSmogn, NearestNeighborIndex, NeighborTable,
        PartitionOversampler, PartitionStats, SyntheticSampleGenerator,
    };
}
