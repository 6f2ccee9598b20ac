//! Resampling engine
//!
//! - Bump collection: segmenting rows into contiguous rare/normal runs
//! - Exact k-NN search within a partition
//! - Synthetic sample generation (interpolation and noise injection)
//! - Per-partition oversampling and the end-to-end orchestrator

pub mod bump;
pub mod knn;
pub mod oversample;
pub mod resampler;
pub mod synth;

pub use bump::{assign_sampling_percentages, collect_bumps, Bump, BumpKind};
pub use knn::{NearestNeighborIndex, NeighborTable};
pub use oversample::PartitionOversampler;
pub use resampler::DistributedSmogn;
pub use synth::{PartitionStats, SyntheticSampleGenerator};
