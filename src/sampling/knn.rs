//! Exact nearest-neighbor search within a partition
//!
//! Builds an in-memory index over a partition's numeric feature vectors and
//! answers an all-rows k-NN query: for every row, its k nearest other rows
//! (self excluded) sorted ascending by L2 distance. Effective k per row is
//! `min(k, partition_size - 1)`; a single-row partition yields empty
//! neighbor lists.

use ndarray::Array2;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Ordered (distance, index) pair for BinaryHeap-based partial sort.
/// Ties on distance are broken by row index so results are deterministic.
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 == other.1
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// Per-row neighbor lists: distances and indices in ascending distance
/// order, one entry per partition row. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    pub distances: Vec<Vec<f64>>,
    pub indices: Vec<Vec<usize>>,
}

impl NeighborTable {
    /// Neighbor count actually available for the given row
    pub fn effective_k(&self, row: usize) -> usize {
        self.indices[row].len()
    }
}

/// Exact L2 nearest-neighbor index over a partition's numeric feature matrix.
#[derive(Debug, Clone)]
pub struct NearestNeighborIndex {
    vectors: Array2<f64>,
}

impl NearestNeighborIndex {
    pub fn new(vectors: Array2<f64>) -> Self {
        Self { vectors }
    }

    pub fn vectors(&self) -> &Array2<f64> {
        &self.vectors
    }

    /// Euclidean distance between two rows
    fn distance(&self, a: usize, b: usize) -> f64 {
        self.vectors
            .row(a)
            .iter()
            .zip(self.vectors.row(b).iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// k nearest other rows for every row, parallelized over rows.
    /// Bounded-heap partial sort, O(n log k) per row.
    pub fn search(&self, k: usize) -> NeighborTable {
        let n = self.vectors.nrows();
        let k = k.min(n.saturating_sub(1));

        let per_row: Vec<(Vec<f64>, Vec<usize>)> = (0..n)
            .into_par_iter()
            .map(|i| {
                if k == 0 {
                    return (Vec::new(), Vec::new());
                }

                let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    let entry = DistIdx(self.distance(i, j), j);
                    if heap.len() < k {
                        heap.push(entry);
                    } else if let Some(&worst) = heap.peek() {
                        if entry < worst {
                            heap.pop();
                            heap.push(entry);
                        }
                    }
                }

                let mut pairs: Vec<DistIdx> = heap.into_iter().collect();
                pairs.sort();

                let distances = pairs.iter().map(|&DistIdx(d, _)| d).collect();
                let indices = pairs.iter().map(|&DistIdx(_, j)| j).collect();
                (distances, indices)
            })
            .collect();

        let mut distances = Vec::with_capacity(n);
        let mut indices = Vec::with_capacity(n);
        for (d, i) in per_row {
            distances.push(d);
            indices.push(i);
        }
        NeighborTable { distances, indices }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_neighbors_sorted_self_excluded() {
        let x = array![[0.0], [1.0], [3.0], [7.0]];
        let table = NearestNeighborIndex::new(x).search(3);

        assert_eq!(table.indices[0], vec![1, 2, 3]);
        assert_eq!(table.distances[0], vec![1.0, 3.0, 7.0]);
        // Row 2 is closest to 1, then 0, then 3
        assert_eq!(table.indices[2], vec![1, 0, 3]);
        for row in 0..4 {
            assert!(!table.indices[row].contains(&row));
            for pair in table.distances[row].windows(2) {
                assert!(pair[0] <= pair[1]);
            }
        }
    }

    #[test]
    fn test_k_clamped_to_partition_size() {
        let x = array![[0.0], [1.0], [2.0]];
        let table = NearestNeighborIndex::new(x).search(10);
        for row in 0..3 {
            assert_eq!(table.effective_k(row), 2);
        }
    }

    #[test]
    fn test_single_row_has_no_neighbors() {
        let x = array![[5.0, 5.0]];
        let table = NearestNeighborIndex::new(x).search(5);
        assert_eq!(table.effective_k(0), 0);
        assert!(table.distances[0].is_empty());
    }

    #[test]
    fn test_ties_broken_by_index() {
        // Rows 1, 2, 3 all at distance 1 from row 0; only 2 slots
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [-1.0, 0.0]];
        let table = NearestNeighborIndex::new(x).search(2);
        assert_eq!(table.indices[0], vec![1, 2]);
    }

    #[test]
    fn test_duplicate_points_are_neighbors() {
        // Identical rows are distinct neighbors at distance zero
        let x = array![[2.0], [2.0], [9.0]];
        let table = NearestNeighborIndex::new(x).search(1);
        assert_eq!(table.indices[0], vec![1]);
        assert_eq!(table.distances[0], vec![0.0]);
        assert_eq!(table.indices[1], vec![0]);
    }
}
