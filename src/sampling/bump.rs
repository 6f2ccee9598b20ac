//! Segmentation of a dataset into contiguous runs of uniform rarity
//!
//! A row is rare when its relevance score meets the threshold. Bumps cover
//! the full row range `[0, N)` disjointly, in order, and adjacent bumps
//! always differ in kind.

use crate::config::SamplingStrategy;

/// Rarity classification of a contiguous row run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpKind {
    /// Relevance at or above the threshold
    Rare,
    /// Relevance below the threshold
    Normal,
}

/// A maximal contiguous run of rows sharing one rarity classification.
///
/// `sampling_percentage` is the oversampling multiplier for rare bumps and
/// the retention fraction for normal bumps; it is assigned by
/// [`assign_sampling_percentages`] after collection.
#[derive(Debug, Clone)]
pub struct Bump {
    pub kind: BumpKind,
    /// First row index, inclusive
    pub start: usize,
    /// Last row index, inclusive
    pub end: usize,
    pub sampling_percentage: f64,
}

impl Bump {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Scan relevance scores left to right, starting a new bump at every
/// classification flip. O(N) single pass.
pub fn collect_bumps(phi: &[f64], threshold: f64) -> Vec<Bump> {
    if phi.is_empty() {
        return Vec::new();
    }

    let classify = |score: f64| {
        if score >= threshold {
            BumpKind::Rare
        } else {
            BumpKind::Normal
        }
    };

    let mut bumps = Vec::new();
    let mut start = 0;
    let mut current = classify(phi[0]);

    for (i, &score) in phi.iter().enumerate().skip(1) {
        let kind = classify(score);
        if kind != current {
            bumps.push(Bump {
                kind: current,
                start,
                end: i - 1,
                sampling_percentage: 0.0,
            });
            start = i;
            current = kind;
        }
    }

    bumps.push(Bump {
        kind: current,
        start,
        end: phi.len() - 1,
        sampling_percentage: 0.0,
    });

    bumps
}

/// Derive each bump's sampling percentage from the strategy.
///
/// `Balance` targets the average bump size: rare bumps get
/// `target / bump_len` as their synthetic-per-row multiplier, normal bumps
/// the same ratio capped at 1.0 as their retention fraction.
pub fn assign_sampling_percentages(bumps: &mut [Bump], strategy: &SamplingStrategy) {
    if bumps.is_empty() {
        return;
    }
    match strategy {
        SamplingStrategy::Balance => {
            let total: usize = bumps.iter().map(Bump::len).sum();
            let target = total as f64 / bumps.len() as f64;
            for bump in bumps.iter_mut() {
                let ratio = target / bump.len() as f64;
                bump.sampling_percentage = match bump.kind {
                    BumpKind::Rare => ratio,
                    BumpKind::Normal => ratio.min(1.0),
                };
            }
        }
        SamplingStrategy::Custom { over, under } => {
            for bump in bumps.iter_mut() {
                bump.sampling_percentage = match bump.kind {
                    BumpKind::Rare => *over,
                    BumpKind::Normal => *under,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(collect_bumps(&[], 0.8).is_empty());
    }

    #[test]
    fn test_single_row() {
        let bumps = collect_bumps(&[0.9], 0.8);
        assert_eq!(bumps.len(), 1);
        assert_eq!(bumps[0].kind, BumpKind::Rare);
        assert_eq!((bumps[0].start, bumps[0].end), (0, 0));
    }

    #[test]
    fn test_example_scenario() {
        // phi = [0.9, 0.9, 0.3, 0.3, 0.3, 0.95], threshold = 0.8
        let phi = [0.9, 0.9, 0.3, 0.3, 0.3, 0.95];
        let bumps = collect_bumps(&phi, 0.8);

        assert_eq!(bumps.len(), 3);
        assert_eq!(bumps[0].kind, BumpKind::Rare);
        assert_eq!((bumps[0].start, bumps[0].end), (0, 1));
        assert_eq!(bumps[1].kind, BumpKind::Normal);
        assert_eq!((bumps[1].start, bumps[1].end), (2, 4));
        assert_eq!(bumps[2].kind, BumpKind::Rare);
        assert_eq!((bumps[2].start, bumps[2].end), (5, 5));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let bumps = collect_bumps(&[0.8, 0.79999], 0.8);
        assert_eq!(bumps.len(), 2);
        assert_eq!(bumps[0].kind, BumpKind::Rare);
        assert_eq!(bumps[1].kind, BumpKind::Normal);
    }

    #[test]
    fn test_coverage_and_alternation() {
        let phi: Vec<f64> = (0..100).map(|i| if (i / 7) % 2 == 0 { 0.9 } else { 0.1 }).collect();
        let bumps = collect_bumps(&phi, 0.8);

        // Disjoint, ordered, gap-free coverage of [0, N)
        let mut next = 0;
        for bump in &bumps {
            assert_eq!(bump.start, next);
            assert!(bump.end >= bump.start);
            next = bump.end + 1;
        }
        assert_eq!(next, phi.len());

        // Every row classified consistently, adjacent bumps alternate
        for bump in &bumps {
            for i in bump.start..=bump.end {
                match bump.kind {
                    BumpKind::Rare => assert!(phi[i] >= 0.8),
                    BumpKind::Normal => assert!(phi[i] < 0.8),
                }
            }
        }
        for pair in bumps.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind);
        }
    }

    #[test]
    fn test_balance_percentages() {
        // Bumps of 2, 3 and 1 rows; target = 2
        let phi = [0.9, 0.9, 0.3, 0.3, 0.3, 0.95];
        let mut bumps = collect_bumps(&phi, 0.8);
        assign_sampling_percentages(&mut bumps, &SamplingStrategy::Balance);

        assert!((bumps[0].sampling_percentage - 1.0).abs() < 1e-12);
        // Normal bump ratio 2/3 stays below the 1.0 cap
        assert!((bumps[1].sampling_percentage - 2.0 / 3.0).abs() < 1e-12);
        // Singleton rare bump gets the full multiplier
        assert!((bumps[2].sampling_percentage - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_custom_percentages() {
        let phi = [0.9, 0.3];
        let mut bumps = collect_bumps(&phi, 0.8);
        assign_sampling_percentages(
            &mut bumps,
            &SamplingStrategy::Custom { over: 3.0, under: 0.5 },
        );
        assert_eq!(bumps[0].sampling_percentage, 3.0);
        assert_eq!(bumps[1].sampling_percentage, 0.5);
    }
}
