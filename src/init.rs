//! Center-initialization strategies.

use ndarray::{Array2, ArrayView2};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::constraints::ConstraintMatrix;
use crate::engine::squared_distance;

/// Produces the initial centers for a fit.
///
/// Implementations must return exactly `n_clusters` rows in the dataset's
/// feature space. The constraint matrix is available to bias placement, but
/// no implementation is required to produce a constraint-consistent layout.
pub trait CenterInit {
    fn initialize(
        &self,
        data: ArrayView2<'_, f64>,
        n_clusters: usize,
        constraints: Option<&ConstraintMatrix>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64>;
}

/// Copies `n_clusters` distinct dataset rows chosen uniformly at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomInit;

impl CenterInit for RandomInit {
    fn initialize(
        &self,
        data: ArrayView2<'_, f64>,
        n_clusters: usize,
        _constraints: Option<&ConstraintMatrix>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64> {
        let n_samples = data.nrows();
        let indices: Vec<usize> = (0..n_samples).choose_multiple(rng, n_clusters);
        let mut centers = Array2::<f64>::zeros((n_clusters, data.ncols()));
        for (c, &idx) in indices.iter().enumerate() {
            centers.row_mut(c).assign(&data.row(idx));
        }
        centers
    }
}

/// D²-weighted seeding (k-means++).
///
/// The first center is a uniform pick; every further center is drawn with
/// probability proportional to its squared distance to the nearest center
/// chosen so far. When all remaining weights are zero (every point
/// coincides with a chosen center) the draw falls back to a uniform pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct KMeansPlusPlus;

impl CenterInit for KMeansPlusPlus {
    fn initialize(
        &self,
        data: ArrayView2<'_, f64>,
        n_clusters: usize,
        _constraints: Option<&ConstraintMatrix>,
        rng: &mut dyn RngCore,
    ) -> Array2<f64> {
        let n_samples = data.nrows();
        let mut chosen = Vec::with_capacity(n_clusters);
        chosen.push(rng.gen_range(0..n_samples));

        let mut min_sq: Vec<f64> = (0..n_samples)
            .map(|i| squared_distance(data.row(i), data.row(chosen[0])))
            .collect();

        while chosen.len() < n_clusters {
            let next = match WeightedIndex::new(&min_sq) {
                Ok(weights) => weights.sample(rng),
                Err(_) => rng.gen_range(0..n_samples),
            };
            chosen.push(next);
            for (i, slot) in min_sq.iter_mut().enumerate() {
                let d = squared_distance(data.row(i), data.row(next));
                if d < *slot {
                    *slot = d;
                }
            }
        }

        let mut centers = Array2::<f64>::zeros((n_clusters, data.ncols()));
        for (c, &idx) in chosen.iter().enumerate() {
            centers.row_mut(c).assign(&data.row(idx));
        }
        centers
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2, ArrayView1};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{CenterInit, KMeansPlusPlus, RandomInit};

    fn is_row_of(data: &Array2<f64>, row: ArrayView1<'_, f64>) -> bool {
        data.rows().into_iter().any(|r| r == row)
    }

    #[test]
    fn random_init_copies_distinct_rows() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let centers = RandomInit.initialize(data.view(), 3, None, &mut rng);

        assert_eq!(centers.dim(), (3, 2));
        for row in centers.rows() {
            assert!(is_row_of(&data, row));
        }
        // Rows are distinct because the source indices are sampled without
        // replacement and the dataset has no duplicate rows.
        for a in 0..3 {
            for b in (a + 1)..3 {
                assert_ne!(centers.row(a), centers.row(b));
            }
        }
    }

    #[test]
    fn random_init_is_deterministic_under_a_seed() {
        let data = array![[0.0, 1.0], [2.0, 3.0], [4.0, 5.0], [6.0, 7.0]];
        let first = RandomInit.initialize(data.view(), 2, None, &mut ChaCha8Rng::seed_from_u64(5));
        let second = RandomInit.initialize(data.view(), 2, None, &mut ChaCha8Rng::seed_from_u64(5));
        assert_eq!(first, second);
    }

    #[test]
    fn plus_plus_returns_dataset_rows() {
        let data = array![[0.0, 0.0], [0.1, 0.0], [8.0, 8.0], [8.1, 8.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let centers = KMeansPlusPlus.initialize(data.view(), 2, None, &mut rng);

        assert_eq!(centers.dim(), (2, 2));
        for row in centers.rows() {
            assert!(is_row_of(&data, row));
        }
    }

    #[test]
    fn plus_plus_survives_all_zero_weights() {
        // Every point is identical, so every D² weight collapses to zero
        // after the first pick.
        let data = array![[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]];
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let centers = KMeansPlusPlus.initialize(data.view(), 2, None, &mut rng);

        assert_eq!(centers.dim(), (2, 2));
        assert_eq!(centers.row(0), centers.row(1));
    }
}
