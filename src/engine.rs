//! The constrained clustering engine.

use ndarray::{Array1, ArrayBase, ArrayView1, ArrayView2, Axis, Data, Ix2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::constraints::ConstraintMatrix;
use crate::error::ClusterError;
use crate::init::{CenterInit, RandomInit};
use crate::tolerance::{ToleranceEstimator, VarianceTolerance};

/// One cluster center.
///
/// Re-estimation takes the mean of a cluster's members; a cluster that ends
/// an iteration with no members has no mean, and the marker keeps that state
/// visible instead of letting a NaN center leak into later distance
/// computations.
#[derive(Debug, Clone, PartialEq)]
pub enum Center {
    /// The per-feature mean of the points assigned to the cluster.
    Estimated(Array1<f64>),
    /// The cluster received no points in the last re-estimation.
    Vacant,
}

impl Center {
    /// The center's coordinates, when it has any.
    pub fn as_estimated(&self) -> Option<&Array1<f64>> {
        match self {
            Center::Estimated(point) => Some(point),
            Center::Vacant => None,
        }
    }

    pub fn is_vacant(&self) -> bool {
        matches!(self, Center::Vacant)
    }
}

/// Constrained k-means (COP-KMeans).
///
/// Lloyd's algorithm with a constraint-checked assignment step: points are
/// assigned one at a time in dataset order, each to the nearest center that
/// does not put it next to a point it is cannot-linked to. A point with no
/// admissible cluster is left unassigned (`None` label) and ends the fit
/// early.
///
/// A single instance must not be fitted from multiple threads at once: the
/// fit state (centers, labels, iteration count) is mutated in place. Use one
/// engine per concurrent fit.
pub struct CopKMeans {
    n_clusters: usize,
    max_iter: usize,
    tol: f64,
    init: Box<dyn CenterInit>,
    tolerance: Box<dyn ToleranceEstimator>,
    random_state: Option<u64>,

    cluster_centers: Option<Vec<Center>>,
    labels: Vec<Option<usize>>,
    n_iter: usize,
    converged: bool,
}

impl CopKMeans {
    /// Creates an engine targeting `n_clusters` clusters, with a budget of
    /// 100 iterations, a relative tolerance of `1e-4`, random-row
    /// initialization, and variance-scaled convergence thresholds.
    pub fn new(n_clusters: usize) -> Result<Self, ClusterError> {
        if n_clusters == 0 {
            return Err(ClusterError::InvalidClusterCount);
        }
        Ok(Self {
            n_clusters,
            max_iter: 100,
            tol: 1e-4,
            init: Box::new(RandomInit),
            tolerance: Box::new(VarianceTolerance),
            random_state: None,
            cluster_centers: None,
            labels: Vec::new(),
            n_iter: 0,
            converged: false,
        })
    }

    /// Caps the number of refinement iterations per fit. Must be at least 1.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the relative convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Replaces the center-initialization strategy.
    pub fn with_init(mut self, init: Box<dyn CenterInit>) -> Self {
        self.init = init;
        self
    }

    /// Replaces the convergence-threshold strategy.
    pub fn with_tolerance(mut self, tolerance: Box<dyn ToleranceEstimator>) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Seeds the initialization RNG, making fits reproducible.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Labels from the last fit: one entry per point, `Some(cluster)` with
    /// `cluster < n_clusters`, or `None` when no admissible cluster existed
    /// for the point.
    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    /// Centers from the last fit; `None` before any fit.
    pub fn cluster_centers(&self) -> Option<&[Center]> {
        self.cluster_centers.as_deref()
    }

    /// 1-indexed number of the iteration the last fit stopped in.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Whether the last fit stopped by crossing the convergence threshold,
    /// as opposed to exhausting the budget or failing an assignment.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Fits the engine, always re-initializing centers first.
    ///
    /// With a fixed random state this is idempotent: refitting the same data
    /// and constraints reproduces labels, centers, and iteration count.
    /// Callers are responsible for `n_clusters <= n` and for a constraint
    /// matrix covering all `n` points; neither is validated here.
    #[instrument(skip_all, fields(n = data.nrows(), k = self.n_clusters))]
    pub fn fit<S>(
        &mut self,
        data: &ArrayBase<S, Ix2>,
        constraints: Option<&ConstraintMatrix>,
    ) -> &mut Self
    where
        S: Data<Elem = f64>,
    {
        self.initialize(data.view(), constraints);
        self.refine(data.view(), constraints)
    }

    /// Like [`fit`](Self::fit), but keeps the centers of a previous fit when
    /// there are any, refining incrementally instead of starting over.
    #[instrument(skip_all, fields(n = data.nrows(), k = self.n_clusters))]
    pub fn partial_fit<S>(
        &mut self,
        data: &ArrayBase<S, Ix2>,
        constraints: Option<&ConstraintMatrix>,
    ) -> &mut Self
    where
        S: Data<Elem = f64>,
    {
        if self.cluster_centers.is_none() {
            self.initialize(data.view(), constraints);
        }
        self.refine(data.view(), constraints)
    }

    fn initialize(&mut self, data: ArrayView2<'_, f64>, constraints: Option<&ConstraintMatrix>) {
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let centers = self.init.initialize(data, self.n_clusters, constraints, &mut rng);
        self.cluster_centers = Some(
            centers
                .axis_iter(Axis(0))
                .map(|row| Center::Estimated(row.to_owned()))
                .collect(),
        );
    }

    fn refine(
        &mut self,
        data: ArrayView2<'_, f64>,
        constraints: Option<&ConstraintMatrix>,
    ) -> &mut Self {
        let threshold = self.tolerance.tolerance(data, self.tol);
        self.converged = false;
        let mut n_iter = 0;

        for iteration in 1..=self.max_iter {
            n_iter = iteration;
            self.labels = self.assign_clusters(data, constraints);

            if self.labels.iter().any(|label| label.is_none()) {
                debug!(iteration, "point with no admissible cluster, stopping");
                break;
            }

            let previous = self
                .cluster_centers
                .take()
                .expect("centers are initialized before refinement");
            let current = self.estimate_centers(data);
            let shift = center_shift(&previous, &current);
            self.cluster_centers = Some(current);

            debug!(iteration, shift, "centers re-estimated");

            if shift < threshold {
                self.converged = true;
                debug!(iteration, "converged");
                break;
            }
        }

        self.n_iter = n_iter;
        self
    }

    /// One constrained assignment pass.
    ///
    /// Candidate rankings are computed in parallel; the commit pass is
    /// sequential in dataset index order, so earlier points shape what later
    /// points may take and reordering the dataset can change the outcome.
    /// This is the accepted cost of the single-pass heuristic.
    fn assign_clusters(
        &self,
        data: ArrayView2<'_, f64>,
        constraints: Option<&ConstraintMatrix>,
    ) -> Vec<Option<usize>> {
        let centers = self
            .cluster_centers
            .as_ref()
            .expect("centers are initialized before assignment");

        // Vacant centers have no coordinates and are never candidates.
        let estimated: Vec<(usize, &Array1<f64>)> = centers
            .iter()
            .enumerate()
            .filter_map(|(cluster, center)| center.as_estimated().map(|point| (cluster, point)))
            .collect();

        let n_samples = data.nrows();

        // Nearest-first candidate order per point; the stable sort keeps
        // distance ties on the lower cluster index.
        let ranked: Vec<Vec<usize>> = (0..n_samples)
            .into_par_iter()
            .map(|i| {
                let point = data.row(i);
                let mut candidates: Vec<(usize, f64)> = estimated
                    .iter()
                    .map(|&(cluster, center)| (cluster, squared_distance(point, center.view())))
                    .collect();
                candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
                candidates.into_iter().map(|(cluster, _)| cluster).collect()
            })
            .collect();

        let mut labels: Vec<Option<usize>> = vec![None; n_samples];
        for i in 0..n_samples {
            // Only cannot-link relations veto a candidate. Must-link
            // partners are not consulted, so a must-linked pair can still
            // land in different clusters.
            for &cluster in &ranked[i] {
                let vetoed = constraints.is_some_and(|matrix| {
                    matrix
                        .cannot_linked(i)
                        .any(|partner| labels[partner] == Some(cluster))
                });
                if !vetoed {
                    labels[i] = Some(cluster);
                    break;
                }
            }
        }
        labels
    }

    fn estimate_centers(&self, data: ArrayView2<'_, f64>) -> Vec<Center> {
        (0..self.n_clusters)
            .map(|cluster| {
                let members: Vec<usize> = self
                    .labels
                    .iter()
                    .enumerate()
                    .filter(|&(_, &label)| label == Some(cluster))
                    .map(|(i, _)| i)
                    .collect();
                match data.select(Axis(0), &members).mean_axis(Axis(0)) {
                    Some(mean) => Center::Estimated(mean),
                    None => Center::Vacant,
                }
            })
            .collect()
    }
}

/// Euclidean norm of the aggregate center displacement. Any vacant center
/// on either side makes the displacement infinite, so convergence cannot
/// trigger while a cluster is empty.
fn center_shift(previous: &[Center], current: &[Center]) -> f64 {
    let mut sum = 0.0;
    for (before, after) in previous.iter().zip(current) {
        match (before.as_estimated(), after.as_estimated()) {
            (Some(a), Some(b)) => sum += (a - b).mapv(|v| v * v).sum(),
            _ => return f64::INFINITY,
        }
    }
    sum.sqrt()
}

/// Squared Euclidean distance. The ranking it induces matches the true
/// Euclidean ranking, so the square root is skipped.
pub(crate) fn squared_distance(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    (&x - &y).mapv(|v| v * v).sum()
}
