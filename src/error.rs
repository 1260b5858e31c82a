use thiserror::Error;

/// Errors surfaced while setting up a clustering run.
///
/// Fit-time conditions are values, not errors: a point with no admissible
/// cluster shows up as a `None` label, and a cluster that received no points
/// shows up as a vacant center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// The engine was asked for zero clusters.
    #[error("n_clusters must be at least 1")]
    InvalidClusterCount,

    /// A constraint referenced a point outside the matrix.
    #[error("constraint index {index} out of bounds for {len} points")]
    ConstraintOutOfBounds { index: usize, len: usize },
}
