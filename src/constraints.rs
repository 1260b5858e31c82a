//! Pairwise relational hints between points.

use ndarray::Array2;

use crate::error::ClusterError;

const MUST: i8 = 1;
const CANNOT: i8 = -1;

/// The relation recorded between a pair of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// The pair should end in the same cluster.
    MustLink,
    /// The pair must end in different clusters.
    CannotLink,
}

/// Symmetric matrix of must-link / cannot-link relations over point indices.
///
/// Relations are set pairwise and mirrored, so `get(i, k)` always agrees
/// with `get(k, i)`. Re-linking a pair overwrites its previous relation.
/// The engine only reads the matrix during a fit.
///
/// Only cannot-link relations are enforced by the assignment pass; must-link
/// relations are stored and readable but do not veto candidate clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintMatrix {
    relations: Array2<i8>,
}

impl ConstraintMatrix {
    /// An all-unconstrained matrix over `n_points` points.
    pub fn new(n_points: usize) -> Self {
        Self {
            relations: Array2::zeros((n_points, n_points)),
        }
    }

    /// Number of points the matrix covers.
    pub fn len(&self) -> usize {
        self.relations.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Requires points `i` and `k` to share a cluster.
    pub fn must_link(&mut self, i: usize, k: usize) -> Result<(), ClusterError> {
        self.set(i, k, MUST)
    }

    /// Forbids points `i` and `k` from sharing a cluster.
    pub fn cannot_link(&mut self, i: usize, k: usize) -> Result<(), ClusterError> {
        self.set(i, k, CANNOT)
    }

    fn set(&mut self, i: usize, k: usize, relation: i8) -> Result<(), ClusterError> {
        let len = self.len();
        for index in [i, k] {
            if index >= len {
                return Err(ClusterError::ConstraintOutOfBounds { index, len });
            }
        }
        self.relations[[i, k]] = relation;
        self.relations[[k, i]] = relation;
        Ok(())
    }

    /// The relation recorded for `(i, k)`, if any.
    pub fn get(&self, i: usize, k: usize) -> Option<Constraint> {
        match self.relations[[i, k]] {
            MUST => Some(Constraint::MustLink),
            CANNOT => Some(Constraint::CannotLink),
            _ => None,
        }
    }

    /// Indices of the points must-linked to `i`.
    pub fn must_linked(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.partners(i, MUST)
    }

    /// Indices of the points cannot-linked to `i`.
    pub fn cannot_linked(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.partners(i, CANNOT)
    }

    fn partners(&self, i: usize, relation: i8) -> impl Iterator<Item = usize> + '_ {
        self.relations
            .row(i)
            .into_iter()
            .enumerate()
            .filter(move |&(_, &value)| value == relation)
            .map(|(k, _)| k)
    }
}
