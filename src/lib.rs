//! COP-KMeans: k-means clustering under pairwise must-link / cannot-link
//! constraints.
//!
//! The engine runs Lloyd's iteration with a constraint-checked assignment
//! step: each point goes to the nearest center that keeps every cannot-link
//! relation satisfied against the assignments already committed earlier in
//! the same pass. A point with no admissible cluster is left unassigned
//! rather than forced, and the fit stops early when that happens. Empty
//! clusters surface as [`Center::Vacant`] instead of NaN centers.
//!
//! ```
//! use copkmeans::{ConstraintMatrix, CopKMeans};
//! use ndarray::array;
//!
//! let data = array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.1, 5.0]];
//! let mut constraints = ConstraintMatrix::new(4);
//! constraints.cannot_link(0, 1).unwrap();
//!
//! let mut engine = CopKMeans::new(2).unwrap().with_random_state(7);
//! engine.fit(&data, Some(&constraints));
//!
//! assert_eq!(engine.labels().len(), 4);
//! assert_ne!(engine.labels()[0], engine.labels()[1]);
//! ```

pub mod constraints;
pub mod engine;
pub mod error;
pub mod init;
pub mod tolerance;

pub use constraints::{Constraint, ConstraintMatrix};
pub use engine::{Center, CopKMeans};
pub use error::ClusterError;
pub use init::{CenterInit, KMeansPlusPlus, RandomInit};
pub use tolerance::{ToleranceEstimator, VarianceTolerance};
