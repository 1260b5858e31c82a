//! Convergence-threshold strategies.

use ndarray::{ArrayView2, Axis};

/// Turns a relative tolerance into an absolute center-displacement
/// threshold for the dataset at hand.
pub trait ToleranceEstimator {
    /// Must return a non-negative scalar that is comparable to a
    /// center-displacement norm at the dataset's feature scale.
    fn tolerance(&self, data: ArrayView2<'_, f64>, relative: f64) -> f64;
}

/// Scales the relative tolerance by the mean per-feature variance, so the
/// threshold tracks the spread of the data rather than its units.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarianceTolerance;

impl ToleranceEstimator for VarianceTolerance {
    fn tolerance(&self, data: ArrayView2<'_, f64>, relative: f64) -> f64 {
        let variances = data.var_axis(Axis(0), 0.0);
        relative * variances.mean().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::{ToleranceEstimator, VarianceTolerance};

    #[test]
    fn unit_variance_data_returns_the_relative_tolerance() {
        // Both features take the values {0, 2} twice: variance 1 each.
        let data = array![[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0]];
        let tol = VarianceTolerance.tolerance(data.view(), 1e-3);
        assert_eq!(tol, 1e-3);
    }

    #[test]
    fn constant_data_has_zero_threshold() {
        let data = array![[3.0, 3.0], [3.0, 3.0], [3.0, 3.0]];
        let tol = VarianceTolerance.tolerance(data.view(), 1e-4);
        assert_eq!(tol, 0.0);
    }

    #[test]
    fn threshold_is_linear_in_the_relative_tolerance() {
        let data = array![[0.0, 1.0], [4.0, -1.0], [2.0, 3.0]];
        let small = VarianceTolerance.tolerance(data.view(), 1e-4);
        let large = VarianceTolerance.tolerance(data.view(), 1e-2);
        assert!(small > 0.0);
        assert!((large / small - 100.0).abs() < 1e-9);
    }
}
