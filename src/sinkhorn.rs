//! Dense Sinkhorn-Knopp baseline.
//!
//! The unscreened alternating-scaling solver over the full Gibbs kernel.
//! Kept as the reference point the screened solver is measured against in
//! tests and benchmarks.

use ndarray::prelude::*;

use crate::error::OTError;
use crate::kernel::gibbs_kernel;

/// Solves the entropic regularization optimal transport problem and returns
/// the OT matrix
/// a: Source sample weights
/// b: Target sample weights
/// cost: Loss matrix
/// reg: Entropy regularization term > 0
/// max_iter: Max number of iterations (default = 1000)
/// threshold: Stop threshold on the column-scaling update (default = 1E-9)
pub fn sinkhorn_knopp(
    a: &Array1<f64>,
    b: &Array1<f64>,
    cost: &Array2<f64>,
    reg: f64,
    max_iter: Option<usize>,
    threshold: Option<f64>,
) -> Result<Array2<f64>, OTError> {
    let dim_a = a.len();
    let dim_b = b.len();

    if dim_a != cost.nrows() || dim_b != cost.ncols() {
        return Err(OTError::WeightDimensionError {
            dim_a,
            dim_b,
            dim_m_0: cost.nrows(),
            dim_m_1: cost.ncols(),
        });
    }
    if reg <= 0. {
        return Err(OTError::ArgError("Regularization term <= 0".to_string()));
    }

    let max_iter = max_iter.unwrap_or(1000);
    let threshold = threshold.unwrap_or(1e-9);

    let kernel = gibbs_kernel(cost, reg);
    let kernel_t = kernel.t();

    let mut u = Array1::<f64>::from_elem(dim_a, 1. / dim_a as f64);
    let mut v = Array1::<f64>::from_elem(dim_b, 1. / dim_b as f64);

    for count in 0..max_iter {
        let v_prev = v.clone();

        v = b / &kernel_t.dot(&u);
        u = a / &kernel.dot(&v);

        if count % 10 == 0 {
            let err = (&v - &v_prev).mapv(f64::abs).sum();
            if err < threshold {
                break;
            }
        }
    }

    let mut plan = kernel;
    for ((i, j), p) in plan.indexed_iter_mut() {
        *p *= u[i] * v[j];
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {

    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    #[test]
    fn test_sinkhorn_knopp() {
        let a = array![0.5, 0.5];
        let b = array![0.5, 0.5];
        let cost = array![[0.0, 1.0], [1.0, 0.0]];

        let result = super::sinkhorn_knopp(&a, &b, &cost, 1.0, None, None).unwrap();

        let truth = array![[0.36552929, 0.13447071], [0.13447071, 0.36552929]];
        assert_abs_diff_eq!(result, truth, epsilon = 1e-6);
    }

    #[test]
    fn test_sinkhorn_matches_marginals() {
        let a = array![0.2, 0.3, 0.5];
        let b = array![0.4, 0.4, 0.2];
        let cost = array![[0., 1., 2.], [1., 0., 1.], [2., 1., 0.]];

        let plan = super::sinkhorn_knopp(&a, &b, &cost, 0.5, None, None).unwrap();

        assert_abs_diff_eq!(plan.sum_axis(Axis(1)), a, epsilon = 1e-6);
        assert_abs_diff_eq!(plan.sum_axis(Axis(0)), b, epsilon = 1e-6);
    }

    #[test]
    fn test_sinkhorn_rejects_bad_reg() {
        let a = array![0.5, 0.5];
        let b = array![0.5, 0.5];
        let cost = array![[0.0, 1.0], [1.0, 0.0]];

        assert!(super::sinkhorn_knopp(&a, &b, &cost, -1.0, None, None).is_err());
    }
}
