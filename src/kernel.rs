use ndarray::prelude::*;

/// Computes the Gibbs kernel `K = exp(-C / reg)` from a cost matrix.
///
/// Entries whose cost is very large relative to `reg` underflow to zero;
/// that is accepted behavior here, not an error. Screening detects a fully
/// underflowed kernel later via its minimum entry.
pub fn gibbs_kernel(cost: &Array2<f64>, reg: f64) -> Array2<f64> {
    cost.mapv(|c| (-c / reg).exp())
}
