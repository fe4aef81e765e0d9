//! Active-set selection for the screened Sinkhorn problem.
//!
//! Derives per-side screening thresholds from the descending-sorted ratios
//! of marginal mass to kernel row/column sums, keeps the rows and columns
//! whose mass clears the threshold, and computes the L-BFGS-B box bounds
//! that keep the restricted dual problem strongly convex.

use std::cmp::Ordering;

use anyhow::anyhow;
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;

use crate::error::OTError;

/// Outcome of the screening pass: thresholds, active index sets and their
/// complements, and per-coordinate optimizer bounds. Immutable once built.
pub struct Screening {
    /// Screening threshold; zero in full mode.
    pub epsilon: f64,
    /// Rescaling factor between the two dual blocks. The reference
    /// implementation resets it to 1.0 immediately after index selection,
    /// which makes the rescaling inert in the objective; that surprising
    /// behavior is intentional and preserved here.
    pub fact_scale: f64,
    /// Active row indices, ascending.
    pub keep_rows: Vec<usize>,
    /// Active column indices, ascending.
    pub keep_cols: Vec<usize>,
    /// Complement of `keep_rows`, ascending.
    pub drop_rows: Vec<usize>,
    /// Complement of `keep_cols`, ascending.
    pub drop_cols: Vec<usize>,
    /// `(lower, upper)` box for each active row dual variable.
    pub bounds_rows: Vec<(f64, f64)>,
    /// `(lower, upper)` box for each active column dual variable.
    pub bounds_cols: Vec<(f64, f64)>,
    /// False when every row and column was requested (no screening).
    pub screened: bool,
}

impl Screening {
    /// Selects active sets keeping `n_keep` rows and `m_keep` columns.
    ///
    /// The threshold selects by ratio value, not by exact rank: with ties
    /// or floating-point rounding at the cutoff, the active set size may
    /// differ from the requested size by a small amount. That is expected.
    ///
    /// With `uniform_marginals` set, the ascending marginal sort feeding
    /// the bound formulas is skipped and the raw marginals are used in
    /// index order instead, matching the reference shortcut for uniform
    /// weights.
    pub fn select(
        a: &Array1<f64>,
        b: &Array1<f64>,
        kernel: &Array2<f64>,
        n_keep: usize,
        m_keep: usize,
        uniform_marginals: bool,
    ) -> Result<Screening, OTError> {
        let n = a.len();
        let m = b.len();

        if n_keep == n && m_keep == m {
            return Ok(Screening::full(n, m));
        }

        let k_sum_cols = kernel.sum_axis(Axis(1));
        let k_sum_rows = kernel.sum_axis(Axis(0));
        let k_min = match kernel.min() {
            Ok(val) => *val,
            Err(err) => return Err(OTError::Other(anyhow!(err))),
        };
        if k_min <= 0.0 {
            return Err(OTError::DegenerateScreening(
                "kernel minimum is zero; increase reg or rescale the cost matrix".to_string(),
            ));
        }

        let ratio_rows = a / &k_sum_cols;
        let ratio_cols = b / &k_sum_rows;
        let epsilon_u_square = rank_value(&ratio_rows, n_keep);
        let epsilon_v_square = rank_value(&ratio_cols, m_keep);

        let epsilon = (epsilon_u_square * epsilon_v_square).powf(0.25);
        let fact_scale = (epsilon_v_square / epsilon_u_square).sqrt();

        let keep_rows: Vec<usize> = (0..n)
            .filter(|&i| a[i] >= epsilon.powi(2) / fact_scale * k_sum_cols[i])
            .collect();
        let keep_cols: Vec<usize> = (0..m)
            .filter(|&j| b[j] >= epsilon.powi(2) * fact_scale * k_sum_rows[j])
            .collect();

        // The scale factor has done its job selecting indices; from here on
        // the dual problem runs unrescaled (reference behavior, kept as-is)
        let fact_scale = 1.0;

        if keep_rows.is_empty() || keep_cols.is_empty() {
            return Err(OTError::DegenerateScreening(format!(
                "empty active set (|I| = {}, |J| = {}); increase reg or the active-set sizes",
                keep_rows.len(),
                keep_cols.len()
            )));
        }

        let drop_rows = complement(&keep_rows, n);
        let drop_cols = complement(&keep_cols, m);

        // The bound formulas index the ascending-sorted marginals at the
        // active positions; with uniform weights the sort is a no-op and
        // the reference skips it
        let a_sorted = sorted_ascending(a, uniform_marginals);
        let b_sorted = sorted_ascending(b, uniform_marginals);
        let a_selected: Vec<f64> = keep_rows.iter().map(|&i| a_sorted[i]).collect();
        let b_selected: Vec<f64> = keep_cols.iter().map(|&j| b_sorted[j]).collect();

        let i_len = keep_rows.len() as f64;
        let j_len = keep_cols.len() as f64;
        let nf = n as f64;
        let mf = m as f64;

        let a_sel_first = a_selected[0];
        let a_sel_last = a_selected[a_selected.len() - 1];
        let b_sel_first = b_selected[0];
        let b_sel_last = b_selected[b_selected.len() - 1];

        let lower_row = (fact_scale * a_sel_last
            / (epsilon * (mf - j_len) + j_len * (b_sel_first / (epsilon * nf * k_min))))
            .max(epsilon / fact_scale);
        let upper_row = a_sel_first / (epsilon * mf * k_min);
        let bounds_rows = vec![(lower_row, upper_row); keep_rows.len()];

        let lower_col = (b_sel_last
            / (epsilon * (nf - i_len) + i_len * (a_sel_first / (epsilon * mf * k_min))))
            .max(epsilon * fact_scale);
        let upper_col = b_sel_first / (epsilon * nf * k_min);
        let bounds_cols = vec![(lower_col, upper_col); keep_cols.len()];

        Ok(Screening {
            epsilon,
            fact_scale,
            keep_rows,
            keep_cols,
            drop_rows,
            drop_cols,
            bounds_rows,
            bounds_cols,
            screened: true,
        })
    }

    /// Degenerate "keep everything" configuration: no thresholding, duals
    /// constrained only to be nonnegative.
    fn full(n: usize, m: usize) -> Screening {
        Screening {
            epsilon: 0.0,
            fact_scale: 1.0,
            keep_rows: (0..n).collect(),
            keep_cols: (0..m).collect(),
            drop_rows: Vec::new(),
            drop_cols: Vec::new(),
            bounds_rows: vec![(0.0, f64::INFINITY); n],
            bounds_cols: vec![(0.0, f64::INFINITY); m],
            screened: false,
        }
    }

    /// Floor applied to inactive (and projected) row duals.
    pub fn row_floor(&self) -> f64 {
        self.epsilon / self.fact_scale
    }

    /// Floor applied to inactive (and projected) column duals.
    pub fn col_floor(&self) -> f64 {
        self.epsilon * self.fact_scale
    }
}

/// The `rank`-th largest value of `ratios` (1-indexed rank).
fn rank_value(ratios: &Array1<f64>, rank: usize) -> f64 {
    let mut sorted = ratios.to_vec();
    sorted.sort_by(|x, y| y.partial_cmp(x).unwrap_or(Ordering::Equal));
    sorted[rank - 1]
}

fn sorted_ascending(weights: &Array1<f64>, skip_sort: bool) -> Vec<f64> {
    let mut sorted = weights.to_vec();
    if !skip_sort {
        sorted.sort_by(|x, y| x.partial_cmp(y).unwrap_or(Ordering::Equal));
    }
    sorted
}

/// Complement of an ascending index set within `0..len`, via a boolean
/// membership mask.
fn complement(kept: &[usize], len: usize) -> Vec<usize> {
    let mut mask = vec![false; len];
    for &index in kept {
        mask[index] = true;
    }
    (0..len).filter(|&index| !mask[index]).collect()
}
