//! Screened Sinkhorn (Screenkhorn) solver.
//!
//! Pipeline: Gibbs kernel -> screening (active sets, thresholds, box
//! bounds) -> restricted problem assembly -> restricted-Sinkhorn warm start
//! -> bound-constrained L-BFGS-B on the restricted dual -> full-size plan
//! reconstruction.

pub mod restricted;
pub mod screening;

use ndarray::prelude::*;

use crate::diagnostics::{LogObserver, ScreeningObserver};
use crate::error::OTError;
use crate::kernel::gibbs_kernel;
use crate::lbfgsb::{self, LbfgsbOptions, SolveDiagnostics};
use crate::utils::all_positive;
use crate::OTSolver;
use restricted::RestrictedProblem;
use screening::Screening;

/// Full-size result of a screened solve.
pub struct ScreenedSolution {
    /// Row scaling vector, length `n`; inactive entries sit at the
    /// screening floor `epsilon / fact_scale`.
    pub u: Array1<f64>,
    /// Column scaling vector, length `m`; inactive entries sit at the
    /// screening floor `epsilon * fact_scale`.
    pub v: Array1<f64>,
    /// Transport plan `diag(u) K diag(v)`, shape `n x m`.
    pub plan: Array2<f64>,
    /// Optimizer convergence record. Non-convergence is reported here, not
    /// as an error; the plan is still returned.
    pub diagnostics: SolveDiagnostics,
}

/// Approximates the entropic optimal transport plan by screening the Gibbs
/// kernel down to `n_keep` rows and `m_keep` columns and solving the
/// restricted dual with L-BFGS-B.
///
/// With `n_keep = n` and `m_keep = m` no screening happens and the solver
/// reduces to the plain dual Sinkhorn problem over the whole matrix.
///
/// source_weights: Weights on samples from the source distribution (positive)
/// target_weights: Weights on samples from the target distribution (positive)
/// cost: Distance between samples in the source and target distributions
/// reg: Entropy regularization term > 0
/// n_keep: Target number of active rows, in `[1, n]`
/// m_keep: Target number of active columns, in `[1, m]`
pub struct Screenkhorn<'a> {
    source_weights: &'a Array1<f64>,
    target_weights: &'a Array1<f64>,
    cost: &'a Array2<f64>,
    reg: f64,
    n_keep: usize,
    m_keep: usize,
    warm_start_iterations: usize,
    uniform_marginals: bool,
    optimizer: LbfgsbOptions,
    observer: Box<dyn ScreeningObserver>,
}

impl<'a> Screenkhorn<'a> {
    pub fn new(
        source_weights: &'a Array1<f64>,
        target_weights: &'a Array1<f64>,
        cost: &'a Array2<f64>,
        reg: f64,
        n_keep: usize,
        m_keep: usize,
    ) -> Self {
        Self {
            source_weights,
            target_weights,
            cost,
            reg,
            n_keep,
            m_keep,
            warm_start_iterations: 9,
            uniform_marginals: false,
            optimizer: LbfgsbOptions::default(),
            observer: Box::new(LogObserver),
        }
    }

    /// Number of warm-start sweeps seeding the optimizer (default 9).
    pub fn warm_start_iterations<'b>(&'b mut self, sweeps: usize) -> &'b mut Self {
        self.warm_start_iterations = sweeps;
        self
    }

    /// Declare the marginals uniform, skipping the ascending sort that
    /// feeds the box-bound formulas.
    pub fn uniform_marginals<'b>(&'b mut self, uniform: bool) -> &'b mut Self {
        self.uniform_marginals = uniform;
        self
    }

    pub fn optimizer_options<'b>(&'b mut self, options: LbfgsbOptions) -> &'b mut Self {
        self.optimizer = options;
        self
    }

    /// Replace the diagnostics observer (defaults to the `log` facade).
    pub fn observer<'b>(&'b mut self, observer: Box<dyn ScreeningObserver>) -> &'b mut Self {
        self.observer = observer;
        self
    }

    fn check_config(&self) -> Result<(), OTError> {
        if self.reg <= 0. {
            return Err(OTError::ArgError("Regularization term <= 0".to_string()));
        }

        let n = self.source_weights.len();
        let m = self.target_weights.len();
        if self.n_keep < 1 || self.n_keep > n {
            return Err(OTError::ArgError(format!(
                "n_keep = {} outside [1, {}]",
                self.n_keep, n
            )));
        }
        if self.m_keep < 1 || self.m_keep > m {
            return Err(OTError::ArgError(format!(
                "m_keep = {} outside [1, {}]",
                self.m_keep, m
            )));
        }

        if !all_positive(self.source_weights) || !all_positive(self.target_weights) {
            return Err(OTError::ArgError(
                "Sample weights must be finite and strictly positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Runs the full screening pipeline and returns the scaling vectors,
    /// the reconstructed plan, and the optimizer diagnostics.
    pub fn solve_scaled(&mut self) -> Result<ScreenedSolution, OTError> {
        self.check_shape()?;
        self.check_config()?;

        let a = self.source_weights;
        let b = self.target_weights;
        let n = a.len();
        let m = b.len();

        let kernel = gibbs_kernel(self.cost, self.reg);
        let screening = Screening::select(
            a,
            b,
            &kernel,
            self.n_keep,
            self.m_keep,
            self.uniform_marginals,
        )?;

        self.observer.record(
            "screening.thresholds",
            &[
                ("epsilon", screening.epsilon),
                ("fact_scale", screening.fact_scale),
            ],
        );
        self.observer.record(
            "screening.active_sets",
            &[
                ("rows_kept", screening.keep_rows.len() as f64),
                ("cols_kept", screening.keep_cols.len() as f64),
            ],
        );

        let restricted = RestrictedProblem::assemble(a, b, &kernel, &screening);

        let i_len = screening.keep_rows.len();
        let j_len = screening.keep_cols.len();
        let u0 = Array1::from_elem(i_len, 1.0 / i_len as f64 + screening.row_floor());
        let v0 = Array1::from_elem(j_len, 1.0 / j_len as f64 + screening.col_floor());
        let (u, v) = restricted.restricted_sinkhorn(u0, v0, self.warm_start_iterations);

        let mut theta0 = Array1::zeros(i_len + j_len);
        theta0.slice_mut(s![..i_len]).assign(&u);
        theta0.slice_mut(s![i_len..]).assign(&v);

        let mut bounds = Vec::with_capacity(i_len + j_len);
        bounds.extend_from_slice(&screening.bounds_rows);
        bounds.extend_from_slice(&screening.bounds_cols);

        let result = lbfgsb::minimize(
            |theta| restricted.eval_packed(theta),
            &theta0,
            &bounds,
            &self.optimizer,
        );

        self.observer.record(
            "solve.optimizer",
            &[
                ("converged", f64::from(result.diagnostics.converged as u8)),
                ("iterations", result.diagnostics.iterations as f64),
                ("func_evals", result.diagnostics.func_evals as f64),
                ("grad_norm", result.diagnostics.grad_norm),
            ],
        );

        // Expand back to full length: inactive coordinates collapse to the
        // screening floors, active ones take the optimized values
        let mut u_full = Array1::from_elem(n, screening.row_floor());
        let mut v_full = Array1::from_elem(m, screening.col_floor());
        for (k, &i) in screening.keep_rows.iter().enumerate() {
            u_full[i] = result.x[k];
        }
        for (k, &j) in screening.keep_cols.iter().enumerate() {
            v_full[j] = result.x[i_len + k];
        }

        let mut plan = kernel;
        for ((i, j), p) in plan.indexed_iter_mut() {
            *p *= u_full[i] * v_full[j];
        }

        Ok(ScreenedSolution {
            u: u_full,
            v: v_full,
            plan,
            diagnostics: result.diagnostics,
        })
    }
}

impl<'a> OTSolver for Screenkhorn<'a> {
    /// Ensures dimensions of the source and target measures are consistent
    /// with the cost matrix dimensions
    fn check_shape(&self) -> Result<(), OTError> {
        let mshape = self.cost.shape();
        let m0 = mshape[0];
        let m1 = mshape[1];
        let dim_a = self.source_weights.len();
        let dim_b = self.target_weights.len();

        if dim_a != m0 || dim_b != m1 {
            return Err(OTError::WeightDimensionError {
                dim_a,
                dim_b,
                dim_m_0: m0,
                dim_m_1: m1,
            });
        }

        Ok(())
    }

    fn solve(&mut self) -> Result<Array2<f64>, OTError> {
        Ok(self.solve_scaled()?.plan)
    }
}

#[cfg(test)]
mod tests {

    use ndarray::prelude::*;

    use super::Screenkhorn;
    use crate::error::OTError;
    use crate::OTSolver;

    fn spec_problem() -> (Array1<f64>, Array1<f64>, Array2<f64>) {
        let a = Array1::from_elem(3, 1. / 3.);
        let b = Array1::from_elem(3, 1. / 3.);
        let cost = array![[0., 1., 2.], [1., 0., 1.], [2., 1., 0.]];
        (a, b, cost)
    }

    #[test]
    fn test_rejects_nonpositive_reg() {
        let (a, b, cost) = spec_problem();
        let result = Screenkhorn::new(&a, &b, &cost, 0.0, 3, 3).solve();
        assert!(matches!(result, Err(OTError::ArgError(_))));
    }

    #[test]
    fn test_rejects_bad_active_set_sizes() {
        let (a, b, cost) = spec_problem();
        assert!(matches!(
            Screenkhorn::new(&a, &b, &cost, 0.5, 0, 3).solve(),
            Err(OTError::ArgError(_))
        ));
        assert!(matches!(
            Screenkhorn::new(&a, &b, &cost, 0.5, 3, 4).solve(),
            Err(OTError::ArgError(_))
        ));
    }

    #[test]
    fn test_rejects_nonpositive_weights() {
        let (_, b, cost) = spec_problem();
        let a = array![0.5, 0.5, 0.0];
        let result = Screenkhorn::new(&a, &b, &cost, 0.5, 3, 3).solve();
        assert!(matches!(result, Err(OTError::ArgError(_))));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let (a, _, cost) = spec_problem();
        let b = Array1::from_elem(4, 0.25);
        let result = Screenkhorn::new(&a, &b, &cost, 0.5, 3, 3).solve();
        assert!(matches!(result, Err(OTError::WeightDimensionError { .. })));
    }

    #[test]
    fn test_plan_shape_and_nonnegativity() {
        let (a, b, cost) = spec_problem();
        let plan = Screenkhorn::new(&a, &b, &cost, 0.5, 3, 3).solve().unwrap();

        assert_eq!(plan.shape(), &[3, 3]);
        assert!(plan.iter().all(|&p| p >= 0.0));
    }
}
