//! Restricted dual problem over the active kernel block.
//!
//! Holds the active block `K_IJ`, the two active-by-inactive slices, the
//! precomputed inactive-mass correction vectors, and the restricted-Sinkhorn
//! offset constants. Evaluates the restricted dual objective and gradient,
//! and runs the fixed-count multiplicative warm start that seeds the
//! optimizer.

use ndarray::prelude::*;

use super::screening::Screening;

/// Restricted dual problem data, sliced once at construction and read-only
/// afterwards.
pub struct RestrictedProblem {
    /// Active block `K[I, J]`.
    pub k_ij: Array2<f64>,
    /// Active rows against inactive columns, `K[I, Jc]`.
    pub k_ijc: Array2<f64>,
    /// Inactive rows against active columns, `K[Ic, J]`.
    pub k_icj: Array2<f64>,
    /// Active source marginals `a[I]`.
    pub a_i: Array1<f64>,
    /// Active target marginals `b[J]`.
    pub b_j: Array1<f64>,
    /// Inactive-column contribution to the row gradient, length `|I|`.
    pub vec_eps_ijc: Array1<f64>,
    /// Inactive-row contribution to the column gradient, length `|J|`.
    pub vec_eps_icj: Array1<f64>,
    /// Restricted-Sinkhorn offset for the row update; zero in full mode.
    pub cst_u: Array1<f64>,
    /// Restricted-Sinkhorn offset for the column update; zero in full mode.
    pub cst_v: Array1<f64>,
    epsilon: f64,
    fact_scale: f64,
}

impl RestrictedProblem {
    /// Slices the kernel and marginals into the active and correction
    /// blocks. Pure single-pass construction, no iteration.
    pub fn assemble(
        a: &Array1<f64>,
        b: &Array1<f64>,
        kernel: &Array2<f64>,
        screening: &Screening,
    ) -> RestrictedProblem {
        let active_rows = kernel.select(Axis(0), &screening.keep_rows);
        let inactive_rows = kernel.select(Axis(0), &screening.drop_rows);

        let k_ij = active_rows.select(Axis(1), &screening.keep_cols);
        let k_ijc = active_rows.select(Axis(1), &screening.drop_cols);
        let k_icj = inactive_rows.select(Axis(1), &screening.keep_cols);

        let a_i = a.select(Axis(0), &screening.keep_rows);
        let b_j = b.select(Axis(0), &screening.keep_cols);

        let epsilon = screening.epsilon;
        let fact_scale = screening.fact_scale;

        let vec_eps_ijc = epsilon * fact_scale * k_ijc.sum_axis(Axis(1));
        let vec_eps_icj = (epsilon / fact_scale) * k_icj.sum_axis(Axis(0));

        // Numerically these coincide with the correction vectors once the
        // scale factor is 1, but each follows its own formula
        let (cst_u, cst_v) = if screening.screened {
            (
                fact_scale * epsilon * k_ijc.sum_axis(Axis(1)),
                epsilon * k_icj.sum_axis(Axis(0)) / fact_scale,
            )
        } else {
            (
                Array1::zeros(screening.keep_rows.len()),
                Array1::zeros(screening.keep_cols.len()),
            )
        };

        RestrictedProblem {
            k_ij,
            k_ijc,
            k_icj,
            a_i,
            b_j,
            vec_eps_ijc,
            vec_eps_icj,
            cst_u,
            cst_v,
            epsilon,
            fact_scale,
        }
    }

    /// Restricted dual objective
    /// `u K_IJ v - s (a_I . log u) - (1/s)(b_J . log v) + u . vec_eps_IJc + vec_eps_IcJ . v`
    /// where `s` is the scale factor. Defined for strictly positive `u, v`;
    /// the optimizer's box bounds keep evaluations away from the boundary.
    pub fn objective(&self, u: ArrayView1<f64>, v: ArrayView1<f64>) -> f64 {
        let part_ij = u.dot(&self.k_ij.dot(&v))
            - self.fact_scale * self.a_i.dot(&u.mapv(f64::ln))
            - self.b_j.dot(&v.mapv(f64::ln)) / self.fact_scale;
        part_ij + u.dot(&self.vec_eps_ijc) + self.vec_eps_icj.dot(&v)
    }

    /// Gradient of the restricted dual objective with respect to `(u, v)`.
    pub fn grad(&self, u: ArrayView1<f64>, v: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
        let grad_u =
            self.k_ij.dot(&v) + &self.vec_eps_ijc - self.fact_scale * (&self.a_i / &u);
        let grad_v =
            self.k_ij.t().dot(&u) + &self.vec_eps_icj - (&self.b_j / &v) / self.fact_scale;
        (grad_u, grad_v)
    }

    /// Objective and concatenated gradient at a packed `[u, v]` point, in
    /// the shape the bound-constrained optimizer consumes.
    pub fn eval_packed(&self, theta: &Array1<f64>) -> (f64, Array1<f64>) {
        let split = self.a_i.len();
        let (u, v) = theta.view().split_at(Axis(0), split);

        let value = self.objective(u, v);
        let (grad_u, grad_v) = self.grad(u, v);

        let mut grad = Array1::zeros(theta.len());
        grad.slice_mut(s![..split]).assign(&grad_u);
        grad.slice_mut(s![split..]).assign(&grad_v);
        (value, grad)
    }

    /// Fixed-count multiplicative warm start (restricted Sinkhorn).
    ///
    /// Alternates the column update (from the current rows) and the row
    /// update (from the fresh columns) `sweeps` times, then clamps both
    /// vectors up to their screening floors. No adaptive stopping: this
    /// only seeds the optimizer, it is not itself a solver for the
    /// restricted dual optimum.
    pub fn restricted_sinkhorn(
        &self,
        u0: Array1<f64>,
        v0: Array1<f64>,
        sweeps: usize,
    ) -> (Array1<f64>, Array1<f64>) {
        let mut u = u0;
        let mut v = v0;

        for _ in 0..sweeps {
            let kt_u = self.k_ij.t().dot(&u) + &self.cst_v;
            v = &self.b_j / &(self.fact_scale * kt_u);

            let k_v = self.k_ij.dot(&v) + &self.cst_u;
            u = (self.fact_scale * &self.a_i) / k_v;
        }

        let row_floor = self.epsilon / self.fact_scale;
        let col_floor = self.epsilon * self.fact_scale;
        u.mapv_inplace(|x| if x <= row_floor { row_floor } else { x });
        v.mapv_inplace(|x| if x <= col_floor { col_floor } else { x });

        (u, v)
    }
}
