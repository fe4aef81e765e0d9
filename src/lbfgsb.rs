//! Bound-constrained limited-memory quasi-Newton minimizer.
//!
//! A projected L-BFGS-B: the two-loop recursion over a limited history of
//! `(s, y)` pairs gives a quasi-Newton direction, an Armijo backtracking
//! line search projects every trial point onto the box, and convergence is
//! declared on the sup-norm of the projected gradient. Budget exhaustion is
//! reported through diagnostics, never as an error: the caller decides
//! whether the point reached is acceptable.

use ndarray::prelude::*;

/// Why the minimizer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Projected gradient sup-norm fell below `pgtol`.
    Converged,
    /// Iteration budget exhausted.
    MaxIterations,
    /// Function evaluation budget exhausted.
    MaxFunctionEvals,
    /// Backtracking produced no acceptable step.
    LineSearchFailure,
}

/// Convergence record surfaced to the caller alongside the solution.
#[derive(Debug, Clone)]
pub struct SolveDiagnostics {
    pub converged: bool,
    pub iterations: usize,
    pub func_evals: usize,
    /// Sup-norm of the projected gradient at the returned point.
    pub grad_norm: f64,
    pub termination: Termination,
}

#[derive(Debug, Clone, Copy)]
pub struct LbfgsbOptions {
    /// Number of `(s, y)` pairs kept for the inverse Hessian approximation.
    pub memory: usize,
    pub max_iter: usize,
    pub max_fun: usize,
    /// Tolerance on the projected gradient sup-norm.
    pub pgtol: f64,
}

impl Default for LbfgsbOptions {
    fn default() -> Self {
        Self {
            memory: 10,
            max_iter: 1000,
            max_fun: 1000,
            pgtol: 1e-9,
        }
    }
}

pub struct LbfgsbResult {
    pub x: Array1<f64>,
    pub fval: f64,
    pub diagnostics: SolveDiagnostics,
}

/// Minimizes `objective` over the box `bounds`, starting from `x0`.
///
/// `objective` returns the function value and gradient at a point; it is
/// never queried outside the box. Non-finite values returned at the box
/// boundary are tolerated: the line search simply rejects such steps.
pub fn minimize<F>(
    mut objective: F,
    x0: &Array1<f64>,
    bounds: &[(f64, f64)],
    options: &LbfgsbOptions,
) -> LbfgsbResult
where
    F: FnMut(&Array1<f64>) -> (f64, Array1<f64>),
{
    let mut x = clamp_to_bounds(x0, bounds);
    let (mut fval, mut grad) = objective(&x);
    let mut func_evals = 1usize;

    let mut s_history: Vec<Array1<f64>> = Vec::with_capacity(options.memory);
    let mut y_history: Vec<Array1<f64>> = Vec::with_capacity(options.memory);
    let mut rho_history: Vec<f64> = Vec::with_capacity(options.memory);

    let mut iterations = 0usize;
    let mut termination = Termination::MaxIterations;

    while iterations < options.max_iter {
        if projected_gradient_norm(&x, &grad, bounds) < options.pgtol {
            termination = Termination::Converged;
            break;
        }
        if func_evals >= options.max_fun {
            termination = Termination::MaxFunctionEvals;
            break;
        }

        let mut direction = two_loop_direction(&grad, &s_history, &y_history, &rho_history);
        if direction.dot(&grad) >= 0.0 {
            // Curvature information is unusable; fall back to steepest descent
            direction = grad.mapv(|g| -g);
        }

        // Armijo backtracking with projection of each trial onto the box
        let mut step = 1.0f64;
        let mut accepted = false;
        for _ in 0..30 {
            let x_trial = clamp_to_bounds(&(&x + &(step * &direction)), bounds);
            let (f_trial, g_trial) = objective(&x_trial);
            func_evals += 1;

            let actual_step = &x_trial - &x;
            let moved = actual_step.iter().any(|&s| s != 0.0);
            let armijo = fval + 1e-4 * grad.dot(&actual_step);
            if moved && f_trial.is_finite() && f_trial <= armijo {
                let y = &g_trial - &grad;
                let sy = actual_step.dot(&y);
                // Guard the curvature condition so the inverse Hessian
                // approximation stays positive definite
                if sy > 1e-10 {
                    if s_history.len() >= options.memory {
                        s_history.remove(0);
                        y_history.remove(0);
                        rho_history.remove(0);
                    }
                    rho_history.push(1.0 / sy);
                    s_history.push(actual_step);
                    y_history.push(y);
                }
                x = x_trial;
                fval = f_trial;
                grad = g_trial;
                accepted = true;
                break;
            }

            step *= 0.5;
            if func_evals >= options.max_fun {
                break;
            }
        }

        iterations += 1;

        if !accepted {
            termination = if func_evals >= options.max_fun {
                Termination::MaxFunctionEvals
            } else {
                Termination::LineSearchFailure
            };
            break;
        }
    }

    let grad_norm = projected_gradient_norm(&x, &grad, bounds);
    let converged = termination == Termination::Converged;

    LbfgsbResult {
        x,
        fval,
        diagnostics: SolveDiagnostics {
            converged,
            iterations,
            func_evals,
            grad_norm,
            termination,
        },
    }
}

/// L-BFGS two-loop recursion over the stored `(s, y)` pairs.
fn two_loop_direction(
    grad: &Array1<f64>,
    s_history: &[Array1<f64>],
    y_history: &[Array1<f64>],
    rho_history: &[f64],
) -> Array1<f64> {
    let k = s_history.len();
    if k == 0 {
        return grad.mapv(|g| -g);
    }

    let mut q = grad.clone();
    let mut alpha = vec![0.0f64; k];

    for i in (0..k).rev() {
        alpha[i] = rho_history[i] * s_history[i].dot(&q);
        q = q - alpha[i] * &y_history[i];
    }

    // Initial inverse Hessian H0 = gamma * I from the most recent pair
    let sy = s_history[k - 1].dot(&y_history[k - 1]);
    let yy = y_history[k - 1].dot(&y_history[k - 1]);
    let gamma = if yy > 1e-30 { sy / yy } else { 1.0 };

    let mut r = gamma * q;
    for i in 0..k {
        let beta = rho_history[i] * y_history[i].dot(&r);
        r = r + (alpha[i] - beta) * &s_history[i];
    }

    r.mapv(|v| -v)
}

/// Sup-norm of the gradient with components pointing out of the box zeroed.
fn projected_gradient_norm(x: &Array1<f64>, grad: &Array1<f64>, bounds: &[(f64, f64)]) -> f64 {
    let mut norm = 0.0f64;
    for i in 0..x.len() {
        let (lower, upper) = bounds[i];
        let g = grad[i];
        let pg = if (x[i] <= lower && g > 0.0) || (x[i] >= upper && g < 0.0) {
            0.0
        } else {
            g
        };
        norm = norm.max(pg.abs());
    }
    norm
}

fn clamp_to_bounds(x: &Array1<f64>, bounds: &[(f64, f64)]) -> Array1<f64> {
    Array1::from_iter(
        x.iter()
            .zip(bounds.iter())
            .map(|(&v, &(lower, upper))| v.max(lower).min(upper)),
    )
}

#[cfg(test)]
mod tests {

    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    use super::{minimize, LbfgsbOptions, Termination};

    fn quadratic(center: &Array1<f64>) -> impl FnMut(&Array1<f64>) -> (f64, Array1<f64>) + '_ {
        move |x: &Array1<f64>| {
            let diff = x - center;
            let f = 0.5 * diff.dot(&diff);
            (f, diff)
        }
    }

    #[test]
    fn test_unconstrained_quadratic() {
        let center = array![1.0, -2.0, 3.0];
        let x0 = array![0.0, 0.0, 0.0];
        let bounds = vec![(f64::NEG_INFINITY, f64::INFINITY); 3];

        let result = minimize(quadratic(&center), &x0, &bounds, &LbfgsbOptions::default());

        assert!(result.diagnostics.converged);
        assert_abs_diff_eq!(result.x, center, epsilon = 1e-6);
        assert!(result.fval < 1e-12);
    }

    #[test]
    fn test_active_bound() {
        // Minimum at 2.0 but the box caps the coordinate at 1.0
        let center = array![2.0];
        let x0 = array![0.5];
        let bounds = vec![(0.0, 1.0)];

        let result = minimize(quadratic(&center), &x0, &bounds, &LbfgsbOptions::default());

        assert!(result.diagnostics.converged);
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_start_outside_box_is_clamped() {
        let center = array![0.0, 0.0];
        let x0 = array![10.0, -10.0];
        let bounds = vec![(-1.0, 1.0), (-1.0, 1.0)];

        let result = minimize(quadratic(&center), &x0, &bounds, &LbfgsbOptions::default());

        assert!(result.diagnostics.converged);
        assert_abs_diff_eq!(result.x, array![0.0, 0.0], epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_budget_reported() {
        let center = array![5.0, -5.0];
        let x0 = array![0.0, 0.0];
        let bounds = vec![(f64::NEG_INFINITY, f64::INFINITY); 2];
        let options = LbfgsbOptions {
            max_iter: 1,
            ..LbfgsbOptions::default()
        };

        let result = minimize(quadratic(&center), &x0, &bounds, &options);

        assert!(!result.diagnostics.converged);
        assert_eq!(result.diagnostics.termination, Termination::MaxIterations);
        assert_eq!(result.diagnostics.iterations, 1);
    }

    #[test]
    fn test_rejects_nonfinite_regions() {
        // -log(x) blows up at the lower bound; the line search must back off
        let objective = |x: &Array1<f64>| {
            let f = x[0] - x[0].ln();
            let g = array![1.0 - 1.0 / x[0]];
            (f, g)
        };
        let x0 = array![3.0];
        let bounds = vec![(0.0, f64::INFINITY)];

        let result = minimize(objective, &x0, &bounds, &LbfgsbOptions::default());

        assert!(result.diagnostics.converged);
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-6);
    }
}
