//! # screenkhorn
//!
//! Screened Sinkhorn solver for entropy-regularized optimal transport.
//!
//! Instead of running Sinkhorn iterations over the full Gibbs kernel
//! `K = exp(-C/reg)`, the solver screens the kernel down to an active block
//! of rows and columns that provably carries the transport mass, solves the
//! restricted dual problem with a bound-constrained L-BFGS-B optimizer, and
//! expands the result back to a full-size transport plan. Inactive rows and
//! columns are pinned to a screening threshold rather than dropped, so the
//! returned plan always has the full `n x m` shape.
//!
//! ```rust
//! use screenkhorn::prelude::*;
//! use ndarray::prelude::*;
//!
//! let a = Array1::from_elem(3, 1. / 3.);
//! let b = Array1::from_elem(3, 1. / 3.);
//! let cost = array![[0., 1., 2.], [1., 0., 1.], [2., 1., 0.]];
//!
//! // Keep every row and column: plain dual Sinkhorn via L-BFGS-B
//! let plan = Screenkhorn::new(&a, &b, &cost, 0.5, 3, 3)
//!     .solve()
//!     .unwrap();
//! assert_eq!(plan.shape(), &[3, 3]);
//! ```

mod error;
pub mod diagnostics;
pub mod kernel;
pub mod lbfgsb;
pub mod metrics;
pub mod prelude;
pub mod screened;
pub mod sinkhorn;
pub mod utils;

pub use error::OTError;
pub use screened::{ScreenedSolution, Screenkhorn};

pub trait OTSolver {
    fn check_shape(&self) -> Result<(), error::OTError>;
    fn solve(&mut self) -> Result<ndarray::Array2<f64>, error::OTError>;
}
