//! screenkhorn prelude
//!
//! This module contains the most used types, traits, and functions
//!
//! ```
//! use screenkhorn::prelude::*;
//!
//! ```

pub use crate::OTSolver;

pub use crate::error::OTError;

pub use crate::diagnostics::{LogObserver, NullObserver, ScreeningObserver};

pub use crate::lbfgsb::{LbfgsbOptions, SolveDiagnostics, Termination};

pub use crate::screened::{ScreenedSolution, Screenkhorn};

pub use crate::sinkhorn::sinkhorn_knopp;

pub use crate::metrics::{dist, MetricType::Euclidean, MetricType::SqEuclidean};
