use thiserror::Error;

#[derive(Error, Debug)]
pub enum OTError {
    #[error(
        "Sample weight dimensions, source distribution \
            {dim_a:?} and target distribution {dim_b:?}, do \
            not match loss matrix dimensions, ({dim_m_0:?}, {dim_m_1:?})"
    )]
    WeightDimensionError {
        dim_a: usize,
        dim_b: usize,
        dim_m_0: usize,
        dim_m_1: usize,
    },

    #[error("Invalid argument: '{0}'")]
    ArgError(String),

    /// Screening produced an unusable reduced problem: an empty active set,
    /// or a kernel that underflowed to zero everywhere the bound formulas
    /// divide by its minimum. Recoverable by retrying with a larger
    /// regularization term or larger active-set sizes.
    #[error("Degenerate screening: {0}")]
    DegenerateScreening(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
