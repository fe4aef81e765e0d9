use ndarray::prelude::*;
use ndarray::Data;
use num_traits::Float;

use crate::error::OTError;

/// Returns a normalized 1D histogram of a gaussian distribution
/// n: number of bins in histogram
/// mean: mean value of distribution
/// std: standard deviation of distribution
pub fn gauss_histogram_1d(n: usize, mean: f64, std: f64) -> Result<Array1<f64>, OTError> {
    if n == 0 {
        return Err(OTError::ArgError("histogram needs at least one bin".to_string()));
    }
    if std <= 0.0 {
        return Err(OTError::ArgError(
            "standard deviation must be positive".to_string(),
        ));
    }

    let denom = 2.0 * std * std;
    let mut histogram =
        Array1::from_iter((0..n).map(|i| (-(i as f64 - mean).powi(2) / denom).exp()));
    let total = histogram.sum();
    histogram /= total;

    Ok(histogram)
}

/// True when every element is finite and strictly positive.
pub fn all_positive<S, D, A>(arr: &ArrayBase<S, D>) -> bool
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    arr.iter().all(|x| x.is_finite() && *x > A::zero())
}

#[cfg(test)]
mod tests {

    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    use super::{all_positive, gauss_histogram_1d};

    #[test]
    fn test_gauss_histogram_sums_to_one() {
        let histogram = gauss_histogram_1d(50, 20.0, 5.0).unwrap();

        assert_eq!(histogram.len(), 50);
        assert_abs_diff_eq!(histogram.sum(), 1.0, epsilon = 1e-12);
        assert!(all_positive(&histogram));
    }

    #[test]
    fn test_gauss_histogram_rejects_bad_inputs() {
        assert!(gauss_histogram_1d(0, 0.0, 1.0).is_err());
        assert!(gauss_histogram_1d(10, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_all_positive() {
        assert!(all_positive(&array![1.0, 2.0, 3.0]));
        assert!(!all_positive(&array![1.0, 0.0]));
        assert!(!all_positive(&array![1.0, -2.0]));
        assert!(!all_positive(&array![1.0, f64::NAN]));
        assert!(!all_positive(&array![1.0, f64::INFINITY]));
    }
}
