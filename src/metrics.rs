use ndarray::prelude::*;
use ndarray_einsum_beta::*;

pub enum MetricType {
    SqEuclidean,
    Euclidean,
}

/// Compute distance between samples in x1 and x2
/// x1: matrix with n1 samples of size d
/// x2: matrix with n2 samples of size d
/// metric: choice of distance metric
pub fn dist(x1: &Array2<f64>, x2: &Array2<f64>, metric: MetricType) -> Array2<f64> {
    match metric {
        MetricType::SqEuclidean => euclidean_distances(x1, x2, true),
        MetricType::Euclidean => euclidean_distances(x1, x2, false),
    }
}

/// Pairwise euclidean distances between the rows of x and the rows of y,
/// via the `|x|^2 - 2 x.y + |y|^2` expansion.
/// squared: return squared distances
fn euclidean_distances(x: &Array2<f64>, y: &Array2<f64>, squared: bool) -> Array2<f64> {
    // einsum('ij,ij->i', X, X): row-wise squared norms
    let x_norms: Array1<f64> = einsum("ij,ij->i", &[x, x])
        .unwrap()
        .into_dimensionality()
        .unwrap();
    let y_norms: Array1<f64> = einsum("ij,ij->i", &[y, y])
        .unwrap()
        .into_dimensionality()
        .unwrap();

    let mut distances = -2.0 * x.dot(&y.t());
    distances += &x_norms.view().insert_axis(Axis(1));
    distances += &y_norms;

    // The expansion can go slightly negative from cancellation
    distances.mapv_inplace(|d| d.max(0.0));

    if !squared {
        distances.mapv_inplace(f64::sqrt);
    }

    // Identical inputs have an exactly-zero diagonal
    if x == y {
        for d in distances.diag_mut().iter_mut() {
            *d = 0.0;
        }
    }

    distances
}

#[cfg(test)]
mod tests {

    use approx::assert_abs_diff_eq;
    use ndarray::prelude::*;

    #[test]
    fn test_euclidean_distances() {
        let x = Array2::<f64>::zeros((3, 5));
        let y = Array2::from_elem((3, 5), 5.0);

        let distance = super::euclidean_distances(&x, &y, false);

        let truth = Array2::from_elem((3, 3), 125.0f64.sqrt());
        assert_abs_diff_eq!(distance, truth, epsilon = 1e-12);
    }

    #[test]
    fn test_squared_distances() {
        let x = array![[0.0, 0.0], [3.0, 4.0]];

        let distance = super::dist(&x, &x, super::MetricType::SqEuclidean);

        assert_abs_diff_eq!(
            distance,
            array![[0.0, 25.0], [25.0, 0.0]],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_identical_inputs_zero_diagonal() {
        let x = array![[1.0, 2.0], [4.0, 6.0], [0.5, -0.5]];

        let distance = super::dist(&x, &x, super::MetricType::Euclidean);

        for i in 0..3 {
            assert_eq!(distance[(i, i)], 0.0);
        }
        assert_abs_diff_eq!(distance[(0, 1)], 5.0, epsilon = 1e-12);
    }
}
