//! Evaluation metrics on held-out predictions.
//!
//! All functions take the true and predicted values as equally long arrays.
//! Empty inputs yield `0.0`.

use ndarray::Array1;

/// Absolute tolerance for treating a prediction as exact.
const EXACT_TOLERANCE: f64 = 1e-12;

/// Fraction of predictions equal to the true class index.
///
/// # Examples
///
/// ```
/// use automl_learning::metrics::accuracy;
/// use ndarray::array;
///
/// assert_eq!(accuracy(&array![0.0, 1.0, 1.0, 2.0], &array![0.0, 1.0, 2.0, 2.0]), 0.75);
/// ```
#[must_use]
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Root mean squared error.
#[must_use]
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sse: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    (sse / y_true.len() as f64).sqrt()
}

/// Coefficient of determination.
///
/// When the true values are constant the usual definition divides by zero;
/// the score is then `1.0` if every prediction is exact and `0.0` otherwise.
///
/// # Examples
///
/// ```
/// use automl_learning::metrics::r2;
/// use ndarray::array;
///
/// assert_eq!(r2(&array![1.0, 2.0, 3.0], &array![1.0, 2.0, 3.0]), 1.0);
/// assert_eq!(r2(&array![5.0, 5.0], &array![5.0, 4.0]), 0.0);
/// ```
#[must_use]
pub fn r2(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot <= EXACT_TOLERANCE {
        let exact = y_true
            .iter()
            .zip(y_pred.iter())
            .all(|(t, p)| (t - p).abs() <= EXACT_TOLERANCE);
        return if exact { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&array![1.0, 0.0], &array![1.0, 0.0]), 1.0);
        assert_eq!(accuracy(&array![1.0, 0.0], &array![0.0, 1.0]), 0.0);
        assert_eq!(accuracy(&Array1::zeros(0), &Array1::zeros(0)), 0.0);
    }

    #[test]
    fn test_rmse() {
        assert_eq!(rmse(&array![0.0, 0.0], &array![3.0, 4.0]), (12.5f64).sqrt());
        assert_eq!(rmse(&array![2.0], &array![2.0]), 0.0);
    }

    #[test]
    fn test_r2_regular() {
        let y = array![1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2(&y, &array![2.5, 2.5, 2.5, 2.5]), 0.0);
        let score = r2(&y, &array![1.1, 1.9, 3.2, 3.8]);
        assert!((score - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2(&array![7.0, 7.0, 7.0], &array![7.0, 7.0, 7.0]), 1.0);
        assert_eq!(r2(&array![7.0, 7.0, 7.0], &array![7.0, 7.5, 7.0]), 0.0);
    }
}
