//! Differentiable loss functions.
//!
//! The same [`mean_squared_error`] routine backs the training loss, the
//! per-epoch validation loss and the held-out test metric, so the three
//! numbers are directly comparable.

use ndarray::Array2;

/// A trait for differentiable loss functions used during model training.
///
/// Implementors must define:
/// - How to compute the scalar loss value (for logging/metrics).
/// - How to compute the gradient of the loss w.r.t. the model's predictions.
///
/// This gradient is passed to the model's `backward()` method.
pub trait Loss {
    /// Computes the scalar loss value.
    fn loss(&self, prediction: &Array2<f64>, target: &Array2<f64>) -> f64;

    /// Computes the gradient of the loss w.r.t. the prediction: ∂L/∂pred.
    fn grad_wrt_prediction(&self, prediction: &Array2<f64>, target: &Array2<f64>) -> Array2<f64>;
}

/// Mean over every element of `(prediction - target)^2`.
///
/// For an `(n, 6)` block this averages all `n * 6` squared errors.
/// Returns NaN for empty input.
pub fn mean_squared_error(prediction: &Array2<f64>, target: &Array2<f64>) -> f64 {
    let diff = prediction - target;
    diff.mapv(|d| d * d).sum() / diff.len() as f64
}

/// Mean Squared Error (MSE) loss: `L = (1/N) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `∂L/∂pred = 2 (pred - target) / N`,
/// where `N` counts every element of the prediction block.
#[derive(Clone, Copy, Debug, Default)]
pub struct MSELoss;

impl Loss for MSELoss {
    fn loss(&self, pred: &Array2<f64>, target: &Array2<f64>) -> f64 {
        mean_squared_error(pred, target)
    }

    fn grad_wrt_prediction(&self, pred: &Array2<f64>, target: &Array2<f64>) -> Array2<f64> {
        let n = pred.len() as f64;
        (pred - target) * (2.0 / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse_zero_for_exact_prediction() {
        let y = array![[1.0, 2.0], [3.0, 4.0]];
        assert_eq!(mean_squared_error(&y, &y), 0.0);
    }

    #[test]
    fn test_mse_averages_all_elements() {
        let pred = array![[1.0, 0.0], [0.0, 0.0]];
        let target = array![[0.0, 0.0], [0.0, 2.0]];
        // (1 + 4) / 4
        assert!((mean_squared_error(&pred, &target) - 1.25).abs() < 1e-12);
        assert_eq!(MSELoss.loss(&pred, &target), mean_squared_error(&pred, &target));
    }

    #[test]
    fn test_mse_gradient() {
        let pred = array![[1.0, 3.0]];
        let target = array![[0.0, 1.0]];
        let grad = MSELoss.grad_wrt_prediction(&pred, &target);
        // 2 * diff / 2
        assert_eq!(grad, array![[1.0, 2.0]]);
    }

    #[test]
    fn test_mse_gradient_matches_finite_difference() {
        let pred = array![[0.3, -1.2, 0.7], [2.0, 0.1, -0.4]];
        let target = array![[0.0, 1.0, 0.5], [1.5, -0.2, 0.0]];
        let grad = MSELoss.grad_wrt_prediction(&pred, &target);
        let h = 1e-6;
        for ((i, j), g) in grad.indexed_iter() {
            let mut up = pred.clone();
            up[[i, j]] += h;
            let mut down = pred.clone();
            down[[i, j]] -= h;
            let numeric = (MSELoss.loss(&up, &target) - MSELoss.loss(&down, &target)) / (2.0 * h);
            assert!((numeric - g).abs() < 1e-6, "({}, {}): {} vs {}", i, j, numeric, g);
        }
    }
}
