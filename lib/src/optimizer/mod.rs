use crate::model::ParamOps;

/// Trait for gradient-based optimizers.
///
/// Optimizers are responsible for updating model parameters based on computed
/// gradients. Training logic (`Trainer`) is decoupled from the update rule, so
/// any model whose parameters implement [`ParamOps`] can be paired with any
/// optimizer without dynamic dispatch.
///
/// `step` takes `&mut self` because adaptive optimizers keep running moment
/// estimates between steps. The trainer clones the configured optimizer at
/// the start of every run, so that state never leaks between runs.
///
/// # Example
/// ```rust
/// use osd_transfer::model::MlpParams;
/// use osd_transfer::optimizer::{Optimizer, SGD};
///
/// let params = MlpParams::init(0);
/// let gradients = params.clone();
/// let mut sgd = SGD::new(0.01);
/// let updated = sgd.step(&params, &gradients);
/// assert!((updated.w1[[0, 0]] - params.w1[[0, 0]] * 0.99).abs() < 1e-12);
/// ```
pub trait Optimizer<P> {
    /// Returns the updated parameters; the inputs are not mutated.
    fn step(&mut self, params: &P, gradients: &P) -> P;
}

/// Stochastic Gradient Descent (SGD) optimizer.
///
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
/// where `η` is the learning rate and `∇L(θ)` is the loss gradient.
#[derive(Clone, Debug)]
pub struct SGD {
    lr: f64,
}

impl SGD {
    /// Creates a new SGD optimizer with the specified learning rate.
    pub fn new(lr: f64) -> Self {
        Self { lr }
    }

    /// Returns the current learning rate.
    pub fn learning_rate(&self) -> f64 {
        self.lr
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&mut self, params: &P, grads: &P) -> P {
        params.add(&grads.scale(-self.lr))
    }
}

/// Adam optimizer with bias-corrected first and second moment estimates.
///
/// ```text
/// m ← β1·m + (1 - β1)·g
/// v ← β2·v + (1 - β2)·g²
/// θ ← θ - η · m̂ / (sqrt(v̂) + ε),   m̂ = m / (1 - β1^t),  v̂ = v / (1 - β2^t)
/// ```
///
/// Defaults: `β1 = 0.9`, `β2 = 0.999`, `ε = 1e-8`. Moments are allocated on
/// the first step from the gradient's shape.
#[derive(Clone, Debug)]
pub struct Adam<P> {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: i32,
    m: Option<P>,
    v: Option<P>,
}

impl<P> Adam<P> {
    pub fn new(lr: f64) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: 0,
            m: None,
            v: None,
        }
    }

    pub fn betas(mut self, beta1: f64, beta2: f64) -> Self {
        self.beta1 = beta1;
        self.beta2 = beta2;
        self
    }

    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.lr
    }

    /// Number of steps taken so far.
    pub fn steps(&self) -> i32 {
        self.t
    }
}

impl<P: ParamOps> Optimizer<P> for Adam<P> {
    fn step(&mut self, params: &P, grads: &P) -> P {
        let (beta1, beta2) = (self.beta1, self.beta2);
        let m = match &self.m {
            Some(m) => m.zip_map(grads, |m, g| beta1 * m + (1.0 - beta1) * g),
            None => grads.map(|g| (1.0 - beta1) * g),
        };
        let v = match &self.v {
            Some(v) => v.zip_map(grads, |v, g| beta2 * v + (1.0 - beta2) * g * g),
            None => grads.map(|g| (1.0 - beta2) * g * g),
        };
        self.t = self.t.saturating_add(1);

        let bc1 = 1.0 - beta1.powi(self.t);
        let bc2 = 1.0 - beta2.powi(self.t);
        let (lr, eps) = (self.lr, self.eps);
        let update = m.zip_map(&v, |m, v| lr * (m / bc1) / ((v / bc2).sqrt() + eps));

        self.m = Some(m);
        self.v = Some(v);
        params.add(&update.scale(-1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MlpParams;

    fn params_filled(value: f64) -> MlpParams {
        MlpParams::init(0).map(|_| value)
    }

    #[test]
    fn test_sgd_new_initialization() {
        let sgd = SGD::new(0.01);
        assert_eq!(sgd.learning_rate(), 0.01);
    }

    #[test]
    fn test_sgd_step_correctness() {
        // params_new = params_old - lr * grads
        let mut sgd = SGD::new(0.1);
        let updated = sgd.step(&params_filled(2.0), &params_filled(1.0));
        assert!(updated.w2.iter().all(|&w| (w - 1.9).abs() < 1e-12));
        assert!(updated.b3.iter().all(|&b| (b - 1.9).abs() < 1e-12));
    }

    #[test]
    fn test_sgd_step_zero_gradients() {
        let mut sgd = SGD::new(0.1);
        let params = MlpParams::init(4);
        let updated = sgd.step(&params, &params_filled(0.0));
        assert_eq!(updated, params);
    }

    #[test]
    fn test_sgd_step_does_not_mutate_inputs() {
        let mut sgd = SGD::new(0.1);
        let params = MlpParams::init(1);
        let grads = MlpParams::init(2);
        let params_copy = params.clone();
        let grads_copy = grads.clone();
        let _ = sgd.step(&params, &grads);
        assert_eq!(params, params_copy);
        assert_eq!(grads, grads_copy);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        // With bias correction the first update is lr * g / (|g| + eps)
        let mut adam = Adam::<MlpParams>::new(0.001);
        let updated = adam.step(&params_filled(1.0), &params_filled(0.5));
        assert!(updated.w1.iter().all(|&w| (w - 0.999).abs() < 1e-9));

        let mut adam = Adam::<MlpParams>::new(0.001);
        let updated = adam.step(&params_filled(1.0), &params_filled(-3.0));
        assert!(updated.b1.iter().all(|&b| (b - 1.001).abs() < 1e-9));
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn test_adam_keeps_moments_between_steps() {
        let mut adam = Adam::<MlpParams>::new(0.01);
        let grads = params_filled(1.0);
        let p1 = adam.step(&params_filled(0.0), &grads);
        let p2 = adam.step(&p1, &grads);
        // constant gradient: every step moves by ~lr
        assert!(p2.w3.iter().all(|&w| (w + 0.02).abs() < 1e-6));
        assert_eq!(adam.steps(), 2);
    }

    #[test]
    fn test_adam_clone_starts_from_same_state() {
        let fresh: Adam<MlpParams> = Adam::new(0.001);
        let mut used = fresh.clone();
        let params = MlpParams::init(0);
        let grads = MlpParams::init(1);
        used.step(&params, &grads);

        let mut replay = fresh.clone();
        assert_eq!(replay.steps(), 0);
        let a = replay.step(&params, &grads);
        let b = fresh.clone().step(&params, &grads);
        assert_eq!(a, b);
    }

    #[test]
    fn test_adam_zero_gradient_is_noop() {
        let mut adam = Adam::<MlpParams>::new(0.1);
        let params = MlpParams::init(3);
        let updated = adam.step(&params, &params_filled(0.0));
        assert_eq!(updated, params);
    }

    #[test]
    fn test_adam_builder_settings() {
        let adam: Adam<MlpParams> = Adam::new(0.5).betas(0.8, 0.99).eps(1e-6);
        assert_eq!(adam.learning_rate(), 0.5);
        assert_eq!(adam.beta1, 0.8);
        assert_eq!(adam.beta2, 0.99);
        assert_eq!(adam.eps, 1e-6);
    }
}
