//! Fully connected regression network mapping a baseline to six targets.
//!
//! The topology is fixed and declared once in [`TRANSFER_ARCHITECTURE`]:
//! ```text
//! 1 --Linear+ReLU--> 64 --Linear+ReLU--> 128 --Linear--> 6
//! ```
//! - [`MlpRegressor`] = `MlpModel<Unfitted>`: used during training.
//! - `MlpModel<Fitted>`: inference only.
//!
//! Weights are stored as `(inputs, outputs)` so a layer computes
//! `x.dot(w) + b` on a row-major batch. Backpropagation is written out by
//! hand for the three layers; the ReLU derivative at 0 is taken as 0.

use crate::dataset::TARGET_COUNT;
use crate::model::{Fitted, InferenceModel, ParamOps, TrainableModel, Unfitted};
use ndarray::{Array1, Array2, Axis, Zip};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Activation {
    Relu,
    Identity,
}

/// One dense layer of the declared topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSpec {
    pub inputs: usize,
    pub outputs: usize,
    pub activation: Activation,
}

pub const TRANSFER_ARCHITECTURE: [LayerSpec; 3] = [
    LayerSpec {
        inputs: 1,
        outputs: 64,
        activation: Activation::Relu,
    },
    LayerSpec {
        inputs: 64,
        outputs: 128,
        activation: Activation::Relu,
    },
    LayerSpec {
        inputs: 128,
        outputs: TARGET_COUNT,
        activation: Activation::Identity,
    },
];

/// True if every layer consumes exactly what the previous one produces.
pub const fn layers_chain(layers: &[LayerSpec]) -> bool {
    let mut i = 1;
    while i < layers.len() {
        if layers[i - 1].outputs != layers[i].inputs {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(layers_chain(&TRANSFER_ARCHITECTURE));
const _: () = assert!(TRANSFER_ARCHITECTURE[0].inputs == 1);
const _: () = assert!(TRANSFER_ARCHITECTURE[2].outputs == TARGET_COUNT);

/// Weights and biases of the three layers.
///
/// Also used as the gradient type: a gradient has exactly the same shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MlpParams {
    pub w1: Array2<f64>,
    pub b1: Array1<f64>,
    pub w2: Array2<f64>,
    pub b2: Array1<f64>,
    pub w3: Array2<f64>,
    pub b3: Array1<f64>,
}

/// Intermediate values of one forward pass, kept for backpropagation.
struct ForwardCache {
    z1: Array2<f64>,
    a1: Array2<f64>,
    z2: Array2<f64>,
    a2: Array2<f64>,
    out: Array2<f64>,
}

fn relu(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| v.max(0.0))
}

fn relu_mask(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

impl MlpParams {
    /// Draws every weight and bias of a layer from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    pub fn init(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut layer = |spec: &LayerSpec| {
            let bound = 1.0 / (spec.inputs as f64).sqrt();
            let w = Array2::random_using(
                (spec.inputs, spec.outputs),
                Uniform::new(-bound, bound),
                &mut rng,
            );
            let b = Array1::random_using(spec.outputs, Uniform::new(-bound, bound), &mut rng);
            (w, b)
        };
        let (w1, b1) = layer(&TRANSFER_ARCHITECTURE[0]);
        let (w2, b2) = layer(&TRANSFER_ARCHITECTURE[1]);
        let (w3, b3) = layer(&TRANSFER_ARCHITECTURE[2]);
        Self {
            w1,
            b1,
            w2,
            b2,
            w3,
            b3,
        }
    }

    /// Total number of scalar parameters.
    pub fn len(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w2.len() + self.b2.len() + self.w3.len() + self.b3.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn forward_cached(&self, x: &Array2<f64>) -> ForwardCache {
        let z1 = x.dot(&self.w1) + &self.b1;
        let a1 = relu(&z1);
        let z2 = a1.dot(&self.w2) + &self.b2;
        let a2 = relu(&z2);
        let out = a2.dot(&self.w3) + &self.b3;
        ForwardCache { z1, a1, z2, a2, out }
    }

    /// Maps an `(n, 1)` batch of scaled baselines to `(n, 6)` scaled targets.
    pub fn forward(&self, x: &Array2<f64>) -> Array2<f64> {
        self.forward_cached(x).out
    }

    /// Gradients of the loss w.r.t. every parameter, given `∂L/∂output`.
    pub fn backward(&self, x: &Array2<f64>, grad_output: &Array2<f64>) -> MlpParams {
        let cache = self.forward_cached(x);
        debug_assert_eq!(cache.out.dim(), grad_output.dim());

        let dw3 = cache.a2.t().dot(grad_output);
        let db3 = grad_output.sum_axis(Axis(0));

        let dz2 = grad_output.dot(&self.w3.t()) * relu_mask(&cache.z2);
        let dw2 = cache.a1.t().dot(&dz2);
        let db2 = dz2.sum_axis(Axis(0));

        let dz1 = dz2.dot(&self.w2.t()) * relu_mask(&cache.z1);
        let dw1 = x.t().dot(&dz1);
        let db1 = dz1.sum_axis(Axis(0));

        MlpParams {
            w1: dw1,
            b1: db1,
            w2: dw2,
            b2: db2,
            w3: dw3,
            b3: db3,
        }
    }
}

impl ParamOps for MlpParams {
    fn add(&self, other: &Self) -> Self {
        self.zip_map(other, |a, b| a + b)
    }

    fn scale(&self, scalar: f64) -> Self {
        self.map(|v| v * scalar)
    }

    fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            w1: self.w1.mapv(&f),
            b1: self.b1.mapv(&f),
            w2: self.w2.mapv(&f),
            b2: self.b2.mapv(&f),
            w3: self.w3.mapv(&f),
            b3: self.b3.mapv(&f),
        }
    }

    fn zip_map<F: Fn(f64, f64) -> f64>(&self, other: &Self, f: F) -> Self {
        Self {
            w1: Zip::from(&self.w1).and(&other.w1).map_collect(|&a, &b| f(a, b)),
            b1: Zip::from(&self.b1).and(&other.b1).map_collect(|&a, &b| f(a, b)),
            w2: Zip::from(&self.w2).and(&other.w2).map_collect(|&a, &b| f(a, b)),
            b2: Zip::from(&self.b2).and(&other.b2).map_collect(|&a, &b| f(a, b)),
            w3: Zip::from(&self.w3).and(&other.w3).map_collect(|&a, &b| f(a, b)),
            b3: Zip::from(&self.b3).and(&other.b3).map_collect(|&a, &b| f(a, b)),
        }
    }

    fn all_finite(&self) -> bool {
        self.w1
            .iter()
            .chain(&self.b1)
            .chain(&self.w2)
            .chain(&self.b2)
            .chain(&self.w3)
            .chain(&self.b3)
            .all(|v| v.is_finite())
    }
}

/// The transfer network with state encoded at the type level.
///
/// - When `S = Unfitted`: implements [`TrainableModel`].
/// - When `S = Fitted`: implements [`InferenceModel`].
#[derive(Clone, Debug)]
pub struct MlpModel<S> {
    params: MlpParams,
    _state: PhantomData<S>,
}

/// Alias for an **unfitted** transfer network, the input of `Trainer::fit`.
pub type MlpRegressor = MlpModel<Unfitted>;

impl MlpModel<Unfitted> {
    /// Creates a freshly initialized network; the same seed always yields
    /// the same parameters.
    pub fn new(init_seed: u64) -> Self {
        Self::from_params(MlpParams::init(init_seed))
    }

    pub fn from_params(params: MlpParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

impl MlpModel<Fitted> {
    /// Creates a fitted network from trained parameters.
    pub fn new(params: MlpParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }

    /// Read-only view of the trained parameters, e.g. for an external store.
    pub fn params(&self) -> &MlpParams {
        &self.params
    }
}

impl TrainableModel for MlpModel<Unfitted> {
    type Input = Array2<f64>;
    type Prediction = Array2<f64>;
    type Params = MlpParams;
    type Gradients = MlpParams;
    type Output = MlpModel<Fitted>;

    fn forward(&self, x: &Self::Input) -> Self::Prediction {
        self.params.forward(x)
    }

    fn backward(&self, x: &Self::Input, grad_output: &Self::Prediction) -> Self::Gradients {
        self.params.backward(x, grad_output)
    }

    fn params(&self) -> &Self::Params {
        &self.params
    }

    fn update_params(&mut self, params: &Self::Params) {
        self.params = params.clone();
    }

    fn into_fitted(self) -> MlpModel<Fitted> {
        MlpModel::<Fitted>::new(self.params)
    }
}

/// Inference on scaled values.
///
/// - Single sample: one scaled baseline → six scaled targets.
/// - Batch: `(n, 1)` → `(n, 6)`.
impl InferenceModel for MlpModel<Fitted> {
    type InputSingle = f64;
    type OutputSingle = [f64; TARGET_COUNT];
    type InputBatch = Array2<f64>;
    type OutputBatch = Array2<f64>;

    fn predict(&self, input: &f64) -> [f64; TARGET_COUNT] {
        let out = self.params.forward(&Array2::from_elem((1, 1), *input));
        let mut targets = [0.0; TARGET_COUNT];
        for (slot, v) in targets.iter_mut().zip(out.iter()) {
            *slot = *v;
        }
        targets
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Array2<f64> {
        self.params.forward(input)
    }
}
