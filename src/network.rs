use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, ArrayViewMutD, Axis, Zip};
use rand::Rng;

use crate::error::{DqnError, Result};
use crate::layers::{LinearLayer, WeightInit};
use crate::params::{Gradients, ParamRole, ParamSpec, Parameterized};
use crate::types::{Action, Observation, ObservationBatch, ObservationShape};

/// Linear action-value approximator.
///
/// A batch of `(N, H, W, C)` pixel observations is flattened row-major to
/// `(N, H·W·C)` features, upcast to `f32` and scaled by `1 / high`, then
/// mapped through a single affine transform to `(N, num_actions)` scores.
/// There is no hidden layer and no activation.
#[derive(Clone, Debug, PartialEq)]
pub struct QNetwork {
    layer: LinearLayer,
    shape: ObservationShape,
    scale: f32,
}

impl QNetwork {
    /// Create a network with freshly initialized parameters.
    ///
    /// `high` is the largest pixel value; features are divided by it before
    /// the affine transform. Pass `1.0` to use raw pixel values.
    pub fn new<R: Rng + ?Sized>(
        shape: ObservationShape,
        num_actions: usize,
        high: f32,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        shape.validate()?;
        let scale = scale_for(high)?;
        let layer = LinearLayer::new(shape.num_features(), num_actions, init, rng)?;
        Ok(QNetwork { layer, shape, scale })
    }

    /// Create a network with the given weights `(H·W·C, A)` and biases `(A,)`.
    pub fn with_parameters(
        shape: ObservationShape,
        high: f32,
        weights: Array2<f32>,
        biases: Array1<f32>,
    ) -> Result<Self> {
        shape.validate()?;
        if weights.nrows() != shape.num_features() {
            return Err(DqnError::dimension_mismatch(
                format!("{} weight rows for observations of shape {}", shape.num_features(), shape),
                format!("{} weight rows", weights.nrows()),
            ));
        }
        let layer = LinearLayer::from_parameters(weights, biases)?;
        Ok(QNetwork {
            layer,
            shape,
            scale: scale_for(high)?,
        })
    }

    pub fn observation_shape(&self) -> ObservationShape {
        self.shape
    }

    pub fn num_actions(&self) -> usize {
        self.layer.output_size()
    }

    /// Factor applied to raw pixel values, `1 / high`
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.layer.weights
    }

    pub fn biases(&self) -> &Array1<f32> {
        &self.layer.biases
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Array2<f32> {
        &mut self.layer.weights
    }

    pub(crate) fn biases_mut(&mut self) -> &mut Array1<f32> {
        &mut self.layer.biases
    }

    /// Flatten and upcast a batch of observations into feature rows.
    pub fn features(&self, states: &ObservationBatch) -> Result<Array2<f32>> {
        self.shape.check_batch(states)?;
        let n = states.len_of(Axis(0));
        let num_features = self.shape.num_features();
        let scale = self.scale;
        // borrows when the batch is already row-major
        let pixels = states.as_standard_layout();
        let flat = pixels
            .view()
            .into_shape((n, num_features))
            .map_err(|e| DqnError::dimension_mismatch(format!("({}, {})", n, num_features), e.to_string()))?;
        Ok(Zip::from(flat).par_map_collect(|&p| p as f32 * scale))
    }

    /// Action values for pre-computed feature rows.
    pub fn forward_features(&self, features: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.layer.forward_batch(features)
    }

    /// Action values of shape `(N, num_actions)` for a batch of observations.
    pub fn q_values(&self, states: &ObservationBatch) -> Result<Array2<f32>> {
        let features = self.features(states)?;
        self.forward_features(features.view())
    }

    /// Greedy action and the full row of action values for one observation.
    pub fn best_action(&self, observation: &Observation) -> Result<(Action, Array1<f32>)> {
        self.shape.check_observation(observation)?;
        let batch = observation.view().insert_axis(Axis(0)).to_owned();
        let q = self.q_values(&batch)?;
        let row = q.index_axis_move(Axis(0), 0);
        let action = argmax(row.view())
            .ok_or_else(|| DqnError::EmptyBuffer("network produced no action values".to_string()))?;
        Ok((action, row))
    }

    /// Gradients of the loss given the features of the forward pass and
    /// `dL/dQ` of shape `(N, num_actions)`.
    pub fn backward(&self, features: ArrayView2<f32>, q_grads: ArrayView2<f32>) -> Result<Gradients> {
        self.layer.backward_batch(features, q_grads)
    }
}

impl Parameterized for QNetwork {
    fn parameter_specs(&self) -> Vec<ParamSpec> {
        self.layer.parameter_specs()
    }

    fn parameter(&self, role: ParamRole) -> Option<ArrayViewD<'_, f32>> {
        self.layer.parameter(role)
    }

    fn parameter_mut(&mut self, role: ParamRole) -> Option<ArrayViewMutD<'_, f32>> {
        self.layer.parameter_mut(role)
    }
}

/// Index of the largest value; ties resolve to the lowest index and NaN
/// compares as equal.
pub fn argmax(values: ndarray::ArrayView1<f32>) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if !(v > b) => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

pub(crate) fn scale_for(high: f32) -> Result<f32> {
    if !(high > 0.0) || !high.is_finite() {
        return Err(DqnError::invalid_parameter(
            "high".to_string(),
            format!("must be a positive finite pixel range, got {}", high),
        ));
    }
    Ok(1.0 / high)
}
