use ndarray::{Array1, Array2, ArrayView2, ArrayViewD, ArrayViewMutD, Axis};
use rand::Rng;

use super::initialization::WeightInit;
use crate::error::{DqnError, Result};
use crate::params::{Gradients, ParamRole, ParamSpec, Parameterized};

/// A fully connected layer without activation: `inputs · weights + biases`.
///
/// Unlike a cached-activation layer, `forward_batch` does not remember its
/// inputs. Callers that need gradients hand the same inputs back to
/// [`LinearLayer::backward_batch`].
#[derive(Clone, Debug, PartialEq)]
pub struct LinearLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl LinearLayer {
    /// Create a new layer with weights and biases drawn from `init`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(DqnError::invalid_parameter(
                "layer_size".to_string(),
                format!("layer must be at least 1x1, got {}x{}", input_size, output_size),
            ));
        }
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(output_size, rng)?;
        Ok(LinearLayer { weights, biases })
    }

    /// Build a layer from explicit parameters.
    pub fn from_parameters(weights: Array2<f32>, biases: Array1<f32>) -> Result<Self> {
        if weights.ncols() != biases.len() {
            return Err(DqnError::dimension_mismatch(
                format!("bias of length {}", weights.ncols()),
                format!("bias of length {}", biases.len()),
            ));
        }
        Ok(LinearLayer { weights, biases })
    }

    pub fn input_size(&self) -> usize {
        self.weights.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(DqnError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{} input features", inputs.ncols()),
            ));
        }
        Ok(inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0)))
    }

    /// Gradients of the loss with respect to weights and biases, given the
    /// inputs of the forward pass and `dL/doutput`.
    pub fn backward_batch(
        &self,
        inputs: ArrayView2<f32>,
        output_grads: ArrayView2<f32>,
    ) -> Result<Gradients> {
        if inputs.nrows() != output_grads.nrows() || output_grads.ncols() != self.output_size() {
            return Err(DqnError::dimension_mismatch(
                format!("output gradients of shape ({}, {})", inputs.nrows(), self.output_size()),
                format!("{:?}", output_grads.shape()),
            ));
        }
        let weight_gradients = inputs.t().dot(&output_grads);
        let bias_gradients = output_grads.sum_axis(Axis(0));
        Ok(Gradients::new(weight_gradients, bias_gradients))
    }
}

impl Parameterized for LinearLayer {
    fn parameter_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::new(ParamRole::Weight, self.weights.shape()),
            ParamSpec::new(ParamRole::Bias, self.biases.shape()),
        ]
    }

    fn parameter(&self, role: ParamRole) -> Option<ArrayViewD<'_, f32>> {
        match role {
            ParamRole::Weight => Some(self.weights.view().into_dyn()),
            ParamRole::Bias => Some(self.biases.view().into_dyn()),
        }
    }

    fn parameter_mut(&mut self, role: ParamRole) -> Option<ArrayViewMutD<'_, f32>> {
        match role {
            ParamRole::Weight => Some(self.weights.view_mut().into_dyn()),
            ParamRole::Bias => Some(self.biases.view_mut().into_dyn()),
        }
    }
}
