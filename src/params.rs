//! Parameter roles and the gradient container shared by the approximator,
//! the optimizer and target synchronization.

use std::fmt;

use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use serde::{Deserialize, Serialize};

/// The role a parameter plays inside an approximator.
///
/// Online and target networks declare the same roles, which is what
/// [`ParamPairs`](crate::sync::ParamPairs) matches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamRole {
    /// The `(features, actions)` matrix of the affine transform
    Weight,
    /// The `(actions,)` offset vector of the affine transform
    Bias,
}

impl fmt::Display for ParamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRole::Weight => write!(f, "weight"),
            ParamRole::Bias => write!(f, "bias"),
        }
    }
}

/// Declared role and shape of one parameter tensor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub role: ParamRole,
    pub shape: Vec<usize>,
}

impl ParamSpec {
    pub fn new(role: ParamRole, shape: &[usize]) -> Self {
        ParamSpec {
            role,
            shape: shape.to_vec(),
        }
    }
}

/// Anything that owns named parameter tensors.
pub trait Parameterized {
    /// Parameters in declaration order
    fn parameter_specs(&self) -> Vec<ParamSpec>;

    /// Read access to the tensor playing `role`
    fn parameter(&self, role: ParamRole) -> Option<ArrayViewD<'_, f32>>;

    /// Write access to the tensor playing `role`
    fn parameter_mut(&mut self, role: ParamRole) -> Option<ArrayViewMutD<'_, f32>>;
}

/// Gradients of a scalar loss with respect to the parameters of one linear
/// approximator.
#[derive(Clone, Debug, PartialEq)]
pub struct Gradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

impl Gradients {
    pub fn new(weights: Array2<f32>, biases: Array1<f32>) -> Self {
        Gradients { weights, biases }
    }
}
