use ndarray::{ArrayBase, DataMut, Dimension};
use serde::{Deserialize, Serialize};

use crate::params::Gradients;

/// Gradient clipping methods
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GradientClipper {
    /// Rescale each gradient tensor on its own so that its L2 norm does not
    /// exceed `max_norm`
    ClipByNorm { max_norm: f32 },

    /// No clipping
    None,
}

impl GradientClipper {
    /// Clip one gradient tensor in place
    pub fn clip<S, D>(&self, gradients: &mut ArrayBase<S, D>)
    where
        S: DataMut<Elem = f32>,
        D: Dimension,
    {
        match self {
            GradientClipper::ClipByNorm { max_norm } => {
                let norm = gradients.iter().map(|&g| g * g).sum::<f32>().sqrt();
                if norm > *max_norm {
                    let scale = max_norm / norm;
                    gradients.mapv_inplace(|g| g * scale);
                }
            }

            GradientClipper::None => {}
        }
    }

    /// Clip weight and bias gradients independently
    pub fn clip_gradients(&self, gradients: &mut Gradients) {
        self.clip(&mut gradients.weights);
        self.clip(&mut gradients.biases);
    }

    /// Compute global norm of all gradients
    pub fn compute_global_norm(gradients: &Gradients) -> f32 {
        let weight_norm_sq: f32 = gradients.weights.iter().map(|&x| x * x).sum();
        let bias_norm_sq: f32 = gradients.biases.iter().map(|&x| x * x).sum();
        (weight_norm_sq + bias_norm_sq).sqrt()
    }
}

impl Default for GradientClipper {
    fn default() -> Self {
        GradientClipper::None
    }
}
