pub mod gradient_clipper;

use ndarray::{Array1, Array2};

use crate::error::{DqnError, Result};
use crate::network::QNetwork;
use crate::params::Gradients;

pub use gradient_clipper::GradientClipper;

/// Applies gradients to the parameters of a network.
pub trait Optimizer {
    /// Take one step. Every call is a distinct step, even with identical
    /// gradients.
    fn step(&mut self, network: &mut QNetwork, gradients: &Gradients, learning_rate: f32) -> Result<()>;
}

/// Adam: per-parameter running first and second moments with bias
/// correction.
#[derive(Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Option<Array2<f32>>,
    v_weights: Option<Array2<f32>>,
    m_biases: Option<Array1<f32>>,
    v_biases: Option<Array1<f32>>,
    /// Number of steps taken so far
    pub t: u32,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Result<Self> {
        for (name, beta) in [("beta1", beta1), ("beta2", beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(DqnError::invalid_parameter(
                    name.to_string(),
                    format!("must lie in [0, 1), got {}", beta),
                ));
            }
        }
        if !(epsilon > 0.0) {
            return Err(DqnError::invalid_parameter(
                "epsilon".to_string(),
                format!("must be positive, got {}", epsilon),
            ));
        }
        Ok(Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: None,
            v_weights: None,
            m_biases: None,
            v_biases: None,
            t: 0,
        })
    }

    fn update_weights(&mut self, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let m = self.m_weights.get_or_insert_with(|| Array2::zeros(gradients.dim()));
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        let v = self.v_weights.get_or_insert_with(|| Array2::zeros(gradients.dim()));
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let (c1, c2) = bias_corrections(beta1, beta2, self.t);
        ndarray::Zip::from(weights)
            .and(&*m)
            .and(&*v)
            .for_each(|w, &m, &v| *w -= learning_rate * (m / c1) / ((v / c2).sqrt() + epsilon));
    }

    fn update_biases(&mut self, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let m = self.m_biases.get_or_insert_with(|| Array1::zeros(gradients.dim()));
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        let v = self.v_biases.get_or_insert_with(|| Array1::zeros(gradients.dim()));
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let (c1, c2) = bias_corrections(beta1, beta2, self.t);
        ndarray::Zip::from(biases)
            .and(&*m)
            .and(&*v)
            .for_each(|b, &m, &v| *b -= learning_rate * (m / c1) / ((v / c2).sqrt() + epsilon));
    }

    fn check_state(&self, network: &QNetwork, gradients: &Gradients) -> Result<()> {
        if gradients.weights.dim() != network.weights().dim() || gradients.biases.dim() != network.biases().dim() {
            return Err(DqnError::dimension_mismatch(
                format!("gradients shaped like {:?} and {:?}", network.weights().shape(), network.biases().shape()),
                format!("{:?} and {:?}", gradients.weights.shape(), gradients.biases.shape()),
            ));
        }
        let moments_fit = self.m_weights.as_ref().map_or(true, |m| m.dim() == gradients.weights.dim())
            && self.m_biases.as_ref().map_or(true, |m| m.dim() == gradients.biases.dim());
        if !moments_fit {
            return Err(DqnError::dimension_mismatch(
                "gradients shaped like the stored moments".to_string(),
                format!("{:?} and {:?}", gradients.weights.shape(), gradients.biases.shape()),
            ));
        }
        Ok(())
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            m_weights: None,
            v_weights: None,
            m_biases: None,
            v_biases: None,
            t: 0,
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, network: &mut QNetwork, gradients: &Gradients, learning_rate: f32) -> Result<()> {
        self.check_state(network, gradients)?;
        self.t += 1;
        self.update_weights(network.weights_mut(), &gradients.weights, learning_rate);
        self.update_biases(network.biases_mut(), &gradients.biases, learning_rate);
        Ok(())
    }
}

fn bias_corrections(beta1: f32, beta2: f32, t: u32) -> (f32, f32) {
    let t = t as i32;
    (1.0 - beta1.powi(t), 1.0 - beta2.powi(t))
}
