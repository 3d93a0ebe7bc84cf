use std::fmt;

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};

/// A single observation, `(height, width, channels)` of raw pixels
pub type Observation = Array3<u8>;

/// A batch of observations, `(batch, height, width, channels)`
pub type ObservationBatch = Array4<u8>;

/// Index of a discrete action
pub type Action = usize;

/// Fixed `(height, width, channels)` shape of every observation in a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObservationShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ObservationShape {
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        ObservationShape {
            height,
            width,
            channels,
        }
    }

    /// Shape after stacking `history` frames of this shape along the
    /// channel axis.
    pub fn stacked(&self, history: usize) -> Self {
        ObservationShape {
            channels: self.channels * history,
            ..*self
        }
    }

    /// Length of the flattened feature vector
    pub fn num_features(&self) -> usize {
        self.height * self.width * self.channels
    }

    pub fn as_tuple(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_features() == 0 {
            return Err(DqnError::invalid_parameter(
                "observation_shape".to_string(),
                format!("every dimension must be positive, got {}", self),
            ));
        }
        Ok(())
    }

    /// Check that a batch holds observations of exactly this shape.
    pub fn check_batch(&self, batch: &ObservationBatch) -> Result<()> {
        let dim = batch.dim();
        if (dim.1, dim.2, dim.3) != self.as_tuple() {
            return Err(DqnError::dimension_mismatch(
                format!("observations of shape {}", self),
                format!("observations of shape {}x{}x{}", dim.1, dim.2, dim.3),
            ));
        }
        Ok(())
    }

    /// Check that a single observation has exactly this shape.
    pub fn check_observation(&self, observation: &Observation) -> Result<()> {
        if observation.dim() != self.as_tuple() {
            let (h, w, c) = observation.dim();
            return Err(DqnError::dimension_mismatch(
                format!("observation of shape {}", self),
                format!("observation of shape {}x{}x{}", h, w, c),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for ObservationShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.height, self.width, self.channels)
    }
}

impl From<(usize, usize, usize)> for ObservationShape {
    fn from((height, width, channels): (usize, usize, usize)) -> Self {
        ObservationShape::new(height, width, channels)
    }
}
