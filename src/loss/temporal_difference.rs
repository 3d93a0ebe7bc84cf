use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::batch::continuation_mask;
use crate::error::{DqnError, Result};
use crate::types::Action;

/// Action values that take part in a loss as constants.
///
/// The only way to build one is from plain data, so there is no path from
/// a `Detached` value back to the parameters that produced it. Target
/// network outputs enter the TD loss through this type.
#[derive(Clone, Debug, PartialEq)]
pub struct Detached(Array2<f32>);

impl Detached {
    pub fn new(values: Array2<f32>) -> Self {
        Detached(values)
    }

    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.0.view()
    }

    /// Row-wise maximum, `max_a' Q(s', a')`. A NaN anywhere in a row makes
    /// that row's maximum NaN.
    pub fn row_max(&self) -> Array1<f32> {
        self.0.map_axis(Axis(1), |row| {
            row.fold(f32::NEG_INFINITY, |m, &v| if v.is_nan() || v > m { v } else { m })
        })
    }
}

/// Everything the TD loss computes for one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct TdLossOutput {
    /// Mean of squared TD errors
    pub loss: f32,
    /// `target_value - predicted_value` per example
    pub td_errors: Array1<f32>,
    /// Bootstrapped targets `r + gamma * max Q_target * (1 - done)`
    pub targets: Array1<f32>,
    /// Online values of the taken actions
    pub predicted: Array1<f32>,
    /// Gradient of the loss with respect to the online action values,
    /// shape `(N, num_actions)`; non-zero only at the taken actions
    pub q_grads: Array2<f32>,
}

/// Squared temporal-difference loss against a bootstrapped target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TdLoss {
    pub gamma: f32,
}

impl TdLoss {
    pub fn new(gamma: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&gamma) {
            return Err(DqnError::invalid_parameter(
                "gamma".to_string(),
                format!("discount must lie in [0, 1), got {}", gamma),
            ));
        }
        Ok(TdLoss { gamma })
    }

    /// Bootstrapped target value of every example.
    pub fn targets(
        &self,
        target_q: &Detached,
        rewards: ArrayView1<f32>,
        done: &[bool],
    ) -> Result<Array1<f32>> {
        let n = target_q.view().nrows();
        if rewards.len() != n || done.len() != n {
            return Err(DqnError::dimension_mismatch(
                format!("{} rewards and done flags", n),
                format!("{} and {}", rewards.len(), done.len()),
            ));
        }
        Ok(&rewards + &(target_q.row_max() * self.gamma * &continuation_mask(done)))
    }

    /// Compute the loss of online values `q` for the taken `actions` against
    /// targets bootstrapped from `target_q`.
    pub fn compute(
        &self,
        q: ArrayView2<f32>,
        target_q: &Detached,
        actions: &[Action],
        rewards: ArrayView1<f32>,
        done: &[bool],
    ) -> Result<TdLossOutput> {
        let (n, num_actions) = q.dim();
        if n == 0 {
            return Err(DqnError::EmptyBuffer("cannot compute a loss over an empty batch".to_string()));
        }
        if target_q.view().dim() != (n, num_actions) {
            return Err(DqnError::dimension_mismatch(
                format!("target values of shape ({}, {})", n, num_actions),
                format!("{:?}", target_q.view().shape()),
            ));
        }
        if actions.len() != n || rewards.len() != n || done.len() != n {
            return Err(DqnError::dimension_mismatch(
                format!("{} actions, rewards and done flags", n),
                format!("{}, {} and {}", actions.len(), rewards.len(), done.len()),
            ));
        }

        let mut action_mask = Array2::<f32>::zeros((n, num_actions));
        for (i, &a) in actions.iter().enumerate() {
            if a >= num_actions {
                return Err(DqnError::InvalidAction {
                    action: a,
                    max_actions: num_actions,
                });
            }
            action_mask[[i, a]] = 1.0;
        }

        let targets = self.targets(target_q, rewards, done)?;
        let predicted = (&action_mask * &q).sum_axis(Axis(1));
        let td_errors = &targets - &predicted;
        let loss = td_errors.mapv(|e| e * e).sum() / n as f32;

        // d/dQ(s,a) of mean((t - Q(s,a))^2) is -2 (t - Q(s,a)) / N at the
        // taken action; targets are constants here
        let scaled = td_errors.mapv(|e| -2.0 * e / n as f32).insert_axis(Axis(1));
        let q_grads = action_mask * &scaled;

        Ok(TdLossOutput {
            loss,
            td_errors,
            targets,
            predicted,
            q_grads,
        })
    }
}
