use ndarray::{Array1, Axis};

use crate::error::{DqnError, Result};
use crate::types::{Action, ObservationBatch, ObservationShape};

/// A batch of `(state, action, reward, next_state, done)` transitions,
/// stored as parallel sequences of equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch {
    pub states: ObservationBatch,
    pub actions: Vec<Action>,
    pub rewards: Array1<f32>,
    pub next_states: ObservationBatch,
    pub done: Vec<bool>,
}

impl TransitionBatch {
    pub fn new(
        states: ObservationBatch,
        actions: Vec<Action>,
        rewards: Array1<f32>,
        next_states: ObservationBatch,
        done: Vec<bool>,
    ) -> Self {
        TransitionBatch {
            states,
            actions,
            rewards,
            next_states,
            done,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Check the batch against the observation shape and action count of a
    /// model. Lengths must agree, observations must match `shape` exactly
    /// and every action must be in `[0, num_actions)`.
    pub fn validate(&self, shape: &ObservationShape, num_actions: usize) -> Result<()> {
        let n = self.len();
        if n == 0 {
            return Err(DqnError::EmptyBuffer("transition batch is empty".to_string()));
        }

        let lengths = [
            ("states", self.states.len_of(Axis(0))),
            ("rewards", self.rewards.len()),
            ("next_states", self.next_states.len_of(Axis(0))),
            ("done", self.done.len()),
        ];
        for (name, len) in lengths {
            if len != n {
                return Err(DqnError::dimension_mismatch(
                    format!("{} {} for {} actions", n, name, n),
                    format!("{} {}", len, name),
                ));
            }
        }

        shape.check_batch(&self.states)?;
        shape.check_batch(&self.next_states)?;

        if let Some(&action) = self.actions.iter().find(|&&a| a >= num_actions) {
            return Err(DqnError::InvalidAction {
                action,
                max_actions: num_actions,
            });
        }

        Ok(())
    }
}

/// `1.0` for every non-terminal transition, `0.0` for terminal ones
pub(crate) fn continuation_mask(done: &[bool]) -> Array1<f32> {
    done.iter().map(|&d| if d { 0.0 } else { 1.0 }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array4};

    fn batch(n: usize) -> TransitionBatch {
        TransitionBatch::new(
            Array4::zeros((n, 2, 2, 1)),
            vec![0; n],
            Array1::zeros(n),
            Array4::zeros((n, 2, 2, 1)),
            vec![false; n],
        )
    }

    #[test]
    fn test_validate_accepts_consistent_batch() {
        let shape = ObservationShape::new(2, 2, 1);
        assert!(batch(3).validate(&shape, 2).is_ok());
        assert!(batch(1).validate(&shape, 2).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_batches() {
        let shape = ObservationShape::new(2, 2, 1);

        assert!(matches!(
            batch(0).validate(&shape, 2),
            Err(DqnError::EmptyBuffer(_))
        ));

        let mut b = batch(2);
        b.done.pop();
        assert!(matches!(
            b.validate(&shape, 2),
            Err(DqnError::DimensionMismatch { .. })
        ));

        let mut b = batch(2);
        b.actions[1] = 2;
        assert!(matches!(
            b.validate(&shape, 2),
            Err(DqnError::InvalidAction { action: 2, max_actions: 2 })
        ));

        let b = batch(2);
        assert!(b.validate(&ObservationShape::new(2, 2, 4), 2).is_err());
    }

    #[test]
    fn test_continuation_mask() {
        assert_eq!(continuation_mask(&[false, true, false]), array![1.0, 0.0, 1.0]);
        assert_eq!(continuation_mask(&[]).len(), 0);
    }
}
