//! Experience replay over single frames.
//!
//! Each environment frame is stored once, together with the action taken
//! from it, the reward received and whether the episode ended. Stacked
//! observations are assembled on demand from the most recent `history`
//! frames; frames from a previous episode or before the start of the
//! buffer are replaced by zeros.

use std::collections::VecDeque;

use ndarray::{s, Array1, Array4, Axis};
use rand::Rng;

use crate::batch::TransitionBatch;
use crate::error::{DqnError, Result};
use crate::types::{Action, Observation, ObservationShape};

#[derive(Clone, Debug, PartialEq)]
struct FrameRecord {
    frame: Observation,
    action: Action,
    reward: f32,
    done: bool,
}

#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    buffer: VecDeque<FrameRecord>,
    capacity: usize,
    history: usize,
    frame_shape: ObservationShape,
}

impl ReplayBuffer {
    /// A buffer holding up to `capacity` frames of `frame_shape`, stacking
    /// `history` of them per observation.
    pub fn new(capacity: usize, history: usize, frame_shape: ObservationShape) -> Result<Self> {
        if capacity < 2 {
            return Err(DqnError::invalid_parameter(
                "capacity".to_string(),
                format!("must hold at least 2 frames, got {}", capacity),
            ));
        }
        if history == 0 {
            return Err(DqnError::invalid_parameter(
                "history".to_string(),
                "must be positive".to_string(),
            ));
        }
        frame_shape.validate()?;
        Ok(ReplayBuffer {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            history,
            frame_shape,
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shape of a stacked observation
    pub fn observation_shape(&self) -> ObservationShape {
        self.frame_shape.stacked(self.history)
    }

    /// Store a new frame, evicting the oldest one when full. Returns the
    /// index to pass to [`ReplayBuffer::store_effect`].
    pub fn store_frame(&mut self, frame: Observation) -> Result<usize> {
        self.frame_shape.check_observation(&frame)?;
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(FrameRecord {
            frame,
            action: 0,
            reward: 0.0,
            done: false,
        });
        Ok(self.buffer.len() - 1)
    }

    /// Record what happened after the frame at `idx`.
    pub fn store_effect(&mut self, idx: usize, action: Action, reward: f32, done: bool) -> Result<()> {
        let len = self.buffer.len();
        let record = self
            .buffer
            .get_mut(idx)
            .ok_or_else(|| DqnError::EmptyBuffer(format!("no frame at index {} (buffer holds {})", idx, len)))?;
        record.action = action;
        record.reward = reward;
        record.done = done;
        Ok(())
    }

    /// Stacked observation ending at the most recent frame.
    pub fn encode_recent_observation(&self) -> Result<Observation> {
        if self.buffer.is_empty() {
            return Err(DqnError::EmptyBuffer("no frames stored yet".to_string()));
        }
        Ok(self.encode_observation(self.buffer.len() - 1))
    }

    /// A transition needs a successor frame, so `batch_size + 1` frames are
    /// required.
    pub fn can_sample(&self, batch_size: usize) -> bool {
        batch_size > 0 && batch_size + 1 <= self.buffer.len()
    }

    /// Sample `batch_size` distinct transitions uniformly.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<TransitionBatch> {
        if !self.can_sample(batch_size) {
            return Err(DqnError::EmptyBuffer(format!(
                "cannot sample {} transitions from {} frames",
                batch_size,
                self.buffer.len()
            )));
        }

        let shape = self.observation_shape();
        let dims = (batch_size, shape.height, shape.width, shape.channels);
        let mut states = Array4::zeros(dims);
        let mut next_states = Array4::zeros(dims);
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut done = Vec::with_capacity(batch_size);

        let indices = rand::seq::index::sample(rng, self.buffer.len() - 1, batch_size);
        for (i, idx) in indices.into_iter().enumerate() {
            let record = &self.buffer[idx];
            states.index_axis_mut(Axis(0), i).assign(&self.encode_observation(idx));
            next_states.index_axis_mut(Axis(0), i).assign(&self.encode_observation(idx + 1));
            actions.push(record.action);
            rewards[i] = record.reward;
            done.push(record.done);
        }

        Ok(TransitionBatch::new(states, actions, rewards, next_states, done))
    }

    fn encode_observation(&self, idx: usize) -> Observation {
        let shape = self.observation_shape();
        let channels = self.frame_shape.channels;
        let mut start = (idx + 1).saturating_sub(self.history);
        for i in start..idx {
            if self.buffer[i].done {
                start = i + 1;
            }
        }

        let mut observation = Observation::zeros(shape.as_tuple());
        for i in start..=idx {
            let slot = self.history - 1 - (idx - i);
            observation
                .slice_mut(s![.., .., slot * channels..(slot + 1) * channels])
                .assign(&self.buffer[i].frame);
        }
        observation
    }
}
