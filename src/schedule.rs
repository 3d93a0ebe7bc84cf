use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::Action;

/// Linear decay from `begin` to `end` over `nsteps`, then constant.
///
/// Used for both the exploration rate and the learning rate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearSchedule {
    pub begin: f32,
    pub end: f32,
    pub nsteps: usize,
    value: f32,
}

impl LinearSchedule {
    pub fn new(begin: f32, end: f32, nsteps: usize) -> Self {
        LinearSchedule {
            begin,
            end,
            nsteps,
            value: begin,
        }
    }

    /// Value at step `t`, without changing the schedule
    pub fn value_at(&self, t: usize) -> f32 {
        if t >= self.nsteps {
            self.end
        } else {
            let progress = t as f32 / self.nsteps as f32;
            self.begin + (self.end - self.begin) * progress
        }
    }

    /// Move the schedule to step `t`
    pub fn update(&mut self, t: usize) {
        self.value = self.value_at(t);
    }

    /// Current value
    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Epsilon-greedy exploration with a linearly decaying epsilon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearExploration {
    schedule: LinearSchedule,
    num_actions: usize,
}

impl LinearExploration {
    pub fn new(num_actions: usize, eps_begin: f32, eps_end: f32, nsteps: usize) -> Self {
        LinearExploration {
            schedule: LinearSchedule::new(eps_begin, eps_end, nsteps),
            num_actions,
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.schedule.value()
    }

    pub fn update(&mut self, t: usize) {
        self.schedule.update(t);
    }

    /// A uniformly random action with probability epsilon, `best_action`
    /// otherwise.
    pub fn get_action<R: Rng + ?Sized>(&self, best_action: Action, rng: &mut R) -> Action {
        epsilon_greedy(best_action, self.num_actions, self.epsilon(), rng)
    }
}

pub fn epsilon_greedy<R: Rng + ?Sized>(
    best_action: Action,
    num_actions: usize,
    epsilon: f32,
    rng: &mut R,
) -> Action {
    if num_actions > 0 && rng.gen::<f32>() < epsilon {
        rng.gen_range(0..num_actions)
    } else {
        best_action
    }
}
