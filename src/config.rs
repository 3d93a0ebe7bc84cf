//! Hyper-parameters of a training run.
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

use crate::error::{DqnError, Result};
use crate::layers::WeightInit;
use crate::optimizer::GradientClipper;

/// Configuration of the model, the replay buffer and the training loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Discount factor, in `[0, 1)`
    pub gamma: f32,

    /// Whether gradients are clipped before the optimizer step
    pub grad_clip: bool,

    /// Per-parameter gradient norm threshold used when `grad_clip` is set
    pub clip_val: f32,

    /// Number of consecutive frames stacked into one observation
    pub state_history: usize,

    /// Largest pixel value; features are divided by it
    pub high: f32,

    /// Parameter initialization of both networks
    pub weight_init: WeightInit,

    /// Adam first moment decay
    pub adam_beta1: f32,

    /// Adam second moment decay
    pub adam_beta2: f32,

    /// Adam numerical-stability constant
    pub adam_epsilon: f32,

    /// Number of environment steps to train for
    pub nsteps_train: usize,

    /// Transitions per optimizer step
    pub batch_size: usize,

    /// Frames held by the replay buffer
    pub buffer_size: usize,

    /// Interval of target synchronization in environment steps
    pub target_update_freq: usize,

    /// Interval of optimizer steps in environment steps
    pub learning_freq: usize,

    /// Environment steps before the first optimizer step
    pub learning_start: usize,

    pub lr_begin: f32,
    pub lr_end: f32,
    pub lr_nsteps: usize,

    pub eps_begin: f32,
    pub eps_end: f32,
    pub eps_nsteps: usize,

    /// Interval of statistics logging in environment steps
    pub log_freq: usize,

    /// Interval of evaluation in environment steps
    pub eval_freq: usize,

    /// Episodes per evaluation
    pub num_episodes_test: usize,

    /// Exploration rate used during evaluation
    pub soft_epsilon: f32,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            grad_clip: true,
            clip_val: 10.0,
            state_history: 4,
            high: 255.0,
            weight_init: WeightInit::XavierUniform,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            adam_epsilon: 1e-8,
            nsteps_train: 1000,
            batch_size: 32,
            buffer_size: 500,
            target_update_freq: 500,
            learning_freq: 4,
            learning_start: 200,
            lr_begin: 0.005,
            lr_end: 0.001,
            lr_nsteps: 500,
            eps_begin: 1.0,
            eps_end: 0.01,
            eps_nsteps: 500,
            log_freq: 50,
            eval_freq: 100,
            num_episodes_test: 10,
            soft_epsilon: 0.0,
        }
    }
}

impl DqnConfig {
    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Enables per-parameter gradient clipping at `clip_val`, or disables
    /// clipping with `None`.
    pub fn grad_clip(mut self, clip_val: Option<f32>) -> Self {
        match clip_val {
            Some(v) => {
                self.grad_clip = true;
                self.clip_val = v;
            }
            None => self.grad_clip = false,
        }
        self
    }

    /// Sets the number of stacked frames.
    pub fn state_history(mut self, v: usize) -> Self {
        self.state_history = v;
        self
    }

    /// Sets the pixel range used to scale features.
    pub fn high(mut self, v: f32) -> Self {
        self.high = v;
        self
    }

    pub fn weight_init(mut self, v: WeightInit) -> Self {
        self.weight_init = v;
        self
    }

    /// Sets the number of training steps.
    pub fn nsteps_train(mut self, v: usize) -> Self {
        self.nsteps_train = v;
        self
    }

    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    pub fn buffer_size(mut self, v: usize) -> Self {
        self.buffer_size = v;
        self
    }

    pub fn target_update_freq(mut self, v: usize) -> Self {
        self.target_update_freq = v;
        self
    }

    pub fn learning_freq(mut self, v: usize) -> Self {
        self.learning_freq = v;
        self
    }

    pub fn learning_start(mut self, v: usize) -> Self {
        self.learning_start = v;
        self
    }

    /// Sets the linear learning-rate schedule.
    pub fn lr_schedule(mut self, begin: f32, end: f32, nsteps: usize) -> Self {
        self.lr_begin = begin;
        self.lr_end = end;
        self.lr_nsteps = nsteps;
        self
    }

    /// Sets the linear exploration schedule.
    pub fn eps_schedule(mut self, begin: f32, end: f32, nsteps: usize) -> Self {
        self.eps_begin = begin;
        self.eps_end = end;
        self.eps_nsteps = nsteps;
        self
    }

    pub fn log_freq(mut self, v: usize) -> Self {
        self.log_freq = v;
        self
    }

    pub fn eval_freq(mut self, v: usize) -> Self {
        self.eval_freq = v;
        self
    }

    pub fn num_episodes_test(mut self, v: usize) -> Self {
        self.num_episodes_test = v;
        self
    }

    /// Clipper described by `grad_clip` and `clip_val`.
    pub fn clipper(&self) -> GradientClipper {
        if self.grad_clip {
            GradientClipper::ClipByNorm {
                max_norm: self.clip_val,
            }
        } else {
            GradientClipper::None
        }
    }

    /// Reject settings the model or the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(invalid("gamma", format!("must lie in [0, 1), got {}", self.gamma)));
        }
        if self.grad_clip && !(self.clip_val > 0.0) {
            return Err(invalid(
                "clip_val",
                format!("must be positive when clipping is enabled, got {}", self.clip_val),
            ));
        }
        if !(self.high > 0.0) || !self.high.is_finite() {
            return Err(invalid("high", format!("must be positive and finite, got {}", self.high)));
        }
        for (name, beta) in [("adam_beta1", self.adam_beta1), ("adam_beta2", self.adam_beta2)] {
            if !(0.0..1.0).contains(&beta) {
                return Err(invalid(name, format!("must lie in [0, 1), got {}", beta)));
            }
        }
        if !(self.adam_epsilon > 0.0) {
            return Err(invalid("adam_epsilon", format!("must be positive, got {}", self.adam_epsilon)));
        }

        let positive = [
            ("state_history", self.state_history),
            ("batch_size", self.batch_size),
            ("buffer_size", self.buffer_size),
            ("target_update_freq", self.target_update_freq),
            ("learning_freq", self.learning_freq),
            ("log_freq", self.log_freq),
            ("eval_freq", self.eval_freq),
            ("nsteps_train", self.nsteps_train),
            ("num_episodes_test", self.num_episodes_test),
        ];
        for (name, v) in positive {
            if v == 0 {
                return Err(invalid(name, "must be positive".to_string()));
            }
        }
        if self.batch_size + 1 > self.buffer_size {
            return Err(invalid(
                "buffer_size",
                format!("must hold at least batch_size + 1 = {} frames", self.batch_size + 1),
            ));
        }

        for (name, v) in [("lr_begin", self.lr_begin), ("lr_end", self.lr_end)] {
            if !(v > 0.0) {
                return Err(invalid(name, format!("learning rate must be positive, got {}", v)));
            }
        }
        for (name, v) in [
            ("eps_begin", self.eps_begin),
            ("eps_end", self.eps_end),
            ("soft_epsilon", self.soft_epsilon),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(name, format!("exploration rate must lie in [0, 1], got {}", v)));
            }
        }
        Ok(())
    }

    /// Constructs [`DqnConfig`] from a JSON file. Missing fields take their
    /// default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let config: Self = serde_json::from_reader(rdr)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Saves [`DqnConfig`] as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_json::to_string_pretty(&self)?.as_bytes())?;
        Ok(())
    }
}

fn invalid(name: &str, reason: String) -> DqnError {
    DqnError::invalid_parameter(name.to_string(), reason)
}
