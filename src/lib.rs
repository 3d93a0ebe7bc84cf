//! # deepq - Deep Q-Learning with a linear action-value function
//!
//! deepq trains an action-value function over stacked image frames with
//! the DQN recipe: an online approximator updated by Adam on the squared
//! temporal-difference error, and a target approximator that only changes
//! when it is explicitly synchronized with the online one.
//!
//! The approximator is linear: observations are flattened, upcast to
//! `f32` and passed through a single affine transform. Gradients have a
//! closed form and are computed directly, without an autodiff engine.
//!
//! ## Quick Start
//!
//! ```rust
//! use deepq::config::DqnConfig;
//! use deepq::env::{EnvTest, Environment};
//! use deepq::model::DqnModel;
//! use deepq::trainer::Trainer;
//! use deepq::types::ObservationShape;
//! use rand::SeedableRng;
//!
//! let config = DqnConfig::default()
//!     .nsteps_train(60)
//!     .learning_start(20)
//!     .batch_size(4)
//!     .buffer_size(50)
//!     .target_update_freq(10)
//!     .eval_freq(30)
//!     .log_freq(10)
//!     .num_episodes_test(2);
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let mut env = EnvTest::new(ObservationShape::new(5, 5, 1), &mut rng).unwrap();
//! let shape = env.observation_shape().stacked(config.state_history);
//! let mut model = DqnModel::new(shape, env.num_actions(), &config, &mut rng).unwrap();
//!
//! let mut trainer = Trainer::with_seed(config, 1).unwrap();
//! let mut exploration = trainer.exploration(env.num_actions());
//! let mut lr = trainer.lr_schedule();
//! let summary = trainer.train(&mut model, &mut env, &mut exploration, &mut lr).unwrap();
//! assert_eq!(summary.steps, 60);
//! ```
//!
//! ## Module Organization
//!
//! - [`batch`] - Transition batches and their validation
//! - [`config`] - Hyper-parameters, JSON loading and validation
//! - [`env`] - Environment trait and the deterministic test environment
//! - [`error`] - Error types and result handling
//! - [`layers`] - The affine layer and weight initialization
//! - [`loss`] - Temporal-difference loss with detached targets
//! - [`metrics`] - Training statistics
//! - [`model`] - Online/target networks wired to loss, optimizer and sync
//! - [`network`] - The linear action-value approximator
//! - [`optimizer`] - Adam and per-parameter gradient clipping
//! - [`params`] - Parameter roles and gradients
//! - [`replay_buffer`] - Frame-stacking experience replay
//! - [`schedule`] - Linear schedules and epsilon-greedy exploration
//! - [`sync`] - Target network synchronization
//! - [`trainer`] - The training loop
//! - [`types`] - Observation shapes and aliases

pub mod batch;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod network;
pub mod optimizer;
pub mod params;
pub mod replay_buffer;
pub mod schedule;
pub mod sync;
pub mod trainer;
pub mod types;

#[cfg(test)]
mod tests;
