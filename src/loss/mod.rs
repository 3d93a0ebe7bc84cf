//! Temporal-difference loss.
//!
//! The loss compares online action values against targets bootstrapped from
//! the target network. Target values arrive as [`Detached`] data, so the
//! gradient computed here only ever reaches the online network.

mod temporal_difference;

pub use temporal_difference::{Detached, TdLoss, TdLossOutput};
