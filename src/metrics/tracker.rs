use std::collections::VecDeque;

use super::statistics::Statistics;

/// Bounded histories of the values logged during training
#[derive(Debug, Clone, Default)]
pub struct TrainingMetrics {
    /// Total reward of each finished episode
    pub episode_rewards: VecDeque<f32>,

    /// Largest action value seen at each acting step
    pub max_q_values: VecDeque<f32>,

    /// Every action value seen at acting steps
    pub q_values: VecDeque<f32>,

    /// Loss of each optimizer step
    pub losses: VecDeque<f32>,

    /// Gradient norm of each optimizer step
    pub gradient_norms: VecDeque<f32>,

    /// Mean reward of each evaluation
    pub eval_scores: Vec<f32>,
}

/// Tracks metrics during training
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: TrainingMetrics,
    history_size: usize,
    q_history_size: usize,
    current_episode_reward: f32,
    episode_count: usize,
}

fn push_bounded(queue: &mut VecDeque<f32>, value: f32, limit: usize) {
    if queue.len() >= limit {
        queue.pop_front();
    }
    queue.push_back(value);
}

impl MetricsTracker {
    /// `history_size` bounds per-episode and per-update histories; action
    /// values keep `q_history_size` entries.
    pub fn new(history_size: usize, q_history_size: usize) -> Self {
        MetricsTracker {
            metrics: TrainingMetrics::default(),
            history_size: history_size.max(1),
            q_history_size: q_history_size.max(1),
            current_episode_reward: 0.0,
            episode_count: 0,
        }
    }

    /// Start a new episode
    pub fn start_episode(&mut self) {
        self.current_episode_reward = 0.0;
    }

    /// Record a step within an episode
    pub fn step(&mut self, reward: f32) {
        self.current_episode_reward += reward;
    }

    /// End the current episode
    pub fn end_episode(&mut self) {
        push_bounded(&mut self.metrics.episode_rewards, self.current_episode_reward, self.history_size);
        self.episode_count += 1;
    }

    /// Record the action values of an acting step
    pub fn record_q_values(&mut self, q_values: &[f32]) {
        if q_values.is_empty() {
            return;
        }
        let max_q = q_values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        push_bounded(&mut self.metrics.max_q_values, max_q, self.q_history_size);
        for &q in q_values {
            push_bounded(&mut self.metrics.q_values, q, self.q_history_size);
        }
    }

    /// Record the diagnostics of an optimizer step
    pub fn record_update(&mut self, loss: f32, grad_norm: f32) {
        push_bounded(&mut self.metrics.losses, loss, self.history_size);
        push_bounded(&mut self.metrics.gradient_norms, grad_norm, self.history_size);
    }

    pub fn record_eval_score(&mut self, score: f32) {
        self.metrics.eval_scores.push(score);
    }

    /// Get a reference to the metrics
    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn reward_stats(&self) -> Statistics {
        Statistics::from_values(&self.metrics.episode_rewards)
    }

    pub fn max_q_stats(&self) -> Statistics {
        Statistics::from_values(&self.metrics.max_q_values)
    }

    pub fn q_stats(&self) -> Statistics {
        Statistics::from_values(&self.metrics.q_values)
    }

    pub fn last_loss(&self) -> Option<f32> {
        self.metrics.losses.back().copied()
    }

    pub fn last_grad_norm(&self) -> Option<f32> {
        self.metrics.gradient_norms.back().copied()
    }

    pub fn last_eval_score(&self) -> Option<f32> {
        self.metrics.eval_scores.last().copied()
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(50, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_rewards_are_bounded() {
        let mut tracker = MetricsTracker::new(2, 10);
        for reward in [1.0, 2.0, 3.0] {
            tracker.start_episode();
            tracker.step(reward);
            tracker.step(reward);
            tracker.end_episode();
        }
        assert_eq!(tracker.episode_count(), 3);
        assert_eq!(tracker.metrics().episode_rewards, VecDeque::from(vec![4.0, 6.0]));
        assert!((tracker.reward_stats().mean - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_q_value_tracking() {
        let mut tracker = MetricsTracker::new(10, 3);
        tracker.record_q_values(&[1.0, -2.0]);
        tracker.record_q_values(&[0.5, 4.0]);
        assert_eq!(tracker.max_q_stats().max, 4.0);
        assert_eq!(tracker.metrics().q_values.len(), 3);
        tracker.record_q_values(&[]);
        assert_eq!(tracker.metrics().max_q_values.len(), 2);
    }
}
