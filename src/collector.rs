use crate::a2c::A2CAgent;
use crate::venv::VectorEnv;
use anyhow::{Context, Result};
use candle_core::Tensor;

/// Fixed-horizon trajectory segment for one A2C update.
///
/// Every per-step entry covers all replicas: tensors are `(n_envs,)` except
/// `values`, which is `(n_envs, 1)`; `rewards[t]` and `masks[t]` hold one
/// number per replica.
#[derive(Debug, Default)]
pub struct RolloutSegment {
    pub log_probs: Vec<Tensor>,
    pub values: Vec<Tensor>,
    pub entropies: Vec<Tensor>,
    pub rewards: Vec<Vec<f64>>,
    pub masks: Vec<Vec<f64>>,
}

impl RolloutSegment {
    pub fn with_horizon(num_steps: usize) -> Self {
        Self {
            log_probs: Vec::with_capacity(num_steps),
            values: Vec::with_capacity(num_steps),
            entropies: Vec::with_capacity(num_steps),
            rewards: Vec::with_capacity(num_steps),
            masks: Vec::with_capacity(num_steps),
        }
    }

    pub fn push(
        &mut self,
        log_prob: Tensor,
        value: Tensor,
        entropy: Tensor,
        reward: Vec<f64>,
        mask: Vec<f64>,
    ) {
        self.log_probs.push(log_prob);
        self.values.push(value);
        self.entropies.push(entropy);
        self.rewards.push(reward);
        self.masks.push(mask);
    }

    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Result of one [`RolloutCollector::collect`] call.
pub struct Rollout {
    pub segment: RolloutSegment,
    /// Undiscounted returns of episodes that finished during the rollout.
    pub finished_episodes: Vec<f64>,
}

/// Steps a vectorized environment under the current A2C policy.
pub struct RolloutCollector<V: VectorEnv> {
    envs: V,
    current_obs: Vec<V::Observation>,
    episode_returns: Vec<f64>,
    frames: usize,
}

impl<V> RolloutCollector<V>
where
    V: VectorEnv<Observation = Vec<f64>, Action = usize>,
{
    pub fn new(mut envs: V) -> Result<Self> {
        // Initial reset to get first observations
        let current_obs = envs.reset().context("resetting vector env")?;
        let len = envs.len();

        Ok(RolloutCollector {
            envs,
            current_obs,
            episode_returns: vec![0.0; len],
            frames: 0,
        })
    }

    /// Collects `num_steps` vectorized steps.
    pub fn collect(&mut self, agent: &mut A2CAgent, num_steps: usize) -> Result<Rollout> {
        let mut segment = RolloutSegment::with_horizon(num_steps);
        let mut finished_episodes = Vec::new();

        for _ in 0..num_steps {
            let sample = agent.sample_actions(&self.current_obs)?;
            let steps = self
                .envs
                .step(&sample.actions)
                .context("stepping vector env")?;

            let mut rewards = Vec::with_capacity(steps.len());
            let mut masks = Vec::with_capacity(steps.len());
            for (i, step) in steps.into_iter().enumerate() {
                rewards.push(step.reward);
                masks.push(if step.done { 0.0 } else { 1.0 });

                self.episode_returns[i] += step.reward;
                if step.done {
                    finished_episodes.push(self.episode_returns[i]);
                    self.episode_returns[i] = 0.0;
                }
                // Done replicas were auto-reset, so this is already the next episode's start.
                self.current_obs[i] = step.obs;
            }

            segment.push(sample.log_probs, sample.values, sample.entropy, rewards, masks);
            self.frames += 1;
        }

        Ok(Rollout {
            segment,
            finished_episodes,
        })
    }

    /// Observations the next action will be chosen from.
    pub fn current_obs(&self) -> &[Vec<f64>] {
        &self.current_obs
    }

    /// Vectorized steps taken so far.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::A2CConfig;
    use crate::mock::MockEnv;
    use crate::venv::DummyVectorEnv;

    fn agent() -> A2CAgent {
        let config = A2CConfig::new().with_hidden_size(8).with_seed(Some(0));
        A2CAgent::new(1, 2, &config).unwrap()
    }

    #[test]
    fn test_collector_basic() {
        // Max steps 5. Obs: 0->1->2->3->4->5(done)
        let venv = DummyVectorEnv::new(vec![MockEnv::new(5), MockEnv::new(5)]);
        let mut collector = RolloutCollector::new(venv).unwrap();
        let mut agent = agent();

        let rollout = collector.collect(&mut agent, 5).unwrap();

        assert_eq!(rollout.segment.len(), 5);
        assert_eq!(rollout.segment.log_probs.len(), 5);
        assert_eq!(rollout.segment.values[0].dims(), &[2, 1]);
        assert_eq!(rollout.segment.masks[3], vec![1.0, 1.0]);
        assert_eq!(rollout.segment.masks[4], vec![0.0, 0.0]);
        assert_eq!(rollout.finished_episodes, vec![5.0, 5.0]); // Reward is 1.0 per step
        assert_eq!(collector.frames(), 5);
        assert_eq!(collector.current_obs(), &[vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_episode_returns_span_segments() {
        let venv = DummyVectorEnv::new(vec![MockEnv::new(4)]);
        let mut collector = RolloutCollector::new(venv).unwrap();
        let mut agent = agent();

        let first = collector.collect(&mut agent, 3).unwrap();
        assert!(first.finished_episodes.is_empty());
        assert_eq!(collector.current_obs(), &[vec![3.0]]);

        let second = collector.collect(&mut agent, 3).unwrap();
        assert_eq!(second.finished_episodes, vec![4.0]);
        assert_eq!(second.segment.masks, vec![vec![0.0], vec![1.0], vec![1.0]]);
        assert_eq!(collector.frames(), 6);
    }
}
