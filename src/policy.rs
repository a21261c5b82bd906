use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks a discrete action for a single observation. Used for evaluation
/// rollouts, where no gradients or bookkeeping are needed.
pub trait Policy {
    fn act(&mut self, obs: &[f64]) -> Result<usize>;
}

/// Uniformly random baseline.
pub struct RandomPolicy {
    n_actions: usize,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(n_actions: usize) -> Self {
        Self {
            n_actions,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(n_actions: usize, seed: u64) -> Self {
        Self {
            n_actions,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _obs: &[f64]) -> Result<usize> {
        anyhow::ensure!(self.n_actions > 0, "random policy has no actions to pick from");
        Ok(self.rng.gen_range(0..self.n_actions))
    }
}
