use crate::env::{EnvError, EnvResult, Environment, Step};

/// Deterministic counter environment: the observation is the step count,
/// every step pays 1.0 and the episode ends after `max_steps`.
#[derive(Debug, Clone)]
pub struct MockEnv {
    obs: f64,
    count: usize,
    max_steps: usize,
}

impl MockEnv {
    pub fn new(max_steps: usize) -> Self {
        Self {
            obs: 0.0,
            count: 0,
            max_steps,
        }
    }
}

impl Environment for MockEnv {
    type Observation = Vec<f64>;
    type Action = usize;

    fn step(&mut self, action: Self::Action) -> EnvResult<Step<Self::Observation>> {
        if action >= 2 {
            return Err(EnvError::InvalidAction {
                action,
                n_actions: 2,
            });
        }
        self.count += 1;
        self.obs += 1.0;
        let done = self.count >= self.max_steps;

        Ok(Step {
            obs: vec![self.obs],
            reward: 1.0,
            done,
            info: None,
        })
    }

    fn reset(&mut self) -> EnvResult<Self::Observation> {
        self.obs = 0.0;
        self.count = 0;
        Ok(vec![self.obs])
    }

    fn observation_dim(&self) -> usize {
        1
    }

    fn action_dim(&self) -> usize {
        2
    }
}
