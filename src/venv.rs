use crate::env::{EnvError, EnvResult, Environment, Step};
use std::fmt::Debug;

pub trait VectorEnv {
    type Observation: Clone + Debug;
    type Action: Clone + Debug;

    fn step(&mut self, actions: &[Self::Action]) -> EnvResult<Vec<Step<Self::Observation>>>;
    fn reset(&mut self) -> EnvResult<Vec<Self::Observation>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn observation_dim(&self) -> usize;
    fn action_dim(&self) -> usize;
}

/// Steps every replica in-process, one after the other.
///
/// A replica that finishes an episode is reset right away: the returned
/// `Step` keeps `done = true`, but its `obs` is the first observation of the
/// next episode, so the caller can keep acting on `obs` unconditionally.
pub struct DummyVectorEnv<E: Environment> {
    envs: Vec<E>,
}

impl<E: Environment> DummyVectorEnv<E> {
    pub fn new(envs: Vec<E>) -> Self {
        Self { envs }
    }
}

impl<E: Environment> VectorEnv for DummyVectorEnv<E>
where
    E::Observation: Clone + Debug,
    E::Action: Clone + Debug,
{
    type Observation = E::Observation;
    type Action = E::Action;

    fn step(&mut self, actions: &[Self::Action]) -> EnvResult<Vec<Step<Self::Observation>>> {
        if actions.len() != self.envs.len() {
            return Err(EnvError::ActionCountMismatch {
                expected: self.envs.len(),
                got: actions.len(),
            });
        }

        let mut next_steps = Vec::with_capacity(self.envs.len());
        for (env, action) in self.envs.iter_mut().zip(actions) {
            let mut step = env.step(action.clone())?;
            if step.done {
                step.obs = env.reset()?;
            }
            next_steps.push(step);
        }

        Ok(next_steps)
    }

    fn reset(&mut self) -> EnvResult<Vec<Self::Observation>> {
        self.envs.iter_mut().map(|env| env.reset()).collect()
    }

    fn len(&self) -> usize {
        self.envs.len()
    }

    fn observation_dim(&self) -> usize {
        self.envs.first().map_or(0, |env| env.observation_dim())
    }

    fn action_dim(&self) -> usize {
        self.envs.first().map_or(0, |env| env.action_dim())
    }
}
