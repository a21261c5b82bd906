//! DDPG-style actor/critic over a discrete action space.
//!
//! The actor emits a softmax over actions which is treated as a continuous
//! action vector: it is what the replay buffer stores and what the critic
//! scores. The environment action is drawn from it as a categorical sample.

use crate::batch::BatchTensors;
use crate::buffer::{ReplayBuffer, Transition};
use crate::config::DDPGConfig;
use crate::distributions::sample_weighted;
use crate::env::EnvError;
use crate::model::{reinit_linear, Actor, Critic};
use crate::policy::Policy;
use crate::target::{hard_update, soft_update};
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{loss, AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

pub type DDPGTransition = Transition<Vec<f64>, Vec<f64>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DDPGStats {
    pub critic_loss: f64,
    pub actor_loss: f64,
}

fn adam(vars: &VarMap, lr: f64) -> candle_core::Result<AdamW> {
    let params = ParamsAdamW {
        lr,
        weight_decay: 0.0,
        ..Default::default()
    };
    AdamW::new(vars.all_vars(), params)
}

pub struct DDPGAgent {
    actor: Actor,
    actor_target: Actor,
    critic: Critic,
    critic_target: Critic,
    actor_vars: VarMap,
    actor_target_vars: VarMap,
    critic_vars: VarMap,
    critic_target_vars: VarMap,
    actor_optim: AdamW,
    critic_optim: AdamW,
    buffer: ReplayBuffer<Vec<f64>, Vec<f64>>,
    device: Device,
    obs_dim: usize,
    action_dim: usize,

    // Hyperparameters
    gamma: f64,
    tau: f64,
    batch_size: usize,
    eps: f64,
    eps_decay: f64,
    eps_min: f64,
    rng: StdRng,
}

impl DDPGAgent {
    pub fn new(obs_dim: usize, action_dim: usize, config: &DDPGConfig) -> Result<Self> {
        let device = Device::Cpu;
        let hidden = config.hidden_size;

        let actor_vars = VarMap::new();
        let actor = Actor::new(
            obs_dim,
            hidden,
            action_dim,
            VarBuilder::from_varmap(&actor_vars, DType::F64, &device),
        )?;
        let actor_target_vars = VarMap::new();
        let actor_target = Actor::new(
            obs_dim,
            hidden,
            action_dim,
            VarBuilder::from_varmap(&actor_target_vars, DType::F64, &device),
        )?;

        let critic_vars = VarMap::new();
        let critic = Critic::new(
            obs_dim,
            action_dim,
            hidden,
            VarBuilder::from_varmap(&critic_vars, DType::F64, &device),
        )?;
        let critic_target_vars = VarMap::new();
        let critic_target = Critic::new(
            obs_dim,
            action_dim,
            hidden,
            VarBuilder::from_varmap(&critic_target_vars, DType::F64, &device),
        )?;

        // A seed covers the initial weights as well as exploration.
        let rng = match config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                reinit_linear(&actor_vars, &mut rng)?;
                reinit_linear(&critic_vars, &mut rng)?;
                rng
            }
            None => StdRng::from_entropy(),
        };

        // Targets start as exact copies of the online networks.
        hard_update(&actor_target_vars, &actor_vars)?;
        hard_update(&critic_target_vars, &critic_vars)?;

        let actor_optim = adam(&actor_vars, config.actor_lr)?;
        let critic_optim = adam(&critic_vars, config.critic_lr)?;

        Ok(Self {
            actor,
            actor_target,
            critic,
            critic_target,
            actor_vars,
            actor_target_vars,
            critic_vars,
            critic_target_vars,
            actor_optim,
            critic_optim,
            buffer: ReplayBuffer::new(config.capacity),
            device,
            obs_dim,
            action_dim,
            gamma: config.gamma,
            tau: config.tau,
            batch_size: config.batch_size,
            eps: config.eps_start,
            eps_decay: config.eps_decay,
            eps_min: config.eps_min,
            rng,
        })
    }

    fn obs_tensor(&self, obs: &[f64]) -> Result<Tensor> {
        if obs.len() != self.obs_dim {
            return Err(EnvError::ObservationShape {
                expected: self.obs_dim,
                got: obs.len(),
            }
            .into());
        }
        Ok(Tensor::from_slice(obs, (1, self.obs_dim), &self.device)?)
    }

    /// Actor output for one observation, without exploration.
    pub fn actor_output(&self, obs: &[f64]) -> Result<Vec<f64>> {
        let out = self.actor.forward(&self.obs_tensor(obs)?)?.detach();
        Ok(out.squeeze(0)?.to_vec1::<f64>()?)
    }

    /// Epsilon-greedy action vector for `obs`.
    ///
    /// With probability `eps` the vector is uniform noise in `[0, 1)`,
    /// otherwise it is the actor's output. `eps` decays on every call.
    pub fn act(&mut self, obs: &[f64]) -> Result<Vec<f64>> {
        let obs = self.obs_tensor(obs)?;
        let action = if self.rng.gen::<f64>() > self.eps {
            self.actor.forward(&obs)?.detach().squeeze(0)?.to_vec1::<f64>()?
        } else {
            (0..self.action_dim).map(|_| self.rng.gen::<f64>()).collect()
        };

        self.eps = (self.eps * self.eps_decay).max(self.eps_min);
        Ok(action)
    }

    /// Draws a discrete environment action weighted by an action vector.
    pub fn sample_env_action(&mut self, action: &[f64]) -> Result<usize> {
        Ok(sample_weighted(action, &mut self.rng)?)
    }

    pub fn put(&mut self, transition: DDPGTransition) {
        self.buffer.add(transition);
    }

    /// One critic step, one actor step, then soft updates of both targets.
    ///
    /// Returns `None` until the buffer holds at least one full batch.
    pub fn learn(&mut self) -> Result<Option<DDPGStats>> {
        if self.buffer.len() < self.batch_size {
            return Ok(None);
        }

        let batch = self
            .buffer
            .sample(self.batch_size, &mut self.rng)
            .to_tensors(&self.device)?;

        let critic_loss = self.critic_learn(&batch)?;
        let actor_loss = self.actor_learn(&batch.obs)?;
        soft_update(&self.critic_target_vars, &self.critic_vars, self.tau)?;
        soft_update(&self.actor_target_vars, &self.actor_vars, self.tau)?;

        tracing::debug!(critic_loss, actor_loss, "ddpg update");
        Ok(Some(DDPGStats {
            critic_loss,
            actor_loss,
        }))
    }

    /// Critic regression target `r + (1 - done) * gamma * Q'(s', μ'(s'))`,
    /// computed from the target networks and detached from the graph.
    fn td_target(&self, batch: &BatchTensors) -> candle_core::Result<Tensor> {
        let next_action = self.actor_target.forward(&batch.obs_next)?.detach();
        let next_q = self
            .critic_target
            .forward(&batch.obs_next, &next_action)?
            .detach();
        let not_done = batch.done.affine(-1.0, 1.0)?;
        Ok(batch
            .rew
            .add(&not_done.mul(&next_q)?.affine(self.gamma, 0.0)?)?
            .detach())
    }

    /// Regresses `critic(s, a)` onto [`Self::td_target`].
    fn critic_learn(&mut self, batch: &BatchTensors) -> Result<f64> {
        let y_true = self.td_target(batch)?;
        let y_pred = self.critic.forward(&batch.obs, &batch.act)?;
        let loss = loss::mse(&y_pred, &y_true)?;
        self.critic_optim.backward_step(&loss)?;
        Ok(loss.to_scalar::<f64>()?)
    }

    /// Pushes the actor toward actions the critic rates highly.
    fn actor_learn(&mut self, obs: &Tensor) -> Result<f64> {
        let action = self.actor.forward(obs)?;
        let loss = self.critic.forward(obs, &action)?.mean_all()?.neg()?;
        self.actor_optim.backward_step(&loss)?;
        Ok(loss.to_scalar::<f64>()?)
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn buffer(&self) -> &ReplayBuffer<Vec<f64>, Vec<f64>> {
        &self.buffer
    }

    pub fn action_dim(&self) -> usize {
        self.action_dim
    }

    pub fn actor_vars(&self) -> &VarMap {
        &self.actor_vars
    }

    pub fn actor_target_vars(&self) -> &VarMap {
        &self.actor_target_vars
    }

    pub fn critic_vars(&self) -> &VarMap {
        &self.critic_vars
    }

    pub fn critic_target_vars(&self) -> &VarMap {
        &self.critic_target_vars
    }

    /// Writes the online actor's parameters as safetensors.
    pub fn save_actor(&self, path: &Path) -> Result<()> {
        self.actor_vars
            .save(path)
            .with_context(|| format!("saving actor checkpoint to {}", path.display()))
    }
}

/// Exploration-free action selection: a categorical draw from the actor.
impl Policy for DDPGAgent {
    fn act(&mut self, obs: &[f64]) -> Result<usize> {
        let probs = self.actor_output(obs)?;
        self.sample_env_action(&probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config() -> DDPGConfig {
        DDPGConfig::new()
            .with_hidden_size(16)
            .with_batch_size(8)
            .with_capacity(64)
            .with_seed(Some(5))
    }

    fn snapshot(varmap: &VarMap) -> BTreeMap<String, Vec<f64>> {
        varmap
            .data()
            .lock()
            .unwrap()
            .iter()
            .map(|(name, v)| {
                let values = v.as_tensor().flatten_all().unwrap().to_vec1::<f64>().unwrap();
                (name.clone(), values)
            })
            .collect()
    }

    fn fill(agent: &mut DDPGAgent, n: usize) {
        for i in 0..n {
            let obs = vec![0.01 * i as f64, 0.0, -0.01, 0.02];
            let act = agent.act(&obs).unwrap();
            let done = i % 10 == 9;
            let rew = if done { -1.0 } else { 1.0 };
            let next = vec![0.01 * (i + 1) as f64, 0.0, -0.01, 0.02];
            agent.put(Transition::new(obs, act, rew, next, done));
        }
    }

    #[test]
    fn test_targets_start_identical() {
        let agent = DDPGAgent::new(4, 2, &config()).unwrap();
        assert_eq!(snapshot(agent.actor_vars()), snapshot(agent.actor_target_vars()));
        assert_eq!(snapshot(agent.critic_vars()), snapshot(agent.critic_target_vars()));
    }

    #[test]
    fn test_eps_decays_to_floor() {
        let config = config().with_exploration(0.2, 0.5, 0.05);
        let mut agent = DDPGAgent::new(4, 2, &config).unwrap();
        let obs = [0.0; 4];
        let mut last = agent.eps();
        for _ in 0..20 {
            agent.act(&obs).unwrap();
            assert!(agent.eps() <= last);
            assert!(agent.eps() >= 0.05);
            last = agent.eps();
        }
        assert_eq!(agent.eps(), 0.05);
    }

    #[test]
    fn test_act_returns_action_vector() {
        let mut agent = DDPGAgent::new(4, 3, &config()).unwrap();
        for _ in 0..20 {
            let a = agent.act(&[0.0, 0.1, 0.0, -0.1]).unwrap();
            assert_eq!(a.len(), 3);
            assert!(a.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert!(agent.act(&[0.0; 2]).is_err());
    }

    fn column(t: &Tensor) -> Vec<f64> {
        t.flatten_all().unwrap().to_vec1::<f64>().unwrap()
    }

    #[test]
    fn test_td_target_stops_bootstrap_at_terminal() {
        let agent = DDPGAgent::new(4, 2, &config().with_gamma(0.9)).unwrap();
        let device = Device::Cpu;
        let obs_next =
            Tensor::new(&[[0.1f64, 0.0, -0.1, 0.2], [0.3, -0.2, 0.0, 0.1]], &device).unwrap();
        let batch = BatchTensors {
            obs: Tensor::zeros((2, 4), DType::F64, &device).unwrap(),
            act: Tensor::new(&[[0.5f64, 0.5], [0.2, 0.8]], &device).unwrap(),
            rew: Tensor::new(&[[1.0f64], [-1.0]], &device).unwrap(),
            done: Tensor::new(&[[0.0f64], [1.0]], &device).unwrap(),
            obs_next: obs_next.clone(),
        };

        let next_action = agent.actor_target.forward(&obs_next).unwrap();
        let next_q = column(&agent.critic_target.forward(&obs_next, &next_action).unwrap());
        assert!(next_q[0].abs() > 1e-6);

        let y = column(&agent.td_target(&batch).unwrap());
        assert!((y[0] - (1.0 + 0.9 * next_q[0])).abs() < 1e-9);
        assert!((y[1] - -1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_initial_weights() {
        let a = DDPGAgent::new(4, 2, &config()).unwrap();
        let b = DDPGAgent::new(4, 2, &config()).unwrap();
        assert_eq!(snapshot(a.actor_vars()), snapshot(b.actor_vars()));
        assert_eq!(snapshot(a.critic_vars()), snapshot(b.critic_vars()));
    }

    #[test]
    fn test_learn_waits_for_full_batch() {
        let mut agent = DDPGAgent::new(4, 2, &config()).unwrap();
        fill(&mut agent, 7);
        assert_eq!(agent.learn().unwrap(), None);
    }

    #[test]
    fn test_learn_moves_online_and_target() {
        let mut agent = DDPGAgent::new(4, 2, &config()).unwrap();
        fill(&mut agent, 20);

        let actor_before = snapshot(agent.actor_vars());
        let critic_target_before = snapshot(agent.critic_target_vars());

        let stats = agent.learn().unwrap().expect("buffer holds a full batch");
        assert!(stats.critic_loss.is_finite() && stats.critic_loss >= 0.0);
        assert!(stats.actor_loss.is_finite());

        assert_ne!(snapshot(agent.actor_vars()), actor_before);
        let critic_target_after = snapshot(agent.critic_target_vars());
        assert_ne!(critic_target_after, critic_target_before);
        // Soft update keeps targets distinct from the online critic.
        assert_ne!(critic_target_after, snapshot(agent.critic_vars()));
    }

    #[test]
    fn test_buffer_capacity_respected() {
        let mut agent = DDPGAgent::new(4, 2, &config().with_capacity(10)).unwrap();
        fill(&mut agent, 25);
        assert_eq!(agent.buffer().len(), 10);
    }

    #[test]
    fn test_policy_act_in_range() {
        let mut agent = DDPGAgent::new(4, 2, &config()).unwrap();
        for _ in 0..10 {
            assert!(Policy::act(&mut agent, &[0.0; 4]).unwrap() < 2);
        }
    }
}
