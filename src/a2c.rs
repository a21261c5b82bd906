//! Advantage actor-critic learner.

use crate::batch::rows_to_tensor;
use crate::collector::RolloutSegment;
use crate::config::A2CConfig;
use crate::distributions::Categorical;
use crate::env::EnvError;
use crate::model::{reinit_linear, ActorCritic};
use crate::policy::Policy;
use crate::returns::compute_returns_batched;
use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

/// Actions drawn for a batch of observations, with the graph-connected
/// quantities the learning step needs later.
pub struct ActionSample {
    pub actions: Vec<usize>,
    /// `(batch,)`
    pub log_probs: Tensor,
    /// `(batch, 1)`
    pub values: Tensor,
    /// `(batch,)`
    pub entropy: Tensor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct A2CStats {
    pub loss: f64,
    pub actor_loss: f64,
    pub critic_loss: f64,
    pub entropy: f64,
}

pub struct A2CAgent {
    model: ActorCritic,
    varmap: VarMap,
    optimizer: AdamW,
    device: Device,
    obs_dim: usize,

    gamma: f64,
    value_coef: f64,
    entropy_coef: f64,
    rng: StdRng,
}

impl A2CAgent {
    pub fn new(obs_dim: usize, n_actions: usize, config: &A2CConfig) -> Result<Self> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F64, &device);
        let model = ActorCritic::new(obs_dim, n_actions, config.hidden_size, vb)?;

        // A seed covers both the initial weights and action sampling.
        let rng = match config.seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                reinit_linear(&varmap, &mut rng)?;
                rng
            }
            None => StdRng::from_entropy(),
        };

        // Plain Adam: AdamW without decoupled weight decay.
        let params = ParamsAdamW {
            lr: config.learning_rate,
            weight_decay: 0.0,
            ..Default::default()
        };
        let optimizer = AdamW::new(varmap.all_vars(), params)?;

        Ok(Self {
            model,
            varmap,
            optimizer,
            device,
            obs_dim,
            gamma: config.gamma,
            value_coef: config.value_coef,
            entropy_coef: config.entropy_coef,
            rng,
        })
    }

    fn obs_tensor(&self, obs: &[Vec<f64>]) -> Result<Tensor> {
        if let Some(bad) = obs.iter().find(|o| o.len() != self.obs_dim) {
            return Err(EnvError::ObservationShape {
                expected: self.obs_dim,
                got: bad.len(),
            }
            .into());
        }
        Ok(rows_to_tensor(obs, &self.device)?)
    }

    pub fn forward(&self, obs: &[Vec<f64>]) -> Result<(Categorical, Tensor)> {
        Ok(self.model.forward(&self.obs_tensor(obs)?)?)
    }

    /// Samples one action per observation from the current policy.
    pub fn sample_actions(&mut self, obs: &[Vec<f64>]) -> Result<ActionSample> {
        let (dist, values) = self.forward(obs)?;
        let actions = dist.sample(&mut self.rng)?;
        let log_probs = dist.log_prob(&actions)?;
        let entropy = dist.entropy()?;
        Ok(ActionSample {
            actions,
            log_probs,
            values,
            entropy,
        })
    }

    /// Value estimates as plain numbers, one per observation.
    pub fn values(&self, obs: &[Vec<f64>]) -> Result<Vec<f64>> {
        let (_, values) = self.forward(obs)?;
        Ok(values.detach().flatten_all()?.to_vec1::<f64>()?)
    }

    /// One optimizer step over a rollout segment.
    ///
    /// `next_obs` is the observation batch after the segment's last step;
    /// its value estimate bootstraps the returns.
    pub fn learn(&mut self, segment: RolloutSegment, next_obs: &[Vec<f64>]) -> Result<A2CStats> {
        anyhow::ensure!(!segment.is_empty(), "cannot learn from an empty rollout segment");

        let next_values = self.values(next_obs)?;
        let returns =
            compute_returns_batched(&next_values, &segment.rewards, &segment.masks, self.gamma);
        let n = returns.len() * next_values.len();
        let returns: Vec<f64> = returns.into_iter().flatten().collect();
        let returns = Tensor::from_vec(returns, (n, 1), &self.device)?;

        let log_probs = Tensor::cat(&segment.log_probs, 0)?.unsqueeze(1)?;
        let values = Tensor::cat(&segment.values, 0)?;
        let entropy = Tensor::cat(&segment.entropies, 0)?.mean_all()?;

        let advantage = returns.sub(&values)?;
        let actor_loss = log_probs.mul(&advantage.detach())?.mean_all()?.neg()?;
        let critic_loss = advantage.sqr()?.mean_all()?;
        let loss = actor_loss
            .add(&critic_loss.affine(self.value_coef, 0.0)?)?
            .sub(&entropy.affine(self.entropy_coef, 0.0)?)?;

        self.optimizer.backward_step(&loss)?;

        let stats = A2CStats {
            loss: loss.to_scalar::<f64>()?,
            actor_loss: actor_loss.to_scalar::<f64>()?,
            critic_loss: critic_loss.to_scalar::<f64>()?,
            entropy: entropy.to_scalar::<f64>()?,
        };
        tracing::debug!(
            loss = stats.loss,
            actor_loss = stats.actor_loss,
            critic_loss = stats.critic_loss,
            entropy = stats.entropy,
            "a2c update"
        );
        Ok(stats)
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Writes all parameters as safetensors.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.varmap
            .save(path)
            .with_context(|| format!("saving A2C checkpoint to {}", path.display()))
    }

    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.varmap
            .load(path)
            .with_context(|| format!("loading A2C checkpoint from {}", path.display()))
    }
}

impl Policy for A2CAgent {
    fn act(&mut self, obs: &[f64]) -> Result<usize> {
        let sample = self.sample_actions(&[obs.to_vec()])?;
        Ok(sample.actions[0])
    }
}

/// Evaluates an agent with its most likely action instead of a sample.
pub struct Greedy<'a>(pub &'a A2CAgent);

impl Policy for Greedy<'_> {
    fn act(&mut self, obs: &[f64]) -> Result<usize> {
        let (dist, _) = self.0.forward(&[obs.to_vec()])?;
        Ok(dist.mode()?[0])
    }
}
