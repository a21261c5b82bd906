use crate::distributions::Categorical;
use candle_core::{Error, Result, Tensor, D};
use candle_nn::{linear, ops, Linear, Module, VarBuilder, VarMap};
use rand::Rng;

/// Redraws every `Linear` parameter in `varmap` uniformly from
/// `±1/sqrt(fan_in)`, visiting parameters in name order.
///
/// candle cannot seed its CPU initializers, so seeded agents call this to
/// start from reproducible weights.
pub fn reinit_linear<R: Rng + ?Sized>(varmap: &VarMap, rng: &mut R) -> Result<()> {
    let vars = varmap
        .data()
        .lock()
        .map_err(|e| Error::Msg(format!("parameters poisoned: {}", e)))?;
    let mut names: Vec<&String> = vars.keys().collect();
    names.sort();

    for name in names {
        let layer = name.rsplit_once('.').map_or(name.as_str(), |(layer, _)| layer);
        let fan_in = vars
            .get(&format!("{}.weight", layer))
            .and_then(|w| w.dims().last().copied())
            .ok_or_else(|| Error::Msg(format!("no weight matrix for {}", name)))?;
        let bound = 1.0 / (fan_in as f64).sqrt();

        let var = &vars[name];
        let values: Vec<f64> = (0..var.elem_count())
            .map(|_| rng.gen_range(-bound..bound))
            .collect();
        let fresh = Tensor::from_vec(values, var.dims().to_vec(), var.device())?
            .to_dtype(var.dtype())?;
        var.set(&fresh)?;
    }
    Ok(())
}

/// A2C policy/value module: two separate single-hidden-layer networks over
/// the same observation.
#[derive(Debug, Clone)]
pub struct ActorCritic {
    critic_fc: Linear,
    critic_out: Linear,
    actor_fc: Linear,
    actor_out: Linear,
}

impl ActorCritic {
    pub fn new(
        num_inputs: usize,
        num_outputs: usize,
        hidden_size: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let critic_fc = linear(num_inputs, hidden_size, vb.pp("critic_fc"))?;
        let critic_out = linear(hidden_size, 1, vb.pp("critic_out"))?;
        let actor_fc = linear(num_inputs, hidden_size, vb.pp("actor_fc"))?;
        let actor_out = linear(hidden_size, num_outputs, vb.pp("actor_out"))?;
        Ok(Self {
            critic_fc,
            critic_out,
            actor_fc,
            actor_out,
        })
    }

    /// Returns the action distribution and the `(batch, 1)` value estimate.
    pub fn forward(&self, xs: &Tensor) -> Result<(Categorical, Tensor)> {
        let value = self.critic_out.forward(&self.critic_fc.forward(xs)?.relu()?)?;
        let logits = self.actor_out.forward(&self.actor_fc.forward(xs)?.relu()?)?;
        Ok((Categorical::from_logits(&logits)?, value))
    }
}

/// DDPG actor: observation to a softmax over actions.
#[derive(Debug, Clone)]
pub struct Actor {
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
}

impl Actor {
    pub fn new(obs_dim: usize, hidden_dim: usize, action_dim: usize, vb: VarBuilder) -> Result<Self> {
        let fc1 = linear(obs_dim, hidden_dim, vb.pp("fc1"))?;
        let fc2 = linear(hidden_dim, hidden_dim, vb.pp("fc2"))?;
        let fc3 = linear(hidden_dim, action_dim, vb.pp("fc3"))?;
        Ok(Self { fc1, fc2, fc3 })
    }

    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let xs = self.fc1.forward(xs)?.relu()?;
        let xs = self.fc2.forward(&xs)?.relu()?;
        ops::softmax(&self.fc3.forward(&xs)?, D::Minus1)
    }
}

/// DDPG critic: `(observation, action)` to a scalar Q-value.
#[derive(Debug, Clone)]
pub struct Critic {
    fc1: Linear,
    fc2: Linear,
    fc3: Linear,
}

impl Critic {
    pub fn new(obs_dim: usize, action_dim: usize, hidden_dim: usize, vb: VarBuilder) -> Result<Self> {
        let fc1 = linear(obs_dim + action_dim, hidden_dim, vb.pp("fc1"))?;
        let fc2 = linear(hidden_dim, hidden_dim, vb.pp("fc2"))?;
        let fc3 = linear(hidden_dim, 1, vb.pp("fc3"))?;
        Ok(Self { fc1, fc2, fc3 })
    }

    pub fn forward(&self, obs: &Tensor, action: &Tensor) -> Result<Tensor> {
        let xs = Tensor::cat(&[obs, action], 1)?;
        let xs = self.fc1.forward(&xs)?.relu()?;
        let xs = self.fc2.forward(&xs)?.relu()?;
        self.fc3.forward(&xs)
    }
}
