//! Training configuration for the A2C and DDPG drivers.
//!
//! Every knob is a named field with a documented default; builders follow the
//! `with_*` pattern and `validate()` catches nonsense before training starts.

use std::fmt;
use std::path::PathBuf;

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count parameter must be positive.
    InvalidCount { field: &'static str, value: usize },
    /// A parameter is outside its valid range.
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount { field, value } => {
                write!(f, "{} must be > 0, got {}", field, value)
            }
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => {
                write!(f, "{} must be in [{}, {}], got {}", field, min, max, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn check_count(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidCount { field, value });
    }
    Ok(())
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !(min..=max).contains(&value) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        });
    }
    Ok(())
}

/// Vectorized advantage actor-critic.
#[derive(Debug, Clone)]
pub struct A2CConfig {
    /// Environment replicas stepped together.
    pub num_envs: usize,
    pub hidden_size: usize,
    pub learning_rate: f64,
    /// Rollout horizon per update.
    pub num_steps: usize,
    /// Frame budget; one frame is one vectorized step.
    pub max_frames: usize,
    pub gamma: f64,
    /// Weight of the squared-advantage critic term.
    pub value_coef: f64,
    /// Weight of the entropy bonus.
    pub entropy_coef: f64,
    /// Frames between evaluations.
    pub eval_interval: usize,
    pub eval_episodes: usize,
    /// Evaluate with the most likely action instead of sampling.
    pub greedy_eval: bool,
    pub seed: Option<u64>,
    /// Where to save the model once training ends.
    pub checkpoint: Option<PathBuf>,
}

impl Default for A2CConfig {
    fn default() -> Self {
        Self {
            num_envs: 1,
            hidden_size: 256,
            learning_rate: 1e-3,
            num_steps: 5,
            max_frames: 20_000,
            gamma: 0.99,
            value_coef: 0.5,
            entropy_coef: 0.001,
            eval_interval: 100,
            eval_episodes: 10,
            greedy_eval: false,
            seed: None,
            checkpoint: None,
        }
    }
}

impl A2CConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_envs(mut self, n: usize) -> Self {
        self.num_envs = n;
        self
    }

    pub fn with_hidden_size(mut self, n: usize) -> Self {
        self.hidden_size = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_num_steps(mut self, n: usize) -> Self {
        self.num_steps = n;
        self
    }

    pub fn with_max_frames(mut self, n: usize) -> Self {
        self.max_frames = n;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_eval(mut self, interval: usize, episodes: usize) -> Self {
        self.eval_interval = interval;
        self.eval_episodes = episodes;
        self
    }

    pub fn with_greedy_eval(mut self, greedy: bool) -> Self {
        self.greedy_eval = greedy;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_checkpoint(mut self, path: Option<PathBuf>) -> Self {
        self.checkpoint = path;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("num_envs", self.num_envs)?;
        check_count("hidden_size", self.hidden_size)?;
        check_count("num_steps", self.num_steps)?;
        check_count("max_frames", self.max_frames)?;
        check_count("eval_interval", self.eval_interval)?;
        check_count("eval_episodes", self.eval_episodes)?;
        check_positive("learning_rate", self.learning_rate)?;
        check_range("gamma", self.gamma, 0.0, 1.0)?;
        check_range("value_coef", self.value_coef, 0.0, f64::MAX)?;
        check_range("entropy_coef", self.entropy_coef, 0.0, f64::MAX)?;
        Ok(())
    }
}

/// DDPG-style actor/critic with target networks and a replay buffer.
#[derive(Debug, Clone)]
pub struct DDPGConfig {
    pub hidden_size: usize,
    pub gamma: f64,
    pub actor_lr: f64,
    pub critic_lr: f64,
    /// Soft-update rate for both target networks.
    pub tau: f64,
    /// Replay buffer capacity.
    pub capacity: usize,
    pub batch_size: usize,
    /// Initial exploration rate.
    pub eps_start: f64,
    /// Multiplicative decay applied after every action selection.
    pub eps_decay: f64,
    /// Exploration floor.
    pub eps_min: f64,
    pub max_episode_steps: usize,
    /// Reward recorded in place of the environment's on the terminal step.
    pub terminal_reward: f64,
    /// Stop after this many episodes; `None` trains forever.
    pub max_episodes: Option<usize>,
    /// Episodes between evaluations; `None` disables evaluation.
    pub eval_interval: Option<usize>,
    pub eval_episodes: usize,
    /// Mean evaluation reward at which training stops.
    pub solve_threshold: Option<f64>,
    pub seed: Option<u64>,
    /// Where to save the online actor once solved.
    pub checkpoint: Option<PathBuf>,
}

impl Default for DDPGConfig {
    fn default() -> Self {
        Self {
            hidden_size: 256,
            gamma: 0.99,
            actor_lr: 1e-4,
            critic_lr: 1e-4,
            tau: 0.02,
            capacity: 10_000,
            batch_size: 32,
            eps_start: 0.2,
            eps_decay: 0.99999,
            eps_min: 0.05,
            max_episode_steps: 200,
            terminal_reward: -1.0,
            max_episodes: None,
            eval_interval: None,
            eval_episodes: 10,
            solve_threshold: None,
            seed: None,
            checkpoint: None,
        }
    }
}

impl DDPGConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden_size(mut self, n: usize) -> Self {
        self.hidden_size = n;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_learning_rates(mut self, actor_lr: f64, critic_lr: f64) -> Self {
        self.actor_lr = actor_lr;
        self.critic_lr = critic_lr;
        self
    }

    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_exploration(mut self, start: f64, decay: f64, min: f64) -> Self {
        self.eps_start = start;
        self.eps_decay = decay;
        self.eps_min = min;
        self
    }

    pub fn with_max_episode_steps(mut self, n: usize) -> Self {
        self.max_episode_steps = n;
        self
    }

    pub fn with_max_episodes(mut self, n: Option<usize>) -> Self {
        self.max_episodes = n;
        self
    }

    pub fn with_eval(mut self, interval: Option<usize>, episodes: usize) -> Self {
        self.eval_interval = interval;
        self.eval_episodes = episodes;
        self
    }

    pub fn with_solve_threshold(mut self, threshold: Option<f64>) -> Self {
        self.solve_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_checkpoint(mut self, path: Option<PathBuf>) -> Self {
        self.checkpoint = path;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count("hidden_size", self.hidden_size)?;
        check_count("capacity", self.capacity)?;
        check_count("batch_size", self.batch_size)?;
        check_count("max_episode_steps", self.max_episode_steps)?;
        check_count("eval_episodes", self.eval_episodes)?;
        if let Some(n) = self.max_episodes {
            check_count("max_episodes", n)?;
        }
        if let Some(n) = self.eval_interval {
            check_count("eval_interval", n)?;
        }
        check_positive("actor_lr", self.actor_lr)?;
        check_positive("critic_lr", self.critic_lr)?;
        check_range("gamma", self.gamma, 0.0, 1.0)?;
        check_range("tau", self.tau, 0.0, 1.0)?;
        check_range("eps_start", self.eps_start, 0.0, 1.0)?;
        check_range("eps_decay", self.eps_decay, 0.0, 1.0)?;
        check_range("eps_min", self.eps_min, 0.0, self.eps_start)?;
        Ok(())
    }
}
