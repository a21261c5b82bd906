use std::collections::HashMap;
use std::fmt;

/// Errors raised by environments and vectorized environment wrappers.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvError {
    /// Action index outside `0..n_actions`.
    InvalidAction { action: usize, n_actions: usize },
    /// A vectorized step received a different number of actions than replicas.
    ActionCountMismatch { expected: usize, got: usize },
    /// An observation did not have the length the consumer expected.
    ObservationShape { expected: usize, got: usize },
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::InvalidAction { action, n_actions } => {
                write!(f, "action {} is out of range for {} actions", action, n_actions)
            }
            EnvError::ActionCountMismatch { expected, got } => {
                write!(f, "expected {} actions (one per env), got {}", expected, got)
            }
            EnvError::ObservationShape { expected, got } => {
                write!(f, "observation has {} features, expected {}", got, expected)
            }
        }
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// Outcome of a single environment transition. `obs` is the next observation.
#[derive(Debug, Clone)]
pub struct Step<O> {
    pub obs: O,
    pub done: bool,
    pub reward: f64,
    pub info: Option<HashMap<String, String>>,
}

pub trait Environment {
    type Observation;
    type Action;

    fn reset(&mut self) -> EnvResult<Self::Observation>;
    fn step(&mut self, action: Self::Action) -> EnvResult<Step<Self::Observation>>;

    /// Number of features in one observation.
    fn observation_dim(&self) -> usize;
    /// Number of discrete actions.
    fn action_dim(&self) -> usize;
}
