use crate::env::{EnvError, EnvResult, Environment, Step};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Constants for Physics (Standard CartPole)
const GRAVITY: f64 = 9.8;
const MASSCART: f64 = 1.0;
const MASSPOLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASSCART + MASSPOLE;
const LENGTH: f64 = 0.5; // actually half the pole's length
const POLEMASS_LENGTH: f64 = MASSPOLE * LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02; // seconds between state updates

const X_THRESHOLD: f64 = 2.4;
// 12 degrees
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;
const RESET_BOUND: f64 = 0.05;

/// Step limit of the classic CartPole-v0 task.
pub const DEFAULT_MAX_STEPS: usize = 200;

#[derive(Debug, Clone, Default)]
struct CartPoleState {
    x: f64,
    x_dot: f64,
    theta: f64,
    theta_dot: f64,
}

impl CartPoleState {
    fn to_obs(&self) -> Vec<f64> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

#[derive(Debug, Clone)]
pub struct CartPole {
    state: CartPoleState,
    max_steps: usize,
    current_step: usize,
    rng: StdRng,
}

impl CartPole {
    pub fn new(max_steps: usize) -> Self {
        Self::with_rng(max_steps, StdRng::from_entropy())
    }

    /// Seeded variant, so resets are reproducible.
    pub fn with_seed(max_steps: usize, seed: u64) -> Self {
        Self::with_rng(max_steps, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_steps: usize, rng: StdRng) -> Self {
        CartPole {
            state: CartPoleState::default(),
            max_steps,
            current_step: 0,
            rng,
        }
    }
}

impl Default for CartPole {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEPS)
    }
}

impl Environment for CartPole {
    type Observation = Vec<f64>;
    type Action = usize;

    fn reset(&mut self) -> EnvResult<Self::Observation> {
        let rng = &mut self.rng;
        let mut sample = || rng.gen_range(-RESET_BOUND..RESET_BOUND);
        let state = CartPoleState {
            x: sample(),
            x_dot: sample(),
            theta: sample(),
            theta_dot: sample(),
        };
        self.state = state;
        self.current_step = 0;
        Ok(self.state.to_obs())
    }

    fn step(&mut self, action: Self::Action) -> EnvResult<Step<Self::Observation>> {
        let force = match action {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            _ => {
                return Err(EnvError::InvalidAction {
                    action,
                    n_actions: 2,
                })
            }
        };
        self.current_step += 1;

        let cos_theta = self.state.theta.cos();
        let sin_theta = self.state.theta.sin();

        // Equations of Motion
        let temp =
            (force + POLEMASS_LENGTH * self.state.theta_dot.powi(2) * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASSPOLE * cos_theta.powi(2) / TOTAL_MASS));
        let x_acc = temp - POLEMASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        // Euler Integration
        self.state.x += TAU * self.state.x_dot;
        self.state.x_dot += TAU * x_acc;
        self.state.theta += TAU * self.state.theta_dot;
        self.state.theta_dot += TAU * theta_acc;

        let done = self.state.x.abs() > X_THRESHOLD
            || self.state.theta.abs() > THETA_THRESHOLD
            || self.current_step >= self.max_steps;

        Ok(Step {
            obs: self.state.to_obs(),
            reward: 1.0, // Survive one more frame = +1 point
            done,
            info: None,
        })
    }

    fn observation_dim(&self) -> usize {
        4
    }

    fn action_dim(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_within_bounds() {
        let mut env = CartPole::with_seed(200, 7);
        for _ in 0..20 {
            let obs = env.reset().unwrap();
            assert_eq!(obs.len(), 4);
            assert!(obs.iter().all(|v| v.abs() <= RESET_BOUND));
        }
    }

    #[test]
    fn test_episode_ends_by_step_limit() {
        // Alternating pushes keep the pole up for a while; the limit must still hold.
        let mut env = CartPole::with_seed(10, 1);
        env.reset().unwrap();
        let mut steps = 0;
        loop {
            let step = env.step(steps % 2).unwrap();
            steps += 1;
            assert_eq!(step.reward, 1.0);
            if step.done {
                break;
            }
        }
        assert!(steps <= 10);
    }

    #[test]
    fn test_constant_push_topples_pole() {
        let mut env = CartPole::with_seed(1000, 3);
        env.reset().unwrap();
        let mut steps = 0;
        while !env.step(1).unwrap().done {
            steps += 1;
        }
        assert!(steps < 100, "pole survived {} steps of constant push", steps);
    }

    #[test]
    fn test_invalid_action() {
        let mut env = CartPole::with_seed(200, 0);
        env.reset().unwrap();
        let err = env.step(2).unwrap_err();
        assert_eq!(
            err,
            EnvError::InvalidAction {
                action: 2,
                n_actions: 2
            }
        );
    }
}
