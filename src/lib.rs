//! Actor-critic training loops on CartPole: a vectorized A2C learner and a
//! DDPG-style agent with replay memory and soft-updated target networks.

pub mod a2c;
pub mod batch;
pub mod buffer;
pub mod cartpole;
pub mod collector;
pub mod config;
pub mod ddpg;
pub mod distributions;
pub mod env;
pub mod model;
pub mod policy;
pub mod returns;
pub mod target;
pub mod trainer;
pub mod venv;

#[cfg(test)]
mod mock;
