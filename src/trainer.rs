use crate::a2c::{A2CAgent, A2CStats, Greedy};
use crate::buffer::Transition;
use crate::collector::RolloutCollector;
use crate::config::{A2CConfig, DDPGConfig};
use crate::ddpg::{DDPGAgent, DDPGStats};
use crate::env::Environment;
use crate::policy::Policy;
use crate::venv::VectorEnv;
use anyhow::{Context, Result};
use tracing::info;

/// Mean undiscounted reward of `policy` over `episodes` full episodes.
///
/// The environment must end every episode on its own (CartPole does via its
/// step limit).
pub fn evaluate<E, P>(env: &mut E, policy: &mut P, episodes: usize) -> Result<f64>
where
    E: Environment<Observation = Vec<f64>, Action = usize>,
    P: Policy + ?Sized,
{
    anyhow::ensure!(episodes > 0, "evaluation needs at least one episode");

    let mut total_reward = 0.0;
    for _ in 0..episodes {
        let mut obs = env.reset().context("resetting eval env")?;
        loop {
            let action = policy.act(&obs)?;
            let step = env.step(action).context("stepping eval env")?;
            total_reward += step.reward;
            if step.done {
                break;
            }
            obs = step.obs;
        }
    }
    Ok(total_reward / episodes as f64)
}

#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub frames: usize,
    pub updates: usize,
    /// `(frame, mean evaluation reward)` pairs.
    pub eval_rewards: Vec<(usize, f64)>,
    /// Training episodes completed across all replicas.
    pub episode_returns: Vec<f64>,
    pub last_stats: Option<A2CStats>,
}

/// Drives A2C: collect a segment, learn from it, evaluate periodically.
pub struct A2CTrainer<V: VectorEnv, E> {
    collector: RolloutCollector<V>,
    agent: A2CAgent,
    eval_env: E,
    config: A2CConfig,
}

impl<V, E> A2CTrainer<V, E>
where
    V: VectorEnv<Observation = Vec<f64>, Action = usize>,
    E: Environment<Observation = Vec<f64>, Action = usize>,
{
    pub fn new(envs: V, eval_env: E, config: A2CConfig) -> Result<Self> {
        config.validate()?;
        anyhow::ensure!(
            config.num_envs == envs.len(),
            "config expects {} env replicas, vector env has {}",
            config.num_envs,
            envs.len()
        );
        let agent = A2CAgent::new(envs.observation_dim(), envs.action_dim(), &config)?;
        let collector = RolloutCollector::new(envs)?;
        Ok(Self {
            collector,
            agent,
            eval_env,
            config,
        })
    }

    pub fn train(&mut self) -> Result<TrainingReport> {
        let mut report = TrainingReport::default();
        let interval = self.config.eval_interval;

        while self.collector.frames() < self.config.max_frames {
            let frames_before = self.collector.frames();
            let rollout = self.collector.collect(&mut self.agent, self.config.num_steps)?;
            report.episode_returns.extend(rollout.finished_episodes);

            let stats = self
                .agent
                .learn(rollout.segment, self.collector.current_obs())?;
            report.updates += 1;
            report.last_stats = Some(stats);

            let frame = self.collector.frames();
            if frame / interval > frames_before / interval {
                let mean_reward = self.evaluate()?;
                info!(frame, mean_reward, "evaluation");
                report.eval_rewards.push((frame, mean_reward));
            }
        }
        report.frames = self.collector.frames();

        if let Some(path) = &self.config.checkpoint {
            self.agent.save(path)?;
            info!(path = %path.display(), "saved checkpoint");
        }
        Ok(report)
    }

    /// Mean reward over `eval_episodes` held-out episodes.
    pub fn evaluate(&mut self) -> Result<f64> {
        let episodes = self.config.eval_episodes;
        if self.config.greedy_eval {
            evaluate(&mut self.eval_env, &mut Greedy(&self.agent), episodes)
        } else {
            evaluate(&mut self.eval_env, &mut self.agent, episodes)
        }
    }

    pub fn agent(&self) -> &A2CAgent {
        &self.agent
    }
}

#[derive(Debug, Clone, Default)]
pub struct DDPGReport {
    pub episodes: usize,
    /// Training reward per episode, terminal override included.
    pub episode_rewards: Vec<f64>,
    /// `(episode, mean evaluation reward)` pairs.
    pub eval_rewards: Vec<(usize, f64)>,
    pub updates: usize,
    pub last_stats: Option<DDPGStats>,
    pub solved: bool,
}

/// Drives the DDPG-style agent one episode at a time, learning once per
/// terminated episode.
pub struct DDPGTrainer<E> {
    env: E,
    agent: DDPGAgent,
    config: DDPGConfig,
}

impl<E> DDPGTrainer<E>
where
    E: Environment<Observation = Vec<f64>, Action = usize>,
{
    pub fn new(env: E, config: DDPGConfig) -> Result<Self> {
        config.validate()?;
        let agent = DDPGAgent::new(env.observation_dim(), env.action_dim(), &config)?;
        Ok(Self { env, agent, config })
    }

    /// Runs until `max_episodes` is reached or the solve threshold is met.
    /// Without either, it never returns.
    pub fn run(&mut self) -> Result<DDPGReport> {
        let mut report = DDPGReport::default();

        loop {
            if let Some(max) = self.config.max_episodes {
                if report.episodes >= max {
                    break;
                }
            }
            report.episodes += 1;
            let episode = report.episodes;

            let episode_reward = self.run_episode(episode, &mut report)?;
            report.episode_rewards.push(episode_reward);

            let Some(interval) = self.config.eval_interval else {
                continue;
            };
            if episode % interval != 0 {
                continue;
            }
            let mean_reward = evaluate(&mut self.env, &mut self.agent, self.config.eval_episodes)?;
            info!(episode, mean_reward, "evaluation");
            report.eval_rewards.push((episode, mean_reward));

            if self.config.solve_threshold.is_some_and(|t| mean_reward >= t) {
                if let Some(path) = &self.config.checkpoint {
                    self.agent.save_actor(path)?;
                    info!(path = %path.display(), "saved actor checkpoint");
                }
                report.solved = true;
                break;
            }
        }
        Ok(report)
    }

    fn run_episode(&mut self, episode: usize, report: &mut DDPGReport) -> Result<f64> {
        let mut s0 = self.env.reset().context("resetting env")?;
        let mut episode_reward = 0.0;

        for _ in 0..self.config.max_episode_steps {
            let a0 = self.agent.act(&s0)?;
            let action = self.agent.sample_env_action(&a0)?;
            let step = self.env.step(action).context("stepping env")?;

            // CartPole-specific: a terminated episode is recorded as a penalty.
            let reward = if step.done {
                self.config.terminal_reward
            } else {
                step.reward
            };
            self.agent
                .put(Transition::new(s0, a0, reward, step.obs.clone(), step.done));
            episode_reward += reward;

            if step.done {
                if let Some(stats) = self.agent.learn()? {
                    report.updates += 1;
                    report.last_stats = Some(stats);
                }
                info!(
                    episode,
                    episode_reward,
                    eps = self.agent.eps(),
                    "episode finished"
                );
                break;
            }
            s0 = step.obs;
        }
        Ok(episode_reward)
    }

    pub fn agent(&self) -> &DDPGAgent {
        &self.agent
    }
}
