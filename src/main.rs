use anyhow::Result;
use cartpole_ac::cartpole::{CartPole, DEFAULT_MAX_STEPS};
use cartpole_ac::config::{A2CConfig, DDPGConfig};
use cartpole_ac::trainer::{A2CTrainer, DDPGTrainer};
use cartpole_ac::venv::DummyVectorEnv;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cartpole-ac", about = "Actor-critic training on CartPole")]
struct Cli {
    /// Defaults to `a2c` with default settings.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Vectorized advantage actor-critic.
    A2c(A2cArgs),
    /// DDPG-style actor/critic with replay and target networks.
    Ddpg(DdpgArgs),
}

#[derive(Args, Debug)]
struct A2cArgs {
    #[arg(long, default_value_t = 1)]
    num_envs: usize,
    #[arg(long, default_value_t = 20_000)]
    max_frames: usize,
    #[arg(long)]
    seed: Option<u64>,
    /// Evaluate with the most likely action instead of sampling.
    #[arg(long)]
    greedy_eval: bool,
    /// Save the trained model here (safetensors).
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

impl Default for A2cArgs {
    fn default() -> Self {
        Self {
            num_envs: 1,
            max_frames: 20_000,
            seed: None,
            greedy_eval: false,
            checkpoint: None,
        }
    }
}

#[derive(Args, Debug)]
struct DdpgArgs {
    /// Stop after this many episodes; runs forever when omitted.
    #[arg(long)]
    max_episodes: Option<usize>,
    /// Evaluate every N episodes.
    #[arg(long)]
    eval_interval: Option<usize>,
    /// Stop once the mean evaluation reward reaches this value.
    #[arg(long)]
    solve_threshold: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Save the actor here once solved (safetensors).
    #[arg(long)]
    checkpoint: Option<PathBuf>,
}

fn env_seed(seed: Option<u64>, offset: u64) -> CartPole {
    match seed {
        Some(s) => CartPole::with_seed(DEFAULT_MAX_STEPS, s.wrapping_add(offset)),
        None => CartPole::new(DEFAULT_MAX_STEPS),
    }
}

fn run_a2c(args: A2cArgs) -> Result<()> {
    let config = A2CConfig::new()
        .with_num_envs(args.num_envs)
        .with_max_frames(args.max_frames)
        .with_greedy_eval(args.greedy_eval)
        .with_seed(args.seed)
        .with_checkpoint(args.checkpoint);

    let envs: Vec<CartPole> = (0..config.num_envs as u64)
        .map(|i| env_seed(config.seed, i + 1))
        .collect();
    let venv = DummyVectorEnv::new(envs);
    let eval_env = env_seed(config.seed, 0);

    info!(num_envs = config.num_envs, max_frames = config.max_frames, "training A2C on CartPole");
    let mut trainer = A2CTrainer::new(venv, eval_env, config)?;
    let report = trainer.train()?;
    info!(
        frames = report.frames,
        updates = report.updates,
        final_eval = ?report.eval_rewards.last().map(|(_, r)| *r),
        "training finished"
    );
    Ok(())
}

fn run_ddpg(args: DdpgArgs) -> Result<()> {
    let config = DDPGConfig::new()
        .with_max_episodes(args.max_episodes)
        .with_eval(args.eval_interval, DDPGConfig::default().eval_episodes)
        .with_solve_threshold(args.solve_threshold)
        .with_seed(args.seed)
        .with_checkpoint(args.checkpoint);
    let env = env_seed(config.seed, 0);

    info!(max_episodes = ?config.max_episodes, "training DDPG on CartPole");
    let mut trainer = DDPGTrainer::new(env, config)?;
    let report = trainer.run()?;
    info!(
        episodes = report.episodes,
        updates = report.updates,
        solved = report.solved,
        "training finished"
    );
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::A2c(A2cArgs::default())) {
        Command::A2c(args) => run_a2c(args),
        Command::Ddpg(args) => run_ddpg(args),
    }
}
