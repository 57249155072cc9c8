use std::path::PathBuf;

use anyhow::{Context, Result};
use blockworld_gym::{
    save_png, training_chart, BlockWorldEnv, Env, NativeBlocksEngine, QLearningTrainer, RunConfig, StartSelection,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StartArg {
    Fixed,
    UniformRandom,
}

impl From<StartArg> for StartSelection {
    fn from(a: StartArg) -> Self {
        match a {
            StartArg::Fixed => StartSelection::Fixed,
            StartArg::UniformRandom => StartSelection::UniformRandom,
        }
    }
}

#[derive(Parser)]
#[command(name = "blockworld-train")]
#[command(about = "Train a tabular Q-learning agent on the BlockWorld environment", long_about = None)]
struct Cli {
    /// TOML run configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Discount factor
    #[arg(long)]
    gamma: Option<f64>,

    /// Initial exploration rate
    #[arg(long)]
    epsilon: Option<f64>,

    /// Fraction of epsilon removed after each episode
    #[arg(long)]
    decay: Option<f64>,

    /// Truncate episodes after this many steps
    #[arg(long)]
    max_steps: Option<u32>,

    /// Seed for the agent RNG
    #[arg(long)]
    seed: Option<u64>,

    /// How reset picks its start configuration
    #[arg(long, value_enum)]
    start_selection: Option<StartArg>,

    /// State index every reset starts from with `--start-selection fixed`
    #[arg(long)]
    fixed_start: Option<usize>,

    /// Log every state the agent visits
    #[arg(long)]
    render: bool,

    /// Output path of the training chart
    #[arg(long)]
    chart: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => RunConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(v) = cli.episodes { cfg.agent.episodes = v; }
    if let Some(v) = cli.gamma { cfg.agent.gamma = v; }
    if let Some(v) = cli.epsilon { cfg.agent.epsilon = v; }
    if let Some(v) = cli.decay { cfg.agent.decay = v; }
    if let Some(v) = cli.max_steps { cfg.agent.max_steps_per_episode = Some(v); }
    if let Some(v) = cli.seed { cfg.agent.seed = v; }
    if let Some(v) = cli.start_selection { cfg.env.start_selection = v.into(); }
    if let Some(v) = cli.fixed_start { cfg.env.fixed_start = Some(v); }
    if let Some(v) = cli.chart { cfg.chart_path = v; }
    cfg.env.render |= cli.render;
    cfg.validate()?;

    let initial = cfg.initial_world.clone();
    let mut env = BlockWorldEnv::open(cfg.env.clone(), || NativeBlocksEngine::with_initial(&initial))
        .context("opening BlockWorld environment")?;
    let trainer = QLearningTrainer::new(cfg.agent.clone())?;

    let result = trainer.run_with(&mut env, |stats| {
        println!(
            "episode #{} / {}: done in {} steps, return {}",
            stats.episode + 1,
            cfg.agent.episodes,
            stats.steps,
            stats.total_reward
        );
    });
    env.close().context("closing engine session")?;
    let report = result.context("training aborted")?;

    let returns = report.returns();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    info!("mean return {mean:.2}, final epsilon {:.6}", report.final_epsilon);

    let chart = training_chart(&returns, &report.steps(), 800, 400);
    match save_png(&cfg.chart_path, &chart) {
        Ok(()) => info!("wrote {}", cfg.chart_path.display()),
        Err(e) => warn!("training chart not written: {e}"),
    }
    Ok(())
}
