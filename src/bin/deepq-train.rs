//! Train the linear Q-function on the deterministic test environment.
use std::path::PathBuf;

use clap::Parser;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use deepq::config::DqnConfig;
use deepq::env::{EnvTest, Environment};
use deepq::error::Result;
use deepq::model::DqnModel;
use deepq::trainer::Trainer;
use deepq::types::ObservationShape;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON configuration file; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for parameter initialization, the environment and exploration
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Override the number of training steps
    #[arg(long)]
    steps: Option<usize>,

    /// Height and width of the square test environment frames
    #[arg(long, default_value_t = 5)]
    frame_size: usize,
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => DqnConfig::load(path)?,
        None => DqnConfig::default(),
    };
    if let Some(steps) = args.steps {
        config = config.nsteps_train(steps);
    }
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut env = EnvTest::new(ObservationShape::new(args.frame_size, args.frame_size, 1), &mut rng)?;
    let shape = env.observation_shape().stacked(config.state_history);
    let mut model = DqnModel::new(shape, env.num_actions(), &config, &mut rng)?;

    let mut trainer = Trainer::with_seed(config, args.seed.wrapping_add(1))?;
    let mut exploration = trainer.exploration(env.num_actions());
    let mut lr_schedule = trainer.lr_schedule();
    let summary = trainer.train(&mut model, &mut env, &mut exploration, &mut lr_schedule)?;

    info!(
        "Finished: {} steps, {} episodes, {} updates, final evaluation {:.2}",
        summary.steps,
        summary.episodes,
        summary.updates,
        summary.eval_scores.last().copied().unwrap_or(f32::NAN)
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
