//! Loads the decorated Tiago model and prints a summary of it.
//!
//! The model directories are taken from the `EXAMPLE_ROBOT_DATA_MODEL_DIR` and
//! `ROS_PACKAGE_PATH` environment variables.
//!
//! Usage: `tiago_info [--gaze] [--config <loader.toml>]`

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tiago_descriptors::{
    loader::{LoaderConfig, RobotLoader},
    markers::decorate,
    model_elements::frame_elements::FrameType,
    model_path::ModelPathResolver,
    robot::Robot,
    Error,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "tiago_info")]
#[command(about = "Loads the decorated Tiago model and prints a summary of it")]
#[command(version)]
struct Args {
    /// Add the gaze marker to the head camera
    #[arg(long)]
    gaze: bool,

    /// Path to a TOML file with the loader configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load(args: &Args) -> Result<Robot, Error> {
    let config = match &args.config {
        Some(path) => LoaderConfig::from_file(path)?,
        None => LoaderConfig::default(),
    };
    info!(config = ?config, "Loading robot");

    let resolver = ModelPathResolver::from_environment();
    let loaded = RobotLoader::new(config).load(&resolver)?;
    info!(path = %loaded.urdf_path().display(), "Loaded description");

    let mut robot = decorate(loaded.into_robot(), args.gaze)?;
    if let Some(q0) = robot.q0().cloned() {
        robot.update_placements(&q0)?;
    }

    Ok(robot)
}

fn print_summary(robot: &Robot) {
    let model = robot.model();

    println!("robot:   {}", model.name());
    println!("joints:  {}", model.njoints());
    println!("frames:  {}", model.nframes());
    println!("nq / nv: {} / {}", model.nq(), model.nv());
    println!("geoms:   {}", robot.visual_model().ngeoms());

    for frame in model
        .frames()
        .filter(|f| f.frame_type() == FrameType::OperationalFrame)
    {
        println!(
            "marker:  {} on joint {}",
            frame.name(),
            frame.parent_joint().index()
        );
    }

    if let Some(q0) = robot.q0() {
        println!("q0:      {:?}", q0.as_slice());
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install the log subscriber: {}", e);
        return ExitCode::FAILURE;
    }

    match load(&args) {
        Ok(robot) => {
            print_summary(&robot);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Failed to load the Tiago model");
            ExitCode::FAILURE
        }
    }
}
