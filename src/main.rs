use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod capture;
mod error;
mod run;
mod sink;

/// Headless driver for the motion-reactive fluid visualizer.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a session with synthetic capture and scripted pointer input.
    Run(run::RunArgs),
    /// Run only the capture and motion detection pipeline.
    Motion(run::MotionArgs),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Motion(args) => run::motion(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
