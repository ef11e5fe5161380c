use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use welleval_core::{decision, Evaluation, Evaluator};

mod exit_codes;

#[derive(Parser)]
#[command(
    name = "welleval",
    version,
    about = "Candidate evaluator for simulation-driven well-control optimization"
)]
struct Cli {
    /// Decision-variable file, one real number per line
    in_file: PathBuf,

    /// Destination for the objective/constraint vector, one number per line
    out_file: PathBuf,

    /// Working directory holding the simulation case
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Hard deadline for the simulator subprocess, in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    std::process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let evaluator = Evaluator::new(&cli.workdir)
        .with_timeout(cli.timeout_secs.map(Duration::from_secs));

    match evaluator.evaluate(&cli.in_file) {
        Ok(Evaluation::Objectives(values)) => {
            if let Err(err) = decision::write_vector(&cli.out_file, &values) {
                error!(%err, "cannot write objective vector");
                return exit_codes::for_error(&err);
            }
            info!(
                len = values.len(),
                out = %cli.out_file.display(),
                "objective vector written"
            );
            exit_codes::SUCCESS
        }
        Ok(Evaluation::NoOp) => {
            info!("nothing to evaluate, no output written");
            exit_codes::SUCCESS
        }
        Err(err) => {
            error!(%err, "evaluation failed, no output written");
            exit_codes::for_error(&err)
        }
    }
}
