use clap::Parser;
use convgen::cli::Cli;
use convgen::run::{self, RunError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // CONVGEN_LOG follows RUST_LOG syntax; diagnostics are warnings.
    let filter = EnvFilter::try_from_env("CONVGEN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<ExitCode, RunError> {
    let config = cli.run_config()?;

    if cli.dump_universe {
        let (universe, _) = run::load(&config)?;
        println!("{:#}", universe.dump());
        return Ok(ExitCode::SUCCESS);
    }

    let summary = run::run(&config, cli.mode())?;
    if cli.dry_run {
        for artifact in &summary.artifacts {
            println!("==> {} <==", artifact.path.display());
            print!("{}", artifact.content);
        }
    }
    for failure in &summary.failures {
        eprintln!("error: {}: {}", failure.package, failure.error);
    }
    eprintln!(
        "convgen: {} file(s) rendered, {} written, {} warning(s)",
        summary.artifacts.len(),
        summary.written.len(),
        summary.diagnostics.len()
    );

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
