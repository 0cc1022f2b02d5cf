use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use modc::cli::Cli;
use modc::{run, Failure};
use modc_compiler::Outcome;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    color_backtrace::install();
    init_logging();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(Outcome::Interpreted { output }) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Compiled { ir_path }) => {
            tracing::info!(path = %ir_path.display(), "wrote IR artifact");
            ExitCode::SUCCESS
        }
        Err(Failure::GuiUnavailable) => {
            eprintln!("{}", "Compilation error: the GUI editor is not available in this build".red());
            ExitCode::FAILURE
        }
        Err(Failure::Diagnostics(diagnostics)) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic.render().red());
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(false)).try_init();
}
