//! sass-spec CLI binary.
//!
//! Entry point for the `sass-spec` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use sspec_cli::exit::{exit_code, summary_exit_code};
use sspec_cli::{build_adapter, execute_run, write_summary, Cli};
use sspec_core::{StderrLogger, Verbosity};
use sspec_fs::RealFixtureStore;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let args = cli.run;

    let logger = StderrLogger::new(Verbosity::from_count(args.verbose));
    let store = RealFixtureStore;
    let adapter = build_adapter(&args);

    match execute_run(&args, &store, &adapter, &logger) {
        Ok(result) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = write_summary(&mut stdout, &result.summary) {
                eprintln!("error: {}", e);
            }
            ExitCode::from(summary_exit_code(&result.summary) as u8)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(&e) as u8)
        }
    }
}
