//! pkgadd CLI Application
//!
//! Adds dependencies to the root `package.json` and `bower.json` manifests,
//! resolving versions against a local package index.

// CLI binary needs to output to stdout/stderr
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;
mod config;
mod tracing;

use crate::cli::Commands;
use crate::tracing::{TracingConfig, TracingFormat};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;

fn main() {
    // Tracing may not be usable during a panic, so write straight to stderr.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    let exit_code = match rt.block_on(run(cli)) {
        Ok(()) => EXIT_OK,
        Err(error) => {
            eprintln!("{error:?}");
            EXIT_FAILURE
        }
    };
    std::process::exit(exit_code);
}

async fn run(cli: cli::Cli) -> miette::Result<()> {
    let format = cli.tracing_format();
    crate::tracing::init_tracing(TracingConfig {
        format,
        level: cli.level.into(),
        enable_file_location: format == TracingFormat::Dev,
        ..Default::default()
    })?;

    match cli.command {
        Commands::Add(args) => {
            let report = commands::add::execute(&args).await?;
            print!("{}", report.render());
        }
    }

    Ok(())
}
