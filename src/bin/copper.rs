//! Copper Cloud CLI binary.
//!
//! A command-line interface for downloading data from Copper Cloud.

use std::process::ExitCode;

use clap::Parser;
use coppercloud::cli::Cli;
use coppercloud::output::{render_table, write_report_csv};
use coppercloud::progress::Ticker;
use coppercloud::reports::{Report, ReportContext};
use coppercloud::{Config, CopperClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> coppercloud::Result<()> {
    let page_limit = cli.page_limit();
    let builder = cli.command.into_report();

    let config = Config::from_env(builder.flow())?.with_debug(cli.debug);
    let config = match cli.timezone {
        Some(tz) => config.with_timezone(Some(tz)),
        None => config,
    };
    let client = CopperClient::connect(&config).await?;

    tracing::debug!(command = builder.name(), "building report");
    let ctx = ReportContext {
        client: &client,
        page_limit,
        progress: &Ticker,
    };
    let report = builder.build(&ctx).await?;

    if !cli.quiet {
        print_report(&report);
    }
    if let Some(path) = &cli.csv_output_file {
        write_report_csv(path, &report)?;
    }

    println!("complete!");
    Ok(())
}

fn print_report(report: &Report) {
    println!("\n\n{}:\n", report.title);
    println!("{}\n", render_table(report));
}
