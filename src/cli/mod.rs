//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the copper binary.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::chunking::{DateRange, UsageOptions};
use crate::models::EntityListQuery;
use crate::pagination::{ErrorPolicy, DEFAULT_PAGE_LIMIT};
use crate::reports::{
    AggregateUsageReport, AppDetailReport, AppSummaryReport, BulkReport, GatewayListReport,
    GridLatestReport, GridReadingsReport, MeterListReport, MeterReadingsReport, MeterUsageReport,
    PremiseListReport, ReportBuilder,
};

/// Command-line utilities to interact with Copper Cloud.
#[derive(Parser, Debug)]
#[command(name = "copper", about = "Copper Cloud CLI", version)]
pub struct Cli {
    /// Dump HTTP requests and responses.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Suppress printing results to the console.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Write the report to a CSV file.
    #[arg(long, global = true, value_name = "FILE")]
    pub csv_output_file: Option<PathBuf>,

    /// Page size for API queries.
    #[arg(long, global = true, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub query_limit: Option<u32>,

    /// IANA timezone used to cut date ranges, instead of each meter's own.
    #[arg(long, global = true, env = "COPPER_TIMEZONE", value_parser = parse_timezone)]
    pub timezone: Option<Tz>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn page_limit(&self) -> u32 {
        self.query_limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Latest value of every meter.
    Bulk {
        /// Add each meter's address (one extra request per meter).
        #[arg(long)]
        detailed: bool,
    },

    /// Premise commands.
    Premise {
        #[command(subcommand)]
        action: ListCommand,
    },

    /// Meter commands.
    Meter {
        #[command(subcommand)]
        action: MeterCommand,
    },

    /// Gateway commands.
    Gateway {
        #[command(subcommand)]
        action: ListCommand,
    },

    /// Grid telemetry commands.
    Grid {
        #[command(subcommand)]
        action: GridCommand,
    },

    /// Usage summed over every meter.
    Usage {
        #[command(flatten)]
        range: RangeArgs,

        /// Sample granularity.
        #[arg(long, default_value = "day")]
        granularity: String,
    },

    /// Commands for the consumer app login.
    App {
        #[command(subcommand)]
        action: AppCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// List all entities.
    List {
        /// Only entities in this postal code.
        #[arg(long)]
        postal_code: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum MeterCommand {
    /// List all meters.
    List {
        /// Only meters in this postal code.
        #[arg(long)]
        postal_code: Option<String>,
    },

    /// Download usage of every meter, one CSV per meter.
    Usage {
        #[command(flatten)]
        range: RangeArgs,

        /// Sample granularity.
        #[arg(long, default_value = "hour")]
        granularity: String,

        /// Days covered by one request.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        step_days: u32,

        /// Directory for the per-meter CSV files.
        #[arg(long, default_value = "generated")]
        output_dir: PathBuf,

        /// What to do when one request fails.
        #[arg(long, value_enum, default_value_t = OnError::Continue)]
        on_error: OnError,
    },

    /// Download readings of every meter, one CSV per meter.
    Readings {
        #[command(flatten)]
        range: RangeArgs,

        /// Directory for the per-meter CSV files.
        #[arg(long, default_value = "generated")]
        output_dir: PathBuf,

        /// What to do when one request fails.
        #[arg(long, value_enum, default_value_t = OnError::Abort)]
        on_error: OnError,
    },
}

#[derive(Subcommand, Debug)]
pub enum GridCommand {
    /// Most recent reading of every gateway.
    Latest,

    /// Readings over a date range.
    Readings {
        #[command(flatten)]
        range: RangeArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Latest value of every meter on the account.
    Summary {
        /// Sample granularity.
        #[arg(long, default_value = "bihour")]
        granularity: String,
    },

    /// Instant usage of every premise and today's series of every meter.
    Detail {
        /// Sample granularity.
        #[arg(long, default_value = "bihour")]
        granularity: String,
    },
}

/// A `[start, end)` date range.
#[derive(Args, Debug, Clone, Copy)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD or RFC 3339).
    #[arg(value_parser = parse_date)]
    pub start: NaiveDate,

    /// Day after the last one (YYYY-MM-DD or RFC 3339).
    #[arg(value_parser = parse_date)]
    pub end: NaiveDate,
}

impl From<RangeArgs> for DateRange {
    fn from(args: RangeArgs) -> Self {
        DateRange::new(args.start, args.end)
    }
}

/// Failure handling for multi-request downloads.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnError {
    /// Log the failure and move on.
    Continue,
    /// Stop at the first failure.
    Abort,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Continue => ErrorPolicy::Continue,
            OnError::Abort => ErrorPolicy::Abort,
        }
    }
}

impl Command {
    /// The report builder that runs this command.
    pub fn into_report(self) -> Box<dyn ReportBuilder> {
        match self {
            Command::Bulk { detailed } => Box::new(BulkReport { detailed }),
            Command::Premise {
                action: ListCommand::List { postal_code },
            } => Box::new(PremiseListReport {
                query: EntityListQuery { postal_code },
            }),
            Command::Gateway {
                action: ListCommand::List { postal_code },
            } => Box::new(GatewayListReport {
                query: EntityListQuery { postal_code },
            }),
            Command::Meter { action } => match action {
                MeterCommand::List { postal_code } => Box::new(MeterListReport {
                    query: EntityListQuery { postal_code },
                }),
                MeterCommand::Usage {
                    range,
                    granularity,
                    step_days,
                    output_dir,
                    on_error,
                } => Box::new(MeterUsageReport {
                    range: range.into(),
                    options: UsageOptions {
                        granularity,
                        step_days,
                        policy: on_error.into(),
                    },
                    output_dir,
                }),
                MeterCommand::Readings {
                    range,
                    output_dir,
                    on_error,
                } => Box::new(MeterReadingsReport {
                    range: range.into(),
                    policy: on_error.into(),
                    output_dir,
                }),
            },
            Command::Grid { action } => match action {
                GridCommand::Latest => Box::new(GridLatestReport),
                GridCommand::Readings { range } => Box::new(GridReadingsReport {
                    range: range.into(),
                }),
            },
            Command::Usage { range, granularity } => Box::new(AggregateUsageReport {
                range: range.into(),
                granularity,
            }),
            Command::App { action } => match action {
                AppCommand::Summary { granularity } => Box::new(AppSummaryReport { granularity }),
                AppCommand::Detail { granularity } => Box::new(AppDetailReport { granularity }),
            },
        }
    }
}

/// Parse `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| format!("'{raw}' is not a date (expected YYYY-MM-DD or RFC 3339)"))
}

fn parse_timezone(raw: &str) -> Result<Tz, String> {
    crate::config::parse_timezone(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_date("2024-01-02"), Ok(expected));
        assert_eq!(parse_date("2024-01-02T00:00:00Z"), Ok(expected));
        assert_eq!(parse_date("2024-01-02T23:00:00-07:00"), Ok(expected));
        assert!(parse_date("01/02/2024").is_err());
    }

    #[test]
    fn test_on_error_into_policy() {
        assert_eq!(ErrorPolicy::from(OnError::Continue), ErrorPolicy::Continue);
        assert_eq!(ErrorPolicy::from(OnError::Abort), ErrorPolicy::Abort);
    }

    #[test]
    fn test_into_report_names() {
        let cli = Cli::try_parse_from(["copper", "meter", "usage", "2024-01-01", "2024-01-04"]).unwrap();
        assert_eq!(cli.command.into_report().name(), "meter usage");

        let cli = Cli::try_parse_from(["copper", "app", "summary"]).unwrap();
        let report = cli.command.into_report();
        assert_eq!(report.name(), "app summary");
        assert_eq!(report.flow(), crate::AuthFlow::App);
    }
}
