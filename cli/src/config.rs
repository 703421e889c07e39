use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use downtime_core::reliability::DEFAULT_PERIOD_MINUTES;

#[derive(Debug, Parser)]
#[command(name = "downtime")]
#[command(about = "Aggregate service-downtime incident sheets into reliability metrics")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalOptions {
    /// Analysis window in minutes that uptime is measured against
    #[arg(
        long,
        global = true,
        env = "DOWNTIME_PERIOD_MINUTES",
        default_value_t = DEFAULT_PERIOD_MINUTES
    )]
    pub period_minutes: i64,

    /// Report store path; `:memory:` keeps reports for this invocation only
    #[arg(long, global = true, env = "DOWNTIME_DB", default_value = "downtime.sqlite")]
    pub db: PathBuf,

    /// Log filter used when RUST_LOG is unset (e.g. `info`, `downtime_core=debug`)
    #[arg(long, global = true, env = "DOWNTIME_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log line format on stderr
    #[arg(
        long,
        global = true,
        env = "DOWNTIME_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Print failures as a JSON error object on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Tab-separated downtime sheet; `-` or omitted reads stdin
    pub input: Option<PathBuf>,

    /// Use the bundled demo week instead of reading input
    #[arg(long, conflicts_with = "input")]
    pub demo: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Aggregate a downtime sheet and print the full result
    Analyze {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Manage saved weekly reports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Aggregate a sheet and save its summary as a weekly report
    Save {
        #[arg(long)]
        label: String,
        /// Week start (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Week end (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// Creation timestamp (RFC3339); defaults to now
        #[arg(long)]
        created_at: Option<String>,
        #[command(flatten)]
        input: InputArgs,
    },
    /// List saved reports, newest first
    List,
    /// Delete a saved report by id
    Delete { id: String },
    /// Month-to-date rollup of saved reports
    Mtd {
        /// Reference date (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Weekly trend points and latest week-over-week indicators
    Trends,
    /// Compare two or three saved reports side by side
    Compare {
        #[arg(required = true, num_args = 2..=3)]
        ids: Vec<String>,
    },
}
