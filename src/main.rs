//! CLI entry point for the scoreboard attendance dashboard engine.
//!
//! Loads a class export from a file or URL, applies the requested filters and
//! prints or writes the resulting report, insights, category summary or
//! filtered records.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use scoreboard::analyzers::categories::{CategoryHierarchy, category_report};
use scoreboard::analyzers::compare::ComparisonMode;
use scoreboard::analyzers::dashboard::DashboardState;
use scoreboard::analyzers::dates::Granularity;
use scoreboard::analyzers::filter::FilterCriteria;
use scoreboard::analyzers::insights::summarize_insights;
use scoreboard::{
    config::EngineSettings,
    output::{print_pretty, write_json, write_records_csv},
    parser::load_dataset,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DATA_ENV: &str = "SCOREBOARD_DATA";

#[derive(Parser)]
#[command(name = "scoreboard")]
#[command(about = "Attendance KPIs, leaderboards and period comparisons for class exports", long_about = None)]
struct Cli {
    /// Engine settings JSON file (falls back to $SCOREBOARD_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the full dashboard report
    Report {
        #[command(flatten)]
        filters: FilterArgs,

        /// Time bucket for series
        #[arg(short, long, value_enum, default_value_t = GroupBy::Week)]
        group_by: GroupBy,

        /// How the comparison window is derived
        #[arg(short, long, value_enum, default_value_t = CompareMode::PriorPeriod)]
        compare: CompareMode,

        /// Write the report as JSON here instead of stdout (".gz" compresses)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print plain-language insights for the selection
    Insights {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Export the filtered records
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        /// Export format
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Destination file
        #[arg(short, long)]
        output: String,
    },
    /// Print the category hierarchy summary for the selection
    Categories {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// List instructors, facilities and categories available for filtering
    Options {
        /// Path to file or URL to fetch (falls back to $SCOREBOARD_DATA)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        data: Option<String>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Path to file or URL to fetch (falls back to $SCOREBOARD_DATA)
    #[arg(short, long, value_name = "FILE_OR_URL")]
    data: Option<String>,

    /// First day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Facility to include; repeat for several. An empty value selects virtual classes
    #[arg(long = "facility")]
    facilities: Vec<String>,

    /// Instructor name, exact match
    #[arg(long)]
    instructor: Option<String>,

    /// Great grandparent category to include; repeat for several
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Default the range to the month of the newest record when no dates are given
    #[arg(long, default_value_t = false)]
    latest_month: bool,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            date_from: self.from,
            date_to: self.to,
            facilities: self.facilities.iter().cloned().collect(),
            instructor: self.instructor.clone(),
            categories: self.categories.iter().cloned().collect(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Day,
    Week,
    Month,
}

impl From<GroupBy> for Granularity {
    fn from(value: GroupBy) -> Self {
        match value {
            GroupBy::Day => Granularity::Day,
            GroupBy::Week => Granularity::Week,
            GroupBy::Month => Granularity::Month,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CompareMode {
    PriorPeriod,
    YearOverYear,
    TwoYearsPrior,
}

impl From<CompareMode> for ComparisonMode {
    fn from(value: CompareMode) -> Self {
        match value {
            CompareMode::PriorPeriod => ComparisonMode::PriorPeriod,
            CompareMode::YearOverYear => ComparisonMode::YearOverYear,
            CompareMode::TwoYearsPrior => ComparisonMode::TwoYearsPrior,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/scoreboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("scoreboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = EngineSettings::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Report {
            filters,
            group_by,
            compare,
            output,
        } => {
            let mut state = build_state(&filters, settings).await?;
            state.set_granularity(group_by.into());
            state.set_comparison_mode(compare.into());

            let report = state.report();
            print_pretty(&report.metrics);

            match output {
                Some(path) => {
                    write_json(&path, &report)?;
                    info!(path = %path, "Report written");
                }
                None => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Commands::Insights { filters } => {
            let state = build_state(&filters, settings).await?;
            let view = state.view();

            for line in summarize_insights(&view, state.settings()) {
                println!("• {line}");
            }
        }
        Commands::Export {
            filters,
            format,
            output,
        } => {
            let state = build_state(&filters, settings).await?;
            let view = state.view();

            match format {
                ExportFormat::Csv => write_records_csv(&output, &view)?,
                ExportFormat::Json => write_json(&output, &view)?,
            }
            info!(path = %output, records = view.len(), "Export written");
        }
        Commands::Categories { filters } => {
            let state = build_state(&filters, settings).await?;
            let hierarchy = CategoryHierarchy::from_records(&state.view());

            print!("{}", category_report(&hierarchy));
        }
        Commands::Options { data } => {
            let source = data_source(data)?;
            let state = DashboardState::new(load_dataset(&source).await?, settings);

            println!("{}", serde_json::to_string_pretty(&state.options())?);
        }
    }

    Ok(())
}

/// The `--data` argument, or `$SCOREBOARD_DATA` when it is absent.
fn data_source(data: Option<String>) -> Result<String> {
    match data {
        Some(source) => Ok(source),
        None => std::env::var(DATA_ENV)
            .with_context(|| format!("No --data given and {DATA_ENV} is not set")),
    }
}

/// Loads the dataset and applies the filters from the command line.
#[tracing::instrument(skip_all)]
async fn build_state(filters: &FilterArgs, settings: EngineSettings) -> Result<DashboardState> {
    let source = data_source(filters.data.clone())?;
    let dataset = load_dataset(&source).await?;

    let criteria = filters.criteria();
    if let (Some(from), Some(to)) = (criteria.date_from, criteria.date_to) {
        if from > to {
            warn!(%from, %to, "Date range is inverted and will select nothing");
        }
    }

    let mut state = DashboardState::new(dataset, settings);
    state.apply(criteria);

    if filters.latest_month && filters.from.is_none() && filters.to.is_none() {
        if state.select_latest_month() {
            info!(criteria = ?state.criteria(), "Defaulted to latest month");
        } else {
            warn!("No dated records, latest month default skipped");
        }
    }

    Ok(state)
}
