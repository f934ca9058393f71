//! sprintcast CLI - sprint timelines and completion projections.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sprintcast_core::{parse_date, Configuration, DateStats, InputEvent, OutputEvent, VelocityStats};
use sprintcast_progress::{next_sprint_boundary, CompletionEstimator, TimelineBuilder, TimelineProjection};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sprintcast")]
#[command(about = "Sprint velocity and completion projections", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reconstructed timeline, one line per day
    Timeline {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Project completion dates for one day of the timeline
    Project {
        #[command(flatten)]
        source: SourceArgs,
        /// Day to project (defaults to the last day)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
        /// Unestimated work factors as LOW,HIGH
        #[arg(long, value_parser = parse_factors)]
        factors: Option<[f64; 2]>,
        /// Fixed velocity as AVERAGE,MIN,MAX
        #[arg(long, value_parser = parse_velocity)]
        velocity: Option<VelocityStats>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the first sprint boundary after a date
    NextBoundary {
        /// Any sprint start date
        #[arg(long, value_parser = parse_date_arg)]
        boundary: NaiveDate,
        /// Sprint length in days
        #[arg(long, default_value = "14")]
        sprint_days: u32,
        /// Reference date (defaults to today)
        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
}

/// Where the events and configuration come from.
#[derive(Args)]
struct SourceArgs {
    /// JSON file with an array of input events
    #[arg(long)]
    input: PathBuf,
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Any sprint start date
    #[arg(long, value_parser = parse_date_arg)]
    boundary: Option<NaiveDate>,
    /// Sprint length in days
    #[arg(long)]
    sprint_days: Option<u32>,
    /// Points per unestimated item
    #[arg(long)]
    points_per_item: Option<f64>,
    /// Number of recent sprints used for velocity
    #[arg(long)]
    window: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Timeline { source } => {
            let config = load_config(&source)?;
            let events = build_timeline(&source.input, &config)?;

            for event in &events {
                println!("{}", format_day(event));
            }
        }
        Commands::Project { source, date, factors, velocity, json } => {
            let mut config = load_config(&source)?;
            if let Some(factors) = factors {
                config.unestimated_velocity_factors = factors;
            }
            if velocity.is_some() {
                config.velocity_overrides = velocity;
            }
            config.validate()?;

            let events = build_timeline(&source.input, &config)?;
            let event = match date {
                Some(date) => events
                    .iter()
                    .find(|e| e.date == date)
                    .ok_or_else(|| anyhow!("{} is outside the timeline", date))?,
                None => events.last().ok_or_else(|| anyhow!("No input events"))?,
            };

            let projection = CompletionEstimator::new(config).estimate(event);

            if json {
                println!("{}", serde_json::to_string_pretty(&projection)?);
            } else {
                print_projection(&projection);
            }
        }
        Commands::NextBoundary { boundary, sprint_days, date } => {
            if sprint_days == 0 {
                return Err(anyhow!("Sprint length must be at least one day"));
            }

            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            println!("{}", next_sprint_boundary(boundary, sprint_days, date));
        }
    }

    Ok(())
}

fn load_config(source: &SourceArgs) -> Result<Configuration> {
    let mut config = match &source.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str::<Configuration>(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => {
            let boundary = source
                .boundary
                .ok_or_else(|| anyhow!("--boundary is required without --config"))?;
            Configuration::new(boundary)
        }
    };

    if let Some(boundary) = source.boundary {
        config.any_sprint_boundary = boundary;
    }
    if let Some(days) = source.sprint_days {
        config.days_in_sprint = days;
    }
    if let Some(points) = source.points_per_item {
        config.points_per_unestimated_item = points;
    }
    if source.window.is_some() {
        config.velocity_window = source.window;
    }

    config.validate()?;
    Ok(config)
}

fn build_timeline(input: &Path, config: &Configuration) -> Result<Vec<OutputEvent>> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read events {}", input.display()))?;
    let input_events: Vec<InputEvent> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid events {}", input.display()))?;

    info!("Loaded {} input events from {}", input_events.len(), input.display());

    let events = TimelineBuilder::from_config(config).build(&input_events)?;
    Ok(events)
}

fn format_day(event: &OutputEvent) -> String {
    let flags = format!(
        "{}{}",
        if event.is_sprint_boundary { 'S' } else { '-' },
        if event.is_generated { 'g' } else { '-' },
    );

    let velocity = match event.average_velocities {
        Some(v) => format!("{:.1} [{:.1} - {:.1}]", v.average, v.min, v.max),
        None => "n/a".to_string(),
    };

    format!(
        "{} {} completed {:>7.1} pending {:>6.1} active {:>6.1} estimated {:>7.1} unestimated {:>7.1} velocity {}",
        event.date,
        flags,
        event.total_points_completed,
        event.total_points_pending,
        event.total_points_active,
        event.total_points_estimated,
        event.total_points_unestimated,
        velocity,
    )
}

fn format_dates(dates: Option<DateStats>) -> String {
    match dates {
        Some(d) => format!("{} (best {}, worst {})", d.average, d.min, d.max),
        None => "no projection".to_string(),
    }
}

fn print_projection(projection: &TimelineProjection) {
    println!("Projection for {}", projection.date);
    println!("  Next sprint: {}", projection.next_sprint_start);
    if let Some(v) = projection.velocity_overrides {
        println!("  Velocity override: {:.1} [{:.1} - {:.1}]", v.average, v.min, v.max);
    }
    println!("  Estimated: {}", format_dates(projection.estimated));
    println!("  Remaining: {}", format_dates(projection.remaining));

    for team in &projection.teams {
        println!("  Team {}:", team.team);
        println!("    Estimated: {}", format_dates(team.projection.estimated));
        println!("    Remaining: {}", format_dates(team.projection.remaining));
    }
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}'", s))
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|e| format!("'{}': {}", part, e)))
        .collect::<Result<Vec<_>, _>>()?;

    values
        .try_into()
        .map_err(|values: Vec<f64>| format!("expected {} values, got {}", N, values.len()))
}

fn parse_factors(s: &str) -> Result<[f64; 2], String> {
    parse_numbers::<2>(s)
}

fn parse_velocity(s: &str) -> Result<VelocityStats, String> {
    let [average, min, max] = parse_numbers::<3>(s)?;
    Ok(VelocityStats::new(average, min, max))
}
