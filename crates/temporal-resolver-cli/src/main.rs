//! Command-line front door for temporal-resolver.
//!
//! Reads one JSON document (stdin or `--input`), resolves it against a
//! reference instant and prints the `TimeConvertedPayload` on stdout. Logs go
//! to stderr.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use temporal_resolver::{
    convert_fragments, convert_payload, convert_tool_arguments, parse_reference,
    FragmentRequest, ResolveOptions, TimeConvertedPayload, TimeInputPayload, ToolArguments,
    WeekStartDay, DEFAULT_MAX_NESTING_DEPTH,
};

#[derive(Parser)]
#[command(name = "temporal-resolver")]
#[command(version, about = "Resolve structured date/time references into local timestamps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Read JSON from this file instead of stdin
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Reference instant (ISO-8601); defaults to the current time
    #[arg(short, long, global = true)]
    reference: Option<String>,

    /// IANA timezone for reading the current time when --reference is absent
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// First day of the week for "this <weekday>"
    #[arg(long, global = true, value_enum, default_value_t = WeekStart::Monday)]
    week_start: WeekStart,

    /// Maximum extended_time nesting depth
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_NESTING_DEPTH)]
    max_depth: usize,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a {time_single | time_range} payload
    Payload,
    /// Resolve nested tool arguments ({start, end} with extended_time)
    Tool,
    /// Resolve a fragment list ({reasoning, parsable, elements})
    Fragments,
}

#[derive(Clone, Copy, ValueEnum)]
enum WeekStart {
    Monday,
    Sunday,
}

impl From<WeekStart> for WeekStartDay {
    fn from(w: WeekStart) -> Self {
        match w {
            WeekStart::Monday => WeekStartDay::Monday,
            WeekStart::Sunday => WeekStartDay::Sunday,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let reference = reference_instant(cli.reference.as_deref(), cli.timezone.as_deref())?;
    let options = ResolveOptions {
        week_start: cli.week_start.into(),
        max_nesting_depth: cli.max_depth,
    };
    info!("resolving against reference {reference}");

    let input = read_input(cli.input.as_deref())?;
    let result = run(&cli.command, &input, reference, &options)?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{output}");
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn reference_instant(reference: Option<&str>, timezone: Option<&str>) -> Result<NaiveDateTime> {
    match (reference, timezone) {
        (Some(reference), _) => Ok(parse_reference(reference)?),
        (None, Some(timezone)) => {
            let tz: Tz = timezone
                .parse()
                .map_err(|_| anyhow!("invalid timezone '{timezone}'"))?;
            Ok(Utc::now().with_timezone(&tz).naive_local())
        }
        (None, None) => Ok(Local::now().naive_local()),
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn run(
    command: &Command,
    input: &str,
    reference: NaiveDateTime,
    options: &ResolveOptions,
) -> Result<TimeConvertedPayload> {
    let result = match command {
        Command::Payload => {
            let payload: TimeInputPayload =
                serde_json::from_str(input).context("invalid payload JSON")?;
            debug!("payload: {payload:?}");
            convert_payload(&payload, reference, options)?
        }
        Command::Tool => {
            let args: ToolArguments =
                serde_json::from_str(input).context("invalid tool arguments JSON")?;
            debug!("tool arguments: {args:?}");
            convert_tool_arguments(&args, reference, options)?
        }
        Command::Fragments => {
            let request: FragmentRequest =
                serde_json::from_str(input).context("invalid fragment request JSON")?;
            debug!("fragment request: {request:?}");
            convert_fragments(&request, reference, options)?
        }
    };
    Ok(result)
}
