// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use perf_cli::{
    compute_trend_line, deep_link_to_record, parse_trend_line_kind, record_to_deep_link,
    summarize_build_requests, summarize_pane,
};
use perf_client::{ClientConfig, RemoteApiClient};
use perf_core::{MeasurementPoint, PerfError, TimeSeries};
use perf_model::ModelStore;
use perf_pane::{ChartPane, ChartPaneState, PaneConfig, PaneRuntime};
use perf_trendline::{LocalSegmentation, TrendLineKind};
use serde::Serialize;
use serde_json::Value;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "PERFDASH_LOG";

struct Cli {
    command: Command,
}

enum Command {
    Trendline(TrendlineArgs),
    Triggerables(RemoteArgs),
    BuildRequests(BuildRequestsArgs),
    MarkOutlier(MarkOutlierArgs),
    Analyze(AnalyzeArgs),
    Pane(PaneArgs),
    State(StateArgs),
}

#[derive(Debug, Default)]
struct RemoteArgs {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Debug)]
struct TrendlineArgs {
    input: PathBuf,
    kind: TrendLineKind,
    parameters: Vec<f64>,
    output: Option<PathBuf>,
}

#[derive(Debug)]
struct BuildRequestsArgs {
    remote: RemoteArgs,
    triggerable: u64,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct MarkOutlierArgs {
    remote: RemoteArgs,
    runs: Vec<u64>,
    marked_outlier: bool,
}

#[derive(Debug)]
struct AnalyzeArgs {
    remote: RemoteArgs,
    name: String,
    start_run: u64,
    end_run: u64,
}

#[derive(Debug)]
struct PaneArgs {
    remote: RemoteArgs,
    platform: Option<u64>,
    metric: Option<u64>,
    state: Option<String>,
    kind: Option<TrendLineKind>,
    debounce_ms: Option<u64>,
}

#[derive(Debug)]
enum StateArgs {
    Decode { link: String, output: Option<PathBuf> },
    Encode { record: String, output: Option<PathBuf> },
}

#[derive(Debug)]
enum CliError {
    Perf(PerfError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
    InvalidInput(String),
    NotSupported(String),
}

impl CliError {
    fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Perf(err) => err.code(),
            Self::InvalidInput(_) => "invalid_input",
            Self::NotSupported(_) => "not_supported",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Perf(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) => write!(f, "{msg}"),
            Self::NotSupported(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Perf(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidInput(_) | Self::NotSupported(_) => None,
        }
    }
}

impl From<PerfError> for CliError {
    fn from(value: PerfError) -> Self {
        Self::Perf(value)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkOutlierOutput {
    runs: Vec<u64>,
    marked_outlier: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOutput {
    task_id: u64,
    name: String,
    start_run: u64,
    end_run: u64,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), CliError> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let Some(cli) = parse_cli(&args)? else {
        return Ok(());
    };

    match cli.command {
        Command::Trendline(args) => handle_trendline(args),
        Command::Triggerables(args) => handle_triggerables(args),
        Command::BuildRequests(args) => handle_build_requests(args),
        Command::MarkOutlier(args) => handle_mark_outlier(args),
        Command::Analyze(args) => handle_analyze(args),
        Command::Pane(args) => handle_pane(args),
        Command::State(args) => handle_state(args),
    }
}

fn parse_cli(args: &[String]) -> Result<Option<Cli>, CliError> {
    let Some(command_name) = args.first() else {
        print_root_help();
        return Ok(None);
    };

    if matches!(command_name.as_str(), "-h" | "--help") {
        print_root_help();
        return Ok(None);
    }
    if matches!(command_name.as_str(), "-V" | "--version") {
        print_version();
        return Ok(None);
    }

    let rest = &args[1..];
    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name.as_str())?;
        return Ok(None);
    }

    let command = match command_name.as_str() {
        "trendline" => Command::Trendline(parse_trendline_args(rest)?),
        "triggerables" => Command::Triggerables(parse_remote_only_args(rest)?),
        "build-requests" => Command::BuildRequests(parse_build_requests_args(rest)?),
        "mark-outlier" => Command::MarkOutlier(parse_mark_outlier_args(rest)?),
        "analyze" => Command::Analyze(parse_analyze_args(rest)?),
        "pane" => Command::Pane(parse_pane_args(rest)?),
        "state" => Command::State(parse_state_args(rest)?),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: {COMMANDS}"
            )));
        }
    };

    Ok(Some(Cli { command }))
}

const COMMANDS: &str =
    "trendline, triggerables, build-requests, mark-outlier, analyze, pane, state";

/// Consumes `--config` and `--output`; returns false for any other flag.
fn take_remote_flag(
    remote: &mut RemoteArgs,
    flag: &str,
    inline_value: Option<String>,
    tokens: &[String],
    idx: &mut usize,
) -> Result<bool, CliError> {
    match flag {
        "--config" => {
            remote.config = Some(PathBuf::from(take_flag_value(flag, inline_value, tokens, idx)?));
            Ok(true)
        }
        "--output" => {
            remote.output = Some(PathBuf::from(take_flag_value(flag, inline_value, tokens, idx)?));
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn parse_trendline_args(tokens: &[String]) -> Result<TrendlineArgs, CliError> {
    let mut input = None;
    let mut kind = TrendLineKind::default();
    let mut parameters = Vec::new();
    let mut output = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                input = Some(PathBuf::from(take_flag_value(flag, inline_value, tokens, &mut idx)?));
            }
            "--type" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                kind = parse_kind_arg(&raw, flag)?;
            }
            "--param" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                parameters.push(parse_f64_arg(&raw, flag)?);
            }
            "--output" => {
                output = Some(PathBuf::from(take_flag_value(flag, inline_value, tokens, &mut idx)?));
            }
            _ => return Err(unknown_flag("trendline", flag)),
        }
        idx += 1;
    }

    Ok(TrendlineArgs {
        input: input.ok_or_else(|| CliError::invalid_input("trendline requires --input"))?,
        kind,
        parameters,
        output,
    })
}

fn parse_remote_only_args(tokens: &[String]) -> Result<RemoteArgs, CliError> {
    let mut remote = RemoteArgs::default();
    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        if !take_remote_flag(&mut remote, flag, inline_value, tokens, &mut idx)? {
            return Err(unknown_flag("triggerables", flag));
        }
        idx += 1;
    }
    Ok(remote)
}

fn parse_build_requests_args(tokens: &[String]) -> Result<BuildRequestsArgs, CliError> {
    let mut remote = RemoteArgs::default();
    let mut triggerable = None;
    let mut now = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--triggerable" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                triggerable = Some(parse_u64_arg(&raw, flag)?);
            }
            "--now" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                let millis = raw.parse::<i64>().map_err(|_| {
                    CliError::invalid_input(format!("{flag} expects Unix milliseconds, got '{raw}'"))
                })?;
                now = Some(DateTime::from_timestamp_millis(millis).ok_or_else(|| {
                    CliError::invalid_input(format!("{flag} is out of range: {millis}"))
                })?);
            }
            _ => {
                if !take_remote_flag(&mut remote, flag, inline_value, tokens, &mut idx)? {
                    return Err(unknown_flag("build-requests", flag));
                }
            }
        }
        idx += 1;
    }

    Ok(BuildRequestsArgs {
        remote,
        triggerable: triggerable
            .ok_or_else(|| CliError::invalid_input("build-requests requires --triggerable"))?,
        now,
    })
}

fn parse_mark_outlier_args(tokens: &[String]) -> Result<MarkOutlierArgs, CliError> {
    let mut remote = RemoteArgs::default();
    let mut runs = Vec::new();
    let mut marked_outlier = true;

    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--run" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                runs.push(parse_u64_arg(&raw, flag)?);
            }
            "--unmark" => {
                ensure_no_inline_value(flag, inline_value)?;
                marked_outlier = false;
            }
            _ => {
                if !take_remote_flag(&mut remote, flag, inline_value, tokens, &mut idx)? {
                    return Err(unknown_flag("mark-outlier", flag));
                }
            }
        }
        idx += 1;
    }

    if runs.is_empty() {
        return Err(CliError::invalid_input("mark-outlier requires at least one --run"));
    }
    Ok(MarkOutlierArgs {
        remote,
        runs,
        marked_outlier,
    })
}

fn parse_analyze_args(tokens: &[String]) -> Result<AnalyzeArgs, CliError> {
    let mut remote = RemoteArgs::default();
    let mut name = None;
    let mut start_run = None;
    let mut end_run = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--name" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                if raw.trim().is_empty() {
                    return Err(CliError::invalid_input("--name must not be empty"));
                }
                name = Some(raw.trim().to_string());
            }
            "--start-run" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                start_run = Some(parse_u64_arg(&raw, flag)?);
            }
            "--end-run" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                end_run = Some(parse_u64_arg(&raw, flag)?);
            }
            _ => {
                if !take_remote_flag(&mut remote, flag, inline_value, tokens, &mut idx)? {
                    return Err(unknown_flag("analyze", flag));
                }
            }
        }
        idx += 1;
    }

    let (Some(name), Some(start_run), Some(end_run)) = (name, start_run, end_run) else {
        return Err(CliError::invalid_input(
            "analyze requires --name, --start-run and --end-run",
        ));
    };
    if start_run == end_run {
        return Err(CliError::invalid_input(
            "analyze needs two distinct runs; --start-run equals --end-run",
        ));
    }
    Ok(AnalyzeArgs {
        remote,
        name,
        start_run,
        end_run,
    })
}

fn parse_pane_args(tokens: &[String]) -> Result<PaneArgs, CliError> {
    let mut args = PaneArgs {
        remote: RemoteArgs::default(),
        platform: None,
        metric: None,
        state: None,
        kind: None,
        debounce_ms: None,
    };

    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--platform" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.platform = Some(parse_u64_arg(&raw, flag)?);
            }
            "--metric" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.metric = Some(parse_u64_arg(&raw, flag)?);
            }
            "--state" => {
                args.state = Some(take_flag_value(flag, inline_value, tokens, &mut idx)?);
            }
            "--type" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.kind = Some(parse_kind_arg(&raw, flag)?);
            }
            "--debounce-ms" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.debounce_ms = Some(parse_u64_arg(&raw, flag)?);
            }
            _ => {
                if !take_remote_flag(&mut args.remote, flag, inline_value, tokens, &mut idx)? {
                    return Err(unknown_flag("pane", flag));
                }
            }
        }
        idx += 1;
    }

    let has_pair = args.platform.is_some() && args.metric.is_some();
    if args.state.is_none() && !has_pair {
        return Err(CliError::invalid_input(
            "pane requires --platform and --metric, or --state",
        ));
    }
    if args.state.is_some() && (args.platform.is_some() || args.metric.is_some()) {
        return Err(CliError::invalid_input(
            "pane accepts either --state or --platform/--metric, not both",
        ));
    }
    Ok(args)
}

fn parse_state_args(tokens: &[String]) -> Result<StateArgs, CliError> {
    let mut decode = None;
    let mut encode = None;
    let mut output = None;

    let mut idx = 0;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--decode" => decode = Some(take_flag_value(flag, inline_value, tokens, &mut idx)?),
            "--encode" => encode = Some(take_flag_value(flag, inline_value, tokens, &mut idx)?),
            "--output" => {
                output = Some(PathBuf::from(take_flag_value(flag, inline_value, tokens, &mut idx)?));
            }
            _ => return Err(unknown_flag("state", flag)),
        }
        idx += 1;
    }

    match (decode, encode) {
        (Some(link), None) => Ok(StateArgs::Decode { link, output }),
        (None, Some(record)) => Ok(StateArgs::Encode { record, output }),
        _ => Err(CliError::invalid_input(
            "state requires exactly one of --decode <link> or --encode <record>",
        )),
    }
}

fn unknown_flag(command: &str, flag: &str) -> CliError {
    CliError::invalid_input(format!("unknown flag '{flag}' for {command}"))
}

fn split_flag(token: &str) -> Result<(&str, Option<String>), CliError> {
    if !token.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "unexpected positional argument '{token}'; expected --flag value"
        )));
    }
    if let Some((flag, value)) = token.split_once('=') {
        return Ok((flag, Some(value.to_string())));
    }
    Ok((token, None))
}

fn take_flag_value(
    flag: &str,
    inline_value: Option<String>,
    tokens: &[String],
    idx: &mut usize,
) -> Result<String, CliError> {
    if let Some(value) = inline_value {
        return Ok(value);
    }

    *idx += 1;
    let value = tokens
        .get(*idx)
        .ok_or_else(|| CliError::invalid_input(format!("{flag} requires a value")))?;
    if value.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "{flag} requires a value, but got option '{value}'"
        )));
    }
    Ok(value.clone())
}

fn ensure_no_inline_value(flag: &str, inline_value: Option<String>) -> Result<(), CliError> {
    if inline_value.is_some() {
        return Err(CliError::invalid_input(format!(
            "{flag} does not accept a value"
        )));
    }
    Ok(())
}

fn parse_u64_arg(raw: &str, flag: &str) -> Result<u64, CliError> {
    raw.parse::<u64>().map_err(|_| {
        CliError::invalid_input(format!(
            "{flag} expects a non-negative integer, got '{raw}'"
        ))
    })
}

fn parse_f64_arg(raw: &str, flag: &str) -> Result<f64, CliError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CliError::invalid_input(format!("{flag} expects a finite number, got '{raw}'")))
}

fn parse_kind_arg(raw: &str, flag: &str) -> Result<TrendLineKind, CliError> {
    parse_trend_line_kind(raw).ok_or_else(|| {
        CliError::invalid_input(format!(
            "{flag} expects a trend-line id (0, 1, 2, 3, 5) or name (none, sma, cma, ema, segmentation), got '{raw}'"
        ))
    })
}

fn print_version() {
    println!("perfdash {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "perfdash {}\n\nUSAGE:\n  perfdash <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  trendline        Compute a trend line over a local series\n  triggerables     List triggerables from the server\n  build-requests   List build requests of a triggerable\n  mark-outlier     Mark or unmark runs as outliers\n  analyze          Create an analysis task over a run range\n  pane             Open a chart pane against the server and summarize it\n  state            Convert between deep links and versioned pane records\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nENVIRONMENT:\n  PERFDASH_URL    Server URL, overrides --config\n  PERFDASH_LOG    Log filter, default 'warn'\n\nRun 'perfdash <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), CliError> {
    let remote = "  --config <path>                    Client config JSON\n  --output <path>                    Write JSON output to file";
    match command {
        "trendline" => println!(
            "USAGE:\n  perfdash trendline --input <path> [OPTIONS]\n\nOPTIONS:\n  --input <path>                     Required (.json points or .csv time,value rows)\n  --type <id|name>                   Default: sma\n  --param <float>                    Repeatable, in declaration order\n  --output <path>                    Write JSON output to file"
        ),
        "triggerables" => println!("USAGE:\n  perfdash triggerables [OPTIONS]\n\nOPTIONS:\n{remote}"),
        "build-requests" => println!(
            "USAGE:\n  perfdash build-requests --triggerable <id> [OPTIONS]\n\nOPTIONS:\n  --triggerable <u64>                Required\n  --now <unix-ms>                    Reference time for waiting times\n{remote}"
        ),
        "mark-outlier" => println!(
            "USAGE:\n  perfdash mark-outlier --run <id> [OPTIONS]\n\nOPTIONS:\n  --run <u64>                        Repeatable\n  --unmark                           Clear the outlier flag instead\n{remote}"
        ),
        "analyze" => println!(
            "USAGE:\n  perfdash analyze --name <text> --start-run <id> --end-run <id> [OPTIONS]\n\nOPTIONS:\n  --name <text>                      Task name\n  --start-run <u64>                  First run of the range\n  --end-run <u64>                    Last run of the range\n{remote}"
        ),
        "pane" => println!(
            "USAGE:\n  perfdash pane (--platform <id> --metric <id> | --state <link>) [OPTIONS]\n\nOPTIONS:\n  --platform <u64>\n  --metric <u64>\n  --state <json>                     Positional deep link to restore\n  --type <id|name>                   Trend line to apply after loading\n  --debounce-ms <u64>                Default: 500\n{remote}"
        ),
        "state" => println!(
            "USAGE:\n  perfdash state (--decode <link> | --encode <record>) [OPTIONS]\n\nOPTIONS:\n  --decode <json>                    Positional deep link to a versioned record\n  --encode <json>                    Versioned record to a positional deep link\n  --output <path>                    Write JSON output to file"
        ),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command}'; expected one of: {COMMANDS}"
            )));
        }
    }
    Ok(())
}

fn handle_trendline(args: TrendlineArgs) -> Result<(), CliError> {
    let series = load_series(args.input.as_path())?;
    let output = compute_trend_line(&series, args.kind, &args.parameters)?;
    write_json_output(&output, args.output.as_deref())
}

fn handle_triggerables(args: RemoteArgs) -> Result<(), CliError> {
    let client = connect(&args)?;
    let payload = client.fetch_triggerables()?;
    let mut store = ModelStore::new();
    let triggerables = store.set_triggerables(&payload.triggerables);
    write_json_output(&triggerables, args.output.as_deref())
}

fn handle_build_requests(args: BuildRequestsArgs) -> Result<(), CliError> {
    let client = connect(&args.remote)?;
    let mut store = ModelStore::new();
    store.load_manifest(&client.fetch_manifest()?)?;
    store.construct_build_requests_from_data(&client.fetch_build_requests(args.triggerable)?)?;
    let now = args.now.unwrap_or_else(Utc::now);
    let summaries = summarize_build_requests(&store, args.triggerable, now);
    write_json_output(&summaries, args.remote.output.as_deref())
}

fn handle_mark_outlier(args: MarkOutlierArgs) -> Result<(), CliError> {
    let client = connect(&args.remote)?;
    for run in &args.runs {
        client.update_run_status(*run, args.marked_outlier)?;
    }
    let output = MarkOutlierOutput {
        runs: args.runs,
        marked_outlier: args.marked_outlier,
    };
    write_json_output(&output, args.remote.output.as_deref())
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), CliError> {
    let client = connect(&args.remote)?;
    let task_id = client.create_analysis_task(&args.name, args.start_run, args.end_run)?;
    let output = AnalyzeOutput {
        task_id,
        name: args.name,
        start_run: args.start_run,
        end_run: args.end_run,
    };
    write_json_output(&output, args.remote.output.as_deref())
}

fn handle_pane(args: PaneArgs) -> Result<(), CliError> {
    let client = connect(&args.remote)?;
    let mut config = PaneConfig::default();
    if let Some(debounce_ms) = args.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    let mut pane = ChartPane::new(config)?;
    let effects = match (&args.state, args.platform, args.metric) {
        (Some(raw), _, _) => {
            let state = ChartPaneState::from_json_str(raw)?;
            pane.update_from_serialized_state(&state)
        }
        (None, Some(platform), Some(metric)) => pane.configure(platform, metric),
        _ => return Err(CliError::invalid_input("pane has nothing to open")),
    };

    let mut runtime = PaneRuntime::new(pane, &client, &client, &LocalSegmentation)
        .with_analysis_tasks(&client);
    runtime.dispatch(effects);
    runtime.run_until_idle();

    if let Some((platform_id, metric_id)) = runtime.pane().platform_and_metric() {
        match client.fetch_manifest() {
            Ok(manifest) => {
                let mut store = ModelStore::new();
                store.load_manifest(&manifest)?;
                if let (Some(platform), Some(metric)) =
                    (store.platform(platform_id), store.metric(metric_id))
                {
                    let (platform, metric) = (Arc::clone(platform), Arc::clone(metric));
                    runtime.apply(|pane| pane.set_entities(platform, metric).unwrap_or_default());
                }
            }
            Err(err) => debug!(error = %err, "manifest unavailable; pane has no title"),
        }
    }
    if let Some(kind) = args.kind {
        runtime.apply(|pane| pane.set_trend_line_type(kind));
    }

    let summary = summarize_pane(runtime.pane());
    write_json_output(&summary, args.remote.output.as_deref())
}

fn handle_state(args: StateArgs) -> Result<(), CliError> {
    match args {
        StateArgs::Decode { link, output } => {
            let record = deep_link_to_record(&link)?;
            write_json_output(&record, output.as_deref())
        }
        StateArgs::Encode { record, output } => {
            let link = record_to_deep_link(&record)?;
            write_json_output(&link, output.as_deref())
        }
    }
}

fn connect(args: &RemoteArgs) -> Result<RemoteApiClient, CliError> {
    let config = ClientConfig::load(args.config.as_deref())?;
    Ok(RemoteApiClient::new(config)?)
}

fn load_series(path: &Path) -> Result<TimeSeries, CliError> {
    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .ok_or_else(|| {
            CliError::not_supported(format!(
                "unable to infer input format for '{}'; expected .json or .csv",
                path.display()
            ))
        })?;
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;

    match extension.as_str() {
        "json" => parse_json_series(&raw, path),
        "csv" => parse_csv_series(&raw),
        _ => Err(CliError::not_supported(format!(
            "unsupported input format '{extension}'; expected .json or .csv"
        ))),
    }
}

/// Accepts an array of points, or of plain numbers spaced one second apart.
fn parse_json_series(raw: &str, path: &Path) -> Result<TimeSeries, CliError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|source| CliError::json(format!("invalid JSON in '{}'", path.display()), source))?;
    let Some(items) = value.as_array() else {
        return Err(CliError::invalid_input(format!(
            "'{}' must hold a JSON array",
            path.display()
        )));
    };
    if items.iter().all(Value::is_number) {
        let points = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let value = item.as_f64().unwrap_or(f64::NAN);
                MeasurementPoint::new(index as u64, index as i64 * 1_000, value)
            })
            .collect();
        return Ok(TimeSeries::from_points(points)?);
    }
    let points: Vec<MeasurementPoint> = serde_json::from_value(value)
        .map_err(|source| CliError::json(format!("invalid points in '{}'", path.display()), source))?;
    Ok(TimeSeries::from_unsorted(points)?)
}

/// `time,value` rows with an optional header; ids are row numbers.
fn parse_csv_series(raw: &str) -> Result<TimeSeries, CliError> {
    let rows = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    let skip_header = rows
        .first()
        .is_some_and(|row| row.split(',').next().is_some_and(|cell| cell.trim().parse::<f64>().is_err()));

    let mut points = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate().skip(usize::from(skip_header)) {
        let cells = row.split(',').map(str::trim).collect::<Vec<_>>();
        let [time, value] = cells.as_slice() else {
            return Err(CliError::invalid_input(format!(
                "CSV row {} must have exactly two columns (time,value); got {}",
                row_idx + 1,
                cells.len()
            )));
        };
        let time = time.parse::<i64>().map_err(|_| {
            CliError::invalid_input(format!("CSV row {} has invalid time '{time}'", row_idx + 1))
        })?;
        let value = value.parse::<f64>().map_err(|_| {
            CliError::invalid_input(format!("CSV row {} has invalid value '{value}'", row_idx + 1))
        })?;
        points.push(MeasurementPoint::new(row_idx as u64, time, value));
    }
    Ok(TimeSeries::from_unsorted(points)?)
}

fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}
