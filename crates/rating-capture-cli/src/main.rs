use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rating_capture::{
    scan_buffer, AppendOutcome, BufferScan, CaptureConfig, ChangeInterceptor, ChangeKind, Entity,
    ItemId, Rating, RatingValue, TracingDiagnostics, UserId, NEW_PREFIX, PROTOCOL_VERSION,
    UPDATE_PREFIX,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("TOML configuration file");

    Command::new("rating-capture")
        .version(rating_capture::VERSION)
        .about("Rating change buffer tooling")
        .subcommand_required(true)
        .subcommand(
            Command::new("record")
                .about("Append a rating change as if the persistence layer reported it")
                .arg(
                    Arg::new("user")
                        .long("user")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("User id"),
                )
                .arg(
                    Arg::new("item")
                        .long("item")
                        .required(true)
                        .value_parser(value_parser!(u64))
                        .help("Item id"),
                )
                .arg(
                    Arg::new("rating")
                        .long("rating")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Rating value"),
                )
                .arg(
                    Arg::new("update")
                        .long("update")
                        .action(ArgAction::SetTrue)
                        .help("Record an update instead of a new rating"),
                )
                .arg(config_arg.clone()),
        )
        .subcommand(
            Command::new("inspect")
                .about("Summarize a buffer file without modifying it")
                .arg(
                    Arg::new("path")
                        .long("path")
                        .value_parser(value_parser!(PathBuf))
                        .help("Buffer file (defaults to the configured path)"),
                )
                .arg(config_arg)
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("protocol").about("Print the record prefixes and protocol version"))
}

fn load_config(args: &ArgMatches) -> Result<CaptureConfig> {
    match args.get_one::<PathBuf>("config") {
        Some(path) => CaptureConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(CaptureConfig::default()),
    }
}

fn record(args: &ArgMatches) -> Result<ExitCode> {
    let config = load_config(args)?;
    let user = *args.get_one::<u64>("user").context("missing --user")?;
    let item = *args.get_one::<u64>("item").context("missing --item")?;
    let value = *args.get_one::<f64>("rating").context("missing --rating")?;
    let value = RatingValue::new(value).context("invalid --rating")?;

    let entity = Entity::Rating(Rating::new(UserId(user), ItemId(item), value));
    let interceptor = ChangeInterceptor::from_config(&config, TracingDiagnostics::shared());

    let outcome = if args.get_flag("update") {
        interceptor.on_after_update(&entity)
    } else {
        interceptor.on_after_save(&entity)
    };

    match outcome {
        Some(AppendOutcome::Written) => {
            println!("recorded into {}", config.buffer.path.display());
            Ok(ExitCode::SUCCESS)
        }
        Some(AppendOutcome::Unsynced) => {
            eprintln!(
                "recorded into {} but not synced, see log for details",
                config.buffer.path.display()
            );
            Ok(ExitCode::FAILURE)
        }
        Some(AppendOutcome::Dropped) | None => {
            eprintln!("record dropped, see log for details");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[derive(Debug, Serialize)]
struct MalformedReport {
    line: usize,
    content: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    path: PathBuf,
    protocol_version: String,
    created: usize,
    updated: usize,
    malformed: Vec<MalformedReport>,
    truncated_tail: bool,
}

impl InspectReport {
    fn new(path: &Path, scan: &BufferScan) -> Self {
        Self {
            path: path.to_path_buf(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            created: scan.count(ChangeKind::Created),
            updated: scan.count(ChangeKind::Updated),
            malformed: scan
                .malformed
                .iter()
                .map(|m| MalformedReport {
                    line: m.line_no,
                    content: m.content.clone(),
                    error: m.error.to_string(),
                })
                .collect(),
            truncated_tail: scan.truncated_tail,
        }
    }

    fn generate_text(&self) -> String {
        let mut out = format!(
            "Buffer: {}\nProtocol: {}\nCreated: {}\nUpdated: {}\nMalformed: {}\nTruncated tail: {}\n",
            self.path.display(),
            self.protocol_version,
            self.created,
            self.updated,
            self.malformed.len(),
            if self.truncated_tail { "yes" } else { "no" },
        );
        for m in &self.malformed {
            out.push_str(&format!("  line {}: {} ({})\n", m.line, m.content, m.error));
        }
        out
    }
}

fn inspect(args: &ArgMatches) -> Result<ExitCode> {
    let config = load_config(args)?;
    let path = args
        .get_one::<PathBuf>("path")
        .cloned()
        .unwrap_or(config.buffer.path);

    let scan = scan_buffer(&path).with_context(|| format!("scanning {}", path.display()))?;
    let report = InspectReport::new(&path, &scan);

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.generate_text());
    }

    Ok(if report.malformed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn protocol() -> ExitCode {
    println!("Protocol version: {PROTOCOL_VERSION}");
    println!("Created prefix: {NEW_PREFIX}");
    println!("Updated prefix: {UPDATE_PREFIX}");
    ExitCode::SUCCESS
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    match matches.subcommand() {
        Some(("record", args)) => record(args),
        Some(("inspect", args)) => inspect(args),
        Some(("protocol", _)) => Ok(protocol()),
        _ => Ok(ExitCode::FAILURE),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(&cli().get_matches()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
