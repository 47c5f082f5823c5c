// ABOUTME: CLI that regenerates the podcast feed from a TOML config and JSON episode manifest.
// ABOUTME: `build` writes the RSS file when it changed; `check` reports every violation without writing.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use podcast_feed::{
    check_guid_stability, load_manifest, read_published_episodes, Episode, FeedConfig,
    ValidationError, Violation,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(name = "podcast-feed", version)]
#[command(about = "Build a podcast RSS feed from an episode manifest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the inputs and write the feed file.
    Build(BuildArgs),
    /// Validate the inputs and report every problem without writing anything.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Feed config (TOML).
    #[arg(short, long, default_value = "feed.toml")]
    config: PathBuf,

    /// Episode manifest (JSON); overrides `paths.manifest` from the config.
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Previously published feed to check guid stability against.
    /// Defaults to the current output file when it exists.
    #[arg(long)]
    previous: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output file; overrides `paths.output` from the config.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the feed to stdout instead of writing a file.
    #[arg(long, default_value_t = false)]
    stdout: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Print the result as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Build(args) => run_build(&args),
        Command::Check(args) => run_check(&args),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

fn init_logging() {
    let log_environ = env_logger::Env::new()
        .filter("PODCAST_FEED_LOG")
        .write_style("PODCAST_FEED_LOG_STYLE");
    let mut log_builder = env_logger::Builder::new();

    log_builder.filter_level(log::LevelFilter::Info);
    log_builder.parse_env(log_environ);
    log_builder.init();
}

struct Loaded {
    config: FeedConfig,
    episodes: Vec<Episode>,
}

fn load_inputs(args: &InputArgs) -> Result<Loaded> {
    let config = FeedConfig::load(&args.config)?;
    let settings = config.audio_settings()?;
    let manifest = args
        .manifest
        .clone()
        .unwrap_or_else(|| config.manifest_path());
    let episodes = load_manifest(&manifest, &settings)?;
    Ok(Loaded { config, episodes })
}

/// Guid stability violations against the live feed, if one is available.
fn stability_violations(
    explicit: Option<&Path>,
    fallback: &Path,
    episodes: &[Episode],
) -> Result<Vec<Violation>> {
    let path = match explicit {
        Some(path) => path,
        None if fallback.exists() => fallback,
        None => {
            log::debug!("no published feed at {}; skipping guid check", fallback.display());
            return Ok(Vec::new());
        }
    };

    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let published = read_published_episodes(&bytes)
        .with_context(|| format!("failed to read published feed {}", path.display()))?;
    log::debug!(
        "checking {} manifest episode(s) against {} published item(s)",
        episodes.len(),
        published.len()
    );
    Ok(check_guid_stability(&published, episodes))
}

/// Builds the document, folding guid stability problems into the same report.
fn build_document(loaded: &Loaded, extra: Vec<Violation>) -> Result<String, ValidationError> {
    let built = loaded
        .config
        .builder()
        .build(&loaded.config.feed, &loaded.episodes);

    match (built, ValidationError::from_violations(extra)) {
        (Ok(xml), None) => Ok(xml),
        (Ok(_), Some(err)) => Err(err),
        (Err(mut err), extra) => {
            if let Some(extra) = extra {
                err.violations.extend(extra.violations);
            }
            Err(err)
        }
    }
}

fn run_build(args: &BuildArgs) -> Result<ExitCode> {
    let loaded = load_inputs(&args.input)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| loaded.config.output_path());

    let extra = stability_violations(args.input.previous.as_deref(), &output, &loaded.episodes)?;
    let xml = build_document(&loaded, extra)?;

    if args.stdout {
        print!("{}", xml);
        return Ok(ExitCode::SUCCESS);
    }

    if fs::read_to_string(&output).ok().as_deref() == Some(xml.as_str()) {
        log::info!("{} is up to date", output.display());
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&output, &xml).with_context(|| format!("failed to write {}", output.display()))?;

    log::info!(
        "wrote {} with {} episode(s)",
        output.display(),
        loaded.episodes.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_check(args: &CheckArgs) -> Result<ExitCode> {
    let loaded = load_inputs(&args.input)?;
    let output = loaded.config.output_path();

    let extra = stability_violations(args.input.previous.as_deref(), &output, &loaded.episodes)?;
    let violations = match build_document(&loaded, extra) {
        Ok(_) => Vec::new(),
        Err(err) => err.violations,
    };

    if args.json {
        let report = json!({
            "ok": violations.is_empty(),
            "episodes": loaded.episodes.len(),
            "violations": violations,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if violations.is_empty() {
        println!("ok: {} episode(s) valid", loaded.episodes.len());
    } else {
        for violation in &violations {
            eprintln!("{}", violation);
        }
    }

    if violations.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}
