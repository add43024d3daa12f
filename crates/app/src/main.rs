use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use reel_core::model::Slide;
use services::{
    AppServices, ChunkingConfig, Clock, FsVoiceoverStore, IngestConfig, Upload, VoiceoverStore,
};
use storage::repository::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

mod preview;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingInput { command: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingInput { command } => write!(f, "{command} requires an input file"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUrl { raw } => write!(f, "invalid --voice-base-url value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  reel ingest <document> [--out <slides.json>] [--voice-dir <dir>]");
    eprintln!("              [--voice-base-url <url>] [--max-chunks <n>] [--no-shuffle]");
    eprintln!("  reel preview <slides.json> [--db <sqlite_url>] [--narration-secs <s>]");
    eprintln!("  reel volume [<0.0-1.0>] [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:reel.sqlite3");
    eprintln!("  --voice-dir voiceovers");
    eprintln!("  --max-chunks 8");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REEL_DB_URL, REEL_AI_API_KEY, REEL_AI_BASE_URL, REEL_AI_MODEL,");
    eprintln!("  REEL_TTS_MODEL, REEL_TTS_VOICE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ingest,
    Preview,
    Volume,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ingest" => Some(Self::Ingest),
            "preview" => Some(Self::Preview),
            "volume" => Some(Self::Volume),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Preview => "preview",
            Self::Volume => "volume",
        }
    }
}

struct Args {
    db_url: String,
    input: Option<String>,
    out: Option<PathBuf>,
    voice_dir: PathBuf,
    voice_base_url: Option<Url>,
    max_chunks: usize,
    shuffle: bool,
    narration_secs: f64,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("REEL_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://reel.sqlite3".into(), normalize_sqlite_url),
            input: None,
            out: None,
            voice_dir: PathBuf::from("voiceovers"),
            voice_base_url: None,
            max_chunks: ChunkingConfig::default().max_chunks,
            shuffle: true,
            narration_secs: preview::PreviewOptions::default().narration_secs,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--out" => parsed.out = Some(require_value(args, "--out")?.into()),
                "--voice-dir" => parsed.voice_dir = require_value(args, "--voice-dir")?.into(),
                "--voice-base-url" => {
                    let value = require_value(args, "--voice-base-url")?;
                    let url = Url::parse(&value).map_err(|_| ArgsError::InvalidUrl { raw: value })?;
                    parsed.voice_base_url = Some(url);
                }
                "--max-chunks" => {
                    parsed.max_chunks =
                        parse_number(require_value(args, "--max-chunks")?, "--max-chunks")?;
                }
                "--narration-secs" => {
                    parsed.narration_secs =
                        parse_number(require_value(args, "--narration-secs")?, "--narration-secs")?;
                }
                "--no-shuffle" => parsed.shuffle = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with("--") && parsed.input.is_none() => parsed.input = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if matches!(cmd, Command::Ingest | Command::Preview) && parsed.input.is_none() {
            return Err(ArgsError::MissingInput {
                command: cmd.name(),
            });
        }
        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(cmd, &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let clock = Clock::default_clock();
    let services = AppServices::from_storage(&storage, clock);

    match cmd {
        Command::Ingest => ingest(&services, parsed).await,
        Command::Preview => {
            let input = parsed.input.unwrap_or_default();
            let raw = tokio::fs::read_to_string(&input).await?;
            let slides: Vec<Slide> = serde_json::from_str(&raw)?;
            let preferences = services.preferences();
            let prefs = preferences.load().await?;
            let options = preview::PreviewOptions {
                narration_secs: parsed.narration_secs,
                ..preview::PreviewOptions::default()
            };
            let views = preview::run(slides, prefs, &options)?;
            let total = preferences.record_views(views).await?;
            println!("viewed {views} slides ({total} all time)");
            Ok(())
        }
        Command::Volume => {
            let preferences = services.preferences();
            match parsed.input {
                Some(raw) => {
                    let value: f64 = parse_number(raw, "volume")?;
                    let volume = preferences.set_volume(value).await?;
                    println!("volume set to {:.2}", volume.value());
                }
                None => {
                    let prefs = preferences.load().await?;
                    println!("volume {:.2}", prefs.volume.value());
                    println!("slides viewed {}", prefs.slides_viewed);
                }
            }
            Ok(())
        }
    }
}

async fn ingest(services: &AppServices, args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if !services.ai().enabled() {
        return Err("ingest needs REEL_AI_API_KEY to be set".into());
    }
    let input = PathBuf::from(args.input.unwrap_or_default());
    let bytes = tokio::fs::read(&input).await?;
    let file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let voiceovers: Arc<dyn VoiceoverStore> = match args.voice_base_url {
        Some(base_url) => Arc::new(FsVoiceoverStore::new(&args.voice_dir, base_url)),
        None => Arc::new(FsVoiceoverStore::local(&args.voice_dir)?),
    };
    let config = IngestConfig {
        chunking: ChunkingConfig {
            max_chunks: args.max_chunks,
            ..ChunkingConfig::default()
        },
        shuffle_quiz_options: args.shuffle,
        ..IngestConfig::default()
    };

    let outcome = services
        .ingest(config, voiceovers)
        .ingest(Upload { file_name, bytes })
        .await?;
    for skipped in &outcome.report.skipped_chunks {
        eprintln!("skipped chunk {}: {}", skipped.index + 1, skipped.reason);
    }

    let json = serde_json::to_string_pretty(&outcome.slides)?;
    match args.out {
        Some(path) => {
            tokio::fs::write(&path, json).await?;
            info!(path = %path.display(), slides = outcome.slides.len(), "wrote slides");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
