//! qrattend - QR code attendance taker for Notion meetings
//!
//! Usage:
//!   qrattend read <path>    decode the QR code in an image file
//!   qrattend write <text>   write a QR code for <text> to qr.png
//!   qrattend loop           scan the camera and record check-ins

mod capture;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use qrattend_core::config::ConfigError;
use qrattend_core::{qr, ApiClient, Config, DirectoryCache};

use capture::{CaptureLoop, FrameSource};

/// Output file for `write`
const QR_OUTPUT_FILE: &str = "qr.png";

/// Debug preview of the last captured frame
const PREVIEW_FILE: &str = "preview.png";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Read(PathBuf),
    Write(String),
    Loop,
}

/// Parse `argv`. `None` means usage should be printed.
fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str)? {
        "read" => args.get(2).map(|p| Command::Read(PathBuf::from(p))),
        "write" => args.get(2).map(|t| Command::Write(t.clone())),
        "loop" => Some(Command::Loop),
        _ => None,
    }
}

fn print_usage(program: &str) {
    println!("Usage:");
    println!("  {program} read <path>     Print the value of the QR code in an image");
    println!("  {program} write <text>    Generate a QR code image at {QR_OUTPUT_FILE}");
    println!("  {program} loop            Watch the camera and check people in");
}

/// Initialize the tracing subscriber for logging
fn init_tracing(config: Option<&Config>) {
    // RUST_LOG wins over LOG_LEVEL / ENV
    let default_filter = config.map_or_else(|| "info".to_string(), Config::log_filter);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = parse_command(&args) else {
        let program = args.first().map(String::as_str).unwrap_or("qrattend");
        print_usage(program);
        return Ok(());
    };

    let config = Config::from_env();
    init_tracing(config.as_ref().ok());
    info!("Starting Notion attendance taker");

    dispatch(command, config).await
}

/// Run `command`. Only `loop` needs a valid configuration.
async fn dispatch(command: Command, config: Result<Config, ConfigError>) -> Result<()> {
    match command {
        Command::Read(path) => read_command(&path),
        Command::Write(text) => write_command(&text),
        Command::Loop => {
            let config = config.context("Invalid configuration")?;
            loop_command(&config).await
        }
    }
}

fn read_command(path: &Path) -> Result<()> {
    let value = qr::read_qr_code(path)
        .with_context(|| format!("Error reading QR code from {}", path.display()))?;
    match value {
        Some(value) => println!("Found QR code with value {value}"),
        None => println!("No QR code found in {}", path.display()),
    }
    Ok(())
}

fn write_command(text: &str) -> Result<()> {
    println!("Generating QR Code for {text} at {QR_OUTPUT_FILE}");
    qr::write_qr_code(text, Path::new(QR_OUTPUT_FILE)).context("Error writing QR code")
}

async fn loop_command(config: &Config) -> Result<()> {
    let client = ApiClient::from_config(config).context("Failed to create Notion client")?;
    let cache = DirectoryCache::new(config.cache_enabled);
    let source = open_source(config)?;

    let mut capture = CaptureLoop::new(source, client, cache, config.poll_interval);
    if config.debug {
        capture = capture.with_preview(PathBuf::from(PREVIEW_FILE));
    }
    capture.run().await
}

#[cfg(feature = "camera")]
fn open_source(config: &Config) -> Result<Box<dyn FrameSource>> {
    let camera = capture::CameraSource::open(config.camera_index)
        .with_context(|| format!("Cannot open camera {}", config.camera_index))?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "camera"))]
fn open_source(_config: &Config) -> Result<Box<dyn FrameSource>> {
    anyhow::bail!("qrattend was built without the `camera` feature, no frame source available")
}
