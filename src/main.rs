use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auraviz::audio::Track;
use auraviz::cli::Args;
use auraviz::config::Config;
use auraviz::{display, ipc};

/// Length of the generated test tone.
const TONE_SECONDS: f32 = 60.0;
const TONE_SAMPLE_RATE: u32 = 44_100;

/// Logs go to stderr or a file; stdout belongs to the terminal UI.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("auraviz=info".parse()?);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "auraviz", &mut io::stdout());
        return Ok(());
    }

    init_logging(args.log_file.as_deref())?;

    if args.init_config {
        let path = Config::init_default_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // Load or create config
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    config.merge_args(&args);

    if let Some(ref line) = args.send {
        let path = config
            .control
            .socket_path
            .clone()
            .unwrap_or_else(ipc::socket_path);
        let response = ipc::send_command(&path, line).await?;
        println!("{}", response);
        if let Some(message) = response.strip_prefix("err: ") {
            anyhow::bail!("{}", message);
        }
        return Ok(());
    }

    let track = if let Some(ref path) = args.file {
        info!("Loading {}", path.display());
        Some(Track::from_wav(path)?)
    } else if args.tone.is_some() {
        Some(Track::tone(config.audio.tone_hz, TONE_SAMPLE_RATE, TONE_SECONDS))
    } else {
        None
    };

    info!(
        "Starting auraviz: {} / {}",
        config.render.mode, config.render.theme
    );
    display::terminal::run(config, track).await
}
