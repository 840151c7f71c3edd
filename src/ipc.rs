use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::audio::Sampler;
use crate::color::ThemeRegistry;
use crate::scheduler::{ControlEvent, FrameScheduler};
use crate::visualizer::RenderMode;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Commands sent from IPC server to render loop
#[derive(Debug)]
pub enum IpcCommand {
    Control {
        event: ControlEvent,
        reply: oneshot::Sender<String>,
    },
    Status { reply: oneshot::Sender<String> },
    ListModes { reply: oneshot::Sender<String> },
    ListThemes { reply: oneshot::Sender<String> },
    Ping { reply: oneshot::Sender<String> },
}

/// Get the socket path for IPC
pub fn socket_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        PathBuf::from(dir).join("auraviz.sock")
    } else {
        PathBuf::from("/tmp/auraviz.sock")
    }
}

/// Parse a protocol line into an IpcCommand
fn parse_command(
    line: &str,
    themes: &ThemeRegistry,
    reply: oneshot::Sender<String>,
) -> Result<IpcCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["status"] => Ok(IpcCommand::Status { reply }),
        ["list", "modes"] => Ok(IpcCommand::ListModes { reply }),
        ["list", "themes"] => Ok(IpcCommand::ListThemes { reply }),
        ["ping"] => Ok(IpcCommand::Ping { reply }),
        _ => {
            let event = ControlEvent::parse(line, themes)?;
            Ok(IpcCommand::Control { event, reply })
        }
    }
}

/// Process an IPC command against the render loop's scheduler
pub fn process_ipc_command<S: Sampler>(cmd: IpcCommand, scheduler: &mut FrameScheduler<S>) {
    match cmd {
        IpcCommand::Control { event, reply } => {
            scheduler.apply(event);
            let _ = reply.send(format!("ok: {}", scheduler.state().summary()));
        }
        IpcCommand::Status { reply } => {
            let state = scheduler.state();
            let _ = reply.send(format!(
                "ok: {} size={}x{} frames={}",
                state.summary(),
                state.width,
                state.height,
                scheduler.frames_rendered(),
            ));
        }
        IpcCommand::ListModes { reply } => {
            let names: Vec<&str> = RenderMode::all().iter().map(|m| m.name()).collect();
            let _ = reply.send(format!("ok: {}", names.join(",")));
        }
        IpcCommand::ListThemes { reply } => {
            let names = scheduler.themes().names();
            let _ = reply.send(format!("ok: {}", names.join(",")));
        }
        IpcCommand::Ping { reply } => {
            let _ = reply.send("ok: pong".to_string());
        }
    }
}

/// Handle a single client connection
async fn handle_client(
    stream: UnixStream,
    cmd_tx: mpsc::Sender<IpcCommand>,
    themes: ThemeRegistry,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();
    buf_reader.read_line(&mut line).await?;
    let line = line.trim();

    if line.is_empty() {
        return Ok(());
    }
    debug!("IPC request: {}", line);

    let (reply_tx, reply_rx) = oneshot::channel();

    let command = match parse_command(line, &themes, reply_tx) {
        Ok(cmd) => cmd,
        Err(e) => {
            writer.write_all(format!("err: {}\n", e).as_bytes()).await?;
            return Ok(());
        }
    };

    cmd_tx
        .send(command)
        .await
        .map_err(|_| anyhow::anyhow!("Render loop has shut down"))?;

    let response = reply_rx
        .await
        .unwrap_or_else(|_| "err: internal error".to_string());

    writer.write_all(format!("{}\n", response).as_bytes()).await?;
    Ok(())
}

/// Bind the control socket, replacing a stale one from a previous run.
pub fn bind(path: &Path) -> Result<UnixListener> {
    let _ = std::fs::remove_file(path);
    let listener = UnixListener::bind(path)
        .with_context(|| format!("Failed to bind IPC socket {}", path.display()))?;
    info!("IPC server listening on {}", path.display());
    Ok(listener)
}

/// Accept clients forever, forwarding their commands to the render loop.
pub async fn serve(
    listener: UnixListener,
    cmd_tx: mpsc::Sender<IpcCommand>,
    themes: ThemeRegistry,
) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        let cmd_tx = cmd_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, cmd_tx, themes).await {
                debug!("IPC client error: {}", e);
            }
        });
    }
}

/// Send a command to a running auraviz instance (client mode)
pub async fn send_command(path: &Path, line: &str) -> Result<String> {
    let stream = tokio::time::timeout(CLIENT_TIMEOUT, UnixStream::connect(path))
        .await
        .context("Connection timed out")?
        .context("Could not connect to auraviz. Is it running?")?;

    let (reader, mut writer) = stream.into_split();

    writer.write_all(format!("{}\n", line).as_bytes()).await?;
    writer.shutdown().await?;

    let mut buf_reader = BufReader::new(reader);
    let mut response = String::new();

    tokio::time::timeout(CLIENT_TIMEOUT, buf_reader.read_line(&mut response))
        .await
        .context("Response timed out")?
        .context("Failed to read response")?;

    Ok(response.trim().to_string())
}
