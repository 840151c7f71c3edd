use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

use crate::visualizer::RenderMode;

#[derive(Parser, Debug, Default)]
#[command(name = "auraviz")]
#[command(author, version, about = "Terminal audio spectrum visualizer")]
pub struct Args {
    /// WAV file to play and visualize
    pub file: Option<PathBuf>,

    /// Play a sine tone at this frequency instead of a file
    #[arg(long, value_name = "HZ", conflicts_with = "file")]
    pub tone: Option<f32>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Render mode: bars, waves, circle, spectrum
    #[arg(short, long)]
    pub mode: Option<RenderMode>,

    /// Theme: minimal, neon, retro, rainbow, ocean, fire
    #[arg(short, long)]
    pub theme: Option<String>,

    /// Start with the particle overlay enabled
    #[arg(long)]
    pub particles: bool,

    /// Start with the animated background pattern enabled
    #[arg(long)]
    pub pattern: bool,

    /// Target frames per second
    #[arg(long)]
    pub fps: Option<u32>,

    /// FFT size (power of two, 32-32768)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Disable the IPC control socket
    #[arg(long)]
    pub no_ipc: bool,

    /// Write a default config file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Send a command to a running instance and print the reply
    #[arg(long, value_name = "CMD")]
    pub send: Option<String>,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
