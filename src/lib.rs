pub mod audio;
pub mod cli;
pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod ipc;
pub mod renderer;
pub mod scheduler;
pub mod visualizer;
