use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::buffer::Buffer;
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::audio::{self, Playback, Track};
use crate::color::{Rgb, ThemeRegistry};
use crate::config::Config;
use crate::ipc::{self, IpcCommand};
use crate::renderer::Canvas;
use crate::scheduler::{ControlEvent, FrameScheduler, RenderState};
use crate::visualizer::{ParticleSystem, RenderMode};

/// Canvas pixels covered by one terminal cell. Each cell shows two stacked
/// half-block pixels, so a cell is split into a top and a bottom block.
const CELL_PIXELS_X: usize = 4;
const CELL_PIXELS_Y: usize = 8;
const HALF_BLOCK: char = '▀';

/// What a key press asks the host loop to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    Control(ControlEvent),
}

pub fn key_to_action(key: KeyEvent) -> Option<Action> {
    match key {
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        } => Some(Action::Quit),
        KeyEvent {
            code: KeyCode::Char(ch),
            ..
        } => match ch {
            'q' => Some(Action::Quit),
            '1'..='4' => {
                let index = ch as usize - '1' as usize;
                RenderMode::all()
                    .get(index)
                    .map(|mode| Action::Control(ControlEvent::SelectMode(*mode)))
            }
            'm' => Some(Action::Control(ControlEvent::NextMode)),
            't' => Some(Action::Control(ControlEvent::NextTheme)),
            'p' => Some(Action::Control(ControlEvent::ToggleParticles)),
            'b' => Some(Action::Control(ControlEvent::ToggleBackgroundPattern)),
            _ => None,
        },
        _ => None,
    }
}

pub async fn run(config: Config, track: Option<Track>) -> Result<()> {
    let themes = ThemeRegistry::default();
    config.validate(&themes)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, config, themes, track).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Start the control socket, or run without it if binding fails.
fn start_ipc(
    config: &Config,
    themes: ThemeRegistry,
) -> Option<(mpsc::Receiver<IpcCommand>, PathBuf)> {
    if !config.control.ipc {
        return None;
    }
    let path = config
        .control
        .socket_path
        .clone()
        .unwrap_or_else(ipc::socket_path);
    match ipc::bind(&path) {
        Ok(listener) => {
            let (cmd_tx, cmd_rx) = mpsc::channel(16);
            tokio::spawn(async move {
                if let Err(e) = ipc::serve(listener, cmd_tx, themes).await {
                    warn!("IPC server stopped: {}", e);
                }
            });
            Some((cmd_rx, path))
        }
        Err(e) => {
            warn!("{:#}; continuing without IPC", e);
            None
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
    themes: ThemeRegistry,
    track: Option<Track>,
) -> Result<()> {
    let settings = config.analyser_settings();
    let (window_tx, mut sampler) = audio::create_audio_pipeline(settings)?;

    // Hold the playback handle for the whole loop; dropping it stops audio.
    let playback = match track {
        Some(track) => {
            info!(
                "Playing {:.1}s at {} Hz",
                track.duration().as_secs_f32(),
                track.sample_rate
            );
            Some(
                Playback::start(track, settings.fft_size, config.audio.chunk_frames, window_tx)
                    .context("Failed to start playback")?,
            )
        }
        None => {
            info!("No audio source, rendering silence");
            sampler.disconnect();
            None
        }
    };

    let state = config.initial_state(&themes)?;
    let mut scheduler = FrameScheduler::new(sampler, themes, ParticleSystem::new(), state);
    let mut ipc = start_ipc(&config, themes);

    let mut canvas = Canvas::new(1, 1);
    let frame_interval = Duration::from_secs_f64(1.0 / config.display.fps as f64);
    let started = Instant::now();
    let mut reported_end = false;

    scheduler.start();

    'frames: loop {
        let frame_start = Instant::now();

        if let Some((cmd_rx, _)) = ipc.as_mut() {
            while let Ok(cmd) = cmd_rx.try_recv() {
                ipc::process_ipc_command(cmd, &mut scheduler);
            }
        }

        if !reported_end && playback.as_ref().is_some_and(Playback::is_finished) {
            info!("Track ended, rendering silence");
            reported_end = true;
        }

        let time = started.elapsed().as_secs_f32();
        let show_status = config.display.status_bar;
        terminal.draw(|frame| {
            let area = frame.area();
            let viz_area = if show_status && area.height > 1 {
                Rect::new(area.x, area.y + 1, area.width, area.height - 1)
            } else {
                area
            };

            canvas.resize(
                viz_area.width as usize * CELL_PIXELS_X,
                viz_area.height as usize * CELL_PIXELS_Y,
            );
            scheduler.render_frame(&mut canvas, time);
            present(&canvas, frame.buffer_mut(), viz_area);

            if show_status && area.height > 1 {
                render_status(frame.buffer_mut(), area, scheduler.state());
            }
        })?;

        // Drain input without blocking, then sleep out the rest of the frame.
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key_to_action(key) {
                    Some(Action::Quit) => break 'frames,
                    Some(Action::Control(control)) => scheduler.apply(control),
                    None => {}
                }
            }
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_interval {
            tokio::time::sleep(frame_interval - elapsed).await;
        } else {
            debug!("Frame took {:?}, over budget", elapsed);
        }
    }

    scheduler.stop();
    if let Some((_, path)) = ipc {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}

/// Average color of a `w`x`h` block of the canvas.
fn block_average(canvas: &Canvas, x0: usize, y0: usize, w: usize, h: usize) -> Rgb {
    let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            let px = canvas.get_pixel(x, y);
            r += px.r as u32;
            g += px.g as u32;
            b += px.b as u32;
        }
    }
    let n = (w * h).max(1) as u32;
    Rgb::new((r / n) as u8, (g / n) as u8, (b / n) as u8)
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Copy the canvas into `area` as half-block cells: the foreground is the
/// upper half of the cell, the background the lower half.
pub fn present(canvas: &Canvas, buf: &mut Buffer, area: Rect) {
    let half = CELL_PIXELS_Y / 2;
    for row in 0..area.height {
        for col in 0..area.width {
            let px = col as usize * CELL_PIXELS_X;
            let py = row as usize * CELL_PIXELS_Y;
            let top = block_average(canvas, px, py, CELL_PIXELS_X, half);
            let bottom = block_average(canvas, px, py + half, CELL_PIXELS_X, half);

            if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                cell.set_char(HALF_BLOCK)
                    .set_fg(to_color(top))
                    .set_bg(to_color(bottom));
            }
        }
    }
}

fn render_status(buf: &mut Buffer, area: Rect, state: &RenderState) {
    let status = format!(
        " [1-4/m]ode: {} | [t]heme: {} | [p]articles: {} | [b]g: {} | [q]uit ",
        state.mode,
        state.theme.name,
        if state.particles_enabled { "on" } else { "off" },
        if state.background_pattern { "pattern" } else { "solid" },
    );

    for (i, ch) in status.chars().enumerate() {
        if i >= area.width as usize {
            break;
        }
        if let Some(cell) = buf.cell_mut((area.x + i as u16, area.y)) {
            cell.set_char(ch);
            cell.set_fg(Color::DarkGray);
            cell.set_bg(Color::Reset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{Paint, RectF, Surface};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn digit_keys_select_modes() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('1'))),
            Some(Action::Control(ControlEvent::SelectMode(RenderMode::Bars)))
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('4'))),
            Some(Action::Control(ControlEvent::SelectMode(RenderMode::Spectrum)))
        );
        assert_eq!(key_to_action(key(KeyCode::Char('5'))), None);
    }

    #[test]
    fn toggles_and_quit() {
        assert_eq!(
            key_to_action(key(KeyCode::Char('p'))),
            Some(Action::Control(ControlEvent::ToggleParticles))
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('b'))),
            Some(Action::Control(ControlEvent::ToggleBackgroundPattern))
        );
        assert_eq!(
            key_to_action(key(KeyCode::Char('t'))),
            Some(Action::Control(ControlEvent::NextTheme))
        );
        assert_eq!(key_to_action(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn half_blocks_split_each_cell() {
        let mut canvas = Canvas::new(CELL_PIXELS_X, CELL_PIXELS_Y);
        canvas.fill_rect(
            RectF::new(0.0, 0.0, CELL_PIXELS_X as f32, (CELL_PIXELS_Y / 2) as f32),
            &Paint::Solid(Rgb::new(255, 0, 0).opaque()),
            None,
        );

        let area = Rect::new(0, 0, 1, 1);
        let mut buf = Buffer::empty(area);
        present(&canvas, &mut buf, area);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 0));
    }

    #[test]
    fn status_line_is_clipped_to_width() {
        let themes = ThemeRegistry::default();
        let state = RenderState::new(RenderMode::Circle, themes.resolve("retro").unwrap());
        let area = Rect::new(0, 0, 12, 2);
        let mut buf = Buffer::empty(area);
        render_status(&mut buf, area, &state);
        let line: String = (0..12u16).map(|x| buf[(x, 0u16)].symbol().to_string()).collect();
        assert_eq!(line, " [1-4/m]ode:");
        assert_eq!(buf[(0, 1)].symbol(), " ");
    }
}
