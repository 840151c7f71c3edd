use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::SampleWindow;

/// Decoded mono audio ready for playback.
#[derive(Debug, Clone)]
pub struct Track {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Track {
    /// Decode a WAV file, downmixing all channels to mono.
    pub fn from_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .context("Corrupt float sample data")?,
            hound::SampleFormat::Int => {
                let full_scale = (1u64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / full_scale))
                    .collect::<Result<_, _>>()
                    .context("Corrupt integer sample data")?
            }
        };

        let samples = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect::<Vec<_>>();

        info!(
            "Decoded {} ({} Hz, {} ch, {:.1}s)",
            path.display(),
            spec.sample_rate,
            channels,
            samples.len() as f32 / spec.sample_rate as f32
        );

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Pure sine tone at half amplitude.
    pub fn tone(frequency: f32, sample_rate: u32, seconds: f32) -> Self {
        let len = (sample_rate as f32 * seconds.max(0.0)) as usize;
        let step = std::f64::consts::TAU * frequency as f64 / sample_rate as f64;
        let samples = (0..len)
            .map(|n| (0.5 * (step * n as f64).sin()) as f32)
            .collect();
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate.max(1) as f64)
    }
}

/// Where played samples go. Writing must pace playback in real time.
trait Sink: Send {
    fn write(&mut self, samples: &[f32]) -> Result<()>;
}

/// Paces on the wall clock without producing sound.
struct ClockSink {
    sample_rate: u32,
    started: Option<Instant>,
    written: u64,
}

impl Sink for ClockSink {
    fn write(&mut self, samples: &[f32]) -> Result<()> {
        let started = *self.started.get_or_insert_with(Instant::now);
        self.written += samples.len() as u64;
        let due = Duration::from_secs_f64(self.written as f64 / self.sample_rate as f64);
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            thread::sleep(wait);
        }
        Ok(())
    }
}

#[cfg(feature = "pulse")]
mod pulse_sink {
    use anyhow::{anyhow, Result};
    use libpulse_binding as pulse;
    use libpulse_simple_binding as psimple;
    use pulse::def::BufferAttr;
    use pulse::sample::{Format, Spec};
    use pulse::stream::Direction;

    pub struct PulseSink {
        pulse: psimple::Simple,
        bytes: Vec<u8>,
    }

    impl PulseSink {
        pub fn connect(sample_rate: u32) -> Result<Self> {
            let spec = Spec {
                format: Format::F32le,
                channels: 1,
                rate: sample_rate,
            };

            if !spec.is_valid() {
                return Err(anyhow!("Invalid PulseAudio sample spec"));
            }

            // Keep the server-side buffer short so the analysis window
            // published after each write stays close to what is audible.
            let target_bytes = (sample_rate as usize / 20) * std::mem::size_of::<f32>();
            let attr = BufferAttr {
                maxlength: u32::MAX,
                tlength: target_bytes as u32,
                prebuf: u32::MAX,
                minreq: u32::MAX,
                fragsize: u32::MAX,
            };

            let pulse = psimple::Simple::new(
                None,               // Use default server
                "auraviz",          // Application name
                Direction::Playback,
                None,               // Default sink
                "audio-visualizer", // Stream description
                &spec,
                None, // Default channel map
                Some(&attr),
            )
            .map_err(|e| anyhow!("Failed to connect to PulseAudio: {:?}", e))?;

            Ok(Self {
                pulse,
                bytes: Vec::new(),
            })
        }
    }

    impl super::Sink for PulseSink {
        fn write(&mut self, samples: &[f32]) -> Result<()> {
            self.bytes.clear();
            self.bytes
                .extend(samples.iter().flat_map(|s| s.to_le_bytes()));
            self.pulse
                .write(&self.bytes)
                .map_err(|e| anyhow!("PulseAudio write error: {:?}", e))
        }
    }
}

fn open_sink(sample_rate: u32) -> Box<dyn Sink> {
    #[cfg(feature = "pulse")]
    {
        match pulse_sink::PulseSink::connect(sample_rate) {
            Ok(sink) => {
                info!("Playing through PulseAudio at {} Hz", sample_rate);
                return Box::new(sink);
            }
            Err(e) => warn!("{}; visualizing without sound output", e),
        }
    }

    Box::new(ClockSink {
        sample_rate,
        started: None,
        written: 0,
    })
}

/// Handle to a playing track. Dropping it stops playback.
pub struct Playback {
    // Keep the thread handle to ensure it stays alive
    _playback_thread: thread::JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl Playback {
    /// Start playing `track` on a background thread.
    ///
    /// After every chunk is handed to the sink, the last `window` samples are
    /// published on `sender` for the analyser to pick up.
    pub fn start(
        track: Track,
        window: usize,
        chunk_frames: usize,
        sender: watch::Sender<SampleWindow>,
    ) -> Result<Self> {
        if track.sample_rate == 0 {
            return Err(anyhow!("Track has a sample rate of 0 Hz"));
        }
        if chunk_frames == 0 {
            return Err(anyhow!("chunk_frames must be greater than zero"));
        }

        let stop_flag = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let finished_clone = finished.clone();

        let playback_thread = thread::Builder::new()
            .name("auraviz-playback".into())
            .spawn(move || {
                let sink = open_sink(track.sample_rate);
                Self::playback_loop(sink, &track, window, chunk_frames, &sender, &stop_clone);
                // Let the analyser decay back to silence.
                let _ = sender.send(Arc::new(Vec::new()));
                finished_clone.store(true, Ordering::Relaxed);
            })
            .context("Failed to spawn playback thread")?;

        Ok(Self {
            _playback_thread: playback_thread,
            stop_flag,
            finished,
        })
    }

    fn playback_loop(
        mut sink: Box<dyn Sink>,
        track: &Track,
        window: usize,
        chunk_frames: usize,
        sender: &watch::Sender<SampleWindow>,
        stop_flag: &AtomicBool,
    ) {
        let mut position = 0;
        while position < track.samples.len() {
            if stop_flag.load(Ordering::Relaxed) {
                debug!("Stop flag set, ending playback loop");
                return;
            }

            let end = (position + chunk_frames).min(track.samples.len());
            if let Err(e) = sink.write(&track.samples[position..end]) {
                warn!("{}", e);
                return;
            }
            position = end;

            let start = position.saturating_sub(window);
            if sender
                .send(Arc::new(track.samples[start..position].to_vec()))
                .is_err()
            {
                debug!("Analyser dropped, stopping playback");
                return;
            }
        }
        info!("Playback finished");
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}
