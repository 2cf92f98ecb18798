//! Sound effects.
//!
//! Each cue is loaded from a WAV file once at startup. A file that is missing
//! or fails to decode is replaced by a clip synthesised with fundsp, so the
//! game always has all three sounds. Without an output device everything is
//! silent.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use fundsp::prelude64::*;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info, warn};

use crate::error::AudioError;

const SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sfx {
    Flap,
    Hit,
    Point,
}

impl Sfx {
    pub const ALL: [Sfx; 3] = [Sfx::Flap, Sfx::Hit, Sfx::Point];

    pub fn file_name(&self) -> &'static str {
        match self {
            Sfx::Flap => "sfx_wing.wav",
            Sfx::Hit => "sfx_hit.wav",
            Sfx::Point => "sfx_point.wav",
        }
    }
}

/// Outcome of loading an asset: the real thing, or a placeholder standing in
/// for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset<T> {
    Loaded(T),
    Fallback(T),
}

impl<T> Asset<T> {
    pub fn get(&self) -> &T {
        match self {
            Asset::Loaded(t) | Asset::Fallback(t) => t,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Asset::Fallback(_))
    }
}

/// Decoded PCM samples, interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl Clip {
    fn load(path: &Path) -> Result<Clip, AudioError> {
        let file = File::open(path)?;
        let decoder = Decoder::new(BufReader::new(file))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples: Vec<f32> = decoder.collect();
        if samples.is_empty() {
            return Err(AudioError::Empty);
        }
        Ok(Clip {
            channels,
            sample_rate,
            samples: samples.into(),
        })
    }

    fn render(mut unit: impl AudioUnit, seconds: f64) -> Clip {
        unit.set_sample_rate(SAMPLE_RATE as f64);
        let n = (SAMPLE_RATE as f64 * seconds) as usize;
        let samples: Vec<f32> = (0..n).map(|_| unit.get_mono()).collect();
        Clip {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            samples: samples.into(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / (std::cmp::Ord::max(self.channels, 1) as f64 * self.sample_rate as f64)
    }
}

// ── Synthesised fallbacks ───────────────────────────────────────────────────

fn synth_flap() -> Clip {
    // Short upward chirp.
    let freq = lfo(|t: f64| lerp(500.0, 900.0, (t / 0.08).min(1.0)));
    let gain = lfo(|t: f64| lerp(0.12, 0.0, (t / 0.1).min(1.0)));
    Clip::render((freq >> sine()) * gain, 0.1)
}

fn synth_hit() -> Clip {
    // Sawtooth falling from 400Hz to 80Hz while fading out.
    let freq = lfo(|t: f64| lerp(400.0, 80.0, (t / 0.4).min(1.0)));
    let gain = lfo(|t: f64| lerp(0.15, 0.0, (t / 0.5).min(1.0)));
    Clip::render((freq >> saw()) * gain, 0.5)
}

fn synth_point() -> Clip {
    // B5 then E6, with a 1ms glide between them.
    let freq = lfo(|t: f64| lerp(988.0, 1319.0, ((t - 0.08) * 1000.0).clamp(0.0, 1.0)));
    let gain = lfo(|t: f64| lerp(0.1, 0.0, (t / 0.25).min(1.0)));
    Clip::render((freq >> sine()) * gain, 0.25)
}

fn synth(sfx: Sfx) -> Clip {
    match sfx {
        Sfx::Flap => synth_flap(),
        Sfx::Hit => synth_hit(),
        Sfx::Point => synth_point(),
    }
}

// ── Bank & playback ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SoundBank {
    flap: Asset<Clip>,
    hit: Asset<Clip>,
    point: Asset<Clip>,
}

impl SoundBank {
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let load = |sfx: Sfx| {
            let path = dir.join(sfx.file_name());
            match Clip::load(&path) {
                Ok(clip) => {
                    debug!(path = %path.display(), "Loaded sound");
                    Asset::Loaded(clip)
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "Using synthesised sound");
                    Asset::Fallback(synth(sfx))
                }
            }
        };
        Self {
            flap: load(Sfx::Flap),
            hit: load(Sfx::Hit),
            point: load(Sfx::Point),
        }
    }

    pub fn get(&self, sfx: Sfx) -> &Asset<Clip> {
        match sfx {
            Sfx::Flap => &self.flap,
            Sfx::Hit => &self.hit,
            Sfx::Point => &self.point,
        }
    }
}

pub struct Audio {
    stream: Option<OutputStream>,
    bank: SoundBank,
}

impl Audio {
    /// Opens the default output device. Falls back to silence when there is
    /// none, or when `muted`.
    pub fn new(sound_dir: impl AsRef<Path>, muted: bool) -> Self {
        let bank = SoundBank::load(sound_dir);
        let stream = if muted {
            info!("Audio muted");
            None
        } else {
            match open_stream() {
                Ok(stream) => Some(stream),
                Err(error) => {
                    warn!(%error, "Audio disabled");
                    None
                }
            }
        };
        Self { stream, bank }
    }

    pub fn is_enabled(&self) -> bool {
        self.stream.is_some()
    }
}

/// Where sound cues go. The game loop only needs to fire and forget.
pub trait SoundOutput {
    fn play(&self, sfx: Sfx);
}

impl SoundOutput for Audio {
    fn play(&self, sfx: Sfx) {
        let Some(stream) = &self.stream else {
            return;
        };
        let clip = self.bank.get(sfx).get();
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SamplesBuffer::new(clip.channels, clip.sample_rate, clip.samples.to_vec()));
        sink.detach(); // Play in background
    }
}

fn open_stream() -> Result<OutputStream, AudioError> {
    let mut stream = OutputStreamBuilder::open_default_stream()?;
    stream.log_on_drop(false);
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files_fall_back_to_synth() {
        let bank = SoundBank::load("/nonexistent/sound/dir");
        for sfx in Sfx::ALL {
            let asset = bank.get(sfx);
            assert!(asset.is_fallback());
            assert!(!asset.get().samples.is_empty());
        }
    }

    #[test]
    fn synth_lengths() {
        assert!((synth_hit().duration_secs() - 0.5).abs() < 1e-3);
        assert!((synth_flap().duration_secs() - 0.1).abs() < 1e-3);
    }

    #[test]
    fn synth_is_quiet() {
        let clip = synth_hit();
        assert!(clip.samples.iter().all(|s| s.abs() <= 0.2));
    }
}
