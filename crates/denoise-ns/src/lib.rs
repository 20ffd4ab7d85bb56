//! Two-pass spectral noise reduction for offline audio.
//!
//! A first pass over a noise-only region gathers per-frequency-band power
//! statistics; a second pass rewrites a region with bands that stay below
//! the profiled threshold attenuated by a configured amount, shaped by
//! attack/release envelopes across frames and geometric smoothing across
//! frequency. Designed for batch processing: lookahead is used freely and
//! nothing is real-time safe.
//!
//! Multi-channel audio is processed one channel per track; profile several
//! channels into one set of statistics with
//! [`NoiseReducer::extend_profile`].
//!
//! # Example
//!
//! ```
//! use denoise_audio::MemoryTrack;
//! use denoise_ns::{NoiseReducer, Settings};
//!
//! let mut reducer = NoiseReducer::new(Settings::default())?;
//!
//! // A second of background noise to profile, and a track to clean.
//! let noise = MemoryTrack::from_samples(44100.0, vec![0.001; 44100]);
//! let mut audio = MemoryTrack::from_samples(44100.0, vec![0.001; 44100]);
//!
//! reducer.profile(&noise, 0.0, 1.0)?;
//! reducer.reduce(&mut audio, 0.0, 1.0)?;
//! # Ok::<(), denoise_ns::Error>(())
//! ```

pub mod classifier;
pub mod config;
pub mod fft;
pub mod frame_ring;
pub mod gain_envelope;
pub mod noise_reducer;
pub mod statistics;
pub mod stft_pipeline;
pub mod window_bank;

pub use config::{ClassificationMethod, ReductionChoice, Settings, WindowTypes};
pub use noise_reducer::{Error, NoiseReducer};
pub use statistics::NoiseStats;
