//! STFT driver: framing, per-hop spectral processing, overlap-add output.
//!
//! Consumes input samples block-wise, assembles overlapping analysis
//! windows, pushes their spectra through the frame ring, and either gathers
//! noise statistics (profile pass) or classifies, shapes gains and
//! reconstructs output by overlap-add (reduce pass).
//!
//! Counters: `in_samples` counts samples ingested; `out_step` counts hops,
//! primed negative so the ring fills before the center frame is classified
//! and, for reduction, so the leading zero-padded windows are absorbed
//! before the first true output sample. A hop is processed whenever the
//! driver still owes output for ingested samples (`out_step · H <
//! in_samples`).

use denoise_audio::SampleSink;

use crate::classifier::Classifier;
use crate::config::{ReductionChoice, Settings};
use crate::fft::SpectrumFft;
use crate::frame_ring::FrameRing;
use crate::gain_envelope::GainEnvelope;
use crate::statistics::NoiseStats;
use crate::window_bank::WindowBank;

/// One-pass STFT engine. Lives for a single profile or reduce invocation.
#[derive(Debug)]
pub struct StftPipeline {
    window_size: usize,
    steps_per_window: usize,
    step_size: usize,
    spectrum_size: usize,
    choice: ReductionChoice,

    fft: SpectrumFft,
    windows: WindowBank,
    ring: FrameRing,
    classifier: Classifier,
    envelope: GainEnvelope,
    center: usize,

    /// Input assembly buffer, one window long.
    in_wave: Vec<f32>,
    in_wave_pos: usize,
    in_samples: i64,

    /// Windowed input / inverse-FFT output scratch, one window long.
    fft_time: Vec<f32>,
    /// Gain-scaled spectrum scratch in the packed layout.
    synth_re: Vec<f32>,
    synth_im: Vec<f32>,
    /// Overlap-add accumulator, one window long.
    out_overlap: Vec<f32>,
    out_step: i64,
}

impl StftPipeline {
    /// Driver for a profile pass: no leading pad, single-frame history,
    /// no synthesis window.
    pub fn for_profiling(settings: &Settings, sample_rate: f64) -> Self {
        Self::new(settings, sample_rate, true)
    }

    /// Driver for a reduce pass: leading zero pad of `W - H` samples,
    /// history long enough for classification span and attack lookahead.
    pub fn for_reduction(settings: &Settings, sample_rate: f64) -> Self {
        Self::new(settings, sample_rate, false)
    }

    fn new(settings: &Settings, sample_rate: f64, profiling: bool) -> Self {
        let window_size = settings.window_size();
        let steps_per_window = settings.steps_per_window();
        let step_size = settings.step_size();
        let spectrum_size = settings.spectrum_size();

        let classifier = Classifier::new(settings.method, settings.sensitivity, steps_per_window);
        let center = classifier.center();
        // Release leans on the center having a newer neighbor.
        debug_assert!(center >= 1);

        let attack_blocks = 1 + (settings.attack_time * sample_rate / step_size as f64) as usize;
        let release_blocks = 1 + (settings.release_time * sample_rate / step_size as f64) as usize;
        let envelope = GainEnvelope::new(
            settings.gain,
            attack_blocks,
            release_blocks,
            settings.freq_smoothing_bins(),
            center,
            spectrum_size,
        );

        // History long enough to inspect the span around the center and to
        // hold the full attack curve.
        let history_len = if profiling {
            1
        } else {
            classifier.windows_to_examine().max(center + attack_blocks)
        };

        let ring = FrameRing::new(history_len, spectrum_size, envelope.gain_floor());
        let windows = WindowBank::new(
            settings.window_types,
            window_size,
            steps_per_window,
            !profiling,
        );

        let (in_wave_pos, out_step) = if profiling {
            // No leading zero-padded windows when gathering statistics.
            (0, -((history_len - 1) as i64))
        } else {
            // Prime the ring with zero-padded windows, the first carrying
            // one hop of true data, and count the extra steps off before
            // output begins so the first emitted sample is the first sample
            // of the region.
            (
                window_size - step_size,
                -((history_len - 1) as i64) - ((steps_per_window - 1) as i64),
            )
        };

        tracing::debug!(
            window_size,
            steps_per_window,
            history_len,
            attack_blocks,
            release_blocks,
            profiling,
            "stft pipeline ready"
        );

        Self {
            window_size,
            steps_per_window,
            step_size,
            spectrum_size,
            choice: settings.reduction_choice,
            fft: SpectrumFft::new(window_size),
            windows,
            ring,
            classifier,
            envelope,
            center,
            in_wave: vec![0.0; window_size],
            in_wave_pos,
            in_samples: 0,
            fft_time: vec![0.0; window_size],
            synth_re: vec![0.0; spectrum_size - 1],
            synth_im: vec![0.0; spectrum_size - 1],
            out_overlap: vec![0.0; window_size],
            out_step,
        }
    }

    /// Ingest a block during a profile pass, adding every completed window's
    /// power spectrum to `stats`.
    pub fn feed_profile(&mut self, samples: &[f32], stats: &mut NoiseStats) {
        self.in_samples += samples.len() as i64;
        let mut rest = samples;
        while !rest.is_empty() && self.output_owed() {
            rest = self.fill_input(rest);
            if self.in_wave_pos == self.window_size {
                self.analyze_window();
                stats.accumulate(&self.ring.frame(0).power);
                self.advance_hop();
            }
        }
    }

    /// Ingest a block during a reduce pass, emitting finished hops to
    /// `sink`.
    pub fn feed_reduce(&mut self, samples: &[f32], stats: &NoiseStats, sink: &mut dyn SampleSink) {
        self.in_samples += samples.len() as i64;
        self.drain(samples, stats, sink);
    }

    /// Flush zero blocks through the history until every ingested sample
    /// has left the overlap buffer. May emit up to one hop of overrun,
    /// which the caller trims.
    pub fn finish_reduce(&mut self, stats: &NoiseStats, sink: &mut dyn SampleSink) {
        let zeros = vec![0.0f32; self.step_size];
        while self.output_owed() {
            self.drain(&zeros, stats, sink);
        }
    }

    fn output_owed(&self) -> bool {
        self.out_step * (self.step_size as i64) < self.in_samples
    }

    fn drain(&mut self, mut rest: &[f32], stats: &NoiseStats, sink: &mut dyn SampleSink) {
        while !rest.is_empty() && self.output_owed() {
            rest = self.fill_input(rest);
            if self.in_wave_pos == self.window_size {
                self.analyze_window();
                self.reduce_window(stats, sink);
                self.advance_hop();
            }
        }
    }

    /// Copy as much of `samples` as fits into the assembly buffer.
    fn fill_input<'a>(&mut self, samples: &'a [f32]) -> &'a [f32] {
        let take = samples.len().min(self.window_size - self.in_wave_pos);
        self.in_wave[self.in_wave_pos..self.in_wave_pos + take].copy_from_slice(&samples[..take]);
        self.in_wave_pos += take;
        &samples[take..]
    }

    /// Window the assembled input and transform it into the newest ring
    /// slot.
    fn analyze_window(&mut self) {
        match self.windows.analysis() {
            Some(window) => {
                for ((dst, &x), &a) in self.fft_time.iter_mut().zip(&self.in_wave).zip(window) {
                    *dst = x * a;
                }
            }
            None => self.fft_time.copy_from_slice(&self.in_wave),
        }
        self.fft.analyze(&mut self.fft_time, self.ring.newest_mut());
    }

    /// Count the hop, age the ring, slide the assembly buffer one hop.
    fn advance_hop(&mut self) {
        self.out_step += 1;
        self.ring.rotate();
        self.in_wave.copy_within(self.step_size.., 0);
        self.in_wave_pos = self.window_size - self.step_size;
    }

    /// Classify the center frame, shape envelopes, and synthesize the ring
    /// tail once the queue is primed.
    fn reduce_window(&mut self, stats: &NoiseStats, sink: &mut dyn SampleSink) {
        let isolate = self.choice == ReductionChoice::Isolate;

        // Commit the center frame's verdicts. Gains were pre-filled at the
        // floor, so reduction only raises the bands that are not noise;
        // isolation writes the full 0/1 mask.
        let means = stats.means();
        for band in 0..self.spectrum_size {
            let is_noise = self.classifier.is_noise(&self.ring, means, band);
            let gain = &mut self.ring.frame_mut(self.center).gain[band];
            if isolate {
                *gain = if is_noise { 1.0 } else { 0.0 };
            } else if !is_noise {
                *gain = 1.0;
            }
        }

        if !isolate {
            self.envelope.propagate(&mut self.ring);
        }

        // The tail frame only becomes meaningful once the priming steps for
        // the leading zero pad have passed.
        if self.out_step < -((self.steps_per_window - 1) as i64) {
            return;
        }

        if !isolate {
            self.envelope.smooth(&mut self.ring.oldest_mut().gain);
        }

        // Scale the tail spectrum by its gains. The residue choice applies
        // `gain - 1`, flipping the phase so the output is what reduction
        // removes.
        let gain_offset = if self.choice == ReductionChoice::Residue {
            -1.0f32
        } else {
            0.0
        };
        let tail = self.ring.oldest();
        let last = self.spectrum_size - 1;
        for k in 1..last {
            let gain = tail.gain[k] + gain_offset;
            self.synth_re[k] = tail.re[k] * gain;
            self.synth_im[k] = tail.im[k] * gain;
        }
        self.synth_re[0] = tail.re[0] * (tail.gain[0] + gain_offset);
        // Nyquist rides in the packed im[0] slot but is gained by the last
        // natural-order bin.
        self.synth_im[0] = tail.im[0] * (tail.gain[last] + gain_offset);

        self.fft.synthesize(&self.synth_re, &self.synth_im, &mut self.fft_time);

        match self.windows.synthesis() {
            Some(window) => {
                for ((acc, &v), &y) in self.out_overlap.iter_mut().zip(&self.fft_time).zip(window) {
                    *acc += v * y;
                }
            }
            None => {
                for (acc, &v) in self.out_overlap.iter_mut().zip(&self.fft_time) {
                    *acc += v;
                }
            }
        }

        // The leading hop of the overlap buffer is complete once the step
        // counter turns non-negative.
        if self.out_step >= 0 {
            sink.append(&self.out_overlap[..self.step_size]);
        }
        self.out_overlap.copy_within(self.step_size.., 0);
        let tail_start = self.window_size - self.step_size;
        self.out_overlap[tail_start..].fill(0.0);
    }
}
