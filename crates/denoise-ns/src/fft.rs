//! Real-FFT adapter for the reduction pipeline.
//!
//! Wraps `realfft` plans and converts between the pipeline's packed
//! spectrum layout (DC in `re[0]`, Nyquist in `im[0]`, interior bins in
//! `re[k]`/`im[k]`) and the FFT's natural-order complex layout. The inverse
//! is normalized by `1/W` so a forward/inverse round trip is the identity.

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::frame_ring::SpectralFrame;

/// Forward/inverse real FFT with pre-allocated plans and scratch.
pub struct SpectrumFft {
    window_size: usize,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
    spectrum: Vec<Complex<f32>>,
    forward_scratch: Vec<Complex<f32>>,
    inverse_scratch: Vec<Complex<f32>>,
}

impl std::fmt::Debug for SpectrumFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumFft")
            .field("window_size", &self.window_size)
            .finish_non_exhaustive()
    }
}

impl SpectrumFft {
    /// Plan forward and inverse transforms for `window_size` samples.
    pub fn new(window_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(window_size);
        let inverse = planner.plan_fft_inverse(window_size);
        let forward_scratch = forward.make_scratch_vec();
        let inverse_scratch = inverse.make_scratch_vec();
        Self {
            window_size,
            forward,
            inverse,
            spectrum: vec![Complex::new(0.0, 0.0); window_size / 2 + 1],
            forward_scratch,
            inverse_scratch,
        }
    }

    /// Forward transform of `time` into `frame`'s spectral fields.
    ///
    /// `time` is used as FFT scratch; its contents are garbage afterwards.
    /// Fills `re`/`im` in the packed layout and `power` in natural bin
    /// order.
    pub fn analyze(&mut self, time: &mut [f32], frame: &mut SpectralFrame) {
        self.forward
            .process_with_scratch(time, &mut self.spectrum, &mut self.forward_scratch)
            .expect("FFT buffer sizes are fixed at construction");

        let last = self.spectrum.len() - 1;
        let dc = self.spectrum[0].re;
        let nyquist = self.spectrum[last].re;
        frame.re[0] = dc;
        frame.im[0] = nyquist;
        frame.power[0] = dc * dc;
        frame.power[last] = nyquist * nyquist;
        for k in 1..last {
            let bin = self.spectrum[k];
            frame.re[k] = bin.re;
            frame.im[k] = bin.im;
            frame.power[k] = bin.re * bin.re + bin.im * bin.im;
        }
    }

    /// Inverse transform of a packed `re`/`im` spectrum into `time`,
    /// normalized so that `analyze` followed by `synthesize` reproduces the
    /// input.
    pub fn synthesize(&mut self, re: &[f32], im: &[f32], time: &mut [f32]) {
        let last = self.spectrum.len() - 1;
        self.spectrum[0] = Complex::new(re[0], 0.0);
        self.spectrum[last] = Complex::new(im[0], 0.0);
        for k in 1..last {
            self.spectrum[k] = Complex::new(re[k], im[k]);
        }

        self.inverse
            .process_with_scratch(&mut self.spectrum, time, &mut self.inverse_scratch)
            .expect("FFT buffer sizes are fixed at construction");

        let scale = 1.0 / self.window_size as f32;
        for v in time.iter_mut() {
            *v *= scale;
        }
    }
}
