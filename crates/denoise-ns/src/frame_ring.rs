//! Sliding history of spectral frames.
//!
//! The reduce pass classifies each band by looking at a symmetric span of
//! frames around a center frame, and shapes gain envelopes both forward and
//! backward in time. The ring holds that history: slot 0 is the newest
//! frame, higher slots are older, and the tail slot is the frame about to
//! be synthesized and emitted.

/// One analysis frame: power spectrum, real-FFT coefficients, per-band gain.
///
/// `re`/`im` hold `spectrum_size - 1` values with DC packed into `re[0]` and
/// Nyquist into `im[0]`; interior bin `k` lives in `re[k]`/`im[k]`.
/// `power[k]` is the squared magnitude of bin `k` in natural order.
#[derive(Debug)]
pub struct SpectralFrame {
    pub power: Vec<f32>,
    pub re: Vec<f32>,
    pub im: Vec<f32>,
    pub gain: Vec<f32>,
}

impl SpectralFrame {
    fn new(spectrum_size: usize) -> Self {
        Self {
            power: vec![0.0; spectrum_size],
            re: vec![0.0; spectrum_size - 1],
            im: vec![0.0; spectrum_size - 1],
            gain: vec![0.0; spectrum_size],
        }
    }

    fn reset(&mut self, gain_fill: f32) {
        self.power.fill(0.0);
        self.re.fill(0.0);
        self.im.fill(0.0);
        self.gain.fill(gain_fill);
    }
}

/// Fixed-capacity ring of spectral frames, rotated one slot per hop.
#[derive(Debug)]
pub struct FrameRing {
    frames: Vec<SpectralFrame>,
    gain_fill: f32,
}

impl FrameRing {
    /// Create a ring of `len` frames. New and recycled slots have their
    /// gains pre-filled with `gain_fill` (the attenuation floor, so bands
    /// are attenuated until something raises them).
    pub fn new(len: usize, spectrum_size: usize, gain_fill: f32) -> Self {
        let mut frames: Vec<SpectralFrame> = (0..len)
            .map(|_| SpectralFrame::new(spectrum_size))
            .collect();
        for frame in &mut frames {
            frame.reset(gain_fill);
        }
        Self { frames, gain_fill }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the ring has no slots. Never true; rings have at least one.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Shift every frame one slot older and recycle the oldest slot into
    /// slot 0, reset for the next hop. No per-sample copying: only the
    /// frame records move.
    pub fn rotate(&mut self) {
        self.frames.rotate_right(1);
        let fill = self.gain_fill;
        self.frames[0].reset(fill);
    }

    /// Frame at slot `i` (0 = newest).
    pub fn frame(&self, i: usize) -> &SpectralFrame {
        &self.frames[i]
    }

    /// Mutable frame at slot `i` (0 = newest).
    pub fn frame_mut(&mut self, i: usize) -> &mut SpectralFrame {
        &mut self.frames[i]
    }

    /// The newest frame, filled by the driver each hop.
    pub fn newest_mut(&mut self) -> &mut SpectralFrame {
        &mut self.frames[0]
    }

    /// The oldest frame, next in line for synthesis.
    pub fn oldest(&self) -> &SpectralFrame {
        self.frames.last().expect("ring is never empty")
    }

    /// Mutable access to the oldest frame.
    pub fn oldest_mut(&mut self) -> &mut SpectralFrame {
        self.frames.last_mut().expect("ring is never empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ring_prefills_gains() {
        let ring = FrameRing::new(3, 9, 0.25);
        for i in 0..3 {
            assert!(ring.frame(i).gain.iter().all(|&g| g == 0.25));
            assert!(ring.frame(i).power.iter().all(|&p| p == 0.0));
        }
        assert_eq!(ring.frame(0).re.len(), 8);
        assert_eq!(ring.frame(0).im.len(), 8);
    }

    #[test]
    fn rotate_ages_frames_and_recycles_oldest() {
        let mut ring = FrameRing::new(3, 5, 0.1);
        ring.newest_mut().power[0] = 1.0;
        ring.rotate();
        ring.newest_mut().power[0] = 2.0;
        ring.rotate();

        assert_eq!(ring.frame(1).power[0], 2.0);
        assert_eq!(ring.frame(2).power[0], 1.0);
        assert_eq!(ring.frame(0).power[0], 0.0, "recycled slot must be reset");
        assert!(ring.frame(0).gain.iter().all(|&g| g == 0.1));
    }

    #[test]
    fn oldest_tracks_tail_slot() {
        let mut ring = FrameRing::new(2, 5, 0.0);
        ring.newest_mut().power[1] = 7.0;
        ring.rotate();
        assert_eq!(ring.oldest().power[1], 7.0);
    }
}
