//! Per-band gain shaping across time and frequency.
//!
//! After classification writes floor-or-unity gains into the center frame,
//! the envelope propagates an exponential attack backward in time (toward
//! older frames, which are emitted sooner) and an exponential release one
//! hop forward; later hops revisit the release and carry the decay further.
//! At emission, gains are smoothed across frequency so a single band is
//! never suppressed or boosted in isolation.

use crate::frame_ring::FrameRing;

/// Convert a gain in dB to a linear amplitude factor.
pub(crate) fn db_to_amplitude(db: f64) -> f32 {
    10.0f64.powf(db / 20.0) as f32
}

/// Attack/release envelopes and frequency smoothing for the gain spectrum.
#[derive(Debug)]
pub struct GainEnvelope {
    gain_floor: f32,
    /// Per-hop gain ratio of the attack curve.
    attack_factor: f32,
    /// Per-hop gain ratio of the release curve.
    release_factor: f32,
    smoothing_bins: usize,
    center: usize,
    scratch: Vec<f32>,
}

impl GainEnvelope {
    /// Build envelopes for an attenuation of `gain_db` dB spread over
    /// `attack_blocks` hops of attack and `release_blocks` hops of release.
    pub fn new(
        gain_db: f64,
        attack_blocks: usize,
        release_blocks: usize,
        smoothing_bins: usize,
        center: usize,
        spectrum_size: usize,
    ) -> Self {
        Self {
            gain_floor: db_to_amplitude(-gain_db),
            attack_factor: db_to_amplitude(-gain_db / attack_blocks as f64),
            release_factor: db_to_amplitude(-gain_db / release_blocks as f64),
            smoothing_bins,
            center,
            scratch: vec![0.0; spectrum_size],
        }
    }

    /// Smallest gain the reduce pass ever applies.
    pub fn gain_floor(&self) -> f32 {
        self.gain_floor
    }

    /// Spread the center frame's gains along both exponential curves.
    ///
    /// Attack walks toward older slots; each raises the slot to the decayed
    /// curve of its newer neighbor and stops as soon as the curve meets an
    /// envelope committed on an earlier hop. Release only touches the next
    /// newer slot; the decay continues when that slot reaches the center.
    pub fn propagate(&self, ring: &mut FrameRing) {
        let len = ring.len();
        let bands = ring.frame(0).gain.len();

        for band in 0..bands {
            for i in self.center + 1..len {
                let decayed =
                    (ring.frame(i - 1).gain[band] * self.attack_factor).max(self.gain_floor);
                let gain = &mut ring.frame_mut(i).gain[band];
                if *gain < decayed {
                    *gain = decayed;
                } else {
                    break;
                }
            }
        }

        for band in 0..bands {
            let decayed =
                (ring.frame(self.center).gain[band] * self.release_factor).max(self.gain_floor);
            let gain = &mut ring.frame_mut(self.center - 1).gain[band];
            *gain = (*gain).max(decayed);
        }
    }

    /// Replace each gain with the geometric mean of its `±smoothing_bins`
    /// neighborhood. Averaging the logs, not multiplying and taking an nth
    /// root: a product of many sub-unity gains underflows quickly.
    pub fn smooth(&mut self, gains: &mut [f32]) {
        if self.smoothing_bins == 0 {
            return;
        }

        for gain in gains.iter_mut() {
            *gain = gain.ln();
        }

        let last = gains.len() - 1;
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let j0 = i.saturating_sub(self.smoothing_bins);
            let j1 = (i + self.smoothing_bins).min(last);
            let sum: f32 = gains[j0..=j1].iter().sum();
            *slot = sum / (j1 - j0 + 1) as f32;
        }

        for (gain, &mean) in gains.iter_mut().zip(&self.scratch) {
            *gain = mean.exp();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const FLOOR_12DB: f32 = 0.25118864; // 10^(-12/20)

    fn envelope(attack_blocks: usize, release_blocks: usize, center: usize) -> GainEnvelope {
        GainEnvelope::new(12.0, attack_blocks, release_blocks, 0, center, 3)
    }

    #[test]
    fn floor_matches_attenuation() {
        let env = envelope(2, 9, 2);
        assert!((env.gain_floor() - FLOOR_12DB).abs() < 1e-6);
    }

    #[test]
    fn attack_decays_toward_older_frames() {
        let env = envelope(2, 9, 2);
        let mut ring = FrameRing::new(5, 3, env.gain_floor());
        ring.frame_mut(2).gain.fill(1.0);
        env.propagate(&mut ring);

        let step = db_to_amplitude(-12.0 / 2.0);
        let g3 = ring.frame(3).gain[0];
        let g4 = ring.frame(4).gain[0];
        assert!((g3 - step).abs() < 1e-6, "one hop of attack: {g3}");
        assert!(
            (g4 - env.gain_floor()).abs() < 1e-6,
            "two hops reach the floor: {g4}"
        );
    }

    #[test]
    fn attack_stops_at_committed_envelope() {
        let env = envelope(4, 9, 1);
        let mut ring = FrameRing::new(4, 3, env.gain_floor());
        // Slot 2 already carries a full envelope from an earlier hop.
        ring.frame_mut(1).gain.fill(1.0);
        ring.frame_mut(2).gain.fill(1.0);
        ring.frame_mut(3).gain[0] = 0.9;
        env.propagate(&mut ring);

        assert_eq!(
            ring.frame(2).gain[0],
            1.0,
            "existing envelope must not be lowered"
        );
        assert_eq!(
            ring.frame(3).gain[0],
            0.9,
            "walk stops once the curve intersects a committed envelope"
        );
    }

    #[test]
    fn release_raises_next_frame_only() {
        let env = envelope(2, 3, 2);
        let mut ring = FrameRing::new(5, 3, env.gain_floor());
        ring.frame_mut(2).gain.fill(1.0);
        env.propagate(&mut ring);

        let step = db_to_amplitude(-12.0 / 3.0);
        let g1 = ring.frame(1).gain[0];
        assert!((g1 - step).abs() < 1e-6, "one hop of release: {g1}");
        assert_eq!(
            ring.frame(0).gain[0],
            env.gain_floor(),
            "release must not reach past one hop in a single pass"
        );
    }

    #[test]
    fn release_decays_over_following_hops() {
        // Drive several hops after a lone signal frame passes the center;
        // the emitted gain must decay monotonically down to the floor.
        let env = envelope(2, 3, 2);
        let mut ring = FrameRing::new(5, 3, env.gain_floor());
        ring.frame_mut(2).gain.fill(1.0);

        let mut previous = 1.0f32;
        for _ in 0..6 {
            env.propagate(&mut ring);
            let current = ring.frame(env.center).gain[0];
            assert!(
                current <= previous + 1e-7,
                "release must decay monotonically: {current} after {previous}"
            );
            assert!(current >= env.gain_floor());
            previous = current;
            ring.rotate();
        }
        assert!((previous - env.gain_floor()).abs() < 1e-6);
    }

    #[test]
    fn smooth_takes_geometric_mean() {
        let mut env = GainEnvelope::new(12.0, 2, 9, 1, 2, 5);
        let mut gains = [1.0f32, 0.25, 0.25, 0.25, 1.0];
        env.smooth(&mut gains);

        // Interior bin 1 averages ln(1.0), ln(0.25), ln(0.25).
        let expected = (0.25f32.ln() * 2.0 / 3.0).exp();
        assert!(
            (gains[1] - expected).abs() < 1e-6,
            "geometric mean at bin 1: {}",
            gains[1]
        );
        // Edge bin 0 averages only bins 0..=1.
        let expected = (0.25f32.ln() / 2.0).exp();
        assert!(
            (gains[0] - expected).abs() < 1e-6,
            "geometric mean at bin 0: {}",
            gains[0]
        );
    }

    #[test]
    fn smooth_disabled_at_zero_bins() {
        let mut env = GainEnvelope::new(12.0, 2, 9, 0, 2, 5);
        let mut gains = [1.0f32, 0.25, 1.0, 0.25, 1.0];
        let before = gains;
        env.smooth(&mut gains);
        assert_eq!(gains, before);
    }

    proptest! {
        // However verdicts fall over several hops, no gain sinks below the
        // floor after envelope propagation and smoothing.
        #[test]
        fn gains_never_sink_below_floor(
            verdicts in proptest::collection::vec(
                proptest::collection::vec(proptest::bool::ANY, 3), 8),
            smoothing in 0usize..3,
        ) {
            let mut env = GainEnvelope::new(12.0, 2, 3, smoothing, 2, 3);
            let floor = env.gain_floor();
            let mut ring = FrameRing::new(5, 3, floor);

            for hop in verdicts {
                for (band, &is_noise) in hop.iter().enumerate() {
                    ring.frame_mut(2).gain[band] = if is_noise { floor } else { 1.0 };
                }
                env.propagate(&mut ring);
                env.smooth(&mut ring.oldest_mut().gain);
                for i in 0..ring.len() {
                    for (band, &gain) in ring.frame(i).gain.iter().enumerate() {
                        prop_assert!(
                            gain >= floor - 1e-6,
                            "slot {i} band {band} gain {gain} below floor {floor}"
                        );
                    }
                }
                ring.rotate();
            }
        }
    }
}
