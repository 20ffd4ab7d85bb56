//! Noise/signal decision per frequency band.
//!
//! Noise power in a band is assumed exponentially distributed around the
//! profiled mean. The sensitivity setting is minus the base-10 log of the
//! probability that noise strays above the threshold; the quantile function
//! of the exponential distribution makes the cutoff simply
//! `sensitivity · ln 10 · mean`. A robust order statistic over the sliding
//! span of frames (second- or third-greatest) keeps isolated excursions in
//! either direction from flipping the verdict.

use crate::config::ClassificationMethod;
use crate::frame_ring::FrameRing;

/// Per-band noise classifier over the frame ring.
#[derive(Debug)]
pub struct Classifier {
    method: ClassificationMethod,
    /// Threshold multiplier applied to the per-band mean: `σ · ln 10`.
    threshold_scale: f32,
    windows_to_examine: usize,
}

impl Classifier {
    /// Create a classifier examining the center frame and every frame that
    /// partly overlaps it: `1 + steps_per_window` frames.
    pub fn new(method: ClassificationMethod, sensitivity: f64, steps_per_window: usize) -> Self {
        Self {
            method,
            threshold_scale: (sensitivity * std::f64::consts::LN_10) as f32,
            windows_to_examine: 1 + steps_per_window,
        }
    }

    /// Number of ring frames the verdict looks at.
    pub fn windows_to_examine(&self) -> usize {
        self.windows_to_examine
    }

    /// Index of the center frame within the examined span.
    pub fn center(&self) -> usize {
        self.windows_to_examine / 2
    }

    /// Whether `band` of the center frame looks like pure noise.
    pub fn is_noise(&self, ring: &FrameRing, means: &[f32], band: usize) -> bool {
        let threshold = self.threshold_scale * means[band];
        match self.method {
            ClassificationMethod::SecondGreatest => self.second_greatest(ring, band) <= threshold,
            ClassificationMethod::Median => match self.windows_to_examine {
                // Median of three is the second greatest.
                3 => self.second_greatest(ring, band) <= threshold,
                5 => self.third_greatest(ring, band) <= threshold,
                // Ruled out by settings validation.
                _ => true,
            },
        }
    }

    fn second_greatest(&self, ring: &FrameRing, band: usize) -> f32 {
        let (mut greatest, mut second) = (0.0f32, 0.0f32);
        for i in 0..self.windows_to_examine {
            let power = ring.frame(i).power[band];
            if power >= greatest {
                second = greatest;
                greatest = power;
            } else if power >= second {
                second = power;
            }
        }
        second
    }

    fn third_greatest(&self, ring: &FrameRing, band: usize) -> f32 {
        let (mut greatest, mut second, mut third) = (0.0f32, 0.0f32, 0.0f32);
        for i in 0..self.windows_to_examine {
            let power = ring.frame(i).power[band];
            if power >= greatest {
                third = second;
                second = greatest;
                greatest = power;
            } else if power >= second {
                third = second;
                second = power;
            } else if power >= third {
                third = power;
            }
        }
        third
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Ring whose slot `i` has `powers[i]` in band 0.
    fn ring_with_powers(powers: &[f32]) -> FrameRing {
        let mut ring = FrameRing::new(powers.len(), 2, 0.0);
        for (i, &p) in powers.iter().enumerate() {
            ring.frame_mut(i).power[0] = p;
        }
        ring
    }

    #[test]
    fn second_greatest_ignores_single_outlier() {
        // steps = 4 → span of 5.
        let c = Classifier::new(ClassificationMethod::SecondGreatest, 1.0, 4);
        let ring = ring_with_powers(&[1.0, 1.0, 100.0, 1.0, 1.0]);
        // Threshold = ln(10) · mean; with mean 1.0 the spike alone must not
        // flip the verdict.
        assert!(c.is_noise(&ring, &[1.0, 1.0], 0));
    }

    #[test]
    fn second_greatest_trips_on_two_high_frames() {
        let c = Classifier::new(ClassificationMethod::SecondGreatest, 1.0, 4);
        let ring = ring_with_powers(&[1.0, 100.0, 100.0, 1.0, 1.0]);
        assert!(!c.is_noise(&ring, &[1.0, 1.0], 0));
    }

    #[test]
    fn median_of_five_ignores_two_outliers() {
        let c = Classifier::new(ClassificationMethod::Median, 1.0, 4);
        assert_eq!(c.windows_to_examine(), 5);
        let ring = ring_with_powers(&[1.0, 100.0, 100.0, 1.0, 1.0]);
        assert!(c.is_noise(&ring, &[1.0, 1.0], 0));

        let ring = ring_with_powers(&[1.0, 100.0, 100.0, 100.0, 1.0]);
        assert!(!c.is_noise(&ring, &[1.0, 1.0], 0));
    }

    #[test]
    fn median_of_three_matches_second_greatest() {
        let median = Classifier::new(ClassificationMethod::Median, 1.5, 2);
        let second = Classifier::new(ClassificationMethod::SecondGreatest, 1.5, 2);
        assert_eq!(median.windows_to_examine(), 3);
        for powers in [[0.1f32, 5.0, 0.2], [4.0, 4.0, 4.0], [0.0, 0.0, 9.0]] {
            let ring = ring_with_powers(&powers);
            assert_eq!(
                median.is_noise(&ring, &[1.0, 1.0], 0),
                second.is_noise(&ring, &[1.0, 1.0], 0),
                "disagreement on {powers:?}"
            );
        }
    }

    #[test]
    fn center_is_middle_of_span() {
        let c = Classifier::new(ClassificationMethod::SecondGreatest, 6.0, 4);
        assert_eq!(c.center(), 2);
        let c = Classifier::new(ClassificationMethod::SecondGreatest, 6.0, 2);
        assert_eq!(c.center(), 1);
    }

    proptest! {
        // Raising the sensitivity can only widen what counts as noise.
        #[test]
        fn higher_sensitivity_is_weakly_more_permissive(
            powers in proptest::collection::vec(0.0f32..10.0, 5),
            mean in 0.01f32..10.0,
            sensitivity in 0.1f64..4.0,
            extra in 0.0f64..4.0,
        ) {
            let ring = ring_with_powers(&powers);
            let means = [mean, mean];
            let lower = Classifier::new(ClassificationMethod::SecondGreatest, sensitivity, 4);
            let higher =
                Classifier::new(ClassificationMethod::SecondGreatest, sensitivity + extra, 4);
            if lower.is_noise(&ring, &means, 0) {
                prop_assert!(higher.is_noise(&ring, &means, 0));
            }
        }
    }
}
