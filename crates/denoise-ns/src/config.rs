//! Effect settings and their persisted form.
//!
//! [`Settings`] is the memory of the effect between uses. Its serde
//! representation matches the persisted parameter namespace: window size and
//! steps per window are stored in their historical log2 encodings, the
//! window pair as an integer index, and the choice/method fields as short
//! strings.

use serde::{Deserialize, Serialize};

use crate::noise_reducer::Error;
use crate::window_bank::WindowPair;

/// What the reduce pass writes back over the processed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionChoice {
    /// Attenuate bands classified as noise; pass the rest through.
    #[default]
    Reduce,
    /// Keep only the bands classified as noise, with 0/1 gains.
    Isolate,
    /// Emit what reduction removes, phase-inverted: mixed over the
    /// unprocessed signal it reproduces the reduced signal.
    Residue,
}

/// Decision rule used to judge a band against the noise threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMethod {
    /// Median of the examined span (third-greatest of five). Robust against
    /// both up and down excursions; limited to four steps per window.
    Median,
    /// Second-greatest of the examined span. Throws out the single high
    /// outlier; less prone to dropouts, more prone to musical chimes.
    #[default]
    SecondGreatest,
}

/// Analysis/synthesis window pairing.
///
/// The numeric serde encoding (0..6) is the persisted index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WindowTypes {
    /// Rectangular in, Hann out. Legacy behavior of early releases.
    RectangularHann,
    /// Hann in, rectangular out.
    HannRectangular,
    /// Hann in, Hann out.
    #[default]
    HannHann,
    /// Blackman in, Hann out.
    BlackmanHann,
    /// Hamming in, rectangular out.
    HammingRectangular,
    /// Hamming in, Hann out.
    HammingHann,
    /// Hamming in, reciprocal Hamming out.
    HammingInvHamming,
}

impl From<WindowTypes> for u8 {
    fn from(t: WindowTypes) -> u8 {
        t as u8
    }
}

/// Error for an out-of-range persisted window-pair index.
#[derive(Debug, Clone, Copy)]
pub struct InvalidWindowTypes(u8);

impl std::fmt::Display for InvalidWindowTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window types index {} out of range 0..=6", self.0)
    }
}

impl TryFrom<u8> for WindowTypes {
    type Error = InvalidWindowTypes;

    fn try_from(v: u8) -> Result<Self, InvalidWindowTypes> {
        match v {
            0 => Ok(Self::RectangularHann),
            1 => Ok(Self::HannRectangular),
            2 => Ok(Self::HannHann),
            3 => Ok(Self::BlackmanHann),
            4 => Ok(Self::HammingRectangular),
            5 => Ok(Self::HammingHann),
            6 => Ok(Self::HammingInvHamming),
            _ => Err(InvalidWindowTypes(v)),
        }
    }
}

/// Largest supported window-size choice (2^(3 + 12) = 32768 samples).
const MAX_WINDOW_SIZE_CHOICE: u32 = 12;

/// Effect settings, in their persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Settings {
    /// Sensitivity of the noise classifier: minus the base-10 log of the
    /// probability that noise strays above the threshold.
    pub sensitivity: f64,
    /// Attenuation applied to noise bands, in dB (positive).
    pub gain: f64,
    /// Attack time in seconds: how early gain may rise before signal onset.
    pub attack_time: f64,
    /// Release time in seconds: how slowly gain falls after signal ends.
    pub release_time: f64,
    /// Half-width of the gain smoothing neighborhood, in frequency bins.
    /// Really an integer.
    pub freq_smoothing: f64,
    /// What to write back over the processed region.
    pub reduction_choice: ReductionChoice,
    /// Analysis/synthesis window pairing.
    pub window_types: WindowTypes,
    /// Window size choice: the window is `2^(3 + choice)` samples.
    #[serde(rename = "WindowSize")]
    pub window_size_choice: u32,
    /// Steps-per-window choice: the window advances by
    /// `windowSize / 2^(1 + choice)` samples per hop.
    #[serde(rename = "StepsPerWindow")]
    pub steps_per_window_choice: u32,
    /// Decision rule for the classifier.
    pub method: ClassificationMethod,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: 6.0,
            gain: 12.0,
            attack_time: 0.02,
            release_time: 0.10,
            freq_smoothing: 3.0,
            reduction_choice: ReductionChoice::default(),
            window_types: WindowTypes::default(),
            window_size_choice: 8,     // 2048 samples
            steps_per_window_choice: 1, // 4 steps
            method: ClassificationMethod::default(),
        }
    }
}

impl Settings {
    /// Window size in samples.
    pub fn window_size(&self) -> usize {
        1usize << (3 + self.window_size_choice)
    }

    /// Number of analysis steps per window.
    pub fn steps_per_window(&self) -> usize {
        1usize << (1 + self.steps_per_window_choice)
    }

    /// Hop size in samples.
    pub fn step_size(&self) -> usize {
        self.window_size() / self.steps_per_window()
    }

    /// Number of real-FFT bins, DC and Nyquist included.
    pub fn spectrum_size(&self) -> usize {
        self.window_size() / 2 + 1
    }

    /// Frequency smoothing half-width as a bin count.
    pub fn freq_smoothing_bins(&self) -> usize {
        self.freq_smoothing.max(0.0) as usize
    }

    /// Check the window/steps/method combination.
    pub fn validate(&self) -> Result<(), Error> {
        if self.window_size_choice > MAX_WINDOW_SIZE_CHOICE {
            return Err(Error::ConfigInvalid("window size out of range"));
        }
        if self.steps_per_window() < WindowPair::for_types(self.window_types).min_steps {
            return Err(Error::ConfigInvalid(
                "too few steps per window for the chosen window types",
            ));
        }
        if self.steps_per_window() > self.window_size() {
            return Err(Error::ConfigInvalid(
                "steps per window cannot exceed the window size",
            ));
        }
        if self.method == ClassificationMethod::Median && self.steps_per_window() > 4 {
            return Err(Error::ConfigInvalid(
                "median method supports at most four steps per window",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_decode() {
        let s = Settings::default();
        assert_eq!(s.window_size(), 2048);
        assert_eq!(s.steps_per_window(), 4);
        assert_eq!(s.step_size(), 512);
        assert_eq!(s.spectrum_size(), 1025);
        assert_eq!(s.freq_smoothing_bins(), 3);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn persisted_keys_and_encodings() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["Sensitivity"], 6.0);
        assert_eq!(json["Gain"], 12.0);
        assert_eq!(json["AttackTime"], 0.02);
        assert_eq!(json["ReleaseTime"], 0.10);
        assert_eq!(json["FreqSmoothing"], 3.0);
        assert_eq!(json["ReductionChoice"], "reduce");
        assert_eq!(json["WindowTypes"], 2);
        assert_eq!(json["WindowSize"], 8);
        assert_eq!(json["StepsPerWindow"], 1);
        assert_eq!(json["Method"], "second-greatest");
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let s: Settings = serde_json::from_str(r#"{"Gain": 18.0}"#).unwrap();
        assert_eq!(s.gain, 18.0);
        assert_eq!(s.sensitivity, 6.0);
        assert_eq!(s.window_types, WindowTypes::HannHann);
    }

    #[test]
    fn window_types_index_round_trips() {
        for idx in 0u8..=6 {
            let t = WindowTypes::try_from(idx).unwrap();
            assert_eq!(u8::from(t), idx);
        }
        assert!(WindowTypes::try_from(7).is_err());
    }

    #[test]
    fn too_few_steps_rejected() {
        let s = Settings {
            window_types: WindowTypes::HannHann,
            steps_per_window_choice: 0, // 2 steps; Hann+Hann needs 4
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn median_limited_to_four_steps() {
        let s = Settings {
            method: ClassificationMethod::Median,
            steps_per_window_choice: 2, // 8 steps
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(Error::ConfigInvalid(_))));

        let ok = Settings {
            method: ClassificationMethod::Median,
            steps_per_window_choice: 1, // 4 steps
            ..Settings::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn steps_cannot_exceed_window() {
        let s = Settings {
            window_size_choice: 0,      // 8 samples
            steps_per_window_choice: 3, // 16 steps
            window_types: WindowTypes::HannRectangular,
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(Error::ConfigInvalid(_))));
    }
}
