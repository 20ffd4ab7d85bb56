//! Analysis/synthesis window vectors and their overlap normalization.
//!
//! Each supported pairing is a pair of raised-cosine windows
//! `w(n) = c0 + c1·cos(2πn/W) + c2·cos(4πn/W)` (either side may be
//! rectangular, meaning "do not multiply"). Overlap-add reconstructs unit
//! gain when the pointwise product of the two windows, summed over all
//! `S` overlapping shifts, equals one; the sum of the product over shifts is
//! `S` times the product's constant term `P`, so one side is scaled by
//! `1 / (P·S)`.

use crate::config::WindowTypes;

/// Synthesis side of a window pairing.
#[derive(Debug, Clone, Copy)]
enum Synthesis {
    /// No synthesis window is applied.
    Rectangular,
    /// Raised-cosine coefficients.
    Cosine([f64; 3]),
    /// Pointwise reciprocal of the analysis window. Only valid for analysis
    /// windows with no zero samples (Hamming).
    ReciprocalAnalysis,
}

/// Catalog entry for one window pairing.
#[derive(Debug, Clone, Copy)]
pub struct WindowPair {
    /// Fewest steps per window for which overlap-add cancels the cosine
    /// terms of the window product.
    pub min_steps: usize,
    /// Analysis coefficients; `None` is rectangular.
    analysis: Option<[f64; 3]>,
    synthesis: Synthesis,
    /// Constant term of the pointwise product of the two windows. For the
    /// cosine pairings this is the product of the constant terms plus half
    /// the product of the first cosine coefficients.
    product_dc: f64,
}

const RECTANGULAR_HANN: WindowPair = WindowPair {
    min_steps: 2,
    analysis: None,
    synthesis: Synthesis::Cosine([0.5, -0.5, 0.0]),
    product_dc: 0.5,
};

const HANN_RECTANGULAR: WindowPair = WindowPair {
    min_steps: 2,
    analysis: Some([0.5, -0.5, 0.0]),
    synthesis: Synthesis::Rectangular,
    product_dc: 0.5,
};

const HANN_HANN: WindowPair = WindowPair {
    min_steps: 4,
    analysis: Some([0.5, -0.5, 0.0]),
    synthesis: Synthesis::Cosine([0.5, -0.5, 0.0]),
    product_dc: 0.375,
};

const BLACKMAN_HANN: WindowPair = WindowPair {
    min_steps: 4,
    analysis: Some([0.42, -0.5, 0.08]),
    synthesis: Synthesis::Cosine([0.5, -0.5, 0.0]),
    product_dc: 0.335,
};

const HAMMING_RECTANGULAR: WindowPair = WindowPair {
    min_steps: 2,
    analysis: Some([0.54, -0.46, 0.0]),
    synthesis: Synthesis::Rectangular,
    product_dc: 0.54,
};

const HAMMING_HANN: WindowPair = WindowPair {
    min_steps: 4,
    analysis: Some([0.54, -0.46, 0.0]),
    synthesis: Synthesis::Cosine([0.5, -0.5, 0.0]),
    product_dc: 0.385,
};

const HAMMING_INV_HAMMING: WindowPair = WindowPair {
    min_steps: 2,
    analysis: Some([0.54, -0.46, 0.0]),
    synthesis: Synthesis::ReciprocalAnalysis,
    product_dc: 1.0,
};

impl WindowPair {
    /// Catalog entry for the given pairing.
    pub const fn for_types(types: WindowTypes) -> &'static Self {
        match types {
            WindowTypes::RectangularHann => &RECTANGULAR_HANN,
            WindowTypes::HannRectangular => &HANN_RECTANGULAR,
            WindowTypes::HannHann => &HANN_HANN,
            WindowTypes::BlackmanHann => &BLACKMAN_HANN,
            WindowTypes::HammingRectangular => &HAMMING_RECTANGULAR,
            WindowTypes::HammingHann => &HAMMING_HANN,
            WindowTypes::HammingInvHamming => &HAMMING_INV_HAMMING,
        }
    }
}

/// Evaluate a raised-cosine window of length `len`, scaled by `scale`.
/// Evaluated in f64, stored as f32.
fn cosine_window(len: usize, coefficients: [f64; 3], scale: f64) -> Vec<f32> {
    let [c0, c1, c2] = coefficients;
    (0..len)
        .map(|n| {
            let phase = 2.0 * std::f64::consts::PI * n as f64 / len as f64;
            (scale * (c0 + c1 * phase.cos() + c2 * (2.0 * phase).cos())) as f32
        })
        .collect()
}

/// Precomputed analysis and synthesis window vectors for one pass.
#[derive(Debug)]
pub struct WindowBank {
    analysis: Option<Vec<f32>>,
    synthesis: Option<Vec<f32>>,
}

impl WindowBank {
    /// Build the window vectors for a window of `window_size` samples
    /// advancing `steps_per_window` times per window.
    ///
    /// The synthesis window is only needed when output will be produced;
    /// profiling passes set `with_synthesis` to false.
    ///
    /// When one side is rectangular the other carries the whole overlap
    /// normalization; otherwise the synthesis side carries it.
    pub fn new(
        types: WindowTypes,
        window_size: usize,
        steps_per_window: usize,
        with_synthesis: bool,
    ) -> Self {
        let pair = WindowPair::for_types(types);
        let multiplier = 1.0 / (pair.product_dc * steps_per_window as f64);
        let rectangular_out = matches!(pair.synthesis, Synthesis::Rectangular);

        let analysis = pair.analysis.map(|coefficients| {
            let scale = if rectangular_out { multiplier } else { 1.0 };
            cosine_window(window_size, coefficients, scale)
        });

        let synthesis = if !with_synthesis {
            None
        } else {
            match pair.synthesis {
                Synthesis::Rectangular => None,
                Synthesis::Cosine(coefficients) => {
                    Some(cosine_window(window_size, coefficients, multiplier))
                }
                Synthesis::ReciprocalAnalysis => {
                    let analysis = analysis
                        .as_deref()
                        .expect("reciprocal synthesis requires an analysis window");
                    Some(
                        analysis
                            .iter()
                            .map(|&a| (multiplier / a as f64) as f32)
                            .collect(),
                    )
                }
            }
        };

        Self {
            analysis,
            synthesis,
        }
    }

    /// Analysis window, if not rectangular.
    pub fn analysis(&self) -> Option<&[f32]> {
        self.analysis.as_deref()
    }

    /// Synthesis window, if not rectangular (or not built).
    pub fn synthesis(&self) -> Option<&[f32]> {
        self.synthesis.as_deref()
    }
}
