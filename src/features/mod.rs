//! Per-segment measurement groups and the orchestrator that merges them.

mod dynamics;
mod formants;
mod landmarks;
mod segment;
mod spectral;
pub(crate) mod statistics;

pub use dynamics::analyze_dynamics;
pub use formants::analyze_formant_trajectory;
pub use landmarks::{intensity_ratios, locate_landmarks, landmark_features};
pub use segment::{AdaptiveParams, SegmentAnalyzer};
pub use spectral::{analyze_spectrum, count_zero_crossings};

use tracing::debug;

use crate::error::Result;
use crate::types::FeatureGroup;

pub const INTENSITY_KEYS: [&str; 3] = ["mean_intensity", "max_intensity", "min_intensity"];

pub const SPECTRAL_MOMENT_KEYS: [&str; 2] = ["spectral_centroid", "spectral_spread"];

pub const SPECTRAL_KEYS: [&str; 4] = [
    "spectral_kurtosis",
    "spectral_skewness",
    "spectral_tilt",
    "zero_crossing_rate",
];

pub const ZERO_CROSSING_KEYS: [&str; 2] = ["z_crossings", "z_crossings_ratio"];

pub const FORMANT_KEYS: [&str; 9] = [
    "F1_start", "F1_mid", "F1_end", "F2_start", "F2_mid", "F2_end", "F3_start", "F3_mid",
    "F3_end",
];

pub const VOICING_KEYS: [&str; 4] = ["mean_hnr", "min_hnr", "max_hnr", "mean_pitch"];

pub const DYNAMICS_KEYS: [&str; 5] = [
    "intensity_std",
    "intensity_range",
    "intensity_slope",
    "pitch_std",
    "voiced_fraction",
];

pub const LANDMARK_INTENSITY_KEYS: [&str; 3] = ["p1_intensity", "v_intensity", "p2_intensity"];

pub const RATIO_KEYS: [&str; 6] = [
    "mean_intensity_ratio",
    "p1_valley_ratio",
    "p2_valley_ratio",
    "mean_log_ratio",
    "rms_ratio",
    "max_contrast",
];

/// Every numeric column in output order.
pub fn measurement_columns() -> Vec<&'static str> {
    std::iter::once("duration")
        .chain(INTENSITY_KEYS)
        .chain(SPECTRAL_MOMENT_KEYS)
        .chain(SPECTRAL_KEYS)
        .chain(ZERO_CROSSING_KEYS)
        .chain(FORMANT_KEYS)
        .chain(VOICING_KEYS)
        .chain(DYNAMICS_KEYS)
        .chain(LANDMARK_INTENSITY_KEYS)
        .chain(RATIO_KEYS)
        .collect()
}

/// Replaces a failed measurement group with zeros under the same keys.
pub trait ZeroFill {
    fn or_zero_fill(self, keys: &[&'static str]) -> FeatureGroup;
}

impl ZeroFill for Result<FeatureGroup> {
    fn or_zero_fill(self, keys: &[&'static str]) -> FeatureGroup {
        match self {
            Ok(group) => group,
            Err(err) => {
                debug!(error = %err, group = keys.first().copied().unwrap_or(""), "zero-filling measurement group");
                FeatureGroup::zeros(keys)
            }
        }
    }
}
