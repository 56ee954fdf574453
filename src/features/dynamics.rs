use ndarray::Array1;

use super::statistics::{index_slope, range, std_dev};
use crate::acoustics::{AcousticEngine, IntensityParams, PitchParams};
use crate::error::{ExtractionError, Result};
use crate::types::{FeatureGroup, Segment};

/// Variability of the intensity and pitch contours over the segment,
/// measured with the engine's default analysis settings.
pub fn analyze_dynamics(engine: &dyn AcousticEngine, segment: &Segment) -> Result<FeatureGroup> {
    let intensity = engine.intensity(&segment.sound, IntensityParams::default())?;
    let values = intensity.values.view();
    let intensity_std = std_dev(values).ok_or(ExtractionError::NoValidFrames("intensity"))?;
    let intensity_range = range(values).ok_or(ExtractionError::NoValidFrames("intensity"))?;
    // Frame index on the x axis, so the slope is in dB per frame.
    let intensity_slope =
        index_slope(values).ok_or(ExtractionError::NoValidFrames("intensity slope"))?;


    let pitch = engine.pitch(&segment.sound, PitchParams::default())?;
    if pitch.is_empty() {
        return Err(ExtractionError::NoValidFrames("pitch"));
    }
    let voiced: Array1<f64> = pitch.voiced().collect();
    // Unvoiced frames are excluded from the spread but count toward the fraction
    let pitch_std = std_dev(voiced.view()).unwrap_or(0.0);
    let voiced_fraction = voiced.len() as f64 / pitch.len() as f64;

    Ok(FeatureGroup::new()
        .with("intensity_std", intensity_std)
        .with("intensity_range", intensity_range)
        .with("intensity_slope", intensity_slope)
        .with("pitch_std", pitch_std)
        .with("voiced_fraction", voiced_fraction))
}
