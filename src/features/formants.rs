use tracing::debug;

use super::FORMANT_KEYS;
use crate::acoustics::{AcousticEngine, FormantParams};
use crate::config::AnalysisConstants;
use crate::error::{ExtractionError, Result};
use crate::types::{FeatureGroup, Segment};

const POSITIONS: usize = 3;

/// F1..F3 sampled at three fractions of the segment's duration.
///
/// A reading that is undefined or non-positive is missing and gets the mean of
/// its order's valid readings; a reading outside its order's band is forced
/// to zero and never filled.
pub fn analyze_formant_trajectory(
    engine: &dyn AcousticEngine,
    segment: &Segment,
    constants: &AnalysisConstants,
) -> Result<FeatureGroup> {
    let duration = segment.duration();

    // Outside the band the tracker has too little (or too varied) signal
    if duration < constants.formant_min_duration {
        return Err(ExtractionError::SegmentTooShort {
            duration,
            minimum: constants.formant_min_duration,
        });
    }
    if duration > constants.formant_max_duration {
        return Err(ExtractionError::SegmentTooLong {
            duration,
            maximum: constants.formant_max_duration,
        });
    }

    // Short segments sample their edges instead of the inner thirds
    let fractions = if duration >= constants.formant_fraction_switch {
        constants.formant_fractions
    } else {
        constants.short_formant_fractions
    };
    let times = fractions.map(|fraction| fraction * duration);

    let track = engine.formants(
        &segment.sound,
        FormantParams {
            time_step: constants.formant_time_step,
            max_formants: constants.formant_count,
            max_formant_hz: constants.formant_ceiling,
            ..FormantParams::default()
        },
    )?;

    let mut group = FeatureGroup::new();
    for (order, band) in constants.formant_bands.iter().enumerate() {
        let readings = times.map(|time| track.value_at(order + 1, time));
        debug!(formant = order + 1, ?readings, ?times, "raw formant readings");

        // Undefined -> missing (filled below), out of band -> 0 (kept)
        let screened = readings.map(|reading| match reading {
            Some(hz) if hz.is_finite() && hz > 0.0 => Some(if band.contains(hz) { hz } else { 0.0 }),
            _ => None,
        });
        for (position, value) in fill_missing(screened).into_iter().enumerate() {
            group.push(FORMANT_KEYS[order * POSITIONS + position], value);
        }
    }
    Ok(group)
}

/// Missing readings take the mean of the positive ones; with none, all are zero.
fn fill_missing(values: [Option<f64>; POSITIONS]) -> [f64; POSITIONS] {
    let valid: Vec<f64> = values.iter().flatten().copied().filter(|&v| v > 0.0).collect();
    if valid.is_empty() {
        return [0.0; POSITIONS];
    }
    let mean = valid.iter().sum::<f64>() / valid.len() as f64;
    values.map(|value| value.unwrap_or(mean))
}
