use ndarray::Array1;

use super::statistics::linear_slope;
use crate::acoustics::AcousticEngine;
use crate::error::{ExtractionError, Result};
use crate::types::{FeatureGroup, Segment};

/// Spectral shape (kurtosis, skewness, tilt) and the per-sample zero-crossing rate.
pub fn analyze_spectrum(engine: &dyn AcousticEngine, segment: &Segment) -> Result<FeatureGroup> {
    let spectrum = engine.spectrum(&segment.sound)?;
    let kurtosis = spectrum
        .kurtosis()
        .ok_or(ExtractionError::NoValidFrames("spectral kurtosis"))?;
    let skewness = spectrum
        .skewness()
        .ok_or(ExtractionError::NoValidFrames("spectral skewness"))?;

    // Tilt: regression of level (dB) on frequency over every bin
    let tilt = if spectrum.is_empty() {
        0.0
    } else {
        let levels: Array1<f64> = spectrum
            .real
            .iter()
            .map(|re| 20.0 * re.abs().log10())
            .collect();
        // A zero bin gives -inf dB
        if levels.iter().any(|level| !level.is_finite()) {
            return Err(ExtractionError::NoValidFrames("spectral tilt"));
        }
        let frequencies = Array1::from(spectrum.frequencies());
        linear_slope(frequencies.view(), levels.view())
            .ok_or(ExtractionError::NoValidFrames("spectral tilt"))?
    };

    let samples = segment.samples();
    if samples.is_empty() {
        return Err(ExtractionError::EmptySegment {
            start: segment.start,
            end: segment.end,
        });
    }
    // Crossings per sample, not per second
    let rate = count_zero_crossings(samples) as f64 / samples.len() as f64;

    Ok(FeatureGroup::new()
        .with("spectral_kurtosis", kurtosis)
        .with("spectral_skewness", skewness)
        .with("spectral_tilt", tilt)
        .with("zero_crossing_rate", rate))
}

/// Sign-bit changes between consecutive samples.
pub fn count_zero_crossings(samples: &[f64]) -> usize {
    samples
        .windows(2)
        .filter(|pair| pair[0].is_sign_negative() != pair[1].is_sign_negative())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acoustics::PraatEngine;
    use crate::types::Sound;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn segment(samples: Vec<f64>, sample_rate: u32) -> Segment {
        let sound = Sound::new(samples, sample_rate);
        let end = sound.duration();
        Segment {
            sound,
            start: 0.0,
            end,
        }
    }

    #[test]
    fn counts_sign_bit_changes() {
        assert_eq!(count_zero_crossings(&[1.0, -1.0, 1.0, 0.5, -0.2]), 3);
        assert_eq!(count_zero_crossings(&[0.0, -0.0, 0.0]), 2);
        assert_eq!(count_zero_crossings(&[0.3]), 0);
    }

    #[test]
    fn tone_has_twice_its_frequency_in_crossings() {
        let sample_rate = 16_000;
        let samples = (0..1600)
            .map(|i| (2.0 * PI * 500.0 * (i as f64 + 0.25) / sample_rate as f64).sin())
            .collect();
        let group = analyze_spectrum(&PraatEngine, &segment(samples, sample_rate)).unwrap();
        let rate = group.get("zero_crossing_rate").unwrap();
        assert_abs_diff_eq!(rate, 2.0 * 500.0 / sample_rate as f64, epsilon = 1e-3);
        assert!(group.get("spectral_tilt").unwrap().is_finite());
    }

    #[test]
    fn silence_is_an_error() {
        let result = analyze_spectrum(&PraatEngine, &segment(vec![0.0; 256], 16_000));
        assert!(result.is_err());
    }
}
