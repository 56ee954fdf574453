use super::{ZeroFill, RATIO_KEYS};
use crate::acoustics::Intensity;
use crate::annotation::AnnotationTier;
use crate::error::{ExtractionError, Result};
use crate::types::{FeatureGroup, IntensityLandmarks};

const P1: &str = "p1";
const VALLEY: &str = "v";
const P2: &str = "p2";

/// Samples the recording's intensity at the p1, v and p2 points anchored to
/// the interval's start, midpoint and end.
///
/// Points are scanned in tier order and a later match replaces an earlier one.
/// A point whose intensity is undefined does not match.
pub fn locate_landmarks(
    intensity: &Intensity,
    tier: &AnnotationTier,
    start: f64,
    end: f64,
    tolerance: f64,
) -> IntensityLandmarks {
    let midpoint = 0.5 * (start + end);
    let mut landmarks = IntensityLandmarks::default();
    for point in tier.points() {
        // Each mark has its own anchor; the bound is strict
        let slot = match point.mark.as_str() {
            P1 if (point.time - start).abs() < tolerance => &mut landmarks.p1,
            VALLEY if (point.time - midpoint).abs() < tolerance => &mut landmarks.v,
            P2 if (point.time - end).abs() < tolerance => &mut landmarks.p2,
            _ => continue,
        };
        if let Some(value) = intensity.value_at(point.time) {
            *slot = Some(value);
        }
    }
    landmarks
}

/// Depth of the valley relative to its flanking plateaus.
pub fn intensity_ratios(landmarks: &IntensityLandmarks) -> Result<FeatureGroup> {
    let (p1, v, p2) = landmarks.complete().ok_or_else(|| {
        let missing = if landmarks.p1.is_none() {
            P1
        } else if landmarks.v.is_none() {
            VALLEY
        } else {
            P2
        };
        ExtractionError::LandmarkUnmatched(missing)
    })?;
    // Ratios of dB values, not of energies
    let plateau = 0.5 * (p1 + p2);
    let group = FeatureGroup::new()
        .with("mean_intensity_ratio", v / plateau)
        .with("p1_valley_ratio", v / p1)
        .with("p2_valley_ratio", v / p2)
        .with("mean_log_ratio", 20.0 * (v / plateau).log10())
        .with("rms_ratio", v / (0.5 * (p1 * p1 + p2 * p2)).sqrt())
        .with("max_contrast", v / p1.min(p2));
    if group.iter().any(|(_, value)| !value.is_finite()) {
        return Err(ExtractionError::NoValidFrames("intensity ratios"));
    }
    Ok(group)
}

/// Raw landmark intensities (zero when unmatched) followed by the six ratios.
pub fn landmark_features(landmarks: &IntensityLandmarks) -> FeatureGroup {
    let mut group = FeatureGroup::new()
        .with("p1_intensity", landmarks.p1.unwrap_or(0.0))
        .with("v_intensity", landmarks.v.unwrap_or(0.0))
        .with("p2_intensity", landmarks.p2.unwrap_or(0.0));
    for (key, value) in intensity_ratios(landmarks).or_zero_fill(&RATIO_KEYS).iter() {
        group.push(key, value);
    }
    group
}
