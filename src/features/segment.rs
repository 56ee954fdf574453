use std::cell::Cell;
use std::time::{Duration, Instant};

use ndarray::Array1;
use tracing::{debug, warn};

use super::{
    analyze_dynamics, analyze_formant_trajectory, analyze_spectrum, count_zero_crossings,
    statistics, ZeroFill, DYNAMICS_KEYS, FORMANT_KEYS, INTENSITY_KEYS, SPECTRAL_KEYS,
    SPECTRAL_MOMENT_KEYS, VOICING_KEYS,
};
use crate::acoustics::{AcousticEngine, HarmonicityParams, IntensityParams, PitchParams};
use crate::audio::slicer::extract_segment;
use crate::config::AnalysisConstants;
use crate::error::{ExtractionError, Result};
use crate::types::{FeatureGroup, FeatureRecord, Segment, Sound};

/// Analysis settings scaled to a segment's duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveParams {
    pub window_length: f64,
    pub time_step: f64,
    pub min_pitch: f64,
}

impl AdaptiveParams {
    /// Shorter segments get finer steps and a pitch floor high enough to keep
    /// `min_cycles` periods in view.
    pub fn for_duration(duration: f64, constants: &AnalysisConstants) -> Self {
        let window_length = constants.max_window_length.min(duration / 3.0);
        let time_step = constants.max_time_step.min(window_length / 4.0);
        let min_pitch = constants
            .min_pitch_floor
            .max(constants.min_cycles / duration);
        Self {
            window_length,
            time_step,
            min_pitch,
        }
    }
}

/// Drives one interval through every measurement group.
pub struct SegmentAnalyzer<'a> {
    engine: &'a dyn AcousticEngine,
    constants: &'a AnalysisConstants,
}

impl<'a> SegmentAnalyzer<'a> {
    pub fn new(engine: &'a dyn AcousticEngine, constants: &'a AnalysisConstants) -> Self {
        Self { engine, constants }
    }

    /// Measures `[start, end]` of `recording`.
    ///
    /// Fails only when the interval cannot be sliced; every measurement group
    /// that fails afterwards is zero-filled. The voicing group is left out
    /// entirely for segments shorter than `voicing_min_duration`.
    pub fn analyze(&self, recording: &Sound, start: f64, end: f64) -> Result<FeatureRecord> {
        let segment = extract_segment(recording, start, end)?;
        let duration = segment.duration();
        let params = AdaptiveParams::for_duration(duration, self.constants);
        debug!(start, end, duration, ?params, "analyzing segment");

        let budget = Budget::start(self.constants.segment_budget_ms);
        let measure = |keys: &[&'static str], group: &dyn Fn() -> Result<FeatureGroup>| {
            budget.check().and_then(|_| group()).or_zero_fill(keys)
        };

        // Groups run in output order; each one zero-fills on its own failure
        let mut record = FeatureRecord::new();
        record.insert("duration", duration);
        record.merge(measure(&INTENSITY_KEYS, &|| {
            self.intensity_summary(&segment, &params)
        }));
        record.merge(measure(&SPECTRAL_MOMENT_KEYS, &|| {
            self.spectral_moments(&segment)
        }));
        record.merge(zero_crossings(&segment));
        // Too short for a stable pitch window: leave the keys out, not zero
        if duration >= self.constants.voicing_min_duration {
            record.merge(measure(&VOICING_KEYS, &|| self.voicing(&segment, &params)));
        }
        record.merge(measure(&SPECTRAL_KEYS, &|| {
            analyze_spectrum(self.engine, &segment)
        }));
        record.merge(measure(&FORMANT_KEYS, &|| {
            analyze_formant_trajectory(self.engine, &segment, self.constants)
        }));
        record.merge(measure(&DYNAMICS_KEYS, &|| {
            analyze_dynamics(self.engine, &segment)
        }));
        Ok(record)
    }

    fn intensity_summary(&self, segment: &Segment, params: &AdaptiveParams) -> Result<FeatureGroup> {
        let intensity = self.engine.intensity(
            &segment.sound,
            IntensityParams {
                min_pitch: params.min_pitch,
                time_step: params.time_step,
            },
        )?;
        let missing = || ExtractionError::NoValidFrames("intensity");
        Ok(FeatureGroup::new()
            .with("mean_intensity", intensity.mean_energy().ok_or_else(missing)?)
            .with("max_intensity", intensity.max().ok_or_else(missing)?)
            .with("min_intensity", intensity.min().ok_or_else(missing)?))
    }

    fn spectral_moments(&self, segment: &Segment) -> Result<FeatureGroup> {
        let spectrum = self.engine.spectrum(&segment.sound)?;
        let missing = || ExtractionError::NoValidFrames("spectrum");
        Ok(FeatureGroup::new()
            .with("spectral_centroid", spectrum.center_of_gravity().ok_or_else(missing)?)
            .with("spectral_spread", spectrum.standard_deviation().ok_or_else(missing)?))
    }

    fn voicing(&self, segment: &Segment, params: &AdaptiveParams) -> Result<FeatureGroup> {
        let harmonicity = self.engine.harmonicity(
            &segment.sound,
            HarmonicityParams {
                time_step: params.time_step,
                min_pitch: params.min_pitch,
                silence_threshold: self.constants.hnr_silence_threshold,
                periods_per_window: self.constants.hnr_periods_per_window,
            },
        )?;
        let pitch = self.engine.pitch(
            &segment.sound,
            PitchParams {
                time_step: params.time_step,
                floor: params.min_pitch,
                ceiling: self.constants.pitch_ceiling,
            },
        )?;

        // The -200 dB sentinel is finite and counts as a measured frame.
        let hnr: Array1<f64> = harmonicity
            .values
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .collect();
        let voiced: Array1<f64> = pitch.voiced().collect();
        let hnr_max = hnr.iter().copied().reduce(f64::max);
        let hnr_min = hnr.iter().copied().reduce(f64::min);
        Ok(FeatureGroup::new()
            .with("mean_hnr", statistics::mean(hnr.view()).unwrap_or(0.0))
            .with("min_hnr", hnr_min.unwrap_or(0.0))
            .with("max_hnr", hnr_max.unwrap_or(0.0))
            .with("mean_pitch", statistics::mean(voiced.view()).unwrap_or(0.0)))
    }
}

fn zero_crossings(segment: &Segment) -> FeatureGroup {
    let count = count_zero_crossings(segment.samples()) as f64;
    let duration = segment.duration();
    let ratio = if duration > 0.0 { count / duration } else { 0.0 };
    FeatureGroup::new()
        .with("z_crossings", count)
        .with("z_crossings_ratio", ratio)
}

/// Wall-clock allowance for one segment; `0` disables it.
///
/// Checked before each group starts. A group already running is never
/// interrupted, so one stalled analysis still runs to completion.
struct Budget {
    started: Instant,
    limit: Option<Duration>,
    reported: Cell<bool>,
}

impl Budget {
    fn start(limit_ms: u64) -> Self {
        Self {
            started: Instant::now(),
            limit: (limit_ms > 0).then(|| Duration::from_millis(limit_ms)),
            reported: Cell::new(false),
        }
    }

    fn check(&self) -> Result<()> {
        let elapsed = self.started.elapsed();
        match self.limit {
            Some(limit) if elapsed > limit => {
                if !self.reported.replace(true) {
                    warn!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        "segment budget exhausted; zero-filling remaining groups"
                    );
                }
                Err(ExtractionError::BudgetExceeded {
                    elapsed_ms: elapsed.as_millis(),
                })
            }
            _ => Ok(()),
        }
    }
}
