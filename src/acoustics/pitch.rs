//! Autocorrelation periodicity analysis: pitch contours and harmonicity (HNR).

use ndarray::Array1;

use super::frames::{frame_slice, hann_window, window_samples, FrameAxis};
use crate::error::{ExtractionError, Result};
use crate::types::Sound;

const VOICING_THRESHOLD: f64 = 0.45;
const PITCH_SILENCE_THRESHOLD: f64 = 0.03;
const OCTAVE_COST: f64 = 0.01;
const PITCH_PERIODS_PER_WINDOW: f64 = 3.0;
/// Praat's harmonicity value for frames without measurable periodicity.
pub const HNR_UNDEFINED_DB: f64 = -200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchParams {
    /// Seconds between frames; `0.0` selects `0.75 / floor`.
    pub time_step: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for PitchParams {
    fn default() -> Self {
        Self {
            time_step: 0.0,
            floor: 75.0,
            ceiling: 600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicityParams {
    pub time_step: f64,
    pub min_pitch: f64,
    /// Frames whose peak is below this fraction of the global peak are silent.
    pub silence_threshold: f64,
    pub periods_per_window: f64,
}

impl Default for HarmonicityParams {
    fn default() -> Self {
        Self {
            time_step: 0.01,
            min_pitch: 75.0,
            silence_threshold: 0.1,
            periods_per_window: 1.0,
        }
    }
}

/// Fundamental frequency per frame; `0.0` marks an unvoiced frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Pitch {
    pub axis: FrameAxis,
    pub frequencies: Array1<f64>,
}

impl Pitch {
    pub fn from_frames(axis: FrameAxis, frequencies: Vec<f64>) -> Self {
        Self {
            axis,
            frequencies: Array1::from(frequencies),
        }
    }

    pub fn compute(sound: &Sound, params: PitchParams) -> Result<Self> {
        if !(params.floor > 0.0) || params.ceiling <= params.floor {
            return Err(ExtractionError::NoValidFrames("pitch"));
        }
        let time_step = if params.time_step > 0.0 {
            params.time_step
        } else {
            0.75 / params.floor
        };
        let analysis = PeriodicityAnalysis {
            window: PITCH_PERIODS_PER_WINDOW / params.floor,
            time_step,
            floor: params.floor,
            ceiling: params.ceiling,
            silence_threshold: PITCH_SILENCE_THRESHOLD,
            octave_cost: OCTAVE_COST,
            method: Correlation::Windowed,
        };
        let (axis, frames) = analysis.run(sound)?;
        // Weak peaks count as unvoiced, stored as 0 Hz
        let frequencies = frames
            .into_iter()
            .map(|frame| match frame {
                FramePeriodicity::Periodic {
                    frequency,
                    strength,
                } if strength >= VOICING_THRESHOLD => frequency,
                _ => 0.0,
            })
            .collect();
        Ok(Self::from_frames(axis, frequencies))
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn voiced(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies.iter().copied().filter(|&f| f > 0.0)
    }
}

/// Harmonics-to-noise ratio per frame in dB.
#[derive(Debug, Clone, PartialEq)]
pub struct Harmonicity {
    pub axis: FrameAxis,
    pub values: Array1<f64>,
}

impl Harmonicity {
    pub fn from_values(axis: FrameAxis, values: Vec<f64>) -> Self {
        Self {
            axis,
            values: Array1::from(values),
        }
    }

    pub fn compute(sound: &Sound, params: HarmonicityParams) -> Result<Self> {
        if !(params.min_pitch > 0.0) || !(params.periods_per_window > 0.0) {
            return Err(ExtractionError::NoValidFrames("harmonicity"));
        }
        let analysis = PeriodicityAnalysis {
            window: params.periods_per_window / params.min_pitch,
            time_step: params.time_step,
            floor: params.min_pitch,
            ceiling: 0.5 * sound.sample_rate as f64,
            silence_threshold: params.silence_threshold,
            octave_cost: 0.0,
            method: Correlation::Cross,
        };
        let (axis, frames) = analysis.run(sound)?;
        let values = frames
            .into_iter()
            .map(|frame| match frame {
                FramePeriodicity::Periodic { strength, .. } if strength > 0.0 => {
                    // Periodic to aperiodic energy, in dB
                    let r = strength.min(1.0 - 1e-15);
                    10.0 * (r / (1.0 - r)).log10()
                }
                _ => HNR_UNDEFINED_DB,
            })
            .collect();
        Ok(Self::from_values(axis, values))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FramePeriodicity {
    Silent,
    Aperiodic,
    Periodic { frequency: f64, strength: f64 },
}

/// How lag correlations are normalised within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Correlation {
    /// Hann-windowed autocorrelation divided by the window's own autocorrelation.
    Windowed,
    /// Unwindowed correlation between the frame and its lagged copy.
    Cross,
}

struct PeriodicityAnalysis {
    method: Correlation,
    window: f64,
    time_step: f64,
    floor: f64,
    ceiling: f64,
    silence_threshold: f64,
    octave_cost: f64,
}

impl PeriodicityAnalysis {
    fn run(&self, sound: &Sound) -> Result<(FrameAxis, Vec<FramePeriodicity>)> {
        let duration = sound.duration();
        let axis = FrameAxis::centred(duration, self.window, self.time_step)?;
        let sample_rate = sound.sample_rate as f64;
        let len = window_samples(self.window, sound.sample_rate);
        // Candidate periods between the ceiling and the floor, in samples
        let min_lag = ((sample_rate / self.ceiling).floor() as usize).max(2);
        let lag_limit = match self.method {
            Correlation::Windowed => len.saturating_sub(2),
            Correlation::Cross => len / 2,
        };
        let max_lag = ((sample_rate / self.floor).ceil() as usize).min(lag_limit);
        if max_lag <= min_lag {
            return Err(ExtractionError::AnalysisWindowMismatch {
                window: self.window,
                duration,
            });
        }

        let window = hann_window(len);
        let window_ac = autocorrelation(&window, max_lag + 2);
        // Frames far quieter than the whole sound are silent
        let global_peak = sound.peak();

        let frames = axis
            .times()
            .map(|centre| {
                let frame = frame_slice(&sound.samples, sound.sample_rate, centre, len);
                self.analyse_frame(
                    frame,
                    &window,
                    &window_ac,
                    global_peak,
                    min_lag,
                    max_lag,
                    sample_rate,
                )
            })
            .collect();
        Ok((axis, frames))
    }

    #[allow(clippy::too_many_arguments)]
    fn analyse_frame(
        &self,
        frame: &[f64],
        window: &[f64],
        window_ac: &[f64],
        global_peak: f64,
        min_lag: usize,
        max_lag: usize,
        sample_rate: f64,
    ) -> FramePeriodicity {
        let mean = frame.iter().sum::<f64>() / frame.len() as f64;
        let local_peak = frame.iter().fold(0.0_f64, |acc, s| acc.max((s - mean).abs()));
        if global_peak <= 0.0 || local_peak < self.silence_threshold * global_peak {
            return FramePeriodicity::Silent;
        }

        let normalised = match self.method {
            Correlation::Windowed => {
                let windowed: Vec<f64> = frame
                    .iter()
                    .zip(window.iter())
                    .map(|(s, w)| (s - mean) * w)
                    .collect();
                let raw = autocorrelation(&windowed, max_lag + 2);
                if raw[0] <= 0.0 {
                    return FramePeriodicity::Silent;
                }
                raw.iter()
                    .zip(window_ac.iter())
                    .map(|(r, rw)| {
                        // divide out the window's own autocorrelation, both normalised at lag 0
                        if *rw > 0.0 {
                            (r / raw[0]) / (rw / window_ac[0])
                        } else {
                            0.0
                        }
                    })
                    .collect::<Vec<f64>>()
            }
            Correlation::Cross => {
                let centred: Vec<f64> = frame.iter().map(|s| s - mean).collect();
                cross_correlation(&centred, max_lag + 2)
            }
        };

        // Local maxima, refined by a parabola through the three lags around them
        let mut best: Option<(f64, f64, f64)> = None; // (score, frequency, strength)
        for lag in min_lag..=max_lag {
            let (prev, here, next) = (normalised[lag - 1], normalised[lag], normalised[lag + 1]);
            if here <= 0.0 || here < prev || here < next {
                continue;
            }
            let curvature = prev - 2.0 * here + next;
            let (offset, strength) = if curvature < 0.0 {
                let offset = 0.5 * (prev - next) / curvature;
                (offset, here - 0.25 * (prev - next) * offset)
            } else {
                (0.0, here)
            };
            let frequency = sample_rate / (lag as f64 + offset);
            if frequency < self.floor || frequency > self.ceiling {
                continue;
            }
            let strength = strength.min(1.0);
            // Penalise low candidates so subharmonics lose close calls
            let score = strength - self.octave_cost * (self.ceiling / frequency).log2();
            if best.map_or(true, |(top, _, _)| score > top) {
                best = Some((score, frequency, strength));
            }
        }

        match best {
            Some((_, frequency, strength)) => FramePeriodicity::Periodic {
                frequency,
                strength,
            },
            None => FramePeriodicity::Aperiodic,
        }
    }
}

/// Correlation coefficient between the leading and lagged parts, lags `0..lags`.
fn cross_correlation(signal: &[f64], lags: usize) -> Vec<f64> {
    (0..lags)
        .map(|lag| {
            let (head, tail) = (&signal[..signal.len() - lag], &signal[lag..]);
            let dot: f64 = head.iter().zip(tail.iter()).map(|(a, b)| a * b).sum();
            let energy_head: f64 = head.iter().map(|a| a * a).sum();
            let energy_tail: f64 = tail.iter().map(|b| b * b).sum();
            let denominator = (energy_head * energy_tail).sqrt();
            if denominator > 0.0 {
                dot / denominator
            } else {
                0.0
            }
        })
        .collect()
}

/// Raw autocorrelation for lags `0..lags`.
fn autocorrelation(signal: &[f64], lags: usize) -> Vec<f64> {
    (0..lags)
        .map(|lag| {
            signal
                .iter()
                .zip(signal.iter().skip(lag))
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    const SAMPLE_RATE: u32 = 16_000;

    fn pulse_train(f0: f64, seconds: f64) -> Sound {
        let len = (seconds * SAMPLE_RATE as f64) as usize;
        let samples = (0..len)
            .map(|i| {
                let t = i as f64 / SAMPLE_RATE as f64;
                (1..=5)
                    .map(|h| (2.0 * PI * f0 * h as f64 * t).sin() / h as f64)
                    .sum::<f64>()
                    * 0.2
            })
            .collect();
        Sound::new(samples, SAMPLE_RATE)
    }

    fn noise(seconds: f64) -> Sound {
        let len = (seconds * SAMPLE_RATE as f64) as usize;
        let mut state: u32 = 0x2545_f491;
        let samples = (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f64 / (1u32 << 24) as f64 - 0.5
            })
            .collect();
        Sound::new(samples, SAMPLE_RATE)
    }

    #[test]
    fn tracks_fundamental_of_harmonic_signal() {
        let pitch = Pitch::compute(&pulse_train(160.0, 0.3), PitchParams::default()).unwrap();
        let voiced: Vec<f64> = pitch.voiced().collect();
        assert!(voiced.len() as f64 >= 0.9 * pitch.len() as f64);
        for f0 in voiced {
            assert_abs_diff_eq!(f0, 160.0, epsilon = 3.0);
        }
    }

    #[test]
    fn voices_every_frame_across_the_speaking_range() {
        for f0 in [120.0, 200.0] {
            let pitch = Pitch::compute(&pulse_train(f0, 0.3), PitchParams::default()).unwrap();
            assert!(pitch.len() > 0);
            assert_eq!(pitch.voiced().count(), pitch.len(), "unvoiced frames at {f0} Hz");
            for value in pitch.voiced() {
                assert_abs_diff_eq!(value, f0, epsilon = 2.0);
            }
        }
    }

    #[test]
    fn silence_is_unvoiced() {
        let pitch =
            Pitch::compute(&Sound::new(vec![0.0; 8000], SAMPLE_RATE), PitchParams::default())
                .unwrap();
        assert_eq!(pitch.voiced().count(), 0);
    }

    #[test]
    fn harmonic_signal_has_high_hnr() {
        let params = HarmonicityParams {
            min_pitch: 75.0,
            periods_per_window: 2.0,
            ..HarmonicityParams::default()
        };
        let hnr = Harmonicity::compute(&pulse_train(150.0, 0.2), params).unwrap();
        let mean = hnr.values.mean().unwrap();
        assert!(mean > 10.0, "mean HNR {mean}");
    }

    #[test]
    fn noise_has_low_hnr() {
        let params = HarmonicityParams {
            min_pitch: 75.0,
            periods_per_window: 2.0,
            ..HarmonicityParams::default()
        };
        let hnr = Harmonicity::compute(&noise(0.2), params).unwrap();
        let mean = hnr.values.mean().unwrap();
        assert!(mean < 5.0, "mean HNR {mean}");
    }

    #[test]
    fn short_sound_cannot_fit_pitch_window() {
        let err = Pitch::compute(&pulse_train(150.0, 0.03), PitchParams::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::AnalysisWindowMismatch { .. }));
    }
}
