use ndarray::Array1;

use super::frames::{frame_slice, gaussian_window, window_samples, FrameAxis};
use crate::error::{ExtractionError, Result};
use crate::types::Sound;

const REFERENCE_POWER: f64 = 4.0e-10; // (2e-5 Pa)^2
const SILENCE_DB: f64 = -300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityParams {
    /// Lowest pitch the window must accommodate; sets the window length.
    pub min_pitch: f64,
    /// Seconds between frames; `0.0` selects `0.8 / min_pitch`.
    pub time_step: f64,
}

impl Default for IntensityParams {
    fn default() -> Self {
        Self {
            min_pitch: 100.0,
            time_step: 0.0,
        }
    }
}

/// Intensity contour in dB.
#[derive(Debug, Clone, PartialEq)]
pub struct Intensity {
    pub axis: FrameAxis,
    pub values: Array1<f64>,
}

impl Intensity {
    pub fn from_values(axis: FrameAxis, values: Vec<f64>) -> Self {
        Self {
            axis,
            values: Array1::from(values),
        }
    }

    pub fn compute(sound: &Sound, params: IntensityParams) -> Result<Self> {
        if !(params.min_pitch > 0.0) {
            return Err(ExtractionError::NoValidFrames("intensity"));
        }
        let window = 3.2 / params.min_pitch;
        let time_step = if params.time_step > 0.0 {
            params.time_step
        } else {
            0.8 / params.min_pitch
        };
        let axis = FrameAxis::centred(sound.duration(), window, time_step)?;
        let len = window_samples(window, sound.sample_rate);
        let weights = gaussian_window(len);
        let weight_sum: f64 = weights.iter().sum();

        let values = axis
            .times()
            .map(|centre| {
                let frame = frame_slice(&sound.samples, sound.sample_rate, centre, len);
                // DC removed, then Gaussian-weighted mean square
                let mean = frame.iter().sum::<f64>() / frame.len() as f64;
                let power = frame
                    .iter()
                    .zip(weights.iter())
                    .map(|(s, w)| w * (s - mean) * (s - mean))
                    .sum::<f64>()
                    / weight_sum;
                to_decibels(power)
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

    pub fn value_at(&self, time: f64) -> Option<f64> {
        self.axis.interpolate(time, |frame| self.values.get(frame).copied())
    }

    /// Mean taken in the energy domain, reported in dB.
    pub fn mean_energy(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mean_power = self.values.mapv(|db| 10f64.powf(db / 10.0)).mean()?;
        Some(10.0 * mean_power.log10())
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }
}

fn to_decibels(power: f64) -> f64 {
    if power < 1e-30 {
        SILENCE_DB
    } else {
        10.0 * (power / REFERENCE_POWER).log10()
    }
}
