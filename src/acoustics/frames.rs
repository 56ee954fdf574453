//! Short-term analysis frame layout and interpolation shared by every contour.

use std::f64::consts::PI;

use crate::error::{ExtractionError, Result};

/// Regularly spaced analysis frames over a sound whose time axis starts at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameAxis {
    pub first_time: f64,
    pub time_step: f64,
    pub count: usize,
}

impl FrameAxis {
    pub fn new(first_time: f64, time_step: f64, count: usize) -> Self {
        Self {
            first_time,
            time_step,
            count,
        }
    }

    /// As many `window`-long frames as fit in `duration`, `time_step` apart,
    /// with the whole block centred on the sound.
    pub fn centred(duration: f64, window: f64, time_step: f64) -> Result<Self> {
        if !(window > 0.0) || !(time_step > 0.0) || window > duration + 1e-9 {
            return Err(ExtractionError::AnalysisWindowMismatch { window, duration });
        }
        let count = ((duration - window) / time_step + 1e-9).floor().max(0.0) as usize + 1;
        let first_time = 0.5 * duration - 0.5 * (count - 1) as f64 * time_step;
        Ok(Self::new(first_time, time_step, count))
    }

    pub fn time(&self, frame: usize) -> f64 {
        self.first_time + frame as f64 * self.time_step
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(|frame| self.time(frame))
    }

    fn index_at(&self, time: f64) -> f64 {
        (time - self.first_time) / self.time_step
    }

    /// Linear interpolation between the two frames around `time`.
    ///
    /// Defined up to half a frame past either end. An undefined near frame
    /// makes the result undefined; an undefined far frame falls back to the
    /// near value.
    pub fn interpolate<F>(&self, time: f64, value: F) -> Option<f64>
    where
        F: Fn(usize) -> Option<f64>,
    {
        if self.count == 0 || !time.is_finite() {
            return None;
        }
        let real = self.index_at(time);
        let left = real.floor();
        let phase = real - left;
        let (near, far, weight) = if phase < 0.5 {
            (left, left + 1.0, phase)
        } else {
            (left + 1.0, left, 1.0 - phase)
        };
        let in_range = |idx: f64| idx >= 0.0 && idx < self.count as f64;
        if !in_range(near) {
            return None;
        }
        let near_value = value(near as usize)?;
        if !in_range(far) {
            return Some(near_value);
        }
        match value(far as usize) {
            Some(far_value) => Some(near_value + weight * (far_value - near_value)),
            None => Some(near_value),
        }
    }
}

/// Number of samples spanned by `window` seconds, at least one.
pub(crate) fn window_samples(window: f64, sample_rate: u32) -> usize {
    ((window * sample_rate as f64).round() as usize).max(1)
}

/// The `len` samples centred on `centre` seconds, shifted inward at the edges.
pub(crate) fn frame_slice(samples: &[f64], sample_rate: u32, centre: f64, len: usize) -> &[f64] {
    let len = len.min(samples.len());
    let centre_index = centre * sample_rate as f64 - 0.5;
    let start = (centre_index - (len as f64 - 1.0) / 2.0).round().max(0.0) as usize;
    let start = start.min(samples.len() - len);
    &samples[start..start + len]
}

/// Praat's Gaussian analysis window (edges at exp(-12)).
pub(crate) fn gaussian_window(len: usize) -> Vec<f64> {
    let edge = (-12.0_f64).exp();
    (0..len)
        .map(|i| {
            let x = (i as f64 + 0.5) / len as f64 - 0.5;
            ((-48.0 * x * x).exp() - edge) / (1.0 - edge)
        })
        .collect()
}

pub(crate) fn hann_window(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let x = (i as f64 + 0.5) / len as f64;
            0.5 - 0.5 * (2.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn centred_layout_fits_inside_sound() {
        let axis = FrameAxis::centred(0.1, 0.032, 0.01).unwrap();
        assert_eq!(axis.count, 7);
        assert_abs_diff_eq!(axis.time(3), 0.05, epsilon = 1e-12);
        assert!(axis.time(0) - 0.016 >= -1e-12);
    }

    #[test]
    fn window_longer_than_sound_is_rejected() {
        let err = FrameAxis::centred(0.02, 0.04, 0.01).unwrap_err();
        assert!(matches!(err, ExtractionError::AnalysisWindowMismatch { .. }));
    }

    #[test]
    fn interpolation_is_linear_between_frames() {
        let axis = FrameAxis::new(0.0, 1.0, 3);
        let values = [0.0, 10.0, 20.0];
        let at = |t| axis.interpolate(t, |i| Some(values[i]));
        assert_abs_diff_eq!(at(0.25).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(at(1.75).unwrap(), 17.5, epsilon = 1e-12);
        assert_eq!(at(2.4), Some(20.0));
        assert_eq!(at(2.6), None);
        assert_eq!(at(-0.6), None);
    }

    #[test]
    fn undefined_near_frame_is_undefined() {
        let axis = FrameAxis::new(0.0, 1.0, 2);
        assert_eq!(axis.interpolate(0.2, |i| (i == 1).then_some(5.0)), None);
        assert_eq!(axis.interpolate(0.8, |i| (i == 1).then_some(5.0)), Some(5.0));
    }

    #[test]
    fn frame_slice_stays_in_bounds() {
        let samples: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let slice = frame_slice(&samples, 1000, 0.001, 20);
        assert_eq!(slice.len(), 20);
        assert_eq!(slice[0], 0.0);
        let slice = frame_slice(&samples, 1000, 0.0995, 20);
        assert_eq!(slice[19], 99.0);
    }

    #[test]
    fn gaussian_window_peaks_in_the_middle() {
        let window = gaussian_window(101);
        assert!(window[50] > 0.99);
        assert!(window[0] < 0.01);
    }
}
