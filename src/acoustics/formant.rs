//! Burg LPC formant tracking.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use tracing::trace;

use super::frames::{frame_slice, gaussian_window, window_samples, FrameAxis};
use crate::audio::resample::resample;
use crate::error::{ExtractionError, Result};
use crate::types::Sound;

const MIN_FORMANT_HZ: f64 = 50.0;
const ROOT_ITERATIONS: usize = 500;
const ROOT_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantParams {
    /// Seconds between frames; `0.0` selects a quarter of `window_length`.
    pub time_step: f64,
    pub max_formants: usize,
    /// Analysis ceiling in Hz; audio is resampled to twice this rate.
    pub max_formant_hz: f64,
    /// Effective window length; the Gaussian spans twice this.
    pub window_length: f64,
    pub pre_emphasis_from: f64,
}

impl Default for FormantParams {
    fn default() -> Self {
        Self {
            time_step: 0.0,
            max_formants: 5,
            max_formant_hz: 5500.0,
            window_length: 0.025,
            pre_emphasis_from: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantPoint {
    pub frequency: f64,
    pub bandwidth: f64,
}

/// Formant candidates per frame, ascending in frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct FormantTrack {
    pub axis: FrameAxis,
    pub frames: Vec<Vec<FormantPoint>>,
}

impl FormantTrack {
    pub fn compute(sound: &Sound, params: FormantParams) -> Result<Self> {
        if params.max_formants == 0 || !(params.max_formant_hz > 0.0) {
            return Err(ExtractionError::NoValidFrames("formants"));
        }
        let duration = sound.duration();

        // Downsample so the analysis ceiling becomes the Nyquist frequency
        let target_rate = (2.0 * params.max_formant_hz).round() as u32;
        let sound = if sound.sample_rate > target_rate {
            let samples = resample(&sound.samples, sound.sample_rate, target_rate)
                .map_err(|_| ExtractionError::NoValidFrames("formant resampling"))?;
            Sound::new(samples, target_rate)
        } else {
            sound.clone()
        };
        let emphasised = pre_emphasis(&sound, params.pre_emphasis_from);

        // Clamp the window so short sounds still get one centred frame
        let window = (2.0 * params.window_length).min(sound.duration());
        let time_step = if params.time_step > 0.0 {
            params.time_step
        } else {
            0.25 * params.window_length
        };
        let axis = FrameAxis::centred(sound.duration(), window, time_step)?;
        // Two poles per formant
        let order = 2 * params.max_formants;
        let len = window_samples(window, sound.sample_rate);
        if len <= order {
            return Err(ExtractionError::AnalysisWindowMismatch { window, duration });
        }
        let weights = gaussian_window(len);
        let sample_rate = sound.sample_rate as f64;

        let frames = axis
            .times()
            .map(|centre| {
                let frame: Vec<f64> = frame_slice(&emphasised, sound.sample_rate, centre, len)
                    .iter()
                    .zip(weights.iter())
                    .map(|(s, w)| s * w)
                    .collect();
                // A degenerate frame (silence) yields no candidates
                let mut formants = burg(&frame, order)
                    .map(|coefficients| roots_to_formants(&coefficients, sample_rate))
                    .unwrap_or_default();
                formants.truncate(params.max_formants);
                formants
            })
            .collect::<Vec<_>>();
        trace!(frames = frames.len(), sample_rate, "formant track computed");
        Ok(Self { axis, frames })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Frequency of formant `order` (1-based) at `time`, if defined.
    pub fn value_at(&self, order: usize, time: f64) -> Option<f64> {
        if order == 0 {
            return None;
        }
        self.axis.interpolate(time, |frame| {
            self.frames
                .get(frame)
                .and_then(|points| points.get(order - 1))
                .map(|point| point.frequency)
        })
    }
}

/// First-order high-pass boosting everything above `from_hz` by 6 dB/octave.
fn pre_emphasis(sound: &Sound, from_hz: f64) -> Vec<f64> {
    let alpha = (-2.0 * PI * from_hz * sound.sample_period()).exp();
    let mut previous = 0.0;
    sound
        .samples
        .iter()
        .map(|&sample| {
            let out = sample - alpha * previous;
            previous = sample;
            out
        })
        .collect()
}

/// Burg's method; returns predictor coefficients `a` with
/// `x[n] ≈ Σ a[k] · x[n - 1 - k]`, or `None` for a degenerate frame.
fn burg(signal: &[f64], order: usize) -> Option<Vec<f64>> {
    let n = signal.len();
    if n <= order || signal.iter().all(|&s| s == 0.0) {
        return None;
    }
    // Forward and backward prediction errors, shifted by one sample
    let mut forward = signal[..n - 1].to_vec();
    let mut backward = signal[1..].to_vec();
    let mut coefficients = vec![0.0; order];
    let mut previous = vec![0.0; order];

    for k in 0..order {
        let span = n - k - 1;
        let (mut numerator, mut denominator) = (0.0, 0.0);
        for j in 0..span {
            numerator += forward[j] * backward[j];
            denominator += forward[j] * forward[j] + backward[j] * backward[j];
        }
        if denominator <= 0.0 {
            return None;
        }
        // Reflection coefficient, then the Levinson update of the lower orders
        coefficients[k] = 2.0 * numerator / denominator;
        for i in 0..k {
            coefficients[i] = previous[i] - coefficients[k] * previous[k - 1 - i];
        }
        if k + 1 == order {
            break;
        }
        previous[..=k].copy_from_slice(&coefficients[..=k]);
        for j in 0..span - 1 {
            forward[j] -= previous[k] * backward[j];
            backward[j] = backward[j + 1] - previous[k] * forward[j + 1];
        }
    }
    coefficients.iter().all(|c| c.is_finite()).then_some(coefficients)
}

fn roots_to_formants(coefficients: &[f64], sample_rate: f64) -> Vec<FormantPoint> {
    // z^p - a0 z^(p-1) - ... - a(p-1)
    let polynomial: Vec<f64> = std::iter::once(1.0)
        .chain(coefficients.iter().map(|a| -a))
        .collect();
    let nyquist = 0.5 * sample_rate;
    let mut formants: Vec<FormantPoint> = polynomial_roots(&polynomial)
        .into_iter()
        // One root per conjugate pair; unstable roots are reflected inside the circle
        .filter(|root| root.im > 0.0)
        .map(|root| {
            if root.norm() > 1.0 {
                root.conj().inv()
            } else {
                root
            }
        })
        .map(|root| FormantPoint {
            frequency: root.arg() * sample_rate / (2.0 * PI),
            bandwidth: -root.norm().ln() * sample_rate / PI,
        })
        .filter(|point| {
            point.frequency.is_finite()
                && point.frequency > MIN_FORMANT_HZ
                && point.frequency < nyquist - MIN_FORMANT_HZ
        })
        .collect();
    formants.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
    formants
}

/// Durand–Kerner iteration on a monic polynomial (coefficients highest power first).
fn polynomial_roots(polynomial: &[f64]) -> Vec<Complex<f64>> {
    let degree = polynomial.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }
    // Powers of a non-real seed keep the starting points distinct
    let seed = Complex::new(0.4, 0.9);
    let mut roots: Vec<Complex<f64>> = (0..degree).map(|k| seed.powu(k as u32)).collect();
    let evaluate = |z: Complex<f64>| {
        polynomial
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * z + c)
    };

    for _ in 0..ROOT_ITERATIONS {
        let mut largest_step: f64 = 0.0;
        for i in 0..degree {
            let z = roots[i];
            let denominator = roots
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(Complex::new(1.0, 0.0), |acc, (_, &other)| acc * (z - other));
            if denominator.norm() == 0.0 {
                continue;
            }
            let step = evaluate(z) / denominator;
            roots[i] = z - step;
            largest_step = largest_step.max(step.norm());
        }
        if largest_step < ROOT_TOLERANCE {
            break;
        }
    }
    roots
}
