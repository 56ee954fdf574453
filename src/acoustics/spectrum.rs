use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::types::Sound;

/// One-sided complex spectrum of a whole sound.
///
/// Bin `i` sits at `i * df` Hz. Values are the FFT scaled by the sample period,
/// so they approximate the continuous Fourier transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub df: f64,
    pub real: Vec<f64>,
    pub imag: Vec<f64>,
}

impl Spectrum {
    pub fn from_sound(sound: &Sound) -> Self {
        if sound.is_empty() || sound.sample_rate == 0 {
            return Self {
                df: 0.0,
                real: Vec::new(),
                imag: Vec::new(),
            };
        }
        // Zero-pad to a power of two
        let fft_len = sound.samples.len().next_power_of_two();
        let dt = sound.sample_period();
        let mut buffer: Vec<Complex<f64>> = sound
            .samples
            .iter()
            .map(|&s| Complex::new(s, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(fft_len)
            .collect();
        FftPlanner::<f64>::new()
            .plan_fft_forward(fft_len)
            .process(&mut buffer);

        // Keep DC through Nyquist
        let bins = fft_len / 2 + 1;
        let (real, imag): (Vec<f64>, Vec<f64>) = buffer[..bins]
            .iter()
            .map(|c| (c.re * dt, c.im * dt))
            .unzip();
        Self {
            df: sound.sample_rate as f64 / fft_len as f64,
            real,
            imag,
        }
    }

    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.len()).map(|i| i as f64 * self.df).collect()
    }

    fn energies(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.real
            .iter()
            .zip(self.imag.iter())
            .enumerate()
            .map(|(i, (re, im))| (i as f64 * self.df, re * re + im * im))
    }

    /// Energy-weighted mean frequency.
    pub fn center_of_gravity(&self) -> Option<f64> {
        let (sum_energy, sum_weighted) = self
            .energies()
            .fold((0.0, 0.0), |(e, fe), (f, energy)| (e + energy, fe + f * energy));
        (sum_energy > 0.0).then(|| sum_weighted / sum_energy)
    }

    /// Energy-weighted central moment of order `n` about the centre of gravity.
    pub fn central_moment(&self, n: i32) -> Option<f64> {
        let centre = self.center_of_gravity()?;
        let (sum_energy, sum_moment) = self
            .energies()
            .fold((0.0, 0.0), |(e, m), (f, energy)| {
                (e + energy, m + (f - centre).powi(n) * energy)
            });
        (sum_energy > 0.0).then(|| sum_moment / sum_energy)
    }

    pub fn standard_deviation(&self) -> Option<f64> {
        self.central_moment(2).map(f64::sqrt)
    }

    pub fn skewness(&self) -> Option<f64> {
        let m2 = self.central_moment(2)?;
        let m3 = self.central_moment(3)?;
        (m2 > 0.0).then(|| m3 / m2.powf(1.5))
    }

    /// Excess kurtosis (0 for a Gaussian energy distribution).
    pub fn kurtosis(&self) -> Option<f64> {
        let m2 = self.central_moment(2)?;
        let m4 = self.central_moment(4)?;
        (m2 > 0.0).then(|| m4 / (m2 * m2) - 3.0)
    }
}
