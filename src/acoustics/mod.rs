//! Praat-style short-term acoustic analyses.
//!
//! Analyzers reach these through [`AcousticEngine`] so that measurement
//! policies can be exercised against canned contours in tests.

pub mod formant;
pub mod frames;
pub mod intensity;
pub mod pitch;
pub mod spectrum;

pub use formant::{FormantParams, FormantPoint, FormantTrack};
pub use frames::FrameAxis;
pub use intensity::{Intensity, IntensityParams};
pub use pitch::{Harmonicity, HarmonicityParams, Pitch, PitchParams, HNR_UNDEFINED_DB};
pub use spectrum::Spectrum;

use crate::error::{ExtractionError, Result};
use crate::types::Sound;

/// Source of the contour objects a segment is measured from.
pub trait AcousticEngine: Send + Sync {
    fn spectrum(&self, sound: &Sound) -> Result<Spectrum>;

    fn intensity(&self, sound: &Sound, params: IntensityParams) -> Result<Intensity>;

    fn pitch(&self, sound: &Sound, params: PitchParams) -> Result<Pitch>;

    fn harmonicity(&self, sound: &Sound, params: HarmonicityParams) -> Result<Harmonicity>;

    fn formants(&self, sound: &Sound, params: FormantParams) -> Result<FormantTrack>;
}

/// Native implementation of the classical Praat algorithms.
#[derive(Debug, Default, Clone, Copy)]
pub struct PraatEngine;

impl PraatEngine {
    pub fn new() -> Self {
        Self
    }
}

impl AcousticEngine for PraatEngine {
    fn spectrum(&self, sound: &Sound) -> Result<Spectrum> {
        if sound.is_empty() {
            return Err(ExtractionError::NoValidFrames("spectrum"));
        }
        Ok(Spectrum::from_sound(sound))
    }

    fn intensity(&self, sound: &Sound, params: IntensityParams) -> Result<Intensity> {
        Intensity::compute(sound, params)
    }

    fn pitch(&self, sound: &Sound, params: PitchParams) -> Result<Pitch> {
        Pitch::compute(sound, params)
    }

    fn harmonicity(&self, sound: &Sound, params: HarmonicityParams) -> Result<Harmonicity> {
        Harmonicity::compute(sound, params)
    }

    fn formants(&self, sound: &Sound, params: FormantParams) -> Result<FormantTrack> {
        FormantTrack::compute(sound, params)
    }
}
