use crate::error::{ExtractionError, Result};
use crate::types::{Segment, Sound};

/// Cut `[start, end]` (seconds) out of a recording. Sample `i` is kept when its
/// centre time `(i + 0.5) / sample_rate` lies inside the interval; the returned
/// segment's own time axis starts at zero.
pub fn extract_segment(sound: &Sound, start: f64, end: f64) -> Result<Segment> {
    if !start.is_finite() || !end.is_finite() || end <= start || sound.sample_rate == 0 {
        return Err(ExtractionError::InvalidInterval { start, end });
    }

    let sr = sound.sample_rate as f64;
    let first = (start * sr - 0.5).ceil().max(0.0) as usize;
    let last = (end * sr - 0.5).floor();
    if last < 0.0 || first >= sound.samples.len() {
        return Err(ExtractionError::EmptySegment { start, end });
    }
    let last = (last as usize).min(sound.samples.len() - 1);
    if last < first {
        return Err(ExtractionError::EmptySegment { start, end });
    }

    Ok(Segment {
        sound: Sound::new(sound.samples[first..=last].to_vec(), sound.sample_rate),
        start,
        end,
    })
}
