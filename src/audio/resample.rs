use anyhow::{ensure, Context, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::trace;

/// Band-limited resampling of mono `samples` from `source_rate` to `target_rate`.
///
/// The output holds `ceil(len * target_rate / source_rate)` samples aligned with
/// the input: the resampler's filter delay is trimmed off the front.
pub fn resample(samples: &[f64], source_rate: u32, target_rate: u32) -> Result<Vec<f64>> {
    ensure!(source_rate > 0, "source sample rate must be positive");
    ensure!(target_rate > 0, "target sample rate must be positive");
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95, // of the lower Nyquist
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = target_rate as f64 / source_rate as f64;
    // one chunk covering the whole input
    let mut resampler = SincFixedIn::<f64>::new(ratio, 1.0, params, samples.len(), 1)
        .context("failed to create resampler")?;

    let delay = resampler.output_delay();
    let expected = ((samples.len() as f64) * ratio).ceil().max(1.0) as usize;
    let mut output = resampler
        .process(&[samples], None)
        .context("resampling failed")?
        .swap_remove(0);
    // Flush zeros through until the delayed tail has come out.
    while output.len() < delay + expected {
        let tail = resampler
            .process_partial(None::<&[Vec<f64>]>, None)
            .context("resampling flush failed")?
            .swap_remove(0);
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    let start = delay.min(output.len());
    let end = (delay + expected).min(output.len());
    trace!(source_rate, target_rate, delay, produced = end - start, "resampled");
    Ok(output[start..end].to_vec())
}
