#![allow(dead_code)]

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub const SAMPLE_RATE: u32 = 16_000;

pub enum Tier<'a> {
    Intervals(&'a str, Vec<(f64, f64, &'a str)>),
    Points(&'a str, Vec<(f64, &'a str)>),
}

/// Long-format TextGrid text for the given tiers.
pub fn textgrid(xmax: f64, tiers: &[Tier]) -> String {
    let mut out = String::new();
    writeln!(out, "File type = \"ooTextFile\"").unwrap();
    writeln!(out, "Object class = \"TextGrid\"\n").unwrap();
    writeln!(out, "xmin = 0\nxmax = {xmax}\ntiers? <exists>\nsize = {}\nitem []:", tiers.len()).unwrap();
    for (idx, tier) in tiers.iter().enumerate() {
        writeln!(out, "    item [{}]:", idx + 1).unwrap();
        match tier {
            Tier::Intervals(name, intervals) => {
                writeln!(out, "        class = \"IntervalTier\"\n        name = \"{name}\"").unwrap();
                writeln!(out, "        xmin = 0\n        xmax = {xmax}").unwrap();
                writeln!(out, "        intervals: size = {}", intervals.len()).unwrap();
                for (i, (start, end, text)) in intervals.iter().enumerate() {
                    writeln!(
                        out,
                        "        intervals [{}]:\n            xmin = {start}\n            xmax = {end}\n            text = \"{text}\"",
                        i + 1
                    )
                    .unwrap();
                }
            }
            Tier::Points(name, points) => {
                writeln!(out, "        class = \"TextTier\"\n        name = \"{name}\"").unwrap();
                writeln!(out, "        xmin = 0\n        xmax = {xmax}").unwrap();
                writeln!(out, "        points: size = {}", points.len()).unwrap();
                for (i, (time, mark)) in points.iter().enumerate() {
                    writeln!(
                        out,
                        "        points [{}]:\n            number = {time}\n            mark = \"{mark}\"",
                        i + 1
                    )
                    .unwrap();
                }
            }
        }
    }
    out
}

/// A one-second vowel-like harmonic complex with a quieter noisy stretch
/// between `dip_start` and `dip_end`.
pub fn recording_with_dip(dip_start: f64, dip_end: f64) -> Vec<f64> {
    let mut state: u32 = 0x2545_f491;
    (0..SAMPLE_RATE as usize)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (state >> 8) as f64 / (1u32 << 24) as f64 - 0.5;
            if (dip_start..dip_end).contains(&t) {
                0.1 * noise
            } else {
                let voiced: f64 = (1..=4)
                    .map(|h| (2.0 * PI * 150.0 * h as f64 * t).sin() / h as f64)
                    .sum();
                0.3 * voiced + 0.01 * noise
            }
        })
        .collect()
}

pub fn write_wav(path: &Path, samples: &[f64]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * 32_767.0) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

/// `<root>/<speaker>/<name>.wav` plus its TextGrid.
pub fn write_recording(root: &Path, speaker: &str, name: &str, samples: &[f64], grid: &str) {
    let dir = root.join(speaker);
    fs::create_dir_all(&dir).unwrap();
    write_wav(&dir.join(format!("{name}.wav")), samples);
    fs::write(dir.join(format!("{name}.TextGrid")), grid).unwrap();
}

pub const LABEL: &str = "s-casa-a-s-a-t-final-x-f-30";

/// Tier layout of a standard recording: the token sits on tier 1, landmarks on tier 5.
pub fn standard_grid(label: &str) -> String {
    textgrid(
        1.0,
        &[
            Tier::Intervals("words", vec![(0.0, 1.0, "casa")]),
            Tier::Intervals(
                "fricative",
                vec![
                    (0.0, 0.5, ""),
                    (0.5, 0.56, label),
                    (0.56, 0.7, "too-short"),
                    (0.7, 1.0, ""),
                ],
            ),
            Tier::Intervals("approximant", vec![(0.0, 1.0, "")]),
            Tier::Intervals("syllable", vec![(0.0, 1.0, "")]),
            Tier::Intervals("notes", vec![(0.0, 1.0, "")]),
            Tier::Points("landmarks", vec![(0.45, "p1"), (0.53, "v"), (0.62, "p2")]),
        ],
    )
}
