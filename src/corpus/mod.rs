//! Corpus traversal: recordings in, one feature table out.

mod label;
mod table;

pub use label::parse_label;
pub use table::CorpusTable;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::acoustics::{AcousticEngine, Intensity, IntensityParams};
use crate::annotation::{AnnotationTier, TextGrid};
use crate::audio::decoder::load_sound;
use crate::config::{AnalysisConstants, CorpusConfig};
use crate::features::{landmark_features, locate_landmarks, SegmentAnalyzer};
use crate::types::{CorpusRow, IntensityLandmarks, IntervalKind, Sound};

const ANNOTATION_EXTENSION: &str = "TextGrid";
/// Tried in order; the first existing sibling of the TextGrid wins.
const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "WAV", "flac", "mp3", "ogg"];

/// An audio/annotation pair under a speaker directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub speaker: String,
    pub name: String,
    pub audio: PathBuf,
    pub annotation: PathBuf,
}

/// Speaker subdirectories and their `.TextGrid` files, both in name order.
/// Only an unreadable corpus root is an error; an unreadable speaker is skipped.
pub fn discover_recordings(root: &Path) -> Result<Vec<Recording>> {
    let mut recordings = Vec::new();
    for speaker_dir in sorted_entries(root)? {
        if !speaker_dir.is_dir() {
            continue;
        }
        let Some(speaker) = file_name(&speaker_dir) else {
            continue;
        };
        let entries = match sorted_entries(&speaker_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    %speaker,
                    error = %format!("{:#}", err),
                    "skipping unreadable speaker directory"
                );
                continue;
            }
        };
        for path in entries {
            if path.extension().and_then(|ext| ext.to_str()) != Some(ANNOTATION_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            recordings.push(Recording {
                speaker: speaker.clone(),
                name: name.to_string(),
                audio: audio_path(&speaker_dir, name),
                annotation: path.clone(),
            });
        }
    }
    Ok(recordings)
}

/// Measures every recording under the corpus root and writes the table.
///
/// A recording that fails to load is skipped; only discovery and the final
/// write can fail the pass.
pub fn run_corpus_pass(config: &CorpusConfig, engine: &dyn AcousticEngine) -> Result<CorpusTable> {
    let recordings = discover_recordings(&config.corpus_root)?;
    info!(
        root = %config.corpus_root.display(),
        recordings = recordings.len(),
        jobs = config.jobs,
        "starting corpus pass"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .context("failed to build worker pool")?;
    let per_recording: Vec<Vec<CorpusRow>> = pool.install(|| {
        recordings
            .par_iter()
            .map(|recording| match process_recording(recording, config, engine) {
                Ok(rows) => {
                    info!(
                        speaker = %recording.speaker,
                        recording = %recording.name,
                        tokens = rows.len(),
                        "recording processed"
                    );
                    rows
                }
                Err(err) => {
                    warn!(
                        speaker = %recording.speaker,
                        recording = %recording.name,
                        error = %format!("{:#}", err),
                        "skipping recording"
                    );
                    Vec::new()
                }
            })
            .collect()
    });

    let table = CorpusTable::assemble(per_recording.into_iter().flatten().collect());
    if table.is_empty() {
        warn!("no tokens were measured; nothing written");
        return Ok(table);
    }
    table.save(&config.output_path)?;
    info!(
        tokens = table.len(),
        columns = table.columns().len(),
        output = %config.output_path.display(),
        "results saved"
    );
    Ok(table)
}

/// Rows for every labelled interval of one recording, in tier then interval order.
pub fn process_recording(
    recording: &Recording,
    config: &CorpusConfig,
    engine: &dyn AcousticEngine,
) -> Result<Vec<CorpusRow>> {
    let sound = load_sound(&recording.audio)?;
    let grid = TextGrid::from_path(&recording.annotation)?;
    let landmarks = LandmarkSource::new(&grid, &sound, config, engine, recording);
    let analyzer = SegmentAnalyzer::new(engine, &config.constants);

    let mut rows = Vec::new();
    for (tier_index, kind) in [
        (config.tiers.fricative, IntervalKind::Fricative),
        (config.tiers.approximant, IntervalKind::Approximant),
    ] {
        let Some(tier) = grid.tier(tier_index) else {
            warn!(recording = %recording.name, tier = tier_index, %kind, "interval tier missing");
            continue;
        };
        for interval in tier.intervals().iter().filter(|interval| interval.is_labelled()) {
            let Some(metadata) = parse_label(&interval.text) else {
                debug!(label = %interval.text, "label has too few fields; skipping");
                continue;
            };
            debug!(
                label = %interval.text,
                %kind,
                duration = interval.duration(),
                "processing interval"
            );
            let mut features = match analyzer.analyze(&sound, interval.start, interval.end) {
                Ok(features) => features,
                Err(err) => {
                    warn!(
                        recording = %recording.name,
                        label = %interval.text,
                        error = %err,
                        "skipping interval"
                    );
                    continue;
                }
            };
            let found = landmarks.locate(interval.start, interval.end, &config.constants);
            features.merge(landmark_features(&found));
            rows.push(CorpusRow::new(
                metadata,
                recording.speaker.as_str(),
                recording.name.as_str(),
                kind,
                features,
            ));
        }
    }
    Ok(rows)
}

/// The landmark tier with the recording-wide intensity contour it is read against.
struct LandmarkSource<'g> {
    tier: Option<&'g AnnotationTier>,
    intensity: Option<Intensity>,
}

impl<'g> LandmarkSource<'g> {
    fn new(
        grid: &'g TextGrid,
        sound: &Sound,
        config: &CorpusConfig,
        engine: &dyn AcousticEngine,
        recording: &Recording,
    ) -> Self {
        let tier = match grid.tier(config.tiers.landmarks) {
            Some(tier) if tier.is_point_tier() => Some(tier),
            Some(tier) => {
                warn!(
                    recording = %recording.name,
                    tier = tier.name(),
                    "landmark tier holds intervals, not points"
                );
                None
            }
            None => {
                warn!(recording = %recording.name, tier = config.tiers.landmarks, "landmark tier missing");
                None
            }
        };
        let intensity = tier.and_then(|_| {
            engine
                .intensity(sound, IntensityParams::default())
                .map_err(|err| {
                    warn!(recording = %recording.name, error = %err, "recording intensity unavailable");
                })
                .ok()
        });
        Self { tier, intensity }
    }

    fn locate(&self, start: f64, end: f64, constants: &AnalysisConstants) -> IntensityLandmarks {
        match (self.tier, &self.intensity) {
            (Some(tier), Some(intensity)) => {
                locate_landmarks(intensity, tier, start, end, constants.landmark_tolerance)
            }
            _ => IntensityLandmarks::default(),
        }
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to list {:?}", dir))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("failed to list {:?}", dir))?;
    entries.sort();
    Ok(entries)
}

fn audio_path(dir: &Path, name: &str) -> PathBuf {
    let candidates = AUDIO_EXTENSIONS.map(|ext| dir.join(format!("{}.{}", name, ext)));
    candidates
        .iter()
        .find(|path| path.is_file())
        .unwrap_or(&candidates[0])
        .clone()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
