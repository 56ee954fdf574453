use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use serde::Deserialize;

pub const OUTPUT_FILE_NAME: &str = "abd_production_acoustic_features.csv";

/// Inclusive plausibility band for one formant order, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FormantBand {
    pub min: f64,
    pub max: f64,
}

impl FormantBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, hz: f64) -> bool {
        (self.min..=self.max).contains(&hz)
    }
}

/// Empirical constants of the measurement policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConstants {
    /// Maximum distance (s) between a landmark point and its anchor.
    pub landmark_tolerance: f64,
    /// Formant sampling positions as fractions of duration (start, mid, end).
    pub formant_fractions: [f64; 3],
    /// Sampling positions used below `formant_fraction_switch`.
    pub short_formant_fractions: [f64; 3],
    pub formant_fraction_switch: f64,
    pub formant_min_duration: f64,
    pub formant_max_duration: f64,
    /// F1, F2, F3 plausibility bands.
    pub formant_bands: [FormantBand; 3],
    pub formant_time_step: f64,
    pub formant_count: usize,
    pub formant_ceiling: f64,
    /// Segments shorter than this skip the HNR/pitch group.
    pub voicing_min_duration: f64,
    pub pitch_ceiling: f64,
    pub hnr_silence_threshold: f64,
    pub hnr_periods_per_window: f64,
    pub max_window_length: f64,
    pub max_time_step: f64,
    pub min_pitch_floor: f64,
    /// Analysis cycles that must fit in a segment; sets the adaptive pitch floor.
    pub min_cycles: f64,
    pub segment_budget_ms: u64,
}

impl Default for AnalysisConstants {
    fn default() -> Self {
        Self {
            landmark_tolerance: 0.2,
            formant_fractions: [0.33, 0.50, 0.67],
            short_formant_fractions: [0.0, 0.5, 1.0],
            formant_fraction_switch: 0.045,
            formant_min_duration: 0.015,
            formant_max_duration: 0.130,
            formant_bands: [
                FormantBand::new(150.0, 1000.0),
                FormantBand::new(500.0, 2500.0),
                FormantBand::new(1500.0, 3500.0),
            ],
            formant_time_step: 0.001,
            formant_count: 5,
            formant_ceiling: 5500.0,
            voicing_min_duration: 0.02,
            pitch_ceiling: 400.0,
            hnr_silence_threshold: 0.1,
            hnr_periods_per_window: 2.0,
            max_window_length: 0.015,
            max_time_step: 0.005,
            min_pitch_floor: 50.0,
            min_cycles: 5.0,
            segment_budget_ms: 2_000,
        }
    }
}

impl AnalysisConstants {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.landmark_tolerance > 0.0,
            "landmark_tolerance must be positive"
        );
        for fractions in [&self.formant_fractions, &self.short_formant_fractions] {
            ensure!(
                fractions.iter().all(|f| (0.0..=1.0).contains(f)),
                "formant fractions must lie in [0, 1], got {:?}",
                fractions
            );
            ensure!(
                fractions[0] <= fractions[1] && fractions[1] <= fractions[2],
                "formant fractions must be ordered start <= mid <= end, got {:?}",
                fractions
            );
        }
        ensure!(
            self.formant_min_duration > 0.0 && self.formant_max_duration > self.formant_min_duration,
            "formant duration range [{}, {}] is empty",
            self.formant_min_duration,
            self.formant_max_duration
        );
        for (idx, band) in self.formant_bands.iter().enumerate() {
            ensure!(
                band.min > 0.0 && band.max > band.min,
                "F{} band [{}, {}] is invalid",
                idx + 1,
                band.min,
                band.max
            );
        }
        ensure!(self.formant_time_step > 0.0, "formant_time_step must be positive");
        ensure!(self.formant_count >= 3, "formant_count must be at least 3");
        ensure!(self.formant_ceiling > 0.0, "formant_ceiling must be positive");
        ensure!(
            self.pitch_ceiling > self.min_pitch_floor,
            "pitch_ceiling ({}) must exceed min_pitch_floor ({})",
            self.pitch_ceiling,
            self.min_pitch_floor
        );
        ensure!(
            self.max_window_length > 0.0 && self.max_time_step > 0.0,
            "window length and time step caps must be positive"
        );
        ensure!(self.min_cycles > 0.0, "min_cycles must be positive");
        ensure!(
            self.hnr_periods_per_window > 0.0,
            "hnr_periods_per_window must be positive"
        );
        Ok(())
    }
}

/// Zero-based tier indices inside each TextGrid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TierLayout {
    pub fricative: usize,
    pub approximant: usize,
    pub landmarks: usize,
}

impl Default for TierLayout {
    fn default() -> Self {
        Self {
            fricative: 1,
            approximant: 2,
            landmarks: 5,
        }
    }
}

/// Optional JSON overlay for a corpus pass.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub output_path: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub tiers: Option<TierLayout>,
    pub constants: Option<AnalysisConstants>,
}

impl ConfigOverrides {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        serde_json::from_str(&raw).with_context(|| format!("failed to parse config file {:?}", path))
    }
}

/// Everything a corpus pass needs; passed explicitly, never stored globally.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub corpus_root: PathBuf,
    pub output_path: PathBuf,
    pub jobs: usize,
    pub tiers: TierLayout,
    pub constants: AnalysisConstants,
}

impl CorpusConfig {
    pub fn from_root(root: &Path) -> Result<Self> {
        let corpus_root = canonicalize_dir(root)?;
        let output_path = default_output_path(&corpus_root);
        Ok(Self {
            corpus_root,
            output_path,
            jobs: default_jobs(),
            tiers: TierLayout::default(),
            constants: AnalysisConstants::default(),
        })
    }

    pub fn with_output(mut self, path: PathBuf) -> Self {
        self.output_path = path;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn apply(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.output_path {
            self.output_path = path;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
        if let Some(tiers) = overrides.tiers {
            self.tiers = tiers;
        }
        if let Some(constants) = overrides.constants {
            self.constants = constants;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.jobs > 0, "jobs must be at least 1");
        ensure!(
            !self.output_path.as_os_str().is_empty(),
            "output path must not be empty"
        );
        self.constants.validate()
    }
}

/// The table lands next to the corpus root, not inside it.
pub fn default_output_path(corpus_root: &Path) -> PathBuf {
    corpus_root
        .parent()
        .unwrap_or(corpus_root)
        .join(OUTPUT_FILE_NAME)
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve corpus directory at {:?}", path))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(anyhow!("corpus path {:?} is not a directory", canonical))
    }
}
