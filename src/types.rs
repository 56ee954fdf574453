//! Core types for the phonalyzer extraction pipeline

use std::collections::BTreeMap;
use std::fmt;

/// Mono audio at a fixed sample rate. Sample `i` sits at time `(i + 0.5) / sample_rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f64>,
    /// Sample rate in Hz (e.g., 44100)
    pub sample_rate: u32,
}

impl Sound {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }
}

/// A slice of a recording under analysis. Its sound starts at time zero;
/// `start`/`end` keep the interval's position in the parent recording.
#[derive(Debug, Clone)]
pub struct Segment {
    pub sound: Sound,
    pub start: f64, // seconds, in the parent recording
    pub end: f64,   // seconds, in the parent recording
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn samples(&self) -> &[f64] {
        &self.sound.samples
    }
}

/// An ordered batch of measurements produced by one analyzer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureGroup {
    entries: Vec<(&'static str, f64)>,
}

impl FeatureGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// A group holding `0.0` for every key.
    pub fn zeros(keys: &[&'static str]) -> Self {
        keys.iter().map(|&key| (key, 0.0)).collect()
    }

    pub fn with(mut self, key: &'static str, value: f64) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &'static str, value: f64) {
        self.entries.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| *value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(&'static str, f64)> for FeatureGroup {
    fn from_iter<I: IntoIterator<Item = (&'static str, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Measurement name to value, accumulated across analyzers for one interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    values: BTreeMap<&'static str, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: f64) {
        self.values.insert(key, value);
    }

    /// Merge a group; later values overwrite earlier ones with the same key.
    pub fn merge(&mut self, group: FeatureGroup) {
        for (key, value) in group.iter() {
            self.values.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Intensity (dB) sampled at the p1/v/p2 landmarks; `None` when unmatched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntensityLandmarks {
    pub p1: Option<f64>,
    pub v: Option<f64>,
    pub p2: Option<f64>,
}

impl IntensityLandmarks {
    pub fn new(p1: Option<f64>, v: Option<f64>, p2: Option<f64>) -> Self {
        Self { p1, v, p2 }
    }

    pub fn complete(&self) -> Option<(f64, f64, f64)> {
        match (self.p1, self.v, self.p2) {
            (Some(p1), Some(v), Some(p2)) => Some((p1, v, p2)),
            _ => None,
        }
    }
}

/// Which annotation tier an interval came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    Fricative,
    Approximant,
}

impl IntervalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Fricative => "fricative",
            IntervalKind::Approximant => "approximant",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields carried in an interval's label text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    pub phoneme: String,
    pub word: String,
    pub previous: String,
    pub target: String,
    pub following: String,
    pub tonicity: String,
    pub position: String,
    pub sex: String,
    pub age: String,
}

/// One analyzed interval joined with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusRow {
    pub token_id: String,
    pub metadata: TokenMetadata,
    pub speaker: String,
    pub file_name: String,
    pub kind: IntervalKind,
    pub features: FeatureRecord,
}

impl CorpusRow {
    pub fn new(
        metadata: TokenMetadata,
        speaker: impl Into<String>,
        file_name: impl Into<String>,
        kind: IntervalKind,
        features: FeatureRecord,
    ) -> Self {
        let speaker = speaker.into();
        let token_id = format!("{}-{}", speaker, metadata.word);
        Self {
            token_id,
            metadata,
            speaker,
            file_name: file_name.into(),
            kind,
            features,
        }
    }
}
