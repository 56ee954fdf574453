mod common;

use std::fs;

use common::{recording_with_dip, standard_grid, textgrid, write_recording, Tier, LABEL};
use phonalyzer::acoustics::{
    AcousticEngine, FormantParams, FormantTrack, Harmonicity, HarmonicityParams, Intensity,
    IntensityParams, Pitch, PitchParams, PraatEngine, Spectrum,
};
use phonalyzer::config::{CorpusConfig, OUTPUT_FILE_NAME};
use phonalyzer::corpus::{discover_recordings, run_corpus_pass};
use phonalyzer::error::{ExtractionError, Result};
use phonalyzer::types::Sound;

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<Vec<String>>) {
    let text = fs::read_to_string(path).unwrap();
    let mut lines = text.lines();
    let header = lines
        .next()
        .unwrap()
        .split(',')
        .map(str::to_string)
        .collect();
    let rows = lines
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect();
    (header, rows)
}

fn cell<'a>(header: &[String], row: &'a [String], column: &str) -> &'a str {
    let idx = header
        .iter()
        .position(|name| name == column)
        .unwrap_or_else(|| panic!("missing column {column}"));
    &row[idx]
}

#[test]
fn single_token_corpus_produces_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    write_recording(
        &root,
        "S01",
        "take1",
        &recording_with_dip(0.5, 0.56),
        &standard_grid(LABEL),
    );

    let config = CorpusConfig::from_root(&root).unwrap().with_jobs(2);
    let table = run_corpus_pass(&config, &PraatEngine).unwrap();
    assert_eq!(table.len(), 1);

    let output = dir.path().canonicalize().unwrap().join(OUTPUT_FILE_NAME);
    assert_eq!(config.output_path, output);
    let (header, rows) = read_csv(&output);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(&header[..4], &["token_id", "word", "previous", "target"]);
    assert_eq!(cell(&header, row, "token_id"), "S01-casa");
    assert_eq!(cell(&header, row, "speaker"), "S01");
    assert_eq!(cell(&header, row, "file_name"), "take1");
    assert_eq!(cell(&header, row, "type"), "fricative");
    assert_eq!(cell(&header, row, "age"), "30");

    let duration: f64 = cell(&header, row, "duration").parse().unwrap();
    assert!((duration - 0.06).abs() < 1e-9);
    let p1: f64 = cell(&header, row, "p1_intensity").parse().unwrap();
    let v: f64 = cell(&header, row, "v_intensity").parse().unwrap();
    assert!(v < p1, "valley {v} should sit below plateau {p1}");
    let ratio: f64 = cell(&header, row, "mean_intensity_ratio").parse().unwrap();
    assert!(ratio > 0.0 && ratio < 1.0);

    for column in header.iter().skip(13) {
        let values: Vec<&str> = rows.iter().map(|r| cell(&header, r, column)).collect();
        assert!(
            values.iter().any(|value| !value.is_empty() && value.parse::<f64>().unwrap() != 0.0),
            "all-zero column {column} survived pruning"
        );
    }
}

#[test]
fn missing_landmark_tier_keeps_the_token() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    let grid = textgrid(
        1.0,
        &[
            Tier::Intervals("words", vec![(0.0, 1.0, "")]),
            Tier::Intervals("fricative", vec![(0.0, 0.5, ""), (0.5, 0.56, LABEL), (0.56, 1.0, "")]),
            Tier::Intervals("approximant", vec![(0.0, 1.0, "")]),
        ],
    );
    write_recording(&root, "S02", "take1", &recording_with_dip(0.5, 0.56), &grid);

    let config = CorpusConfig::from_root(&root).unwrap().with_jobs(1);
    let table = run_corpus_pass(&config, &PraatEngine).unwrap();
    assert_eq!(table.len(), 1);
    let columns = table.columns();
    assert!(!columns.contains(&"p1_intensity"));
    assert!(!columns.contains(&"mean_intensity_ratio"));
}

#[test]
fn broken_recording_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    write_recording(
        &root,
        "S01",
        "good",
        &recording_with_dip(0.5, 0.56),
        &standard_grid(LABEL),
    );
    let broken = root.join("S01");
    fs::write(broken.join("bad.TextGrid"), "not a textgrid").unwrap();
    fs::write(broken.join("bad.wav"), b"RIFF").unwrap();
    fs::write(broken.join("orphan.TextGrid"), standard_grid(LABEL)).unwrap();

    let config = CorpusConfig::from_root(&root).unwrap();
    let table = run_corpus_pass(&config, &PraatEngine).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].file_name, "good");
}

#[cfg(unix)]
#[test]
fn unreadable_speaker_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    let samples = recording_with_dip(0.5, 0.56);
    write_recording(&root, "S01", "take1", &samples, &standard_grid(LABEL));
    write_recording(&root, "S02", "take1", &samples, &standard_grid(LABEL));
    let locked = root.join("S01");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    let enforced = fs::read_dir(&locked).is_err();

    let recordings = discover_recordings(&root);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    // privileged users can still list the directory
    if !enforced {
        return;
    }
    let speakers: Vec<_> = recordings.unwrap().into_iter().map(|r| r.speaker).collect();
    assert_eq!(speakers, vec!["S02"]);
}

#[test]
fn voiced_token_reports_its_pitch() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    let grid = textgrid(
        1.0,
        &[
            Tier::Intervals("words", vec![(0.0, 1.0, "casa")]),
            Tier::Intervals("fricative", vec![(0.0, 0.2, ""), (0.2, 0.35, LABEL), (0.35, 1.0, "")]),
            Tier::Intervals("approximant", vec![(0.0, 1.0, "")]),
        ],
    );
    // the noisy stretch sits well after the token
    write_recording(&root, "S01", "take1", &recording_with_dip(0.8, 0.9), &grid);

    let config = CorpusConfig::from_root(&root).unwrap();
    let table = run_corpus_pass(&config, &PraatEngine).unwrap();
    assert_eq!(table.len(), 1);
    let features = &table.rows()[0].features;
    let voiced_fraction = features.get("voiced_fraction").unwrap();
    assert!(voiced_fraction > 0.5, "voiced_fraction {voiced_fraction}");
    let mean_pitch = features.get("mean_pitch").unwrap();
    assert!((mean_pitch - 150.0).abs() < 5.0, "mean_pitch {mean_pitch}");

    let columns = table.columns();
    for column in ["mean_pitch", "voiced_fraction"] {
        assert!(columns.contains(&column), "{column} was pruned");
    }
}

#[test]
fn rows_follow_sorted_traversal_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    let samples = recording_with_dip(0.5, 0.56);
    for (speaker, name) in [("S02", "b"), ("S01", "b"), ("S01", "a")] {
        write_recording(&root, speaker, name, &samples, &standard_grid(LABEL));
    }
    fs::write(root.join("README.txt"), "not a speaker").unwrap();

    let recordings = discover_recordings(&root).unwrap();
    let order: Vec<_> = recordings
        .iter()
        .map(|r| format!("{}/{}", r.speaker, r.name))
        .collect();
    assert_eq!(order, vec!["S01/a", "S01/b", "S02/b"]);

    let config = CorpusConfig::from_root(&root).unwrap().with_jobs(3);
    let table = run_corpus_pass(&config, &PraatEngine).unwrap();
    let files: Vec<_> = table
        .rows()
        .iter()
        .map(|row| format!("{}/{}", row.speaker, row.file_name))
        .collect();
    assert_eq!(files, order);
}

/// Native analyses, except that harmonicity never succeeds.
struct NoHarmonicity;

impl AcousticEngine for NoHarmonicity {
    fn spectrum(&self, sound: &Sound) -> Result<Spectrum> {
        PraatEngine.spectrum(sound)
    }

    fn intensity(&self, sound: &Sound, params: IntensityParams) -> Result<Intensity> {
        PraatEngine.intensity(sound, params)
    }

    fn pitch(&self, sound: &Sound, params: PitchParams) -> Result<Pitch> {
        PraatEngine.pitch(sound, params)
    }

    fn harmonicity(&self, _sound: &Sound, _params: HarmonicityParams) -> Result<Harmonicity> {
        Err(ExtractionError::NoValidFrames("harmonicity"))
    }

    fn formants(&self, sound: &Sound, params: FormantParams) -> Result<FormantTrack> {
        PraatEngine.formants(sound, params)
    }
}

#[test]
fn all_zero_hnr_column_is_pruned() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    let samples = recording_with_dip(0.5, 0.56);
    write_recording(&root, "S01", "take1", &samples, &standard_grid(LABEL));
    write_recording(
        &root,
        "S02",
        "take1",
        &samples,
        &standard_grid("z-mesa-e-z-a-t-medial-x-m"),
    );

    let output = dir.path().join("out").join("features.csv");
    let config = CorpusConfig::from_root(&root)
        .unwrap()
        .with_output(output.clone());
    let table = run_corpus_pass(&config, &NoHarmonicity).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.rows().iter().all(|row| row.features.get("mean_hnr") == Some(0.0)));

    let (header, rows) = read_csv(&output);
    assert!(!header.iter().any(|column| column == "mean_hnr"));
    assert!(header.iter().any(|column| column == "duration"));
    assert_eq!(cell(&header, &rows[1], "token_id"), "S02-mesa");
    assert_eq!(cell(&header, &rows[1], "age"), "");
}

#[test]
fn empty_corpus_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("corpus");
    fs::create_dir_all(root.join("S01")).unwrap();
    let config = CorpusConfig::from_root(&root).unwrap();
    let table = run_corpus_pass(&config, &PraatEngine).unwrap();
    assert!(table.is_empty());
    assert!(!config.output_path.exists());
}
