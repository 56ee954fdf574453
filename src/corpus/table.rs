use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::features::measurement_columns;
use crate::types::CorpusRow;

const TEXT_COLUMNS: [&str; 13] = [
    "token_id",
    "word",
    "previous",
    "target",
    "following",
    "phoneme",
    "tonicity",
    "position",
    "speaker",
    "sex",
    "age",
    "file_name",
    "type",
];

/// The assembled corpus: rows in traversal order plus the numeric columns
/// that carry information.
#[derive(Debug, Clone)]
pub struct CorpusTable {
    rows: Vec<CorpusRow>,
    numeric: Vec<&'static str>,
}

impl CorpusTable {
    /// Drops a numeric column when every row holds exactly `0.0` in it, or
    /// when no row measured it at all. An absent cell is not a zero.
    pub fn assemble(rows: Vec<CorpusRow>) -> Self {
        let numeric = measurement_columns()
            .into_iter()
            .filter(|column| {
                let measured = rows.iter().any(|row| row.features.contains(column));
                let informative = rows.iter().any(|row| row.features.get(column) != Some(0.0));
                measured && informative
            })
            .collect();
        Self { rows, numeric }
    }

    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> Vec<&'static str> {
        TEXT_COLUMNS
            .iter()
            .copied()
            .chain(self.numeric.iter().copied())
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_record(writer, self.columns().into_iter().map(str::to_string))?;
        for row in &self.rows {
            let metadata = &row.metadata;
            let text: [&str; 13] = [
                &row.token_id,
                &metadata.word,
                &metadata.previous,
                &metadata.target,
                &metadata.following,
                &metadata.phoneme,
                &metadata.tonicity,
                &metadata.position,
                &row.speaker,
                &metadata.sex,
                &metadata.age,
                &row.file_name,
                row.kind.as_str(),
            ];
            let numbers = self.numeric.iter().map(|column| {
                row.features
                    .get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            });
            write_record(writer, text.into_iter().map(str::to_string).chain(numbers))?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {:?}", parent))?;
        }
        let file =
            File::create(path).with_context(|| format!("failed to create output file {:?}", path))?;
        let mut writer = BufWriter::new(file);
        self.write_csv(&mut writer)
            .with_context(|| format!("failed to write {:?}", path))?;
        writer
            .flush()
            .with_context(|| format!("failed to flush {:?}", path))
    }
}

fn write_record<W: Write>(writer: &mut W, fields: impl Iterator<Item = String>) -> Result<()> {
    let line = fields.map(|field| quote(&field)).collect::<Vec<_>>().join(",");
    writeln!(writer, "{}", line)?;
    Ok(())
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
