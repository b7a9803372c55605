//! Dataset Ingestion & Transformation
//!
//! - Ingestion: read the raw labelled URL dataset, append the extracted
//!   feature columns, write `data.csv`, then a seeded shuffle split into
//!   `train.csv` / `test.csv`.
//! - Transformation: read a split back, drop the non-feature columns and
//!   return labelled samples in schema order.
//!
//! CSV handling is RFC 4180: comma separated, `"` quoting with `""` escapes,
//! quoted fields may span lines.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::core::features::{extract, feature_names, FeatureVector};
use crate::models::config::TrainingConfig;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::LabeledSample;
use crate::utils::constants::{
    parse_label, COLUMN_INDEX, COLUMN_LABEL, COLUMN_RESULT, COLUMN_URL, EXCLUDED_COLUMNS,
    MIN_TRAIN_ROWS,
};

// ============================================
// CSV
// ============================================

/// A parsed CSV file: header plus records, each with its starting line number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub header: Vec<String>,
    pub records: Vec<(usize, Vec<String>)>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse CSV text. Blank lines between records are skipped.
pub fn parse_csv(text: &str) -> AppResult<Table> {
    let mut rows: Vec<(usize, Vec<String>)> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    rows.push((record_line, std::mem::take(&mut record)));
                }
                record.clear();
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(AppError::invalid_row(record_line, "unterminated quoted field"));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        rows.push((record_line, record));
    }

    let mut rows = rows.into_iter();
    let header = match rows.next() {
        Some((_, header)) => header,
        None => return Err(AppError::new(ErrorCode::DatasetEmpty, "no header row")),
    };
    let records: Vec<_> = rows.collect();

    for (line, record) in &records {
        if record.len() != header.len() {
            return Err(AppError::invalid_row(
                *line,
                format!("expected {} fields, found {}", header.len(), record.len()),
            ));
        }
    }

    Ok(Table { header, records })
}

/// Quote a field when it holds a delimiter, quote or line break
pub fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn read_table(path: &Path) -> AppResult<Table> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::with_source(ErrorCode::DatasetIo, path.display().to_string(), e)
    })?;
    parse_csv(&text).map_err(|e| e.context(path.display()))
}

pub fn write_table(path: &Path, header: &[String], records: &[&Vec<String>]) -> AppResult<()> {
    let io_error =
        |e: std::io::Error| AppError::with_source(ErrorCode::DatasetIo, path.display().to_string(), e);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_error)?;
    }
    let mut out = BufWriter::new(fs::File::create(path).map_err(io_error)?);
    let mut write_row = |row: &[String]| -> std::io::Result<()> {
        let line: Vec<String> = row.iter().map(|f| csv_escape(f)).collect();
        writeln!(out, "{}", line.join(","))
    };

    write_row(header).map_err(io_error)?;
    for record in records {
        write_row(record).map_err(io_error)?;
    }
    out.flush().map_err(io_error)
}

// ============================================
// INGESTION
// ============================================

/// Read the raw dataset and compute feature columns for every URL
pub fn build_feature_table(raw: &Table) -> AppResult<Table> {
    let url_col = raw
        .column(COLUMN_URL)
        .ok_or_else(|| AppError::invalid_schema(format!("missing `{}` column", COLUMN_URL)))?;
    let result_col = raw.column(COLUMN_RESULT);
    let label_col = raw.column(COLUMN_LABEL);
    if result_col.is_none() && label_col.is_none() {
        return Err(AppError::invalid_schema(format!(
            "missing `{}` or `{}` column",
            COLUMN_RESULT, COLUMN_LABEL
        )));
    }
    let index_col = raw
        .column(COLUMN_INDEX)
        .or_else(|| raw.header.iter().position(|h| h.trim().is_empty()));

    let mut header: Vec<String> = Vec::new();
    if index_col.is_some() {
        header.push(COLUMN_INDEX.to_string());
    }
    header.push(COLUMN_URL.to_string());
    if label_col.is_some() {
        header.push(COLUMN_LABEL.to_string());
    }
    header.push(COLUMN_RESULT.to_string());
    header.extend(feature_names().into_iter().map(String::from));

    let mut records = Vec::with_capacity(raw.len());
    let mut disagreements = 0usize;
    for (line, row) in &raw.records {
        let target_cell = result_col.or(label_col).map(|c| row[c].as_str()).unwrap_or("");
        let label = parse_label(target_cell)
            .ok_or_else(|| AppError::invalid_row(*line, format!("unknown label {:?}", target_cell)))?;
        if let (Some(_), Some(c)) = (result_col, label_col) {
            if parse_label(&row[c]).is_some_and(|text| text != label) {
                disagreements += 1;
            }
        }

        let mut out = Vec::with_capacity(header.len());
        if let Some(c) = index_col {
            out.push(row[c].clone());
        }
        let url = &row[url_col];
        out.push(url.clone());
        if let Some(c) = label_col {
            out.push(row[c].clone());
        }
        out.push(label.to_string());
        out.extend(extract(url).values().iter().map(|v| v.to_string()));
        records.push((*line, out));
    }

    if disagreements > 0 {
        warn!(
            rows = disagreements,
            "`{}` and `{}` columns disagree, using `{}`",
            COLUMN_RESULT,
            COLUMN_LABEL,
            COLUMN_RESULT
        );
    }
    Ok(Table { header, records })
}

/// Seeded shuffle split; returns (train, test) record indices
pub fn split_indices(n: usize, test_ratio: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64) * test_ratio).ceil() as usize;
    let test_len = test_len.min(n.saturating_sub(1));
    let train = indices.split_off(test_len);
    (train, indices)
}

/// Ingestion stage: raw dataset -> data.csv, train.csv, test.csv
pub fn initiate_data_ingestion(config: &TrainingConfig) -> AppResult<(PathBuf, PathBuf)> {
    info!(dataset = %config.dataset_path.display(), "Entered data ingestion");
    let stage = |e: AppError| e.context("data ingestion");

    let raw = read_table(&config.dataset_path).map_err(stage)?;
    info!(rows = raw.len(), "Read the data");
    let table = build_feature_table(&raw).map_err(stage)?;
    info!(columns = table.header.len(), "Feature columns created");

    let all: Vec<&Vec<String>> = table.records.iter().map(|(_, r)| r).collect();
    write_table(&config.raw_data_path(), &table.header, &all).map_err(stage)?;

    info!(test_ratio = config.test_ratio, seed = config.seed, "Train/test split initiated");
    let (train_idx, test_idx) = split_indices(table.len(), config.test_ratio, config.seed);
    if train_idx.len() < MIN_TRAIN_ROWS || test_idx.is_empty() {
        return Err(stage(AppError::new(
            ErrorCode::DatasetEmpty,
            format!(
                "{} rows leave {} for training, need at least {}",
                table.len(),
                train_idx.len(),
                MIN_TRAIN_ROWS
            ),
        )));
    }
    let train: Vec<&Vec<String>> = train_idx.iter().map(|&i| &table.records[i].1).collect();
    let test: Vec<&Vec<String>> = test_idx.iter().map(|&i| &table.records[i].1).collect();

    let train_path = config.train_data_path();
    let test_path = config.test_data_path();
    write_table(&train_path, &table.header, &train).map_err(stage)?;
    write_table(&test_path, &table.header, &test).map_err(stage)?;
    info!(train = train.len(), test = test.len(), "Ingestion completed");

    Ok((train_path, test_path))
}

// ============================================
// TRANSFORMATION
// ============================================

/// Parse a numeric cell written either as an integer or a float
fn parse_feature(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.is_finite())
            .map(|v| v as i64)
    })
}

/// Read one split back into labelled samples
pub fn load_samples(path: &Path) -> AppResult<Vec<LabeledSample>> {
    let table = read_table(path)?;
    let target = table.column(COLUMN_RESULT).ok_or_else(|| {
        AppError::invalid_schema(format!("{}: missing `{}` column", path.display(), COLUMN_RESULT))
    })?;

    let feature_cols: Vec<usize> = table
        .header
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let h = h.trim();
            !h.is_empty() && !EXCLUDED_COLUMNS.contains(&h)
        })
        .map(|(i, _)| i)
        .collect();

    let columns: Vec<&str> = feature_cols.iter().map(|&i| table.header[i].trim()).collect();
    if columns != feature_names() {
        return Err(AppError::invalid_schema(format!(
            "{}: feature columns do not match the extractor layout ({} found, {} expected)",
            path.display(),
            columns.len(),
            feature_names().len()
        )));
    }

    let mut samples = Vec::with_capacity(table.len());
    for (line, row) in &table.records {
        let label = parse_label(&row[target])
            .ok_or_else(|| AppError::invalid_row(*line, format!("unknown label {:?}", row[target])))?;
        let values = feature_cols
            .iter()
            .map(|&c| {
                parse_feature(&row[c]).ok_or_else(|| {
                    let msg = format!("`{}` is not numeric: {:?}", table.header[c], row[c]);
                    AppError::invalid_row(*line, msg)
                })
            })
            .collect::<AppResult<Vec<i64>>>()?;
        let features = FeatureVector::try_from(values)
            .map_err(|len| AppError::invalid_row(*line, format!("{} feature values", len)))?;
        samples.push(LabeledSample { features, label });
    }

    debug!(path = %path.display(), samples = samples.len(), "Split loaded");
    Ok(samples)
}

/// Transformation stage: train/test CSV -> labelled samples
pub fn initiate_data_transformation(
    train_path: &Path,
    test_path: &Path,
) -> AppResult<(Vec<LabeledSample>, Vec<LabeledSample>)> {
    let stage = |e: AppError| e.context("data transformation");
    let train = load_samples(train_path).map_err(stage)?;
    let test = load_samples(test_path).map_err(stage)?;
    info!(train = train.len(), test = test.len(), "Read train and test data completed");

    if train.is_empty() || test.is_empty() {
        return Err(stage(AppError::new(ErrorCode::DatasetEmpty, "empty train or test split")));
    }
    Ok((train, test))
}

/// Split samples into the (rows, labels) pair the classifiers consume
pub fn to_matrix(samples: &[LabeledSample]) -> (Vec<Vec<f64>>, Vec<u32>) {
    samples
        .iter()
        .map(|s| (s.features.to_row(), s.label))
        .unzip()
}
