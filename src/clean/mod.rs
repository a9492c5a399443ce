//! Cleaning stage
//!
//! Merges the persisted tables of all sources into one dataset of typed
//! rows: transmission and fuel are folded into a few categories, numeric
//! columns are coerced, and rows with any undetermined value or repeating
//! an earlier row are dropped.

use crate::config::Config;
use crate::record::{Field, Record, UNKNOWN};
use crate::sites::adapter_for;
use crate::store::{CsvTableStore, TableStore, UTF8_BOM};
use crate::HarvestError;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// One row of the cleaned dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CleanRecord {
    pub brand: String,
    pub model: String,
    pub year: u64,
    pub mileage: u64,
    pub price: u64,
    pub fuel: String,
    pub transmission: String,
    pub power: u64,
}

/// Folds a transmission description into "Automat", "Manual" or unknown
pub fn normalize_transmission(raw: &str) -> &'static str {
    let lower = raw.trim().to_lowercase();
    if lower.contains("automat") {
        "Automat"
    } else if ["manuál", "manuální", "manual", "stupňů"]
        .iter()
        .any(|m| lower.contains(m))
    {
        "Manual"
    } else {
        UNKNOWN
    }
}

/// Folds a fuel description into a base category or unknown
pub fn normalize_fuel(raw: &str) -> &'static str {
    let lower = raw.trim().to_lowercase();
    if lower.contains("benz") || lower.contains("petrol") {
        "Petrol"
    } else if lower.contains("naft") || lower.contains("diesel") {
        "Diesel"
    } else if lower.contains("hybrid") {
        "Hybrid"
    } else if lower.contains("elekt") || lower.contains("electric") {
        "Electric"
    } else {
        UNKNOWN
    }
}

/// Parses a whole non-negative number
///
/// Accepts integral decimals such as "2019.0"; anything else, including the
/// unknown sentinel, is missing.
pub fn coerce_number(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == UNKNOWN {
        return None;
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Some(f as u64)
        }
        _ => None,
    }
}

fn text(record: &Record, field: Field) -> Option<String> {
    let value = record.get(field).trim();
    (!value.is_empty() && value != UNKNOWN).then(|| value.to_string())
}

/// Cleans one record, `None` if any field stays undetermined
pub fn clean_record(record: &Record) -> Option<CleanRecord> {
    let transmission = normalize_transmission(record.get(Field::Transmission));
    let fuel = normalize_fuel(record.get(Field::Fuel));
    if transmission == UNKNOWN || fuel == UNKNOWN {
        return None;
    }

    Some(CleanRecord {
        brand: text(record, Field::Brand)?,
        model: text(record, Field::Model)?,
        year: coerce_number(record.get(Field::Year))?,
        mileage: coerce_number(record.get(Field::Mileage))?,
        price: coerce_number(record.get(Field::Price))?,
        fuel: fuel.to_string(),
        transmission: transmission.to_string(),
        power: coerce_number(record.get(Field::Power))?,
    })
}

/// Cleans records in order, keeping the first of any duplicate rows
pub fn clean_rows<'a, I>(records: I) -> Vec<CleanRecord>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter_map(clean_record)
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Writes cleaned rows with a header, replacing `path`
///
/// The file starts with a UTF-8 byte-order mark like the scraped tables.
pub fn write_cleaned(path: &Path, rows: &[CleanRecord]) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Loads every configured source table, cleans the union and writes it to
/// `output.cleaned-path`
///
/// # Returns
///
/// * `Ok((input, output))` - Row counts before and after cleaning
/// * `Err(HarvestError)` - A table could not be read or the output written
pub fn clean_all(config: &Config) -> Result<(usize, usize), HarvestError> {
    let mut records = Vec::new();

    for source in &config.sources {
        let identity = adapter_for(source)?.identity();
        let store = CsvTableStore::new(&source.output_path, identity);
        let table = store.load()?;
        tracing::info!("Loaded {} rows from {}", table.len(), store.describe());
        records.extend(table.records().cloned());
    }

    let cleaned = clean_rows(&records);
    write_cleaned(Path::new(&config.output.cleaned_path), &cleaned)?;
    tracing::info!(
        "Cleaned {} rows down to {} in {}",
        records.len(),
        cleaned.len(),
        config.output.cleaned_path
    );

    Ok((records.len(), cleaned.len()))
}
