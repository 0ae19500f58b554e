//! CSV export of the normalized entry log.

use crate::dates::day_key;
use crate::{DailyEntry, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    calories: Option<f64>,
    sleep_hours: Option<f64>,
    mood: Option<f64>,
    steps: Option<f64>,
    exercise_minutes: Option<f64>,
    exercise_effort: Option<f64>,
    anomalies: String,
}

impl From<&DailyEntry> for CsvRow {
    fn from(entry: &DailyEntry) -> Self {
        let anomalies = entry
            .anomalies
            .iter()
            .map(|flag| {
                serde_json::to_value(flag)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_else(|| format!("{:?}", flag))
            })
            .collect::<Vec<_>>()
            .join(";");

        CsvRow {
            date: day_key(entry.date),
            calories: entry.calories,
            sleep_hours: entry.sleep_hours,
            mood: entry.mood,
            steps: entry.steps,
            exercise_minutes: entry.exercise_minutes,
            exercise_effort: entry.exercise_effort,
            anomalies,
        }
    }
}

/// Write `entries` to `csv_path` with headers, replacing any existing file
///
/// Unlogged values become empty cells. Returns the number of rows written.
pub fn export_entries_csv(entries: &[DailyEntry], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(csv_path)?;

    for entry in entries {
        writer.serialize(CsvRow::from(entry))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} entries to {:?}", entries.len(), csv_path);
    Ok(entries.len())
}
