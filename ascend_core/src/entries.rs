//! Entry normalization.
//!
//! Turns the date-keyed entry map into the sorted, one-per-day sequence every
//! engine module consumes. Malformed date keys are rejected here so the engine
//! itself never has to deal with them.

use crate::dates::parse_day;
use crate::{AnomalyFlag, DailyEntry, EntryLog, Result};

/// Inclusive plausible range for a metric; values outside it get flagged
struct FieldRange {
    flag: AnomalyFlag,
    min: f64,
    max: f64,
    read: fn(&DailyEntry) -> Option<f64>,
}

const FIELD_RANGES: [FieldRange; 6] = [
    FieldRange {
        flag: AnomalyFlag::CaloriesOutOfRange,
        min: 0.0,
        max: 10_000.0,
        read: |e| e.calories,
    },
    FieldRange {
        flag: AnomalyFlag::SleepOutOfRange,
        min: 0.0,
        max: 24.0,
        read: |e| e.sleep_hours,
    },
    FieldRange {
        flag: AnomalyFlag::MoodOutOfRange,
        min: 1.0,
        max: 10.0,
        read: |e| e.mood,
    },
    FieldRange {
        flag: AnomalyFlag::StepsOutOfRange,
        min: 0.0,
        max: 100_000.0,
        read: |e| e.steps,
    },
    FieldRange {
        flag: AnomalyFlag::ExerciseMinutesOutOfRange,
        min: 0.0,
        max: 1_440.0,
        read: |e| e.exercise_minutes,
    },
    FieldRange {
        flag: AnomalyFlag::ExerciseEffortOutOfRange,
        min: 1.0,
        max: 10.0,
        read: |e| e.exercise_effort,
    },
];

/// Normalize the raw entry map into a date-sorted sequence
///
/// The map key is authoritative for the entry date. Out-of-range values are
/// kept as logged but flagged.
pub fn normalize_entries(log: &EntryLog) -> Result<Vec<DailyEntry>> {
    let mut entries = Vec::with_capacity(log.len());

    for (key, raw) in log {
        let date = parse_day(key)?;
        let mut entry = raw.clone();
        entry.date = date;
        flag_anomalies(&mut entry);
        entries.push(entry);
    }

    // Distinct keys can still parse to the same day (e.g. padded with spaces)
    entries.sort_by_key(|e| e.date);
    entries.dedup_by_key(|e| e.date);

    tracing::debug!("Normalized {} entries", entries.len());
    Ok(entries)
}

/// Recompute the anomaly flags of an entry from its current values
pub fn flag_anomalies(entry: &mut DailyEntry) {
    entry.anomalies.clear();
    for range in &FIELD_RANGES {
        if let Some(value) = (range.read)(entry) {
            if !value.is_finite() || value < range.min || value > range.max {
                tracing::warn!(
                    "Entry {} has out-of-range value {} ({:?})",
                    entry.date,
                    value,
                    range.flag
                );
                entry.anomalies.insert(range.flag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::NaiveDate;

    fn entry_json(json: &str) -> DailyEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_sorts_by_date() {
        let mut log = EntryLog::new();
        log.insert("2024-02-03".into(), entry_json(r#"{"mood": 6}"#));
        log.insert("2024-01-15".into(), entry_json(r#"{"calories": 2100}"#));
        log.insert("2024-02-01".into(), entry_json(r#"{}"#));

        let entries = normalize_entries(&log).unwrap();
        let dates: Vec<_> = entries.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-15", "2024-02-01", "2024-02-03"]);
        assert_eq!(entries[0].calories, Some(2100.0));
        assert!(entries[1].is_blank());
    }

    #[test]
    fn test_key_overrides_embedded_date() {
        let mut log = EntryLog::new();
        log.insert(
            "2024-05-10".into(),
            entry_json(r#"{"date": "2020-01-01", "steps": 4000}"#),
        );

        let entries = normalize_entries(&log).unwrap();
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
    }

    #[test]
    fn test_malformed_key_is_rejected() {
        let mut log = EntryLog::new();
        log.insert("2024-02-30".into(), entry_json("{}"));

        let result = normalize_entries(&log);
        assert!(matches!(result, Err(Error::InvalidDate(ref k)) if k == "2024-02-30"));
    }

    #[test]
    fn test_anomalies_flagged_but_kept() {
        crate::logging::init_test();
        let mut log = EntryLog::new();
        log.insert(
            "2024-01-01".into(),
            entry_json(r#"{"sleepHours": 30, "mood": 0, "steps": 5000}"#),
        );

        let entries = normalize_entries(&log).unwrap();
        let entry = &entries[0];
        assert_eq!(entry.sleep_hours, Some(30.0));
        assert!(entry.anomalies.contains(&AnomalyFlag::SleepOutOfRange));
        assert!(entry.anomalies.contains(&AnomalyFlag::MoodOutOfRange));
        assert!(!entry.anomalies.contains(&AnomalyFlag::StepsOutOfRange));
    }

    #[test]
    fn test_null_is_not_zero() {
        let entry = entry_json(r#"{"calories": 0, "steps": null}"#);
        assert_eq!(entry.calories, Some(0.0));
        assert_eq!(entry.steps, None);
    }
}
