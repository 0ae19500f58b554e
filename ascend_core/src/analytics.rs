//! Rolling-window metric analytics.
//!
//! All analyzers share one output contract, [`MetricAnalysisEnvelope`], so the
//! presentation side can render any area without knowing which metric it is.
//! Missing days stay in the series as `None` to keep charts continuous.

use crate::dates::{weekday_index, window_ending};
use crate::DailyEntry;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WEEKDAY_LABELS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// A numeric field of [`DailyEntry`]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum MetricKey {
    Calories,
    SleepHours,
    Mood,
    Steps,
    ExerciseMinutes,
    ExerciseEffort,
}

impl MetricKey {
    pub fn value(self, entry: &DailyEntry) -> Option<f64> {
        match self {
            MetricKey::Calories => entry.calories,
            MetricKey::SleepHours => entry.sleep_hours,
            MetricKey::Mood => entry.mood,
            MetricKey::Steps => entry.steps,
            MetricKey::ExerciseMinutes => entry.exercise_minutes,
            MetricKey::ExerciseEffort => entry.exercise_effort,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayAverage {
    /// Monday = 0
    pub index: usize,
    pub weekday: String,
    pub average: Option<f64>,
    pub samples: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeekdayExtremes {
    pub highest: WeekdayAverage,
    pub lowest: WeekdayAverage,
}

/// Longest window an analysis will build, roughly ten years
pub const MAX_WINDOW_DAYS: usize = 3660;

/// `days` points ending at the latest logged date (or `today` with no entries)
///
/// Days without an entry, or whose entry lacks the metric, carry `None`.
/// `days` is capped at [`MAX_WINDOW_DAYS`].
pub fn get_metric_window(
    entries: &[DailyEntry],
    key: MetricKey,
    days: usize,
    today: NaiveDate,
) -> Vec<MetricPoint> {
    let end = entries.iter().map(|e| e.date).max().unwrap_or(today);
    let by_date: BTreeMap<NaiveDate, &DailyEntry> = entries.iter().map(|e| (e.date, e)).collect();

    window_ending(end, days.min(MAX_WINDOW_DAYS))
        .into_iter()
        .map(|date| MetricPoint {
            date,
            value: by_date.get(&date).and_then(|e| key.value(e)),
        })
        .collect()
}

/// Mean of the logged values; `None` if nothing was logged
pub fn compute_metric_average(points: &[MetricPoint]) -> Option<f64> {
    let values: Vec<f64> = points.iter().filter_map(|p| p.value).collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Per-weekday means, Monday first; weekdays with no samples get `None`
pub fn compute_weekday_averages(points: &[MetricPoint]) -> Vec<WeekdayAverage> {
    let mut sums = [0.0f64; 7];
    let mut counts = [0u32; 7];

    for point in points {
        if let Some(value) = point.value {
            let idx = weekday_index(point.date);
            sums[idx] += value;
            counts[idx] += 1;
        }
    }

    (0..7)
        .map(|idx| WeekdayAverage {
            index: idx,
            weekday: WEEKDAY_LABELS[idx].to_string(),
            average: (counts[idx] > 0).then(|| sums[idx] / counts[idx] as f64),
            samples: counts[idx],
        })
        .collect()
}

/// Highest and lowest weekday among those with samples
///
/// Ties go to the earlier weekday.
pub fn find_highest_lowest_weekday(averages: &[WeekdayAverage]) -> Option<WeekdayExtremes> {
    let mut ranked = averages.iter().filter_map(|w| w.average.map(|avg| (avg, w)));
    let (first_avg, first) = ranked.next()?;

    let (mut high_avg, mut high) = (first_avg, first);
    let (mut low_avg, mut low) = (first_avg, first);
    for (avg, weekday) in ranked {
        if avg > high_avg {
            high_avg = avg;
            high = weekday;
        }
        if avg < low_avg {
            low_avg = avg;
            low = weekday;
        }
    }

    Some(WeekdayExtremes {
        highest: high.clone(),
        lowest: low.clone(),
    })
}

/// Highest and lowest logged points; the earliest date wins ties
pub fn find_extreme_points(points: &[MetricPoint]) -> (Option<MetricPoint>, Option<MetricPoint>) {
    let mut highest: Option<MetricPoint> = None;
    let mut lowest: Option<MetricPoint> = None;

    for point in points.iter().filter(|p| p.value.is_some()) {
        let value = point.value.unwrap_or_default();
        if highest.map_or(true, |h| value > h.value.unwrap_or_default()) {
            highest = Some(*point);
        }
        if lowest.map_or(true, |l| value < l.value.unwrap_or_default()) {
            lowest = Some(*point);
        }
    }

    (highest, lowest)
}

// ============================================================================
// Analyzer envelope
// ============================================================================

/// Static description of one analysis area
#[derive(Clone, Copy, Debug)]
pub struct AnalyzerDefinition {
    pub area_key: &'static str,
    pub metric: MetricKey,
    pub label: &'static str,
    pub unit_label: &'static str,
    /// Logged points needed before the analysis is meaningful
    pub min_points: usize,
    pub suggestion: &'static str,
}

static ANALYZERS: [AnalyzerDefinition; 6] = [
    AnalyzerDefinition {
        area_key: "sleep",
        metric: MetricKey::SleepHours,
        label: "Sleep",
        unit_label: "hours",
        min_points: 3,
        suggestion: "Log your sleep for a few more nights to see patterns.",
    },
    AnalyzerDefinition {
        area_key: "mood",
        metric: MetricKey::Mood,
        label: "Mood",
        unit_label: "/10",
        min_points: 3,
        suggestion: "Rate your mood on a few more days to see trends.",
    },
    AnalyzerDefinition {
        area_key: "calories",
        metric: MetricKey::Calories,
        label: "Calories",
        unit_label: "kcal",
        min_points: 3,
        suggestion: "Log calories on at least three days to compare against your target.",
    },
    AnalyzerDefinition {
        area_key: "steps",
        metric: MetricKey::Steps,
        label: "Steps",
        unit_label: "steps",
        min_points: 3,
        suggestion: "Add your step count for a few days to see activity trends.",
    },
    AnalyzerDefinition {
        area_key: "exercise",
        metric: MetricKey::ExerciseMinutes,
        label: "Exercise",
        unit_label: "min",
        min_points: 2,
        suggestion: "Log a couple of workouts to see your exercise volume.",
    },
    AnalyzerDefinition {
        area_key: "effort",
        metric: MetricKey::ExerciseEffort,
        label: "Exercise effort",
        unit_label: "/10",
        min_points: 2,
        suggestion: "Rate the effort of a couple of workouts to see intensity trends.",
    },
];

pub fn analyzers() -> &'static [AnalyzerDefinition] {
    &ANALYZERS
}

pub fn find_analyzer(area_key: &str) -> Option<&'static AnalyzerDefinition> {
    ANALYZERS.iter().find(|a| a.area_key == area_key)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricMetadata {
    pub label: String,
    pub unit_label: String,
    pub metric: MetricKey,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricAggregates {
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub total: Option<f64>,
    pub latest: Option<f64>,
    pub logged_points: usize,
    pub highest_point: Option<MetricPoint>,
    pub lowest_point: Option<MetricPoint>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricDistributions {
    pub weekday_averages: Vec<WeekdayAverage>,
    pub highest_weekday: Option<WeekdayAverage>,
    pub lowest_weekday: Option<WeekdayAverage>,
}

/// Whether there is enough data to show an analysis
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmptyState {
    pub is_empty: bool,
    pub reason: Option<String>,
    pub min_points: usize,
    pub actual_points: usize,
    pub suggestion: Option<String>,
}

impl EmptyState {
    pub fn evaluate(label: &str, min_points: usize, actual_points: usize, suggestion: &str) -> Self {
        if actual_points >= min_points {
            return Self {
                is_empty: false,
                reason: None,
                min_points,
                actual_points,
                suggestion: None,
            };
        }

        Self {
            is_empty: true,
            reason: Some(format!(
                "{} needs at least {} logged day(s) in this window, found {}",
                label, min_points, actual_points
            )),
            min_points,
            actual_points,
            suggestion: Some(suggestion.to_string()),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricAnalysisEnvelope {
    pub area_key: String,
    pub window_days: usize,
    pub metadata: MetricMetadata,
    pub series: Vec<MetricPoint>,
    pub aggregates: MetricAggregates,
    pub distributions: MetricDistributions,
    pub empty_state: EmptyState,
}

/// Run one analyzer over a window of `days`
pub fn analyze(
    analyzer: &AnalyzerDefinition,
    entries: &[DailyEntry],
    days: usize,
    today: NaiveDate,
) -> MetricAnalysisEnvelope {
    let series = get_metric_window(entries, analyzer.metric, days, today);
    let values: Vec<f64> = series.iter().filter_map(|p| p.value).collect();
    let (highest_point, lowest_point) = find_extreme_points(&series);

    let aggregates = MetricAggregates {
        average: compute_metric_average(&series),
        min: lowest_point.and_then(|p| p.value),
        max: highest_point.and_then(|p| p.value),
        total: (!values.is_empty()).then(|| values.iter().sum()),
        latest: series.iter().rev().find_map(|p| p.value),
        logged_points: values.len(),
        highest_point,
        lowest_point,
    };

    let weekday_averages = compute_weekday_averages(&series);
    let extremes = find_highest_lowest_weekday(&weekday_averages);
    let distributions = MetricDistributions {
        highest_weekday: extremes.as_ref().map(|e| e.highest.clone()),
        lowest_weekday: extremes.map(|e| e.lowest),
        weekday_averages,
    };

    let empty_state = EmptyState::evaluate(
        analyzer.label,
        analyzer.min_points,
        values.len(),
        analyzer.suggestion,
    );

    tracing::debug!(
        "Analyzed {} over {} days: {} logged points, empty = {}",
        analyzer.area_key,
        series.len(),
        values.len(),
        empty_state.is_empty
    );

    MetricAnalysisEnvelope {
        area_key: analyzer.area_key.to_string(),
        window_days: series.len(),
        metadata: MetricMetadata {
            label: analyzer.label.to_string(),
            unit_label: analyzer.unit_label.to_string(),
            metric: analyzer.metric,
        },
        series,
        aggregates,
        distributions,
        empty_state,
    }
}

/// Run the analyzer registered under `area_key`, if any
pub fn analyze_area(
    area_key: &str,
    entries: &[DailyEntry],
    days: usize,
    today: NaiveDate,
) -> Option<MetricAnalysisEnvelope> {
    find_analyzer(area_key).map(|a| analyze(a, entries, days, today))
}

/// Run every registered analyzer
pub fn analyze_all(
    entries: &[DailyEntry],
    days: usize,
    today: NaiveDate,
) -> Vec<MetricAnalysisEnvelope> {
    ANALYZERS
        .iter()
        .map(|a| analyze(a, entries, days, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // 2024-06-03 is a Monday
    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap() + Duration::days(offset)
    }

    fn sleep_log(values: &[(i64, Option<f64>)]) -> Vec<DailyEntry> {
        values
            .iter()
            .map(|(offset, sleep)| {
                let mut entry = DailyEntry::new(day(*offset));
                entry.sleep_hours = *sleep;
                entry
            })
            .collect()
    }

    #[test]
    fn test_window_fills_missing_days_with_none() {
        let entries = sleep_log(&[(0, Some(7.0)), (3, Some(8.0)), (4, None)]);
        let window = get_metric_window(&entries, MetricKey::SleepHours, 7, day(30));

        assert_eq!(window.len(), 7);
        assert_eq!(window.last().unwrap().date, day(4));
        assert_eq!(window.first().unwrap().date, day(-2));
        assert!(window.windows(2).all(|w| w[0].date < w[1].date));

        let values: Vec<Option<f64>> = window.iter().map(|p| p.value).collect();
        assert_eq!(
            values,
            vec![None, None, Some(7.0), None, None, Some(8.0), None]
        );
    }

    #[test]
    fn test_window_without_entries_ends_today() {
        let window = get_metric_window(&[], MetricKey::Mood, 5, day(10));
        assert_eq!(window.len(), 5);
        assert_eq!(window.last().unwrap().date, day(10));
        assert!(window.iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn test_average_ignores_nulls_but_not_zero() {
        let entries = sleep_log(&[(0, Some(0.0)), (1, None), (2, Some(6.0))]);
        let window = get_metric_window(&entries, MetricKey::SleepHours, 3, day(2));
        assert_eq!(compute_metric_average(&window), Some(3.0));
        assert_eq!(compute_metric_average(&window[1..2]), None);
    }

    #[test]
    fn test_weekday_buckets() {
        // Two Mondays, one Wednesday
        let entries = sleep_log(&[(0, Some(6.0)), (7, Some(8.0)), (9, Some(5.0))]);
        let window = get_metric_window(&entries, MetricKey::SleepHours, 14, day(9));
        let averages = compute_weekday_averages(&window);

        assert_eq!(averages.len(), 7);
        assert_eq!(averages[0].weekday, "Monday");
        assert_eq!(averages[0].average, Some(7.0));
        assert_eq!(averages[0].samples, 2);
        assert_eq!(averages[1].average, None);
        assert_eq!(averages[2].average, Some(5.0));

        let extremes = find_highest_lowest_weekday(&averages).unwrap();
        assert_eq!(extremes.highest.weekday, "Monday");
        assert_eq!(extremes.lowest.weekday, "Wednesday");
    }

    #[test]
    fn test_extremes_need_samples() {
        let averages = compute_weekday_averages(&[]);
        assert!(find_highest_lowest_weekday(&averages).is_none());
        assert_eq!(find_extreme_points(&[]), (None, None));
    }

    #[test]
    fn test_extreme_point_ties_keep_earliest() {
        let entries = sleep_log(&[(0, Some(8.0)), (1, Some(6.0)), (2, Some(8.0)), (3, Some(6.0))]);
        let window = get_metric_window(&entries, MetricKey::SleepHours, 4, day(3));
        let (high, low) = find_extreme_points(&window);
        assert_eq!(high.unwrap().date, day(0));
        assert_eq!(low.unwrap().date, day(1));
    }

    #[test]
    fn test_envelope_empty_state() {
        let entries = sleep_log(&[(0, Some(7.0)), (1, Some(7.5))]);
        let envelope = analyze_area("sleep", &entries, 7, day(1)).unwrap();

        assert_eq!(envelope.area_key, "sleep");
        assert_eq!(envelope.series.len(), 7);
        assert!(envelope.empty_state.is_empty);
        assert_eq!(envelope.empty_state.min_points, 3);
        assert_eq!(envelope.empty_state.actual_points, 2);
        assert!(envelope.empty_state.reason.is_some());
        assert!(envelope.empty_state.suggestion.is_some());
        // Aggregates are still computed from what exists
        assert_eq!(envelope.aggregates.average, Some(7.25));
    }

    #[test]
    fn test_envelope_aggregates() {
        let entries = sleep_log(&[(0, Some(7.0)), (1, Some(9.0)), (2, None), (3, Some(5.0))]);
        let envelope = analyze_area("sleep", &entries, 4, day(3)).unwrap();

        assert!(!envelope.empty_state.is_empty);
        assert_eq!(envelope.aggregates.logged_points, 3);
        assert_eq!(envelope.aggregates.min, Some(5.0));
        assert_eq!(envelope.aggregates.max, Some(9.0));
        assert_eq!(envelope.aggregates.total, Some(21.0));
        assert_eq!(envelope.aggregates.latest, Some(5.0));
        assert_eq!(
            envelope.distributions.highest_weekday.as_ref().map(|w| w.index),
            Some(1)
        );
    }

    #[test]
    fn test_every_analyzer_shares_the_envelope() {
        let envelopes = analyze_all(&[], 7, day(0));
        assert_eq!(envelopes.len(), analyzers().len());
        for envelope in envelopes {
            assert!(envelope.empty_state.is_empty);
            assert_eq!(envelope.series.len(), 7);
            assert_eq!(envelope.aggregates.average, None);
        }
        assert!(analyze_area("unknown", &[], 7, day(0)).is_none());
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let entries = sleep_log(&[(0, Some(7.0))]);
        let window = get_metric_window(&entries, MetricKey::SleepHours, 200_000_000, day(0));
        assert_eq!(window.len(), MAX_WINDOW_DAYS);
        assert_eq!(window.last().unwrap().date, day(0));

        let envelope = analyze_area("sleep", &entries, usize::MAX, day(0)).unwrap();
        assert_eq!(envelope.window_days, MAX_WINDOW_DAYS);
        assert_eq!(envelope.series.len(), MAX_WINDOW_DAYS);
    }

    #[test]
    fn test_series_serializes_null() {
        let point = MetricPoint {
            date: day(0),
            value: None,
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"{"date":"2024-06-03","value":null}"#);
    }
}
