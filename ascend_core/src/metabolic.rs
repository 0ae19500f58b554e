//! BMR/TDEE estimation with an adaptive adjustment from recent logs.
//!
//! ## Baseline
//!
//! Mifflin-St Jeor BMR scaled by the activity tier multiplier.
//!
//! ## Dynamic adjustment
//!
//! Over the trailing window of entries (14 by default):
//! 1. Average exercise minutes, effort and steps against reference values
//!    into an activity load ratio; `(load - 1) * 0.08`, clamped to
//!    [-0.06, 0.10].
//! 2. Mean calorie deviation from baseline, `* 0.35`, clamped to ±0.08.
//! 3. Deviation spread (`stddev * 0.25`, at most 0.05) is subtracted from the
//!    magnitude of the summed delta, never flipping its sign.
//! 4. Clamp to ±0.12, then keep 60% of it so the baseline still dominates.

use crate::{BodyMetrics, CalorieStrategy, DailyEntry, Gender, Profile};
use serde::{Deserialize, Serialize};

pub const DYNAMIC_TDEE_WINDOW_DAYS: usize = 14;

pub const REFERENCE_EXERCISE_MINUTES: f64 = 45.0;
pub const REFERENCE_EXERCISE_EFFORT: f64 = 6.0;
pub const REFERENCE_STEPS: f64 = 8000.0;

pub const ACTIVITY_DELTA_SCALE: f64 = 0.08;
pub const ACTIVITY_DELTA_MIN: f64 = -0.06;
pub const ACTIVITY_DELTA_MAX: f64 = 0.10;

pub const INTAKE_DELTA_SCALE: f64 = 0.35;
pub const INTAKE_DELTA_LIMIT: f64 = 0.08;

pub const INTAKE_VARIANCE_SCALE: f64 = 0.25;
pub const INTAKE_VARIANCE_MAX: f64 = 0.05;

pub const DYNAMIC_RATIO_LIMIT: f64 = 0.12;
pub const DYNAMIC_SMOOTHING: f64 = 0.6;

/// Breakdown of one dynamic TDEE computation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DynamicTdee {
    pub baseline_tdee: u32,
    pub dynamic_tdee: u32,
    /// Entries that fell inside the window
    pub sample_days: usize,
    pub activity_load_ratio: f64,
    pub activity_delta_ratio: f64,
    pub intake_delta_ratio: f64,
    pub intake_variance_ratio: f64,
    /// Summed delta after variance dampening, before the ±0.12 clamp
    pub raw_ratio: f64,
    pub clamped_ratio: f64,
    pub final_ratio: f64,
}

/// Everything derived from the profile's body metrics
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetabolicSummary {
    pub bmr: Option<f64>,
    pub baseline_tdee: Option<u32>,
    pub dynamic: Option<DynamicTdee>,
}

/// Healthy calorie range for a TDEE and strategy
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalorieBand {
    pub strategy: CalorieStrategy,
    pub target: f64,
    pub min: f64,
    pub max: f64,
}

impl CalorieBand {
    pub fn contains(&self, calories: f64) -> bool {
        calories >= self.min && calories <= self.max
    }
}

pub fn calorie_band(tdee: u32, strategy: CalorieStrategy) -> CalorieBand {
    let (low, high) = strategy.band_percent();
    let tdee = tdee as f64;
    CalorieBand {
        strategy,
        target: tdee * (low + high) as f64 / 200.0,
        min: tdee * low as f64 / 100.0,
        max: tdee * high as f64 / 100.0,
    }
}

/// Mifflin-St Jeor basal metabolic rate
pub fn bmr_for(metrics: &BodyMetrics) -> f64 {
    let sex_offset = match metrics.gender {
        Gender::Female => -161.0,
        Gender::Male | Gender::Other => 5.0,
    };
    10.0 * metrics.weight_kg + 6.25 * metrics.height_cm - 5.0 * metrics.age as f64 + sex_offset
}

/// BMR, or `None` when any base field is missing
pub fn compute_bmr(profile: &Profile) -> Option<f64> {
    profile.body_metrics().map(|m| bmr_for(&m))
}

/// Baseline TDEE, or `None` when any base field is missing
pub fn compute_baseline_tdee(profile: &Profile) -> Option<u32> {
    let metrics = profile.body_metrics()?;
    let tdee = (bmr_for(&metrics) * metrics.activity_level.multiplier()).round();
    Some(tdee.max(0.0) as u32)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn population_std_dev(values: &[f64]) -> f64 {
    match mean(values) {
        Some(avg) => {
            let variance =
                values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
            variance.sqrt()
        }
        None => 0.0,
    }
}

/// Average `read` over the entries where it was logged
fn logged_mean(entries: &[DailyEntry], read: impl Fn(&DailyEntry) -> Option<f64>) -> Option<f64> {
    let values: Vec<f64> = entries.iter().filter_map(read).collect();
    mean(&values)
}

/// Activity load relative to the reference day
///
/// Averages whichever of minutes, effort and steps were logged at all in the
/// window; with no activity data the load is neutral (1.0).
pub fn activity_load_ratio(window: &[DailyEntry]) -> f64 {
    let components: Vec<f64> = [
        logged_mean(window, |e| e.exercise_minutes).map(|m| m / REFERENCE_EXERCISE_MINUTES),
        logged_mean(window, |e| e.exercise_effort).map(|m| m / REFERENCE_EXERCISE_EFFORT),
        logged_mean(window, |e| e.steps).map(|m| m / REFERENCE_STEPS),
    ]
    .into_iter()
    .flatten()
    .collect();

    mean(&components).unwrap_or(1.0)
}

/// Dynamic TDEE over the trailing `window_days` entries
///
/// `entries` must be date-sorted. Returns `None` when the profile is
/// incomplete.
pub fn compute_dynamic_tdee(
    profile: &Profile,
    entries: &[DailyEntry],
    window_days: usize,
) -> Option<DynamicTdee> {
    let baseline = compute_baseline_tdee(profile)?;
    let start = entries.len().saturating_sub(window_days);
    let window = &entries[start..];

    let activity_load_ratio = activity_load_ratio(window);
    let activity_delta_ratio = ((activity_load_ratio - 1.0) * ACTIVITY_DELTA_SCALE)
        .clamp(ACTIVITY_DELTA_MIN, ACTIVITY_DELTA_MAX);

    let deviations: Vec<f64> = if baseline > 0 {
        window
            .iter()
            .filter_map(|e| e.calories)
            .map(|c| (c - baseline as f64) / baseline as f64)
            .collect()
    } else {
        Vec::new()
    };

    let intake_delta_ratio = mean(&deviations)
        .map(|m| (m * INTAKE_DELTA_SCALE).clamp(-INTAKE_DELTA_LIMIT, INTAKE_DELTA_LIMIT))
        .unwrap_or(0.0);
    let intake_variance_ratio =
        (population_std_dev(&deviations) * INTAKE_VARIANCE_SCALE).min(INTAKE_VARIANCE_MAX);

    let summed = activity_delta_ratio + intake_delta_ratio;
    let raw_ratio = summed.signum() * (summed.abs() - intake_variance_ratio).max(0.0);
    let clamped_ratio = raw_ratio.clamp(-DYNAMIC_RATIO_LIMIT, DYNAMIC_RATIO_LIMIT);
    let final_ratio = clamped_ratio * DYNAMIC_SMOOTHING;
    let dynamic_tdee = (baseline as f64 * (1.0 + final_ratio)).round().max(0.0) as u32;

    tracing::debug!(
        "Dynamic TDEE over {} entries: load {:.3}, activity {:+.4}, intake {:+.4}, variance {:.4}, final {:+.4} -> {} kcal",
        window.len(),
        activity_load_ratio,
        activity_delta_ratio,
        intake_delta_ratio,
        intake_variance_ratio,
        final_ratio,
        dynamic_tdee
    );

    Some(DynamicTdee {
        baseline_tdee: baseline,
        dynamic_tdee,
        sample_days: window.len(),
        activity_load_ratio,
        activity_delta_ratio,
        intake_delta_ratio,
        intake_variance_ratio,
        raw_ratio,
        clamped_ratio,
        final_ratio,
    })
}

/// Window length for a profile, falling back to `default_window`
pub fn window_days_for(profile: &Profile, default_window: usize) -> usize {
    profile
        .dynamic_tdee_window_days
        .filter(|d| *d > 0)
        .unwrap_or(default_window)
}

/// BMR, baseline and (when enabled) dynamic TDEE in one pass
pub fn derive_metabolics(
    profile: &Profile,
    entries: &[DailyEntry],
    default_window: usize,
) -> MetabolicSummary {
    let dynamic = if profile.dynamic_tdee_enabled {
        compute_dynamic_tdee(profile, entries, window_days_for(profile, default_window))
    } else {
        None
    };

    MetabolicSummary {
        bmr: compute_bmr(profile),
        baseline_tdee: compute_baseline_tdee(profile),
        dynamic,
    }
}

impl Profile {
    /// A copy of this profile with the derived TDEE fields recomputed
    ///
    /// `default_window` applies when the profile has no window of its own.
    pub fn with_derived(&self, entries: &[DailyEntry], default_window: usize) -> Profile {
        let summary = derive_metabolics(self, entries, default_window);
        Profile {
            baseline_tdee: summary.baseline_tdee,
            dynamic_tdee: summary.dynamic.map(|d| d.dynamic_tdee),
            ..self.clone()
        }
    }
}
