//! Behavior mechanics: streaks, penalties, recovery and rest days.
//!
//! Everything here is driven by the sorted list of distinct logged dates plus
//! the calorie values of the most recent entries.
//!
//! ## Penalties
//!
//! - Missed days: 0.02 per implicitly skipped day, capped at 0.25
//! - Calorie adherence: 0.015 per out-of-band day among the last 7 entries
//!   with calories, capped at 0.12 (only with a complete profile)
//! - Combined penalty capped at 0.30
//!
//! ## Recovery
//!
//! - Comeback streak of 3+ days after a break: 0.01 per day, counting the
//!   trigger day itself (a comeback of 3 earns 0.01), capped at 0.08
//! - Trailing in-band calorie streak of 3+ days: 0.005 per day, again counting
//!   the trigger day, capped at 0.03
//!
//! ## Rest days
//!
//! Eligible when the latest log is today or yesterday, the current streak is
//! at least 3, and at most one single-day gap falls in the trailing 7 days.

use crate::dates::{gap_days, skipped_between};
use crate::metabolic::CalorieBand;
use crate::DailyEntry;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const MISSED_DAY_PENALTY_STEP: f64 = 0.02;
pub const MISSED_DAY_PENALTY_CAP: f64 = 0.25;

pub const CALORIE_LOOKBACK_DAYS: usize = 7;
pub const CALORIE_PENALTY_STEP: f64 = 0.015;
pub const CALORIE_PENALTY_CAP: f64 = 0.12;

pub const COMBINED_PENALTY_CAP: f64 = 0.30;

pub const STREAK_RECOVERY_TRIGGER: u32 = 3;
pub const STREAK_RECOVERY_STEP: f64 = 0.01;
pub const STREAK_RECOVERY_CAP: f64 = 0.08;

pub const CALORIE_RECOVERY_TRIGGER: u32 = 3;
pub const CALORIE_RECOVERY_STEP: f64 = 0.005;
pub const CALORIE_RECOVERY_CAP: f64 = 0.03;

pub const TOTAL_RECOVERY_CAP: f64 = STREAK_RECOVERY_CAP + CALORIE_RECOVERY_CAP;

pub const REST_DAY_MIN_STREAK: u32 = 3;
pub const REST_DAY_WINDOW_DAYS: i64 = 7;
/// Single-day gaps tolerated in the window; eligibility ends past the first
pub const REST_DAYS_PER_WINDOW: u32 = 2;

/// Streak counters derived from logged dates
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreakStats {
    pub logged_days: u32,
    pub missed_days: u32,
    /// Consecutive days ending at the latest log
    pub current_streak: u32,
    /// Consecutive days since the most recent break; 0 if there never was one
    pub comeback_streak: u32,
}

/// Calorie adherence against a band
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalorieAdherence {
    /// Out-of-band days among the last `CALORIE_LOOKBACK_DAYS` calorie logs
    pub deviation_days: u32,
    /// Trailing run of consecutive in-band days
    pub streak: u32,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RestDayState {
    BuildStreak,
    AlreadyUsed,
    Available,
}

/// Informational rest-day eligibility; never applied automatically
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestDayStatus {
    pub eligible: bool,
    pub state: RestDayState,
    pub message: String,
    pub available: u32,
    pub used_in_window: u32,
}

impl RestDayStatus {
    fn build_streak() -> Self {
        Self {
            eligible: false,
            state: RestDayState::BuildStreak,
            message: format!(
                "Build a {}-day streak to earn a rest day",
                REST_DAY_MIN_STREAK
            ),
            available: 0,
            used_in_window: 0,
        }
    }
}

/// Penalty and recovery rates plus the signals behind them
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorBreakdown {
    pub penalty_rate: f64,
    pub recovery_rate: f64,
    pub missed_day_penalty_rate: f64,
    pub calorie_penalty_rate: f64,
    pub streak_recovery_rate: f64,
    pub calorie_recovery_rate: f64,
    pub missed_days: u32,
    pub current_streak: u32,
    pub comeback_streak: u32,
    pub calorie_deviation_days: u32,
    pub calorie_streak: u32,
    pub calorie_band: Option<CalorieBand>,
    pub rest_day: RestDayStatus,
}

/// Base XP with penalty and recovery applied
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct XpAdjustment {
    pub base_xp: u64,
    pub penalty_xp: u64,
    pub recovery_xp: u64,
    pub adjusted_xp: u64,
}

/// Sorted distinct logged dates of a date-sorted entry sequence
pub fn logged_dates(entries: &[DailyEntry]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = entries.iter().map(|e| e.date).collect();
    dates.sort();
    dates.dedup();
    dates
}

/// Missed-day, current-streak and comeback counters
pub fn streak_stats(dates: &[NaiveDate]) -> StreakStats {
    if dates.is_empty() {
        return StreakStats::default();
    }

    let gaps: Vec<i64> = dates.windows(2).map(|w| gap_days(w[0], w[1])).collect();
    let missed_days = dates
        .windows(2)
        .map(|w| skipped_between(w[0], w[1]))
        .sum();

    let trailing_daily = gaps.iter().rev().take_while(|g| **g == 1).count() as u32;
    let current_streak = trailing_daily + 1;
    let had_break = gaps.iter().any(|g| *g > 1);
    let comeback_streak = if had_break { current_streak } else { 0 };

    StreakStats {
        logged_days: dates.len() as u32,
        missed_days,
        current_streak,
        comeback_streak,
    }
}

/// Deviation days and trailing in-band streak for `band`
pub fn calorie_adherence(entries: &[DailyEntry], band: &CalorieBand) -> CalorieAdherence {
    let deviation_days = entries
        .iter()
        .rev()
        .filter_map(|e| e.calories)
        .take(CALORIE_LOOKBACK_DAYS)
        .filter(|c| !band.contains(*c))
        .count() as u32;

    // A missing calorie value, an out-of-band day or a skipped calendar day
    // ends the run.
    let mut streak = 0;
    let mut newer: Option<NaiveDate> = None;
    for entry in entries.iter().rev() {
        if let Some(next) = newer {
            if gap_days(entry.date, next) != 1 {
                break;
            }
        }
        match entry.calories {
            Some(c) if band.contains(c) => streak += 1,
            _ => break,
        }
        newer = Some(entry.date);
    }

    CalorieAdherence {
        deviation_days,
        streak,
    }
}

pub fn missed_day_penalty_rate(missed_days: u32) -> f64 {
    (missed_days as f64 * MISSED_DAY_PENALTY_STEP).min(MISSED_DAY_PENALTY_CAP)
}

pub fn calorie_penalty_rate(deviation_days: u32) -> f64 {
    (deviation_days as f64 * CALORIE_PENALTY_STEP).min(CALORIE_PENALTY_CAP)
}

pub fn combined_penalty_rate(missed_day_rate: f64, calorie_rate: f64) -> f64 {
    (missed_day_rate + calorie_rate).min(COMBINED_PENALTY_CAP)
}

/// Stepped rate once `run` reaches `trigger`; reaching the trigger earns the
/// first step.
fn stepped_rate(run: u32, trigger: u32, step: f64, cap: f64) -> f64 {
    if run < trigger {
        return 0.0;
    }
    ((run - trigger + 1) as f64 * step).min(cap)
}

pub fn streak_recovery_rate(comeback_streak: u32) -> f64 {
    stepped_rate(
        comeback_streak,
        STREAK_RECOVERY_TRIGGER,
        STREAK_RECOVERY_STEP,
        STREAK_RECOVERY_CAP,
    )
}

pub fn calorie_recovery_rate(calorie_streak: u32) -> f64 {
    stepped_rate(
        calorie_streak,
        CALORIE_RECOVERY_TRIGGER,
        CALORIE_RECOVERY_STEP,
        CALORIE_RECOVERY_CAP,
    )
}

pub fn total_recovery_rate(streak_rate: f64, calorie_rate: f64) -> f64 {
    (streak_rate + calorie_rate).min(TOTAL_RECOVERY_CAP)
}

/// Apply penalty and recovery rates to a base XP total
pub fn adjust_xp(base_xp: u64, penalty_rate: f64, recovery_rate: f64) -> XpAdjustment {
    let penalty_xp = (base_xp as f64 * penalty_rate).round().max(0.0) as u64;
    let recovery_xp = (base_xp as f64 * recovery_rate).round().max(0.0) as u64;
    let adjusted_xp = base_xp.saturating_add(recovery_xp).saturating_sub(penalty_xp);

    XpAdjustment {
        base_xp,
        penalty_xp,
        recovery_xp,
        adjusted_xp,
    }
}

/// Rest-day eligibility as of `today`
///
/// Eligible when the latest log is today or yesterday, the current streak is
/// at least three days, and at most one single-day gap falls inside the
/// trailing seven days ending at the latest log.
pub fn rest_day_status(dates: &[NaiveDate], current_streak: u32, today: NaiveDate) -> RestDayStatus {
    let Some(&latest) = dates.last() else {
        return RestDayStatus::build_streak();
    };

    let since_latest = gap_days(latest, today);
    if !(0..=1).contains(&since_latest) || current_streak < REST_DAY_MIN_STREAK {
        return RestDayStatus::build_streak();
    }

    let window_start = latest - Duration::days(REST_DAY_WINDOW_DAYS - 1);
    let used_in_window = dates
        .windows(2)
        .filter(|w| gap_days(w[0], w[1]) == 2)
        .filter(|w| w[0] + Duration::days(1) >= window_start)
        .count() as u32;

    if used_in_window >= REST_DAYS_PER_WINDOW {
        return RestDayStatus {
            eligible: false,
            state: RestDayState::AlreadyUsed,
            message: format!(
                "Rest day already used in the last {} days",
                REST_DAY_WINDOW_DAYS
            ),
            available: 0,
            used_in_window,
        };
    }

    let available = REST_DAYS_PER_WINDOW - used_in_window;
    RestDayStatus {
        eligible: true,
        state: RestDayState::Available,
        message: format!("{} rest day(s) available", available),
        available,
        used_in_window,
    }
}

/// Evaluate every behavior signal for a date-sorted entry sequence
///
/// `band` is `None` when the profile is incomplete, which disables the
/// calorie penalty and calorie recovery.
pub fn evaluate_behavior(
    entries: &[DailyEntry],
    band: Option<CalorieBand>,
    today: NaiveDate,
) -> BehaviorBreakdown {
    let dates = logged_dates(entries);
    let streaks = streak_stats(&dates);
    let adherence = band
        .as_ref()
        .map(|b| calorie_adherence(entries, b))
        .unwrap_or_default();

    let missed_day_penalty_rate = missed_day_penalty_rate(streaks.missed_days);
    let calorie_penalty_rate = calorie_penalty_rate(adherence.deviation_days);
    let penalty_rate = combined_penalty_rate(missed_day_penalty_rate, calorie_penalty_rate);

    let streak_recovery_rate = streak_recovery_rate(streaks.comeback_streak);
    let calorie_recovery_rate = calorie_recovery_rate(adherence.streak);
    let recovery_rate = total_recovery_rate(streak_recovery_rate, calorie_recovery_rate);

    let rest_day = rest_day_status(&dates, streaks.current_streak, today);

    tracing::debug!(
        "Behavior: {} missed, streak {}, comeback {}, penalty {:.3}, recovery {:.3}, rest day {:?}",
        streaks.missed_days,
        streaks.current_streak,
        streaks.comeback_streak,
        penalty_rate,
        recovery_rate,
        rest_day.state
    );

    BehaviorBreakdown {
        penalty_rate,
        recovery_rate,
        missed_day_penalty_rate,
        calorie_penalty_rate,
        streak_recovery_rate,
        calorie_recovery_rate,
        missed_days: streaks.missed_days,
        current_streak: streaks.current_streak,
        comeback_streak: streaks.comeback_streak,
        calorie_deviation_days: adherence.deviation_days,
        calorie_streak: adherence.streak,
        calorie_band: band,
        rest_day,
    }
}
