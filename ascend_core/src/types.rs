//! Core domain types for the progression engine.
//!
//! This module defines the input side of the engine:
//! - Daily entries and their anomaly flags
//! - The user profile and its enums
//! - Skills, attributes and quest definitions
//!
//! Output types live next to the module that computes them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Entry Types
// ============================================================================

/// Raw entry collection keyed by ISO date string (`YYYY-MM-DD`)
pub type EntryLog = BTreeMap<String, DailyEntry>;

/// Quest id -> accepted flag
pub type AcceptedQuests = BTreeMap<String, bool>;

/// Data-quality flags raised during normalization
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyFlag {
    CaloriesOutOfRange,
    SleepOutOfRange,
    MoodOutOfRange,
    StepsOutOfRange,
    ExerciseMinutesOutOfRange,
    ExerciseEffortOutOfRange,
}

/// One day of self-tracking
///
/// Every metric is independently nullable. `None` means "not logged" and is
/// never conflated with zero.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    #[serde(default = "epoch_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub mood: Option<f64>,
    #[serde(default)]
    pub steps: Option<f64>,
    #[serde(default)]
    pub exercise_minutes: Option<f64>,
    #[serde(default)]
    pub exercise_effort: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub anomalies: BTreeSet<AnomalyFlag>,
}

// Placeholder for entries serialized without a `date` field; the map key
// replaces it during normalization.
fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl DailyEntry {
    /// Create an entry for `date` with nothing logged
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            calories: None,
            sleep_hours: None,
            mood: None,
            steps: None,
            exercise_minutes: None,
            exercise_effort: None,
            created_at: None,
            updated_at: None,
            anomalies: BTreeSet::new(),
        }
    }

    /// True when none of the six metrics were filled in
    ///
    /// A blank entry still counts as a logged day.
    pub fn is_blank(&self) -> bool {
        self.calories.is_none()
            && self.sleep_hours.is_none()
            && self.mood.is_none()
            && self.steps.is_none()
            && self.exercise_minutes.is_none()
            && self.exercise_effort.is_none()
    }
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Activity tier used to scale BMR into TDEE
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Calorie adherence strategy relative to TDEE
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalorieStrategy {
    #[default]
    Maintain,
    Cut,
    Gain,
}

impl CalorieStrategy {
    /// (min, max) percentages of TDEE considered in-band
    pub fn band_percent(self) -> (u32, u32) {
        match self {
            CalorieStrategy::Maintain => (90, 110),
            CalorieStrategy::Cut => (80, 95),
            CalorieStrategy::Gain => (105, 115),
        }
    }
}

/// User profile as stored in the data blob
///
/// `baseline_tdee` and `dynamic_tdee` are derived values, refreshed by
/// `Profile::with_derived` rather than edited directly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub baseline_tdee: Option<u32>,
    #[serde(default)]
    pub dynamic_tdee: Option<u32>,
    #[serde(default)]
    pub dynamic_tdee_enabled: bool,
    #[serde(default)]
    pub dynamic_tdee_window_days: Option<usize>,
    #[serde(default)]
    pub calorie_strategy: Option<CalorieStrategy>,
}

/// The five fields BMR needs, all present
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyMetrics {
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

impl Profile {
    /// Returns the base body metrics only when all five are set
    pub fn body_metrics(&self) -> Option<BodyMetrics> {
        Some(BodyMetrics {
            age: self.age?,
            height_cm: self.height_cm?,
            weight_kg: self.weight_kg?,
            gender: self.gender?,
            activity_level: self.activity_level?,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.body_metrics().is_some()
    }
}

// ============================================================================
// Skill and Attribute Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Skill {
    Energy,
    Organisation,
    #[serde(rename = "Emotional Balance")]
    EmotionalBalance,
    Strength,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Energy,
        Skill::Organisation,
        Skill::EmotionalBalance,
        Skill::Strength,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Skill::Energy => "Energy",
            Skill::Organisation => "Organisation",
            Skill::EmotionalBalance => "Emotional Balance",
            Skill::Strength => "Strength",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    Body,
    Mind,
    Soul,
}

impl Attribute {
    pub const ALL: [Attribute; 3] = [Attribute::Body, Attribute::Mind, Attribute::Soul];

    /// Skills rolled up into this attribute
    pub fn skills(self) -> &'static [Skill] {
        match self {
            Attribute::Body => &[Skill::Strength, Skill::Energy],
            Attribute::Mind => &[Skill::Organisation],
            Attribute::Soul => &[Skill::EmotionalBalance],
        }
    }
}

// ============================================================================
// Quest Types
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Long,
    Weekly,
}

/// What a quest counts
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestCounter {
    /// Every logged day
    LoggedDays,
    /// Days with `exercise_minutes > 0`
    ExerciseDays,
    /// Logged days inside the current ISO week
    DaysThisWeek,
}

/// Static catalog entry for a quest
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestDefinition {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: QuestType,
    pub counter: QuestCounter,
    pub target: u32,
}
