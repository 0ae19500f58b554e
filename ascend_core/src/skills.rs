//! Skill and attribute XP aggregation.
//!
//! Each logged day issues a fixed grant to every skill plus conditional
//! bonuses for healthy values:
//! - Sleep between 7 and 9 hours: Energy +5
//! - At least 30 exercise minutes at effort 6 or higher: Strength +10
//! - Mood of 7 or higher: Emotional Balance +5
//!
//! Attribute XP is the sum of the skills mapped to it.

use crate::leveling::{level_from_xp, LevelProgress};
use crate::{Attribute, DailyEntry, Skill};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Overall XP granted for completing a day, whatever was filled in
pub const DAILY_COMPLETION_XP: u64 = 20;

pub const SMALL_SKILL_BASE_XP: u64 = 5;
pub const STRENGTH_BASE_XP: u64 = 15;

pub const SLEEP_BONUS_XP: u64 = 5;
pub const SLEEP_BONUS_MIN_HOURS: f64 = 7.0;
pub const SLEEP_BONUS_MAX_HOURS: f64 = 9.0;

pub const STRENGTH_BONUS_XP: u64 = 10;
pub const STRENGTH_BONUS_MIN_MINUTES: f64 = 30.0;
pub const STRENGTH_BONUS_MIN_EFFORT: f64 = 6.0;

pub const MOOD_BONUS_XP: u64 = 5;
pub const MOOD_BONUS_MIN: f64 = 7.0;

/// Cumulative XP across all entries
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkillTotals {
    /// Overall XP before behavior penalties and recovery
    pub base_xp: u64,
    pub skill_xp: BTreeMap<Skill, u64>,
    pub attribute_xp: BTreeMap<Attribute, u64>,
}

impl SkillTotals {
    /// Level view of every skill
    pub fn skill_levels(&self) -> BTreeMap<Skill, LevelProgress> {
        self.skill_xp
            .iter()
            .map(|(skill, xp)| (*skill, level_from_xp(*xp)))
            .collect()
    }
}

/// XP a single entry grants to each skill
pub fn skill_gains(entry: &DailyEntry) -> BTreeMap<Skill, u64> {
    let mut gains = BTreeMap::new();
    gains.insert(Skill::Energy, SMALL_SKILL_BASE_XP);
    gains.insert(Skill::Organisation, SMALL_SKILL_BASE_XP);
    gains.insert(Skill::EmotionalBalance, SMALL_SKILL_BASE_XP);
    gains.insert(Skill::Strength, STRENGTH_BASE_XP);

    if let Some(sleep) = entry.sleep_hours {
        if (SLEEP_BONUS_MIN_HOURS..=SLEEP_BONUS_MAX_HOURS).contains(&sleep) {
            *gains.entry(Skill::Energy).or_insert(0) += SLEEP_BONUS_XP;
        }
    }

    if let (Some(minutes), Some(effort)) = (entry.exercise_minutes, entry.exercise_effort) {
        if minutes >= STRENGTH_BONUS_MIN_MINUTES && effort >= STRENGTH_BONUS_MIN_EFFORT {
            *gains.entry(Skill::Strength).or_insert(0) += STRENGTH_BONUS_XP;
        }
    }

    if let Some(mood) = entry.mood {
        if mood >= MOOD_BONUS_MIN {
            *gains.entry(Skill::EmotionalBalance).or_insert(0) += MOOD_BONUS_XP;
        }
    }

    gains
}

/// Roll attribute XP up from skill XP via the static attribute table
pub fn attribute_xp(skill_xp: &BTreeMap<Skill, u64>) -> BTreeMap<Attribute, u64> {
    Attribute::ALL
        .iter()
        .map(|attr| {
            let total = attr
                .skills()
                .iter()
                .map(|skill| skill_xp.get(skill).copied().unwrap_or(0))
                .sum();
            (*attr, total)
        })
        .collect()
}

/// Sum skill gains across a date-sorted entry sequence
pub fn aggregate_skills(entries: &[DailyEntry]) -> SkillTotals {
    let mut skill_xp: BTreeMap<Skill, u64> = Skill::ALL.iter().map(|s| (*s, 0)).collect();

    for entry in entries {
        for (skill, gain) in skill_gains(entry) {
            *skill_xp.entry(skill).or_insert(0) += gain;
        }
    }

    let base_xp = DAILY_COMPLETION_XP * entries.len() as u64;
    let attribute_xp = attribute_xp(&skill_xp);

    tracing::debug!(
        "Aggregated skill XP over {} entries: base {} XP, {:?}",
        entries.len(),
        base_xp,
        skill_xp
    );

    SkillTotals {
        base_xp,
        skill_xp,
        attribute_xp,
    }
}
