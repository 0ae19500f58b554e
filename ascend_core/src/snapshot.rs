//! Progression snapshot: the merged output of one full recomputation.
//!
//! Every call rebuilds the snapshot from the entry sequence; nothing is
//! patched incrementally, so identical inputs always give identical output.

use crate::behavior::{adjust_xp, evaluate_behavior, BehaviorBreakdown, XpAdjustment};
use crate::entries::normalize_entries;
use crate::leveling::{level_from_xp, LevelProgress};
use crate::metabolic::{
    calorie_band, compute_baseline_tdee, derive_metabolics, MetabolicSummary,
    DYNAMIC_TDEE_WINDOW_DAYS,
};
use crate::quests::{quest_catalog, quest_progress, QuestProgress};
use crate::skills::aggregate_skills;
use crate::{
    AcceptedQuests, Attribute, CalorieStrategy, DailyEntry, EntryLog, Profile, Result, Skill,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Engine settings that are not part of the user's data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Used when the profile has no `dynamicTdeeWindowDays`
    pub dynamic_tdee_window_days: usize,
    /// Used when the profile has no `calorieStrategy`
    pub calorie_strategy: CalorieStrategy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dynamic_tdee_window_days: DYNAMIC_TDEE_WINDOW_DAYS,
            calorie_strategy: CalorieStrategy::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionSnapshot {
    /// Overall XP after penalties and recovery
    pub overall_xp: u64,
    pub overall_level: LevelProgress,
    pub xp: XpAdjustment,
    pub skill_xp: BTreeMap<Skill, u64>,
    pub skill_levels: BTreeMap<Skill, LevelProgress>,
    pub attribute_xp: BTreeMap<Attribute, u64>,
    pub quests: BTreeMap<String, QuestProgress>,
    pub behavior: BehaviorBreakdown,
    pub metabolic: MetabolicSummary,
    pub ordered_entries: Vec<DailyEntry>,
}

/// Build the snapshot from an already normalized, date-sorted sequence
pub fn compute_snapshot(
    entries: &[DailyEntry],
    profile: &Profile,
    accepted: &AcceptedQuests,
    today: NaiveDate,
    options: &EngineOptions,
) -> ProgressionSnapshot {
    let skills = aggregate_skills(entries);

    let strategy = profile
        .calorie_strategy
        .unwrap_or(options.calorie_strategy);
    let band = compute_baseline_tdee(profile).map(|tdee| calorie_band(tdee, strategy));
    let behavior = evaluate_behavior(entries, band, today);

    let xp = adjust_xp(skills.base_xp, behavior.penalty_rate, behavior.recovery_rate);
    let quests = quest_progress(quest_catalog(), entries, accepted, today);
    let metabolic = derive_metabolics(profile, entries, options.dynamic_tdee_window_days);

    tracing::debug!(
        "Snapshot for {}: {} entries, {} XP (base {}, -{} +{})",
        today,
        entries.len(),
        xp.adjusted_xp,
        xp.base_xp,
        xp.penalty_xp,
        xp.recovery_xp
    );

    ProgressionSnapshot {
        overall_xp: xp.adjusted_xp,
        overall_level: level_from_xp(xp.adjusted_xp),
        xp,
        skill_levels: skills.skill_levels(),
        skill_xp: skills.skill_xp,
        attribute_xp: skills.attribute_xp,
        quests,
        behavior,
        metabolic,
        ordered_entries: entries.to_vec(),
    }
}

/// Normalize the raw entry map, then build the snapshot
pub fn compute_snapshot_from_log(
    log: &EntryLog,
    profile: &Profile,
    accepted: &AcceptedQuests,
    today: NaiveDate,
    options: &EngineOptions,
) -> Result<ProgressionSnapshot> {
    let entries = normalize_entries(log)?;
    Ok(compute_snapshot(&entries, profile, accepted, today, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityLevel, Gender};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 15).unwrap()
    }

    fn profile() -> Profile {
        Profile {
            age: Some(35),
            height_cm: Some(165.0),
            weight_kg: Some(62.0),
            gender: Some(Gender::Female),
            activity_level: Some(ActivityLevel::Light),
            dynamic_tdee_enabled: true,
            ..Profile::default()
        }
    }

    fn log_with_gap() -> EntryLog {
        let mut log = EntryLog::new();
        for back in [0i64, 1, 2, 3, 5, 6, 9] {
            let date = today() - Duration::days(back);
            let mut entry = DailyEntry::new(date);
            entry.calories = Some(1900.0);
            entry.sleep_hours = Some(7.5);
            entry.mood = Some((back % 10) as f64 + 1.0);
            entry.exercise_minutes = Some(if back % 2 == 0 { 40.0 } else { 0.0 });
            entry.exercise_effort = Some(7.0);
            log.insert(date.format("%Y-%m-%d").to_string(), entry);
        }
        log
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let log = log_with_gap();
        let mut accepted = AcceptedQuests::new();
        accepted.insert("dailyLog30".into(), true);
        let options = EngineOptions::default();

        let first = compute_snapshot_from_log(&log, &profile(), &accepted, today(), &options).unwrap();
        let second = compute_snapshot_from_log(&log, &profile(), &accepted, today(), &options).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_snapshot_wires_components() {
        let log = log_with_gap();
        let snapshot = compute_snapshot_from_log(
            &log,
            &profile(),
            &AcceptedQuests::new(),
            today(),
            &EngineOptions::default(),
        )
        .unwrap();

        assert_eq!(snapshot.ordered_entries.len(), 7);
        assert!(snapshot
            .ordered_entries
            .windows(2)
            .all(|w| w[0].date < w[1].date));

        // 7 days * 20 XP
        assert_eq!(snapshot.xp.base_xp, 140);
        assert_eq!(snapshot.overall_xp, snapshot.xp.adjusted_xp);
        assert_eq!(snapshot.overall_level, level_from_xp(snapshot.overall_xp));

        // Gaps: 9 -> 6 skips two days, 5 -> 3 skips one
        assert_eq!(snapshot.behavior.missed_days, 3);
        assert_eq!(snapshot.behavior.current_streak, 4);
        assert_eq!(snapshot.behavior.comeback_streak, 4);
        assert!(snapshot.behavior.calorie_band.is_some());

        assert!(snapshot.quests.values().all(|q| q.current == 0 && !q.accepted));
        assert!(snapshot.metabolic.baseline_tdee.is_some());
        assert!(snapshot.metabolic.dynamic.is_some());

        let body = snapshot.attribute_xp[&Attribute::Body];
        assert_eq!(
            body,
            snapshot.skill_xp[&Skill::Strength] + snapshot.skill_xp[&Skill::Energy]
        );
    }

    #[test]
    fn test_empty_inputs() {
        let snapshot = compute_snapshot(
            &[],
            &Profile::default(),
            &AcceptedQuests::new(),
            today(),
            &EngineOptions::default(),
        );

        assert_eq!(snapshot.overall_xp, 0);
        assert_eq!(snapshot.overall_level.level, 1);
        assert_eq!(snapshot.behavior.penalty_rate, 0.0);
        assert_eq!(snapshot.behavior.recovery_rate, 0.0);
        assert!(!snapshot.behavior.rest_day.eligible);
        assert!(snapshot.behavior.calorie_band.is_none());
        assert!(snapshot.metabolic.baseline_tdee.is_none());
        assert!(snapshot.ordered_entries.is_empty());
    }

    #[test]
    fn test_edits_are_reflected_on_recompute() {
        let mut log = log_with_gap();
        let options = EngineOptions::default();
        let before =
            compute_snapshot_from_log(&log, &profile(), &AcceptedQuests::new(), today(), &options).unwrap();

        // Filling the skipped day removes one missed day
        let filled = today() - Duration::days(4);
        log.insert(filled.format("%Y-%m-%d").to_string(), DailyEntry::new(filled));
        let after =
            compute_snapshot_from_log(&log, &profile(), &AcceptedQuests::new(), today(), &options).unwrap();

        assert_eq!(after.behavior.missed_days, before.behavior.missed_days - 1);
        assert_eq!(after.xp.base_xp, before.xp.base_xp + 20);
    }

    #[test]
    fn test_profile_strategy_overrides_options() {
        let cutting = Profile {
            calorie_strategy: Some(CalorieStrategy::Cut),
            ..profile()
        };
        let snapshot = compute_snapshot(
            &[],
            &cutting,
            &AcceptedQuests::new(),
            today(),
            &EngineOptions::default(),
        );
        assert_eq!(
            snapshot.behavior.calorie_band.map(|b| b.strategy),
            Some(CalorieStrategy::Cut)
        );
    }
}
