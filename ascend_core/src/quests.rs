//! Quest catalog and progress tracking.
//!
//! Progress is a plain counter over the entry log, but it only shows once the
//! user has accepted the quest. Weekly quests count the current Monday-start
//! week, so they reset on their own as `today` moves forward.

use crate::dates::in_same_iso_week;
use crate::{
    AcceptedQuests, DailyEntry, Error, QuestCounter, QuestDefinition, QuestType, Result,
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Built once; the catalog is immutable configuration
static QUEST_CATALOG: Lazy<Vec<QuestDefinition>> = Lazy::new(build_quest_catalog);

/// The built-in quest definitions
pub fn quest_catalog() -> &'static [QuestDefinition] {
    &QUEST_CATALOG
}

/// Look up a quest definition by id
pub fn find_quest(id: &str) -> Option<&'static QuestDefinition> {
    quest_catalog().iter().find(|q| q.id == id)
}

fn build_quest_catalog() -> Vec<QuestDefinition> {
    vec![
        QuestDefinition {
            id: "dailyLog30".into(),
            label: "Log 30 days".into(),
            kind: QuestType::Long,
            counter: QuestCounter::LoggedDays,
            target: 30,
        },
        QuestDefinition {
            id: "exercise10".into(),
            label: "Exercise on 10 days".into(),
            kind: QuestType::Long,
            counter: QuestCounter::ExerciseDays,
            target: 10,
        },
        QuestDefinition {
            id: "weekly7".into(),
            label: "Log every day this week".into(),
            kind: QuestType::Weekly,
            counter: QuestCounter::DaysThisWeek,
            target: 7,
        },
    ]
}

/// Check a quest catalog for duplicate ids and zero targets
pub fn validate_quest_catalog(catalog: &[QuestDefinition]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for quest in catalog {
        if !seen.insert(quest.id.as_str()) {
            errors.push(format!("Duplicate quest id '{}'", quest.id));
        }
        if quest.target == 0 {
            errors.push(format!("Quest '{}' has a zero target", quest.id));
        }
    }

    errors
}

/// Fails with `Error::Catalog` if `id` is not a known quest
pub fn ensure_known_quest(id: &str) -> Result<&'static QuestDefinition> {
    find_quest(id).ok_or_else(|| Error::Catalog(format!("Unknown quest id '{}'", id)))
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestProgress {
    pub current: u32,
    pub target: u32,
    pub accepted: bool,
}

impl QuestProgress {
    pub fn is_complete(&self) -> bool {
        self.accepted && self.current >= self.target
    }
}

/// Raw counter value for a quest, ignoring acceptance
pub fn count_for(counter: QuestCounter, entries: &[DailyEntry], today: NaiveDate) -> u32 {
    let count = match counter {
        QuestCounter::LoggedDays => entries.len(),
        QuestCounter::ExerciseDays => entries
            .iter()
            .filter(|e| e.exercise_minutes.is_some_and(|m| m > 0.0))
            .count(),
        QuestCounter::DaysThisWeek => entries
            .iter()
            .filter(|e| in_same_iso_week(e.date, today))
            .count(),
    };
    count as u32
}

/// Progress for every quest in `catalog`
///
/// `current` stays 0 for any quest not explicitly accepted.
pub fn quest_progress(
    catalog: &[QuestDefinition],
    entries: &[DailyEntry],
    accepted: &AcceptedQuests,
    today: NaiveDate,
) -> BTreeMap<String, QuestProgress> {
    catalog
        .iter()
        .map(|quest| {
            let is_accepted = accepted.get(&quest.id).copied().unwrap_or(false);
            let current = if is_accepted {
                count_for(quest.counter, entries, today)
            } else {
                0
            };
            (
                quest.id.clone(),
                QuestProgress {
                    current,
                    target: quest.target,
                    accepted: is_accepted,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // A Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 8).unwrap()
    }

    fn log(days_back: i64, exercise_every: i64) -> Vec<DailyEntry> {
        (0..days_back)
            .rev()
            .map(|back| {
                let mut entry = DailyEntry::new(monday() + Duration::days(6) - Duration::days(back));
                if back % exercise_every == 0 {
                    entry.exercise_minutes = Some(30.0);
                } else {
                    entry.exercise_minutes = Some(0.0);
                }
                entry
            })
            .collect()
    }

    fn accept_all() -> AcceptedQuests {
        quest_catalog().iter().map(|q| (q.id.clone(), true)).collect()
    }

    #[test]
    fn test_catalog_validates() {
        let errors = validate_quest_catalog(quest_catalog());
        assert!(errors.is_empty(), "Catalog errors: {:?}", errors);
    }

    #[test]
    fn test_validation_catches_problems() {
        let mut catalog = quest_catalog().to_vec();
        catalog.push(catalog[0].clone());
        catalog[1].target = 0;

        let errors = validate_quest_catalog(&catalog);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unaccepted_quests_stay_at_zero() {
        let entries = log(60, 1);
        let sunday = monday() + Duration::days(6);

        let mut accepted = AcceptedQuests::new();
        accepted.insert("weekly7".into(), false);
        let progress = quest_progress(quest_catalog(), &entries, &accepted, sunday);

        for (id, quest) in &progress {
            assert_eq!(quest.current, 0, "quest {} should be gated", id);
            assert!(!quest.accepted);
            assert!(!quest.is_complete());
        }
    }

    #[test]
    fn test_accepted_counters() {
        let entries = log(20, 4);
        let sunday = monday() + Duration::days(6);
        let progress = quest_progress(quest_catalog(), &entries, &accept_all(), sunday);

        assert_eq!(progress["dailyLog30"].current, 20);
        assert_eq!(progress["dailyLog30"].target, 30);
        // back = 0, 4, 8, 12, 16
        assert_eq!(progress["exercise10"].current, 5);
        assert_eq!(progress["weekly7"].current, 7);
        assert!(progress["weekly7"].is_complete());
    }

    #[test]
    fn test_weekly_resets_on_monday() {
        let entries = log(7, 1);
        let next_monday = monday() + Duration::days(7);
        let progress = quest_progress(quest_catalog(), &entries, &accept_all(), next_monday);
        assert_eq!(progress["weekly7"].current, 0);
    }

    #[test]
    fn test_unknown_quest() {
        assert!(ensure_known_quest("exercise10").is_ok());
        assert!(matches!(
            ensure_known_quest("nope"),
            Err(Error::Catalog(_))
        ));
    }
}
