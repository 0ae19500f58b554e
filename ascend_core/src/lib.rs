#![forbid(unsafe_code)]

//! Core progression and behavior-mechanics engine for Ascend.
//!
//! This crate provides:
//! - Domain types (daily entries, profile, skills, quests)
//! - Entry normalization and calendar-day arithmetic
//! - XP leveling, skill/attribute aggregation and quest progress
//! - Streak-based penalty/recovery mechanics and rest-day eligibility
//! - BMR/TDEE estimation with an adaptive dynamic adjustment
//! - Rolling-window metric analytics
//! - JSON persistence, CSV export and configuration
//!
//! The computation is pure: every snapshot is rebuilt from the entry log so
//! identical inputs give identical results.

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod dates;
pub mod entries;
pub mod leveling;
pub mod skills;
pub mod behavior;
pub mod metabolic;
pub mod quests;
pub mod analytics;
pub mod snapshot;
pub mod store;
pub mod export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use entries::normalize_entries;
pub use leveling::{level_from_xp, xp_to_next_level, LevelProgress};
pub use behavior::{evaluate_behavior, BehaviorBreakdown, RestDayStatus};
pub use metabolic::{compute_baseline_tdee, compute_bmr, compute_dynamic_tdee, derive_metabolics};
pub use quests::{quest_catalog, quest_progress, QuestProgress};
pub use analytics::{analyze_area, get_metric_window, MetricAnalysisEnvelope, MetricKey};
pub use snapshot::{compute_snapshot, compute_snapshot_from_log, EngineOptions, ProgressionSnapshot};
pub use store::{AppData, DataStore, JsonFileStore};
pub use export::export_entries_csv;
