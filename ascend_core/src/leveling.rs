//! Exponential XP-to-level curve.
//!
//! Level 1 needs 100 XP to clear, and each further level costs 25% more than
//! the previous one, rounded to the nearest XP.

use serde::{Deserialize, Serialize};

pub const BASE_LEVEL_XP: f64 = 100.0;
pub const LEVEL_GROWTH: f64 = 1.25;

/// Where a cumulative XP total lands on the curve
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    /// XP accumulated inside the current level
    pub in_level_xp: u64,
    /// XP needed to clear the current level
    pub next_threshold: u64,
}

impl LevelProgress {
    /// Progress through the current level in [0, 1)
    pub fn fraction(&self) -> f64 {
        if self.next_threshold == 0 {
            return 0.0;
        }
        self.in_level_xp as f64 / self.next_threshold as f64
    }
}

/// XP required to advance from `level` to `level + 1`
///
/// Saturates at `u64::MAX` for levels far beyond any reachable total.
pub fn xp_to_next_level(level: u32) -> u64 {
    let exponent = level.saturating_sub(1).min(i32::MAX as u32) as i32;
    let xp = (BASE_LEVEL_XP * LEVEL_GROWTH.powi(exponent)).round();
    // `as` saturates for out-of-range floats
    xp as u64
}

/// Cumulative XP needed to reach `level` from zero
pub fn total_xp_for_level(level: u32) -> u64 {
    (1..level).fold(0u64, |acc, l| acc.saturating_add(xp_to_next_level(l)))
}

/// Resolve a cumulative XP total into level and in-level progress
///
/// Terminates for every input: thresholds grow geometrically, so the number
/// of iterations is logarithmic in `xp`.
pub fn level_from_xp(xp: u64) -> LevelProgress {
    let mut level = 1u32;
    let mut remaining = xp;
    let mut threshold = xp_to_next_level(level);

    while remaining >= threshold && threshold < u64::MAX {
        remaining -= threshold;
        level += 1;
        threshold = xp_to_next_level(level);
    }

    LevelProgress {
        level,
        in_level_xp: remaining,
        next_threshold: threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_to_next_level() {
        assert_eq!(xp_to_next_level(1), 100);
        assert_eq!(xp_to_next_level(2), 125);
        assert_eq!(xp_to_next_level(3), 156); // 156.25
        assert_eq!(xp_to_next_level(4), 195); // 195.3125
        assert_eq!(xp_to_next_level(5), 244); // 244.140625
    }

    #[test]
    fn test_level_zero_treated_as_first_level() {
        assert_eq!(xp_to_next_level(0), xp_to_next_level(1));
    }

    #[test]
    fn test_level_from_xp_basics() {
        let start = level_from_xp(0);
        assert_eq!(start.level, 1);
        assert_eq!(start.in_level_xp, 0);
        assert_eq!(start.next_threshold, 100);

        let almost = level_from_xp(99);
        assert_eq!(almost.level, 1);
        assert_eq!(almost.in_level_xp, 99);

        let second = level_from_xp(100);
        assert_eq!(second.level, 2);
        assert_eq!(second.in_level_xp, 0);
        assert_eq!(second.next_threshold, 125);

        let mid = level_from_xp(300);
        assert_eq!(mid.level, 3);
        assert_eq!(mid.in_level_xp, 75);
    }

    #[test]
    fn test_level_boundaries_land_exactly() {
        for level in 1..=40 {
            let progress = level_from_xp(total_xp_for_level(level));
            assert_eq!(progress.level, level);
            assert_eq!(progress.in_level_xp, 0);
        }
    }

    #[test]
    fn test_level_is_monotonic() {
        let mut last = 1;
        for xp in (0..20_000).step_by(7) {
            let level = level_from_xp(xp).level;
            assert!(level >= last, "level dropped at xp {}", xp);
            last = level;
        }
    }

    #[test]
    fn test_huge_xp_terminates() {
        let progress = level_from_xp(u64::MAX);
        assert!(progress.level > 100);
        assert!(progress.level < 250);
    }

    #[test]
    fn test_fraction() {
        let progress = level_from_xp(150);
        assert!((progress.fraction() - 0.4).abs() < 1e-9);
    }
}
