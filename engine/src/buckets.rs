//! Age Bucket Resolver
//!
//! Maps an age to one life stage. Every component that needs a bucket goes
//! through `AgeBucket::resolve`.

use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    VeryYoung,
    YoungAdults,
    Adults,
    MiddleAged,
    OlderAdults,
    Seniors,
    Elderly,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 7] = [
        AgeBucket::VeryYoung,
        AgeBucket::YoungAdults,
        AgeBucket::Adults,
        AgeBucket::MiddleAged,
        AgeBucket::OlderAdults,
        AgeBucket::Seniors,
        AgeBucket::Elderly,
    ];

    /// Returns the single bucket containing `age`.
    ///
    /// Upper boundaries, in order: `min_age + 5`, `min_age + 16`, 40, 50,
    /// `life_expectancy`, `life_expectancy + longevity_slack`. Each boundary is
    /// raised to at least the previous one so a large `min_age` collapses
    /// buckets rather than making them overlap.
    pub fn resolve(age: u32, rules: &RuleSet) -> AgeBucket {
        let bounds = Self::upper_bounds(rules);
        bounds
            .iter()
            .position(|upper| age < *upper)
            .map(|i| Self::ALL[i])
            .unwrap_or(AgeBucket::Elderly)
    }

    fn upper_bounds(rules: &RuleSet) -> [u32; 6] {
        let raw = [
            rules.min_age.saturating_add(5),
            rules.min_age.saturating_add(16),
            40,
            50,
            rules.life_expectancy,
            rules.max_living_age(),
        ];
        let mut bounds = [0u32; 6];
        let mut floor = 0;
        for (i, b) in raw.iter().enumerate() {
            floor = floor.max(*b);
            bounds[i] = floor;
        }
        bounds
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Moves `offset` stages up or down, clamped to the terminal buckets.
    pub fn offset(self, offset: i32) -> AgeBucket {
        let idx = (self.index() as i32 + offset).clamp(0, Self::ALL.len() as i32 - 1);
        Self::ALL[idx as usize]
    }

    pub fn key(self) -> &'static str {
        match self {
            AgeBucket::VeryYoung => "very_young",
            AgeBucket::YoungAdults => "young_adults",
            AgeBucket::Adults => "adults",
            AgeBucket::MiddleAged => "middle_aged",
            AgeBucket::OlderAdults => "older_adults",
            AgeBucket::Seniors => "seniors",
            AgeBucket::Elderly => "elderly",
        }
    }

    pub fn from_key(key: &str) -> Option<AgeBucket> {
        Self::ALL.iter().copied().find(|b| b.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_boundaries() {
        let rules = RuleSet::default();
        assert_eq!(AgeBucket::resolve(0, &rules), AgeBucket::VeryYoung);
        assert_eq!(AgeBucket::resolve(22, &rules), AgeBucket::VeryYoung);
        assert_eq!(AgeBucket::resolve(23, &rules), AgeBucket::YoungAdults);
        assert_eq!(AgeBucket::resolve(33, &rules), AgeBucket::YoungAdults);
        assert_eq!(AgeBucket::resolve(34, &rules), AgeBucket::Adults);
        assert_eq!(AgeBucket::resolve(40, &rules), AgeBucket::MiddleAged);
        assert_eq!(AgeBucket::resolve(50, &rules), AgeBucket::OlderAdults);
        assert_eq!(AgeBucket::resolve(80, &rules), AgeBucket::Seniors);
        assert_eq!(AgeBucket::resolve(85, &rules), AgeBucket::Elderly);
        assert_eq!(AgeBucket::resolve(130, &rules), AgeBucket::Elderly);
    }

    #[test]
    fn test_partition_is_monotonic() {
        for min_age in [0, 16, 18, 30, 45] {
            let rules = RuleSet {
                min_age,
                ..RuleSet::default()
            };
            let mut prev = AgeBucket::VeryYoung;
            for age in 0..120 {
                let bucket = AgeBucket::resolve(age, &rules);
                assert!(bucket >= prev, "age {} went back to {:?}", age, bucket);
                prev = bucket;
            }
        }
    }

    #[test]
    fn test_extreme_ages_saturate() {
        let rules = RuleSet {
            min_age: u32::MAX - 2,
            life_expectancy: u32::MAX - 1,
            longevity_slack: 10,
            ..RuleSet::default()
        };
        assert_eq!(rules.max_living_age(), u32::MAX);
        assert_eq!(AgeBucket::resolve(30, &rules), AgeBucket::VeryYoung);
        assert_eq!(AgeBucket::resolve(u32::MAX, &rules), AgeBucket::Elderly);
    }

    #[test]
    fn test_offset_clamps() {
        assert_eq!(AgeBucket::Adults.offset(2), AgeBucket::OlderAdults);
        assert_eq!(AgeBucket::Seniors.offset(5), AgeBucket::Elderly);
        assert_eq!(AgeBucket::YoungAdults.offset(-2), AgeBucket::VeryYoung);
        assert_eq!(AgeBucket::from_key("middle_aged"), Some(AgeBucket::MiddleAged));
    }
}
