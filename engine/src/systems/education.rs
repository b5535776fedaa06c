//! Education System
//!
//! Highest completed level, an optional level in progress and a field of
//! study. Decided before employment, which filters jobs on it.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Education, EducationLevel, SocialClass};
use crate::provider::{Category, LookupKey};
use crate::rules::pick_weighted;
use crate::systems::GenContext;

const LEVELS: [EducationLevel; 7] = [
    EducationLevel::None,
    EducationLevel::Primary,
    EducationLevel::Secondary,
    EducationLevel::Vocational,
    EducationLevel::Bachelor,
    EducationLevel::Master,
    EducationLevel::Doctorate,
];

/// Completed-level weights in `LEVELS` order, per class.
const LEVEL_WEIGHTS: [(SocialClass, [f64; 7]); 4] = [
    (SocialClass::Low, [0.0, 20.0, 45.0, 25.0, 8.0, 2.0, 0.0]),
    (SocialClass::Middle, [0.0, 8.0, 35.0, 25.0, 22.0, 9.0, 1.0]),
    (SocialClass::UpperMiddle, [0.0, 2.0, 18.0, 12.0, 38.0, 25.0, 5.0]),
    (SocialClass::High, [0.0, 1.0, 10.0, 6.0, 38.0, 35.0, 10.0]),
];

/// Weight given to "no formal education", only at 55 and over.
const NO_EDUCATION_WEIGHT: f64 = 6.0;
const NO_EDUCATION_MIN_AGE: u32 = 55;

/// `(upper age, enrollment chance)` for adults.
const ENROLLMENT_BY_AGE: &[(u32, f64)] = &[(22, 0.55), (26, 0.30), (35, 0.08)];

const FALLBACK_FIELDS: &[&str] = &[
    "Business Administration",
    "Engineering",
    "Computer Science",
    "Law",
    "Medicine",
    "Psychology",
    "Economics",
    "History",
];

/// Youngest age at which `level` can have been completed.
pub fn completion_age(level: EducationLevel) -> u32 {
    match level {
        EducationLevel::None => 0,
        EducationLevel::Primary => 12,
        EducationLevel::Secondary => 18,
        EducationLevel::Vocational => 19,
        EducationLevel::Bachelor => 21,
        EducationLevel::Master => 23,
        EducationLevel::Doctorate => 27,
    }
}

pub fn build_education<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, age: u32, class: SocialClass) -> Education {
    if age < 12 {
        return Education {
            completed: EducationLevel::None,
            in_progress: Some(EducationLevel::Primary),
            field: None,
        };
    }
    if age < 18 {
        return Education {
            completed: EducationLevel::Primary,
            in_progress: Some(EducationLevel::Secondary),
            field: None,
        };
    }

    if rng.gen_bool(enrollment_chance(age, class)) {
        let (completed, studying) = enrolled_levels(rng, age);
        return Education {
            completed,
            in_progress: Some(studying),
            field: Some(field_of_study(rng, ctx, age)),
        };
    }

    let completed = completed_level(rng, age, class);
    let field = if completed.is_higher() { Some(field_of_study(rng, ctx, age)) } else { None };
    Education {
        completed,
        in_progress: None,
        field,
    }
}

fn enrollment_chance(age: u32, class: SocialClass) -> f64 {
    let base = ENROLLMENT_BY_AGE
        .iter()
        .find(|(upper, _)| age < *upper)
        .map(|(_, p)| *p)
        .unwrap_or(0.0);
    let factor = match class {
        SocialClass::Low => 0.6,
        SocialClass::Middle => 1.0,
        SocialClass::UpperMiddle => 1.3,
        SocialClass::High => 1.5,
    };
    (base * factor).min(1.0)
}

/// `(completed, in progress)` for an enrolled adult.
fn enrolled_levels<R: Rng + ?Sized>(rng: &mut R, age: u32) -> (EducationLevel, EducationLevel) {
    if age < 22 {
        if rng.gen_bool(0.25) {
            (EducationLevel::Secondary, EducationLevel::Vocational)
        } else {
            (EducationLevel::Secondary, EducationLevel::Bachelor)
        }
    } else if age < 24 || rng.gen_bool(0.5) {
        (EducationLevel::Secondary, EducationLevel::Bachelor)
    } else if age >= 28 && rng.gen_bool(0.2) {
        (EducationLevel::Master, EducationLevel::Doctorate)
    } else {
        (EducationLevel::Bachelor, EducationLevel::Master)
    }
}

fn completed_level<R: Rng + ?Sized>(rng: &mut R, age: u32, class: SocialClass) -> EducationLevel {
    let weights = LEVEL_WEIGHTS
        .iter()
        .find(|(c, _)| *c == class)
        .map(|(_, w)| *w)
        .unwrap_or(LEVEL_WEIGHTS[1].1);

    let table: Vec<(String, f64)> = LEVELS
        .iter()
        .zip(weights)
        .map(|(level, w)| {
            let w = match level {
                EducationLevel::None if age >= NO_EDUCATION_MIN_AGE => NO_EDUCATION_WEIGHT,
                _ if age < completion_age(*level) => 0.0,
                _ => w,
            };
            (format!("{:?}", level), w)
        })
        .collect();

    pick_weighted(rng, &table)
        .and_then(|label| LEVELS.iter().find(|l| format!("{:?}", l) == label).copied())
        .unwrap_or(EducationLevel::Secondary)
}

fn field_of_study<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, age: u32) -> String {
    ctx.data
        .lookup(Category::StudentFields, &LookupKey::any().bucket(ctx.bucket(age)))
        .choose(rng)
        .cloned()
        .or_else(|| FALLBACK_FIELDS.choose(rng).map(|s| s.to_string()))
        .unwrap_or_else(|| "General Studies".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::fixtures::Fixture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_minors_are_in_school() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(1);
        let edu = build_education(&mut rng, &ctx, 16, SocialClass::High);
        assert_eq!(edu.completed, EducationLevel::Primary);
        assert_eq!(edu.in_progress, Some(EducationLevel::Secondary));
        assert!(edu.field.is_none());
    }

    #[test]
    fn test_levels_are_reachable_at_age() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(2);

        for _ in 0..2000 {
            let age = rng.gen_range(18..=90);
            let class = SocialClass::ALL[rng.gen_range(0..4)];
            let edu = build_education(&mut rng, &ctx, age, class);
            assert!(age >= completion_age(edu.completed));
            if edu.completed == EducationLevel::None {
                assert!(age >= NO_EDUCATION_MIN_AGE);
            }
            if let Some(studying) = edu.in_progress {
                assert!(age < 35);
                assert!(studying > edu.completed);
            }
            if edu.completed.is_higher() || edu.is_enrolled() {
                assert!(edu.field.is_some());
            }
        }
    }

    #[test]
    fn test_nobody_enrolls_at_forty() {
        assert_eq!(enrollment_chance(40, SocialClass::High), 0.0);
        assert!(enrollment_chance(19, SocialClass::High) > enrollment_chance(19, SocialClass::Low));
    }
}
