//! Death System
//!
//! Decides which relatives have died and back-computes when. Probabilities
//! come from the rule set's death table, keyed by the anchor's bucket.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::calendar;
use crate::components::Vital;
use crate::provider::{Category, LookupKey};
use crate::systems::GenContext;

/// Minimum parent death probability (percent) by anchor age.
const PARENT_DEATH_FLOORS: &[(u32, f64)] = &[
    (50, 60.0),
    (60, 85.0),
    (70, 100.0), // old enough that both parents are gone
];

/// Years since a parent's death, by anchor age.
const YEARS_SINCE_PARENT_DEATH: &[(u32, (u32, u32))] = &[
    (35, (0, 15)),
    (50, (5, 20)),
    (70, (10, 30)),
];

/// Childbirth complications when a mother died the year a child was born.
pub const CHILDBIRTH_DEATH_CHANCE: f64 = 0.05;
pub const CHILDBIRTH_CAUSE: &str = "Complications during childbirth";

const FALLBACK_CAUSE: &str = "Natural causes";

/// Parent death probability after applying the age floors.
pub fn parent_death_probability(anchor_age: u32, base: f64) -> f64 {
    let floor = PARENT_DEATH_FLOORS
        .iter()
        .rev()
        .find(|(age, _)| anchor_age >= *age)
        .map(|(_, p)| *p)
        .unwrap_or(0.0);
    base.max(floor)
}

/// Inclusive range of years since a parent died.
pub fn years_since_parent_death(anchor_age: u32) -> (u32, u32) {
    YEARS_SINCE_PARENT_DEATH
        .iter()
        .rev()
        .find(|(age, _)| anchor_age >= *age)
        .map(|(_, range)| *range)
        .unwrap_or_else(|| (0, anchor_age.saturating_sub(5).min(20)))
}

/// Bernoulli trial on a percentage.
pub fn roll_percent<R: Rng + ?Sized>(rng: &mut R, percent: f64) -> bool {
    rng.gen::<f64>() * 100.0 < percent
}

/// A cause of death suitable for someone who died at `age_at_death`.
pub fn death_cause<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, age_at_death: u32) -> String {
    let causes = ctx
        .data
        .lookup(Category::DeathCauses, &LookupKey::any().bucket(ctx.bucket(age_at_death)));
    causes
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| FALLBACK_CAUSE.to_string())
}

/// Deceased state for someone born on `birth_date` who died in `death_year`.
/// The death date is never before the birth date nor after today.
pub fn deceased<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    birth_date: NaiveDate,
    death_year: i32,
    not_before: NaiveDate,
) -> Vital {
    let mut death_date = calendar::date_in_year(rng, death_year, ctx.today);
    let floor = birth_date.max(not_before);
    if death_date < floor {
        let year_end = NaiveDate::from_ymd_opt(death_year, 12, 31).unwrap_or(ctx.today);
        death_date = calendar::date_between(rng, floor, year_end.min(ctx.today));
    }
    let age_at_death = calendar::age_in(chrono::Datelike::year(&birth_date), death_year).max(0) as u32;
    Vital::Deceased {
        age_at_death,
        death_date,
        cause: death_cause(rng, ctx, age_at_death),
    }
}

/// Vital state of a sibling or child currently `age` years old.
///
/// Deceased relatives died at an age in `[max(1, age - 30), age]`.
pub fn relative_vital<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    birth_date: NaiveDate,
    age: u32,
    death_percent: f64,
) -> Vital {
    let low = age.saturating_sub(30).max(1);
    if age < low || !roll_percent(rng, death_percent) {
        return Vital::Alive { age };
    }
    let age_at_death = rng.gen_range(low..=age);
    let death_year = chrono::Datelike::year(&birth_date) + age_at_death as i32;
    deceased(rng, ctx, birth_date, death_year, birth_date)
}
