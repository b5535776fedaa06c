//! Sibling generation
//!
//! Sibling ages are sampled from the interval in which the mother was fertile
//! (and, if known, the father aged 16-70), clamped to within 15 years of the
//! anchor. Twins reuse an existing sibling age, never more than
//! `max_same_age` people per age.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::calendar;
use crate::components::{FamilyMember, Gender, PersonName, Relation};
use crate::error::Recoverable;
use crate::names::NameAllocator;
use crate::rules::{Bounds, DeathRole};
use crate::systems::death;
use crate::systems::{Anchor, GenContext};

/// Widest age difference between the anchor and a sibling.
const MAX_SIBLING_SPREAD: u32 = 15;

/// Father's age range at a sibling's birth.
const FATHER_AGE_AT_BIRTH: Bounds = Bounds::new(16, 70);

/// Draws for a fresh sibling age before the slot is skipped.
const AGE_ATTEMPTS: usize = 20;

/// How many siblings to generate: Bernoulli presence, then a normal draw
/// around the configured average.
pub fn sibling_count<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>) -> u32 {
    let rules = ctx.rules;
    if rules.max_siblings == 0 || !death::roll_percent(rng, rules.sibling_probability) {
        return 0;
    }
    let avg = rules.average_siblings;
    let drawn = Normal::new(avg, avg / 2.5)
        .map(|n| n.sample(rng))
        .unwrap_or(avg);
    let lower = rules.min_siblings.max(1);
    (drawn.max(0.0) as u32).clamp(lower, rules.max_siblings.max(lower))
}

/// Range of current ages a sibling may have, or `None` when it is empty.
pub fn sibling_age_range(
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    mother: &FamilyMember,
    father: Option<&FamilyMember>,
) -> Option<Bounds> {
    let now = ctx.current_year();
    let rules = ctx.rules;
    let mother_age = now - mother.birth_year();

    let mut low = (mother_age - rules.fertility_max as i32).max(1);
    let mut high = mother_age - rules.fertility_min as i32;

    // Nobody is born after their mother's death.
    if let Some(death) = mother.death_date() {
        low = low.max(now - death.year());
    }
    if let Some(father) = father {
        let father_age = now - father.birth_year();
        low = low.max(father_age - FATHER_AGE_AT_BIRTH.max as i32);
        high = high.min(father_age - FATHER_AGE_AT_BIRTH.min as i32);
        if let Some(death) = father.death_date() {
            // Born at most a year after the father died.
            low = low.max(now - death.year() - 1);
        }
    }

    let anchor_age = anchor.age as i32;
    low = low.max(anchor_age - MAX_SIBLING_SPREAD as i32);
    high = high
        .min(anchor_age + MAX_SIBLING_SPREAD as i32)
        .min(rules.max_living_age() as i32);

    if low > high || high < 0 {
        debug!("{}", Recoverable::unsatisfiable("sibling age", low, high));
        return None;
    }
    Some(Bounds::new(low.max(0) as u32, high as u32))
}

pub fn build_siblings<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    father: Option<&FamilyMember>,
    mother: Option<&FamilyMember>,
) -> Vec<FamilyMember> {
    let Some(mother) = mother else {
        return Vec::new();
    };
    let count = sibling_count(rng, ctx);
    if count == 0 {
        return Vec::new();
    }
    let Some(range) = sibling_age_range(ctx, anchor, mother, father) else {
        return Vec::new();
    };

    let mut names = NameAllocator::new();
    names.reserve(&anchor.name.first);
    let mut per_age: HashMap<u32, u32> = HashMap::new();
    let mut siblings: Vec<FamilyMember> = Vec::new();
    let death_percent = ctx.rules.death_prob.probability(DeathRole::Siblings, anchor.bucket);

    for _ in 0..count {
        let twin_of = if !siblings.is_empty() && death::roll_percent(rng, ctx.rules.twin_probability) {
            pick_twin(rng, ctx, &siblings, &per_age)
        } else {
            None
        };

        let (age, birth_date) = match twin_of {
            Some(idx) => {
                siblings[idx].twin = true;
                (current_age(ctx, &siblings[idx]), siblings[idx].birth_date)
            }
            None => {
                let Some(age) = fresh_age(rng, range, anchor.age, &per_age) else {
                    debug!("{}", Recoverable::unsatisfiable("distinct sibling age", range.min, range.max));
                    continue;
                };
                (age, sibling_birth_date(rng, ctx, age, mother, anchor))
            }
        };

        let gender = if rng.gen_bool(0.5) { Gender::Male } else { Gender::Female };
        let namer = ctx.namer();
        let first = names.allocate(|| namer.first_name(rng, gender, age, 0));

        *per_age.entry(age).or_insert(0) += 1;
        siblings.push(FamilyMember {
            relation: Relation::Sibling,
            gender,
            name: PersonName::new(first, namer.sibling_surnames(&anchor.name, gender)),
            birth_date,
            vital: death::relative_vital(rng, ctx, birth_date, age, death_percent),
            twin: twin_of.is_some(),
            union: None,
        });
    }

    siblings.sort_by_key(|s| s.birth_date);
    siblings
}

fn current_age(ctx: &GenContext<'_>, member: &FamilyMember) -> u32 {
    (ctx.current_year() - member.birth_year()).max(0) as u32
}

/// Index of a sibling whose age still has room for another twin.
fn pick_twin<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    siblings: &[FamilyMember],
    per_age: &HashMap<u32, u32>,
) -> Option<usize> {
    let open: Vec<usize> = siblings
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            let age = current_age(ctx, s);
            per_age.get(&age).copied().unwrap_or(0) < ctx.rules.max_same_age
        })
        .map(|(i, _)| i)
        .collect();
    if open.is_empty() {
        return None;
    }
    Some(open[rng.gen_range(0..open.len())])
}

fn fresh_age<R: Rng + ?Sized>(
    rng: &mut R,
    range: Bounds,
    anchor_age: u32,
    per_age: &HashMap<u32, u32>,
) -> Option<u32> {
    (0..AGE_ATTEMPTS)
        .map(|_| rng.gen_range(range.min..=range.max))
        .find(|age| *age != anchor_age && !per_age.contains_key(age))
}

/// Birth date inside the sibling's birth year, after the mother's own birth
/// and no later than her death.
fn sibling_birth_date<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    age: u32,
    mother: &FamilyMember,
    anchor: &Anchor,
) -> NaiveDate {
    let year = ctx.current_year() - age as i32;
    let date = calendar::date_in_year(rng, year, ctx.today);
    match mother.death_date() {
        Some(death) if date > death && death.year() == year => {
            let start = calendar::year_start(year).unwrap_or(anchor.birth_date);
            calendar::date_between(rng, start, death)
        }
        _ => date,
    }
}
