//! Children generation
//!
//! Children are only born into marriages. Each child's birth year must
//! satisfy three windows at once: the anchor's parent age gap, the mother's
//! fertility window, and the span of the union (one year of slack either
//! side). A child with no admissible year is skipped.

use std::collections::HashMap;

use chrono::Datelike;
use rand::Rng;
use tracing::debug;

use crate::calendar;
use crate::components::{FamilyMember, Gender, PersonName, Relation, Union, UnionKind};
use crate::error::Recoverable;
use crate::names::NameAllocator;
use crate::rules::DeathRole;
use crate::systems::death;
use crate::systems::{Anchor, GenContext};

/// Children are capped at two for anchors under this age.
const YOUNG_PARENT_AGE: u32 = 30;

/// At most this many children share a birth date.
const MAX_CHILD_TWINS: u32 = 2;

/// `(upper age, probability of having children)`.
const CHILDREN_BY_AGE: &[(u32, f64)] = &[
    (25, 0.05),
    (35, 0.30),
    (50, 0.65),
    (65, 0.75),
    (u32::MAX, 0.85),
];

const YEAR_ATTEMPTS: usize = 20;

/// Inclusive birth-year window for a child of `union`.
pub fn child_year_window(ctx: &GenContext<'_>, anchor: &Anchor, union: &Union) -> Option<(i32, i32)> {
    let rules = ctx.rules;
    let anchor_year = anchor.birth_year();
    let mut low = anchor_year + rules.parent_min_age_gap as i32;
    let mut high = anchor_year + rules.parent_max_age_gap as i32;

    let mother = match anchor.gender {
        Gender::Female => None,
        Gender::Male => Some(&union.partner),
    };
    let mother_year = mother.map(|m| m.birth_year()).unwrap_or(anchor_year);
    low = low.max(mother_year + rules.fertility_min as i32);
    high = high.min(mother_year + rules.fertility_max as i32);

    low = low.max(union.start_date.year() - 1);
    let union_end = union.end.as_ref().map(|e| e.date().year()).unwrap_or(ctx.current_year());
    high = high.min(union_end + 1).min(ctx.current_year());

    // A mother who died cannot have children afterwards.
    if let Some(death) = mother.and_then(|m| m.death_date()) {
        high = high.min(death.year());
    }

    if low > high {
        return None;
    }
    Some((low, high))
}

pub fn build_children<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    unions: &[Union],
) -> Vec<FamilyMember> {
    let marriages: Vec<(usize, &Union)> = unions
        .iter()
        .enumerate()
        .filter(|(_, u)| u.kind == UnionKind::Marriage)
        .collect();
    if marriages.is_empty() {
        return Vec::new();
    }

    let p = CHILDREN_BY_AGE
        .iter()
        .find(|(upper, _)| anchor.age < *upper)
        .map(|(_, p)| *p)
        .unwrap_or(0.85);
    if !rng.gen_bool(p) {
        return Vec::new();
    }

    let rules = ctx.rules;
    let mut max = rules.max_children;
    if anchor.age < YOUNG_PARENT_AGE {
        max = max.min(2);
    }
    let min = rules.min_children.min(max);
    let count = rng.gen_range(min..=max);

    let mut names = NameAllocator::new();
    names.reserve(&anchor.name.first);
    let death_percent = rules.death_prob.probability(DeathRole::Children, anchor.bucket);
    let mut children: Vec<FamilyMember> = Vec::new();
    let mut per_year: HashMap<i32, u32> = HashMap::new();

    for _ in 0..count {
        let (idx, union) = marriages[rng.gen_range(0..marriages.len())];
        let Some((low, high)) = child_year_window(ctx, anchor, union) else {
            debug!("{}", Recoverable::unsatisfiable("child birth year", 0, 0));
            continue;
        };
        let union_no = (idx + 1) as u8;

        // Twins share a birth date with an earlier child of the same union.
        let twin_of = if death::roll_percent(rng, rules.twin_probability) {
            children.iter().position(|c| {
                c.union == Some(union_no)
                    && per_year.get(&c.birth_year()).copied().unwrap_or(0) < MAX_CHILD_TWINS
                    && (low..=high).contains(&c.birth_year())
            })
        } else {
            None
        };

        let birth_date = match twin_of {
            Some(i) => {
                children[i].twin = true;
                children[i].birth_date
            }
            None => {
                let Some(year) = (0..YEAR_ATTEMPTS)
                    .map(|_| rng.gen_range(low..=high))
                    .find(|y| !per_year.contains_key(y))
                else {
                    debug!("{}", Recoverable::unsatisfiable("distinct child birth year", low, high));
                    continue;
                };
                child_birth_date(rng, ctx, anchor, union, year)
            }
        };

        let gender = if rng.gen_bool(0.5) { Gender::Male } else { Gender::Female };
        let namer = ctx.namer();
        let first = names.allocate(|| namer.first_name(rng, gender, anchor.age, -2));
        let surnames = namer.child_surnames(&anchor.name, anchor.gender, &union.partner.name, gender);
        let age = (ctx.current_year() - birth_date.year()).max(0) as u32;

        *per_year.entry(birth_date.year()).or_insert(0) += 1;
        children.push(FamilyMember {
            relation: Relation::Child,
            gender,
            name: PersonName::new(first, surnames),
            birth_date,
            vital: death::relative_vital(rng, ctx, birth_date, age, death_percent),
            twin: twin_of.is_some(),
            union: Some(union_no),
        });
    }

    children.sort_by_key(|c| c.birth_date);
    children
}

/// A date in `year`, after the anchor's and partner's births and before the
/// mother's death.
fn child_birth_date<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    union: &Union,
    year: i32,
) -> chrono::NaiveDate {
    let date = calendar::date_in_year(rng, year, ctx.today);
    let mother_death = match anchor.gender {
        Gender::Male => union.partner.death_date(),
        Gender::Female => None,
    };
    match mother_death {
        Some(death) if death.year() == year && date > death => {
            let start = calendar::year_start(year).unwrap_or(death);
            calendar::date_between(rng, start, death)
        }
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::systems::fixtures::{anchor, today, Fixture};
    use crate::systems::unions::build_unions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_children_respect_all_windows() {
        let rules = RuleSet {
            min_children: 2,
            max_children: 5,
            ..crate::sample_data::sample_rules()
        };
        let fixture = Fixture::new(rules, crate::sample_data::sample_data());
        let ctx = fixture.ctx();
        let r = &fixture.rules;
        let mut rng = StdRng::seed_from_u64(31);
        let mut total = 0;

        for _ in 0..400 {
            let age = rng.gen_range(25..=80);
            let gender = if rng.gen_bool(0.5) { Gender::Male } else { Gender::Female };
            let a = anchor(&mut rng, &ctx, gender, age);
            let (_, unions) = build_unions(&mut rng, &ctx, &a);
            let children = build_children(&mut rng, &ctx, &a, &unions);
            total += children.len();

            for c in &children {
                let union = &unions[c.union.expect("children carry their union") as usize - 1];
                let gap = (c.birth_year() - a.birth_year()) as u32;
                assert!((r.parent_min_age_gap..=r.parent_max_age_gap).contains(&gap));

                let mother_year = if gender == Gender::Female { a.birth_year() } else { union.partner.birth_year() };
                let mother_age = (c.birth_year() - mother_year) as u32;
                assert!((r.fertility_min..=r.fertility_max).contains(&mother_age));

                assert!(c.birth_year() >= union.start_date.year() - 1);
                if let Some(end) = &union.end {
                    assert!(c.birth_year() <= end.date().year() + 1);
                }
                assert!(c.birth_date <= today());
                if gender == Gender::Male {
                    if let Some(death) = union.partner.death_date() {
                        assert!(c.birth_date <= death);
                    }
                }
            }
        }
        assert!(total > 0);
    }

    #[test]
    fn test_no_children_without_marriage() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(3);
        let a = anchor(&mut rng, &ctx, Gender::Male, 50);
        assert!(build_children(&mut rng, &ctx, &a, &[]).is_empty());
    }
}
