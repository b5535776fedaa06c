//! Parent generation
//!
//! Parent birth years are the anchor's birth year minus an age gap drawn from
//! the configured range; the mother's gap is further limited to the fertility
//! window. Death is decided from the anchor's bucket, and for deceased parents
//! the gap and the years since death are drawn together so that the death age
//! stays within `life_expectancy + longevity_slack`.

use rand::Rng;
use tracing::debug;

use crate::calendar;
use crate::components::{FamilyMember, Gender, PersonName, Relation, Vital};
use crate::error::Recoverable;
use crate::rules::{Bounds, DeathRole};
use crate::systems::death;
use crate::systems::{Anchor, GenContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentDeaths {
    None,
    Father,
    Mother,
    Both,
}

/// Admissible gap between a parent's and the anchor's birth years.
pub fn parent_gap(ctx: &GenContext<'_>, gender: Gender) -> Bounds {
    let rules = ctx.rules;
    match gender {
        Gender::Male => Bounds::new(rules.parent_min_age_gap, rules.parent_max_age_gap),
        Gender::Female => Bounds::new(
            rules.parent_min_age_gap.max(rules.fertility_min),
            rules.parent_max_age_gap.min(rules.fertility_max),
        ),
    }
}

/// Builds `(father, mother)`. Either may be `None` when no admissible
/// combination of age gap and death timing exists.
pub fn build_parents<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
) -> (Option<FamilyMember>, Option<FamilyMember>) {
    let deaths = decide_deaths(rng, ctx, anchor);
    let father_dead = matches!(deaths, ParentDeaths::Father | ParentDeaths::Both);
    let mother_dead = matches!(deaths, ParentDeaths::Mother | ParentDeaths::Both);

    let father = build_parent(rng, ctx, anchor, Gender::Male, father_dead);
    let mother = build_parent(rng, ctx, anchor, Gender::Female, mother_dead);
    (father, mother)
}

/// Splits the anchor-bucket probability into "both", "one" and "none".
fn decide_deaths<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> ParentDeaths {
    let base = ctx.rules.death_prob.probability(DeathRole::Parents, anchor.bucket);
    let p = death::parent_death_probability(anchor.age, base);
    if p >= 100.0 {
        return ParentDeaths::Both;
    }

    let (both, one) = if anchor.age >= 60 { (p * 0.7, p * 0.25) } else { (p * 0.3, p * 0.7) };
    let roll = rng.gen::<f64>() * 100.0;
    if roll < both {
        ParentDeaths::Both
    } else if roll < both + one {
        if rng.gen_bool(0.5) {
            ParentDeaths::Father
        } else {
            ParentDeaths::Mother
        }
    } else {
        ParentDeaths::None
    }
}

fn build_parent<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    gender: Gender,
    deceased: bool,
) -> Option<FamilyMember> {
    let gap = parent_gap(ctx, gender);
    let age = anchor.age;
    let cap = ctx.rules.max_living_age();

    // Living parents must stay under the longevity cap.
    let living_max = cap.saturating_sub(age).min(gap.max);
    let deceased = deceased || living_max < gap.min || cap < age;

    let (gap_years, vital_years_ago) = if deceased {
        let (tier_lo, tier_hi) = death::years_since_parent_death(age);
        let since_max = tier_hi.min(age);
        // death age = age + gap - since <= cap
        let gap_max = gap.max.min((cap + since_max).saturating_sub(age));
        if gap_max < gap.min || tier_lo > since_max {
            debug!(
                "omitting {:?} parent: {}",
                gender,
                Recoverable::unsatisfiable("parent age gap", gap.min, gap_max)
            );
            return None;
        }
        let g = rng.gen_range(gap.min..=gap_max);
        let since_min = tier_lo.max((age + g).saturating_sub(cap));
        if since_min > since_max {
            debug!(
                "omitting {:?} parent: {}",
                gender,
                Recoverable::unsatisfiable("years since death", since_min, since_max)
            );
            return None;
        }
        (g, Some(rng.gen_range(since_min..=since_max)))
    } else {
        (rng.gen_range(gap.min..=living_max), None)
    };

    let birth_year = anchor.birth_year() - gap_years as i32;
    let birth_date = calendar::date_in_year(rng, birth_year, ctx.today);

    let vital = match vital_years_ago {
        Some(years_ago) => {
            let death_year = ctx.current_year() - years_ago as i32;
            // A mother was alive at the birth; a father may have died months before.
            let not_before = match gender {
                Gender::Female => anchor.birth_date,
                Gender::Male => birth_date,
            };
            death::deceased(rng, ctx, birth_date, death_year, not_before)
        }
        None => Vital::Alive {
            age: age + gap_years,
        },
    };

    let namer = ctx.namer();
    let first = namer.first_name(rng, gender, age, 2);
    let surnames = namer.parent_surnames(rng, &anchor.name, gender);

    Some(FamilyMember {
        relation: if gender.is_male() { Relation::Father } else { Relation::Mother },
        gender,
        name: PersonName::new(first, surnames),
        birth_date,
        vital,
        twin: false,
        union: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use crate::systems::fixtures::{anchor, today, Fixture};
    use chrono::Datelike;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mother_gap_inside_fertility_window() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let gap = parent_gap(&ctx, Gender::Female);
        assert!(gap.min >= fixture.rules.fertility_min);
        assert!(gap.max <= fixture.rules.fertility_max);
    }

    #[test]
    fn test_seventy_year_old_has_deceased_parents() {
        let rules = RuleSet {
            min_age: 18,
            life_expectancy: 83,
            max_age: 83,
            fertility_min: 15,
            fertility_max: 45,
            ..RuleSet::default()
        };
        let fixture = Fixture::new(rules, crate::sample_data::sample_data());
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(70);

        for _ in 0..300 {
            let a = anchor(&mut rng, &ctx, Gender::Female, 70);
            let (father, mother) = build_parents(&mut rng, &ctx, &a);
            for parent in [father, mother] {
                let parent = parent.expect("a 70 year old always has a feasible parent");
                let gap = a.birth_year() - parent.birth_year();
                assert!((18..=45).contains(&gap));
                match parent.vital {
                    Vital::Deceased {
                        age_at_death,
                        death_date,
                        ..
                    } => {
                        let years_ago = today().year() - death_date.year();
                        assert!((10..=30).contains(&years_ago), "died {} years ago", years_ago);
                        assert!(age_at_death <= 88);
                        assert_eq!(age_at_death as i32, death_date.year() - parent.birth_year());
                    }
                    Vital::Alive { .. } => panic!("parents of a 70 year old must be deceased"),
                }
            }
        }
    }

    #[test]
    fn test_living_parents_respect_longevity_cap() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(8);
        for age in [18, 30, 45, 60] {
            for _ in 0..100 {
                let a = anchor(&mut rng, &ctx, Gender::Male, age);
                let (father, mother) = build_parents(&mut rng, &ctx, &a);
                for parent in father.iter().chain(mother.iter()) {
                    if let Vital::Alive { age: parent_age } = parent.vital {
                        assert!(parent_age <= fixture.rules.max_living_age());
                        assert_eq!(parent_age as i32, today().year() - parent.birth_year());
                    }
                    if let Some(death_date) = parent.death_date() {
                        assert!(death_date <= today());
                        if parent.relation == Relation::Mother {
                            assert!(death_date >= a.birth_date);
                        }
                    }
                }
            }
        }
    }
}
