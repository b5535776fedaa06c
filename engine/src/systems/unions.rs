//! Partner and marriage history
//!
//! Pairs the anchor with a current partner and/or past spouses. Unions are
//! laid out on the anchor's own timeline: the first marriage starts no earlier
//! than the class marriage floor, later unions follow the previous one with a
//! gap, and none of them overlap. Unmarried anchors may also carry a history
//! of past dating relationships that ended before the current one began.

use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::calendar;
use crate::components::{
    FamilyMember, MaritalStatus, PastRelationship, PersonName, Relation, Union, UnionEnd, UnionKind,
    Vital,
};
use crate::error::Recoverable;
use crate::provider::{Category, LookupKey};
use crate::systems::death;
use crate::systems::{Anchor, GenContext};

/// Latest age at which a first marriage is placed.
const LATEST_FIRST_MARRIAGE: u32 = 40;

/// Partner age spread around the anchor's age.
const PARTNER_AGE_SPREAD: i32 = 5;

/// Youngest a partner may be at the start of a union.
const MIN_PARTNER_AGE: u32 = 18;

const REMARRIAGE_CHANCE: f64 = 0.40;
const EX_PARTNER_DECEASED_CHANCE: f64 = 0.10;

/// `(upper age, partner, dating, divorced, multiple divorces)` probabilities.
const STATUS_BY_AGE: &[(u32, f64, f64, f64, f64)] = &[
    (25, 0.20, 0.45, 0.01, 0.00),
    (30, 0.50, 0.45, 0.05, 0.01),
    (35, 0.50, 0.25, 0.05, 0.01),
    (40, 0.70, 0.25, 0.15, 0.05),
    (50, 0.70, 0.10, 0.15, 0.05),
    (65, 0.65, 0.03, 0.20, 0.10),
    (u32::MAX, 0.55, 0.00, 0.15, 0.15),
];

const FALLBACK_DIVORCE_CAUSE: &str = "Irreconcilable differences";

const PAST_RELATIONSHIP_CHANCE: f64 = 0.60;
const FALLBACK_BREAKUP_REASONS: &[&str] = &["Grew apart", "Wanted different things", "Long distance"];

/// Range for the anchor's age at a first marriage, or `None` if the anchor
/// is still below the class marriage floor.
pub fn first_marriage_ages(ctx: &GenContext<'_>, anchor: &Anchor) -> Option<(u32, u32)> {
    let floor = ctx.rules.marriage_age.get(anchor.class);
    let hi = LATEST_FIRST_MARRIAGE.min(anchor.age.checked_sub(2)?);
    if hi < floor.min {
        return None;
    }
    let lo = floor.min.max(floor.max.min(hi));
    Some((lo, hi))
}

pub fn build_unions<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
) -> (MaritalStatus, Vec<Union>) {
    let (_, partner_p, dating_p, divorced_p, multiple_p) = STATUS_BY_AGE
        .iter()
        .copied()
        .find(|(upper, ..)| anchor.age < *upper)
        .unwrap_or((u32::MAX, 0.55, 0.0, 0.15, 0.15));

    let Some((first_lo, first_hi)) = first_marriage_ages(ctx, anchor) else {
        // Too young to marry; dating is still possible for adults.
        if anchor.age >= MIN_PARTNER_AGE && rng.gen_bool(dating_p) {
            return (MaritalStatus::Dating, vec![dating_union(rng, ctx, anchor)]);
        }
        return (MaritalStatus::Single, Vec::new());
    };

    let roll = rng.gen::<f64>();
    if roll < divorced_p {
        let divorces = if rng.gen_bool(multiple_p) {
            if anchor.age >= 50 { rng.gen_range(2..=3) } else { 2 }
        } else {
            1
        };
        let remarried = rng.gen_bool(REMARRIAGE_CHANCE);
        let unions = marriages(rng, ctx, anchor, (first_lo, first_hi), divorces, remarried);
        let status = match unions.last() {
            Some(u) if u.end.is_none() => MaritalStatus::Married,
            Some(Union {
                end: Some(UnionEnd::Widowed { .. }),
                ..
            }) => MaritalStatus::Widowed,
            Some(_) => MaritalStatus::Divorced,
            None => MaritalStatus::Single,
        };
        (status, unions)
    } else if roll < divorced_p + dating_p {
        (MaritalStatus::Dating, vec![dating_union(rng, ctx, anchor)])
    } else if roll < divorced_p + dating_p + partner_p {
        let unions = marriages(rng, ctx, anchor, (first_lo, first_hi), 0, true);
        let status = if unions.is_empty() { MaritalStatus::Single } else { MaritalStatus::Married };
        (status, unions)
    } else {
        (MaritalStatus::Single, Vec::new())
    }
}

/// Lays out `ended` past marriages, optionally followed by a current one.
fn marriages<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    first: (u32, u32),
    ended: u32,
    ongoing: bool,
) -> Vec<Union> {
    let total = ended + u32::from(ongoing);
    let mut unions = Vec::new();
    let mut start_age = rng.gen_range(first.0..=first.1);

    for i in 0..total {
        let is_current = ongoing && i == total - 1;
        let start_date = union_date(rng, ctx, anchor, start_age);
        let partner_age = partner_age(rng, ctx, anchor, start_age);

        if is_current {
            let partner = partner(rng, ctx, anchor, Relation::Partner, partner_age, None);
            unions.push(Union {
                partner,
                kind: UnionKind::Marriage,
                start_date,
                end: None,
            });
            break;
        }

        // Each later union needs at least two more years on the timeline.
        let remaining = total - i - 1;
        let room = anchor.age.saturating_sub(start_age + remaining * 2);
        if room < 1 {
            break;
        }
        let end_age = start_age + rng.gen_range(1..=room.min(15));
        let end_date = union_date(rng, ctx, anchor, end_age).max(start_date);

        let end = if rng.gen_bool(EX_PARTNER_DECEASED_CHANCE) {
            UnionEnd::Widowed { date: end_date }
        } else {
            UnionEnd::Divorced {
                date: end_date,
                reason: divorce_cause(rng, ctx, end_age),
            }
        };
        let died = match &end {
            UnionEnd::Widowed { date } => Some(*date),
            UnionEnd::Divorced { .. } => None,
        };
        let partner = partner(rng, ctx, anchor, Relation::ExPartner, partner_age, died);
        unions.push(Union {
            partner,
            kind: UnionKind::Marriage,
            start_date,
            end: Some(end),
        });

        start_age = (end_age + rng.gen_range(1..=3)).min(anchor.age);
        if start_age > anchor.age || (remaining > 0 && start_age + (remaining - 1) * 2 > anchor.age) {
            break;
        }
    }
    unions
}

/// Earlier dating relationships for an unmarried anchor, laid out backwards
/// from `before` (the start of the current relationship, or today). Oldest
/// first; none starts before the anchor turned `MIN_PARTNER_AGE`.
pub fn past_relationships<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    before: NaiveDate,
) -> Vec<PastRelationship> {
    if anchor.age < 20 || !rng.gen_bool(PAST_RELATIONSHIP_CHANCE) {
        return Vec::new();
    }
    let wanted = rng.gen_range(1..=((anchor.age - 18) / 5).clamp(1, 3)) as usize;
    let earliest = calendar::add_years(anchor.birth_date, MIN_PARTNER_AGE);

    let mut relationships = Vec::new();
    let mut upper = before;
    while relationships.len() < wanted {
        let end_date = calendar::sub_months(upper, rng.gen_range(1..=24));
        let start_date = calendar::sub_months(end_date, rng.gen_range(4..=60));
        if start_date < earliest {
            break;
        }
        let start_age = (start_date.year() - anchor.birth_year()) as u32;
        let end_age = (end_date.year() - anchor.birth_year()) as u32;
        let age = partner_age(rng, ctx, anchor, start_age);
        relationships.push(PastRelationship {
            partner: partner(rng, ctx, anchor, Relation::ExPartner, age, None),
            start_date,
            end_date,
            breakup_reason: breakup_reason(rng, ctx, anchor, end_age),
        });
        upper = start_date;
    }
    relationships.reverse();
    relationships
}

fn dating_union<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> Union {
    let since_age = anchor.age.saturating_sub(rng.gen_range(0..=3)).max(MIN_PARTNER_AGE.min(anchor.age));
    let start_date = union_date(rng, ctx, anchor, since_age);
    let age = partner_age(rng, ctx, anchor, since_age);
    Union {
        partner: partner(rng, ctx, anchor, Relation::Partner, age, None),
        kind: UnionKind::Dating,
        start_date,
        end: None,
    }
}

/// A date in the year the anchor turns `age`, never before the anchor's birth.
fn union_date<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor, age: u32) -> chrono::NaiveDate {
    calendar::date_in_year(rng, anchor.birth_year() + age as i32, ctx.today).max(anchor.birth_date)
}

/// Current age of a partner: near the anchor's, adult at the union start, and
/// below the longevity cap.
fn partner_age<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor, start_age: u32) -> u32 {
    let years_since_start = anchor.age - start_age.min(anchor.age);
    let youngest = MIN_PARTNER_AGE + years_since_start;
    let drawn = anchor.age as i32 + rng.gen_range(-PARTNER_AGE_SPREAD..=PARTNER_AGE_SPREAD);
    (drawn.max(youngest as i32) as u32).min(ctx.rules.max_living_age().max(youngest))
}

fn partner<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    relation: Relation,
    age: u32,
    died: Option<chrono::NaiveDate>,
) -> FamilyMember {
    let gender = anchor.gender.opposite();
    let namer = ctx.namer();
    let birth_year = ctx.current_year() - age as i32;
    let birth_date = calendar::date_in_year(rng, birth_year, ctx.today);
    let vital = match died {
        Some(date) => {
            let age_at_death = (date.year() - birth_year).max(0) as u32;
            Vital::Deceased {
                age_at_death,
                death_date: date.max(birth_date),
                cause: death::death_cause(rng, ctx, age_at_death),
            }
        }
        None => Vital::Alive { age },
    };
    FamilyMember {
        relation,
        gender,
        name: PersonName::new(namer.first_name(rng, gender, age, 0), namer.random_surnames(rng, gender)),
        birth_date,
        vital,
        twin: false,
        union: None,
    }
}

fn divorce_cause<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, age: u32) -> String {
    ctx.data
        .lookup(Category::DivorceCauses, &LookupKey::any().bucket(ctx.bucket(age)))
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| FALLBACK_DIVORCE_CAUSE.to_string())
}

fn breakup_reason<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor, age: u32) -> String {
    let provided = ctx
        .data
        .lookup(Category::BreakupReasons, &LookupKey::any().bucket(ctx.bucket(age)))
        .choose(rng)
        .cloned();
    let reason = match provided {
        Some(reason) => reason,
        None => {
            debug!("{}", Recoverable::DataUnavailable(Category::BreakupReasons));
            FALLBACK_BREAKUP_REASONS.choose(rng).copied().unwrap_or("Grew apart").to_string()
        }
    };
    if !reason.to_lowercase().contains("cheated") {
        return reason;
    }

    // Either side may have been the one who cheated.
    let (cheater, cheated) = if rng.gen_bool(0.5) {
        (anchor.gender, anchor.gender.opposite())
    } else {
        (anchor.gender.opposite(), anchor.gender)
    };
    format!("{} cheated on {}", cheater.pronouns().0, cheated.pronouns().1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Gender, SocialClass};
    use crate::provider::InMemoryData;
    use crate::systems::fixtures::{anchor, today, Fixture};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_marriage_floor_by_class() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(1);

        let mut a = anchor(&mut rng, &ctx, crate::components::Gender::Male, 21);
        a.class = SocialClass::High;
        assert_eq!(first_marriage_ages(&ctx, &a), Some((19, 19)));
        a.class = SocialClass::Low;
        assert_eq!(first_marriage_ages(&ctx, &a), None);

        a.age = 45;
        assert_eq!(first_marriage_ages(&ctx, &a), Some((24, 40)));
    }

    #[test]
    fn test_unions_do_not_overlap() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(12);

        for _ in 0..400 {
            let age = rng.gen_range(18..=85);
            let a = anchor(&mut rng, &ctx, crate::components::Gender::Female, age);
            let (status, unions) = build_unions(&mut rng, &ctx, &a);
            if unions.is_empty() {
                assert_eq!(status, MaritalStatus::Single);
            }
            for pair in unions.windows(2) {
                let prev_end = pair[0].end.as_ref().map(|e| e.date()).expect("only the last union is open");
                assert!(prev_end <= pair[1].start_date);
            }
            for u in &unions {
                assert!(u.start_date >= a.birth_date && u.start_date <= today());
                if let Some(end) = &u.end {
                    assert!(end.date() >= u.start_date && end.date() <= today());
                }
                assert!(u.partner.birth_date <= u.start_date);
                if let Vital::Alive { age } = u.partner.vital {
                    assert!(age <= fixture.rules.max_living_age());
                }
            }
        }
    }

    #[test]
    fn test_past_relationships_end_before_current() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(31);

        let mut seen = 0;
        for _ in 0..400 {
            let age = rng.gen_range(20..=60);
            let a = anchor(&mut rng, &ctx, Gender::Male, age);
            let before = calendar::sub_years(today(), rng.gen_range(0..=2));
            let history = past_relationships(&mut rng, &ctx, &a, before);
            seen += history.len();

            assert!(history.len() <= 3);
            for rel in &history {
                assert!(rel.start_date >= calendar::add_years(a.birth_date, MIN_PARTNER_AGE));
                assert!(rel.start_date < rel.end_date && rel.end_date < before);
                assert!(rel.partner.birth_date <= rel.start_date);
                assert_eq!(rel.partner.relation, Relation::ExPartner);
                assert_eq!(rel.partner.gender, Gender::Female);
                assert!(!rel.breakup_reason.is_empty());
                if rel.breakup_reason.contains("cheated") {
                    assert!(["He cheated on her", "She cheated on him"].contains(&rel.breakup_reason.as_str()));
                }
            }
            for pair in history.windows(2) {
                assert!(pair[0].end_date <= pair[1].start_date);
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_breakup_reason_falls_back_and_assigns_cheating() {
        let mut rng = StdRng::seed_from_u64(4);
        let sample = Fixture::sample();
        let a = anchor(&mut rng, &sample.ctx(), Gender::Female, 30);

        let mut data = InMemoryData::new();
        data.add_list(Category::BreakupReasons, LookupKey::any(), &["Cheated"]);
        let fixture = Fixture::new(crate::sample_data::sample_rules(), data);
        let ctx = fixture.ctx();

        for _ in 0..50 {
            let reason = breakup_reason(&mut rng, &ctx, &a, 28);
            assert!(reason == "She cheated on him" || reason == "He cheated on her", "{}", reason);
        }

        let empty = Fixture::new(crate::sample_data::sample_rules(), InMemoryData::new());
        let ctx = empty.ctx();
        let reason = breakup_reason(&mut rng, &ctx, &a, 28);
        assert!(FALLBACK_BREAKUP_REASONS.contains(&reason.as_str()));
    }
}
