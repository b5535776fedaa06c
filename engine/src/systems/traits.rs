//! Trait System
//!
//! Weighted draws for appearance, religion, hobbies, regional characteristics,
//! the place of residence and the phone number. Height and weight ranges come from the provider's
//! tables; the built-in tables below cover countries that ship none.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::buckets::AgeBucket;
use crate::components::{Gender, PhysicalTraits, RegionalCharacteristic, Residence, SocialClass};
use crate::error::Recoverable;
use crate::provider::{Category, LookupKey, TableValue};
use crate::rules::{pick_weighted, WeightedTable};
use crate::systems::death::roll_percent;
use crate::systems::GenContext;

// ============================================================================
// Built-in tables
// ============================================================================

/// `gender:Category` -> height range in cm.
static DEFAULT_HEIGHTS: Lazy<BTreeMap<&'static str, (u32, u32)>> = Lazy::new(|| {
    BTreeMap::from([
        ("male:Short", (155, 168)),
        ("male:Average", (169, 182)),
        ("male:Tall", (183, 198)),
        ("female:Short", (145, 157)),
        ("female:Average", (158, 170)),
        ("female:Tall", (171, 185)),
    ])
});

/// Weight category -> BMI range, used when the provider has no weight table.
static DEFAULT_BMI: Lazy<BTreeMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    BTreeMap::from([
        ("Underweight", (16.0, 18.5)),
        ("Normal", (18.5, 25.0)),
        ("Overweight", (25.0, 30.0)),
        ("Obese", (30.0, 38.0)),
    ])
});

const WEIGHT_CATEGORIES: &[(&str, f64)] = &[
    ("Normal", 70.0),
    ("Underweight", 20.0),
    ("Overweight", 8.0),
    ("Obese", 2.0),
];

const FALLBACK_HOBBIES: &[&str] = &[
    "Reading", "Cooking", "Walking", "Gardening", "Music", "Photography", "Cycling",
    "Swimming", "Chess", "Painting", "Hiking", "Board games",
];

// ============================================================================
// Appearance
// ============================================================================

pub fn physical_traits<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, age: u32, gender: Gender) -> PhysicalTraits {
    let rules = ctx.rules;
    let height_category = height_category(rng, age, gender);
    let (min_h, max_h) = height_range(ctx, gender, height_category);
    let mut height_cm = rng.gen_range(min_h..=max_h.max(min_h));

    // People lose height after 60.
    if age >= 60 {
        let per_decade = if gender.is_male() { 1.5 } else { 2.0 };
        let loss = ((age - 60) as f64 / 10.0 * per_decade) as u32;
        height_cm = height_cm.saturating_sub(loss).max(min_h.saturating_sub(5));
    }

    let weight_category = pick_category(rng, WEIGHT_CATEGORIES);
    let (min_w, max_w) = weight_range(ctx, gender, height_category, weight_category, height_cm);
    let weight_kg = rng.gen_range(min_w..=max_w.max(min_w));

    PhysicalTraits {
        height_category: height_category.to_string(),
        height_cm,
        weight_category: weight_category.to_string(),
        weight_kg,
        hair: hair_color(rng, &rules.hair_colors, age),
        eyes: rules.eye_colors.sample(rng).unwrap_or("Brown").to_string(),
        skin: rules.skin_tones.sample(rng).unwrap_or("Medium").to_string(),
    }
}

fn height_category<R: Rng + ?Sized>(rng: &mut R, age: u32, gender: Gender) -> &'static str {
    let weights: &[(&str, f64)] = match (age, gender) {
        (80.., Gender::Female) => &[("Short", 80.0), ("Average", 19.0), ("Tall", 1.0)],
        (80.., Gender::Male) => &[("Short", 65.0), ("Average", 33.0), ("Tall", 2.0)],
        (60.., Gender::Female) => &[("Short", 60.0), ("Average", 38.0), ("Tall", 2.0)],
        (60.., Gender::Male) => &[("Short", 50.0), ("Average", 48.0), ("Tall", 2.0)],
        _ => &[("Short", 15.0), ("Average", 70.0), ("Tall", 15.0)],
    };
    pick_category(rng, weights)
}

fn pick_category<R: Rng + ?Sized>(rng: &mut R, weights: &[(&'static str, f64)]) -> &'static str {
    weights
        .choose_weighted(rng, |(_, w)| *w)
        .map(|(label, _)| *label)
        .unwrap_or(weights[0].0)
}

fn height_range(ctx: &GenContext<'_>, gender: Gender, category: &str) -> (u32, u32) {
    let key = format!("{}:{}", gender.label(), category);
    ctx.data
        .lookup_table(Category::Heights)
        .get(&key)
        .and_then(TableValue::as_range)
        .or_else(|| DEFAULT_HEIGHTS.get(key.as_str()).copied())
        .unwrap_or((160, 180))
}

fn weight_range(ctx: &GenContext<'_>, gender: Gender, height: &str, weight: &str, height_cm: u32) -> (u32, u32) {
    let key = format!("{}:{}_{}", gender.label(), height, weight);
    if let Some(range) = ctx.data.lookup_table(Category::Weights).get(&key).and_then(TableValue::as_range) {
        return range;
    }
    let (lo, hi) = DEFAULT_BMI.get(weight).copied().unwrap_or((18.5, 25.0));
    let m2 = (height_cm as f64 / 100.0).powi(2);
    ((lo * m2).round() as u32, (hi * m2).round() as u32)
}

/// Hair colour with graying: at 60+ gray or white dominates 70% of the time,
/// at 45+ gray is boosted 30% of the time.
pub fn hair_color<R: Rng + ?Sized>(rng: &mut R, table: &WeightedTable, age: u32) -> String {
    let is_gray = |label: &str| label.contains("Gray") || label.contains("Grey") || label.contains("White");
    let adjusted = if age >= 60 && rng.gen_bool(0.7) {
        table
            .with_entry("Gray", table.total() * 0.5)
            .with_entry("White", table.total() * 0.2)
            .scaled(|l| if is_gray(l) { 100.0 } else { 0.1 })
    } else if age >= 45 && rng.gen_bool(0.3) {
        table
            .with_entry("Gray", table.total() * 0.2)
            .scaled(|l| if is_gray(l) { 50.0 } else { 0.5 })
    } else {
        table.clone()
    };
    adjusted.sample(rng).unwrap_or("Brown").to_string()
}

// ============================================================================
// Culture
// ============================================================================

/// Older people mostly hold the country's dominant religion.
pub fn religion<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, age: u32) -> String {
    let table = &ctx.rules.religions;
    let dominant_chance = match age {
        65.. => 0.9,
        50.. => 0.7,
        _ => 0.0,
    };
    let pick = match table.most_common() {
        Some(dominant) if rng.gen_bool(dominant_chance) => Some(dominant),
        _ => table.sample(rng),
    };
    pick.unwrap_or("None").to_string()
}

pub fn hobbies<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    age: u32,
    gender: Gender,
    class: SocialClass,
) -> Vec<String> {
    let bucket = ctx.bucket(age);
    let count = if bucket >= AgeBucket::OlderAdults {
        rng.gen_range(3..=4)
    } else {
        rng.gen_range(2..=5)
    };

    let mut pool = ctx
        .data
        .lookup_weighted(Category::Hobbies, &LookupKey::any().bucket(bucket).gender(gender).class(class));
    if pool.is_empty() {
        debug!("{}", Recoverable::DataUnavailable(Category::Hobbies));
        pool = FALLBACK_HOBBIES.iter().map(|h| (h.to_string(), 1.0)).collect();
    }

    let mut picked = Vec::with_capacity(count);
    while picked.len() < count {
        let Some(hobby) = pick_weighted(rng, &pool).map(str::to_string) else {
            break;
        };
        pool.retain(|(h, _)| *h != hobby);
        picked.push(hobby);
    }
    picked
}

/// Characteristics whose age and gender gate admits the person, each kept
/// with its own probability.
pub fn characteristics<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    age: u32,
    gender: Gender,
) -> Vec<RegionalCharacteristic> {
    ctx.data
        .characteristics()
        .into_iter()
        .filter(|c| c.applies_to(age, gender))
        .filter(|c| roll_percent(rng, c.probability))
        .collect()
}

/// The country's cultural considerations, attached to every record as is.
pub fn considerations(ctx: &GenContext<'_>) -> Vec<String> {
    ctx.data.lookup(Category::Considerations, &LookupKey::any())
}

// ============================================================================
// Residence
// ============================================================================

/// A city drawn from the provider's weighted city lines. Lines that do not
/// parse are never picked; `None` when no line is usable.
pub fn residence<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>) -> Option<Residence> {
    let lines: Vec<(String, f64)> = ctx
        .data
        .lookup_weighted(Category::Cities, &LookupKey::any())
        .into_iter()
        .filter(|(line, _)| Residence::parse(line).is_some())
        .collect();
    match pick_weighted(rng, &lines) {
        Some(line) => Residence::parse(line),
        None => {
            debug!("{}", Recoverable::DataUnavailable(Category::Cities));
            None
        }
    }
}

// ============================================================================
// Phone
// ============================================================================

pub fn phone_number<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>) -> String {
    let phone = &ctx.rules.phone;
    let prefix = phone.prefixes.choose(rng).cloned().unwrap_or_default();
    let mut digits = prefix;
    while digits.len() < phone.length as usize {
        digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    format!("{} {}", phone.country_code, apply_pattern(&digits, &phone.pattern))
}

/// Fills each `#` in `pattern` with the next digit; other characters are kept.
pub fn apply_pattern(digits: &str, pattern: &str) -> String {
    let mut digits = digits.chars();
    pattern
        .chars()
        .filter_map(|c| if c == '#' { digits.next() } else { Some(c) })
        .collect()
}
