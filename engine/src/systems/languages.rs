//! Language System
//!
//! Native language plus additional languages drawn from the country's
//! weighted language table. The number of extra languages falls off with age
//! and rises with education; the level obeys three hard rules:
//!
//! - completed higher education: at least intermediate in the primary foreign language
//! - younger than `young_language_age`: knows the primary foreign language
//! - primary education or less: never above basic in any extra language

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{Education, EducationLevel, LanguageSkill, Proficiency, SocialClass};
use crate::provider::{Category, TableValue};
use crate::rules::{pick_weighted, RuleSet};
use crate::systems::GenContext;

const CERTIFICATION_CHANCE: f64 = 0.6;

pub fn build_languages<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    age: u32,
    class: SocialClass,
    education: &Education,
) -> Vec<LanguageSkill> {
    let rules = ctx.rules;
    let mut skills = vec![native(rules)];

    let mut pool: Vec<(String, f64)> = rules
        .available_languages
        .entries()
        .iter()
        .filter(|(lang, w)| *lang != rules.native_language && *w > 0.0)
        .cloned()
        .collect();

    let primary = rules.primary_foreign_language.as_str();
    let must_know_primary = requires_primary(rules, age, education);

    let max_extra = rules.max_languages.saturating_sub(1) as usize;
    let min_extra = (rules.min_languages.saturating_sub(1) as usize).min(max_extra);
    let wanted = extra_count(rng, age, class, education, max_extra)
        .max(min_extra)
        .max(usize::from(must_know_primary))
        .min(max_extra.max(usize::from(must_know_primary)));

    let mut chosen: Vec<String> = Vec::new();
    if must_know_primary {
        chosen.push(primary.to_string());
        pool.retain(|(l, _)| l != primary);
    }
    while chosen.len() < wanted {
        let Some(lang) = pick_weighted(rng, &pool).map(str::to_string) else {
            break;
        };
        pool.retain(|(l, _)| *l != lang);
        chosen.push(lang);
    }

    let certifications = ctx.data.lookup_table(Category::LanguageCertifications);
    for language in chosen {
        let proficiency = level_for(rng, ctx, &language, education);
        let certification = certifications
            .get(&format!("{}:{}", language, proficiency.label()))
            .and_then(TableValue::as_list)
            .filter(|certs| !certs.is_empty())
            .filter(|_| rng.gen_bool(CERTIFICATION_CHANCE))
            .and_then(|certs| certs.choose(rng).cloned());
        skills.push(LanguageSkill {
            language,
            proficiency,
            certification,
        });
    }
    skills
}

/// The smallest list that satisfies the level rules: the native language,
/// plus the primary foreign language at the lowest admissible level when the
/// person must know it.
pub fn minimal_languages(rules: &RuleSet, age: u32, education: &Education) -> Vec<LanguageSkill> {
    let mut skills = vec![native(rules)];
    if requires_primary(rules, age, education) {
        let proficiency = if education.completed.is_higher() {
            Proficiency::Intermediate
        } else {
            Proficiency::Basic
        };
        skills.push(LanguageSkill {
            language: rules.primary_foreign_language.clone(),
            proficiency,
            certification: None,
        });
    }
    skills
}

fn native(rules: &RuleSet) -> LanguageSkill {
    LanguageSkill {
        language: rules.native_language.clone(),
        proficiency: Proficiency::Native,
        certification: None,
    }
}

/// Graduates and anyone under `young_language_age` must know the primary
/// foreign language, when the country offers it.
fn requires_primary(rules: &RuleSet, age: u32, education: &Education) -> bool {
    let primary = rules.primary_foreign_language.as_str();
    primary != rules.native_language
        && rules.available_languages.weight(primary) > 0.0
        && (education.completed.is_higher() || age < rules.young_language_age)
}

/// Number of additional languages before the configured bounds apply.
fn extra_count<R: Rng + ?Sized>(
    rng: &mut R,
    age: u32,
    class: SocialClass,
    education: &Education,
    max_extra: usize,
) -> usize {
    if education.completed <= EducationLevel::Primary && age >= 30 {
        return usize::from(rng.gen_bool(0.2));
    }

    let base = match age {
        0..=24 => 80.0,
        25..=34 => 70.0,
        _ => 60.0,
    };
    let mut factor = 1.0;
    if age >= 60 {
        factor *= 0.4;
    } else if age >= 45 {
        factor *= 0.6;
    }
    if education.completed.is_higher() {
        factor *= 1.4;
    }
    if class == SocialClass::Low {
        factor *= 0.7;
    }

    // Each further language is half as likely as the previous one.
    let mut count = 0;
    while count < max_extra {
        let p = (base * factor / 2f64.powi(count as i32) / 100.0).min(1.0);
        if !rng.gen_bool(p) {
            break;
        }
        count += 1;
    }
    count
}

fn level_for<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, language: &str, education: &Education) -> Proficiency {
    if education.completed <= EducationLevel::Primary {
        return Proficiency::Basic;
    }
    let drawn = if education.completed.is_higher() {
        ctx.rules.sample_language_level(rng)
    } else if rng.gen_bool(0.6) {
        Proficiency::Basic
    } else {
        Proficiency::Intermediate
    };
    if education.completed.is_higher() && language == ctx.rules.primary_foreign_language {
        drawn.max(Proficiency::Intermediate)
    } else {
        drawn
    }
}
