//! Cross-validation of finished identities
//!
//! `validate` re-checks every date, age and relationship constraint on a
//! record. It is a pure function of the record, the rule set, the job
//! catalog and "today"; the assembler regenerates whichever component it
//! flags.

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::components::{
    EducationLevel, FamilyMember, Gender, Identity, Proficiency, UnionKind, Vital,
};
use crate::rules::RuleSet;
use crate::systems::employment::JobCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Anchor,
    Parents,
    Siblings,
    Unions,
    Children,
    Employment,
    Languages,
    Characteristics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub component: Component,
    pub detail: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.component, self.detail)
    }
}

struct Report {
    violations: Vec<Violation>,
}

impl Report {
    fn check(&mut self, ok: bool, component: Component, detail: impl FnOnce() -> String) {
        if !ok {
            self.violations.push(Violation {
                component,
                detail: detail(),
            });
        }
    }
}

pub fn validate(identity: &Identity, rules: &RuleSet, jobs: &JobCatalog, today: NaiveDate) -> Vec<Violation> {
    let mut report = Report { violations: Vec::new() };
    check_anchor(&mut report, identity, rules, today);
    check_parents(&mut report, identity, rules, today);
    check_siblings(&mut report, identity, rules, today);
    check_unions(&mut report, identity, rules, today);
    check_children(&mut report, identity, rules, today);
    check_employment(&mut report, identity, jobs, today);
    check_languages(&mut report, identity, rules);
    check_characteristics(&mut report, identity);
    report.violations
}

fn check_anchor(report: &mut Report, identity: &Identity, rules: &RuleSet, today: NaiveDate) {
    let c = Component::Anchor;
    report.check(
        identity.age >= rules.min_age && identity.age <= rules.max_age,
        c,
        || format!("age {} outside {}-{}", identity.age, rules.min_age, rules.max_age),
    );
    report.check(identity.birth_date <= today, c, || "born in the future".to_string());
    report.check(
        today.year() - identity.birth_year() == identity.age as i32,
        c,
        || format!("age {} does not match birth year {}", identity.age, identity.birth_year()),
    );
}

/// Checks shared by every relative.
fn check_member(report: &mut Report, c: Component, m: &FamilyMember, rules: &RuleSet, today: NaiveDate) {
    let name = &m.name.first;
    report.check(m.birth_date <= today, c, || format!("{} born in the future", name));
    match &m.vital {
        Vital::Alive { age } => {
            report.check(
                *age as i32 == today.year() - m.birth_year(),
                c,
                || format!("{} age {} does not match birth year", name, age),
            );
            report.check(*age <= rules.max_living_age(), c, || {
                format!("{} alive at {}", name, age)
            });
        }
        Vital::Deceased {
            age_at_death,
            death_date,
            ..
        } => {
            report.check(*death_date <= today && *death_date >= m.birth_date, c, || {
                format!("{} death date {} out of range", name, death_date)
            });
            report.check(
                *age_at_death as i32 == death_date.year() - m.birth_year(),
                c,
                || format!("{} age at death {} does not match dates", name, age_at_death),
            );
            report.check(*age_at_death <= rules.max_living_age(), c, || {
                format!("{} died at {}", name, age_at_death)
            });
        }
    }
}

fn check_parents(report: &mut Report, identity: &Identity, rules: &RuleSet, today: NaiveDate) {
    let c = Component::Parents;
    let family = &identity.family;
    for parent in family.father.iter().chain(family.mother.iter()) {
        check_member(report, c, parent, rules, today);
        let gap = identity.birth_year() - parent.birth_year();
        report.check(
            gap >= rules.parent_min_age_gap as i32 && gap <= rules.parent_max_age_gap as i32,
            c,
            || format!("parent gap {}", gap),
        );
    }
    if let Some(mother) = &family.mother {
        let at_birth = identity.birth_year() - mother.birth_year();
        report.check(in_fertility(rules, at_birth), c, || {
            format!("mother was {} at the anchor's birth", at_birth)
        });
        if let Some(death) = mother.death_date() {
            report.check(death >= identity.birth_date, c, || "mother died before the anchor's birth".to_string());
        }
    }
}

fn check_siblings(report: &mut Report, identity: &Identity, rules: &RuleSet, today: NaiveDate) {
    let c = Component::Siblings;
    let family = &identity.family;
    if family.siblings.is_empty() {
        return;
    }
    let Some(mother) = &family.mother else {
        report.check(false, c, || "siblings without a mother".to_string());
        return;
    };

    let mut names: HashSet<&str> = HashSet::from([identity.name.first.as_str()]);
    for s in &family.siblings {
        check_member(report, c, s, rules, today);
        let at_birth = s.birth_year() - mother.birth_year();
        report.check(in_fertility(rules, at_birth), c, || {
            format!("mother was {} at {}'s birth", at_birth, s.name.first)
        });
        if let Some(death) = mother.death_date() {
            report.check(s.birth_date <= death, c, || format!("{} born after the mother died", s.name.first));
        }
        report.check(names.insert(s.name.first.as_str()), c, || {
            format!("duplicate name {}", s.name.first)
        });
    }

    let per_year = family.siblings.iter().fold(std::collections::HashMap::new(), |mut acc, s| {
        *acc.entry(s.birth_year()).or_insert(0u32) += 1;
        acc
    });
    for (year, count) in per_year {
        report.check(count <= rules.max_same_age, c, || format!("{} siblings born in {}", count, year));
    }
}

fn check_unions(report: &mut Report, identity: &Identity, rules: &RuleSet, today: NaiveDate) {
    let c = Component::Unions;
    let unions = &identity.family.unions;
    for (i, union) in unions.iter().enumerate() {
        check_member(report, c, &union.partner, rules, today);
        report.check(
            union.start_date >= identity.birth_date && union.start_date <= today,
            c,
            || format!("union {} starts {}", i + 1, union.start_date),
        );
        report.check(union.partner.birth_date <= union.start_date, c, || {
            format!("partner {} born after the union began", union.partner.name.first)
        });
        match &union.end {
            Some(end) => report.check(
                end.date() >= union.start_date && end.date() <= today,
                c,
                || format!("union {} ends {}", i + 1, end.date()),
            ),
            None => report.check(i + 1 == unions.len(), c, || format!("union {} left open", i + 1)),
        }
    }
    for pair in unions.windows(2) {
        if let Some(end) = &pair[0].end {
            report.check(end.date() <= pair[1].start_date, c, || "overlapping unions".to_string());
        }
    }

    let relationships = &identity.family.relationships;
    for rel in relationships {
        let name = &rel.partner.name.first;
        check_member(report, c, &rel.partner, rules, today);
        report.check(rel.start_date >= identity.birth_date, c, || {
            format!("relationship with {} starts before the anchor's birth", name)
        });
        report.check(rel.start_date < rel.end_date && rel.end_date <= today, c, || {
            format!("relationship with {} runs {} to {}", name, rel.start_date, rel.end_date)
        });
        report.check(rel.partner.birth_date <= rel.start_date, c, || {
            format!("{} born after the relationship began", name)
        });
    }
    for pair in relationships.windows(2) {
        report.check(pair[0].end_date <= pair[1].start_date, c, || "overlapping relationships".to_string());
    }
    if let (Some(last), Some(first)) = (relationships.last(), unions.first()) {
        report.check(last.end_date <= first.start_date, c, || {
            format!("relationship with {} overlaps a union", last.partner.name.first)
        });
    }
}

fn check_children(report: &mut Report, identity: &Identity, rules: &RuleSet, today: NaiveDate) {
    let c = Component::Children;
    let unions = &identity.family.unions;
    for child in &identity.family.children {
        check_member(report, c, child, rules, today);
        let Some(union) = child
            .union
            .and_then(|n| unions.get((n as usize).checked_sub(1)?))
        else {
            report.check(false, c, || format!("{} has no union", child.name.first));
            continue;
        };
        report.check(union.kind == UnionKind::Marriage, c, || {
            format!("{} born outside a marriage", child.name.first)
        });

        let gap = child.birth_year() - identity.birth_year();
        report.check(
            gap >= rules.parent_min_age_gap as i32 && gap <= rules.parent_max_age_gap as i32,
            c,
            || format!("anchor was {} at {}'s birth", gap, child.name.first),
        );

        let mother = match identity.gender {
            Gender::Female => None,
            Gender::Male => Some(&union.partner),
        };
        let mother_year = mother.map(|m| m.birth_year()).unwrap_or(identity.birth_year());
        let at_birth = child.birth_year() - mother_year;
        report.check(in_fertility(rules, at_birth), c, || {
            format!("mother was {} at {}'s birth", at_birth, child.name.first)
        });
        if let Some(death) = mother.and_then(|m| m.death_date()) {
            report.check(child.birth_date <= death, c, || format!("{} born after the mother died", child.name.first));
        }

        report.check(child.birth_year() >= union.start_date.year() - 1, c, || {
            format!("{} born before the union", child.name.first)
        });
        if let Some(end) = &union.end {
            report.check(child.birth_year() <= end.date().year() + 1, c, || {
                format!("{} born after the union ended", child.name.first)
            });
        }
    }
}

fn check_employment(report: &mut Report, identity: &Identity, jobs: &JobCatalog, today: NaiveDate) {
    let c = Component::Employment;
    let Some(employment) = &identity.employment else {
        return;
    };
    if identity.age < 18 {
        report.check(
            employment.occupation == "Student" && employment.records().next().is_none(),
            c,
            || format!("minor working as {}", employment.occupation),
        );
    }

    let records: Vec<_> = employment.records().collect();
    for r in &records {
        let earliest = jobs.earliest_start(&r.title, identity.birth_date);
        report.check(r.start_date >= earliest, c, || {
            format!("{} started {} before {}", r.title, r.start_date, earliest)
        });
        report.check(r.start_date <= today, c, || format!("{} starts in the future", r.title));
        match r.end_date {
            Some(end) => {
                report.check(end > r.start_date && end <= today, c, || format!("{} ends {}", r.title, end));
                report.check(r.termination_reason.is_some(), c, || format!("{} ended without a reason", r.title));
            }
            None => report.check(r.termination_reason.is_none(), c, || {
                format!("current job {} has a termination reason", r.title)
            }),
        }
    }
    for pair in records.windows(2) {
        let ok = pair[0].end_date.map_or(false, |end| end <= pair[1].start_date);
        report.check(ok, c, || format!("{} overlaps {}", pair[0].title, pair[1].title));
    }
}

fn check_languages(report: &mut Report, identity: &Identity, rules: &RuleSet) {
    let c = Component::Languages;
    let langs = &identity.languages;
    report.check(
        langs.first().map_or(false, |l| l.language == rules.native_language && l.proficiency == Proficiency::Native),
        c,
        || "native language missing".to_string(),
    );

    let extras = langs.get(1..).unwrap_or_default();
    let completed = identity.education.completed;
    let primary = &rules.primary_foreign_language;
    let primary_available = *primary != rules.native_language && rules.available_languages.weight(primary) > 0.0;
    let primary_level = extras.iter().find(|l| l.language == *primary).map(|l| l.proficiency);

    if primary_available && completed.is_higher() {
        report.check(primary_level.map_or(false, |p| p >= Proficiency::Intermediate), c, || {
            format!("graduate below intermediate {}", primary)
        });
    }
    if primary_available && identity.age < rules.young_language_age {
        report.check(primary_level.is_some(), c, || format!("young person without {}", primary));
    }
    if completed <= EducationLevel::Primary {
        report.check(extras.iter().all(|l| l.proficiency == Proficiency::Basic), c, || {
            "above basic with primary education".to_string()
        });
    }
}

fn check_characteristics(report: &mut Report, identity: &Identity) {
    for ch in &identity.characteristics {
        report.check(ch.applies_to(identity.age, identity.gender), Component::Characteristics, || {
            format!("'{}' does not apply at {}", ch.text, identity.age)
        });
    }
}

fn in_fertility(rules: &RuleSet, age_at_birth: i32) -> bool {
    age_at_birth >= rules.fertility_min as i32 && age_at_birth <= rules.fertility_max as i32
}
