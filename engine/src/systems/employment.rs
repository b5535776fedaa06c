//! Employment System
//!
//! Builds the anchor's job timeline backwards from today: the current job
//! (or the last one before retirement or unemployment) first, then earlier
//! jobs that end where the next one starts. Every record starts on or after
//! the day the person reached the job's minimum working age.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::calendar;
use crate::components::{
    Education, EducationLevel, Employment, EmploymentRecord, EmploymentStatus, SocialClass,
};
use crate::error::Recoverable;
use crate::provider::{CategoricalData, Category, LookupKey};
use crate::rules::RuleSet;
use crate::systems::death::roll_percent;
use crate::systems::termination;
use crate::systems::{Anchor, GenContext};

/// Used when no provider job passes the filters.
const FALLBACK_JOBS: &[&str] = &["Cashier", "Cleaner", "Sales Associate"];

const INTERNSHIP_AREAS: &[&str] = &["Marketing", "IT", "Administration", "Sales", "Customer Service", "Design"];
const INTERNSHIP_ENDINGS: &[&str] = &["Internship program completed", "Returned to studies", "End of internship"];
const INTERNSHIP_CHANCE: f64 = 0.4;

const RETIREMENT_REASON: &str = "Retirement";

/// Longest tenure at the current job, in years.
const MAX_TENURE: u32 = 25;

/// Earlier jobs kept behind the current one.
const MAX_PREVIOUS_JOBS: usize = 3;

const SAME_CATEGORY_CHANCE: f64 = 0.7;

// ============================================================================
// Job catalog
// ============================================================================

/// Job metadata merged from the provider tables and the rule set.
#[derive(Debug, Clone, Default)]
pub struct JobCatalog {
    min_ages: BTreeMap<String, u32>,
    requirements: BTreeMap<String, (EducationLevel, Option<String>)>,
    categories: BTreeMap<String, Vec<String>>,
    basic_jobs: Vec<String>,
    basic_min_age: u32,
    default_min_age: u32,
    internship_min_age: u32,
}

impl JobCatalog {
    pub fn new(rules: &RuleSet, data: &dyn CategoricalData) -> Self {
        let mut min_ages: BTreeMap<String, u32> = data
            .lookup_table(Category::JobMinimumAge)
            .into_iter()
            .filter_map(|(title, v)| Some((title, u32::try_from(v.as_int()?).ok()?)))
            .collect();
        // Country overrides and provider table: the stricter minimum wins.
        for (title, age) in &rules.job_min_ages {
            let entry = min_ages.entry(title.clone()).or_insert(*age);
            *entry = (*entry).max(*age);
        }

        let requirements = data
            .lookup_table(Category::EducationRequirements)
            .into_iter()
            .filter_map(|(title, v)| {
                let text = v.as_text()?.to_string();
                let (level, field) = match text.split_once('|') {
                    Some((level, field)) => (level, Some(field.trim())),
                    None => (text.as_str(), None),
                };
                let level = EducationLevel::from_key(level)?;
                let field = field.filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("any"));
                Some((title, (level, field.map(str::to_string))))
            })
            .collect();

        let categories = data
            .lookup_table(Category::JobCategories)
            .into_iter()
            .filter_map(|(name, v)| Some((name, v.as_list()?.to_vec())))
            .collect();

        Self {
            min_ages,
            requirements,
            categories,
            basic_jobs: rules.basic_jobs.clone(),
            basic_min_age: rules.basic_job_min_age,
            default_min_age: rules.default_job_min_age,
            internship_min_age: rules.internship_min_age,
        }
    }

    pub fn min_working_age(&self, title: &str) -> u32 {
        if title.starts_with("Intern") {
            return self.internship_min_age;
        }
        if let Some(age) = self.min_ages.get(title) {
            return *age;
        }
        if self.basic_jobs.iter().any(|j| j == title) {
            self.basic_min_age
        } else {
            self.default_min_age
        }
    }

    /// First day on which someone born on `birth_date` may hold `title`.
    pub fn earliest_start(&self, title: &str, birth_date: NaiveDate) -> NaiveDate {
        calendar::add_years(birth_date, self.min_working_age(title))
    }

    pub fn admits_education(&self, title: &str, education: &Education) -> bool {
        match self.requirements.get(title) {
            None => true,
            Some((level, field)) => {
                education.completed >= *level
                    && field
                        .as_ref()
                        .map_or(true, |f| education.field.as_deref() == Some(f.as_str()))
            }
        }
    }

    pub fn category_of(&self, title: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, titles)| titles.iter().any(|t| t == title))
            .map(|(name, _)| name.as_str())
    }
}

// ============================================================================
// Timeline
// ============================================================================

pub fn build_employment<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> Employment {
    let rules = ctx.rules;
    if anchor.age < 18 {
        return minor_student();
    }
    if anchor.age >= rules.retirement_age {
        return retired(rng, ctx, anchor);
    }
    if let Some(studying) = anchor.education.in_progress {
        return student(rng, ctx, anchor, studying);
    }
    if roll_percent(rng, rules.jobless_rate) {
        return without_jobs(EmploymentStatus::Jobless, "Jobless");
    }
    if roll_percent(rng, rules.unemployment_rate) {
        return unemployed(rng, ctx, anchor);
    }
    employed(rng, ctx, anchor)
}

fn without_jobs(status: EmploymentStatus, occupation: &str) -> Employment {
    Employment {
        status,
        occupation: occupation.to_string(),
        current: None,
        previous: Vec::new(),
        salary: None,
        previous_salary: None,
        pension: None,
        currency: None,
    }
}

/// The record of anyone under working age.
pub fn minor_student() -> Employment {
    without_jobs(EmploymentStatus::Student, "Student")
}

/// Jobs the anchor could hold today, by age and education.
fn candidates(ctx: &GenContext<'_>, anchor: &Anchor) -> Vec<String> {
    let key = LookupKey::any()
        .bucket(anchor.bucket)
        .gender(anchor.gender)
        .class(anchor.class);
    let eligible = |title: &String| {
        ctx.jobs.earliest_start(title, anchor.birth_date) <= ctx.today
            && ctx.jobs.admits_education(title, &anchor.education)
    };

    let mut jobs: Vec<String> = ctx.data.lookup(Category::Jobs, &key).into_iter().filter(eligible).collect();
    jobs.sort();
    jobs.dedup();
    if jobs.is_empty() {
        debug!("{}", Recoverable::DataUnavailable(Category::Jobs));
        jobs = FALLBACK_JOBS
            .iter()
            .map(|j| j.to_string())
            .filter(|j| ctx.jobs.earliest_start(j, anchor.birth_date) <= ctx.today)
            .collect();
    }
    jobs
}

fn pick_job<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> String {
    candidates(ctx, anchor)
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| FALLBACK_JOBS[0].to_string())
}

/// Retirement falls in the first few years past the country's retirement age.
const RETIREMENT_WINDOW: u32 = 4;

fn retired<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> Employment {
    let threshold = ctx.rules.retirement_age.min(anchor.age);
    let retire_age = rng.gen_range(threshold..=anchor.age.min(threshold.saturating_add(RETIREMENT_WINDOW)));
    let retired_on = calendar::date_in_year(rng, anchor.birth_year() + retire_age as i32, ctx.today)
        .max(anchor.birth_date);

    // The last job must have started before retirement.
    let title = candidates(ctx, anchor)
        .into_iter()
        .filter(|t| ctx.jobs.earliest_start(t, anchor.birth_date) < retired_on)
        .collect::<Vec<_>>()
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| pick_job(rng, ctx, anchor));
    let earliest = ctx.jobs.earliest_start(&title, anchor.birth_date);
    let start = calendar::sub_years(retired_on, rng.gen_range(15..=40)).max(earliest);

    let mut previous = Vec::new();
    if start < retired_on {
        if rng.gen_bool(0.6) {
            if let Some(earlier) = earlier_job(rng, ctx, anchor, &title, start) {
                previous.push(earlier);
            }
        }
        previous.push(EmploymentRecord {
            title,
            start_date: start,
            end_date: Some(retired_on),
            termination_reason: Some(RETIREMENT_REASON.to_string()),
        });
    } else {
        debug!("no job fits before retirement on {}", retired_on);
    }

    Employment {
        status: EmploymentStatus::Retired,
        occupation: "Retired".to_string(),
        current: None,
        previous,
        salary: None,
        previous_salary: Some(salary(rng, ctx.rules, anchor.class, retire_age)),
        pension: Some(pension(rng, ctx.rules, anchor.class)),
        currency: Some(ctx.rules.currency_code.clone()),
    }
}

fn student<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    studying: EducationLevel,
) -> Employment {
    let occupation = match (&anchor.education.field, studying.is_higher()) {
        (Some(field), true) => format!("Student of {}", field),
        _ => "Student".to_string(),
    };
    let mut employment = without_jobs(EmploymentStatus::Student, &occupation);

    if anchor.age >= 20 && rng.gen_bool(INTERNSHIP_CHANCE) {
        let area = INTERNSHIP_AREAS.choose(rng).copied().unwrap_or("Administration");
        let title = format!("Intern - {}", area);
        let months = rng.gen_range(3..=6);
        let earliest = ctx.jobs.earliest_start(&title, anchor.birth_date);

        let mut end = calendar::date_between(rng, calendar::sub_years(ctx.today, 1), ctx.today);
        let mut start = calendar::sub_months(end, months);
        if start < earliest {
            start = earliest;
            end = calendar::add_months(start, months).min(ctx.today);
        }
        if start < end {
            employment.previous.push(EmploymentRecord {
                title,
                start_date: start,
                end_date: Some(end),
                termination_reason: INTERNSHIP_ENDINGS.choose(rng).map(|r| r.to_string()),
            });
        }
    }
    employment
}

fn unemployed<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> Employment {
    let mut employment = without_jobs(EmploymentStatus::Unemployed, "Unemployed");
    let title = pick_job(rng, ctx, anchor);
    let earliest = ctx.jobs.earliest_start(&title, anchor.birth_date);

    let end = calendar::sub_months(ctx.today, rng.gen_range(3..=18));
    let start = calendar::sub_years(end, rng.gen_range(2..=12)).max(earliest);
    if start < end {
        employment.previous.push(EmploymentRecord {
            title,
            start_date: start,
            end_date: Some(end),
            termination_reason: Some(termination::involuntary_reason(rng)),
        });
        employment.previous_salary = Some(salary(rng, ctx.rules, anchor.class, anchor.age));
        employment.currency = Some(ctx.rules.currency_code.clone());
    }
    employment
}

fn employed<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor) -> Employment {
    let title = pick_job(rng, ctx, anchor);
    let min_age = ctx.jobs.min_working_age(&title);
    let earliest = ctx.jobs.earliest_start(&title, anchor.birth_date);

    let max_years = MAX_TENURE.min(anchor.age.saturating_sub(min_age));
    let mut tenure = rng.gen_range(0..=max_years);
    // Most people change jobs well before ten years.
    if tenure > 10 && rng.gen_bool(0.7) {
        tenure = rng.gen_range(2..=10);
    }
    let start = calendar::date_in_year(rng, ctx.current_year() - tenure as i32, ctx.today).max(earliest);

    // A career that would otherwise start late, or any career at 40+ (80%),
    // gets earlier jobs.
    let start_age = (start.year() - anchor.birth_year()).max(0) as u32;
    let late_start = start_age > 25 && min_age < 24;
    let wants_history = late_start || (anchor.age >= 40 && rng.gen_bool(0.8));

    let mut previous = Vec::new();
    if wants_history {
        let mut next_title = title.clone();
        let mut next_start = start;
        while previous.len() < MAX_PREVIOUS_JOBS {
            let Some(record) = earlier_job(rng, ctx, anchor, &next_title, next_start) else {
                break;
            };
            next_title = record.title.clone();
            next_start = record.start_date;
            previous.push(record);

            let career_start_age = (next_start.year() - anchor.birth_year()).max(0) as u32;
            if career_start_age <= 25 || !rng.gen_bool(0.5) {
                break;
            }
        }
        previous.reverse();
    }

    Employment {
        status: EmploymentStatus::Employed,
        occupation: title.clone(),
        current: Some(EmploymentRecord {
            title,
            start_date: start,
            end_date: None,
            termination_reason: None,
        }),
        previous,
        salary: Some(salary(rng, ctx.rules, anchor.class, anchor.age)),
        previous_salary: None,
        pension: None,
        currency: Some(ctx.rules.currency_code.clone()),
    }
}

/// A job that ended on `ends_on`, coherent with `next_title` (70% same
/// category). `None` when no job fits before `ends_on`.
fn earlier_job<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    next_title: &str,
    ends_on: NaiveDate,
) -> Option<EmploymentRecord> {
    let fits = |title: &String| title != next_title && ctx.jobs.earliest_start(title, anchor.birth_date) < ends_on;
    let pool: Vec<String> = candidates(ctx, anchor).into_iter().filter(fits).collect();

    let same_category: Vec<&String> = match ctx.jobs.category_of(next_title) {
        Some(category) => pool
            .iter()
            .filter(|t| ctx.jobs.category_of(t) == Some(category))
            .collect(),
        None => Vec::new(),
    };
    let title = if !same_category.is_empty() && rng.gen_bool(SAME_CATEGORY_CHANCE) {
        same_category.choose(rng).map(|t| t.to_string())
    } else {
        pool.choose(rng).cloned()
    };
    let Some(title) = title else {
        debug!("no earlier job fits before {}", ends_on);
        return None;
    };

    let years = if anchor.age >= 40 { rng.gen_range(5..=15) } else { rng.gen_range(2..=12) };
    let start = calendar::sub_years(ends_on, years).max(ctx.jobs.earliest_start(&title, anchor.birth_date));
    if start >= ends_on {
        return None;
    }
    let reason = termination::termination_reason(rng, ctx, &title);
    Some(EmploymentRecord {
        title,
        start_date: start,
        end_date: Some(ends_on),
        termination_reason: Some(reason),
    })
}

// ============================================================================
// Pay
// ============================================================================

/// Yearly salary for `class`, reduced for early-career ages.
pub fn salary<R: Rng + ?Sized>(rng: &mut R, rules: &RuleSet, class: SocialClass, age: u32) -> u32 {
    let range = rules.salary.get(class);
    let base = rng.gen_range(range.min..=range.max) as f64;
    let factor = match age {
        0..=24 => rng.gen_range(0.5..=0.7),
        25..=29 => rng.gen_range(0.65..=0.85),
        30..=39 => rng.gen_range(0.8..=1.0),
        _ => 1.0,
    };
    round_pay(base * factor)
}

pub fn pension<R: Rng + ?Sized>(rng: &mut R, rules: &RuleSet, class: SocialClass) -> u32 {
    let range = rules.pension.get(class);
    round_pay(rng.gen_range(range.min..=range.max) as f64)
}

/// Rounds to 50 below 30 000 and to 100 above.
pub fn round_pay(amount: f64) -> u32 {
    let step = if amount < 30_000.0 { 50.0 } else { 100.0 };
    ((amount / step).round() * step) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InMemoryData, TableValue};
    use crate::systems::fixtures::{anchor, today, Fixture};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_catalog_takes_stricter_minimum() {
        let mut data = InMemoryData::new();
        data.set_table_value(Category::JobMinimumAge, "Pilot", TableValue::Int(21))
            .set_table_value(Category::JobMinimumAge, "Nurse", TableValue::Int(22));
        let mut rules = RuleSet::default();
        rules.job_min_ages.insert("Pilot".to_string(), 23);
        rules.job_min_ages.insert("Nurse".to_string(), 20);

        let catalog = JobCatalog::new(&rules, &data);
        assert_eq!(catalog.min_working_age("Pilot"), 23);
        assert_eq!(catalog.min_working_age("Nurse"), 22);
        assert_eq!(catalog.min_working_age("Cashier"), 16);
        assert_eq!(catalog.min_working_age("Intern - IT"), 18);
        assert_eq!(catalog.min_working_age("Accountant"), 18);
    }

    #[test]
    fn test_education_prerequisite() {
        let mut data = InMemoryData::new();
        data.set_table_value(
            Category::EducationRequirements,
            "Doctor",
            TableValue::Text("master|Medicine".into()),
        )
        .set_table_value(Category::EducationRequirements, "Teacher", TableValue::Text("bachelor".into()));
        let catalog = JobCatalog::new(&RuleSet::default(), &data);

        let mut edu = Education {
            completed: EducationLevel::Master,
            in_progress: None,
            field: Some("Law".into()),
        };
        assert!(!catalog.admits_education("Doctor", &edu));
        assert!(catalog.admits_education("Teacher", &edu));
        edu.field = Some("Medicine".into());
        assert!(catalog.admits_education("Doctor", &edu));
        edu.completed = EducationLevel::Secondary;
        assert!(!catalog.admits_education("Teacher", &edu));
        assert!(catalog.admits_education("Cashier", &edu));
    }

    #[test]
    fn test_minor_is_student_without_jobs() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(16);
        let a = anchor(&mut rng, &ctx, crate::components::Gender::Female, 16);
        let employment = build_employment(&mut rng, &ctx, &a);
        assert_eq!(employment.occupation, "Student");
        assert_eq!(employment.status, EmploymentStatus::Student);
        assert!(employment.current.is_none() && employment.previous.is_empty());
    }

    #[test]
    fn test_timelines_are_consistent() {
        let fixture = Fixture::sample();
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(40);

        for _ in 0..1000 {
            let age = rng.gen_range(18..=85);
            let a = anchor(&mut rng, &ctx, crate::components::Gender::Male, age);
            let employment = build_employment(&mut rng, &ctx, &a);

            let records: Vec<&EmploymentRecord> = employment.records().collect();
            for r in &records {
                assert!(r.start_date >= fixture.jobs.earliest_start(&r.title, a.birth_date), "{} too young", r.title);
                assert!(r.start_date <= today());
                match r.end_date {
                    Some(end) => {
                        assert!(end > r.start_date && end <= today());
                        assert!(r.termination_reason.is_some());
                    }
                    None => assert!(r.termination_reason.is_none()),
                }
            }
            for pair in records.windows(2) {
                let end = pair[0].end_date.expect("earlier jobs are finished");
                assert!(end <= pair[1].start_date);
            }
            let paid = employment.salary.or(employment.previous_salary).or(employment.pension);
            assert_eq!(employment.currency.is_some(), paid.is_some());
            if let Some(currency) = &employment.currency {
                assert_eq!(currency, "EUR");
            }
            if employment.status == EmploymentStatus::Retired {
                assert!(employment.pension.is_some());
                if let Some(last) = employment.previous.last() {
                    assert_eq!(last.termination_reason.as_deref(), Some(RETIREMENT_REASON));
                }
            }
        }
    }

    #[test]
    fn test_retirement_follows_country_age() {
        let rules = RuleSet {
            retirement_age: 55,
            ..crate::sample_data::sample_rules()
        };
        let fixture = Fixture::new(rules, crate::sample_data::sample_data());
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(55);

        for _ in 0..300 {
            let a = anchor(&mut rng, &ctx, crate::components::Gender::Female, 58);
            let employment = build_employment(&mut rng, &ctx, &a);
            assert_eq!(employment.status, EmploymentStatus::Retired);

            let last = employment.previous.last().expect("retirees have worked");
            assert_eq!(last.termination_reason.as_deref(), Some(RETIREMENT_REASON));
            let retired_at = last.end_date.map(|d| d.year() - a.birth_year());
            assert!(matches!(retired_at, Some(55..=58)), "retired at {:?}", retired_at);
        }
    }

    #[test]
    fn test_pay_rounding() {
        assert_eq!(round_pay(24_973.0), 24_950);
        assert_eq!(round_pay(24_980.0), 25_000);
        assert_eq!(round_pay(45_149.0), 45_100);
        let rules = RuleSet::default();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let young = salary(&mut rng, &rules, SocialClass::Middle, 22);
            assert!(young <= 35_050);
            assert_eq!(young % 50, 0);
        }
    }
}
