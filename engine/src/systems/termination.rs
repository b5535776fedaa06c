//! Termination reasons for finished jobs
//!
//! Reasons come from the provider's master list (or the built-in one) and
//! are filtered by how senior the finished job was. Retirement is reserved
//! for the retirement path and never drawn here.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::provider::{Category, LookupKey};
use crate::systems::GenContext;

const EXECUTIVE_JOBS: &[&str] = &[
    "CEO", "CFO", "CTO", "COO", "CMO", "Managing Director", "Executive Director",
    "Vice President", "Company Director", "General Manager", "Senior Manager",
];

const PROFESSIONAL_JOBS: &[&str] = &[
    "Doctor", "Surgeon", "Lawyer", "Judge", "University Professor", "Architect", "Engineer",
];

const ENTRY_LEVEL_JOBS: &[&str] = &["Intern", "Trainee", "Student"];

const SEASONAL_JOBS: &[&str] = &["Seasonal Worker", "Farm Worker", "Beach Lifeguard"];

const DEFAULT_REASONS: &[&str] = &[
    "Better job opportunity",
    "Career change",
    "Relocation",
    "Company restructuring",
    "Contract ended",
    "Personal reasons",
    "Health reasons",
    "Retirement",
    "Layoff",
];

/// Drawn uniformly when filtering leaves nothing.
pub const SAFE_REASONS: &[&str] = &["Better job opportunity", "Company restructuring", "Career change"];

/// Reasons for someone who is now out of work: never voluntary.
/// `(weight, reasons)` for economic, company and personal causes.
const INVOLUNTARY_REASONS: &[(f64, &[&str])] = &[
    (55.0, &["Layoff", "Position eliminated", "Business downturn", "Cost-cutting measures"]),
    (35.0, &["Company restructuring", "Company closure", "Contract ended"]),
    (10.0, &["Health reasons", "Family relocation", "Personal circumstances"]),
];

/// Keywords a reason must not contain for a job of `title`.
fn excluded_keywords(title: &str) -> Vec<&'static str> {
    let mut excluded = vec!["retire"];
    let matches = |list: &[&str]| list.iter().any(|j| title.starts_with(j));

    if matches(EXECUTIVE_JOBS) || matches(PROFESSIONAL_JOBS) {
        excluded.extend(["internship", "seasonal", "graduat", "student", "trainee"]);
    } else if !matches(ENTRY_LEVEL_JOBS) {
        excluded.extend(["internship", "graduat", "student", "trainee"]);
    }
    if !matches(SEASONAL_JOBS) && !excluded.contains(&"seasonal") {
        excluded.push("seasonal");
    }
    excluded
}

/// Reasons that may end a job titled `title`.
pub fn admissible_reasons(ctx: &GenContext<'_>, title: &str) -> Vec<String> {
    let mut master = ctx.data.lookup(Category::TerminationReasons, &LookupKey::any());
    if master.is_empty() {
        master = DEFAULT_REASONS.iter().map(|r| r.to_string()).collect();
    }
    let excluded = excluded_keywords(title);
    master
        .into_iter()
        .filter(|r| {
            let lower = r.to_lowercase();
            !excluded.iter().any(|k| lower.contains(k))
        })
        .collect()
}

pub fn termination_reason<R: Rng + ?Sized>(rng: &mut R, ctx: &GenContext<'_>, title: &str) -> String {
    admissible_reasons(ctx, title)
        .choose(rng)
        .cloned()
        .or_else(|| SAFE_REASONS.choose(rng).map(|r| r.to_string()))
        .unwrap_or_default()
}

pub fn involuntary_reason<R: Rng + ?Sized>(rng: &mut R) -> String {
    INVOLUNTARY_REASONS
        .choose_weighted(rng, |(w, _)| *w)
        .ok()
        .and_then(|(_, reasons)| reasons.choose(rng))
        .map(|r| r.to_string())
        .unwrap_or_else(|| "Layoff".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryData;
    use crate::rules::RuleSet;
    use crate::systems::fixtures::Fixture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_executives_never_leave_an_internship() {
        let mut data = InMemoryData::new();
        data.add_list(
            Category::TerminationReasons,
            LookupKey::any(),
            &["End of internship", "Seasonal work ended", "Retirement", "Career change"],
        );
        let fixture = Fixture::new(RuleSet::default(), data);
        let ctx = fixture.ctx();

        assert_eq!(admissible_reasons(&ctx, "CEO"), vec!["Career change".to_string()]);
        assert_eq!(
            admissible_reasons(&ctx, "Intern - Marketing"),
            vec!["End of internship".to_string(), "Career change".to_string()]
        );
        assert_eq!(
            admissible_reasons(&ctx, "Seasonal Worker"),
            vec!["Seasonal work ended".to_string(), "Career change".to_string()]
        );
    }

    #[test]
    fn test_empty_filter_falls_back_to_safe_reasons() {
        let mut data = InMemoryData::new();
        data.add_list(Category::TerminationReasons, LookupKey::any(), &["Early retirement"]);
        let fixture = Fixture::new(RuleSet::default(), data);
        let ctx = fixture.ctx();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let reason = termination_reason(&mut rng, &ctx, "Teacher");
            assert!(SAFE_REASONS.contains(&reason.as_str()));
        }
    }

    #[test]
    fn test_default_reasons_exclude_retirement() {
        let fixture = Fixture::new(RuleSet::default(), InMemoryData::new());
        let ctx = fixture.ctx();
        let reasons = admissible_reasons(&ctx, "Teacher");
        assert_eq!(reasons.len(), DEFAULT_REASONS.len() - 1);
        assert!(!reasons.iter().any(|r| r == "Retirement"));
    }
}
