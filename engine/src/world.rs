//! Identity Generator - main orchestrator
//!
//! Runs the generation systems in dependency order (anchor, traits,
//! education, languages, family, employment, contact), then cross-validates
//! the record. A component that fails validation is regenerated on its own;
//! after `MAX_REGENERATIONS` failed attempts it is replaced by its smallest
//! valid form (usually nothing at all) and the record is returned.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::calendar::birth_date_for_age;
use crate::components::{Gender, Identity, IdentityStatus, MaritalStatus, SocialClass};
use crate::error::{GenerationError, Result};
use crate::provider::CategoricalData;
use crate::rules::RuleSet;
use crate::systems::education::build_education;
use crate::systems::employment::{minor_student, JobCatalog};
use crate::systems::family::{build_parent_line, build_partner_line};
use crate::systems::languages::{build_languages, minimal_languages};
use crate::systems::{build_employment, build_family, traits, Anchor, GenContext};
use crate::validate::{validate, Component, Violation};

/// Regeneration attempts per failing component.
pub const MAX_REGENERATIONS: usize = 3;

/// Whole-record attempts when the anchor itself is inconsistent.
pub const MAX_RECORD_ATTEMPTS: usize = 3;

/// What the caller wants. Unset fields are drawn from the rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub gender: Option<Gender>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub social_class: Option<SocialClass>,
}

impl GenerationRequest {
    pub fn aged(min_age: u32, max_age: u32) -> Self {
        Self {
            min_age: Some(min_age),
            max_age: Some(max_age),
            ..Self::default()
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_class(mut self, class: SocialClass) -> Self {
        self.social_class = Some(class);
        self
    }
}

pub struct IdentityGenerator {
    rules: RuleSet,
    data: Arc<dyn CategoricalData>,
    jobs: JobCatalog,
    today: NaiveDate,
}

impl IdentityGenerator {
    /// Validates the rule set once; every later generation trusts it.
    pub fn new(rules: RuleSet, data: Arc<dyn CategoricalData>) -> Result<Self> {
        rules.validate()?;
        let jobs = JobCatalog::new(&rules, data.as_ref());
        Ok(Self {
            rules,
            data,
            jobs,
            today: Utc::now().date_naive(),
        })
    }

    /// Pins "today" so runs are reproducible across days.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn jobs(&self) -> &JobCatalog {
        &self.jobs
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn ctx(&self) -> GenContext<'_> {
        GenContext {
            rules: &self.rules,
            data: self.data.as_ref(),
            jobs: &self.jobs,
            today: self.today,
        }
    }

    pub fn generate_seeded(&self, seed: u64, request: &GenerationRequest) -> Result<Identity> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.generate(&mut rng, request)
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, request: &GenerationRequest) -> Result<Identity> {
        let (min_age, max_age) = self.age_range(request)?;

        let mut last: Vec<Violation> = Vec::new();
        for attempt in 1..=MAX_RECORD_ATTEMPTS {
            let identity = self.build(rng, request, min_age, max_age);
            last = self.violations(&identity, Component::Anchor);
            if last.is_empty() {
                return Ok(identity);
            }
            debug!("anchor rejected on attempt {}: {}", attempt, last[0]);
        }
        Err(GenerationError::Inconsistent {
            attempts: MAX_RECORD_ATTEMPTS,
            detail: last.first().map(|v| v.to_string()).unwrap_or_default(),
        })
    }

    fn age_range(&self, request: &GenerationRequest) -> Result<(u32, u32)> {
        let min_age = request.min_age.unwrap_or(self.rules.min_age);
        let max_age = request.max_age.unwrap_or(self.rules.max_age);
        if min_age > max_age {
            return Err(GenerationError::InvalidRequest(format!(
                "minimum age {} exceeds maximum age {}",
                min_age, max_age
            )));
        }
        if min_age < self.rules.min_age || max_age > self.rules.max_age {
            return Err(GenerationError::InvalidRequest(format!(
                "age range {}-{} outside the country's {}-{}",
                min_age, max_age, self.rules.min_age, self.rules.max_age
            )));
        }
        Ok((min_age, max_age))
    }

    fn violations(&self, identity: &Identity, component: Component) -> Vec<Violation> {
        validate(identity, &self.rules, &self.jobs, self.today)
            .into_iter()
            .filter(|v| v.component == component)
            .collect()
    }

    fn build<R: Rng + ?Sized>(&self, rng: &mut R, request: &GenerationRequest, min_age: u32, max_age: u32) -> Identity {
        let ctx = self.ctx();
        let rules = &self.rules;
        let namer = ctx.namer();

        // Anchor
        let gender = request
            .gender
            .unwrap_or_else(|| if rng.gen_bool(0.5) { Gender::Male } else { Gender::Female });
        let age = rng.gen_range(min_age..=max_age);
        let birth_date = birth_date_for_age(rng, age, self.today);
        let class = request
            .social_class
            .unwrap_or_else(|| rules.sample_social_class(rng));
        let name = namer.anchor_name(rng, gender, age);

        // Traits
        let physical = traits::physical_traits(rng, &ctx, age, gender);
        let religion = traits::religion(rng, &ctx, age);
        let hobbies = traits::hobbies(rng, &ctx, age, gender, class);
        let characteristics = traits::characteristics(rng, &ctx, age, gender);

        let education = build_education(rng, &ctx, age, class);
        let languages = build_languages(rng, &ctx, age, class, &education);

        let anchor = Anchor {
            gender,
            age,
            birth_date,
            bucket: ctx.bucket(age),
            class,
            name: name.clone(),
            education: education.clone(),
        };

        let family = build_family(rng, &ctx, &anchor);
        let employment = Some(build_employment(rng, &ctx, &anchor));
        let residence = traits::residence(rng, &ctx);
        let phone = traits::phone_number(rng, &ctx);

        let mut identity = Identity {
            country: rules.country.clone(),
            gender,
            full_name: namer.full_name(&name),
            name,
            birth_date,
            age,
            social_class: class,
            education,
            employment,
            physical,
            religion,
            languages,
            hobbies,
            characteristics,
            phone,
            residence,
            considerations: traits::considerations(&ctx),
            family,
            status: IdentityStatus::Created,
        };
        self.repair(rng, &ctx, &anchor, &mut identity);
        identity
    }

    /// Replaces `component` with its smallest form that passes validation on
    /// its own. Dropping a parent or union also drops what depends on it.
    fn omit(&self, identity: &mut Identity, component: Component) {
        let family = &mut identity.family;
        match component {
            Component::Anchor => {}
            Component::Parents => {
                family.father = None;
                family.mother = None;
                family.siblings.clear();
            }
            Component::Siblings => family.siblings.clear(),
            Component::Unions => {
                family.marital_status = MaritalStatus::Single;
                family.unions.clear();
                family.children.clear();
                family.relationships.clear();
            }
            Component::Children => family.children.clear(),
            // Minors always carry the student record.
            Component::Employment => identity.employment = (identity.age < 18).then(minor_student),
            Component::Languages => {
                identity.languages = minimal_languages(&self.rules, identity.age, &identity.education);
            }
            Component::Characteristics => identity.characteristics.clear(),
        }
    }

    /// Components other than the anchor that fail validation.
    fn flagged(&self, identity: &Identity) -> HashSet<Component> {
        validate(identity, &self.rules, &self.jobs, self.today)
            .into_iter()
            .map(|v| v.component)
            .filter(|c| *c != Component::Anchor)
            .collect()
    }

    /// Regenerates flagged components until the record validates or the
    /// budget runs out, then falls back to the minimal form of whatever is
    /// still flagged.
    fn repair<R: Rng + ?Sized>(&self, rng: &mut R, ctx: &GenContext<'_>, anchor: &Anchor, identity: &mut Identity) {
        for round in 0..=MAX_REGENERATIONS {
            let flagged = self.flagged(identity);
            if flagged.is_empty() {
                return;
            }

            if round == MAX_REGENERATIONS {
                for component in flagged {
                    warn!("dropping {:?} after {} regenerations", component, MAX_REGENERATIONS);
                    self.omit(identity, component);
                }
                let left = self.flagged(identity);
                debug_assert!(left.is_empty(), "still invalid after omitting: {:?}", left);
                return;
            }

            for component in flagged {
                debug!("regenerating {:?} (round {})", component, round + 1);
                regenerate(rng, ctx, anchor, identity, component);
            }
        }
    }
}

fn regenerate<R: Rng + ?Sized>(
    rng: &mut R,
    ctx: &GenContext<'_>,
    anchor: &Anchor,
    identity: &mut Identity,
    component: Component,
) {
    let family = &mut identity.family;
    match component {
        Component::Anchor => {}
        Component::Parents | Component::Siblings => {
            let line = build_parent_line(rng, ctx, anchor);
            family.father = line.father;
            family.mother = line.mother;
            family.siblings = line.siblings;
        }
        Component::Unions | Component::Children => {
            let line = build_partner_line(rng, ctx, anchor);
            family.marital_status = line.marital_status;
            family.unions = line.unions;
            family.children = line.children;
            family.relationships = line.relationships;
        }
        Component::Employment => {
            identity.employment = Some(build_employment(rng, ctx, anchor));
        }
        Component::Languages => {
            identity.languages = build_languages(rng, ctx, anchor.age, anchor.class, &anchor.education);
        }
        Component::Characteristics => {
            identity.characteristics = traits::characteristics(rng, ctx, anchor.age, anchor.gender);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::{sample_data, sample_rules};
    use crate::systems::fixtures::today;

    fn generator() -> IdentityGenerator {
        IdentityGenerator::new(sample_rules(), Arc::new(sample_data()))
            .unwrap()
            .with_today(today())
    }

    #[test]
    fn test_inverted_request_rejected() {
        let gen = generator();
        let err = gen.generate_seeded(1, &GenerationRequest::aged(40, 30)).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_outside_rules_rejected() {
        let gen = generator();
        let max = gen.rules().max_age;
        let err = gen.generate_seeded(1, &GenerationRequest::aged(30, max + 1)).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[test]
    fn test_request_fields_honoured() {
        let gen = generator();
        let request = GenerationRequest::aged(40, 45)
            .with_gender(Gender::Female)
            .with_class(SocialClass::High);
        for seed in 0..50 {
            let identity = gen.generate_seeded(seed, &request).unwrap();
            assert!((40..=45).contains(&identity.age));
            assert_eq!(identity.gender, Gender::Female);
            assert_eq!(identity.social_class, SocialClass::High);
            assert_eq!(identity.status, IdentityStatus::Created);
        }
    }

    #[test]
    fn test_same_seed_same_identity() {
        let gen = generator();
        let request = GenerationRequest::default();
        assert_eq!(
            gen.generate_seeded(42, &request).unwrap(),
            gen.generate_seeded(42, &request).unwrap()
        );
    }

    #[test]
    fn test_generated_records_validate() {
        let gen = generator();
        for seed in 0..300 {
            let identity = gen.generate_seeded(seed, &GenerationRequest::default()).unwrap();
            let violations = validate(&identity, gen.rules(), gen.jobs(), gen.today());
            assert!(violations.is_empty(), "seed {}: {:?}", seed, violations);
        }
    }

    #[test]
    fn test_omitting_unions_clears_partner_line() {
        let gen = generator();
        let mut identity = gen
            .generate_seeded(3, &GenerationRequest::aged(50, 60))
            .unwrap();
        gen.omit(&mut identity, Component::Unions);
        assert_eq!(identity.family.marital_status, MaritalStatus::Single);
        assert!(identity.family.unions.is_empty());
        assert!(identity.family.children.is_empty());
        assert!(identity.family.relationships.is_empty());
    }

    #[test]
    fn test_omitting_languages_keeps_required_ones() {
        let gen = generator();
        let graduate = (0..200)
            .map(|seed| gen.generate_seeded(seed, &GenerationRequest::aged(25, 34)).unwrap())
            .find(|i| i.education.completed.is_higher())
            .expect("some young adult has a degree");

        let mut identity = graduate;
        gen.omit(&mut identity, Component::Languages);
        assert_eq!(identity.languages.len(), 2);
        assert_eq!(identity.languages[0].language, gen.rules().native_language);
        assert_eq!(identity.languages[1].language, gen.rules().primary_foreign_language);
        assert!(identity.languages[1].proficiency >= crate::components::Proficiency::Intermediate);
    }

    #[test]
    fn test_omitting_employment_keeps_minors_students() {
        let rules = RuleSet {
            min_age: 16,
            ..sample_rules()
        };
        let gen = IdentityGenerator::new(rules, Arc::new(sample_data()))
            .unwrap()
            .with_today(today());
        let mut minor = gen.generate_seeded(8, &GenerationRequest::aged(16, 17)).unwrap();
        gen.omit(&mut minor, Component::Employment);
        let employment = minor.employment.expect("minors keep a student record");
        assert_eq!(employment.occupation, "Student");

        let mut adult = generator().generate_seeded(8, &GenerationRequest::aged(30, 40)).unwrap();
        gen.omit(&mut adult, Component::Employment);
        assert!(adult.employment.is_none());
    }

    #[test]
    fn test_omitted_components_still_validate() {
        const ALL: [Component; 7] = [
            Component::Parents,
            Component::Siblings,
            Component::Unions,
            Component::Children,
            Component::Employment,
            Component::Languages,
            Component::Characteristics,
        ];
        let adults = generator();
        let minors = IdentityGenerator::new(
            RuleSet {
                min_age: 16,
                ..sample_rules()
            },
            Arc::new(sample_data()),
        )
        .unwrap()
        .with_today(today());

        for seed in 0..60 {
            let records = [
                (&adults, adults.generate_seeded(seed, &GenerationRequest::aged(25, 40)).unwrap()),
                (&adults, adults.generate_seeded(seed, &GenerationRequest::default()).unwrap()),
                (&minors, minors.generate_seeded(seed, &GenerationRequest::aged(16, 17)).unwrap()),
            ];
            for (gen, record) in &records {
                for component in ALL {
                    let mut trimmed = record.clone();
                    gen.omit(&mut trimmed, component);
                    let violations = validate(&trimmed, gen.rules(), gen.jobs(), gen.today());
                    assert!(violations.is_empty(), "seed {} without {:?}: {:?}", seed, component, violations);
                }
            }
        }
    }

    #[test]
    fn test_records_carry_residence_and_considerations() {
        let gen = generator();
        let identity = gen.generate_seeded(6, &GenerationRequest::default()).unwrap();
        let home = identity.residence.expect("sample country has cities");
        assert!(!home.city.is_empty());
        assert!(home.postal_code.is_some());
        assert_eq!(identity.considerations.len(), 3);
    }
}
