//! Name Generation
//!
//! First names are drawn from the provider for the person's age bucket,
//! falling back to the nearest bucket that has names and finally to the
//! built-in lists below. Surnames follow the country's naming system: one
//! surname (optionally with gendered forms) or two inherited surnames.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::buckets::AgeBucket;
use crate::components::{Gender, PersonName};
use crate::error::Recoverable;
use crate::provider::{CategoricalData, Category, LookupKey};
use crate::rules::{pick_weighted, NameOrder, RuleSet};

/// Used when the provider has no first names at all.
const MALE_FIRST_NAMES: &[&str] = &[
    "James", "John", "Robert", "Michael", "William", "David", "Richard", "Joseph",
    "Thomas", "Charles", "Daniel", "Matthew", "Anthony", "Mark", "Paul", "Andrew",
    "George", "Edward", "Peter", "Henry", "Samuel", "Walter", "Harold", "Carl",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
    "Mary", "Patricia", "Jennifer", "Linda", "Barbara", "Elizabeth", "Susan",
    "Sarah", "Karen", "Nancy", "Margaret", "Dorothy", "Emily", "Carol", "Laura",
    "Helen", "Anna", "Ruth", "Maria", "Diane", "Joyce", "Evelyn", "Judith", "Joan",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Wilson", "Anderson", "Taylor", "Moore", "Martin", "Thompson", "White", "Harris",
    "Clark", "Lewis", "Walker", "Young", "Allen", "King", "Wright", "Hill",
];

/// Resample attempts before a unique name gets a numeric suffix.
pub const UNIQUE_NAME_ATTEMPTS: usize = 50;

pub struct Namer<'a> {
    rules: &'a RuleSet,
    data: &'a dyn CategoricalData,
}

impl<'a> Namer<'a> {
    pub fn new(rules: &'a RuleSet, data: &'a dyn CategoricalData) -> Self {
        Self { rules, data }
    }

    /// First name for someone aged `age`, looked up `offset` buckets away
    /// (+2 for parents, -2 for children).
    pub fn first_name<R: Rng + ?Sized>(&self, rng: &mut R, gender: Gender, age: u32, offset: i32) -> String {
        let target = AgeBucket::resolve(age, self.rules).offset(offset);

        let mut order: Vec<AgeBucket> = AgeBucket::ALL.to_vec();
        order.sort_by_key(|b| (b.index() as i32 - target.index() as i32).abs());

        for bucket in order {
            let names = self
                .data
                .lookup_weighted(Category::FirstNames, &LookupKey::any().bucket(bucket).gender(gender));
            if let Some(name) = pick_weighted(rng, &names) {
                return name.to_string();
            }
        }

        debug!("{}", Recoverable::DataUnavailable(Category::FirstNames));
        let fallback = if gender.is_male() { MALE_FIRST_NAMES } else { FEMALE_FIRST_NAMES };
        fallback.choose(rng).copied().unwrap_or("Alex").to_string()
    }

    /// A random surname in its `gender` form.
    pub fn surname<R: Rng + ?Sized>(&self, rng: &mut R, gender: Gender) -> String {
        let key = if self.rules.gendered_surnames {
            LookupKey::any().gender(gender)
        } else {
            LookupKey::any()
        };
        let surnames = self.data.lookup_weighted(Category::Surnames, &key);
        match pick_weighted(rng, &surnames) {
            Some(s) => s.to_string(),
            None => {
                debug!("{}", Recoverable::DataUnavailable(Category::Surnames));
                LAST_NAMES.choose(rng).copied().unwrap_or("Doe").to_string()
            }
        }
    }

    /// Fresh surnames for someone outside the anchor's line (partners, in-laws).
    pub fn random_surnames<R: Rng + ?Sized>(&self, rng: &mut R, gender: Gender) -> Vec<String> {
        (0..self.rules.surname_count).map(|_| self.surname(rng, gender)).collect()
    }

    /// Converts a surname to its `gender` form by position in the gendered lists.
    /// Unknown surnames are returned unchanged.
    pub fn adapt_surname(&self, surname: &str, gender: Gender) -> String {
        if !self.rules.gendered_surnames {
            return surname.to_string();
        }
        let source = self
            .data
            .lookup(Category::Surnames, &LookupKey::any().gender(gender.opposite()));
        let target = self.data.lookup(Category::Surnames, &LookupKey::any().gender(gender));
        source
            .iter()
            .position(|s| s == surname)
            .and_then(|i| target.get(i))
            .cloned()
            .unwrap_or_else(|| surname.to_string())
    }

    pub fn anchor_name<R: Rng + ?Sized>(&self, rng: &mut R, gender: Gender, age: u32) -> PersonName {
        PersonName::new(self.first_name(rng, gender, age, 0), self.random_surnames(rng, gender))
    }

    /// Father inherits the anchor's first surname, mother the second one.
    pub fn parent_surnames<R: Rng + ?Sized>(&self, rng: &mut R, anchor: &PersonName, parent: Gender) -> Vec<String> {
        if self.rules.surname_count >= 2 {
            let idx = if parent.is_male() { 0 } else { 1 };
            let inherited = anchor
                .surnames
                .get(idx)
                .cloned()
                .unwrap_or_else(|| self.surname(rng, parent));
            return vec![inherited, self.surname(rng, parent)];
        }
        if parent.is_male() {
            anchor
                .surnames
                .iter()
                .map(|s| self.adapt_surname(s, parent))
                .collect()
        } else {
            // Mother keeps her maiden name.
            self.random_surnames(rng, parent)
        }
    }

    pub fn sibling_surnames(&self, anchor: &PersonName, sibling: Gender) -> Vec<String> {
        anchor
            .surnames
            .iter()
            .map(|s| self.adapt_surname(s, sibling))
            .collect()
    }

    /// A child's surnames come from the father's first surname, then the
    /// mother's, in two-surname countries; otherwise from the father alone.
    pub fn child_surnames(
        &self,
        anchor: &PersonName,
        anchor_gender: Gender,
        partner: &PersonName,
        child: Gender,
    ) -> Vec<String> {
        let (father, mother) = if anchor_gender.is_male() { (anchor, partner) } else { (partner, anchor) };
        let father_first = father.primary_surname().unwrap_or_default().to_string();
        if self.rules.surname_count >= 2 {
            let mother_first = mother.primary_surname().unwrap_or_default().to_string();
            return vec![father_first, mother_first];
        }
        vec![self.adapt_surname(&father_first, child)]
    }

    pub fn full_name(&self, name: &PersonName) -> String {
        let surnames = name.surnames.join(" ");
        match self.rules.name_order {
            NameOrder::GivenFirst => format!("{} {}", name.first, surnames).trim().to_string(),
            NameOrder::SurnameFirst => format!("{} {}", surnames, name.first).trim().to_string(),
        }
    }
}

/// Hands out first names that are unique within one group of relatives.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_string());
    }

    /// Draws until an unused name comes up; after `UNIQUE_NAME_ATTEMPTS`
    /// misses the last draw gets a numeric suffix.
    pub fn allocate<F>(&mut self, mut draw: F) -> String
    where
        F: FnMut() -> String,
    {
        let mut candidate = String::new();
        for _ in 0..UNIQUE_NAME_ATTEMPTS {
            candidate = draw();
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }

        let mut n = self.used.len();
        let mut suffixed = format!("{}{}", candidate, n);
        while self.used.contains(&suffixed) {
            n += 1;
            suffixed = format!("{}{}", candidate, n);
        }
        self.used.insert(suffixed.clone());
        suffixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fallback_names_when_provider_is_empty() {
        let rules = RuleSet::default();
        let data = InMemoryData::new();
        let namer = Namer::new(&rules, &data);
        let mut rng = StdRng::seed_from_u64(11);

        let first = namer.first_name(&mut rng, Gender::Male, 30, 0);
        assert!(MALE_FIRST_NAMES.contains(&first.as_str()));

        let first = namer.first_name(&mut rng, Gender::Female, 30, 0);
        assert!(FEMALE_FIRST_NAMES.contains(&first.as_str()));

        let last = namer.surname(&mut rng, Gender::Female);
        assert!(LAST_NAMES.contains(&last.as_str()));
    }

    #[test]
    fn test_nearest_bucket_lookup() {
        let rules = RuleSet::default();
        let mut data = InMemoryData::new();
        data.add_list(
            Category::FirstNames,
            LookupKey::any().bucket(AgeBucket::Elderly).gender(Gender::Female),
            &["Dolores"],
        );
        let namer = Namer::new(&rules, &data);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(namer.first_name(&mut rng, Gender::Female, 20, 0), "Dolores");
    }

    #[test]
    fn test_unique_names_get_suffix() {
        let mut names = NameAllocator::new();
        names.reserve("Ana");
        let mut calls = 0;
        let name = names.allocate(|| {
            calls += 1;
            "Ana".to_string()
        });
        assert_eq!(calls, UNIQUE_NAME_ATTEMPTS);
        assert_eq!(name, "Ana1");
        assert_eq!(names.allocate(|| "Ana".to_string()), "Ana2");
    }

    #[test]
    fn test_two_surname_inheritance() {
        let rules = RuleSet {
            surname_count: 2,
            ..RuleSet::default()
        };
        let data = InMemoryData::new();
        let namer = Namer::new(&rules, &data);
        let mut rng = StdRng::seed_from_u64(9);

        let anchor = PersonName::new("Lucia", vec!["Garcia".into(), "Lopez".into()]);
        assert_eq!(namer.parent_surnames(&mut rng, &anchor, Gender::Male)[0], "Garcia");
        assert_eq!(namer.parent_surnames(&mut rng, &anchor, Gender::Female)[0], "Lopez");

        let partner = PersonName::new("Pablo", vec!["Ruiz".into(), "Diaz".into()]);
        let child = namer.child_surnames(&anchor, Gender::Female, &partner, Gender::Male);
        assert_eq!(child, vec!["Ruiz".to_string(), "Garcia".to_string()]);
    }

    #[test]
    fn test_gendered_surnames() {
        let rules = RuleSet {
            gendered_surnames: true,
            ..RuleSet::default()
        };
        let mut data = InMemoryData::new();
        data.add_list(Category::Surnames, LookupKey::any().gender(Gender::Male), &["Novak", "Dvorak"])
            .add_list(Category::Surnames, LookupKey::any().gender(Gender::Female), &["Novakova", "Dvorakova"]);
        let namer = Namer::new(&rules, &data);
        assert_eq!(namer.adapt_surname("Dvorak", Gender::Female), "Dvorakova");
        assert_eq!(namer.adapt_surname("Novakova", Gender::Male), "Novak");
        assert_eq!(namer.adapt_surname("Smith", Gender::Female), "Smith");
    }

    #[test]
    fn test_name_order() {
        let rules = RuleSet {
            name_order: NameOrder::SurnameFirst,
            ..RuleSet::default()
        };
        let data = InMemoryData::new();
        let namer = Namer::new(&rules, &data);
        let name = PersonName::new("Hiro", vec!["Tanaka".into()]);
        assert_eq!(namer.full_name(&name), "Tanaka Hiro");
    }
}
