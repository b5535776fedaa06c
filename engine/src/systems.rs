//! Generation systems - each builds one part of an identity
//!
//! Systems are plain functions over a shared read-only `GenContext` and the
//! already-decided `Anchor`. They take the caller's RNG so a seeded run is
//! reproducible end to end.

pub mod death;
pub mod education;
pub mod employment;
pub mod family;
pub mod languages;
pub mod parents;
pub mod siblings;
pub mod termination;
pub mod traits;
pub mod unions;
pub mod children;

use chrono::{Datelike, NaiveDate};

use crate::buckets::AgeBucket;
use crate::components::{Education, Gender, PersonName, SocialClass};
use crate::provider::CategoricalData;
use crate::rules::RuleSet;
use employment::JobCatalog;

pub use employment::build_employment;
pub use family::build_family;

/// Read-only inputs shared by every system during one generation.
#[derive(Clone, Copy)]
pub struct GenContext<'a> {
    pub rules: &'a RuleSet,
    pub data: &'a dyn CategoricalData,
    pub jobs: &'a JobCatalog,
    pub today: NaiveDate,
}

impl<'a> GenContext<'a> {
    pub fn current_year(&self) -> i32 {
        self.today.year()
    }

    pub fn bucket(&self, age: u32) -> AgeBucket {
        AgeBucket::resolve(age, self.rules)
    }

    pub fn namer(&self) -> crate::names::Namer<'a> {
        crate::names::Namer::new(self.rules, self.data)
    }
}

/// The person a record is about, as far as it is decided before family and
/// employment are built.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub gender: Gender,
    pub age: u32,
    pub birth_date: NaiveDate,
    pub bucket: AgeBucket,
    pub class: SocialClass,
    pub name: PersonName,
    pub education: Education,
}

impl Anchor {
    pub fn birth_year(&self) -> i32 {
        self.birth_date.year()
    }
}
