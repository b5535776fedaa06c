//! Country Rule Configuration
//!
//! A `RuleSet` holds every country parameter generation reads: age bounds,
//! fertility window, death tables, marriage ages, weighted trait tables and
//! formats. It is parsed from the line-based `key=value` rules format, checked
//! once by `validate`, and then only ever shared immutably.
//!
//! ```text
//! # comments start with '#'
//! life_expectancy=83
//! hair_colors=Black:35,Brown:30,Blonde:4
//! salary_middle=25000-50000
//! ```

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buckets::AgeBucket;
use crate::components::{Proficiency, SocialClass};
use crate::error::ConfigError;

// ============================================================================
// Value Types
// ============================================================================

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        let (lo, hi) = value
            .split_once('-')
            .or_else(|| value.split_once(','))
            .ok_or_else(|| invalid(key, value))?;
        Ok(Bounds::new(number(key, lo)?, number(key, hi)?))
    }

    fn check(&self, field: &str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                field: field.to_string(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// One value per social class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassTable<T> {
    pub low: T,
    pub middle: T,
    pub upper_middle: T,
    pub high: T,
}

impl<T> ClassTable<T> {
    pub fn get(&self, class: SocialClass) -> &T {
        match class {
            SocialClass::Low => &self.low,
            SocialClass::Middle => &self.middle,
            SocialClass::UpperMiddle => &self.upper_middle,
            SocialClass::High => &self.high,
        }
    }

    fn get_mut(&mut self, class: SocialClass) -> &mut T {
        match class {
            SocialClass::Low => &mut self.low,
            SocialClass::Middle => &mut self.middle,
            SocialClass::UpperMiddle => &mut self.upper_middle,
            SocialClass::High => &mut self.high,
        }
    }
}

/// Ordered `(label, weight)` table. Weights are normalized at sampling time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightedTable {
    entries: Vec<(String, f64)>,
}

impl WeightedTable {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self::new(pairs.iter().map(|(l, w)| (l.to_string(), *w)).collect())
    }

    /// Parses `Label:weight,Label:weight`. A label without weight counts 10.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigError> {
        let mut entries = Vec::new();
        for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match item.rsplit_once(':') {
                Some((label, weight)) => {
                    let weight: f64 = weight
                        .trim()
                        .parse()
                        .map_err(|_| invalid(key, item))?;
                    entries.push((label.trim().to_string(), weight));
                }
                None => entries.push((item.to_string(), 10.0)),
            }
        }
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn weight(&self, label: &str) -> f64 {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    pub fn most_common(&self) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(_, w)| *w > 0.0)
            .fold(None::<&(String, f64)>, |best, e| match best {
                Some(b) if b.1 >= e.1 => Some(b),
                _ => Some(e),
            })
            .map(|(l, _)| l.as_str())
    }

    /// Returns a copy with every weight multiplied by `factor(label)`.
    pub fn scaled<F: Fn(&str) -> f64>(&self, factor: F) -> WeightedTable {
        WeightedTable::new(
            self.entries
                .iter()
                .map(|(l, w)| (l.clone(), w * factor(l)))
                .collect(),
        )
    }

    /// Returns a copy with `label` appended at `weight` unless already present.
    pub fn with_entry(&self, label: &str, weight: f64) -> WeightedTable {
        let mut entries = self.entries.clone();
        if !entries.iter().any(|(l, _)| l == label) {
            entries.push((label.to_string(), weight));
        }
        WeightedTable::new(entries)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w.max(0.0)).sum()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        pick_weighted(rng, &self.entries)
    }

    fn check(&self, field: &str) -> Result<(), ConfigError> {
        for (label, weight) in &self.entries {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    field: field.to_string(),
                    label: label.clone(),
                    weight: *weight,
                });
            }
        }
        if self.entries.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(ConfigError::EmptyDistribution {
                field: field.to_string(),
            });
        }
        Ok(())
    }
}

/// Cumulative weighted draw. Zero-weight labels are never chosen; `None` when
/// nothing has positive weight.
pub fn pick_weighted<'a, R: Rng + ?Sized>(rng: &mut R, items: &'a [(String, f64)]) -> Option<&'a str> {
    let dist = WeightedIndex::new(items.iter().map(|(_, w)| w.max(0.0))).ok()?;
    Some(items[dist.sample(rng)].0.as_str())
}

/// Death probability (percent) per relation, keyed by the anchor's bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathTable {
    pub parents: [f64; 7],
    pub siblings: [f64; 7],
    pub children: [f64; 7],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathRole {
    Parents,
    Siblings,
    Children,
}

impl DeathTable {
    pub fn probability(&self, role: DeathRole, anchor_bucket: AgeBucket) -> f64 {
        let row = match role {
            DeathRole::Parents => &self.parents,
            DeathRole::Siblings => &self.siblings,
            DeathRole::Children => &self.children,
        };
        row[anchor_bucket.index()]
    }

    fn row_mut(&mut self, role: &str) -> Option<&mut [f64; 7]> {
        match role {
            "parents" => Some(&mut self.parents),
            "siblings" => Some(&mut self.siblings),
            "children" => Some(&mut self.children),
            _ => None,
        }
    }
}

impl Default for DeathTable {
    fn default() -> Self {
        Self {
            parents: [2.0, 5.0, 15.0, 35.0, 65.0, 95.0, 99.0],
            siblings: [1.0, 1.0, 2.0, 5.0, 12.0, 30.0, 45.0],
            children: [1.0, 1.0, 1.0, 2.0, 3.0, 5.0, 8.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameOrder {
    GivenFirst,
    SurnameFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneFormat {
    pub country_code: String,
    /// `#` marks a digit, anything else is copied.
    pub pattern: String,
    pub length: u32,
    pub prefixes: Vec<String>,
}

// ============================================================================
// RuleSet
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub country: String,

    // Demographic bounds
    pub min_age: u32,
    pub max_age: u32,
    pub life_expectancy: u32,
    pub longevity_slack: u32,

    // Family
    pub fertility_min: u32,
    pub fertility_max: u32,
    pub parent_min_age_gap: u32,
    pub parent_max_age_gap: u32,
    pub sibling_probability: f64,
    pub average_siblings: f64,
    pub min_siblings: u32,
    pub max_siblings: u32,
    pub twin_probability: f64,
    pub max_same_age: u32,
    pub average_children: f64,
    pub min_children: u32,
    pub max_children: u32,
    pub death_prob: DeathTable,
    pub marriage_age: ClassTable<Bounds>,

    // Work
    pub unemployment_rate: f64,
    pub jobless_rate: f64,
    pub retirement_age: u32,
    pub basic_jobs: Vec<String>,
    pub basic_job_min_age: u32,
    pub default_job_min_age: u32,
    pub internship_min_age: u32,
    pub job_min_ages: BTreeMap<String, u32>,
    pub salary: ClassTable<Bounds>,
    pub pension: ClassTable<Bounds>,
    pub currency_code: String,
    pub currency_symbol: String,

    // Traits
    pub social_classes: WeightedTable,
    pub hair_colors: WeightedTable,
    pub eye_colors: WeightedTable,
    pub skin_tones: WeightedTable,
    pub religions: WeightedTable,

    // Languages
    pub native_language: String,
    pub primary_foreign_language: String,
    pub young_language_age: u32,
    pub available_languages: WeightedTable,
    pub language_levels: WeightedTable,
    pub min_languages: u32,
    pub max_languages: u32,

    // Formats
    pub name_order: NameOrder,
    pub surname_count: u32,
    pub gendered_surnames: bool,
    pub date_format: String,
    pub phone: PhoneFormat,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            country: "default".to_string(),
            min_age: 18,
            max_age: 80,
            life_expectancy: 80,
            longevity_slack: 5,
            fertility_min: 15,
            fertility_max: 45,
            parent_min_age_gap: 18,
            parent_max_age_gap: 45,
            sibling_probability: 50.0,
            average_siblings: 1.2,
            min_siblings: 0,
            max_siblings: 3,
            twin_probability: 15.0,
            max_same_age: 3,
            average_children: 2.0,
            min_children: 1,
            max_children: 4,
            death_prob: DeathTable::default(),
            marriage_age: ClassTable {
                low: Bounds::new(22, 24),
                middle: Bounds::new(22, 24),
                upper_middle: Bounds::new(18, 20),
                high: Bounds::new(18, 20),
            },
            unemployment_rate: 10.0,
            jobless_rate: 2.0,
            retirement_age: 65,
            basic_jobs: ["Cashier", "Cleaner", "Waiter", "Shop Assistant", "Delivery Driver"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            basic_job_min_age: 16,
            default_job_min_age: 18,
            internship_min_age: 18,
            job_min_ages: BTreeMap::new(),
            salary: ClassTable {
                low: Bounds::new(15_000, 25_000),
                middle: Bounds::new(25_000, 50_000),
                upper_middle: Bounds::new(50_000, 100_000),
                high: Bounds::new(100_000, 300_000),
            },
            pension: ClassTable {
                low: Bounds::new(8_000, 16_000),
                middle: Bounds::new(15_000, 30_000),
                upper_middle: Bounds::new(28_000, 55_000),
                high: Bounds::new(50_000, 120_000),
            },
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            social_classes: WeightedTable::from_pairs(&[
                ("low", 25.0),
                ("middle", 50.0),
                ("upper-middle", 20.0),
                ("high", 5.0),
            ]),
            hair_colors: WeightedTable::from_pairs(&[
                ("Black", 35.0),
                ("Brown", 30.0),
                ("Dark Brown", 20.0),
                ("Light Brown", 10.0),
                ("Blonde", 4.0),
                ("Red", 1.0),
            ]),
            eye_colors: WeightedTable::from_pairs(&[
                ("Brown", 50.0),
                ("Dark Brown", 30.0),
                ("Light Brown", 10.0),
                ("Green", 5.0),
                ("Blue", 4.0),
                ("Hazel", 1.0),
            ]),
            skin_tones: WeightedTable::from_pairs(&[
                ("Light", 40.0),
                ("Medium", 30.0),
                ("Olive", 15.0),
                ("Tan", 10.0),
                ("Dark", 5.0),
            ]),
            religions: WeightedTable::from_pairs(&[
                ("Christian", 50.0),
                ("Atheist", 40.0),
                ("Agnostic", 8.0),
                ("Other", 2.0),
            ]),
            native_language: "English".to_string(),
            primary_foreign_language: "English".to_string(),
            young_language_age: 30,
            available_languages: WeightedTable::from_pairs(&[("English", 70.0)]),
            language_levels: WeightedTable::from_pairs(&[
                ("basic", 30.0),
                ("intermediate", 50.0),
                ("advanced", 20.0),
            ]),
            min_languages: 1,
            max_languages: 4,
            name_order: NameOrder::GivenFirst,
            surname_count: 1,
            gendered_surnames: false,
            date_format: "DD/MM/YYYY".to_string(),
            phone: PhoneFormat {
                country_code: "+1".to_string(),
                pattern: "### ### ####".to_string(),
                length: 10,
                prefixes: vec!["6".to_string()],
            },
        }
    }
}

impl RuleSet {
    /// Parses and validates a rules document on top of the defaults.
    pub fn parse(text: &str) -> Result<RuleSet, ConfigError> {
        let mut rules = RuleSet::default();
        let mut max_age_set = false;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::Malformed {
                line: idx + 1,
                text: line.to_string(),
            })?;
            let key = key.trim();
            max_age_set |= key == "max_age";
            rules.apply(key, value.trim())?;
        }

        if !max_age_set {
            rules.max_age = rules.life_expectancy;
        }
        rules.validate()?;
        Ok(rules)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "country" => self.country = value.to_string(),
            "min_age" => self.min_age = number(key, value)?,
            "max_age" => self.max_age = number(key, value)?,
            "life_expectancy" => self.life_expectancy = number(key, value)?,
            "longevity_slack" => self.longevity_slack = number(key, value)?,
            "female_fertility_min_age" | "fertility_min" => self.fertility_min = number(key, value)?,
            "female_fertility_max_age" | "fertility_max" => self.fertility_max = number(key, value)?,
            "parent_min_age_gap" => self.parent_min_age_gap = number(key, value)?,
            "parent_max_age_gap" => self.parent_max_age_gap = number(key, value)?,
            "sibling_probability" => self.sibling_probability = real(key, value)?,
            "average_siblings" => self.average_siblings = real(key, value)?,
            "min_siblings" => self.min_siblings = number(key, value)?,
            "max_siblings" => self.max_siblings = number(key, value)?,
            "twin_probability" => self.twin_probability = real(key, value)?,
            "max_same_age" => self.max_same_age = number(key, value)?,
            "average_children" => self.average_children = real(key, value)?,
            "min_children" => self.min_children = number(key, value)?,
            "max_children" => self.max_children = number(key, value)?,
            "unemployment_rate" => self.unemployment_rate = real(key, value)?,
            "jobless_rate" => self.jobless_rate = real(key, value)?,
            "retirement_age" => self.retirement_age = number(key, value)?,
            "basic_jobs" => self.basic_jobs = list(value),
            "basic_job_min_age" => self.basic_job_min_age = number(key, value)?,
            "default_job_min_age" => self.default_job_min_age = number(key, value)?,
            "internship_min_age" => self.internship_min_age = number(key, value)?,
            "job_min_ages" => {
                for (title, age) in WeightedTable::parse(key, value)?.entries {
                    self.job_min_ages.insert(title, age as u32);
                }
            }
            "currency_code" => self.currency_code = value.to_string(),
            "currency_symbol" => self.currency_symbol = value.to_string(),
            "social_classes" => self.social_classes = WeightedTable::parse(key, value)?,
            "hair_colors" => self.hair_colors = WeightedTable::parse(key, value)?,
            "eye_colors" => self.eye_colors = WeightedTable::parse(key, value)?,
            "skin_tones" => self.skin_tones = WeightedTable::parse(key, value)?,
            "religions" => self.religions = WeightedTable::parse(key, value)?,
            "native_language" => self.native_language = value.to_string(),
            "primary_foreign_language" => self.primary_foreign_language = value.to_string(),
            "young_language_age" => self.young_language_age = number(key, value)?,
            "available_languages" => self.available_languages = WeightedTable::parse(key, value)?,
            "language_level_basic" => self.set_level("basic", real(key, value)?),
            "language_level_intermediate" => self.set_level("intermediate", real(key, value)?),
            "language_level_advanced" => self.set_level("advanced", real(key, value)?),
            "min_languages" => self.min_languages = number(key, value)?,
            "max_languages" => self.max_languages = number(key, value)?,
            "name_order" => {
                self.name_order = if value.trim_start().starts_with("surname") {
                    NameOrder::SurnameFirst
                } else {
                    NameOrder::GivenFirst
                }
            }
            "surname_count" => self.surname_count = number(key, value)?,
            "gendered_surnames" => self.gendered_surnames = flag(key, value)?,
            "date_format" => self.date_format = value.to_string(),
            "phone_country_code" => self.phone.country_code = value.to_string(),
            "phone_format" => self.phone.pattern = value.to_string(),
            "phone_length" => self.phone.length = number(key, value)?,
            "phone_prefixes" | "phone_mobile_prefixes" => self.phone.prefixes = list(value),
            _ => {
                if let Some(rest) = key.strip_prefix("death_prob_") {
                    return self.apply_death_prob(key, rest, value);
                }
                if let Some(class) = key.strip_prefix("salary_") {
                    *self.salary.get_mut(class_key(key, class)?) = Bounds::parse(key, value)?;
                } else if let Some(class) = key.strip_prefix("pension_") {
                    *self.pension.get_mut(class_key(key, class)?) = Bounds::parse(key, value)?;
                } else if let Some(class) = key.strip_prefix("marriage_age_") {
                    *self.marriage_age.get_mut(class_key(key, class)?) = Bounds::parse(key, value)?;
                } else {
                    debug!("ignoring unknown rule '{}'", key);
                }
            }
        }
        Ok(())
    }

    fn apply_death_prob(&mut self, key: &str, rest: &str, value: &str) -> Result<(), ConfigError> {
        let (role, bucket) = rest.split_once('_').ok_or_else(|| invalid(key, value))?;
        let bucket = AgeBucket::from_key(bucket).ok_or_else(|| invalid(key, value))?;
        let row = self.death_prob.row_mut(role).ok_or_else(|| invalid(key, value))?;
        row[bucket.index()] = real(key, value)?;
        Ok(())
    }

    fn set_level(&mut self, level: &str, weight: f64) {
        let mut entries: Vec<(String, f64)> = self
            .language_levels
            .entries()
            .iter()
            .filter(|(l, _)| l != level)
            .cloned()
            .collect();
        entries.push((level.to_string(), weight));
        self.language_levels = WeightedTable::new(entries);
    }

    /// Rejects inconsistent parameters. Bounds are never swapped or clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Bounds::new(self.min_age, self.max_age).check("min_age/max_age")?;
        Bounds::new(self.fertility_min, self.fertility_max).check("fertility window")?;
        Bounds::new(self.parent_min_age_gap, self.parent_max_age_gap).check("parent age gap")?;
        Bounds::new(self.min_siblings, self.max_siblings).check("siblings")?;
        Bounds::new(self.min_children, self.max_children).check("children")?;
        Bounds::new(self.min_languages, self.max_languages).check("languages")?;

        if self.fertility_max < self.parent_min_age_gap || self.fertility_min > self.parent_max_age_gap {
            return Err(ConfigError::FertilityOutsideParentGap {
                fertility_min: self.fertility_min,
                fertility_max: self.fertility_max,
                gap_min: self.parent_min_age_gap,
                gap_max: self.parent_max_age_gap,
            });
        }

        for class in SocialClass::ALL {
            self.salary.get(class).check(&format!("salary_{}", class.label()))?;
            self.pension.get(class).check(&format!("pension_{}", class.label()))?;
            self.marriage_age
                .get(class)
                .check(&format!("marriage_age_{}", class.label()))?;
        }

        let percents = [
            ("sibling_probability", self.sibling_probability),
            ("twin_probability", self.twin_probability),
            ("unemployment_rate", self.unemployment_rate),
            ("jobless_rate", self.jobless_rate),
        ];
        for (field, value) in percents {
            check_percent(field, value)?;
        }
        for bucket in AgeBucket::ALL {
            let i = bucket.index();
            check_percent("death_prob_parents", self.death_prob.parents[i])?;
            check_percent("death_prob_siblings", self.death_prob.siblings[i])?;
            check_percent("death_prob_children", self.death_prob.children[i])?;
        }
        if !self.average_siblings.is_finite() || self.average_siblings < 0.0 {
            return Err(invalid("average_siblings", &self.average_siblings.to_string()));
        }
        if !self.average_children.is_finite() || self.average_children < 0.0 {
            return Err(invalid("average_children", &self.average_children.to_string()));
        }

        self.social_classes.check("social_classes")?;
        for label in self.social_classes.labels() {
            if SocialClass::from_label(label).is_none() {
                return Err(invalid("social_classes", label));
            }
        }
        self.hair_colors.check("hair_colors")?;
        self.eye_colors.check("eye_colors")?;
        self.skin_tones.check("skin_tones")?;
        self.religions.check("religions")?;
        self.available_languages.check("available_languages")?;
        self.language_levels.check("language_levels")?;
        for label in self.language_levels.labels() {
            if Proficiency::from_label(label).is_none() {
                return Err(invalid("language_levels", label));
            }
        }
        if self.surname_count == 0 || self.surname_count > 2 {
            return Err(invalid("surname_count", &self.surname_count.to_string()));
        }
        Ok(())
    }

    /// Oldest a living person can plausibly be.
    pub fn max_living_age(&self) -> u32 {
        self.life_expectancy.saturating_add(self.longevity_slack)
    }

    pub fn sample_social_class<R: Rng + ?Sized>(&self, rng: &mut R) -> SocialClass {
        self.social_classes
            .sample(rng)
            .and_then(SocialClass::from_label)
            .unwrap_or(SocialClass::Middle)
    }

    pub fn sample_language_level<R: Rng + ?Sized>(&self, rng: &mut R) -> Proficiency {
        self.language_levels
            .sample(rng)
            .and_then(Proficiency::from_label)
            .unwrap_or(Proficiency::Intermediate)
    }

    /// Renders a date with the `DD/MM/YYYY`-style country format.
    pub fn format_date(&self, date: chrono::NaiveDate) -> String {
        use chrono::Datelike;
        self.date_format
            .replace("YYYY", &format!("{:04}", date.year()))
            .replace("MM", &format!("{:02}", date.month()))
            .replace("DD", &format!("{:02}", date.day()))
    }

    /// Renders a yearly amount with the currency symbol and thousands separators.
    pub fn format_amount(&self, amount: u32) -> String {
        let digits = amount.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        format!("{}{}", self.currency_symbol, grouped)
    }
}

// ============================================================================
// Parsing helpers
// ============================================================================

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn number(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn real(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn class_key(key: &str, class: &str) -> Result<SocialClass, ConfigError> {
    SocialClass::from_label(class).ok_or_else(|| invalid(key, class))
}

fn check_percent(field: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::InvalidProbability {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(RuleSet::default().validate(), Ok(()));
    }

    #[test]
    fn test_parse_overrides_and_comments() {
        let rules = RuleSet::parse(
            "# sample\ncountry=ES\nlife_expectancy=83\nsurname_count=2\n\
             hair_colors=Black:50, Brown:50\nsalary_high=90000-200000\n\
             death_prob_parents_adults=20\nname_order=surname+first\n",
        )
        .unwrap();
        assert_eq!(rules.country, "ES");
        assert_eq!(rules.max_age, 83);
        assert_eq!(rules.surname_count, 2);
        assert_eq!(rules.hair_colors.entries().len(), 2);
        assert_eq!(*rules.salary.get(SocialClass::High), Bounds::new(90_000, 200_000));
        assert_eq!(rules.death_prob.probability(DeathRole::Parents, AgeBucket::Adults), 20.0);
        assert_eq!(rules.name_order, NameOrder::SurnameFirst);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = RuleSet::parse("female_fertility_min_age=45\nfemale_fertility_max_age=15").unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { .. }));

        let err = RuleSet::parse("min_age=50\nmax_age=30").unwrap_err();
        assert!(matches!(err, ConfigError::InvertedRange { min: 50, max: 30, .. }));
    }

    #[test]
    fn test_bad_distributions_rejected() {
        let err = RuleSet::parse("religions=Christian:0,Atheist:0").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDistribution { .. }));

        let err = RuleSet::parse("eye_colors=Blue:-3,Brown:5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeight { .. }));

        let err = RuleSet::parse("sibling_probability=140").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProbability { .. }));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = RuleSet::parse("country=FR\nthis line is broken").unwrap_err();
        assert_eq!(
            err,
            ConfigError::Malformed {
                line: 2,
                text: "this line is broken".into()
            }
        );
    }

    #[test]
    fn test_fertility_must_meet_parent_gap() {
        let err = RuleSet::parse("parent_min_age_gap=50\nparent_max_age_gap=60").unwrap_err();
        assert!(matches!(err, ConfigError::FertilityOutsideParentGap { .. }));
    }

    #[test]
    fn test_zero_weight_never_sampled() {
        let table = WeightedTable::from_pairs(&[("Never", 0.0), ("Always", 3.0)]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert_eq!(table.sample(&mut rng), Some("Always"));
        }
        assert_eq!(table.most_common(), Some("Always"));
        assert!(WeightedTable::default().sample(&mut rng).is_none());
    }

    #[test]
    fn test_format_date() {
        let rules = RuleSet::default();
        let date = chrono::NaiveDate::from_ymd_opt(1961, 3, 9).unwrap();
        assert_eq!(rules.format_date(date), "09/03/1961");
    }

    #[test]
    fn test_format_amount() {
        let rules = RuleSet::default();
        assert_eq!(rules.format_amount(500), "$500");
        assert_eq!(rules.format_amount(24_950), "$24,950");
        assert_eq!(rules.format_amount(1_250_000), "$1,250,000");
    }
}
