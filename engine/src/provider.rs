//! Categorical Data Provider
//!
//! The engine never reads files. Name lists, job lists, death causes and the
//! other raw tables come through the `CategoricalData` trait, which the caller
//! injects. `InMemoryData` is a ready implementation backed by tagged entries.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::buckets::AgeBucket;
use crate::components::{Gender, GenderFilter, RegionalCharacteristic, SocialClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    FirstNames,
    Surnames,
    Jobs,
    Hobbies,
    StudentFields,
    DeathCauses,
    DivorceCauses,
    BreakupReasons,
    TerminationReasons,
    /// Table: job title -> minimum age (`TableValue::Int`).
    JobMinimumAge,
    /// Table: job title -> `level` or `level|field` (`TableValue::Text`).
    EducationRequirements,
    /// Table: category name -> job titles (`TableValue::List`).
    JobCategories,
    /// Table: `gender:Category` -> cm range.
    Heights,
    /// Table: `gender:Height_Weight` -> kg range.
    Weights,
    /// Table: `Language:level` -> certificate names.
    LanguageCertifications,
    /// `City|postal` or `City, Nearby|postal` lines.
    Cities,
    /// Free-text cultural notes for the country.
    Considerations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableValue {
    Int(i64),
    Range(u32, u32),
    Text(String),
    List(Vec<String>),
}

impl TableValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TableValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<(u32, u32)> {
        match self {
            TableValue::Range(lo, hi) => Some((*lo, *hi)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TableValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TableValue::List(v) => Some(v),
            _ => None,
        }
    }
}

/// Filter passed with every list lookup. `None` fields mean "any".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupKey {
    pub bucket: Option<AgeBucket>,
    pub gender: Option<Gender>,
    pub class: Option<SocialClass>,
}

impl LookupKey {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn bucket(mut self, bucket: AgeBucket) -> Self {
        self.bucket = Some(bucket);
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn class(mut self, class: SocialClass) -> Self {
        self.class = Some(class);
        self
    }
}

/// Read-only source of raw categorical data.
///
/// Implementations must be cheap to call repeatedly and safe to share across
/// threads. An empty result means "no data"; the engine falls back on its own.
pub trait CategoricalData: Send + Sync {
    fn lookup_weighted(&self, category: Category, key: &LookupKey) -> Vec<(String, f64)>;

    fn lookup(&self, category: Category, key: &LookupKey) -> Vec<String> {
        self.lookup_weighted(category, key)
            .into_iter()
            .map(|(label, _)| label)
            .collect()
    }

    fn lookup_table(&self, category: Category) -> BTreeMap<String, TableValue>;

    fn characteristics(&self) -> Vec<RegionalCharacteristic>;
}

// ============================================================================
// In-memory implementation
// ============================================================================

#[derive(Debug, Clone)]
struct Entry {
    bucket: Option<AgeBucket>,
    gender: Option<Gender>,
    class: Option<SocialClass>,
    values: Vec<(String, f64)>,
}

impl Entry {
    fn matches(&self, key: &LookupKey) -> bool {
        fn field<T: PartialEq>(entry: Option<T>, wanted: Option<T>) -> bool {
            match (entry, wanted) {
                (Some(e), Some(w)) => e == w,
                _ => true,
            }
        }
        field(self.bucket, key.bucket) && field(self.gender, key.gender) && field(self.class, key.class)
    }
}

/// Tagged lists plus tables, held in memory.
///
/// A list entry tagged with a bucket, gender or class only answers lookups that
/// either ask for that value or leave the field open. Untagged entries answer
/// everything.
#[derive(Debug, Clone, Default)]
pub struct InMemoryData {
    lists: HashMap<Category, Vec<Entry>>,
    tables: HashMap<Category, BTreeMap<String, TableValue>>,
    characteristics: Vec<RegionalCharacteristic>,
}

impl InMemoryData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds uniformly weighted values under `tag`.
    pub fn add_list(&mut self, category: Category, tag: LookupKey, values: &[&str]) -> &mut Self {
        let weighted = values.iter().map(|v| (v.to_string(), 1.0)).collect();
        self.add_weighted(category, tag, weighted)
    }

    pub fn add_weighted(&mut self, category: Category, tag: LookupKey, values: Vec<(String, f64)>) -> &mut Self {
        self.lists.entry(category).or_default().push(Entry {
            bucket: tag.bucket,
            gender: tag.gender,
            class: tag.class,
            values,
        });
        self
    }

    pub fn set_table_value(&mut self, category: Category, key: &str, value: TableValue) -> &mut Self {
        self.tables
            .entry(category)
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    pub fn add_characteristic(&mut self, characteristic: RegionalCharacteristic) -> &mut Self {
        self.characteristics.push(characteristic);
        self
    }

    /// Loads characteristics in `text|min_age|max_age|gender|probability` lines.
    /// Lines that do not parse are skipped.
    pub fn load_characteristics(&mut self, text: &str) -> usize {
        let parsed: Vec<_> = text.lines().filter_map(parse_characteristic).collect();
        let count = parsed.len();
        self.characteristics.extend(parsed);
        count
    }
}

impl CategoricalData for InMemoryData {
    fn lookup_weighted(&self, category: Category, key: &LookupKey) -> Vec<(String, f64)> {
        self.lists
            .get(&category)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.matches(key))
                    .flat_map(|e| e.values.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lookup_table(&self, category: Category) -> BTreeMap<String, TableValue> {
        self.tables.get(&category).cloned().unwrap_or_default()
    }

    fn characteristics(&self) -> Vec<RegionalCharacteristic> {
        self.characteristics.clone()
    }
}

/// Parses one `text|min_age|max_age|gender|probability` line.
pub fn parse_characteristic(line: &str) -> Option<RegionalCharacteristic> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() != 5 {
        return None;
    }
    let gender = match parts[3].to_ascii_lowercase().as_str() {
        "both" | "any" => GenderFilter::Both,
        "male" => GenderFilter::Male,
        "female" => GenderFilter::Female,
        _ => return None,
    };
    Some(RegionalCharacteristic {
        text: parts[0].to_string(),
        min_age: parts[1].parse().ok()?,
        max_age: parts[2].parse().ok()?,
        gender,
        probability: parts[4].parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_lookup() {
        let mut data = InMemoryData::new();
        data.add_list(Category::Jobs, LookupKey::any(), &["Clerk"])
            .add_list(Category::Jobs, LookupKey::any().gender(Gender::Female), &["Midwife"])
            .add_list(Category::Jobs, LookupKey::any().class(SocialClass::High), &["CEO"]);

        let low_male = data.lookup(
            Category::Jobs,
            &LookupKey::any().gender(Gender::Male).class(SocialClass::Low),
        );
        assert_eq!(low_male, vec!["Clerk".to_string()]);

        let high_female = data.lookup(
            Category::Jobs,
            &LookupKey::any().gender(Gender::Female).class(SocialClass::High),
        );
        assert_eq!(high_female.len(), 3);
        assert!(data.lookup(Category::Hobbies, &LookupKey::any()).is_empty());
    }

    #[test]
    fn test_parse_characteristic_line() {
        let c = parse_characteristic("Did military service|33|120|male|40").unwrap();
        assert_eq!(c.min_age, 33);
        assert_eq!(c.gender, GenderFilter::Male);
        assert_eq!(c.probability, 40.0);

        assert!(parse_characteristic("# comment").is_none());
        assert!(parse_characteristic("missing|fields").is_none());
        assert!(parse_characteristic("bad gender|1|2|robot|5").is_none());
    }
}
