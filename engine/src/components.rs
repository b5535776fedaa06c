//! Record components for generated identities
//!
//! Everything here is plain data. Generation fills these in one pass and the
//! finished `Identity` is handed out immutably.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Person Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn is_male(self) -> bool {
        matches!(self, Gender::Male)
    }

    pub fn opposite(self) -> Gender {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    /// Subject and object pronouns, capitalised subject first.
    pub fn pronouns(self) -> (&'static str, &'static str) {
        match self {
            Gender::Male => ("He", "him"),
            Gender::Female => ("She", "her"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SocialClass {
    Low,
    Middle,
    UpperMiddle,
    High,
}

impl SocialClass {
    pub const ALL: [SocialClass; 4] = [
        SocialClass::Low,
        SocialClass::Middle,
        SocialClass::UpperMiddle,
        SocialClass::High,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SocialClass::Low => "low",
            SocialClass::Middle => "middle",
            SocialClass::UpperMiddle => "upper-middle",
            SocialClass::High => "high",
        }
    }

    pub fn from_label(label: &str) -> Option<SocialClass> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "low" => Some(SocialClass::Low),
            "middle" => Some(SocialClass::Middle),
            "upper-middle" => Some(SocialClass::UpperMiddle),
            "high" => Some(SocialClass::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName {
    pub first: String,
    /// One or two surnames depending on the country's naming system.
    pub surnames: Vec<String>,
}

impl PersonName {
    pub fn new(first: impl Into<String>, surnames: Vec<String>) -> Self {
        Self {
            first: first.into(),
            surnames,
        }
    }

    pub fn primary_surname(&self) -> Option<&str> {
        self.surnames.first().map(String::as_str)
    }
}

// ============================================================================
// Education & Skills
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EducationLevel {
    None,
    Primary,
    Secondary,
    Vocational,
    Bachelor,
    Master,
    Doctorate,
}

impl EducationLevel {
    pub fn label(self) -> &'static str {
        match self {
            EducationLevel::None => "No formal education",
            EducationLevel::Primary => "Primary education",
            EducationLevel::Secondary => "Secondary education",
            EducationLevel::Vocational => "Vocational training",
            EducationLevel::Bachelor => "Bachelor's degree",
            EducationLevel::Master => "Master's degree",
            EducationLevel::Doctorate => "Doctorate",
        }
    }

    pub fn from_key(key: &str) -> Option<EducationLevel> {
        match key.trim().to_ascii_lowercase().as_str() {
            "none" => Some(EducationLevel::None),
            "primary" => Some(EducationLevel::Primary),
            "secondary" => Some(EducationLevel::Secondary),
            "vocational" => Some(EducationLevel::Vocational),
            "bachelor" => Some(EducationLevel::Bachelor),
            "master" => Some(EducationLevel::Master),
            "doctorate" | "phd" => Some(EducationLevel::Doctorate),
            _ => None,
        }
    }

    pub fn is_higher(self) -> bool {
        self >= EducationLevel::Bachelor
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    /// Highest completed level.
    pub completed: EducationLevel,
    pub in_progress: Option<EducationLevel>,
    pub field: Option<String>,
}

impl Education {
    pub fn is_enrolled(&self) -> bool {
        self.in_progress.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Proficiency {
    Basic,
    Intermediate,
    Advanced,
    Native,
}

impl Proficiency {
    pub fn from_label(label: &str) -> Option<Proficiency> {
        match label.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Proficiency::Basic),
            "intermediate" => Some(Proficiency::Intermediate),
            "advanced" => Some(Proficiency::Advanced),
            "native" => Some(Proficiency::Native),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Proficiency::Basic => "basic",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
            Proficiency::Native => "native",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSkill {
    pub language: String,
    pub proficiency: Proficiency,
    pub certification: Option<String>,
}

// ============================================================================
// Traits
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTraits {
    pub height_category: String,
    pub height_cm: u32,
    pub weight_category: String,
    pub weight_kg: u32,
    pub hair: String,
    pub eyes: String,
    pub skin: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenderFilter {
    Both,
    Male,
    Female,
}

impl GenderFilter {
    pub fn admits(self, gender: Gender) -> bool {
        match self {
            GenderFilter::Both => true,
            GenderFilter::Male => gender == Gender::Male,
            GenderFilter::Female => gender == Gender::Female,
        }
    }
}

/// A regional or historical trait with its own age gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalCharacteristic {
    pub text: String,
    pub min_age: u32,
    pub max_age: u32,
    pub gender: GenderFilter,
    /// Selection probability in percent.
    pub probability: f64,
}

impl RegionalCharacteristic {
    pub fn applies_to(&self, age: u32, gender: Gender) -> bool {
        age >= self.min_age && age <= self.max_age && self.gender.admits(gender)
    }
}

// ============================================================================
// Family Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    Father,
    Mother,
    Sibling,
    Partner,
    ExPartner,
    Child,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Vital {
    Alive {
        age: u32,
    },
    Deceased {
        age_at_death: u32,
        death_date: NaiveDate,
        cause: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub relation: Relation,
    pub gender: Gender,
    pub name: PersonName,
    pub birth_date: NaiveDate,
    pub vital: Vital,
    pub twin: bool,
    /// 1-based index of the union a child was born into.
    pub union: Option<u8>,
}

impl FamilyMember {
    pub fn birth_year(&self) -> i32 {
        chrono::Datelike::year(&self.birth_date)
    }

    pub fn death_date(&self) -> Option<NaiveDate> {
        match &self.vital {
            Vital::Deceased { death_date, .. } => Some(*death_date),
            Vital::Alive { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnionKind {
    Marriage,
    Dating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnionEnd {
    Divorced { date: NaiveDate, reason: String },
    Widowed { date: NaiveDate },
}

impl UnionEnd {
    pub fn date(&self) -> NaiveDate {
        match self {
            UnionEnd::Divorced { date, .. } | UnionEnd::Widowed { date } => *date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub partner: FamilyMember,
    pub kind: UnionKind,
    pub start_date: NaiveDate,
    pub end: Option<UnionEnd>,
}

/// A dating relationship that ended before any current union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastRelationship {
    pub partner: FamilyMember,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub breakup_reason: String,
}

impl PastRelationship {
    /// Length in whole years, at least one.
    pub fn duration_years(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days().max(0);
        ((days / 365) as u32).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Single,
    Dating,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Family {
    pub marital_status: MaritalStatus,
    pub father: Option<FamilyMember>,
    pub mother: Option<FamilyMember>,
    pub siblings: Vec<FamilyMember>,
    /// Chronological; an ongoing union is always last.
    pub unions: Vec<Union>,
    pub children: Vec<FamilyMember>,
    /// Past dating relationships, oldest first, all ended before the first union.
    pub relationships: Vec<PastRelationship>,
}

impl Family {
    pub fn empty() -> Self {
        Self {
            marital_status: MaritalStatus::Single,
            father: None,
            mother: None,
            siblings: Vec::new(),
            unions: Vec::new(),
            children: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn current_partner(&self) -> Option<&FamilyMember> {
        self.unions
            .last()
            .filter(|u| u.end.is_none())
            .map(|u| &u.partner)
    }

    pub fn ex_partners(&self) -> impl Iterator<Item = &FamilyMember> {
        self.unions
            .iter()
            .filter(|u| u.end.is_some())
            .map(|u| &u.partner)
    }

    pub fn members(&self) -> impl Iterator<Item = &FamilyMember> {
        self.father
            .iter()
            .chain(self.mother.iter())
            .chain(self.siblings.iter())
            .chain(self.unions.iter().map(|u| &u.partner))
            .chain(self.children.iter())
            .chain(self.relationships.iter().map(|r| &r.partner))
    }
}

// ============================================================================
// Employment Components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentStatus {
    Student,
    Employed,
    Unemployed,
    Jobless,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    pub title: String,
    pub start_date: NaiveDate,
    /// `None` while the job is held.
    pub end_date: Option<NaiveDate>,
    pub termination_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    pub status: EmploymentStatus,
    /// Display label: the job title, "Student", "Unemployed", "Retired"...
    pub occupation: String,
    pub current: Option<EmploymentRecord>,
    /// Finished jobs, oldest first.
    pub previous: Vec<EmploymentRecord>,
    pub salary: Option<u32>,
    pub previous_salary: Option<u32>,
    pub pension: Option<u32>,
    /// ISO code of the amounts above; set whenever one of them is.
    pub currency: Option<String>,
}

impl Employment {
    pub fn records(&self) -> impl Iterator<Item = &EmploymentRecord> {
        self.previous.iter().chain(self.current.iter())
    }
}

// ============================================================================
// Identity
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residence {
    pub city: String,
    /// Nearby capital or province, when the city line names one.
    pub nearby_town: Option<String>,
    /// Belongs to `city`, never to the nearby town.
    pub postal_code: Option<String>,
}

impl Residence {
    /// Parses `City|12345` or `City, Nearby|12345`; the postal code is optional.
    pub fn parse(line: &str) -> Option<Residence> {
        let (place, postal_code) = match line.split_once('|') {
            Some((place, code)) => (place, Some(code.trim()).filter(|c| !c.is_empty())),
            None => (line, None),
        };
        let (city, nearby_town) = match place.split_once(',') {
            Some((city, nearby)) => (city.trim(), Some(nearby.trim()).filter(|n| !n.is_empty())),
            None => (place.trim(), None),
        };
        if city.is_empty() {
            return None;
        }
        Some(Residence {
            city: city.to_string(),
            nearby_town: nearby_town.map(str::to_string),
            postal_code: postal_code.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityStatus {
    Created,
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub country: String,
    pub gender: Gender,
    pub name: PersonName,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub age: u32,
    pub social_class: SocialClass,
    pub education: Education,
    pub employment: Option<Employment>,
    pub physical: PhysicalTraits,
    pub religion: String,
    pub languages: Vec<LanguageSkill>,
    pub hobbies: Vec<String>,
    pub characteristics: Vec<RegionalCharacteristic>,
    pub phone: String,
    pub residence: Option<Residence>,
    /// Cultural notes for the country, in provider order.
    pub considerations: Vec<String>,
    pub family: Family,
    pub status: IdentityStatus,
}

impl Identity {
    pub fn birth_year(&self) -> i32 {
        chrono::Datelike::year(&self.birth_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(relation: Relation) -> FamilyMember {
        FamilyMember {
            relation,
            gender: Gender::Female,
            name: PersonName::new("Ana", vec!["Ruiz".into()]),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 1).unwrap(),
            vital: Vital::Alive { age: 46 },
            twin: false,
            union: None,
        }
    }

    #[test]
    fn test_current_partner_ignores_ended_unions() {
        let mut family = Family::empty();
        family.unions.push(Union {
            partner: member(Relation::ExPartner),
            kind: UnionKind::Marriage,
            start_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            end: Some(UnionEnd::Widowed {
                date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
            }),
        });
        assert!(family.current_partner().is_none());
        assert_eq!(family.ex_partners().count(), 1);

        family.unions.push(Union {
            partner: member(Relation::Partner),
            kind: UnionKind::Marriage,
            start_date: NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
            end: None,
        });
        assert_eq!(family.current_partner().map(|p| p.relation), Some(Relation::Partner));
        assert_eq!(family.members().count(), 2);
    }

    #[test]
    fn test_levels_are_ordered() {
        assert!(EducationLevel::Master.is_higher());
        assert!(!EducationLevel::Vocational.is_higher());
        assert!(Proficiency::Advanced > Proficiency::Intermediate);
        assert_eq!(SocialClass::from_label("Upper_Middle"), Some(SocialClass::UpperMiddle));
    }

    #[test]
    fn test_residence_line_formats() {
        let full = Residence::parse("Alcala de Henares, Madrid|28801").unwrap();
        assert_eq!(full.city, "Alcala de Henares");
        assert_eq!(full.nearby_town.as_deref(), Some("Madrid"));
        assert_eq!(full.postal_code.as_deref(), Some("28801"));

        let bare = Residence::parse("Sevilla").unwrap();
        assert_eq!(bare.nearby_town, None);
        assert_eq!(bare.postal_code, None);
        assert!(Residence::parse(" |28001").is_none());
    }

    #[test]
    fn test_relationship_duration() {
        let rel = PastRelationship {
            partner: member(Relation::ExPartner),
            start_date: NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2018, 6, 1).unwrap(),
            breakup_reason: "Grew apart".into(),
        };
        assert_eq!(rel.duration_years(), 3);
        let mut family = Family::empty();
        family.relationships.push(rel);
        assert_eq!(family.members().count(), 1);
        assert_eq!(family.ex_partners().count(), 0);
    }

    #[test]
    fn test_characteristic_gate() {
        let c = RegionalCharacteristic {
            text: "Did military service".into(),
            min_age: 33,
            max_age: 120,
            gender: GenderFilter::Male,
            probability: 100.0,
        };
        assert!(!c.applies_to(32, Gender::Male));
        assert!(c.applies_to(33, Gender::Male));
        assert!(!c.applies_to(50, Gender::Female));
    }
}
