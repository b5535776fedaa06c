//! Built-in sample country
//!
//! A small Spain-like rule set and data provider. The binary uses it for its
//! benchmark run and the tests use it as a realistic fixture.

use crate::buckets::AgeBucket;
use crate::components::{Gender, SocialClass};
use crate::provider::{Category, InMemoryData, LookupKey, TableValue};
use crate::rules::RuleSet;

const SAMPLE_RULES: &str = "\
# Sample country
country=Spain
min_age=18
max_age=85
life_expectancy=83
longevity_slack=5
female_fertility_min_age=15
female_fertility_max_age=45
parent_min_age_gap=18
parent_max_age_gap=45
sibling_probability=75
average_siblings=1.3
max_siblings=4
twin_probability=5
average_children=1.6
min_children=1
max_children=4

death_prob_parents_adults=10
death_prob_parents_middle_aged=25
death_prob_parents_older_adults=55
death_prob_parents_seniors=90
death_prob_parents_elderly=100

unemployment_rate=12
jobless_rate=3
retirement_age=66
basic_jobs=Cashier,Cleaner,Waiter,Shop Assistant,Warehouse Worker
job_min_ages=Pilot:23,Police Officer:21,Bus Driver:21

salary_low=16000-22000
salary_middle=22000-38000
salary_upper_middle=38000-70000
salary_high=70000-180000
pension_low=9000-14000
pension_middle=14000-24000
pension_upper_middle=24000-38000
pension_high=38000-60000
currency_code=EUR
currency_symbol=€

social_classes=low:25,middle:50,upper-middle:20,high:5
hair_colors=Black:30,Dark Brown:35,Brown:20,Light Brown:8,Blonde:5,Red:2
eye_colors=Brown:55,Dark Brown:20,Hazel:10,Green:8,Blue:7
skin_tones=Light:35,Medium:40,Olive:20,Tan:5
religions=Catholic:55,Atheist:25,Agnostic:12,Muslim:4,Other:4

native_language=Spanish
primary_foreign_language=English
young_language_age=35
available_languages=English:70,French:20,German:10
language_level_basic=30
language_level_intermediate=45
language_level_advanced=25
min_languages=1
max_languages=3

name_order=given_first
surname_count=2
date_format=DD/MM/YYYY
phone_country_code=+34
phone_format=### ## ## ##
phone_length=9
phone_prefixes=6,7
";

const SAMPLE_CHARACTERISTICS: &str = "\
# text|min_age|max_age|gender|probability
Did military service|33|120|male|40
Has a siesta most days|18|120|both|30
Supports a local football club|18|120|both|45
Walked the Camino de Santiago|25|120|both|8
";

pub fn sample_rules() -> RuleSet {
    RuleSet::parse(SAMPLE_RULES).unwrap_or_default()
}

pub fn sample_data() -> InMemoryData {
    let mut data = InMemoryData::new();
    add_names(&mut data);
    add_jobs(&mut data);

    data.add_list(
        Category::Hobbies,
        LookupKey::any(),
        &[
            "Reading", "Cooking", "Hiking", "Cycling", "Photography", "Chess",
            "Gardening", "Swimming", "Painting", "Running",
        ],
    )
    .add_list(Category::Hobbies, LookupKey::any().bucket(AgeBucket::VeryYoung), &["Video games", "Skateboarding"])
    .add_list(Category::Hobbies, LookupKey::any().bucket(AgeBucket::Seniors), &["Petanque", "Crosswords"])
    .add_list(Category::Hobbies, LookupKey::any().class(SocialClass::High), &["Sailing", "Golf"]);

    data.add_list(
        Category::StudentFields,
        LookupKey::any(),
        &["Law", "Medicine", "Economics", "Computer Science", "Architecture", "Nursing", "History"],
    );

    data.add_list(
        Category::DeathCauses,
        LookupKey::any(),
        &["Heart attack", "Stroke", "Cancer", "Pneumonia"],
    )
    .add_list(Category::DeathCauses, LookupKey::any().bucket(AgeBucket::VeryYoung), &["Traffic accident", "Drowning"])
    .add_list(Category::DeathCauses, LookupKey::any().bucket(AgeBucket::YoungAdults), &["Traffic accident", "Overdose"])
    .add_list(Category::DeathCauses, LookupKey::any().bucket(AgeBucket::Elderly), &["Natural causes", "Dementia"]);

    data.add_list(
        Category::DivorceCauses,
        LookupKey::any(),
        &["Irreconcilable differences", "Infidelity", "Financial disagreements", "Grew apart"],
    );

    data.add_list(
        Category::BreakupReasons,
        LookupKey::any(),
        &["Grew apart", "Moved to another city", "Wanted different things", "Cheated", "Family disapproved"],
    )
    .add_list(Category::BreakupReasons, LookupKey::any().bucket(AgeBucket::VeryYoung), &["Went to university abroad"]);

    data.add_list(
        Category::TerminationReasons,
        LookupKey::any(),
        &[
            "Better job opportunity", "Career change", "Relocation", "Company restructuring",
            "Contract ended", "Personal reasons", "Layoff", "End of internship",
            "Seasonal work ended", "Retirement",
        ],
    );

    add_places(&mut data);
    add_tables(&mut data);
    data.load_characteristics(SAMPLE_CHARACTERISTICS);
    data
}

fn add_places(data: &mut InMemoryData) {
    data.add_weighted(
        Category::Cities,
        LookupKey::any(),
        [
            ("Madrid|28001", 6.0),
            ("Barcelona|08001", 5.0),
            ("Valencia|46001", 3.0),
            ("Sevilla|41001", 2.0),
            ("Alcala de Henares, Madrid|28801", 1.0),
            ("Getafe, Madrid|28901", 1.0),
            ("Badalona, Barcelona|08911", 1.0),
            ("Dos Hermanas, Sevilla|41701", 1.0),
        ]
        .iter()
        .map(|(line, w)| (line.to_string(), *w))
        .collect(),
    );

    data.add_list(
        Category::Considerations,
        LookupKey::any(),
        &[
            "People carry two surnames: the father's first, then the mother's.",
            "Lunch is the main meal and is eaten between 14:00 and 16:00.",
            "Greetings among friends are two kisses on the cheeks.",
        ],
    );
}

fn add_names(data: &mut InMemoryData) {
    use AgeBucket::*;
    let male: &[(AgeBucket, &[&str])] = &[
        (VeryYoung, &["Hugo", "Mateo", "Leo", "Martin", "Lucas"]),
        (YoungAdults, &["Alejandro", "Pablo", "Daniel", "Adrian", "Alvaro"]),
        (Adults, &["David", "Javier", "Sergio", "Carlos", "Ivan"]),
        (MiddleAged, &["Jose", "Antonio", "Francisco", "Miguel", "Juan"]),
        (OlderAdults, &["Manuel", "Rafael", "Fernando", "Angel", "Luis"]),
        (Seniors, &["Jesus", "Ramon", "Joaquin", "Andres", "Vicente"]),
        (Elderly, &["Emilio", "Julian", "Eusebio", "Leandro", "Teodoro"]),
    ];
    let female: &[(AgeBucket, &[&str])] = &[
        (VeryYoung, &["Lucia", "Sofia", "Martina", "Valeria", "Julia"]),
        (YoungAdults, &["Paula", "Laura", "Andrea", "Marta", "Alba"]),
        (Adults, &["Cristina", "Sara", "Raquel", "Elena", "Silvia"]),
        (MiddleAged, &["Maria", "Carmen", "Isabel", "Pilar", "Rosa"]),
        (OlderAdults, &["Dolores", "Mercedes", "Josefa", "Teresa", "Angeles"]),
        (Seniors, &["Concepcion", "Antonia", "Francisca", "Ana", "Encarnacion"]),
        (Elderly, &["Asuncion", "Remedios", "Milagros", "Purificacion", "Aurora"]),
    ];
    for (gender, table) in [(Gender::Male, male), (Gender::Female, female)] {
        for (bucket, names) in table {
            data.add_list(Category::FirstNames, LookupKey::any().bucket(*bucket).gender(gender), names);
        }
    }

    data.add_weighted(
        Category::Surnames,
        LookupKey::any(),
        [
            ("Garcia", 8.0), ("Rodriguez", 6.0), ("Gonzalez", 6.0), ("Fernandez", 6.0),
            ("Lopez", 6.0), ("Martinez", 5.0), ("Sanchez", 5.0), ("Perez", 5.0),
            ("Gomez", 4.0), ("Martin", 4.0), ("Jimenez", 3.0), ("Ruiz", 3.0),
            ("Hernandez", 3.0), ("Diaz", 3.0), ("Moreno", 3.0), ("Alvarez", 2.0),
        ]
        .iter()
        .map(|(n, w)| (n.to_string(), *w))
        .collect(),
    );
}

fn add_jobs(data: &mut InMemoryData) {
    data.add_list(
        Category::Jobs,
        LookupKey::any(),
        &["Cashier", "Waiter", "Shop Assistant", "Administrative Assistant", "Bus Driver"],
    )
    .add_list(
        Category::Jobs,
        LookupKey::any().class(SocialClass::Low),
        &["Cleaner", "Warehouse Worker", "Farm Worker", "Construction Worker"],
    )
    .add_list(
        Category::Jobs,
        LookupKey::any().class(SocialClass::Middle),
        &["Nurse", "Police Officer", "Electrician", "Accountant", "Teacher"],
    )
    .add_list(
        Category::Jobs,
        LookupKey::any().class(SocialClass::UpperMiddle),
        &["Engineer", "Software Developer", "Architect", "Lawyer", "Doctor"],
    )
    .add_list(
        Category::Jobs,
        LookupKey::any().class(SocialClass::High),
        &["General Manager", "Pilot", "Surgeon", "Company Director", "Judge"],
    );
}

fn add_tables(data: &mut InMemoryData) {
    for (title, age) in [("Nurse", 21), ("Teacher", 22), ("Doctor", 25), ("Surgeon", 28), ("Judge", 30)] {
        data.set_table_value(Category::JobMinimumAge, title, TableValue::Int(age));
    }

    for (title, requirement) in [
        ("Nurse", "bachelor|Nursing"),
        ("Teacher", "bachelor"),
        ("Accountant", "bachelor"),
        ("Engineer", "bachelor"),
        ("Software Developer", "vocational"),
        ("Architect", "master|Architecture"),
        ("Lawyer", "master|Law"),
        ("Doctor", "master|Medicine"),
        ("Surgeon", "doctorate|Medicine"),
        ("Judge", "master|Law"),
    ] {
        data.set_table_value(Category::EducationRequirements, title, TableValue::Text(requirement.to_string()));
    }

    let categories: [(&str, &[&str]); 4] = [
        ("Hospitality", &["Waiter", "Cashier", "Shop Assistant", "Cleaner"]),
        ("Health", &["Nurse", "Doctor", "Surgeon"]),
        ("Office", &["Administrative Assistant", "Accountant", "General Manager", "Company Director"]),
        ("Technical", &["Engineer", "Software Developer", "Architect", "Electrician"]),
    ];
    for (name, titles) in categories {
        data.set_table_value(
            Category::JobCategories,
            name,
            TableValue::List(titles.iter().map(|t| t.to_string()).collect()),
        );
    }

    for (key, lo, hi) in [
        ("male:Short", 158, 168),
        ("male:Average", 169, 180),
        ("male:Tall", 181, 195),
        ("female:Short", 148, 158),
        ("female:Average", 159, 169),
        ("female:Tall", 170, 182),
    ] {
        data.set_table_value(Category::Heights, key, TableValue::Range(lo, hi));
    }

    for (key, certs) in [
        ("English:intermediate", &["Cambridge B1 Preliminary", "Cambridge B2 First"][..]),
        ("English:advanced", &["Cambridge C1 Advanced", "IELTS"][..]),
        ("French:advanced", &["DALF C1"][..]),
        ("German:intermediate", &["Goethe-Zertifikat B1"][..]),
    ] {
        data.set_table_value(
            Category::LanguageCertifications,
            key,
            TableValue::List(certs.iter().map(|c| c.to_string()).collect()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::CategoricalData;

    #[test]
    fn test_sample_rules_parse() {
        let rules = RuleSet::parse(SAMPLE_RULES).unwrap();
        assert_eq!(rules.country, "Spain");
        assert_eq!(rules.native_language, "Spanish");
        assert_eq!(rules.max_age, 85);
        assert_eq!(rules.surname_count, 2);
        assert_eq!(sample_rules(), rules);
    }

    #[test]
    fn test_sample_data_covers_every_bucket() {
        let data = sample_data();
        for bucket in AgeBucket::ALL {
            for gender in [Gender::Male, Gender::Female] {
                let key = LookupKey::any().bucket(bucket).gender(gender);
                assert!(!data.lookup(Category::FirstNames, &key).is_empty());
            }
        }
        assert_eq!(data.characteristics().len(), 4);
        assert_eq!(data.lookup(Category::Cities, &LookupKey::any()).len(), 8);
        assert!(!data.lookup(Category::BreakupReasons, &LookupKey::any()).is_empty());
    }
}
