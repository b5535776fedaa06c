//! Calendar helpers
//!
//! Ages are calendar-year ages: a person born in 1960 is 66 throughout 2026.
//! Family arithmetic works on birth years; concrete dates are then placed
//! inside those years without ever passing "today".

use chrono::{Datelike, Months, NaiveDate};
use rand::Rng;

/// Picks a day inside `year`, never later than `today`.
pub fn date_in_year<R: Rng + ?Sized>(rng: &mut R, year: i32, today: NaiveDate) -> NaiveDate {
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=days_in_month(year, month));
    let date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(today);
    date.min(today)
}

/// Birth date for someone who is `age` during the year of `today`.
pub fn birth_date_for_age<R: Rng + ?Sized>(rng: &mut R, age: u32, today: NaiveDate) -> NaiveDate {
    date_in_year(rng, today.year() - age as i32, today)
}

/// Uniform date in `[from, to]`; `from` when the range is inverted.
pub fn date_between<R: Rng + ?Sized>(rng: &mut R, from: NaiveDate, to: NaiveDate) -> NaiveDate {
    if to <= from {
        return from;
    }
    let span = (to - from).num_days();
    from + chrono::Duration::days(rng.gen_range(0..=span))
}

pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

pub fn sub_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

pub fn add_years(date: NaiveDate, years: u32) -> NaiveDate {
    add_months(date, years * 12)
}

pub fn sub_years(date: NaiveDate, years: u32) -> NaiveDate {
    sub_months(date, years * 12)
}

/// First day of `year`.
pub fn year_start(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Calendar-year age of someone born in `birth_year`, during `year`.
pub fn age_in(birth_year: i32, year: i32) -> i32 {
    year - birth_year
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
    }

    #[test]
    fn test_dates_never_pass_today() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let d = date_in_year(&mut rng, 2026, today());
            assert!(d <= today());
            assert_eq!(d.year(), 2026);
        }
    }

    #[test]
    fn test_birth_date_matches_age() {
        let mut rng = StdRng::seed_from_u64(2);
        let birth = birth_date_for_age(&mut rng, 70, today());
        assert_eq!(age_in(birth.year(), 2026), 70);
    }

    #[test]
    fn test_month_arithmetic() {
        let d = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        assert_eq!(add_months(d, 1), NaiveDate::from_ymd_opt(2020, 2, 29).unwrap());
        assert_eq!(sub_years(d, 2).year(), 2018);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_date_between_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let from = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2000, 2, 1).unwrap();
        for _ in 0..200 {
            let d = date_between(&mut rng, from, to);
            assert!(d >= from && d <= to);
        }
        assert_eq!(date_between(&mut rng, to, from), to);
    }
}
