//! Holiday registry and working-day arithmetic.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::collections::HashSet;

use crate::error::{HrmsError, HrmsResult};
use crate::model::holiday::NewHoliday;

/// Fixed national-holiday template: (name, month, day). Deliberately not
/// configurable; organizations needing more seed through the bulk endpoint.
static DEFAULT_HOLIDAYS: Lazy<Vec<(&str, u32, u32)>> = Lazy::new(|| {
    vec![
        ("New Year's Day", 1, 1),
        ("International Workers' Day", 5, 1),
        ("Christmas Day", 12, 25),
        ("Boxing Day", 12, 26),
        ("New Year's Eve", 12, 31),
    ]
});

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Pure count over every calendar day of the month, excluding weekends and
/// the supplied holiday set.
pub fn count_working_days(year: i32, month: u32, holidays: &HashSet<NaiveDate>) -> u32 {
    let mut day = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(d) => d,
        None => return 0,
    };
    let mut count = 0;
    while day.month() == month {
        if !is_weekend(day) && !holidays.contains(&day) {
            count += 1;
        }
        day += Duration::days(1);
    }
    count
}

/// Weekends lose outright; otherwise any active holiday on the date makes
/// it a non-working day.
pub async fn is_working_day(pool: &MySqlPool, date: NaiveDate) -> HrmsResult<bool> {
    if is_weekend(date) {
        return Ok(false);
    }

    let holiday_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM holidays WHERE holiday_date = ? AND is_active = 1)",
    )
    .bind(date)
    .fetch_one(pool)
    .await?;

    Ok(!holiday_exists)
}

/// One query for the whole month's active holidays, then pure counting;
/// never a per-day round trip.
pub async fn working_days_in_month(pool: &MySqlPool, year: i32, month: u32) -> HrmsResult<u32> {
    if !(1..=12).contains(&month) {
        return Err(HrmsError::Validation(format!("invalid month {month}")));
    }

    let dates: Vec<NaiveDate> = sqlx::query_scalar(
        r#"
        SELECT holiday_date FROM holidays
        WHERE is_active = 1 AND YEAR(holiday_date) = ? AND MONTH(holiday_date) = ?
        "#,
    )
    .bind(year)
    .bind(month)
    .fetch_all(pool)
    .await?;

    let holidays: HashSet<NaiveDate> = dates.into_iter().collect();
    Ok(count_working_days(year, month, &holidays))
}

/// Single-batch insert; duplicate (date, name) pairs are silently skipped,
/// so re-seeding the same list is idempotent. Returns rows actually added.
pub async fn create_bulk_holidays(pool: &MySqlPool, rows: &[NewHoliday]) -> HrmsResult<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["(?, ?, ?, ?)"; rows.len()].join(", ");
    let sql = format!(
        "INSERT IGNORE INTO holidays (name, holiday_date, holiday_type, description) VALUES {placeholders}"
    );

    let mut query = sqlx::query(&sql);
    for row in rows {
        query = query
            .bind(&row.name)
            .bind(row.holiday_date)
            .bind(&row.holiday_type)
            .bind(row.description.as_deref());
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

/// The fixed template instantiated for a year. Dates that do not exist in
/// that year are dropped.
pub fn default_holidays(year: i32) -> Vec<NewHoliday> {
    DEFAULT_HOLIDAYS
        .iter()
        .filter_map(|(name, month, day)| {
            NaiveDate::from_ymd_opt(year, *month, *day).map(|date| NewHoliday {
                name: (*name).to_string(),
                holiday_date: date,
                holiday_type: "PUBLIC".to_string(),
                description: None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekends_are_never_working_days() {
        assert!(is_weekend(date(2026, 8, 22))); // Saturday
        assert!(is_weekend(date(2026, 8, 23))); // Sunday
        assert!(!is_weekend(date(2026, 8, 24))); // Monday
    }

    #[test]
    fn month_count_excludes_weekends_and_holidays() {
        // August 2026: 31 days, 10 weekend days -> 21 working days bare.
        assert_eq!(count_working_days(2026, 8, &HashSet::new()), 21);

        // One weekday holiday knocks one off.
        let holidays: HashSet<_> = [date(2026, 8, 24)].into_iter().collect();
        assert_eq!(count_working_days(2026, 8, &holidays), 20);
    }

    #[test]
    fn weekend_holidays_do_not_double_count() {
        let holidays: HashSet<_> = [date(2026, 8, 22)].into_iter().collect();
        assert_eq!(count_working_days(2026, 8, &holidays), 21);
    }

    #[test]
    fn february_in_a_leap_year() {
        // Feb 2028: 29 days, 8 weekend days -> 21 working days.
        assert_eq!(count_working_days(2028, 2, &HashSet::new()), 21);
    }

    #[test]
    fn default_template_lands_on_the_requested_year() {
        let defaults = default_holidays(2026);
        assert_eq!(defaults.len(), 5);
        assert!(defaults.iter().all(|h| h.holiday_date.year() == 2026));
        assert_eq!(defaults[0].name, "New Year's Day");
    }
}
