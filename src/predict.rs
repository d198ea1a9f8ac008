use crate::model::FormError;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

const DAY_MILLIS: i64 = 86_400_000;
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y.%m.%d"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub next_start: NaiveDate,
    pub next_end: NaiveDate,
    pub days_until_next_start: i64,
}

/// Validated cycle form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleInput {
    pub last_start: NaiveDate,
    pub avg_cycle_length_days: u32,
    pub period_length_days: u32,
}

pub fn parse_cycle_input(last_start: &str, avg: &str, len: &str) -> Result<CycleInput, FormError> {
    Ok(CycleInput {
        last_start: parse_date(last_start).ok_or(FormError::InvalidCycle)?,
        avg_cycle_length_days: parse_positive(avg).ok_or(FormError::InvalidCycle)?,
        period_length_days: parse_positive(len).ok_or(FormError::InvalidCycle)?,
    })
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

fn parse_positive(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Predicts the next period from the last start date.
///
/// Dates count as midnight UTC when measuring the distance from `now`, and the
/// remaining days round up so a start later today still reads as one day away.
pub fn predict(
    last_start: NaiveDate,
    avg_cycle_length_days: u32,
    period_length_days: u32,
    now: DateTime<Utc>,
) -> Result<Prediction, FormError> {
    if avg_cycle_length_days == 0 || period_length_days == 0 {
        return Err(FormError::InvalidCycle);
    }
    let next_start = last_start
        .checked_add_days(Days::new(avg_cycle_length_days.into()))
        .ok_or(FormError::InvalidCycle)?;
    let next_end = next_start
        .checked_add_days(Days::new(period_length_days.into()))
        .ok_or(FormError::InvalidCycle)?;
    let remaining = (start_of_day(next_start) - now).num_milliseconds();
    let days_until_next_start = if remaining <= 0 {
        0
    } else {
        (remaining + DAY_MILLIS - 1) / DAY_MILLIS
    };
    Ok(Prediction {
        next_start,
        next_end,
        days_until_next_start,
    })
}

pub fn predict_input(input: &CycleInput, now: DateTime<Utc>) -> Result<Prediction, FormError> {
    predict(
        input.last_start,
        input.avg_cycle_length_days,
        input.period_length_days,
        now,
    )
}

/// Midnight UTC `days` whole days ahead of the predicted start, or `None` when
/// that lies outside the representable range.
pub fn days_before(next_start: NaiveDate, days: u32) -> Option<DateTime<Utc>> {
    start_of_day(next_start).checked_sub_signed(Duration::days(days.into()))
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn predicts_start_and_end() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let p = predict(date(2024, 1, 1), 28, 5, now).unwrap();
        assert_eq!(p.next_start, date(2024, 1, 29));
        assert_eq!(p.next_end, date(2024, 2, 3));
        assert_eq!(p.days_until_next_start, 19);
    }

    #[test]
    fn end_follows_start_across_month_and_leap_day() {
        let now = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        for (avg, len) in [(21, 2), (28, 5), (35, 7), (45, 10)] {
            let start = date(2024, 2, 1);
            let p = predict(start, avg, len, now).unwrap();
            assert_eq!(p.next_start, start + Duration::days(avg as i64));
            assert_eq!(p.next_end, p.next_start + Duration::days(len as i64));
        }
        let p = predict(date(2024, 2, 1), 28, 1, now).unwrap();
        assert_eq!(p.next_start, date(2024, 2, 29));
        assert_eq!(p.next_end, date(2024, 3, 1));
    }

    #[test]
    fn days_until_is_zero_once_start_has_passed() {
        let start = date(2024, 1, 1);
        let on_the_day = Utc.with_ymd_and_hms(2024, 1, 29, 0, 0, 0).unwrap();
        assert_eq!(predict(start, 28, 5, on_the_day).unwrap().days_until_next_start, 0);

        let later = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(predict(start, 28, 5, later).unwrap().days_until_next_start, 0);

        let just_before = on_the_day - Duration::seconds(1);
        assert_eq!(predict(start, 28, 5, just_before).unwrap().days_until_next_start, 1);
    }

    #[test]
    fn rejects_zero_lengths() {
        let now = Utc::now();
        assert_eq!(predict(date(2024, 1, 1), 0, 5, now), Err(FormError::InvalidCycle));
        assert_eq!(predict(date(2024, 1, 1), 28, 0, now), Err(FormError::InvalidCycle));
    }

    #[test]
    fn parse_rejects_bad_fields() {
        assert!(parse_cycle_input("2024-01-01", "28", "5").is_ok());
        assert!(parse_cycle_input("2024.01.01", " 28 ", "5").is_ok());
        for (d, avg, len) in [
            ("not a date", "28", "5"),
            ("2024-02-30", "28", "5"),
            ("2024-01-01", "", "5"),
            ("2024-01-01", "28.5", "5"),
            ("2024-01-01", "-3", "5"),
            ("2024-01-01", "28", "0"),
            ("2024-01-01", "28", "five"),
        ] {
            assert_eq!(
                parse_cycle_input(d, avg, len),
                Err(FormError::InvalidCycle),
                "{d} {avg} {len}"
            );
        }
    }

    #[test]
    fn heads_up_counts_back_from_midnight() {
        let at = days_before(date(2024, 1, 29), 3);
        assert_eq!(at, Some(Utc.with_ymd_and_hms(2024, 1, 26, 0, 0, 0).unwrap()));
    }

    #[test]
    fn heads_up_far_beyond_the_calendar_is_none() {
        assert_eq!(days_before(date(2024, 1, 29), u32::MAX), None);
        assert_eq!(days_before(NaiveDate::MIN, 1), None);
    }
}
