use crate::schema::Month;
use log::warn;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Years the ledger stores. Keys outside this range are dropped while decoding.
pub const YEAR_RANGE: RangeInclusive<i32> = 1..=9999;

/// The month before `month`, stepping back into the previous year from January.
pub fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month.index() {
        0 => (year.saturating_sub(1), Month::December),
        idx => (year, Month::ALL[idx - 1]),
    }
}

/// Months from December back to January.
pub fn months_newest_first() -> impl Iterator<Item = Month> {
    Month::ALL.into_iter().rev()
}

/// `span` consecutive years starting at `start`, cut short at `i32::MAX`.
pub fn year_window(start: i32, span: u32) -> Vec<i32> {
    (0..span)
        .map_while(|offset| i32::try_from(offset).ok().and_then(|o| start.checked_add(o)))
        .collect()
}

pub(crate) fn parse_key<T: FromStr>(key: &str, what: &str) -> Option<T> {
    match key.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring unknown {} key '{}'", what, key);
            None
        }
    }
}

pub(crate) fn parse_year_key(key: &str) -> Option<i32> {
    let year = parse_key::<i32>(key.trim(), "year")?;
    if YEAR_RANGE.contains(&year) {
        Some(year)
    } else {
        warn!("Ignoring out-of-range year key '{}'", key);
        None
    }
}

/// Non-negative finite amount; anything else becomes 0.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_month() {
        assert_eq!(previous_month(2024, Month::March), (2024, Month::February));
        assert_eq!(previous_month(2024, Month::January), (2023, Month::December));
        assert_eq!(
            previous_month(i32::MIN, Month::January),
            (i32::MIN, Month::December)
        );
    }

    #[test]
    fn test_months_newest_first() {
        let order: Vec<Month> = months_newest_first().collect();
        assert_eq!(order.first(), Some(&Month::December));
        assert_eq!(order.last(), Some(&Month::January));
        assert_eq!(order.len(), 12);
    }

    #[test]
    fn test_year_window() {
        let years = year_window(2021, 11);
        assert_eq!(years.len(), 11);
        assert_eq!(years[0], 2021);
        assert_eq!(years[10], 2031);
        assert!(year_window(2021, 0).is_empty());

        let tail = year_window(i32::MAX - 3, 11);
        assert_eq!(tail.len(), 4);
        assert_eq!(tail.last(), Some(&i32::MAX));
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!(parse_year_key("2024"), Some(2024));
        assert_eq!(parse_year_key("twenty"), None);
        assert_eq!(parse_year_key("-2147483648"), None);
        assert_eq!(parse_year_key("0"), None);
        assert_eq!(parse_year_key("99999"), None);
    }

    #[test]
    fn test_sanitize_amount() {
        assert_eq!(sanitize_amount(12.5), 12.5);
        assert_eq!(sanitize_amount(-3.0), 0.0);
        assert_eq!(sanitize_amount(f64::NAN), 0.0);
        assert_eq!(sanitize_amount(f64::INFINITY), 0.0);
    }
}
