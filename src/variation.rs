use crate::migration::ensure_structure;
use crate::resolver::cell_value;
use crate::schema::{Category, Month, Store, User};
use crate::utils::{previous_month, YEAR_RANGE};
use serde::{Deserialize, Serialize};

/// Percent change from `previous` to `current`.
///
/// A zero baseline yields ±100 (or 0 when both are zero) instead of dividing by zero.
pub fn percent_variation(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else if current < 0.0 {
            -100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous.abs() * 100.0
    }
}

/// Percent change of a month against the month before it. January compares against
/// December of the previous year, which is created on demand if it was never visited
/// and is a storable year.
pub fn month_variation(
    store: &mut Store,
    year: i32,
    user: User,
    category: Category,
    month: Month,
) -> f64 {
    let (previous_year, previous) = previous_month(year, month);
    if previous_year != year && YEAR_RANGE.contains(&previous_year) {
        ensure_structure(store, previous_year, user);
    }

    let current_value = cell_value(store, year, user, category, month);
    let previous_value = cell_value(store, previous_year, user, category, previous);
    percent_variation(current_value, previous_value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationTrend {
    Positive,
    Negative,
    Neutral,
}

impl VariationTrend {
    pub fn of(variation: f64) -> Self {
        if variation > 0.0 {
            Self::Positive
        } else if variation < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// `+12.5%` / `-3.0%`, one decimal place.
pub fn format_variation(variation: f64) -> String {
    let sign = if variation >= 0.0 { "+" } else { "" };
    format!("{}{:.1}%", sign, variation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::verify_structure;
    use serde_json::json;

    #[test]
    fn test_percent_variation_zero_baseline() {
        assert_eq!(percent_variation(50.0, 0.0), 100.0);
        assert_eq!(percent_variation(-5.0, 0.0), -100.0);
        assert_eq!(percent_variation(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_percent_variation_uses_absolute_baseline() {
        assert!((percent_variation(110.0, 100.0) - 10.0).abs() < 1e-9);
        assert!((percent_variation(50.0, 100.0) + 50.0).abs() < 1e-9);
        // Going from -100 to -50 is an improvement.
        assert!((percent_variation(-50.0, -100.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_month_variation_within_year() {
        let mut store: Store = serde_json::from_value(json!({
            "years": { "2024": { "RITA": { "ativos": { "janeiro": 200, "fevereiro": 250 } } } }
        }))
        .unwrap();
        let variation = month_variation(&mut store, 2024, User::Rita, Category::Ativos, Month::February);
        assert!((variation - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_january_wraps_to_previous_december() {
        let mut store: Store = serde_json::from_value(json!({
            "years": {
                "2023": { "JORGE": { "pprs": { "dezembro": 400 } } },
                "2024": { "JORGE": { "pprs": { "janeiro": 500 } } }
            }
        }))
        .unwrap();
        let variation = month_variation(&mut store, 2024, User::Jorge, Category::Pprs, Month::January);
        assert!((variation - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_january_against_unvisited_year() {
        let mut store: Store = serde_json::from_value(json!({
            "years": { "2024": { "AMBOS": { "conta-corrente": { "janeiro": {
                "earnings": 900, "expenses": { "essential": 100, "savings": 0, "wants": 0 }
            } } } } }
        }))
        .unwrap();
        let variation = month_variation(
            &mut store,
            2024,
            User::Ambos,
            Category::ContaCorrente,
            Month::January,
        );
        assert_eq!(variation, 100.0);
        assert!(verify_structure(&store, 2023, User::Ambos).is_ok());
    }

    #[test]
    fn test_out_of_range_year_keys_never_reach_the_calculator() {
        let mut store: Store = serde_json::from_value(json!({
            "years": {
                "-2147483648": { "JORGE": { "pprs": { "janeiro": 10 } } },
                "1": { "JORGE": { "pprs": { "janeiro": 20 } } }
            }
        }))
        .unwrap();
        assert_eq!(store.years.keys().copied().collect::<Vec<_>>(), vec![1]);

        let variation = month_variation(&mut store, 1, User::Jorge, Category::Pprs, Month::January);
        assert_eq!(variation, 100.0);
        assert!(!store.years.contains_key(&0));

        let floor = month_variation(&mut store, i32::MIN, User::Jorge, Category::Pprs, Month::January);
        assert_eq!(floor, 0.0);
    }

    #[test]
    fn test_trend_and_format() {
        assert_eq!(VariationTrend::of(3.2), VariationTrend::Positive);
        assert_eq!(VariationTrend::of(-0.1), VariationTrend::Negative);
        assert_eq!(VariationTrend::of(0.0), VariationTrend::Neutral);
        assert_eq!(format_variation(12.345), "+12.3%");
        assert_eq!(format_variation(-3.0), "-3.0%");
        assert_eq!(format_variation(0.0), "+0.0%");
    }
}
