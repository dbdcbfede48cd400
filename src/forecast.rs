use crate::config::EngineSettings;
use crate::reports::{yearly_trend, TrendLine, TrendPoint};
use crate::schema::{Store, User};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_GROWTH_RATE: f64 = 1.05;
pub const MINIMUM_GROWTH_RATE: f64 = 1.0;

/// Estimates yearly growth from history and compounds it forward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthForecaster {
    fallback_rate: f64,
    minimum_rate: f64,
}

impl Default for GrowthForecaster {
    fn default() -> Self {
        Self {
            fallback_rate: DEFAULT_GROWTH_RATE,
            minimum_rate: MINIMUM_GROWTH_RATE,
        }
    }
}

impl GrowthForecaster {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            fallback_rate: settings.fallback_growth_rate,
            minimum_rate: settings.minimum_growth_rate,
        }
    }

    /// Mean of the `current / previous` ratios of adjacent points.
    ///
    /// Needs at least two positive points, otherwise the fallback rate is used. Pairs
    /// whose earlier point is not positive are skipped rather than counted as zero.
    /// The result never goes below the minimum rate: forecasts assume no shrinkage.
    pub fn average_growth_rate(&self, series: &[f64]) -> f64 {
        let positive_points = series.iter().filter(|v| **v > 0.0).count();
        if positive_points < 2 {
            return self.fallback_rate;
        }

        let ratios: Vec<f64> = series
            .windows(2)
            .filter(|pair| pair[0] > 0.0)
            .map(|pair| pair[1] / pair[0])
            .collect();

        if ratios.is_empty() {
            return self.fallback_rate;
        }

        let average = ratios.iter().sum::<f64>() / ratios.len() as f64;
        average.max(self.minimum_rate)
    }

    /// `periods` values, the i-th being `last_value × rate^(i+1)`.
    pub fn project(&self, last_value: f64, rate: f64, periods: usize) -> Vec<f64> {
        (1..=periods)
            .map(|step| last_value * rate.powi(step as i32))
            .collect()
    }
}

pub fn average_growth_rate(series: &[f64]) -> f64 {
    GrowthForecaster::default().average_growth_rate(series)
}

pub fn project(last_value: f64, rate: f64, periods: usize) -> Vec<f64> {
    GrowthForecaster::default().project(last_value, rate, periods)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub line: TrendLine,
    pub history: Vec<TrendPoint>,
    pub growth_rate: f64,
    pub projected: Vec<TrendPoint>,
}

/// Builds the yearly history of `line` over `years` and projects `periods` more years
/// from the last historical value.
pub fn forecast_trend(
    store: &mut Store,
    forecaster: &GrowthForecaster,
    user: User,
    line: TrendLine,
    years: &[i32],
    periods: usize,
) -> TrendForecast {
    let history = yearly_trend(store, user, line, years);
    let values: Vec<f64> = history.iter().map(|p| p.value).collect();
    let growth_rate = forecaster.average_growth_rate(&values);

    let (last_year, last_value) = history
        .last()
        .map(|p| (p.year, p.value))
        .unwrap_or((store.current_year, 0.0));

    let projected = forecaster
        .project(last_value, growth_rate, periods)
        .into_iter()
        .zip(1..)
        .map_while(|(value, step)| {
            Some(TrendPoint {
                year: last_year.checked_add(step)?,
                value,
            })
        })
        .collect();

    debug!(
        "Forecast for {:?} ({}): rate {:.4} over {} years of history",
        line,
        user,
        growth_rate,
        history.len()
    );

    TrendForecast {
        line,
        history,
        growth_rate,
        projected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Category;
    use serde_json::json;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fallback_with_one_positive_point() {
        assert_eq!(average_growth_rate(&[0.0, 0.0, 100.0]), 1.05);
        assert_eq!(average_growth_rate(&[]), 1.05);
    }

    #[test]
    fn test_constant_growth() {
        assert!(close(average_growth_rate(&[100.0, 110.0, 121.0]), 1.1));
    }

    #[test]
    fn test_zero_baselines_are_skipped() {
        // Pairs (0,100) and (0,50) are skipped; (100,0) counts as ratio 0, (50,75) as 1.5.
        let rate = average_growth_rate(&[0.0, 100.0, 0.0, 50.0, 75.0]);
        assert!(close(rate, 1.0));
        let rate = average_growth_rate(&[0.0, 100.0, 150.0]);
        assert!(close(rate, 1.5));
    }

    #[test]
    fn test_clamped_to_no_shrinkage() {
        assert_eq!(average_growth_rate(&[200.0, 100.0, 50.0]), 1.0);
    }

    #[test]
    fn test_configured_rates() {
        let settings = EngineSettings {
            fallback_growth_rate: 1.02,
            minimum_growth_rate: 0.9,
            ..EngineSettings::default()
        };
        let forecaster = GrowthForecaster::new(&settings);
        assert_eq!(forecaster.average_growth_rate(&[10.0]), 1.02);
        assert!(close(forecaster.average_growth_rate(&[100.0, 95.0]), 0.95));
    }

    #[test]
    fn test_projection_compounds() {
        let projected = project(100.0, 1.1, 3);
        assert_eq!(projected.len(), 3);
        assert!(close(projected[0], 110.0));
        assert!(close(projected[1], 121.0));
        assert!((projected[2] - 133.1).abs() < 1e-6);
        assert!(project(100.0, 1.1, 0).is_empty());
    }

    #[test]
    fn test_forecast_trend_from_store() {
        let mut store: Store = serde_json::from_value(json!({
            "years": {
                "2021": { "JORGE": { "pprs": { "dezembro": 1000 } } },
                "2022": { "JORGE": { "pprs": { "junho": 1100 } } },
                "2023": { "JORGE": { "pprs": { "março": 1210 } } }
            },
            "currentYear": 2023
        }))
        .unwrap();

        let forecast = forecast_trend(
            &mut store,
            &GrowthForecaster::default(),
            User::Jorge,
            TrendLine::Category(Category::Pprs),
            &[2021, 2022, 2023],
            2,
        );

        assert!(close(forecast.growth_rate, 1.1));
        assert_eq!(forecast.history.len(), 3);
        assert_eq!(forecast.projected[0].year, 2024);
        assert!((forecast.projected[0].value - 1331.0).abs() < 1e-6);
        assert_eq!(forecast.projected[1].year, 2025);
    }
}
