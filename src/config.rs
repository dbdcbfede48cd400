use crate::error::{LedgerError, Result};
use crate::utils::YEAR_RANGE;
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest window a yearly trend chart may cover.
pub const MAX_TREND_SPAN: u32 = 200;

/// Tunables shared by the forecaster, the trend views and the export envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EngineSettings {
    #[schemars(
        description = "Yearly growth multiplier assumed when the history has fewer than two positive points (1.05 = +5% a year)."
    )]
    pub fallback_growth_rate: f64,

    #[schemars(
        description = "Lowest growth multiplier a forecast may use. 1.0 means forecasts never shrink."
    )]
    pub minimum_growth_rate: f64,

    #[schemars(description = "First year shown on yearly trend charts.")]
    pub trend_start_year: i32,

    #[schemars(description = "Number of consecutive years shown on yearly trend charts.")]
    pub trend_span_years: u32,

    #[schemars(description = "Application name written into export metadata.")]
    pub app_name: String,

    #[schemars(description = "Data format version written into export metadata.")]
    pub export_version: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            fallback_growth_rate: 1.05,
            minimum_growth_rate: 1.0,
            trend_start_year: 2021,
            trend_span_years: 11,
            app_name: "Gestor Financeiro".to_string(),
            export_version: "3.0".to_string(),
        }
    }
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.fallback_growth_rate.is_finite() && self.fallback_growth_rate > 0.0) {
            return Err(LedgerError::InvalidSettings(format!(
                "fallback_growth_rate must be positive, got {}",
                self.fallback_growth_rate
            )));
        }
        if !(self.minimum_growth_rate.is_finite() && self.minimum_growth_rate > 0.0) {
            return Err(LedgerError::InvalidSettings(format!(
                "minimum_growth_rate must be positive, got {}",
                self.minimum_growth_rate
            )));
        }
        if self.minimum_growth_rate > self.fallback_growth_rate {
            return Err(LedgerError::InvalidSettings(format!(
                "minimum_growth_rate {} exceeds fallback_growth_rate {}",
                self.minimum_growth_rate, self.fallback_growth_rate
            )));
        }
        if !(1..=MAX_TREND_SPAN).contains(&self.trend_span_years) {
            return Err(LedgerError::InvalidSettings(format!(
                "trend_span_years must be between 1 and {}, got {}",
                MAX_TREND_SPAN, self.trend_span_years
            )));
        }
        let last_year = i64::from(self.trend_start_year) + i64::from(self.trend_span_years) - 1;
        if !YEAR_RANGE.contains(&self.trend_start_year)
            || last_year > i64::from(*YEAR_RANGE.end())
        {
            return Err(LedgerError::InvalidSettings(format!(
                "trend window {}..={} leaves the supported years {}..={}",
                self.trend_start_year,
                last_year,
                YEAR_RANGE.start(),
                YEAR_RANGE.end()
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&content)?;
        info!("Loaded engine settings from {}", path.display());
        Ok(settings)
    }

    pub fn trend_years(&self) -> Vec<i32> {
        crate::utils::year_window(self.trend_start_year, self.trend_span_years)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(EngineSettings);
        serde_json::to_string_pretty(&schema)
    }
}
