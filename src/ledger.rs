use crate::config::EngineSettings;
use crate::edits::{apply_edit, LedgerEdit};
use crate::error::{LedgerError, Result};
use crate::forecast::{forecast_trend, GrowthForecaster, TrendForecast};
use crate::ingestion::{export_json, import_json, ImportSummary};
use crate::reports::{yearly_trend, AnnualTable, DashboardSummary, TrendLine, TrendPoint};
use crate::schema::{Category, Month, Store, User};
use crate::storage::{load_store, save_store, LoadOutcome, StoreStorage};
use crate::utils::YEAR_RANGE;
use crate::variation::month_variation;
use chrono::{DateTime, Utc};
use log::info;

/// The store, its storage and the settings, wired together so that every mutation is
/// followed by a repair of the touched pair and an immediate save.
pub struct Ledger<S: StoreStorage> {
    store: Store,
    storage: S,
    settings: EngineSettings,
}

impl<S: StoreStorage> Ledger<S> {
    /// Loads whatever `storage` holds. Corrupt data is replaced by a fresh store; the
    /// returned outcome tells the caller whether to warn the user.
    pub fn open(storage: S, settings: EngineSettings, today_year: i32) -> Result<(Self, LoadOutcome)> {
        settings.validate()?;
        let blob = storage.read()?;
        let (store, outcome) = load_store(blob.as_deref(), today_year);
        let ledger = Self {
            store,
            storage,
            settings,
        };
        if outcome != LoadOutcome::Loaded {
            ledger.save()?;
        }
        Ok((ledger, outcome))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn save(&self) -> Result<()> {
        let blob = save_store(&self.store)?;
        self.storage.write(&blob)
    }

    pub fn apply(&mut self, edit: &LedgerEdit) -> Result<()> {
        apply_edit(&mut self.store, edit)?;
        self.save()
    }

    /// Replaces the whole store with an import file. A rejected file changes nothing
    /// and is not saved.
    pub fn import_json(&mut self, text: &str) -> Result<ImportSummary> {
        let summary = import_json(&mut self.store, text)?;
        self.save()?;
        info!(
            "Imported {} years ({} year/user pairs)",
            summary.years, summary.pairs
        );
        Ok(summary)
    }

    pub fn export_json(&mut self, now: DateTime<Utc>) -> Result<String> {
        export_json(&mut self.store, &self.settings, now)
    }

    /// Clears every record and starts over with `year` selected.
    pub fn reset(&mut self, year: i32) -> Result<()> {
        if !YEAR_RANGE.contains(&year) {
            return Err(LedgerError::YearOutOfRange(year));
        }
        info!("Reinitializing all data");
        self.store.reinitialize(year);
        self.save()
    }

    pub fn dashboard(&mut self) -> DashboardSummary {
        let (year, user) = (self.store.current_year, self.store.current_user);
        DashboardSummary::build(&mut self.store, year, user)
    }

    pub fn annual_table(&self) -> AnnualTable {
        AnnualTable::build(&self.store, self.store.current_year, self.store.current_user)
    }

    pub fn month_variation(&mut self, category: Category, month: Month) -> f64 {
        let (year, user) = (self.store.current_year, self.store.current_user);
        month_variation(&mut self.store, year, user, category, month)
    }

    /// The yearly trend of the active user over the configured window.
    pub fn trend(&mut self, line: TrendLine) -> Vec<TrendPoint> {
        let years = self.settings.trend_years();
        let user = self.store.current_user;
        yearly_trend(&mut self.store, user, line, &years)
    }

    pub fn forecast(&mut self, line: TrendLine, periods: usize) -> TrendForecast {
        let years = self.settings.trend_years();
        let user = self.store.current_user;
        let forecaster = GrowthForecaster::new(&self.settings);
        forecast_trend(&mut self.store, &forecaster, user, line, &years, periods)
    }

    pub fn select(&mut self, year: i32, user: User) -> Result<()> {
        apply_edit(&mut self.store, &LedgerEdit::SelectYear { year })?;
        self.apply(&LedgerEdit::SelectUser { user })
    }
}
