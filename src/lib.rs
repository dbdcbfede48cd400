//! # Household Ledger
//!
//! The data model engine behind a household finance tracker: monthly earnings and
//! expenses, assets, retirement plans, savings and goals, kept per user and per year.
//!
//! ## Core Concepts
//!
//! - **Store**: years → users → categories → months, plus the active year and user
//! - **Current account**: a month of earnings minus three expense buckets
//!   (essential, savings, wants); every other category holds a plain amount
//! - **Ensure/migrate**: [`ensure_structure`] fills in missing records and upgrades cells
//!   written by older versions. It is idempotent and never fails
//! - **Last filled value**: the latest month of a year that holds anything, used as
//!   that year's snapshot on dashboards and trend charts
//! - **Growth forecast**: the average year-over-year ratio of a history, compounded
//!   forward, never below 1.0
//!
//! ## Example
//!
//! ```rust,ignore
//! use household_ledger::*;
//!
//! let (mut ledger, outcome) = Ledger::open(
//!     JsonFileStorage::new("finance_data.json"),
//!     EngineSettings::default(),
//!     2024,
//! )?;
//! if outcome.needs_notice() {
//!     eprintln!("Saved data was unreadable and has been reset");
//! }
//!
//! ledger.apply(&LedgerEdit::SetCurrentAccount {
//!     year: 2024,
//!     user: User::Ambos,
//!     month: Month::January,
//!     earnings: 3000.0,
//!     essential: 1200.0,
//!     savings: 500.0,
//!     wants: 300.0,
//! })?;
//!
//! let summary = ledger.dashboard();
//! let forecast = ledger.forecast(TrendLine::Total, 5);
//! ```

pub mod config;
pub mod edits;
pub mod error;
pub mod forecast;
pub mod ingestion;
pub mod ledger;
pub mod migration;
pub mod reports;
pub mod resolver;
pub mod schema;
pub mod storage;
pub mod utils;
pub mod variation;

pub use config::EngineSettings;
pub use edits::{apply_edit, LedgerEdit};
pub use error::{LedgerError, Result};
pub use forecast::{average_growth_rate, forecast_trend, project, GrowthForecaster, TrendForecast};
pub use ingestion::{export_envelope, export_json, import_json, parse_import, ImportFormat, ImportSummary};
pub use ledger::Ledger;
pub use migration::{
    ensure_all, ensure_structure, ensure_year, verify_structure, CurrentAccountShape,
    MigrationReport,
};
pub use reports::*;
pub use resolver::{cell_value, last_filled_value};
pub use schema::*;
pub use storage::{load_store, save_store, JsonFileStorage, LoadOutcome, MemoryStorage, StoreStorage};
pub use utils::*;
pub use variation::{format_variation, month_variation, percent_variation, VariationTrend};
