//! Structural repair and schema upgrades for a (year, user) subtree.
//!
//! Blobs written by older versions of the application stored the current-account
//! expenses as a single number, or stored the whole month as a bare number. Those
//! shapes survive decoding as [`CellValue::Legacy`] / [`CellValue::Amount`] and are
//! rewritten here. The repair is idempotent and never fails: anything that cannot be
//! read with confidence becomes the category's zero value.

use crate::error::{LedgerError, Result};
use crate::schema::{
    field, Category, CategorySeries, CellValue, CurrentAccountCell, ExpenseBreakdown, LegacyCell,
    Month, Objectives, PartialRecord, Store, User, UserRecord,
};
use log::debug;
use serde_json::{Map, Value};

/// The historical shapes a current-account cell can be found in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurrentAccountShape<'a> {
    /// `{earnings, expenses: {essential, savings, wants}}`
    CurrentShape(&'a CurrentAccountCell),
    /// The whole month stored as one number.
    LegacyScalar(f64),
    /// An object without the three-bucket `expenses` record.
    PartialRecord(&'a PartialRecord),
    Unrecognized,
}

pub fn classify_current_account(cell: &CellValue) -> CurrentAccountShape<'_> {
    match cell {
        CellValue::CurrentAccount(current) => CurrentAccountShape::CurrentShape(current),
        CellValue::Amount(value) => CurrentAccountShape::LegacyScalar(*value),
        CellValue::Legacy(LegacyCell::Record(record)) => CurrentAccountShape::PartialRecord(record),
        CellValue::Legacy(LegacyCell::Unrecognized(_)) => CurrentAccountShape::Unrecognized,
    }
}

/// Reads any cell as a current-account month without touching the store.
///
/// An unlabeled legacy expense is assumed to have been essential spending. The old
/// data cannot tell us which bucket it belonged to; this keeps totals intact.
pub fn upgrade_current_account(shape: CurrentAccountShape<'_>) -> CurrentAccountCell {
    match shape {
        CurrentAccountShape::CurrentShape(current) => *current,
        CurrentAccountShape::LegacyScalar(total) => CurrentAccountCell {
            earnings: 0.0,
            expenses: ExpenseBreakdown {
                essential: total,
                ..ExpenseBreakdown::default()
            },
        },
        CurrentAccountShape::PartialRecord(record) => recover_partial(record),
        CurrentAccountShape::Unrecognized => CurrentAccountCell::default(),
    }
}

pub fn read_current_account(cell: &CellValue) -> CurrentAccountCell {
    upgrade_current_account(classify_current_account(cell))
}

/// Reads a cell of a plain-amount category. Only numbers count.
pub fn read_amount(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Amount(value) => *value,
        CellValue::CurrentAccount(_) | CellValue::Legacy(_) => 0.0,
    }
}

fn recover_partial(record: &PartialRecord) -> CurrentAccountCell {
    let earnings = record
        .earnings
        .as_ref()
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let expenses = match &record.expenses {
        Some(Value::Number(total)) => ExpenseBreakdown {
            essential: total.as_f64().unwrap_or(0.0),
            ..ExpenseBreakdown::default()
        },
        Some(Value::Object(buckets)) => ExpenseBreakdown {
            essential: bucket(buckets, "essential", "essenciais"),
            savings: bucket(buckets, "savings", "poupancas"),
            wants: bucket(buckets, "wants", "desejos"),
        },
        _ => ExpenseBreakdown::default(),
    };

    CurrentAccountCell { earnings, expenses }
}

fn bucket(buckets: &Map<String, Value>, key: &str, legacy_key: &str) -> f64 {
    field(buckets, key, legacy_key)
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

/// What a call to [`ensure_structure`] had to change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub created_user: bool,
    pub created_categories: Vec<Category>,
    pub filled_months: usize,
    pub upgraded_cells: usize,
    pub filled_objectives: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        !self.created_user
            && self.created_categories.is_empty()
            && self.filled_months == 0
            && self.upgraded_cells == 0
            && self.filled_objectives == 0
    }
}

/// Guarantees that `year`/`user` exists with all five categories, twelve months each,
/// every cell in its current shape and a complete objectives map.
pub fn ensure_structure(store: &mut Store, year: i32, user: User) -> MigrationReport {
    let mut report = MigrationReport::default();

    let year_record = store.years.entry(year).or_default();
    let record = year_record.0.entry(user).or_insert_with(|| {
        report.created_user = true;
        UserRecord::default()
    });

    for category in Category::ALL {
        let series = record.categories.entry(category).or_insert_with(|| {
            report.created_categories.push(category);
            category.default_series()
        });
        repair_series(category, series, &mut report);
    }

    let objectives = record.objectives.get_or_insert_with(Objectives::new);
    for category in Category::ALL {
        if !objectives.contains_key(&category) {
            objectives.insert(category, 0.0);
            report.filled_objectives += 1;
        }
    }

    if report.created_user {
        debug!("Created default structure for {} in {}", user, year);
    } else if !report.is_noop() {
        debug!("Repaired structure for {} in {}: {:?}", user, year, report);
    }

    report
}

fn repair_series(category: Category, series: &mut CategorySeries, report: &mut MigrationReport) {
    for month in Month::ALL {
        match series.0.get_mut(&month) {
            None => {
                series.0.insert(month, category.default_cell());
                report.filled_months += 1;
            }
            Some(cell) => {
                if upgrade_cell(category, cell) {
                    report.upgraded_cells += 1;
                }
            }
        }
    }
}

/// Rewrites `cell` into the current shape for `category`. Returns whether it changed.
fn upgrade_cell(category: Category, cell: &mut CellValue) -> bool {
    if category.is_current_account() {
        let upgraded = match classify_current_account(cell) {
            CurrentAccountShape::CurrentShape(_) => return false,
            shape => upgrade_current_account(shape),
        };
        *cell = CellValue::CurrentAccount(upgraded);
        true
    } else {
        match cell {
            CellValue::Amount(_) => false,
            CellValue::CurrentAccount(_) | CellValue::Legacy(_) => {
                *cell = CellValue::Amount(0.0);
                true
            }
        }
    }
}

/// Ensures all three users of `year`.
pub fn ensure_year(store: &mut Store, year: i32) {
    for user in User::ALL {
        ensure_structure(store, year, user);
    }
}

/// Ensures every (year, user) pair already present in the store.
pub fn ensure_all(store: &mut Store) -> usize {
    let pairs = store.pairs();
    let mut repaired = 0;
    for (year, user) in &pairs {
        if !ensure_structure(store, *year, *user).is_noop() {
            repaired += 1;
        }
    }
    debug!(
        "Ensured {} year/user pairs ({} needed repairs)",
        pairs.len(),
        repaired
    );
    repaired
}

/// Checks the post-conditions of [`ensure_structure`] without changing anything.
pub fn verify_structure(store: &Store, year: i32, user: User) -> Result<()> {
    let violation = |details: String| LedgerError::StructureViolation {
        year,
        user: user.to_string(),
        details,
    };

    let record = store
        .user_record(year, user)
        .ok_or_else(|| violation("record is missing".to_string()))?;

    for category in Category::ALL {
        let series = record
            .series(category)
            .ok_or_else(|| violation(format!("category {} is missing", category)))?;

        for month in Month::ALL {
            let cell = series
                .get(month)
                .ok_or_else(|| violation(format!("{} has no {}", category, month)))?;

            let current = match (category.is_current_account(), cell) {
                (true, CellValue::CurrentAccount(_)) => true,
                (false, CellValue::Amount(_)) => true,
                _ => false,
            };
            if !current {
                return Err(violation(format!(
                    "{} {} is not in the current shape",
                    category, month
                )));
            }
        }
    }

    let objectives = record
        .objectives
        .as_ref()
        .ok_or_else(|| violation("objectives are missing".to_string()))?;
    if let Some(category) = Category::ALL.iter().find(|c| !objectives.contains_key(*c)) {
        return Err(violation(format!("objective for {} is missing", category)));
    }

    Ok(())
}
