use crate::error::{LedgerError, Result};
use crate::migration::ensure_structure;
use crate::schema::{
    Category, CellValue, CurrentAccountCell, ExpenseBreakdown, Month, Objectives, Store, User,
};
use crate::utils::{sanitize_amount, YEAR_RANGE};
use log::debug;
use serde::{Deserialize, Serialize};

/// A change made from the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LedgerEdit {
    /// Overwrite one current-account month.
    SetCurrentAccount {
        year: i32,
        user: User,
        month: Month,
        earnings: f64,
        essential: f64,
        savings: f64,
        wants: f64,
    },

    /// Overwrite one month of a plain-amount category.
    SetAmount {
        year: i32,
        user: User,
        category: Category,
        month: Month,
        value: f64,
    },

    /// Set the target a category is tracked against.
    SetObjective {
        year: i32,
        user: User,
        category: Category,
        value: f64,
    },

    /// Switch the active year; a year never used before is created.
    SelectYear { year: i32 },

    /// Switch the active user.
    SelectUser { user: User },
}

impl LedgerEdit {
    /// The (year, user) pair this edit touches once applied.
    pub fn touched(&self, store: &Store) -> (i32, User) {
        match self {
            LedgerEdit::SetCurrentAccount { year, user, .. }
            | LedgerEdit::SetAmount { year, user, .. }
            | LedgerEdit::SetObjective { year, user, .. } => (*year, *user),
            LedgerEdit::SelectYear { year } => (*year, store.current_user),
            LedgerEdit::SelectUser { user } => (store.current_year, *user),
        }
    }
}

/// Applies `edit` and leaves the touched pair in the current shape.
///
/// Amounts come from `min=0` inputs: negatives and non-finite values are stored as 0.
pub fn apply_edit(store: &mut Store, edit: &LedgerEdit) -> Result<()> {
    if let LedgerEdit::SetAmount { category, .. } = edit {
        if category.is_current_account() {
            return Err(LedgerError::CategoryMismatch(category.to_string()));
        }
    }

    let (year, user) = edit.touched(store);
    if !YEAR_RANGE.contains(&year) {
        return Err(LedgerError::YearOutOfRange(year));
    }
    ensure_structure(store, year, user);

    match edit {
        LedgerEdit::SetCurrentAccount {
            month,
            earnings,
            essential,
            savings,
            wants,
            ..
        } => {
            let cell = CellValue::CurrentAccount(CurrentAccountCell {
                earnings: sanitize_amount(*earnings),
                expenses: ExpenseBreakdown {
                    essential: sanitize_amount(*essential),
                    savings: sanitize_amount(*savings),
                    wants: sanitize_amount(*wants),
                },
            });
            set_cell(store, year, user, Category::ContaCorrente, *month, cell);
        }

        LedgerEdit::SetAmount {
            category,
            month,
            value,
            ..
        } => {
            let cell = CellValue::Amount(sanitize_amount(*value));
            set_cell(store, year, user, *category, *month, cell);
        }

        LedgerEdit::SetObjective {
            category, value, ..
        } => {
            if let Some(record) = store.years.get_mut(&year).and_then(|y| y.0.get_mut(&user)) {
                record
                    .objectives
                    .get_or_insert_with(Objectives::new)
                    .insert(*category, sanitize_amount(*value));
            }
        }

        LedgerEdit::SelectYear { .. } => store.current_year = year,

        LedgerEdit::SelectUser { .. } => store.current_user = user,
    }

    debug!("Applied {:?}", edit);
    Ok(())
}

fn set_cell(store: &mut Store, year: i32, user: User, category: Category, month: Month, cell: CellValue) {
    if let Some(series) = store
        .years
        .get_mut(&year)
        .and_then(|y| y.0.get_mut(&user))
        .and_then(|r| r.categories.get_mut(&category))
    {
        series.0.insert(month, cell);
    }
}
