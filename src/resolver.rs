use crate::migration::{ensure_structure, read_amount, read_current_account};
use crate::schema::{Category, Month, Store, User};
use crate::utils::months_newest_first;

/// The scalar a cell contributes to dashboards and tables.
///
/// For the current account this is the net balance of the month. A missing cell is
/// worth 0; the store is never modified.
pub fn cell_value(store: &Store, year: i32, user: User, category: Category, month: Month) -> f64 {
    let Some(cell) = store.cell(year, user, category, month) else {
        return 0.0;
    };
    if category.is_current_account() {
        read_current_account(cell).net()
    } else {
        read_amount(cell)
    }
}

/// Whether the month holds anything the user typed in.
pub fn is_filled(store: &Store, year: i32, user: User, category: Category, month: Month) -> bool {
    let Some(cell) = store.cell(year, user, category, month) else {
        return false;
    };
    if category.is_current_account() {
        read_current_account(cell).is_filled()
    } else {
        read_amount(cell) > 0.0
    }
}

/// The most recent meaningful snapshot of a category within a year.
///
/// Scans from December back to January and returns the value of the first filled
/// month, so an untouched December does not hide November's figure. Ensures the
/// (year, user) structure first, which is how trend charts create years that were
/// never visited.
pub fn last_filled_value(store: &mut Store, year: i32, user: User, category: Category) -> f64 {
    ensure_structure(store, year, user);
    let store = &*store;
    months_newest_first()
        .find(|month| is_filled(store, year, user, category, *month))
        .map(|month| cell_value(store, year, user, category, month))
        .unwrap_or(0.0)
}
