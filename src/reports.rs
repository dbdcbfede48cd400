use crate::migration::read_current_account;
use crate::resolver::{cell_value, last_filled_value};
use crate::schema::{Category, ExpenseBreakdown, Month, Store, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    Low,
    Medium,
    Good,
    Complete,
}

impl ProgressBand {
    pub fn of(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Complete
        } else if percentage >= 75.0 {
            Self::Good
        } else if percentage >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Share of an objective reached, or `None` when no objective is set.
pub fn objective_progress(value: f64, objective: f64) -> Option<f64> {
    if objective > 0.0 {
        Some(value / objective * 100.0)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub last_value: f64,
    pub objective: f64,
    pub progress: Option<f64>,
    pub band: Option<ProgressBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub user: User,
    pub categories: Vec<CategorySummary>,
    pub total_value: f64,
    pub total_objective: f64,
    pub total_progress: Option<f64>,
}

impl DashboardSummary {
    pub fn build(store: &mut Store, year: i32, user: User) -> Self {
        let mut categories = Vec::with_capacity(Category::ALL.len());

        for category in Category::ALL {
            let last_value = last_filled_value(store, year, user, category);
            let objective = store
                .user_record(year, user)
                .map(|r| r.objective(category))
                .unwrap_or(0.0);
            let progress = objective_progress(last_value, objective);
            categories.push(CategorySummary {
                category,
                last_value,
                objective,
                progress,
                band: progress.map(ProgressBand::of),
            });
        }

        let total_value = categories.iter().map(|c| c.last_value).sum();
        let total_objective = categories.iter().map(|c| c.objective).sum();

        Self {
            year,
            user,
            categories,
            total_value,
            total_objective,
            total_progress: objective_progress(total_value, total_objective),
        }
    }

    pub fn category(&self, category: Category) -> Option<&CategorySummary> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualRow {
    pub category: Category,
    pub months: [f64; 12],
}

/// Month-by-month values of every category plus a per-month total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualTable {
    pub year: i32,
    pub user: User,
    pub rows: Vec<AnnualRow>,
    pub totals: [f64; 12],
}

impl AnnualTable {
    pub fn build(store: &Store, year: i32, user: User) -> Self {
        let rows: Vec<AnnualRow> = Category::ALL
            .iter()
            .map(|category| {
                let mut months = [0.0; 12];
                for month in Month::ALL {
                    months[month.index()] = cell_value(store, year, user, *category, month);
                }
                AnnualRow {
                    category: *category,
                    months,
                }
            })
            .collect();

        let mut totals = [0.0; 12];
        for row in &rows {
            for (total, value) in totals.iter_mut().zip(row.months.iter()) {
                *total += value;
            }
        }

        Self {
            year,
            user,
            rows,
            totals,
        }
    }

    pub fn row(&self, category: Category) -> Option<&AnnualRow> {
        self.rows.iter().find(|r| r.category == category)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// What a yearly trend line follows: one category, or the sum of all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLine {
    Category(Category),
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub year: i32,
    pub value: f64,
}

/// Year-end snapshot of `line` for each of `years`. Years never visited are created
/// with default values on the way.
pub fn yearly_trend(store: &mut Store, user: User, line: TrendLine, years: &[i32]) -> Vec<TrendPoint> {
    years
        .iter()
        .map(|year| {
            let value = match line {
                TrendLine::Category(category) => last_filled_value(store, *year, user, category),
                TrendLine::Total => Category::ALL
                    .iter()
                    .map(|category| last_filled_value(store, *year, user, *category))
                    .sum(),
            };
            TrendPoint { year: *year, value }
        })
        .collect()
}

/// The three expense buckets of a current-account month and their shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseShares {
    pub expenses: ExpenseBreakdown,
    pub total: f64,
    /// Percentages of `total` as (essential, savings, wants); `None` without expenses.
    pub shares: Option<(f64, f64, f64)>,
}

impl ExpenseShares {
    pub fn for_month(store: &Store, year: i32, user: User, month: Month) -> Self {
        let expenses = store
            .cell(year, user, Category::ContaCorrente, month)
            .map(|cell| read_current_account(cell).expenses)
            .unwrap_or_default();
        let total = expenses.total();
        let shares = (total > 0.0).then(|| {
            (
                expenses.essential / total * 100.0,
                expenses.savings / total * 100.0,
                expenses.wants / total * 100.0,
            )
        });
        Self {
            expenses,
            total,
            shares,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> Store {
        serde_json::from_value(json!({
            "years": { "2024": { "AMBOS": {
                "conta-corrente": {
                    "fevereiro": { "earnings": 3000, "expenses": { "essential": 1000, "savings": 500, "wants": 500 } }
                },
                "ativos": { "março": 8000 },
                "pprs": { "janeiro": 1000, "outubro": 1500 },
                "poupancas": {},
                "objectives": { "ativos": 10000, "pprs": 1000 }
            } } },
            "currentYear": 2024
        }))
        .unwrap()
    }

    #[test]
    fn test_progress_bands() {
        assert_eq!(ProgressBand::of(10.0), ProgressBand::Low);
        assert_eq!(ProgressBand::of(50.0), ProgressBand::Medium);
        assert_eq!(ProgressBand::of(80.0), ProgressBand::Good);
        assert_eq!(ProgressBand::of(100.0), ProgressBand::Complete);
        assert_eq!(objective_progress(5.0, 0.0), None);
    }

    #[test]
    fn test_dashboard_summary() {
        let mut store = store();
        let summary = DashboardSummary::build(&mut store, 2024, User::Ambos);

        let ativos = summary.category(Category::Ativos).unwrap();
        assert_eq!(ativos.last_value, 8000.0);
        assert_eq!(ativos.progress, Some(80.0));
        assert_eq!(ativos.band, Some(ProgressBand::Good));

        let pprs = summary.category(Category::Pprs).unwrap();
        assert_eq!(pprs.last_value, 1500.0);
        assert_eq!(pprs.band, Some(ProgressBand::Complete));

        let cc = summary.category(Category::ContaCorrente).unwrap();
        assert_eq!(cc.last_value, 1000.0);
        assert_eq!(cc.progress, None);

        assert_eq!(summary.total_value, 10500.0);
        assert_eq!(summary.total_objective, 11000.0);
        assert!(summary.to_json().unwrap().contains("total_progress"));
    }

    #[test]
    fn test_annual_table() {
        let store = store();
        let table = AnnualTable::build(&store, 2024, User::Ambos);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.row(Category::Pprs).unwrap().months[9], 1500.0);
        assert_eq!(table.totals[0], 1000.0);
        assert_eq!(table.totals[1], 1000.0);
        assert_eq!(table.totals[2], 8000.0);
        assert_eq!(table.totals[11], 0.0);
    }

    #[test]
    fn test_yearly_trend_total() {
        let mut store = store();
        let trend = yearly_trend(&mut store, User::Ambos, TrendLine::Total, &[2023, 2024]);
        assert_eq!(trend[0], TrendPoint { year: 2023, value: 0.0 });
        assert_eq!(trend[1].value, 10500.0);
        // The unvisited year now exists for the trend's user only.
        assert!(store.user_record(2023, User::Ambos).is_some());
        assert!(store.user_record(2023, User::Rita).is_none());
    }

    #[test]
    fn test_expense_shares() {
        let store = store();
        let feb = ExpenseShares::for_month(&store, 2024, User::Ambos, Month::February);
        assert_eq!(feb.total, 2000.0);
        assert_eq!(feb.shares, Some((50.0, 25.0, 25.0)));

        let may = ExpenseShares::for_month(&store, 2024, User::Ambos, Month::May);
        assert_eq!(may.total, 0.0);
        assert_eq!(may.shares, None);
    }
}
