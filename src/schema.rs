use chrono::{Datelike, Local};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::utils::{parse_key, parse_year_key, YEAR_RANGE};

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum User {
    Jorge,
    Rita,
    /// Shared household view.
    #[default]
    Ambos,
}

impl User {
    pub const ALL: [User; 3] = [User::Jorge, User::Rita, User::Ambos];
}

serde_plain::derive_display_from_serialize!(User);
serde_plain::derive_fromstr_from_deserialize!(User);

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Monthly earnings minus three expense buckets.
    ContaCorrente,
    Ativos,
    /// Retirement savings plans.
    Pprs,
    Poupancas,
    Outros,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ContaCorrente,
        Category::Ativos,
        Category::Pprs,
        Category::Poupancas,
        Category::Outros,
    ];

    pub fn is_current_account(self) -> bool {
        self == Category::ContaCorrente
    }

    /// The zero value a freshly created month holds for this category.
    pub fn default_cell(self) -> CellValue {
        if self.is_current_account() {
            CellValue::CurrentAccount(CurrentAccountCell::default())
        } else {
            CellValue::Amount(0.0)
        }
    }

    pub fn default_series(self) -> CategorySeries {
        CategorySeries(
            Month::ALL
                .iter()
                .map(|month| (*month, self.default_cell()))
                .collect(),
        )
    }
}

serde_plain::derive_display_from_serialize!(Category);
serde_plain::derive_fromstr_from_deserialize!(Category);

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Month {
    #[serde(rename = "janeiro")]
    January,
    #[serde(rename = "fevereiro")]
    February,
    #[serde(rename = "março")]
    March,
    #[serde(rename = "abril")]
    April,
    #[serde(rename = "maio")]
    May,
    #[serde(rename = "junho")]
    June,
    #[serde(rename = "julho")]
    July,
    #[serde(rename = "agosto")]
    August,
    #[serde(rename = "setembro")]
    September,
    #[serde(rename = "outubro")]
    October,
    #[serde(rename = "novembro")]
    November,
    #[serde(rename = "dezembro")]
    December,
}

serde_plain::derive_display_from_serialize!(Month);
serde_plain::derive_fromstr_from_deserialize!(Month);

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 0-based position in the calendar (January = 0).
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    /// Rent, groceries, utilities.
    pub essential: f64,
    /// Money moved out of the account into savings.
    pub savings: f64,
    pub wants: f64,
}

impl ExpenseBreakdown {
    pub fn total(&self) -> f64 {
        self.essential + self.savings + self.wants
    }

    /// Reads the three buckets of an expenses object. `None` unless all three are numbers.
    pub fn from_map(buckets: &Map<String, Value>) -> Option<Self> {
        let bucket =
            |key: &str, legacy_key: &str| field(buckets, key, legacy_key).and_then(Value::as_f64);
        Some(Self {
            essential: bucket("essential", "essenciais")?,
            savings: bucket("savings", "poupancas")?,
            wants: bucket("wants", "desejos")?,
        })
    }
}

/// Looks a field up by its current name, then by the Portuguese name older versions wrote.
pub(crate) fn field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    legacy_key: &str,
) -> Option<&'a Value> {
    map.get(key).or_else(|| map.get(legacy_key))
}

/// A current-account month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentAccountCell {
    #[serde(default)]
    pub earnings: f64,
    pub expenses: ExpenseBreakdown,
}

impl CurrentAccountCell {
    pub fn net(&self) -> f64 {
        self.earnings - self.expenses.total()
    }

    pub fn is_filled(&self) -> bool {
        self.earnings > 0.0
            || self.expenses.essential > 0.0
            || self.expenses.savings > 0.0
            || self.expenses.wants > 0.0
    }
}

/// A record that looks like an older current-account cell: an object without the
/// three-bucket `expenses` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earnings: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Value>,
}

impl PartialRecord {
    /// Picks earnings and expenses out of a record. The current names win when a record
    /// carries both spellings.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            earnings: field(map, "earnings", "ganhos").cloned(),
            expenses: field(map, "expenses", "gastos").cloned(),
        }
    }

    /// The record as a current-account month, if it already has that shape: numeric
    /// (or absent) earnings and an expenses object with all three buckets.
    pub fn as_current(&self) -> Option<CurrentAccountCell> {
        let earnings = match &self.earnings {
            None => 0.0,
            Some(value) => value.as_f64()?,
        };
        let Some(Value::Object(buckets)) = &self.expenses else {
            return None;
        };
        Some(CurrentAccountCell {
            earnings,
            expenses: ExpenseBreakdown::from_map(buckets)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LegacyCell {
    Record(PartialRecord),
    Unrecognized(Value),
}

/// The value stored for one (year, user, category, month).
///
/// `CurrentAccount` and `Amount` are the two current shapes, selected by category;
/// `Legacy` only exists between decoding an old blob and running the migrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    CurrentAccount(CurrentAccountCell),
    Amount(f64),
    Legacy(LegacyCell),
}

/// Sorts a raw cell by its JSON kind. Only objects can be records and only numbers can
/// be amounts; arrays, strings, booleans and null are unrecognized.
impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(number) => match number.as_f64() {
                Some(amount) => CellValue::Amount(amount),
                None => CellValue::Legacy(LegacyCell::Unrecognized(Value::Number(number))),
            },
            Value::Object(map) => {
                let record = PartialRecord::from_map(&map);
                match record.as_current() {
                    Some(current) => CellValue::CurrentAccount(current),
                    None => CellValue::Legacy(LegacyCell::Record(record)),
                }
            }
            other => CellValue::Legacy(LegacyCell::Unrecognized(other)),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(CellValue::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct CategorySeries(pub BTreeMap<Month, CellValue>);

impl CategorySeries {
    pub fn get(&self, month: Month) -> Option<&CellValue> {
        self.0.get(&month)
    }
}

impl From<BTreeMap<String, Value>> for CategorySeries {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut months = BTreeMap::new();
        for (key, value) in raw {
            let Some(month) = parse_key::<Month>(&key, "month") else {
                continue;
            };
            months.insert(month, CellValue::from(value));
        }
        Self(months)
    }
}

pub type Objectives = BTreeMap<Category, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct UserRecord {
    #[serde(flatten)]
    pub categories: BTreeMap<Category, CategorySeries>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub objectives: Option<Objectives>,
}

impl UserRecord {
    pub fn series(&self, category: Category) -> Option<&CategorySeries> {
        self.categories.get(&category)
    }

    pub fn cell(&self, category: Category, month: Month) -> Option<&CellValue> {
        self.series(category).and_then(|s| s.get(month))
    }

    pub fn objective(&self, category: Category) -> f64 {
        self.objectives
            .as_ref()
            .and_then(|o| o.get(&category))
            .copied()
            .unwrap_or(0.0)
    }
}

impl From<BTreeMap<String, Value>> for UserRecord {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut record = UserRecord::default();
        for (key, value) in raw {
            if key == "objectives" {
                record.objectives = Some(decode_objectives(value));
                continue;
            }
            let Some(category) = parse_key::<Category>(&key, "category") else {
                continue;
            };
            match serde_json::from_value::<CategorySeries>(value) {
                Ok(series) => {
                    record.categories.insert(category, series);
                }
                Err(e) => warn!("Dropping malformed series {}: {}", key, e),
            }
        }
        record
    }
}

fn decode_objectives(value: Value) -> Objectives {
    let Value::Object(entries) = value else {
        warn!("Objectives are not a map; resetting them");
        return Objectives::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let category = parse_key::<Category>(&key, "objective")?;
            match value.as_f64() {
                Some(target) => Some((category, target)),
                None => {
                    warn!("Dropping non-numeric objective for {}", key);
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct YearRecord(pub BTreeMap<User, UserRecord>);

impl YearRecord {
    pub fn user(&self, user: User) -> Option<&UserRecord> {
        self.0.get(&user)
    }
}

impl From<BTreeMap<String, Value>> for YearRecord {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut users = BTreeMap::new();
        for (key, value) in raw {
            let Some(user) = parse_key::<User>(&key, "user") else {
                continue;
            };
            match serde_json::from_value::<UserRecord>(value) {
                Ok(record) => {
                    users.insert(user, record);
                }
                Err(e) => warn!("Dropping malformed record for {}: {}", key, e),
            }
        }
        Self(users)
    }
}

/// The whole household ledger plus the active selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawStore")]
pub struct Store {
    pub years: BTreeMap<i32, YearRecord>,
    pub current_user: User,
    pub current_year: i32,
}

impl Store {
    /// An empty store selecting `year`. Nothing is created until a pair is ensured.
    pub fn empty(year: i32) -> Self {
        Self {
            years: BTreeMap::new(),
            current_user: User::default(),
            current_year: year,
        }
    }

    pub fn user_record(&self, year: i32, user: User) -> Option<&UserRecord> {
        self.years.get(&year).and_then(|y| y.user(user))
    }

    pub fn cell(&self, year: i32, user: User, category: Category, month: Month) -> Option<&CellValue> {
        self.user_record(year, user)
            .and_then(|r| r.cell(category, month))
    }

    /// Every (year, user) pair present in the store, in key order.
    pub fn pairs(&self) -> Vec<(i32, User)> {
        self.years
            .iter()
            .flat_map(|(year, record)| record.0.keys().map(move |user| (*year, *user)))
            .collect()
    }
}

/// Loose top-level shape used while decoding a persisted or imported blob.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStore {
    #[serde(default)]
    pub years: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub current_user: Option<Value>,
    #[serde(default)]
    pub current_year: Option<Value>,
}

impl From<RawStore> for Store {
    fn from(raw: RawStore) -> Self {
        let mut years = BTreeMap::new();
        for (key, value) in raw.years.unwrap_or_default() {
            let Some(year) = parse_year_key(&key) else {
                continue;
            };
            match serde_json::from_value::<YearRecord>(value) {
                Ok(record) => {
                    years.insert(year, record);
                }
                Err(e) => warn!("Dropping malformed year {}: {}", key, e),
            }
        }

        let current_user = raw
            .current_user
            .and_then(|v| serde_json::from_value::<User>(v).ok())
            .unwrap_or_default();
        let current_year = raw
            .current_year
            .and_then(|v| v.as_i64())
            .and_then(|y| i32::try_from(y).ok())
            .filter(|y| YEAR_RANGE.contains(y))
            .unwrap_or_else(|| Local::now().year());

        Self {
            years,
            current_user,
            current_year,
        }
    }
}
