use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// NOTE: Record ids are plain integers on the wire. We use a marker type per record kind so
// a budget id can't be handed to a transaction endpoint by accident.
pub struct RecordId<T> {
    raw: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RecordId<T> {
    pub fn new(raw: u64) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn get(&self) -> u64 {
        self.raw
    }
}

impl<T> Clone for RecordId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RecordId<T> {}

impl<T> fmt::Debug for RecordId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.raw).finish()
    }
}

impl<T> fmt::Display for RecordId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl<T> PartialEq for RecordId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}
impl<T> Eq for RecordId<T> {}

impl<T> Hash for RecordId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> FromStr for RecordId<T> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s.trim().parse()?))
    }
}

impl<T> From<u64> for RecordId<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T> Serialize for RecordId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.raw)
    }
}

impl<'de, T> Deserialize<'de> for RecordId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

pub enum TransactionMarker {}
pub enum CategoryMarker {}
pub enum BudgetMarker {}

pub type TransactionId = RecordId<TransactionMarker>;
pub type CategoryId = RecordId<CategoryMarker>;
pub type BudgetId = RecordId<BudgetMarker>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Income,
    Expense,
    /// Legacy rows with a type this client doesn't know about.
    #[serde(other)]
    #[value(skip)]
    Other,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Income => "income",
            EntryType::Expense => "expense",
            EntryType::Other => "other",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Transaction,
    Category,
    Budget,
}

impl RecordKind {
    pub fn noun(&self) -> &'static str {
        match self {
            RecordKind::Transaction => "transaction",
            RecordKind::Category => "category",
            RecordKind::Budget => "budget",
        }
    }

    pub(crate) fn collection_path(&self) -> &'static str {
        match self {
            RecordKind::Transaction => "transactions/",
            RecordKind::Category => "transactions/categories/",
            RecordKind::Budget => "budgets/",
        }
    }

    pub(crate) fn operation_suffix(&self) -> &'static str {
        match self {
            RecordKind::Transaction => "Transaction",
            RecordKind::Category => "Category",
            RecordKind::Budget => "Budget",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// Amounts arrive either as JSON numbers or as decimal strings (`"500.00"`).
pub(crate) mod amount {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    fn parse<E: serde::de::Error>(raw: Raw) -> Result<f64, E> {
        match raw {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid amount {s:?}"))),
        }
    }

    pub fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        parse(Raw::deserialize(deserializer)?)
    }

    pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => parse(raw).map(Some),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "amount::required")]
    pub amount: f64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    #[serde(deserialize_with = "amount::required")]
    pub amount: f64,
    /// `None` means the budget covers every expense category.
    #[serde(default)]
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub month: u32,
    pub year: i32,
    #[serde(default, deserialize_with = "amount::optional")]
    pub spent_amount: Option<f64>,
    #[serde(default, deserialize_with = "amount::optional")]
    pub remaining_amount: Option<f64>,
    #[serde(default, deserialize_with = "amount::optional")]
    pub percentage_used: Option<f64>,
}

impl Budget {
    pub fn period(&self) -> Period {
        Period {
            month: self.month,
            year: self.year,
        }
    }

    pub fn scope_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or("All Categories")
    }
}

/// A calendar month, the unit budgets are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { month, year })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    pub fn current() -> Self {
        Self::containing(chrono::Local::now().date_naive())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.month() == self.month && date.year() == self.year
    }

    /// First and last day of the month.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)?
        };
        Some((first, next.pred_opt()?))
    }

    pub fn month_name(&self) -> &'static str {
        const NAMES: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("")
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    #[serde(deserialize_with = "amount::required")]
    pub total: f64,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetComparison {
    pub budget_name: String,
    #[serde(deserialize_with = "amount::required")]
    pub budgeted_amount: f64,
    #[serde(deserialize_with = "amount::required")]
    pub spent_amount: f64,
    #[serde(default)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_budgeted: f64,
    pub total_spent: f64,
    pub total_remaining: f64,
    pub category_breakdown: Vec<CategoryTotal>,
    pub budget_comparison: Vec<BudgetComparison>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(default, deserialize_with = "amount::required")]
    pub income: f64,
    #[serde(default, deserialize_with = "amount::required")]
    pub expenses: f64,
    #[serde(default, deserialize_with = "amount::required")]
    pub balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub totals: Totals,
    pub category_breakdown: Vec<CategoryTotal>,
}

/// A list response: either a bare array or a `{results, count, next, previous}` page.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Paged {
        results: Vec<T>,
        #[serde(default)]
        count: Option<u64>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
    },
    Bare(Vec<T>),
}

impl<T> Envelope<T> {
    pub fn into_page(self) -> Page<T> {
        match self {
            Envelope::Paged {
                results,
                count,
                next,
                previous,
            } => Page {
                count: count.unwrap_or(results.len() as u64),
                has_next: next.is_some(),
                has_previous: previous.is_some(),
                results,
            },
            Envelope::Bare(results) => Page {
                count: results.len() as u64,
                has_next: false,
                has_previous: false,
                results,
            },
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.into_page().results
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDraft {
    pub title: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub category: CategoryId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetDraft {
    pub name: String,
    pub amount: f64,
    pub category: Option<CategoryId>,
    pub month: u32,
    pub year: i32,
}

/// Payload for a create or update call; the variant decides the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Draft {
    Transaction(TransactionDraft),
    Category(CategoryDraft),
    Budget(BudgetDraft),
}

impl Draft {
    pub fn kind(&self) -> RecordKind {
        match self {
            Draft::Transaction(_) => RecordKind::Transaction,
            Draft::Category(_) => RecordKind::Category,
            Draft::Budget(_) => RecordKind::Budget,
        }
    }
}
