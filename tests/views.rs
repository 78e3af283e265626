use std::collections::HashSet;
use std::sync::Mutex;

use finboard::client::FinanceApi;
use finboard::error::{Error, Result};
use finboard::filter::FilterPatch;
use finboard::mutation::View;
use finboard::notify::Level;
use finboard::store::FetchOutcome;
use finboard::types::{
    Budget, BudgetDraft, Category, CategoryId, Draft, EntryType, Page, Period, RecordKind,
    Transaction,
};
use serde_json::{Value, json};

/// In-memory backend; operations named in `failing` answer with a network error.
#[derive(Default)]
struct FakeApi {
    transactions: Mutex<Vec<Value>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn with_transactions(n: u64) -> Self {
        let api = FakeApi::default();
        *api.transactions.lock().unwrap() = (1..=n)
            .map(|id| {
                json!({
                    "id": id, "title": format!("t{id}"), "amount": "10.00",
                    "type": "expense", "category": 1, "date": "2024-01-15"
                })
            })
            .collect();
        api
    }

    fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    fn recover(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(op)).count()
    }

    fn enter(&self, op: &'static str, detail: String) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{op} {detail}"));
        if self.failing.lock().unwrap().contains(op) {
            return Err(Error::Network(format!("{op}: http 500 Internal Server Error")));
        }
        Ok(())
    }
}

impl FinanceApi for FakeApi {
    fn list_transactions(&self, params: &[(&'static str, String)]) -> Result<Page<Transaction>> {
        self.enter("list_transactions", format!("{params:?}"))?;
        let rows = self.transactions.lock().unwrap().clone();
        let results: Vec<Transaction> = serde_json::from_value(Value::Array(rows))?;
        Ok(Page {
            count: results.len() as u64,
            results,
            has_next: false,
            has_previous: false,
        })
    }

    fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        self.enter("recent_transactions", limit.to_string())?;
        let mut page = self.list_transactions(&[])?.results;
        page.truncate(limit);
        Ok(page)
    }

    fn list_categories(&self, _entry_type: Option<EntryType>) -> Result<Page<Category>> {
        self.enter("list_categories", String::new())?;
        let results: Vec<Category> = serde_json::from_value(json!([
            {"id": 1, "name": "Groceries", "type": "expense", "color": "#10b981"}
        ]))?;
        Ok(Page {
            count: 1,
            results,
            has_next: false,
            has_previous: false,
        })
    }

    fn list_budgets(&self, period: Option<Period>) -> Result<Page<Budget>> {
        self.enter("list_budgets", format!("{period:?}"))?;
        let results: Vec<Budget> = serde_json::from_value(json!([
            {"id": 1, "name": "Food", "amount": "300.00", "category": 1,
             "category_name": "Groceries", "month": 1, "year": 2024,
             "spent_amount": "120.00", "remaining_amount": "180.00", "percentage_used": 40}
        ]))?;
        Ok(Page {
            count: 1,
            results,
            has_next: false,
            has_previous: false,
        })
    }

    fn budget_analysis(&self, period: Period) -> Result<Value> {
        self.enter("budget_analysis", period.to_string())?;
        Ok(json!({"summary": {"total_budgeted": 300, "total_spent": 120, "total_remaining": 180}}))
    }

    fn financial_summary(&self) -> Result<Value> {
        self.enter("financial_summary", String::new())?;
        Ok(json!({"totals": {"income": 1000, "expenses": 120, "balance": 880}}))
    }

    fn create(&self, draft: &Draft) -> Result<Value> {
        self.enter("create", format!("{:?}", draft.kind()))?;
        Ok(json!({"id": 99}))
    }

    fn update(&self, id: u64, _draft: &Draft) -> Result<Value> {
        self.enter("update", id.to_string())?;
        Ok(json!({"id": id}))
    }

    fn delete(&self, kind: RecordKind, id: u64) -> Result<()> {
        self.enter("delete", format!("{kind:?} {id}"))?;
        self.transactions
            .lock()
            .unwrap()
            .retain(|t| t["id"] != json!(id));
        Ok(())
    }
}

type Workspace = finboard::views::Workspace<FakeApi>;

fn workspace(api: FakeApi) -> Workspace {
    Workspace::new(api, Period::new(1, 2024).unwrap())
}

fn ids(ws: &Workspace) -> Vec<u64> {
    ws.transactions.records().iter().map(|t| t.id.get()).collect()
}

fn always(answer: bool) -> impl FnMut(&str) -> bool {
    move |_prompt: &str| answer
}

#[test]
fn failed_delete_leaves_list_untouched_and_notifies_once() {
    let mut ws = workspace(FakeApi::with_transactions(3));
    assert!(matches!(ws.open(View::Transactions), FetchOutcome::Applied));
    ws.drain_notices();
    let before = ws.transactions.records().to_vec();

    ws.api().fail("delete");
    let err = ws
        .delete(RecordKind::Transaction, 2, &mut always(true))
        .unwrap_err();
    assert!(err.is_network());

    assert_eq!(ws.transactions.records(), before.as_slice());
    let notices = ws.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Error);
    assert_eq!(notices[0].message, "Failed to delete transaction");
}

#[test]
fn successful_delete_refreshes_the_open_list() {
    let mut ws = workspace(FakeApi::with_transactions(3));
    let _ = ws.open(View::Transactions);
    ws.drain_notices();

    assert!(ws.delete(RecordKind::Transaction, 2, &mut always(true)).unwrap());
    assert_eq!(ids(&ws), vec![1, 3]);

    let notices = ws.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, Level::Success);
    assert_eq!(notices[0].message, "Transaction deleted successfully");
}

#[test]
fn declined_delete_makes_no_call() {
    let mut ws = workspace(FakeApi::with_transactions(2));
    let mut prompts = Vec::new();
    let mut confirm = |prompt: &str| {
        prompts.push(prompt.to_string());
        false
    };

    assert!(!ws.delete(RecordKind::Category, 1, &mut confirm).unwrap());
    assert_eq!(
        prompts,
        vec![
            "Are you sure you want to delete this category? This will affect related transactions."
        ]
    );
    assert_eq!(ws.api().count("delete"), 0);
    assert!(ws.notices().is_empty());
}

#[test]
fn refetching_the_same_query_is_idempotent() {
    let mut ws = workspace(FakeApi::with_transactions(4));
    let _ = ws.open(View::Transactions);
    let first = ws.transactions.records().to_vec();
    let first_page = ws.transactions.store().pagination().clone();

    let _ = ws.open(View::Transactions);
    assert_eq!(ws.transactions.records(), first.as_slice());
    assert_eq!(ws.transactions.store().pagination(), &first_page);
    assert!(ws.notices().is_empty());
}

#[test]
fn failed_refetch_keeps_previous_records() {
    let mut ws = workspace(FakeApi::with_transactions(2));
    let _ = ws.open(View::Transactions);
    ws.api().fail("list_transactions");

    assert!(matches!(ws.open(View::Transactions), FetchOutcome::Failed(_)));
    assert_eq!(ids(&ws), vec![1, 2]);
    let notices = ws.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to fetch transactions");
}

#[test]
fn filter_changes_go_back_to_the_first_page() {
    let mut ws = workspace(FakeApi::with_transactions(2));
    let _ = ws.go_to_page(3);
    assert_eq!(ws.transactions.query().page, 3);

    let _ = ws.set_filter(&FilterPatch {
        search: Some("rent".into()),
        ..FilterPatch::default()
    });
    assert_eq!(ws.transactions.query().page, 1);
    assert_eq!(ws.transactions.query().filter.search, "rent");

    let last = ws.api().calls().last().cloned().unwrap();
    assert!(last.contains("(\"search\", \"rent\")"));
    assert!(last.contains("(\"page\", \"1\")"));

    let _ = ws.go_to_page(2);
    let _ = ws.clear_filters();
    assert_eq!(ws.transactions.query().page, 1);
    assert!(ws.transactions.query().filter.is_empty());
}

#[test]
fn filter_categories_load_once() {
    let mut ws = workspace(FakeApi::with_transactions(1));
    let _ = ws.open(View::Transactions);
    let _ = ws.go_to_page(2);
    assert_eq!(ws.transactions.categories().len(), 1);
    assert_eq!(ws.api().count("list_categories"), 1);
}

#[test]
fn mutations_refresh_only_views_already_shown() {
    let mut ws = workspace(FakeApi::with_transactions(1));
    let _ = ws.open(View::Budgets);
    let budgets_before = ws.api().count("list_budgets");
    let txns_before = ws.api().count("list_transactions");

    let draft = Draft::Budget(BudgetDraft {
        name: "Food".into(),
        amount: 300.0,
        category: Some(CategoryId::new(1)),
        month: 1,
        year: 2024,
    });
    ws.update(1, &draft).unwrap();

    assert_eq!(ws.api().count("list_budgets"), budgets_before + 1);
    assert_eq!(ws.api().count("list_transactions"), txns_before);
    assert!(!ws.is_loaded(View::Transactions));
    assert!(!ws.is_loaded(View::Dashboard));
}

#[test]
fn dashboard_keeps_good_sections_when_one_fails() {
    let mut ws = workspace(FakeApi::with_transactions(2));
    let _ = ws.open(View::Dashboard);
    assert!(ws.dashboard.failed_sections().is_empty());
    assert_eq!(ws.dashboard.summary().totals.balance, 880.0);
    ws.drain_notices();

    ws.api().fail("financial_summary");
    ws.api().transactions.lock().unwrap().clear();
    let _ = ws.open(View::Dashboard);

    assert_eq!(
        ws.dashboard.failed_sections(),
        &[finboard::views::Section::Summary]
    );
    // stale totals stay, fresh sections update
    assert_eq!(ws.dashboard.summary().totals.balance, 880.0);
    assert!(ws.dashboard.recent().is_empty());
    assert_eq!(ws.dashboard.budgets().len(), 1);

    let notices = ws.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to fetch dashboard data");

    ws.api().recover("financial_summary");
    let _ = ws.open(View::Dashboard);
    assert!(ws.dashboard.failed_sections().is_empty());
}

#[test]
fn analysis_failure_is_only_logged() {
    let mut ws = workspace(FakeApi::with_transactions(0));
    let _ = ws.open(View::Budgets);
    assert_eq!(ws.budgets.analysis().total_budgeted, 300.0);
    ws.drain_notices();

    ws.api().fail("budget_analysis");
    assert!(matches!(ws.open(View::Budgets), FetchOutcome::Applied));
    assert_eq!(ws.budgets.records().len(), 1);
    assert_eq!(ws.budgets.analysis().total_budgeted, 300.0);
    assert!(ws.notices().is_empty());
}

#[test]
fn failed_period_switch_keeps_the_previous_month_whole() {
    let mut ws = workspace(FakeApi::with_transactions(0));
    let _ = ws.open(View::Budgets);
    ws.drain_notices();
    let january = Period::new(1, 2024).unwrap();
    let february = Period::new(2, 2024).unwrap();

    ws.api().fail("list_budgets");
    assert!(matches!(ws.set_period(february), FetchOutcome::Failed(_)));

    assert_eq!(ws.budgets.period(), january);
    assert_eq!(ws.budgets.records().len(), 1);
    assert_eq!(ws.budgets.records()[0].month, 1);
    assert_eq!(ws.budgets.analysis().total_budgeted, 300.0);
    let notices = ws.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "Failed to fetch budgets");

    ws.api().recover("list_budgets");
    assert!(matches!(ws.set_period(february), FetchOutcome::Applied));
    assert_eq!(ws.budgets.period(), february);
    assert!(ws.api().calls().last().unwrap().contains("February 2024"));
}

#[test]
fn dashboard_lists_budgets_across_months() {
    let mut ws = workspace(FakeApi::with_transactions(1));
    let _ = ws.open(View::Dashboard);
    assert!(ws.api().calls().iter().any(|c| c == "list_budgets None"));
    assert_eq!(ws.dashboard.budgets().len(), 1);
}
