//! The list and chart views, and the [`Workspace`] that ties them to the API.
//!
//! Each view owns its records exclusively. Fetch failures never escape a view: they are
//! logged, turned into a single error notification, and the previous data stays on screen.

use std::thread;

use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{self, needs_metrics};
use crate::charts;
use crate::client::FinanceApi;
use crate::error::Error;
use crate::filter::{FilterPatch, ListQuery, QueryParams};
use crate::layout::ChartLayout;
use crate::mutation::{Confirm, DeleteOutcome, MutationCoordinator, View};
use crate::notify::{Notification, Notifications};
use crate::store::{FetchOutcome, RecordStore, ViewStatus};
use crate::types::{
    AnalysisSummary, Budget, Category, Draft, EntryType, FinancialSummary, Page, Period,
    RecordKind, Transaction,
};

/// Transactions shown in the dashboard's "recent" list.
pub const RECENT_LIMIT: usize = 5;
/// Upper bound on pages walked when deriving budget metrics locally.
const MAX_EXPENSE_PAGES: u32 = 50;

fn report(outcome: &FetchOutcome, what: &str, notices: &mut Notifications) {
    if let FetchOutcome::Failed(err) = outcome {
        tracing::warn!(error = %err, "fetch {what} failed");
        notices.error(format!("Failed to fetch {what}"));
    }
}

/// Every expense in `period`, walking the list endpoint page by page.
pub fn period_expenses<A: FinanceApi + ?Sized>(
    api: &A,
    period: Period,
) -> crate::Result<Vec<Transaction>> {
    let Some((first, last)) = period.bounds() else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for page in 1..=MAX_EXPENSE_PAGES {
        let params: QueryParams = vec![
            ("type", EntryType::Expense.as_str().to_string()),
            ("date_from", first.format("%Y-%m-%d").to_string()),
            ("date_to", last.format("%Y-%m-%d").to_string()),
            ("page", page.to_string()),
        ];
        let Page {
            results, has_next, ..
        } = api.list_transactions(&params)?;
        out.extend(results);
        if !has_next {
            break;
        }
    }
    Ok(out)
}

/// Fills in metrics the backend left out, fetching each affected month's expenses once.
pub fn complete_budget_metrics<A: FinanceApi + ?Sized>(
    api: &A,
    budgets: Vec<Budget>,
) -> crate::Result<Vec<Budget>> {
    let mut periods: Vec<Period> = Vec::new();
    for b in budgets.iter().filter(|b| needs_metrics(b)) {
        if !periods.contains(&b.period()) {
            periods.push(b.period());
        }
    }
    if periods.is_empty() {
        return Ok(budgets);
    }

    let mut expenses = Vec::new();
    for period in periods {
        tracing::debug!(%period, "deriving budget metrics locally");
        expenses.extend(period_expenses(api, period)?);
    }
    Ok(budgets
        .iter()
        .map(|b| {
            if needs_metrics(b) {
                aggregate::with_metrics(b, &expenses)
            } else {
                b.clone()
            }
        })
        .collect())
}

#[derive(Debug, Default)]
pub struct TransactionsView {
    query: ListQuery,
    store: RecordStore<Transaction>,
    categories: Vec<Category>,
}

impl TransactionsView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    pub fn store(&self) -> &RecordStore<Transaction> {
        &self.store
    }

    pub fn records(&self) -> &[Transaction] {
        self.store.records()
    }

    /// Categories offered in the filter; loaded on first refresh.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn refresh<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
    ) -> FetchOutcome {
        if self.categories.is_empty() {
            match api.list_categories(None) {
                Ok(page) => self.categories = page.results,
                Err(err) => tracing::warn!(error = %err, "fetch filter categories failed"),
            }
        }
        let ticket = self.store.begin_fetch(self.query.page);
        let result = api.list_transactions(&self.query.params());
        let outcome = self.store.complete(ticket, result);
        report(&outcome, "transactions", notices);
        outcome
    }

    /// Replaces filter and page in one step.
    pub fn set_query<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
        query: ListQuery,
    ) -> FetchOutcome {
        self.query = query;
        self.refresh(api, notices)
    }

    pub fn set_filter<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
        patch: &FilterPatch,
    ) -> FetchOutcome {
        self.query = self.query.refine(patch);
        self.refresh(api, notices)
    }

    pub fn clear_filters<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
    ) -> FetchOutcome {
        self.query = self.query.cleared();
        self.refresh(api, notices)
    }

    pub fn go_to_page<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
        page: u32,
    ) -> FetchOutcome {
        self.query = self.query.with_page(page);
        self.refresh(api, notices)
    }
}

#[derive(Debug, Default)]
pub struct CategoriesView {
    entry_type: Option<EntryType>,
    store: RecordStore<Category>,
}

impl CategoriesView {
    pub fn new(entry_type: Option<EntryType>) -> Self {
        Self {
            entry_type,
            store: RecordStore::new(),
        }
    }

    pub fn store(&self) -> &RecordStore<Category> {
        &self.store
    }

    pub fn records(&self) -> &[Category] {
        self.store.records()
    }

    pub fn refresh<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
    ) -> FetchOutcome {
        let ticket = self.store.begin_fetch(1);
        let result = api.list_categories(self.entry_type);
        let outcome = self.store.complete(ticket, result);
        report(&outcome, "categories", notices);
        outcome
    }
}

/// Budgets for one month plus the server's analysis of them.
#[derive(Debug)]
pub struct BudgetsView {
    period: Period,
    store: RecordStore<Budget>,
    analysis: AnalysisSummary,
}

impl BudgetsView {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            store: RecordStore::new(),
            analysis: AnalysisSummary::default(),
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn store(&self) -> &RecordStore<Budget> {
        &self.store
    }

    pub fn records(&self) -> &[Budget] {
        self.store.records()
    }

    pub fn analysis(&self) -> &AnalysisSummary {
        &self.analysis
    }

    pub fn refresh<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
    ) -> FetchOutcome {
        self.load(api, notices, self.period)
    }

    /// Switches to `period` once its budgets arrive; a failed fetch keeps the current month,
    /// its rows and its analysis together.
    pub fn set_period<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
        period: Period,
    ) -> FetchOutcome {
        self.load(api, notices, period)
    }

    fn load<A: FinanceApi + ?Sized>(
        &mut self,
        api: &A,
        notices: &mut Notifications,
        period: Period,
    ) -> FetchOutcome {
        let ticket = self.store.begin_fetch(1);
        let result = api.list_budgets(Some(period)).and_then(|page| {
            let results = complete_budget_metrics(api, page.results)?;
            Ok(Page { results, ..page })
        });
        let outcome = self.store.complete(ticket, result);
        match &outcome {
            FetchOutcome::Applied => {
                let switched = period != self.period;
                self.period = period;
                // analysis failures are only logged; the budget rows are already current
                match api
                    .budget_analysis(period)
                    .and_then(|v| aggregate::summarize(&v))
                {
                    Ok(summary) => self.analysis = summary,
                    Err(err) => {
                        tracing::warn!(error = %err, %period, "fetch budget analysis failed");
                        if switched {
                            self.analysis = AnalysisSummary::default();
                        }
                    }
                }
            }
            FetchOutcome::Failed(_) => report(&outcome, "budgets", notices),
            FetchOutcome::Stale => {}
        }
        outcome
    }

    /// Server comparison rows when present, otherwise derived from the budget records.
    pub fn comparison_chart(&self) -> ChartLayout {
        if self.analysis.budget_comparison.is_empty() {
            charts::budget_comparison_chart(&aggregate::comparison_rows(self.records(), None))
        } else {
            charts::budget_comparison_chart(&self.analysis.budget_comparison)
        }
    }

    pub fn category_chart(&self) -> ChartLayout {
        charts::category_breakdown_chart(&self.analysis.category_breakdown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Summary,
    Recent,
    Budgets,
}

impl Section {
    pub fn label(&self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Recent => "recent transactions",
            Section::Budgets => "budgets",
        }
    }
}

/// Totals, recent activity and budgets, fetched side by side.
#[derive(Debug)]
pub struct DashboardView {
    /// `None` lists every budget, as the overview does by default.
    budget_period: Option<Period>,
    status: ViewStatus,
    loaded: bool,
    summary: FinancialSummary,
    recent: Vec<Transaction>,
    budgets: Vec<Budget>,
    failed: Vec<Section>,
}

fn joined<T>(handle: thread::ScopedJoinHandle<'_, crate::Result<T>>) -> crate::Result<T> {
    handle
        .join()
        .unwrap_or_else(|_| Err(Error::Network("fetch thread panicked".into())))
}

impl DashboardView {
    pub fn new(budget_period: Option<Period>) -> Self {
        Self {
            budget_period,
            status: ViewStatus::Loading,
            loaded: false,
            summary: FinancialSummary::default(),
            recent: Vec::new(),
            budgets: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn status(&self) -> ViewStatus {
        self.status
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn summary(&self) -> &FinancialSummary {
        &self.summary
    }

    pub fn recent(&self) -> &[Transaction] {
        &self.recent
    }

    pub fn budgets(&self) -> &[Budget] {
        &self.budgets
    }

    /// Sections whose last fetch failed; they still show their previous data.
    pub fn failed_sections(&self) -> &[Section] {
        &self.failed
    }

    /// Runs the three fetches concurrently and waits for all of them.
    pub fn refresh<A: FinanceApi + ?Sized>(&mut self, api: &A, notices: &mut Notifications) {
        self.status = ViewStatus::Loading;
        let budget_period = self.budget_period;

        let (summary, recent, budgets) = thread::scope(|s| {
            let summary = s.spawn(|| {
                api.financial_summary()
                    .and_then(|v| aggregate::summarize_financial(&v))
            });
            let recent = s.spawn(|| api.recent_transactions(RECENT_LIMIT));
            let budgets = s.spawn(move || {
                let page = api.list_budgets(budget_period)?;
                complete_budget_metrics(api, page.results)
            });
            (joined(summary), joined(recent), joined(budgets))
        });

        self.failed.clear();
        match summary {
            Ok(v) => self.summary = v,
            Err(err) => {
                tracing::warn!(error = %err, "fetch dashboard summary failed");
                self.failed.push(Section::Summary);
            }
        }
        match recent {
            Ok(v) => self.recent = v,
            Err(err) => {
                tracing::warn!(error = %err, "fetch recent transactions failed");
                self.failed.push(Section::Recent);
            }
        }
        match budgets {
            Ok(v) => self.budgets = v,
            Err(err) => {
                tracing::warn!(error = %err, "fetch dashboard budgets failed");
                self.failed.push(Section::Budgets);
            }
        }
        if !self.failed.is_empty() {
            notices.error("Failed to fetch dashboard data");
        }
        self.status = ViewStatus::Ready;
        self.loaded = true;
    }

    pub fn category_chart(&self) -> ChartLayout {
        charts::category_breakdown_chart(&self.summary.category_breakdown)
    }

    pub fn overview_chart(&self) -> ChartLayout {
        charts::budget_overview_chart(&self.budgets)
    }
}

/// The API, every view, and the notification queue.
pub struct Workspace<A> {
    api: A,
    notices: Notifications,
    pub transactions: TransactionsView,
    pub categories: CategoriesView,
    pub budgets: BudgetsView,
    pub dashboard: DashboardView,
}

impl<A: FinanceApi> Workspace<A> {
    pub fn new(api: A, period: Period) -> Self {
        Self {
            api,
            notices: Notifications::new(),
            transactions: TransactionsView::new(),
            categories: CategoriesView::new(None),
            budgets: BudgetsView::new(period),
            dashboard: DashboardView::new(None),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn notices(&self) -> &Notifications {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notification> {
        self.notices.drain()
    }

    pub fn is_loaded(&self, view: View) -> bool {
        match view {
            View::Transactions => self.transactions.store().is_loaded(),
            View::Categories => self.categories.store().is_loaded(),
            View::Budgets => self.budgets.store().is_loaded(),
            View::Dashboard => self.dashboard.is_loaded(),
        }
    }

    /// Fetches `view` whether or not it has been shown before.
    ///
    /// The dashboard reports failures per section and always lands as `Applied`.
    pub fn open(&mut self, view: View) -> FetchOutcome {
        let api = &self.api;
        let notices = &mut self.notices;
        match view {
            View::Transactions => self.transactions.refresh(api, notices),
            View::Categories => self.categories.refresh(api, notices),
            View::Budgets => self.budgets.refresh(api, notices),
            View::Dashboard => {
                self.dashboard.refresh(api, notices);
                FetchOutcome::Applied
            }
        }
    }

    /// Refetches the views in `views` that have been opened; others load when first shown.
    pub fn refresh(&mut self, views: &[View]) {
        for &view in views {
            if self.is_loaded(view) {
                tracing::debug!(?view, "refreshing after mutation");
                let _ = self.open(view);
            }
        }
    }

    pub fn set_query(&mut self, query: ListQuery) -> FetchOutcome {
        self.transactions
            .set_query(&self.api, &mut self.notices, query)
    }

    pub fn set_filter(&mut self, patch: &FilterPatch) -> FetchOutcome {
        self.transactions
            .set_filter(&self.api, &mut self.notices, patch)
    }

    pub fn clear_filters(&mut self) -> FetchOutcome {
        self.transactions.clear_filters(&self.api, &mut self.notices)
    }

    pub fn go_to_page(&mut self, page: u32) -> FetchOutcome {
        self.transactions
            .go_to_page(&self.api, &mut self.notices, page)
    }

    pub fn set_period(&mut self, period: Period) -> FetchOutcome {
        self.budgets.set_period(&self.api, &mut self.notices, period)
    }

    pub fn create(&mut self, draft: &Draft) -> crate::Result<Value> {
        let outcome = MutationCoordinator::new(&self.api, &mut self.notices).create(draft)?;
        self.refresh(outcome.refresh);
        Ok(outcome.record)
    }

    pub fn update(&mut self, id: u64, draft: &Draft) -> crate::Result<Value> {
        let outcome = MutationCoordinator::new(&self.api, &mut self.notices).update(id, draft)?;
        self.refresh(outcome.refresh);
        Ok(outcome.record)
    }

    /// `Ok(false)` when the confirmation was declined.
    pub fn delete(
        &mut self,
        kind: RecordKind,
        id: u64,
        confirm: &mut dyn Confirm,
    ) -> crate::Result<bool> {
        let outcome =
            MutationCoordinator::new(&self.api, &mut self.notices).delete(kind, id, confirm)?;
        match outcome {
            DeleteOutcome::Deleted { refresh } => {
                self.refresh(refresh);
                Ok(true)
            }
            DeleteOutcome::Declined => Ok(false),
        }
    }
}
