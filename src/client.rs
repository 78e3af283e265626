use std::fs;
use std::path::PathBuf;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Session;
use crate::error::{Error, Result};
use crate::filter::QueryParams;
use crate::types::{
    Budget, Category, Draft, EntryType, Envelope, Page, Period, RecordKind, Transaction,
};

/// The finance backend, as the views see it.
///
/// `Send + Sync` so the dashboard can issue its fetches from scoped threads.
pub trait FinanceApi: Send + Sync {
    fn list_transactions(&self, params: &[(&'static str, String)]) -> Result<Page<Transaction>>;

    fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>>;

    fn list_categories(&self, entry_type: Option<EntryType>) -> Result<Page<Category>>;

    fn list_budgets(&self, period: Option<Period>) -> Result<Page<Budget>>;

    /// Raw analysis payload; see [`crate::aggregate::summarize`].
    fn budget_analysis(&self, period: Period) -> Result<Value>;

    /// Raw dashboard payload; see [`crate::aggregate::summarize_financial`].
    fn financial_summary(&self) -> Result<Value>;

    fn create(&self, draft: &Draft) -> Result<Value>;

    fn update(&self, id: u64, draft: &Draft) -> Result<Value>;

    fn delete(&self, kind: RecordKind, id: u64) -> Result<()>;
}

#[derive(Debug, Clone)]
pub enum ClientMode {
    Http { base_url: String, session: Session },
    /// Answers every call from `{dir}/{Operation}.json`.
    Fixtures(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FinanceClient {
    mode: ClientMode,
}

fn period_params(period: Period) -> QueryParams {
    vec![
        ("month", period.month.to_string()),
        ("year", period.year.to_string()),
    ]
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}

fn decode_page<T: DeserializeOwned>(value: Value) -> Result<Page<T>> {
    Ok(decode::<Envelope<T>>(value)?.into_page())
}

impl FinanceClient {
    pub fn new(mode: ClientMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &ClientMode {
        &self.mode
    }

    fn call(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
        body: Option<&Draft>,
    ) -> Result<Value> {
        match &self.mode {
            ClientMode::Fixtures(dir) => {
                let path = dir.join(format!("{operation}.json"));
                tracing::debug!(operation, path = %path.display(), "reading fixture");
                let s = fs::read_to_string(&path)?;
                if s.trim().is_empty() {
                    return Ok(Value::Null);
                }
                Ok(serde_json::from_str(&s)?)
            }
            ClientMode::Http { base_url, session } => {
                let url = format!("{}/{}", base_url.trim_end_matches('/'), path);
                tracing::debug!(operation, %method, %url, "api request");

                let http = reqwest::blocking::Client::new();
                let mut req = http.request(method, &url);
                if !params.is_empty() {
                    req = req.query(params);
                }
                if let Some(t) = session.bearer() {
                    req = req.bearer_auth(t);
                }
                if let Some(draft) = body {
                    req = req.json(draft);
                }

                let resp = req.send()?;
                let status = resp.status();
                let text = resp.text()?;

                if status == reqwest::StatusCode::BAD_REQUEST {
                    return Err(Error::Validation(format_field_errors(&text)));
                }
                if !status.is_success() {
                    tracing::warn!(operation, %status, "api error");
                    return Err(Error::Network(format!("{operation}: http {status}")));
                }
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                Ok(serde_json::from_str(&text)?)
            }
        }
    }
}

impl FinanceApi for FinanceClient {
    fn list_transactions(&self, params: &[(&'static str, String)]) -> Result<Page<Transaction>> {
        let v = self.call(
            "ListTransactions",
            Method::GET,
            RecordKind::Transaction.collection_path(),
            params,
            None,
        )?;
        decode_page(v)
    }

    fn recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let v = self.call(
            "RecentTransactions",
            Method::GET,
            RecordKind::Transaction.collection_path(),
            &[("limit", limit.to_string())],
            None,
        )?;
        let mut out = decode::<Envelope<Transaction>>(v)?.into_vec();
        out.truncate(limit);
        Ok(out)
    }

    fn list_categories(&self, entry_type: Option<EntryType>) -> Result<Page<Category>> {
        let params: QueryParams = entry_type
            .map(|t| vec![("type", t.as_str().to_string())])
            .unwrap_or_default();
        let v = self.call(
            "ListCategories",
            Method::GET,
            RecordKind::Category.collection_path(),
            &params,
            None,
        )?;
        decode_page(v)
    }

    fn list_budgets(&self, period: Option<Period>) -> Result<Page<Budget>> {
        let params = period.map(period_params).unwrap_or_default();
        let v = self.call(
            "ListBudgets",
            Method::GET,
            RecordKind::Budget.collection_path(),
            &params,
            None,
        )?;
        decode_page(v)
    }

    fn budget_analysis(&self, period: Period) -> Result<Value> {
        self.call(
            "BudgetAnalysis",
            Method::GET,
            "budgets/analysis/",
            &period_params(period),
            None,
        )
    }

    fn financial_summary(&self) -> Result<Value> {
        self.call(
            "FinancialSummary",
            Method::GET,
            "transactions/summary/",
            &[],
            None,
        )
    }

    fn create(&self, draft: &Draft) -> Result<Value> {
        let kind = draft.kind();
        self.call(
            &format!("Create{}", kind.operation_suffix()),
            Method::POST,
            kind.collection_path(),
            &[],
            Some(draft),
        )
    }

    fn update(&self, id: u64, draft: &Draft) -> Result<Value> {
        let kind = draft.kind();
        self.call(
            &format!("Update{}", kind.operation_suffix()),
            Method::PUT,
            &format!("{}{id}/", kind.collection_path()),
            &[],
            Some(draft),
        )
    }

    fn delete(&self, kind: RecordKind, id: u64) -> Result<()> {
        self.call(
            &format!("Delete{}", kind.operation_suffix()),
            Method::DELETE,
            &format!("{}{id}/", kind.collection_path()),
            &[],
            None,
        )?;
        Ok(())
    }
}

/// Flattens a validation body such as `{"amount": ["Ensure this value is greater than 0."]}`
/// into one line.
fn format_field_errors(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let t = body.trim();
        return if t.is_empty() {
            "invalid request".to_string()
        } else {
            t.to_string()
        };
    };

    fn messages(v: &Value) -> String {
        match v {
            Value::String(s) => s.clone(),
            Value::Array(items) => items.iter().map(messages).collect::<Vec<_>>().join(" "),
            Value::Object(_) => format_object(v),
            other => other.to_string(),
        }
    }

    fn format_object(v: &Value) -> String {
        let Some(map) = v.as_object() else {
            return messages(v);
        };
        map.iter()
            .map(|(field, v)| match field.as_str() {
                "detail" | "non_field_errors" => messages(v),
                _ => format!("{field}: {}", messages(v)),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }

    let out = messages(&value);
    if out.is_empty() {
        "invalid request".to_string()
    } else {
        out
    }
}
