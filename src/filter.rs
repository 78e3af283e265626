//! Transaction list filtering and the query parameters it produces.
//!
//! Everything here is pure: the views decide when to refetch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Rows per page on the transactions endpoint.
pub const PAGE_SIZE: u64 = 20;

pub type QueryParams = Vec<(&'static str, String)>;

/// Active list filter. An empty field leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub category: String,
    pub date_from: String,
    pub date_to: String,
    pub search: String,
}

/// Fields to overwrite; `Some("")` clears a field, `None` keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub entry_type: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub search: Option<String>,
}

impl FilterState {
    pub fn apply(&self, patch: &FilterPatch) -> FilterState {
        fn pick(current: &str, patch: &Option<String>) -> String {
            match patch {
                Some(v) => v.trim().to_string(),
                None => current.to_string(),
            }
        }

        FilterState {
            entry_type: pick(&self.entry_type, &patch.entry_type),
            category: pick(&self.category, &patch.category),
            date_from: pick(&self.date_from, &patch.date_from),
            date_to: pick(&self.date_to, &patch.date_to),
            search: pick(&self.search, &patch.search),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterState::default()
    }
}

/// A filter together with the page being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub filter: FilterState,
    pub page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: FilterState::default(),
            page: 1,
        }
    }
}

impl ListQuery {
    /// Merges `patch` and goes back to the first page.
    pub fn refine(&self, patch: &FilterPatch) -> ListQuery {
        ListQuery {
            filter: apply_filter(&self.filter, patch),
            page: 1,
        }
    }

    pub fn cleared(&self) -> ListQuery {
        ListQuery::default()
    }

    pub fn with_page(&self, page: u32) -> ListQuery {
        ListQuery {
            filter: self.filter.clone(),
            page: page.max(1),
        }
    }

    pub fn params(&self) -> QueryParams {
        to_query_params(&self.filter, self.page)
    }
}

pub fn apply_filter(current: &FilterState, patch: &FilterPatch) -> FilterState {
    current.apply(patch)
}

pub fn clear() -> FilterState {
    FilterState::default()
}

pub fn to_query_params(state: &FilterState, page: u32) -> QueryParams {
    let mut params = Vec::new();
    for (key, value) in [
        ("type", &state.entry_type),
        ("category", &state.category),
        ("date_from", &state.date_from),
        ("date_to", &state.date_to),
        ("search", &state.search),
    ] {
        if !value.trim().is_empty() {
            params.push((key, value.trim().to_string()));
        }
    }
    params.push(("page", page.max(1).to_string()));
    params
}

/// URL-encoded `k=v&k=v` form of `params`.
pub fn query_string(params: &[(&'static str, String)]) -> String {
    let mut url = match reqwest::Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return String::new(),
    };
    url.query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    url.query().unwrap_or_default().to_string()
}

/// Accepts `YYYY-MM-DD` and `MM-DD-YYYY`; returns `YYYY-MM-DD`.
pub fn normalize_date(s: &str) -> Option<String> {
    let s = s.trim();
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m-%d-%Y"))
        .ok()
        .filter(|d| (1900..=2100).contains(&chrono::Datelike::year(d)))
        .map(|d| d.format("%Y-%m-%d").to_string())
}
