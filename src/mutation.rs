//! Create, update and delete calls, and which views must be refetched afterwards.
//!
//! Nothing is patched locally: a successful write only reports the views that depend on
//! the record kind, and the caller refetches them.

use serde::Serialize;
use serde_json::Value;

use crate::client::FinanceApi;
use crate::notify::Notifications;
use crate::types::{Draft, RecordKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Transactions,
    Categories,
    Budgets,
    Dashboard,
}

/// Views showing data derived from records of `kind`.
pub fn dependent_views(kind: RecordKind) -> &'static [View] {
    match kind {
        RecordKind::Transaction | RecordKind::Budget => {
            &[View::Transactions, View::Budgets, View::Dashboard]
        }
        // Names and colors show up everywhere.
        RecordKind::Category => &[
            View::Transactions,
            View::Categories,
            View::Budgets,
            View::Dashboard,
        ],
    }
}

pub fn delete_prompt(kind: RecordKind) -> String {
    match kind {
        RecordKind::Category => {
            "Are you sure you want to delete this category? This will affect related transactions."
                .to_string()
        }
        other => format!("Are you sure you want to delete this {}?", other.noun()),
    }
}

/// Asks the user before a destructive call.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// The record as the API returned it (`Null` when it returned nothing).
    pub record: Value,
    pub refresh: &'static [View],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { refresh: &'static [View] },
    /// Confirmation was refused; no call was made.
    Declined,
}

fn capitalized(noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub struct MutationCoordinator<'a, A: ?Sized> {
    api: &'a A,
    notices: &'a mut Notifications,
}

impl<'a, A: FinanceApi + ?Sized> MutationCoordinator<'a, A> {
    pub fn new(api: &'a A, notices: &'a mut Notifications) -> Self {
        Self { api, notices }
    }

    fn finish(
        &mut self,
        kind: RecordKind,
        verb: &str,
        result: crate::Result<Value>,
    ) -> crate::Result<MutationOutcome> {
        match result {
            Ok(record) => {
                tracing::info!(kind = kind.noun(), verb, "mutation succeeded");
                self.notices
                    .success(format!("{} {verb}d successfully", capitalized(kind.noun())));
                Ok(MutationOutcome {
                    record,
                    refresh: dependent_views(kind),
                })
            }
            Err(err) => {
                tracing::warn!(kind = kind.noun(), verb, error = %err, "mutation failed");
                self.notices
                    .error(format!("Failed to {verb} {}", kind.noun()));
                Err(err)
            }
        }
    }

    pub fn create(&mut self, draft: &Draft) -> crate::Result<MutationOutcome> {
        let result = self.api.create(draft);
        self.finish(draft.kind(), "create", result)
    }

    pub fn update(&mut self, id: u64, draft: &Draft) -> crate::Result<MutationOutcome> {
        let result = self.api.update(id, draft);
        self.finish(draft.kind(), "update", result)
    }

    pub fn delete(
        &mut self,
        kind: RecordKind,
        id: u64,
        confirm: &mut dyn Confirm,
    ) -> crate::Result<DeleteOutcome> {
        if !confirm.confirm(&delete_prompt(kind)) {
            tracing::debug!(kind = kind.noun(), id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }
        let result = self.api.delete(kind, id).map(|()| Value::Null);
        let outcome = self.finish(kind, "delete", result)?;
        Ok(DeleteOutcome::Deleted {
            refresh: outcome.refresh,
        })
    }
}
