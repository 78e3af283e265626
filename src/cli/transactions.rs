use comfy_table::Cell;
use serde::Serialize;

use crate::client::FinanceClient;
use crate::filter::{FilterPatch, ListQuery, normalize_date};
use crate::format::signed_money;
use crate::store::PaginationState;
use crate::types::{Draft, EntryType, RecordKind, Transaction, TransactionDraft};
use crate::views::Workspace;

use super::render::{
    KeyValueRow, TableRow, money_cell, print_json, render_output, render_table, shorten_for_table,
};
use super::{Cli, OutputFormat, TransactionArgs, TransactionsCmd, TransactionsListArgs};

pub(super) fn run_transactions(
    cli: &Cli,
    ws: &mut Workspace<FinanceClient>,
    cmd: TransactionsCmd,
) -> anyhow::Result<()> {
    match cmd {
        TransactionsCmd::List(args) => {
            let query = ListQuery::default()
                .refine(&list_patch(&args)?)
                .with_page(args.page);
            super::fetched(ws.set_query(query))?;
            render_list(cli, ws.transactions.records(), ws.transactions.store().pagination())
        }
        TransactionsCmd::Create(args) => {
            let draft = draft(&args)?;
            let record = ws.create(&draft)?;
            render_output(cli, vec![KeyValueRow::new("created", record_id(&record))])
        }
        TransactionsCmd::Update { id, args } => {
            let draft = draft(&args)?;
            ws.update(id.get(), &draft)?;
            render_output(cli, vec![KeyValueRow::new("updated", id)])
        }
        TransactionsCmd::Delete { id } => {
            let mut confirm = super::confirm_delete(cli)?;
            if ws.delete(RecordKind::Transaction, id.get(), &mut confirm)? {
                render_output(cli, vec![KeyValueRow::new("deleted", id)])
            } else {
                eprintln!("aborted");
                Ok(())
            }
        }
    }
}

pub(super) fn record_id(record: &serde_json::Value) -> String {
    record
        .get("id")
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn list_patch(args: &TransactionsListArgs) -> anyhow::Result<FilterPatch> {
    let date = |s: &Option<String>| -> anyhow::Result<Option<String>> {
        match s {
            None => Ok(None),
            Some(s) => normalize_date(s)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("invalid date {s:?} (expected YYYY-MM-DD or MM-DD-YYYY)")),
        }
    };
    Ok(FilterPatch {
        entry_type: args.entry_type.map(|t| t.as_str().to_string()),
        category: args.category.map(|c| c.to_string()),
        date_from: date(&args.from)?,
        date_to: date(&args.to)?,
        search: args.search.clone(),
    })
}

fn draft(args: &TransactionArgs) -> anyhow::Result<Draft> {
    if args.amount <= 0.0 {
        anyhow::bail!("amount must be greater than zero");
    }
    let date = match &args.date {
        Some(s) => super::parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    Ok(Draft::Transaction(TransactionDraft {
        title: args.title.trim().to_string(),
        description: args.description.clone(),
        amount: args.amount,
        entry_type: args.entry_type,
        category: args.category,
        date,
    }))
}

#[derive(Debug, Clone, Serialize)]
struct TransactionRow {
    id: u64,
    date: String,
    title: String,
    category: String,
    amount: f64,
    #[serde(rename = "type")]
    entry_type: EntryType,
}

impl TransactionRow {
    fn from_record(t: &Transaction) -> Self {
        Self {
            id: t.id.get(),
            date: t.date.format("%Y-%m-%d").to_string(),
            title: t.title.clone(),
            category: t.category_name.clone().unwrap_or_default(),
            amount: t.amount,
            entry_type: t.entry_type,
        }
    }
}

impl TableRow for TransactionRow {
    const HEADERS: &'static [&'static str] = &["id", "date", "title", "category", "amount"];

    fn cells(&self, color: bool) -> Vec<Cell> {
        let income = self.entry_type == EntryType::Income;
        vec![
            Cell::new(self.id),
            Cell::new(&self.date),
            Cell::new(shorten_for_table(&self.title, 40)),
            Cell::new(&self.category),
            money_cell(signed_money(self.amount, income), income, color),
        ]
    }
}

#[derive(Debug, Serialize)]
struct TransactionsJsonOutput<'a> {
    results: Vec<TransactionRow>,
    pagination: &'a PaginationState,
}

fn render_list(
    cli: &Cli,
    items: &[Transaction],
    pagination: &PaginationState,
) -> anyhow::Result<()> {
    let rows: Vec<_> = items.iter().map(TransactionRow::from_record).collect();
    match cli.output {
        OutputFormat::Json => print_json(&TransactionsJsonOutput {
            results: rows,
            pagination,
        }),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No transactions found");
                return Ok(());
            }
            render_table(cli, &rows);
            if let Some((first, last)) = pagination.showing() {
                println!(
                    "Showing {first} to {last} of {} (page {} of {})",
                    pagination.count,
                    pagination.page,
                    pagination.total_pages()
                );
            }
            Ok(())
        }
    }
}
