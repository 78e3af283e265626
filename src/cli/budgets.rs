use comfy_table::{Cell, Color};
use serde::Serialize;

use crate::aggregate::{self, BudgetHealth};
use crate::client::FinanceClient;
use crate::format::{money, percent};
use crate::types::{Budget, BudgetDraft, CategoryTotal, Draft, RecordKind};
use crate::views::Workspace;

use super::render::{KeyValueRow, TableRow, money_cell, print_json, render_output, render_table};
use super::transactions::record_id;
use super::{BudgetArgs, BudgetsCmd, Cli, OutputFormat};

pub(super) fn run_budgets(
    cli: &Cli,
    ws: &mut Workspace<FinanceClient>,
    cmd: BudgetsCmd,
) -> anyhow::Result<()> {
    match cmd {
        BudgetsCmd::List(args) => {
            super::fetched(ws.set_period(args.resolve()?))?;
            let rows = ws
                .budgets
                .records()
                .iter()
                .map(BudgetRow::from_record)
                .collect::<Vec<_>>();
            if rows.is_empty() && cli.output == OutputFormat::Table {
                println!("No budgets for {}", ws.budgets.period());
                return Ok(());
            }
            render_output(cli, rows)
        }
        BudgetsCmd::Analysis(args) => {
            super::fetched(ws.set_period(args.resolve()?))?;
            let analysis = ws.budgets.analysis();
            match cli.output {
                OutputFormat::Json => print_json(analysis),
                OutputFormat::Table => {
                    render_table(
                        cli,
                        &[
                            KeyValueRow::new("period", ws.budgets.period()),
                            KeyValueRow::new("total_budgeted", money(analysis.total_budgeted)),
                            KeyValueRow::new("total_spent", money(analysis.total_spent)),
                            KeyValueRow::new("total_remaining", money(analysis.total_remaining)),
                        ],
                    );
                    if !analysis.category_breakdown.is_empty() {
                        let rows = analysis
                            .category_breakdown
                            .iter()
                            .map(BreakdownRow::from_total)
                            .collect::<Vec<_>>();
                        render_table(cli, &rows);
                    }
                    Ok(())
                }
            }
        }
        BudgetsCmd::Create(args) => {
            let record = ws.create(&draft(&args)?)?;
            render_output(cli, vec![KeyValueRow::new("created", record_id(&record))])
        }
        BudgetsCmd::Update { id, args } => {
            ws.update(id.get(), &draft(&args)?)?;
            render_output(cli, vec![KeyValueRow::new("updated", id)])
        }
        BudgetsCmd::Delete { id } => {
            let mut confirm = super::confirm_delete(cli)?;
            if ws.delete(RecordKind::Budget, id.get(), &mut confirm)? {
                render_output(cli, vec![KeyValueRow::new("deleted", id)])
            } else {
                eprintln!("aborted");
                Ok(())
            }
        }
    }
}

fn draft(args: &BudgetArgs) -> anyhow::Result<Draft> {
    if args.amount < 0.0 {
        anyhow::bail!("amount must not be negative");
    }
    let period = args.period.resolve()?;
    Ok(Draft::Budget(BudgetDraft {
        name: args.name.trim().to_string(),
        amount: args.amount,
        category: args.category,
        month: period.month,
        year: period.year,
    }))
}

#[derive(Debug, Clone, Serialize)]
pub(super) struct BudgetRow {
    id: u64,
    name: String,
    category: String,
    amount: f64,
    spent_amount: f64,
    remaining_amount: f64,
    percentage_used: f64,
    health: BudgetHealth,
}

impl BudgetRow {
    pub(super) fn from_record(b: &Budget) -> Self {
        let m = aggregate::budget_metrics(b, None);
        Self {
            id: b.id.get(),
            name: b.name.clone(),
            category: b.scope_label().to_string(),
            amount: b.amount,
            spent_amount: m.spent_amount,
            remaining_amount: m.remaining_amount,
            percentage_used: m.percentage_used,
            health: BudgetHealth::from_percentage(m.percentage_used),
        }
    }
}

impl TableRow for BudgetRow {
    const HEADERS: &'static [&'static str] =
        &["id", "name", "category", "budgeted", "spent", "remaining", "used"];

    fn cells(&self, color: bool) -> Vec<Cell> {
        let mut used = Cell::new(percent(self.percentage_used));
        if color {
            used = used.fg(match self.health {
                BudgetHealth::Over => Color::Red,
                BudgetHealth::Warning => Color::Yellow,
                BudgetHealth::Healthy => Color::Green,
            });
        }
        vec![
            Cell::new(self.id),
            Cell::new(&self.name),
            Cell::new(&self.category),
            Cell::new(money(self.amount)),
            Cell::new(money(self.spent_amount)),
            money_cell(
                money(self.remaining_amount),
                self.remaining_amount >= 0.0,
                color,
            ),
            used,
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
struct BreakdownRow {
    category: String,
    total: String,
}

impl BreakdownRow {
    fn from_total(c: &CategoryTotal) -> Self {
        Self {
            category: c.name.clone(),
            total: money(c.total),
        }
    }
}

impl TableRow for BreakdownRow {
    const HEADERS: &'static [&'static str] = &["category", "spent"];

    fn cells(&self, _color: bool) -> Vec<Cell> {
        vec![Cell::new(&self.category), Cell::new(&self.total)]
    }
}
