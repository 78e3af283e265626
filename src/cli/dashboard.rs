use serde::Serialize;

use crate::client::FinanceClient;
use crate::format::{money, signed_money};
use crate::mutation::View;
use crate::types::{EntryType, Totals, Transaction};
use crate::views::{DashboardView, Section, Workspace};

use super::budgets::BudgetRow;
use super::render::{KeyValueRow, print_json, render_table};
use super::{Cli, OutputFormat, PeriodArgs};

#[derive(Debug, Serialize)]
struct DashboardJsonOutput<'a> {
    totals: &'a Totals,
    recent: &'a [Transaction],
    budgets: Vec<BudgetRow>,
    failed_sections: &'a [Section],
}

pub(super) fn run_dashboard(
    cli: &Cli,
    ws: &mut Workspace<FinanceClient>,
    args: &PeriodArgs,
) -> anyhow::Result<()> {
    ws.dashboard = DashboardView::new(args.resolve_optional()?);
    let _ = ws.open(View::Dashboard);
    let view = &ws.dashboard;
    let budgets = view
        .budgets()
        .iter()
        .map(BudgetRow::from_record)
        .collect::<Vec<_>>();

    match cli.output {
        OutputFormat::Json => print_json(&DashboardJsonOutput {
            totals: &view.summary().totals,
            recent: view.recent(),
            budgets,
            failed_sections: view.failed_sections(),
        }),
        OutputFormat::Table => {
            let failed = |s: Section| view.failed_sections().contains(&s);
            let totals = &view.summary().totals;

            if failed(Section::Summary) {
                println!("Summary unavailable");
            } else {
                render_table(
                    cli,
                    &[
                        KeyValueRow::new("income", money(totals.income)),
                        KeyValueRow::new("expenses", money(totals.expenses)),
                        KeyValueRow::new("balance", money(totals.balance)),
                    ],
                );
            }

            if failed(Section::Recent) {
                println!("Recent transactions unavailable");
            } else if view.recent().is_empty() {
                println!("No recent transactions");
            } else {
                let rows = view
                    .recent()
                    .iter()
                    .map(|t| {
                        KeyValueRow::new(
                            &format!("{} {}", t.date.format("%Y-%m-%d"), t.title),
                            signed_money(t.amount, t.entry_type == EntryType::Income),
                        )
                    })
                    .collect::<Vec<_>>();
                render_table(cli, &rows);
            }

            if failed(Section::Budgets) {
                println!("Budgets unavailable");
            } else if budgets.is_empty() {
                println!("No budgets");
            } else {
                render_table(cli, &budgets);
            }
            Ok(())
        }
    }
}
