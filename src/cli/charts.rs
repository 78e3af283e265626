use comfy_table::Cell;
use serde::Serialize;

use crate::client::FinanceClient;
use crate::layout::{Bar, ChartLayout};
use crate::mutation::View;
use crate::transition::Schedule;
use crate::views::{DashboardView, Workspace};

use super::render::{KeyValueRow, TableRow, print_json, render_table};
use super::{ChartArgs, ChartKind, Cli, OutputFormat};

pub(super) fn run_chart(
    cli: &Cli,
    ws: &mut Workspace<FinanceClient>,
    args: &ChartArgs,
) -> anyhow::Result<()> {
    let chart = match args.kind {
        ChartKind::CategoryBreakdown => {
            ws.dashboard = DashboardView::new(args.period.resolve_optional()?);
            let _ = ws.open(View::Dashboard);
            ws.dashboard.category_chart()
        }
        ChartKind::BudgetOverview => {
            ws.dashboard = DashboardView::new(args.period.resolve_optional()?);
            let _ = ws.open(View::Dashboard);
            ws.dashboard.overview_chart()
        }
        ChartKind::BudgetComparison => {
            super::fetched(ws.set_period(args.period.resolve()?))?;
            ws.budgets.comparison_chart()
        }
    };

    if let Some(path) = &args.svg {
        let doc = match args.at_ms {
            Some(t) => crate::svg::render_at(&chart, t),
            None => crate::svg::render(&chart),
        };
        std::fs::write(path, doc)?;
        eprintln!("wrote {}", path.display());
        return Ok(());
    }

    match cli.output {
        OutputFormat::Json => match (args.at_ms, chart.plot()) {
            (Some(t), Some(plot)) => print_json(&Schedule::for_plot(plot).frame(t)),
            _ => print_json(&chart),
        },
        OutputFormat::Table => {
            match &chart {
                ChartLayout::Empty(p) => println!("{}", p.text),
                ChartLayout::Plot(plot) => {
                    let bars = match args.at_ms {
                        Some(t) => Schedule::for_plot(plot).frame(t).bars,
                        None => plot.bars.clone(),
                    };
                    let rows = bars.iter().map(BarRow::from_bar).collect::<Vec<_>>();
                    render_table(cli, &rows);
                    let ticks = plot
                        .value_ticks
                        .iter()
                        .map(|t| t.label.as_str())
                        .collect::<Vec<_>>()
                        .join(" ");
                    render_table(
                        cli,
                        &[
                            KeyValueRow::new("width", plot.dimensions.width),
                            KeyValueRow::new("height", plot.dimensions.height),
                            KeyValueRow::new("bandwidth", round2(plot.category_scale.bandwidth())),
                            KeyValueRow::new("value_ticks", ticks),
                        ],
                    );
                }
            }
            Ok(())
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize)]
struct BarRow {
    key: String,
    role: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fill: String,
}

impl BarRow {
    fn from_bar(b: &Bar) -> Self {
        Self {
            key: b.key.clone(),
            role: b.role.clone(),
            x: round2(b.rect.x),
            y: round2(b.rect.y),
            width: round2(b.rect.width),
            height: round2(b.rect.height),
            fill: b.fill.clone(),
        }
    }
}

impl TableRow for BarRow {
    const HEADERS: &'static [&'static str] = &["key", "role", "x", "y", "width", "height", "fill"];

    fn cells(&self, _color: bool) -> Vec<Cell> {
        vec![
            Cell::new(&self.key),
            Cell::new(&self.role),
            Cell::new(self.x),
            Cell::new(self.y),
            Cell::new(self.width),
            Cell::new(self.height),
            Cell::new(&self.fill),
        ]
    }
}
