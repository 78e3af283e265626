use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::client::{ClientMode, FinanceClient};
use crate::config::{Session, token_path};
use crate::notify::{Level, Notification};
use crate::store::FetchOutcome;
use crate::types::{BudgetId, CategoryId, EntryType, Period, TransactionId};
use crate::views::Workspace;

mod auth;
mod budgets;
mod categories;
mod charts;
mod dashboard;
mod render;
mod transactions;

#[derive(Debug, Clone, Copy, ValueEnum, Serialize, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "finboard")]
#[command(about = "Personal finance dashboard: transactions, budgets and charts", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,

    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    pub color: ColorMode,

    /// Skip the confirmation prompt for deletes (required in non-interactive runs).
    #[arg(long, global = true, default_value_t = false)]
    pub yes: bool,

    /// Log requests and refreshes to stderr (`RUST_LOG` overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        env = "FINBOARD_BASE_URL",
        default_value = "http://localhost:8000/api"
    )]
    pub base_url: String,

    #[arg(long, global = true, env = "FINBOARD_TOKEN")]
    pub token: Option<String>,

    #[arg(long, global = true, env = "FINBOARD_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    #[arg(long, global = true, env = "FINBOARD_FIXTURES_DIR", hide = true)]
    pub fixtures_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    Auth {
        #[command(subcommand)]
        cmd: AuthCmd,
    },
    Transactions {
        #[command(subcommand)]
        cmd: TransactionsCmd,
    },
    Categories {
        #[command(subcommand)]
        cmd: CategoriesCmd,
    },
    Budgets {
        #[command(subcommand)]
        cmd: BudgetsCmd,
    },
    /// Totals, recent transactions and budgets (every month unless --month/--year is given).
    Dashboard(PeriodArgs),
    /// Chart geometry as rows, JSON or SVG.
    Chart(ChartArgs),
    Version,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AuthCmd {
    Status,
    /// Read a bearer token from stdin (or a hidden prompt) and store it.
    SetToken,
    Logout,
}

#[derive(Debug, Clone, Subcommand)]
pub enum TransactionsCmd {
    List(TransactionsListArgs),
    Create(TransactionArgs),
    Update {
        id: TransactionId,
        #[command(flatten)]
        args: TransactionArgs,
    },
    Delete {
        id: TransactionId,
    },
}

#[derive(Debug, Clone, Args)]
pub struct TransactionsListArgs {
    #[arg(long = "type", value_enum)]
    pub entry_type: Option<EntryType>,

    #[arg(long)]
    pub category: Option<CategoryId>,

    /// Start date, inclusive (supports YYYY-MM-DD and MM-DD-YYYY).
    #[arg(long)]
    pub from: Option<String>,

    /// End date, inclusive (supports YYYY-MM-DD and MM-DD-YYYY).
    #[arg(long)]
    pub to: Option<String>,

    /// Free-text search over title and description.
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Clone, Args)]
pub struct TransactionArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long)]
    pub amount: f64,

    #[arg(long = "type", value_enum)]
    pub entry_type: EntryType,

    #[arg(long)]
    pub category: CategoryId,

    /// Defaults to today (supports YYYY-MM-DD and MM-DD-YYYY).
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CategoriesCmd {
    List {
        #[arg(long = "type", value_enum)]
        entry_type: Option<EntryType>,
    },
    Create(CategoryArgs),
    Update {
        id: CategoryId,
        #[command(flatten)]
        args: CategoryArgs,
    },
    Delete {
        id: CategoryId,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CategoryArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long = "type", value_enum)]
    pub entry_type: EntryType,

    #[arg(long, default_value = "#3b82f6")]
    pub color: String,
}

#[derive(Debug, Clone, Subcommand)]
pub enum BudgetsCmd {
    List(PeriodArgs),
    /// Totals and per-category spending for the month.
    Analysis(PeriodArgs),
    Create(BudgetArgs),
    Update {
        id: BudgetId,
        #[command(flatten)]
        args: BudgetArgs,
    },
    Delete {
        id: BudgetId,
    },
}

#[derive(Debug, Clone, Args)]
pub struct BudgetArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub amount: f64,

    /// Omit to budget across all expense categories.
    #[arg(long)]
    pub category: Option<CategoryId>,

    #[command(flatten)]
    pub period: PeriodArgs,
}

#[derive(Debug, Clone, Args)]
pub struct PeriodArgs {
    /// 1-12; defaults to the current month.
    #[arg(long)]
    pub month: Option<u32>,

    /// Defaults to the current year.
    #[arg(long)]
    pub year: Option<i32>,
}

impl PeriodArgs {
    pub fn resolve(&self) -> anyhow::Result<Period> {
        let now = Period::current();
        let month = self.month.unwrap_or(now.month);
        let year = self.year.unwrap_or(now.year);
        Period::new(month, year).with_context(|| format!("invalid month {month}"))
    }

    /// `None` when neither flag was given.
    pub fn resolve_optional(&self) -> anyhow::Result<Option<Period>> {
        if self.month.is_none() && self.year.is_none() {
            return Ok(None);
        }
        self.resolve().map(Some)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChartKind {
    /// Spending per category (dashboard summary).
    CategoryBreakdown,
    /// Budgeted vs spent for the month's budgets.
    BudgetComparison,
    /// Compact progress bars for the first three budgets.
    BudgetOverview,
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    #[arg(value_enum)]
    pub kind: ChartKind,

    #[command(flatten)]
    pub period: PeriodArgs,

    /// Write an SVG document here instead of printing geometry.
    #[arg(long)]
    pub svg: Option<PathBuf>,

    /// Render the animation frame this many milliseconds in (default: final state).
    #[arg(long)]
    pub at_ms: Option<u64>,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Version = &cli.command {
        println!("finboard {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let token_file_path = cli.token_file.clone().unwrap_or_else(token_path);
    if let Command::Auth { cmd } = &cli.command {
        return auth::run_auth(&cli, &token_file_path, cmd.clone());
    }

    let session = Session::resolve(cli.token.clone(), &token_file_path);
    let mode = match &cli.fixtures_dir {
        Some(dir) => ClientMode::Fixtures(dir.clone()),
        None => ClientMode::Http {
            base_url: cli.base_url.clone(),
            session,
        },
    };
    let period = Period::current();
    let mut ws = Workspace::new(FinanceClient::new(mode), period);

    let result = match &cli.command {
        Command::Transactions { cmd } => transactions::run_transactions(&cli, &mut ws, cmd.clone()),
        Command::Categories { cmd } => categories::run_categories(&cli, &mut ws, cmd.clone()),
        Command::Budgets { cmd } => budgets::run_budgets(&cli, &mut ws, cmd.clone()),
        Command::Dashboard(args) => dashboard::run_dashboard(&cli, &mut ws, args),
        Command::Chart(args) => charts::run_chart(&cli, &mut ws, args),
        Command::Auth { .. } | Command::Version => Ok(()),
    };
    print_notices(&cli, ws.drain_notices());
    result
}

fn print_notices(cli: &Cli, notices: Vec<Notification>) {
    for n in notices {
        let tag = match (n.level, should_color(cli)) {
            (Level::Success, true) => "\x1b[32mok\x1b[0m",
            (Level::Success, false) => "ok",
            (Level::Error, true) => "\x1b[31merror\x1b[0m",
            (Level::Error, false) => "error",
        };
        eprintln!("{tag}: {}", n.message);
    }
}

/// Turns a failed fetch into the command's error; the notification was already queued.
fn fetched(outcome: FetchOutcome) -> anyhow::Result<()> {
    match outcome {
        FetchOutcome::Failed(err) => Err(err.into()),
        FetchOutcome::Applied | FetchOutcome::Stale => Ok(()),
    }
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    let normalized = crate::filter::normalize_date(s)
        .with_context(|| format!("invalid date {s:?} (expected YYYY-MM-DD or MM-DD-YYYY)"))?;
    Ok(NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")?)
}

fn should_color(cli: &Cli) -> bool {
    match cli.color {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => std::io::stdout().is_terminal(),
    }
}

/// Answers a delete prompt: `--yes` accepts, otherwise the user must type `yes`.
fn confirm_delete(cli: &Cli) -> anyhow::Result<impl FnMut(&str) -> bool> {
    let yes = cli.yes;
    if !yes && !std::io::stdin().is_terminal() {
        anyhow::bail!("refusing to delete in non-interactive mode without --yes");
    }
    Ok(move |prompt: &str| {
        if yes {
            return true;
        }
        eprintln!("{prompt}");
        rpassword::prompt_password("Type 'yes' to confirm: ")
            .map(|input| input.trim() == "yes")
            .unwrap_or(false)
    })
}
