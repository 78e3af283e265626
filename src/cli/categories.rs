use comfy_table::Cell;
use serde::Serialize;

use crate::client::FinanceClient;
use crate::mutation::View;
use crate::types::{Category, CategoryDraft, Draft, EntryType, RecordKind};
use crate::views::{CategoriesView, Workspace};

use super::render::{KeyValueRow, TableRow, render_output};
use super::transactions::record_id;
use super::{CategoriesCmd, CategoryArgs, Cli};

pub(super) fn run_categories(
    cli: &Cli,
    ws: &mut Workspace<FinanceClient>,
    cmd: CategoriesCmd,
) -> anyhow::Result<()> {
    match cmd {
        CategoriesCmd::List { entry_type } => {
            if entry_type.is_some() {
                ws.categories = CategoriesView::new(entry_type);
            }
            super::fetched(ws.open(View::Categories))?;
            let rows = ws
                .categories
                .records()
                .iter()
                .map(CategoryRow::from_record)
                .collect::<Vec<_>>();
            render_output(cli, rows)
        }
        CategoriesCmd::Create(args) => {
            let record = ws.create(&draft(&args))?;
            render_output(cli, vec![KeyValueRow::new("created", record_id(&record))])
        }
        CategoriesCmd::Update { id, args } => {
            ws.update(id.get(), &draft(&args))?;
            render_output(cli, vec![KeyValueRow::new("updated", id)])
        }
        CategoriesCmd::Delete { id } => {
            let mut confirm = super::confirm_delete(cli)?;
            if ws.delete(RecordKind::Category, id.get(), &mut confirm)? {
                render_output(cli, vec![KeyValueRow::new("deleted", id)])
            } else {
                eprintln!("aborted");
                Ok(())
            }
        }
    }
}

fn draft(args: &CategoryArgs) -> Draft {
    Draft::Category(CategoryDraft {
        name: args.name.trim().to_string(),
        entry_type: args.entry_type,
        color: args.color.clone(),
    })
}

#[derive(Debug, Clone, Serialize)]
struct CategoryRow {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    entry_type: EntryType,
    color: String,
}

impl CategoryRow {
    fn from_record(c: &Category) -> Self {
        Self {
            id: c.id.get(),
            name: c.name.clone(),
            entry_type: c.entry_type,
            color: c.color.clone().unwrap_or_default(),
        }
    }
}

impl TableRow for CategoryRow {
    const HEADERS: &'static [&'static str] = &["id", "name", "type", "color"];

    fn cells(&self, _color: bool) -> Vec<Cell> {
        vec![
            Cell::new(self.id),
            Cell::new(&self.name),
            Cell::new(self.entry_type),
            Cell::new(&self.color),
        ]
    }
}
