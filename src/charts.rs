//! The dashboard's three bar charts, built on [`crate::layout`].

use crate::aggregate::{self, COMPARISON_LIMIT, OVERVIEW_LIMIT};
use crate::format::{currency_label, percent_rounded};
use crate::layout::{
    Annotation, Arrangement, ChartLayout, ChartSpec, Datum, Dimensions, Group, Margins, Motion,
    layout,
};
use crate::transition::{LABEL_FADE, PRIMARY, SECONDARY};
use crate::types::{Budget, BudgetComparison, CategoryTotal};

pub const BLUE: &str = "#3b82f6";
pub const GREEN: &str = "#10b981";
pub const RED: &str = "#ef4444";
pub const GREY: &str = "#e5e7eb";

const BAND_PADDING: f64 = 0.2;
const OVERVIEW_BAND_PADDING: f64 = 0.3;
const GROUP_PADDING: f64 = 0.1;
const OVERVIEW_INSET: f64 = 2.0;

pub fn category_breakdown_spec() -> ChartSpec {
    ChartSpec {
        dimensions: Dimensions {
            width: 400.0,
            height: 300.0,
            margins: Margins {
                top: 20.0,
                right: 80.0,
                bottom: 40.0,
                left: 60.0,
            },
        },
        band_padding: BAND_PADDING,
        arrangement: Arrangement::Single,
        empty_message: "No data available".into(),
        legend: Vec::new(),
        category_label_rotation: 0.0,
    }
}

pub fn budget_comparison_spec() -> ChartSpec {
    ChartSpec {
        dimensions: Dimensions {
            width: 500.0,
            height: 300.0,
            margins: Margins {
                top: 20.0,
                right: 100.0,
                bottom: 80.0,
                left: 60.0,
            },
        },
        band_padding: BAND_PADDING,
        arrangement: Arrangement::Grouped {
            padding: GROUP_PADDING,
        },
        empty_message: "No budget data available".into(),
        legend: vec![
            ("Budgeted".into(), BLUE.into()),
            ("Spent".into(), GREEN.into()),
        ],
        category_label_rotation: -45.0,
    }
}

pub fn budget_overview_spec() -> ChartSpec {
    ChartSpec {
        dimensions: Dimensions {
            width: 400.0,
            height: 200.0,
            margins: Margins {
                top: 20.0,
                right: 20.0,
                bottom: 40.0,
                left: 60.0,
            },
        },
        band_padding: OVERVIEW_BAND_PADDING,
        arrangement: Arrangement::Overlay {
            inset: OVERVIEW_INSET,
        },
        empty_message: "No budget data available".into(),
        legend: Vec::new(),
        category_label_rotation: 0.0,
    }
}

/// Spending per category, first five categories, each bar in its category's color.
pub fn category_breakdown_chart(breakdown: &[CategoryTotal]) -> ChartLayout {
    let series: Vec<Group> = aggregate::truncate(breakdown, COMPARISON_LIMIT)
        .iter()
        .map(|c| Group {
            key: c.name.clone(),
            data: vec![Datum {
                role: "total".into(),
                value: c.total,
                fill: c.color.clone().unwrap_or_else(|| BLUE.into()),
                opacity: 0.8,
                motion: Motion::Grow(PRIMARY),
                annotation: Some(Annotation {
                    text: currency_label(c.total),
                    anchor: c.total,
                    fade: Some(LABEL_FADE),
                }),
            }],
        })
        .collect();
    layout(&series, &category_breakdown_spec())
}

/// Budgeted next to spent for the first five budgets.
pub fn budget_comparison_chart(rows: &[BudgetComparison]) -> ChartLayout {
    let series: Vec<Group> = aggregate::truncate(rows, COMPARISON_LIMIT)
        .iter()
        .map(|row| Group {
            key: row.budget_name.clone(),
            data: vec![
                Datum {
                    role: "budgeted".into(),
                    value: row.budgeted_amount,
                    fill: BLUE.into(),
                    opacity: 0.7,
                    motion: Motion::Grow(PRIMARY),
                    annotation: None,
                },
                Datum {
                    role: "spent".into(),
                    value: row.spent_amount,
                    fill: if row.over_budget { RED } else { GREEN }.into(),
                    opacity: 0.8,
                    motion: Motion::Grow(SECONDARY),
                    annotation: None,
                },
            ],
        })
        .collect();
    layout(&series, &budget_comparison_spec())
}

/// Compact progress view of the first three budgets: a grey bar for the budget with the
/// spent share drawn over it, labelled with the percentage used.
pub fn budget_overview_chart(budgets: &[Budget]) -> ChartLayout {
    let series: Vec<Group> = aggregate::truncate(budgets, OVERVIEW_LIMIT)
        .iter()
        .map(|b| {
            let m = aggregate::budget_metrics(b, None);
            Group {
                key: b.name.clone(),
                data: vec![
                    Datum {
                        role: "budgeted".into(),
                        value: b.amount,
                        fill: GREY.into(),
                        opacity: 0.7,
                        motion: Motion::Static,
                        annotation: None,
                    },
                    Datum {
                        role: "spent".into(),
                        value: m.spent_amount.min(b.amount),
                        fill: if m.percentage_used > 100.0 { RED } else { BLUE }.into(),
                        opacity: 0.8,
                        motion: Motion::Grow(PRIMARY),
                        annotation: Some(Annotation {
                            text: percent_rounded(m.percentage_used),
                            anchor: b.amount.max(m.spent_amount),
                            fade: Some(LABEL_FADE),
                        }),
                    },
                ],
            }
        })
        .collect();
    layout(&series, &budget_overview_spec())
}
