//! SVG output for chart layouts, at rest or at a given animation instant.

use std::fmt::Write as _;

use crate::layout::{ChartLayout, Dimensions, Plot};
use crate::transition::{Frame, Schedule};

const AXIS_COLOR: &str = "#6b7280";
const TEXT_COLOR: &str = "#374151";

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == r.trunc() {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

fn open(out: &mut String, d: &Dimensions) {
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(d.width),
        h = num(d.height),
    );
    let _ = writeln!(
        out,
        r#"<g transform="translate({},{})">"#,
        num(d.margins.left),
        num(d.margins.top)
    );
}

fn close(out: &mut String) {
    out.push_str("</g>\n</svg>\n");
}

/// The chart in its final state.
pub fn render(chart: &ChartLayout) -> String {
    match chart {
        ChartLayout::Plot(plot) => {
            let schedule = Schedule::for_plot(plot);
            render_plot(plot, &schedule.final_frame())
        }
        ChartLayout::Empty(_) => render_at(chart, 0),
    }
}

/// The chart as it looks `t_ms` into its enter animation.
pub fn render_at(chart: &ChartLayout, t_ms: u64) -> String {
    match chart {
        ChartLayout::Plot(plot) => render_plot(plot, &Schedule::for_plot(plot).frame(t_ms)),
        ChartLayout::Empty(p) => {
            let mut out = String::new();
            open(&mut out, &p.dimensions);
            let _ = writeln!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" fill="{AXIS_COLOR}">{}</text>"#,
                num(p.x),
                num(p.y),
                escape(&p.text)
            );
            close(&mut out);
            out
        }
    }
}

fn render_plot(plot: &Plot, frame: &Frame) -> String {
    let mut out = String::new();
    open(&mut out, &plot.dimensions);
    let inner_w = plot.dimensions.inner_width();
    let baseline = plot.baseline();

    for bar in &frame.bars {
        let r = &bar.rect;
        let _ = writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" opacity="{}"/>"#,
            num(r.x),
            num(r.y),
            num(r.width),
            num(r.height),
            escape(&bar.fill),
            num(bar.opacity)
        );
    }

    for (label, opacity) in plot.labels.iter().zip(&frame.label_opacity) {
        let _ = writeln!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="12" fill="{TEXT_COLOR}" opacity="{}">{}</text>"#,
            num(label.x),
            num(label.y),
            num(*opacity),
            escape(&label.text)
        );
    }

    let _ = writeln!(
        out,
        r#"<g class="x-axis" transform="translate(0,{})">"#,
        num(baseline)
    );
    let _ = writeln!(
        out,
        r#"<line x1="0" x2="{}" y1="0" y2="0" stroke="{AXIS_COLOR}"/>"#,
        num(inner_w)
    );
    for tick in &plot.category_ticks {
        let rotate = if tick.rotation != 0.0 {
            format!(r#" transform="rotate({})" text-anchor="end""#, num(tick.rotation))
        } else {
            r#" text-anchor="middle""#.to_string()
        };
        let _ = writeln!(
            out,
            r#"<g transform="translate({},0)"><line y2="6" stroke="{AXIS_COLOR}"/><text y="9" dy="0.71em" font-size="10"{rotate}>{}</text></g>"#,
            num(tick.position),
            escape(&tick.label)
        );
    }
    out.push_str("</g>\n");

    out.push_str("<g class=\"y-axis\">\n");
    let _ = writeln!(
        out,
        r#"<line x1="0" x2="0" y1="0" y2="{}" stroke="{AXIS_COLOR}"/>"#,
        num(baseline)
    );
    for tick in &plot.value_ticks {
        let _ = writeln!(
            out,
            r#"<g transform="translate(0,{})"><line x2="-6" stroke="{AXIS_COLOR}"/><text x="-9" dy="0.32em" text-anchor="end" font-size="10">{}</text></g>"#,
            num(tick.position),
            escape(&tick.label)
        );
    }
    out.push_str("</g>\n");

    if let Some(legend) = &plot.legend {
        let _ = writeln!(
            out,
            r#"<g class="legend" transform="translate({},{})">"#,
            num(legend.x),
            num(legend.y)
        );
        for item in &legend.items {
            let _ = writeln!(
                out,
                r#"<g transform="translate(0,{y})"><rect width="{s}" height="{s}" fill="{}"/><text x="16" y="9" font-size="12">{}</text></g>"#,
                escape(&item.color),
                escape(&item.label),
                y = num(item.y),
                s = num(item.swatch),
            );
        }
        out.push_str("</g>\n");
    }

    close(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{budget_comparison_chart, category_breakdown_chart};
    use crate::types::{BudgetComparison, CategoryTotal};

    #[test]
    fn placeholder_is_a_single_centred_text() {
        let svg = render(&category_breakdown_chart(&[]));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"<text x="130" y="120""#));
        assert!(svg.contains("No data available"));
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn labels_are_escaped_and_bars_start_flat() {
        let chart = category_breakdown_chart(&[CategoryTotal {
            name: "Food & <Drink>".into(),
            total: 120.0,
            color: None,
        }]);
        let svg = render_at(&chart, 0);
        assert!(svg.contains("Food &amp; &lt;Drink&gt;"));
        assert!(svg.contains(r#"height="0""#));
        assert!(svg.contains(r#"opacity="0">$120</text>"#));

        let done = render(&chart);
        assert!(done.contains(r#"height="240""#));
        assert!(done.contains(r#"opacity="1">$120</text>"#));
    }

    #[test]
    fn comparison_has_legend_and_rotated_ticks() {
        let svg = render(&budget_comparison_chart(&[BudgetComparison {
            budget_name: "Rent".into(),
            budgeted_amount: 1000.0,
            spent_amount: 900.0,
            over_budget: false,
        }]));
        assert!(svg.contains(r#"class="legend" transform="translate(350,20)""#));
        assert!(svg.contains("rotate(-45)"));
        assert!(svg.contains(">Spent</text>"));
    }
}
