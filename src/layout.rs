//! Chart geometry: band and linear scales, bar rectangles, ticks and legends.
//!
//! [`layout`] is a pure function from a series and chart dimensions to a declarative
//! description of what to draw. All coordinates are relative to the plot origin, i.e. the
//! top-left corner inside the margins; the value axis grows downward in pixels, so bars are
//! anchored at `inner_height` and grow upward.

use serde::Serialize;

use crate::format::currency_label;
use crate::transition::Timing;

/// Default number of ticks requested from the value axis.
pub const VALUE_TICK_COUNT: usize = 10;
/// Gap between a bar's top and the label drawn above it.
pub const LABEL_OFFSET: f64 = 5.0;

const LEGEND_ROW_HEIGHT: f64 = 20.0;
const LEGEND_SWATCH: f64 = 12.0;
const LEGEND_GAP: f64 = 10.0;
const LEGEND_TOP: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl Dimensions {
    pub fn inner_width(&self) -> f64 {
        (self.width - self.margins.left - self.margins.right).max(0.0)
    }

    pub fn inner_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(0.0)
    }
}

/// Maps an ordered set of distinct keys onto equal-width bands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandScale {
    keys: Vec<String>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    /// `padding_inner` is the gap between bands and `padding_outer` the gap before the first
    /// and after the last, both as fractions of the step. Duplicate keys keep their first
    /// position.
    pub fn new<I, S>(keys: I, range: (f64, f64), padding_inner: f64, padding_outer: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !distinct.contains(&key) {
                distinct.push(key);
            }
        }

        let inner = padding_inner.clamp(0.0, 1.0);
        let outer = padding_outer.max(0.0);
        let (lo, hi) = if range.1 < range.0 {
            (range.1, range.0)
        } else {
            range
        };
        let n = distinct.len() as f64;
        let step = (hi - lo) / (n - inner + outer * 2.0).max(1.0);
        let start = lo + (hi - lo - step * (n - inner)) * 0.5;

        Self {
            keys: distinct,
            start,
            step,
            bandwidth: step * (1.0 - inner),
        }
    }

    pub fn uniform<I, S>(keys: I, range: (f64, f64), padding: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(keys, range, padding, padding)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Left edge of the band for `key`.
    pub fn position(&self, key: &str) -> Option<f64> {
        let i = self.keys.iter().position(|k| k == key)?;
        Some(self.start + self.step * i as f64)
    }

    pub fn center(&self, key: &str) -> Option<f64> {
        self.position(key).map(|x| x + self.bandwidth / 2.0)
    }
}

/// Maps `[d0, d1]` linearly onto `[r0, r1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return r0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }

    /// "Nice" tick values (steps of 1, 2 or 5 times a power of ten) covering the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (mut start, mut stop) = self.domain;
        if count == 0 || !start.is_finite() || !stop.is_finite() {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        let reverse = stop < start;
        if reverse {
            std::mem::swap(&mut start, &mut stop);
        }

        let Some((i1, i2, inc)) = tick_spec(start, stop, count as f64) else {
            return Vec::new();
        };
        if i2 < i1 {
            return Vec::new();
        }
        let mut out: Vec<f64> = (0..=(i2 - i1) as i64)
            .map(|i| {
                let k = (i1 as i64 + i) as f64;
                if inc < 0.0 { k / -inc } else { k * inc }
            })
            .collect();
        if reverse {
            out.reverse();
        }
        out
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(f64, f64, f64)> {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(0.0);
    if !step.is_finite() || step <= 0.0 {
        return None;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let inv = 10f64.powf(-power) / factor;
        i1 = (start * inv).round();
        i2 = (stop * inv).round();
        if i1 / inv < start {
            i1 += 1.0;
        }
        if i2 / inv > stop {
            i2 -= 1.0;
        }
        inc = -inv;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }
    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1, i2, inc))
}

/// Whether a bar animates in or is drawn at its final size straight away.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Motion {
    Static,
    Grow(Timing),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub text: String,
    /// Value the label sits above; counts toward the value domain.
    pub anchor: f64,
    pub fade: Option<Timing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Datum {
    pub role: String,
    pub value: f64,
    pub fill: String,
    pub opacity: f64,
    pub motion: Motion,
    pub annotation: Option<Annotation>,
}

/// All data plotted at one category position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: String,
    pub data: Vec<Datum>,
}

/// How the data inside one band share its width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Arrangement {
    /// Each datum fills the whole band.
    Single,
    /// Side-by-side sub-bands, one per role, separated by `padding`.
    Grouped { padding: f64 },
    /// Stacked on the same band; every datum after the first is inset on both sides.
    Overlay { inset: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub dimensions: Dimensions,
    pub band_padding: f64,
    pub arrangement: Arrangement,
    pub empty_message: String,
    /// `(label, color)` rows; empty means no legend.
    pub legend: Vec<(String, String)>,
    /// Rotation in degrees applied to category tick labels.
    pub category_label_rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub key: String,
    pub role: String,
    pub rect: Rect,
    pub fill: String,
    pub opacity: f64,
    pub motion: Motion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub fade: Option<Timing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub position: f64,
    pub label: String,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItem {
    pub label: String,
    pub color: String,
    pub y: f64,
    pub swatch: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub x: f64,
    pub y: f64,
    pub items: Vec<LegendItem>,
}

/// Shown instead of bars and axes when there is nothing to plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub dimensions: Dimensions,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plot {
    pub dimensions: Dimensions,
    pub category_scale: BandScale,
    pub value_scale: LinearScale,
    pub bars: Vec<Bar>,
    pub labels: Vec<Label>,
    pub category_ticks: Vec<Tick>,
    pub value_ticks: Vec<Tick>,
    pub legend: Option<Legend>,
}

impl Plot {
    /// y of the value axis baseline.
    pub fn baseline(&self) -> f64 {
        self.dimensions.inner_height()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartLayout {
    Empty(Placeholder),
    Plot(Plot),
}

impl ChartLayout {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartLayout::Empty(_))
    }

    pub fn plot(&self) -> Option<&Plot> {
        match self {
            ChartLayout::Plot(p) => Some(p),
            ChartLayout::Empty(_) => None,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        match self {
            ChartLayout::Plot(p) => p.dimensions,
            ChartLayout::Empty(p) => p.dimensions,
        }
    }
}

fn plotted(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

fn domain_max(series: &[Group]) -> f64 {
    series
        .iter()
        .flat_map(|g| g.data.iter())
        .flat_map(|d| {
            std::iter::once(plotted(d.value))
                .chain(d.annotation.as_ref().map(|a| plotted(a.anchor)))
        })
        .fold(0.0, f64::max)
}

fn placeholder(spec: &ChartSpec) -> ChartLayout {
    let dims = spec.dimensions;
    ChartLayout::Empty(Placeholder {
        dimensions: dims,
        x: dims.inner_width() / 2.0,
        y: dims.inner_height() / 2.0,
        text: spec.empty_message.clone(),
    })
}

/// Lays `series` out as bars inside `spec.dimensions`.
///
/// An empty series, or one whose values are all zero, yields the placeholder.
pub fn layout(series: &[Group], spec: &ChartSpec) -> ChartLayout {
    let max = domain_max(series);
    if series.is_empty() || max <= 0.0 {
        return placeholder(spec);
    }

    let dims = spec.dimensions;
    let inner_w = dims.inner_width();
    let inner_h = dims.inner_height();

    let band = BandScale::uniform(
        series.iter().map(|g| g.key.clone()),
        (0.0, inner_w),
        spec.band_padding,
    );
    let value = LinearScale::new((0.0, max), (inner_h, 0.0));
    let bar_rect = |x: f64, width: f64, v: f64| {
        let y = value.apply(plotted(v)).clamp(0.0, inner_h);
        Rect {
            x,
            y,
            width: width.max(0.0),
            height: (inner_h - y).max(0.0),
        }
    };

    let mut bars = Vec::new();
    let mut labels = Vec::new();
    for group in series {
        let Some(x0) = band.position(&group.key) else {
            continue;
        };
        let sub = match spec.arrangement {
            Arrangement::Grouped { padding } => Some(BandScale::uniform(
                group.data.iter().map(|d| d.role.clone()),
                (0.0, band.bandwidth()),
                padding,
            )),
            _ => None,
        };

        for (i, d) in group.data.iter().enumerate() {
            let (x, width) = match (&sub, spec.arrangement) {
                (Some(sub), _) => (
                    x0 + sub.position(&d.role).unwrap_or(0.0),
                    sub.bandwidth(),
                ),
                (None, Arrangement::Overlay { inset }) if i > 0 => {
                    (x0 + inset, band.bandwidth() - 2.0 * inset)
                }
                _ => (x0, band.bandwidth()),
            };
            bars.push(Bar {
                key: group.key.clone(),
                role: d.role.clone(),
                rect: bar_rect(x, width, d.value),
                fill: d.fill.clone(),
                opacity: d.opacity,
                motion: d.motion,
            });
            if let Some(a) = &d.annotation {
                labels.push(Label {
                    key: group.key.clone(),
                    x: x0 + band.bandwidth() / 2.0,
                    y: value.apply(plotted(a.anchor)) - LABEL_OFFSET,
                    text: a.text.clone(),
                    fade: a.fade,
                });
            }
        }
    }

    let category_ticks = band
        .keys()
        .iter()
        .filter_map(|k| {
            band.center(k).map(|position| Tick {
                position,
                label: k.clone(),
                rotation: spec.category_label_rotation,
            })
        })
        .collect();
    let value_ticks = value
        .ticks(VALUE_TICK_COUNT)
        .into_iter()
        .map(|v| Tick {
            position: value.apply(v),
            label: currency_label(v),
            rotation: 0.0,
        })
        .collect();

    let legend = (!spec.legend.is_empty()).then(|| Legend {
        x: inner_w + LEGEND_GAP,
        y: LEGEND_TOP,
        items: spec
            .legend
            .iter()
            .enumerate()
            .map(|(i, (label, color))| LegendItem {
                label: label.clone(),
                color: color.clone(),
                y: i as f64 * LEGEND_ROW_HEIGHT,
                swatch: LEGEND_SWATCH,
            })
            .collect(),
    });

    ChartLayout::Plot(Plot {
        dimensions: dims,
        category_scale: band,
        value_scale: value,
        bars,
        labels,
        category_ticks,
        value_ticks,
        legend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::PRIMARY;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn spec(arrangement: Arrangement) -> ChartSpec {
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
            band_padding: 0.2,
            arrangement,
            empty_message: "No data available".into(),
            legend: Vec::new(),
            category_label_rotation: 0.0,
        }
    }

    fn datum(role: &str, value: f64) -> Datum {
        Datum {
            role: role.into(),
            value,
            fill: "#3b82f6".into(),
            opacity: 0.8,
            motion: Motion::Grow(PRIMARY),
            annotation: None,
        }
    }

    fn group(key: &str, values: &[f64]) -> Group {
        Group {
            key: key.into(),
            data: values
                .iter()
                .enumerate()
                .map(|(i, v)| datum(if i == 0 { "a" } else { "b" }, *v))
                .collect(),
        }
    }

    #[test]
    fn band_scale_splits_range_with_padding() {
        let band = BandScale::uniform(["a", "b", "c"], (0.0, 260.0), 0.2);
        // step = 260 / (3 - 0.2 + 0.4)
        assert!(close(band.step(), 81.25));
        assert!(close(band.bandwidth(), 65.0));
        assert!(close(band.position("a").unwrap(), 16.25));
        assert!(close(band.position("c").unwrap(), 16.25 + 2.0 * 81.25));
        assert!(band.position("z").is_none());
    }

    #[test]
    fn single_band_spans_width_minus_padding() {
        let band = BandScale::uniform(["only"], (0.0, 260.0), 0.2);
        let x = band.position("only").unwrap();
        assert!(x > 0.0);
        assert!(close(x * 2.0 + band.bandwidth(), 260.0));
        assert!(close(band.bandwidth(), 260.0 / 1.2 * 0.8));
    }

    #[test]
    fn band_scale_deduplicates_keys() {
        let band = BandScale::uniform(["a", "b", "a"], (0.0, 100.0), 0.0);
        assert_eq!(band.len(), 2);
        assert!(close(band.bandwidth(), 50.0));
    }

    #[test]
    fn linear_ticks_are_nice() {
        let s = LinearScale::new((0.0, 520.0), (240.0, 0.0));
        assert_eq!(
            s.ticks(10),
            vec![0.0, 50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0]
        );
        let s = LinearScale::new((0.0, 1.0), (100.0, 0.0));
        assert_eq!(s.ticks(5), vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
        assert!(close(s.apply(0.5), 50.0));
    }

    #[test]
    fn empty_series_yields_placeholder_without_axes() {
        let out = layout(&[], &spec(Arrangement::Single));
        match out {
            ChartLayout::Empty(p) => {
                assert_eq!(p.text, "No data available");
                assert!(close(p.x, 130.0));
                assert!(close(p.y, 120.0));
            }
            ChartLayout::Plot(_) => panic!("expected placeholder"),
        }
    }

    #[test]
    fn all_zero_series_is_treated_as_empty() {
        let out = layout(
            &[group("a", &[0.0]), group("b", &[0.0])],
            &spec(Arrangement::Single),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn bars_grow_up_from_the_baseline() {
        let out = layout(
            &[group("a", &[100.0]), group("b", &[50.0]), group("c", &[0.0]), group("d", &[-5.0])],
            &spec(Arrangement::Single),
        );
        let plot = out.plot().unwrap();
        let h = plot.baseline();
        assert!(close(h, 240.0));
        for bar in &plot.bars {
            assert!(bar.rect.height >= 0.0);
            assert!(close(bar.rect.y + bar.rect.height, h));
        }
        assert!(close(plot.bars[0].rect.y, 0.0));
        assert!(close(plot.bars[0].rect.height, 240.0));
        assert!(close(plot.bars[1].rect.height, 120.0));
        assert_eq!(plot.bars[2].rect.height, 0.0);
        assert_eq!(plot.bars[3].rect.height, 0.0);
        assert_eq!(plot.category_ticks.len(), 4);
        assert_eq!(plot.value_ticks.first().unwrap().label, "$0");
        assert_eq!(plot.value_ticks.last().unwrap().label, "$100");
    }

    #[test]
    fn grouped_bars_share_a_band_side_by_side() {
        let out = layout(
            &[group("rent", &[1000.0, 900.0])],
            &spec(Arrangement::Grouped { padding: 0.1 }),
        );
        let plot = out.plot().unwrap();
        let band = &plot.category_scale;
        let (a, b) = (&plot.bars[0].rect, &plot.bars[1].rect);
        assert!(close(a.width, b.width));
        assert!(a.x + a.width < b.x);
        assert!(a.x >= band.position("rent").unwrap());
        assert!(b.x + b.width <= band.position("rent").unwrap() + band.bandwidth() + 1e-9);
    }

    #[test]
    fn overlay_insets_following_bars() {
        let out = layout(
            &[group("rent", &[1000.0, 400.0])],
            &spec(Arrangement::Overlay { inset: 2.0 }),
        );
        let plot = out.plot().unwrap();
        let (back, front) = (&plot.bars[0].rect, &plot.bars[1].rect);
        assert!(close(front.x, back.x + 2.0));
        assert!(close(front.width, back.width - 4.0));
    }

    #[test]
    fn annotation_anchor_extends_the_domain() {
        let mut g = group("a", &[50.0]);
        g.data[0].annotation = Some(Annotation {
            text: "200%".into(),
            anchor: 100.0,
            fade: None,
        });
        let out = layout(&[g], &spec(Arrangement::Single));
        let plot = out.plot().unwrap();
        assert_eq!(plot.value_scale.domain, (0.0, 100.0));
        assert!(close(plot.labels[0].y, -LABEL_OFFSET));
    }

    #[test]
    fn legend_rows_stack_beside_the_plot() {
        let mut s = spec(Arrangement::Single);
        s.legend = vec![
            ("Budgeted".into(), "#3b82f6".into()),
            ("Spent".into(), "#10b981".into()),
        ];
        let out = layout(&[group("a", &[1.0])], &s);
        let legend = out.plot().unwrap().legend.as_ref().unwrap();
        assert!(close(legend.x, 270.0));
        assert_eq!(legend.items[1].y, 20.0);
    }
}
