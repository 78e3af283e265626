//! Enter animations for chart bars and labels.
//!
//! Bars grow from the baseline to their final rectangle; value labels fade in once the
//! bars have landed. A [`Schedule`] turns a laid-out plot into the frame visible at any
//! instant, so rendering stays a pure function of time.

use serde::Serialize;

use crate::layout::{Bar, Motion, Plot, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    pub delay_ms: u64,
    pub duration_ms: u64,
}

/// Main bar growth.
pub const PRIMARY: Timing = Timing {
    delay_ms: 0,
    duration_ms: 800,
};

/// Second series of a grouped chart, slightly behind the first.
pub const SECONDARY: Timing = Timing {
    delay_ms: 200,
    duration_ms: 800,
};

/// Value labels, after the bars finish.
pub const LABEL_FADE: Timing = Timing {
    delay_ms: 800,
    duration_ms: 400,
};

impl Timing {
    pub fn end_ms(&self) -> u64 {
        self.delay_ms + self.duration_ms
    }

    /// Linear progress in `[0, 1]` at `t_ms` after the chart appeared.
    pub fn progress(&self, t_ms: u64) -> f64 {
        if t_ms <= self.delay_ms {
            return if self.duration_ms == 0 && t_ms == self.delay_ms {
                1.0
            } else {
                0.0
            };
        }
        if self.duration_ms == 0 {
            return 1.0;
        }
        ((t_ms - self.delay_ms) as f64 / self.duration_ms as f64).min(1.0)
    }
}

/// Cubic ease-in-out: slow start, fast middle, slow finish.
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

fn lerp(a: f64, b: f64, p: f64) -> f64 {
    a + (b - a) * p
}

/// One bar's journey from zero height at the baseline to its laid-out rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct BarTrack {
    from: Rect,
    to: Rect,
    timing: Option<Timing>,
}

impl BarTrack {
    pub fn new(bar: &Bar, baseline: f64) -> Self {
        let timing = match bar.motion {
            Motion::Static => None,
            Motion::Grow(t) => Some(t),
        };
        Self {
            from: Rect {
                y: baseline,
                height: 0.0,
                ..bar.rect
            },
            to: bar.rect,
            timing,
        }
    }

    pub fn at(&self, t_ms: u64) -> Rect {
        let Some(timing) = self.timing else {
            return self.to;
        };
        let p = timing.progress(t_ms);
        if p <= 0.0 {
            return self.from;
        }
        if p >= 1.0 {
            return self.to;
        }
        let e = ease_cubic_in_out(p);
        Rect {
            x: self.to.x,
            width: self.to.width,
            y: lerp(self.from.y, self.to.y, e),
            height: lerp(self.from.height, self.to.height, e).max(0.0),
        }
    }
}

/// What is visible `t_ms` after the chart appeared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub t_ms: u64,
    pub bars: Vec<Bar>,
    /// Opacity of each of the plot's labels, in order.
    pub label_opacity: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Schedule {
    bars: Vec<(Bar, BarTrack)>,
    labels: Vec<Option<Timing>>,
}

impl Schedule {
    pub fn for_plot(plot: &Plot) -> Self {
        let baseline = plot.baseline();
        Self {
            bars: plot
                .bars
                .iter()
                .map(|b| (b.clone(), BarTrack::new(b, baseline)))
                .collect(),
            labels: plot.labels.iter().map(|l| l.fade).collect(),
        }
    }

    /// Time at which every bar and label has reached its final state.
    pub fn total_duration(&self) -> u64 {
        let bars = self.bars.iter().filter_map(|(_, t)| t.timing);
        let labels = self.labels.iter().flatten().copied();
        bars.chain(labels).map(|t| t.end_ms()).max().unwrap_or(0)
    }

    pub fn frame(&self, t_ms: u64) -> Frame {
        Frame {
            t_ms,
            bars: self
                .bars
                .iter()
                .map(|(bar, track)| Bar {
                    rect: track.at(t_ms),
                    ..bar.clone()
                })
                .collect(),
            label_opacity: self
                .labels
                .iter()
                .map(|fade| match fade {
                    Some(t) => t.progress(t_ms),
                    None => 1.0,
                })
                .collect(),
        }
    }

    pub fn final_frame(&self) -> Frame {
        self.frame(self.total_duration())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(motion: Motion) -> Bar {
        Bar {
            key: "Rent".into(),
            role: "spent".into(),
            rect: Rect {
                x: 10.0,
                y: 40.0,
                width: 30.0,
                height: 200.0,
            },
            fill: "#3b82f6".into(),
            opacity: 0.8,
            motion,
        }
    }

    #[test]
    fn easing_hits_endpoints_and_midpoint() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(0.5), 0.5);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!(ease_cubic_in_out(0.25) < 0.25);
        assert!(ease_cubic_in_out(0.75) > 0.75);
    }

    #[test]
    fn progress_respects_delay() {
        assert_eq!(SECONDARY.progress(0), 0.0);
        assert_eq!(SECONDARY.progress(200), 0.0);
        assert_eq!(SECONDARY.progress(600), 0.5);
        assert_eq!(SECONDARY.progress(5_000), 1.0);
        assert_eq!(LABEL_FADE.end_ms(), 1200);
    }

    #[test]
    fn bar_grows_from_baseline() {
        let track = BarTrack::new(&bar(Motion::Grow(PRIMARY)), 240.0);
        let start = track.at(0);
        assert_eq!(start.y, 240.0);
        assert_eq!(start.height, 0.0);

        let mid = track.at(400);
        assert_eq!(mid.height, 100.0);
        assert_eq!(mid.y + mid.height, 240.0);

        assert_eq!(track.at(800), bar(Motion::Static).rect);
        assert_eq!(track.at(10_000), bar(Motion::Static).rect);
    }

    #[test]
    fn grouped_bars_grow_monotonically_to_their_targets() {
        use crate::charts::budget_comparison_chart;
        use crate::types::BudgetComparison;

        let row = |name: &str, budgeted: f64, spent: f64| BudgetComparison {
            budget_name: name.into(),
            budgeted_amount: budgeted,
            spent_amount: spent,
            over_budget: spent > budgeted,
        };
        let chart = budget_comparison_chart(&[
            row("Rent", 1200.0, 1200.0),
            row("Food", 500.0, 520.0),
            row("Fun", 200.0, 24.0),
        ]);
        let plot = chart.plot().unwrap();
        let schedule = Schedule::for_plot(plot);
        assert_eq!(schedule.total_duration(), SECONDARY.end_ms());

        let mut previous = schedule.frame(0);
        assert!(previous.bars.iter().all(|b| b.rect.height == 0.0));
        for t in (10..=1200).step_by(10) {
            let frame = schedule.frame(t);
            for (before, now) in previous.bars.iter().zip(&frame.bars) {
                assert!(now.rect.height >= before.rect.height - 1e-9, "{} shrank at {t}", now.key);
                assert!(now.rect.y <= before.rect.y + 1e-9, "{} dropped at {t}", now.key);
            }
            if t == 200 {
                let spent: Vec<_> = frame.bars.iter().filter(|b| b.role == "spent").collect();
                assert_eq!(spent.len(), 3);
                assert!(spent.iter().all(|b| b.rect.height == 0.0));
            }
            previous = frame;
        }

        let last = schedule.frame(1200);
        for (bar, target) in last.bars.iter().zip(&plot.bars) {
            assert_eq!(bar.rect, target.rect);
        }
    }

    #[test]
    fn static_bars_never_move() {
        let track = BarTrack::new(&bar(Motion::Static), 240.0);
        assert_eq!(track.at(0), bar(Motion::Static).rect);
    }
}
