//! Placement of the task tooltip and the task form.
//!
//! All coordinates are in the same unit as the viewport (terminal cells when
//! driven by the dashboard).

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Anchor {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2, self.top + self.height / 2)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub left: i32,
    pub top: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupMetrics {
    pub tooltip_width: i32,
    pub tooltip_height: i32,
    pub tooltip_gap: i32,
    pub edge_padding: i32,
    pub form_width: i32,
    pub form_height: i32,
    pub form_margin: i32,
}

impl Default for PopupMetrics {
    fn default() -> Self {
        Self {
            tooltip_width: 34,
            tooltip_height: 7,
            tooltip_gap: 0,
            edge_padding: 1,
            form_width: 46,
            form_height: 15,
            form_margin: 1,
        }
    }
}

impl PopupMetrics {
    pub fn tooltip_size(&self) -> Size {
        Size::new(self.tooltip_width, self.tooltip_height)
    }

    pub fn form_size(&self) -> Size {
        Size::new(self.form_width, self.form_height)
    }

    pub(crate) fn clamp(&mut self) {
        self.tooltip_width = self.tooltip_width.max(12);
        self.tooltip_height = self.tooltip_height.max(3);
        self.tooltip_gap = self.tooltip_gap.max(0);
        self.edge_padding = self.edge_padding.max(0);
        self.form_width = self.form_width.max(24);
        self.form_height = self.form_height.max(10);
        self.form_margin = self.form_margin.max(0);
    }
}

/// Below-left of the anchor, pulled back inside the right edge and flipped
/// above the anchor when it would run off the bottom.
pub fn place_tooltip(anchor: Anchor, viewport: Size, metrics: &PopupMetrics) -> Position {
    let mut left = anchor.left;
    let mut top = anchor.bottom() + metrics.tooltip_gap;

    let overflow_right = left + metrics.tooltip_width - viewport.width;
    if overflow_right > 0 {
        left -= overflow_right + metrics.edge_padding;
    }

    if top + metrics.tooltip_height > viewport.height {
        top = anchor.top - metrics.tooltip_height - metrics.tooltip_gap;
    }

    Position {
        left: left.max(0),
        top: top.max(0),
    }
}

pub fn place_form(point: Option<Point>, viewport: Size, metrics: &PopupMetrics) -> Position {
    let size = metrics.form_size();
    let Some(point) = point else {
        return Position {
            left: ((viewport.width - size.width) / 2).max(0),
            top: ((viewport.height - size.height) / 2).max(0),
        };
    };

    Position {
        left: clamp_axis(point.x - size.width / 2, size.width, viewport.width, metrics.form_margin),
        top: clamp_axis(point.y - size.height / 2, size.height, viewport.height, metrics.form_margin),
    }
}

fn clamp_axis(start: i32, extent: i32, available: i32, margin: i32) -> i32 {
    let max = available - extent - margin;
    start.min(max).max(margin)
}

/// Deferred hide of the tooltip.
///
/// Cancelling is always safe, including after the timer fired.
#[derive(Debug, Clone, Copy, Default)]
pub struct HideTimer {
    deadline: Option<Instant>,
}

impl HideTimer {
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns true exactly once, when the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
