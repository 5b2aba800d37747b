//! Mapping crossterm mouse reports onto viewer input events.

use std::time::{Duration, Instant};

use arcview_core::InputEvent;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

/// Maximum gap between two presses that still counts as a double-click
pub const DOUBLE_CLICK_THRESHOLD: Duration = Duration::from_millis(400);

/// Terminal cells are roughly twice as tall as they are wide
pub const CELL_ASPECT: f32 = 2.0;

/// Surface size (in the viewer's units) of a terminal of `columns x rows`
pub fn surface_size(columns: u16, rows: u16) -> (u32, u32) {
    (
        u32::from(columns),
        (f32::from(rows) * CELL_ASPECT).round() as u32,
    )
}

/// Centre of a terminal cell in surface units
pub fn cell_center(column: u16, row: u16) -> (f32, f32) {
    (
        f32::from(column) + 0.5,
        (f32::from(row) + 0.5) * CELL_ASPECT,
    )
}

/// Tracks left-button presses so a second press on the same cell within
/// [`DOUBLE_CLICK_THRESHOLD`] produces a double-click on release.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last_press: Option<(Instant, u16, u16)>,
    pending_double: bool,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press and report whether it completes a double-click
    pub fn press(&mut self, column: u16, row: u16, now: Instant) -> bool {
        let is_double = matches!(
            self.last_press,
            Some((at, c, r)) if c == column && r == row && now.duration_since(at) <= DOUBLE_CLICK_THRESHOLD
        );

        // A third press starts a fresh sequence
        self.last_press = if is_double {
            None
        } else {
            Some((now, column, row))
        };
        self.pending_double = is_double;
        is_double
    }

    /// Consume the double-click flag set by the last press
    pub fn release(&mut self) -> bool {
        std::mem::take(&mut self.pending_double)
    }

    /// Movement between presses cancels a pending pair
    pub fn cancel(&mut self) {
        self.last_press = None;
    }
}

/// Translate one mouse report into zero or more viewer events
pub fn map_mouse(event: MouseEvent, clicks: &mut ClickTracker, now: Instant) -> Vec<InputEvent> {
    let (x, y) = cell_center(event.column, event.row);
    match event.kind {
        MouseEventKind::Moved => vec![InputEvent::PointerMoved { x, y }],
        MouseEventKind::Drag(MouseButton::Left) => {
            clicks.cancel();
            vec![InputEvent::PointerMoved { x, y }]
        }
        MouseEventKind::Down(MouseButton::Left) => {
            clicks.press(event.column, event.row, now);
            vec![InputEvent::PointerDown { x, y }]
        }
        MouseEventKind::Up(MouseButton::Left) => {
            if clicks.release() {
                vec![InputEvent::PointerUp, InputEvent::DoubleClick { x, y }]
            } else {
                vec![InputEvent::PointerUp]
            }
        }
        MouseEventKind::ScrollDown => vec![InputEvent::Wheel { delta_y: 100.0 }],
        MouseEventKind::ScrollUp => vec![InputEvent::Wheel { delta_y: -100.0 }],
        _ => Vec::new(),
    }
}
