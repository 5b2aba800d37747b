/// Platform-agnostic input events.
///
/// Hosts translate their native events (crossterm mouse reports, DOM
/// `MouseEvent`s) into these and hand them to [`Viewer::handle`](crate::Viewer::handle).
/// Coordinates are in the host's surface units with the origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f32, y: f32 },
    PointerDown { x: f32, y: f32 },
    PointerUp,
    DoubleClick { x: f32, y: f32 },
    /// Positive `delta_y` scrolls down (zoom out)
    Wheel { delta_y: f32 },
    Resized { width: u32, height: u32 },
}
