/// arcview terminal viewer
///
/// Renders a handful of randomly placed boxes and lets you move and rotate
/// them with the mouse.
/// Controls:
///   - Drag: move the box under the pointer across its facing plane
///   - Double-click a box: select it and show the rotation pivot
///   - Double-click empty space: select the whole scene
///   - Drag while a pivot is shown: rotate the selection
///   - Wheel: zoom
///   - Q/ESC: Quit
///
/// Usage: `arcview-terminal [config.toml]`. Logging follows `RUST_LOG`.
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use arcview_core::ViewerConfig;
use arcview_terminal::TerminalApp;

fn main() -> io::Result<()> {
    env_logger::init();

    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ViewerConfig::load(&path)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        None => ViewerConfig::default(),
    };

    // Nanosecond clock as seed unless the config pins one
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();

    let mut app = TerminalApp::new(config, seed)?;
    app.run()
}
