/// Solidview Terminal - split-screen solid geometry explorer
///
/// Controls:
///   - 1-8: Load a catalog shape
///   - /: Describe a shape in plain text
///   - T/F/S/I: Camera presets, R: reset
///   - Arrow Keys: Orbit the main camera
///   - [ ]: 2D/3D transition, X/P/,/.: cross-section
///   - Q/ESC: Quit
///
/// Set SOLIDVIEW_LOG to a file path to capture tracing output.
use std::fs::File;
use std::io;
use std::sync::Mutex;

use solidview_core::VisualizerConfig;
use solidview_terminal::TerminalApp;
use tracing_subscriber::EnvFilter;

fn init_logging() -> io::Result<()> {
    // The terminal owns stdout, so logs only go to a file when asked for
    let Some(path) = std::env::var_os("SOLIDVIEW_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> io::Result<()> {
    init_logging()?;

    let mut app = TerminalApp::new(VisualizerConfig::default())?;
    if let Err(err) = app.visualizer_mut().load_shape("cube") {
        eprintln!("Could not load the starting shape: {err}");
    }
    app.run()?;

    println!("Thank you for using Solidview!");
    Ok(())
}
