use std::path::PathBuf;

use anyhow::Result;

use corvus::CorvusApp;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Optional first argument overrides the model directory.
    let asset_root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("models"));

    let app = CorvusApp::new(asset_root)?;
    app.run()
}
