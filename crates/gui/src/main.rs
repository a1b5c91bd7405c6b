mod app;
mod ui;
mod viewport;

// Re-export library modules so that `crate::geometry`, `crate::state`,
// etc. resolve to the lib crate types everywhere in the binary.
pub use blastpad_gui_lib::geometry;
pub use blastpad_gui_lib::state;

use app::BlastApp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blastpad_gui=info".into()),
        )
        .init();

    // Parse --drawing <path> argument
    let initial_drawing = parse_drawing_arg();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Blastpad — Blast Pattern Designer")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "blastpad-gui",
        native_options,
        Box::new(move |cc| Ok(Box::new(BlastApp::new(cc, initial_drawing)))),
    ) {
        tracing::error!("Failed to start application: {e}");
    }
}

fn parse_drawing_arg() -> Option<shared::Drawing> {
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--drawing" && i + 1 < args.len() {
            let path = &args[i + 1];
            match std::fs::read_to_string(path) {
                Ok(json) => match serde_json::from_str::<shared::Drawing>(&json) {
                    Ok(drawing) => {
                        tracing::info!("Loaded drawing from {path} ({} holes)", drawing.holes.len());
                        return Some(drawing);
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse drawing JSON from {path}: {e}");
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read drawing file {path}: {e}");
                }
            }
            break;
        }
        i += 1;
    }
    None
}
