//! Renders the executive summary with the direct layout engine.

use std::process;

use deck_forge::decks::{executive, executive_summary};
use deck_forge::paths::{output_file, EXECUTIVE_SUMMARY_PDF};
use deck_forge::renderer::{DirectRenderer, Renderer};

fn main() {
    env_logger::init();

    let result = executive_summary().and_then(|doc| {
        DirectRenderer.render_to_file(
            &doc,
            &executive::geometry(),
            &output_file(EXECUTIVE_SUMMARY_PDF),
        )
    });
    match result {
        Ok(report) => report.print(),
        Err(e) => {
            eprintln!("\u{2717} Error: {e}");
            process::exit(1);
        }
    }
}
