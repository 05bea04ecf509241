//! Renders the technical overview with the direct layout engine, dated
//! with the current month.

use std::process;

use deck_forge::decks::{technical, technical_overview};
use deck_forge::paths::{output_file, TECHNICAL_OVERVIEW_PDF};
use deck_forge::renderer::{DirectRenderer, Renderer};

fn main() {
    env_logger::init();

    let today = chrono::Local::now().date_naive();
    let result = technical_overview(today).and_then(|doc| {
        DirectRenderer.render_to_file(
            &doc,
            &technical::geometry(),
            &output_file(TECHNICAL_OVERVIEW_PDF),
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
