//! Prints the executive summary markup through a headless browser.

use std::process;

use deck_forge::browser::BrowserPrinter;
use deck_forge::paths::{markup_source, output_file, MARKUP_SUMMARY_PDF};

fn main() {
    env_logger::init();

    let printer = BrowserPrinter::default();
    match printer.print_file(&markup_source(), &output_file(MARKUP_SUMMARY_PDF)) {
        Ok(report) => report.print(),
        Err(e) => {
            eprintln!("\u{2717} Error: {e}");
            process::exit(1);
        }
    }
}
