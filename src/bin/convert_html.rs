//! Converts the executive summary markup to PDF, or opens it in the
//! system viewer for a manual print when conversion fails.

use deck_forge::fallback::SystemViewer;
use deck_forge::markup::{convert_with_fallback, ConversionOutcome, MarkupConverter};
use deck_forge::paths::{markup_source, output_file, MARKUP_SUMMARY_PDF};

fn main() {
    env_logger::init();

    let outcome = convert_with_fallback(
        &MarkupConverter::default(),
        &markup_source(),
        &output_file(MARKUP_SUMMARY_PDF),
        &SystemViewer,
    );
    if let ConversionOutcome::Converted(report) = outcome {
        report.print();
    }
}
