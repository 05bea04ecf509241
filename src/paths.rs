//! Fixed input and output locations, resolved against the crate directory.

use std::path::PathBuf;

/// Output of the direct-engine executive summary.
pub const EXECUTIVE_SUMMARY_PDF: &str = "Regulatory_Package_Manager_Executive_Summary.pdf";

/// Output of the direct-engine technical overview.
pub const TECHNICAL_OVERVIEW_PDF: &str = "NYQST_Technical_Overview.pdf";

/// Output of the markup conversion and browser print of the summary markup.
pub const MARKUP_SUMMARY_PDF: &str = "NYQST_Regulatory_Package_Manager_Executive_Summary.pdf";

pub fn crate_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// The hand-written executive summary markup.
pub fn markup_source() -> PathBuf {
    crate_dir().join("assets").join("executive_summary.html")
}

pub fn output_dir() -> PathBuf {
    crate_dir().join("output")
}

pub fn output_file(name: &str) -> PathBuf {
    output_dir().join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_source_ships_with_the_crate() {
        assert!(markup_source().is_file());
        assert!(output_file(MARKUP_SUMMARY_PDF).ends_with("output/NYQST_Regulatory_Package_Manager_Executive_Summary.pdf"));
    }
}
