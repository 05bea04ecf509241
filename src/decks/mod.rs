//! The two fixed decks, assembled block by block.

pub mod executive;
pub mod technical;

pub use executive::executive_summary;
pub use technical::technical_overview;

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::flow::layout_document;

    #[test]
    fn executive_summary_lays_out_on_two_pages() {
        let doc = executive_summary().unwrap();
        let layout = layout_document(&doc, &executive::geometry()).unwrap();
        assert_eq!(layout.pages.len(), 2);
    }

    #[test]
    fn technical_overview_has_a_page_per_section_at_least() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let doc = technical_overview(date).unwrap();
        let layout = layout_document(&doc, &technical::geometry()).unwrap();
        assert!(layout.pages.len() > doc.page_breaks());
    }
}
