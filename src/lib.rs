//! # deck-forge – pitch decks to PDF, three ways
//!
//! The crate renders two fixed documents, an executive summary and a
//! technical overview, from one content model:
//!
//! 1. **Theme** – named block styles built from a palette ([`theme`])
//! 2. **Content** – an ordered list of styled blocks ([`content`], [`decks`])
//! 3. **Render** – one of three [`renderer::Renderer`] strategies:
//!    - the direct flow engine ([`flow`]) emitting through printpdf ([`render`]);
//!    - markup conversion ([`markup`]), which serialises blocks to HTML and
//!      runs the parse → style → layout → paginate pipeline ([`pipeline`]);
//!    - headless-browser print ([`browser`]).
//!
//! When markup conversion fails, [`fallback`] opens the source for a
//! manual print.

pub mod browser;
pub mod content;
pub mod decks;
pub mod dom;
pub mod error;
pub mod fallback;
pub mod flow;
pub mod fonts;
pub mod geometry;
pub mod inline;
pub mod layout;
pub mod layout_config;
pub mod markup;
pub mod pagination;
pub mod paths;
pub mod pipeline;
pub mod render;
pub mod renderer;
pub mod style;
pub mod theme;

// Re-exports for convenience
pub use content::{ContentBlock, Document, DocumentBuilder, TableData, TableRules};
pub use error::{Error, ErrorKind, Result};
pub use geometry::{PageGeometry, CM};
pub use renderer::{DirectRenderer, OutputReport, Renderer};
pub use theme::{Palette, StyleName, Theme};
