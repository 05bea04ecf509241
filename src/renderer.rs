//! The document renderer seam: one trait, three strategies, and the atomic
//! output writer every entry point reports through.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::content::Document;
use crate::error::{Error, Result};
use crate::flow::layout_document;
use crate::geometry::PageGeometry;
use crate::render::render_pdf;

/// PDF bytes plus the page count when the strategy knows it.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub pages: Option<usize>,
}

/// Turns a document into a paginated PDF.
pub trait Renderer {
    fn render(&self, doc: &Document, geometry: &PageGeometry) -> Result<Rendered>;

    /// Render and write to `path`. A failed render leaves no file behind.
    fn render_to_file(
        &self,
        doc: &Document,
        geometry: &PageGeometry,
        path: &Path,
    ) -> Result<OutputReport> {
        let rendered = self.render(doc, geometry)?;
        write_output(path, &rendered)
    }
}

/// The built-in flow engine: blocks are laid out directly into pages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectRenderer;

impl Renderer for DirectRenderer {
    fn render(&self, doc: &Document, geometry: &PageGeometry) -> Result<Rendered> {
        let layout = layout_document(doc, geometry)?;
        let pages = layout.pages.len();
        let bytes = render_pdf(&layout)?;
        Ok(Rendered {
            bytes,
            pages: Some(pages),
        })
    }
}

/// What a successful run reports on the console.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputReport {
    /// Absolute path of the written file.
    pub path: PathBuf,
    pub size_bytes: u64,
    pub pages: Option<usize>,
}

impl OutputReport {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The three success lines.
    pub fn lines(&self) -> [String; 3] {
        [
            format!("\u{2713} PDF generated successfully: {}", self.file_name()),
            format!("\u{2713} File size: {:.1} KB", self.size_kb()),
            format!("\u{2713} Location: {}", self.path.display()),
        ]
    }

    pub fn print(&self) {
        for line in self.lines() {
            println!("{line}");
        }
    }
}

/// Write PDF bytes atomically: into a temporary file next to `path`, then
/// persisted over it. The parent directory is created if missing.
pub fn write_output(path: &Path, rendered: &Rendered) -> Result<OutputReport> {
    let path = absolute(path)?;
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| Error::io(&dir, e))?;
    tmp.write_all(&rendered.bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| Error::io(tmp.path(), e))?;
    tmp.persist(&path).map_err(|e| Error::io(&path, e.error))?;

    let size_bytes = fs::metadata(&path)
        .map_err(|e| Error::io(&path, e))?
        .len();
    log::info!("wrote {} ({} bytes)", path.display(), size_bytes);
    Ok(OutputReport {
        path,
        size_bytes,
        pages: rendered.pages,
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    Ok(cwd.join(path))
}

/// Count page objects in a PDF byte stream. Matches `/Type /Page` and
/// `/Type/Page` but not `/Pages`.
pub fn count_pages(pdf: &[u8]) -> usize {
    let mut count = 0;
    for pattern in [&b"/Type /Page"[..], &b"/Type/Page"[..]] {
        let mut i = 0;
        while let Some(pos) = find(&pdf[i..], pattern) {
            let end = i + pos + pattern.len();
            if !pdf.get(end).is_some_and(|c| c.is_ascii_alphabetic()) {
                count += 1;
            }
            i = end;
        }
    }
    count
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lines() {
        let report = OutputReport {
            path: PathBuf::from("/tmp/out/Deck.pdf"),
            size_bytes: 2048 + 102,
            pages: Some(2),
        };
        let [name, size, location] = report.lines();
        assert_eq!(name, "\u{2713} PDF generated successfully: Deck.pdf");
        assert_eq!(size, "\u{2713} File size: 2.1 KB");
        assert_eq!(location, "\u{2713} Location: /tmp/out/Deck.pdf");
    }

    #[test]
    fn write_creates_directory_and_reports_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.pdf");
        let rendered = Rendered {
            bytes: b"%PDF-1.7 test".to_vec(),
            pages: None,
        };
        let report = write_output(&path, &rendered).unwrap();
        assert_eq!(report.size_bytes, 13);
        assert_eq!(fs::read(&path).unwrap(), rendered.bytes);
        let leftovers = fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary file was persisted, not copied");
    }

    #[test]
    fn counts_page_objects_only() {
        let pdf = b"<< /Type /Pages /Count 2 >> << /Type /Page >> << /Type/Page/Parent 1 0 R >>";
        assert_eq!(count_pages(pdf), 2);
    }
}
