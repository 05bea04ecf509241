//! Headless-browser print – loads markup in a headless Chromium and prints
//! it to PDF with backgrounds forced on.
//!
//! The markup is staged as a temporary copy next to its source so relative
//! references still resolve, with an `@page` rule injected for the page size
//! and margins. The browser runs synchronously; [`ChildGuard`] kills and
//! reaps it on every exit path.

use std::env;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use crate::content::Document;
use crate::error::{Error, Result};
use crate::geometry::PageGeometry;
use crate::markup::to_html;
use crate::renderer::{count_pages, write_output, OutputReport, Rendered, Renderer};

/// Executable names searched on `PATH`, in order.
pub const CANDIDATES: [&str; 5] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Use this executable instead of searching.
    pub executable: Option<PathBuf>,
    pub candidates: Vec<String>,
    /// Run with Chromium's sandbox. Off by default, since the sandbox
    /// refuses to start as root in containers.
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            candidates: CANDIDATES.iter().map(|s| s.to_string()).collect(),
            sandbox: false,
        }
    }
}

impl BrowserConfig {
    /// Resolve the browser executable.
    pub fn locate(&self) -> Result<PathBuf> {
        if let Some(exe) = &self.executable {
            return if exe.is_file() {
                Ok(exe.clone())
            } else {
                Err(Error::BrowserNotFound(exe.display().to_string()))
            };
        }
        self.candidates
            .iter()
            .find_map(|name| find_on_path(name))
            .ok_or_else(|| Error::BrowserNotFound(self.candidates.join(", ")))
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = candidate.with_extension("exe");
        exe.is_file().then_some(exe)
    })
}

/// Kills and reaps the child if it is still running when dropped.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.0.try_wait() {
            log::debug!("stopping browser process {}", self.0.id());
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }
}

/// Insert the print stylesheet before `</head>`, or at the start when the
/// markup has no head.
pub fn inject_print_css(html: &str, page: &PageGeometry) -> String {
    let css = format!(
        "<style>@page{{size:{}pt {}pt;margin:{}pt {}pt {}pt {}pt}} html{{-webkit-print-color-adjust:exact;print-color-adjust:exact}}</style>",
        page.width, page.height, page.margin_top, page.margin_right, page.margin_bottom, page.margin_left
    );
    match html.to_ascii_lowercase().find("</head>") {
        Some(at) => format!("{}{}{}", &html[..at], css, &html[at..]),
        None => format!("{css}{html}"),
    }
}

fn file_url(path: &Path) -> String {
    let p = path.display().to_string().replace('\\', "/").replace(' ', "%20");
    if p.starts_with('/') {
        format!("file://{p}")
    } else {
        format!("file:///{p}")
    }
}

/// Prints markup through a headless Chromium.
#[derive(Debug, Clone, Default)]
pub struct BrowserPrinter {
    pub config: BrowserConfig,
}

impl BrowserPrinter {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    /// Print `html` to PDF bytes. `base_dir` is where the staged copy lives,
    /// so relative references in the markup resolve against it.
    pub fn print_html(&self, html: &str, base_dir: &Path, page: &PageGeometry) -> Result<Vec<u8>> {
        let exe = self.config.locate()?;

        let mut staged = tempfile::Builder::new()
            .prefix(".deck-forge-")
            .suffix(".html")
            .tempfile_in(base_dir)
            .map_err(|e| Error::io(base_dir, e))?;
        staged
            .write_all(inject_print_css(html, page).as_bytes())
            .and_then(|_| staged.flush())
            .map_err(|e| Error::io(staged.path(), e))?;

        let scratch = tempfile::tempdir().map_err(|e| Error::io(env::temp_dir(), e))?;
        let pdf_path = scratch.path().join("print.pdf");
        let profile = scratch.path().join("profile");

        let mut cmd = Command::new(&exe);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--user-data-dir={}", profile.display()))
            .arg(format!("--print-to-pdf={}", pdf_path.display()));
        if !self.config.sandbox {
            cmd.arg("--no-sandbox");
        }
        cmd.arg(file_url(staged.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        log::debug!("running {cmd:?}");

        let child = cmd.spawn().map_err(|e| Error::io(&exe, e))?;
        let mut guard = ChildGuard(child);
        let mut stderr = String::new();
        if let Some(mut pipe) = guard.0.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = guard.0.wait().map_err(|e| Error::io(&exe, e))?;

        let bytes = fs::read(&pdf_path).unwrap_or_default();
        if !status.success() || !bytes.starts_with(b"%PDF-") {
            let tail: String = stderr
                .lines()
                .rev()
                .take(5)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join("\n");
            return Err(Error::BrowserFailed {
                status: status.to_string(),
                stderr: tail,
            });
        }
        log::info!("browser printed {} bytes", bytes.len());
        Ok(bytes)
    }

    /// Print a markup file on disk to `output`, with zero page margins.
    pub fn print_file(&self, source: &Path, output: &Path) -> Result<OutputReport> {
        let html = fs::read_to_string(source).map_err(|e| Error::io(source, e))?;
        let base = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let bytes = self.print_html(&html, &base, &PageGeometry::a4())?;
        let pages = count_pages(&bytes);
        write_output(
            output,
            &Rendered {
                bytes,
                pages: Some(pages),
            },
        )
    }
}

impl Renderer for BrowserPrinter {
    fn render(&self, doc: &Document, geometry: &PageGeometry) -> Result<Rendered> {
        let html = to_html(doc, geometry)?;
        let bytes = self.print_html(&html, &env::temp_dir(), geometry)?;
        let pages = count_pages(&bytes);
        Ok(Rendered {
            bytes,
            pages: Some(pages),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_css_goes_into_head() {
        let html = "<html><HEAD><title>x</title></HEAD><body></body></html>";
        let out = inject_print_css(html, &PageGeometry::a4());
        let style_at = out.find("<style>@page").unwrap();
        assert!(style_at < out.find("</HEAD>").unwrap());
        assert!(out.contains("margin:0pt 0pt 0pt 0pt"));
        assert!(out.contains("print-color-adjust:exact"));
    }

    #[test]
    fn headless_markup_gets_css_prepended() {
        let out = inject_print_css("<p>x</p>", &PageGeometry::a4().uniform(10.0));
        assert!(out.starts_with("<style>"));
        assert!(out.ends_with("<p>x</p>"));
    }

    #[test]
    fn missing_executable_is_reported() {
        let config = BrowserConfig {
            executable: Some(PathBuf::from("/nonexistent/chromium")),
            ..BrowserConfig::default()
        };
        assert!(matches!(config.locate(), Err(Error::BrowserNotFound(_))));

        let config = BrowserConfig {
            candidates: vec!["deck-forge-no-such-browser".to_string()],
            ..BrowserConfig::default()
        };
        let err = config.locate().unwrap_err();
        assert!(err.to_string().contains("deck-forge-no-such-browser"));
    }

    #[test]
    fn file_urls_are_absolute() {
        assert_eq!(file_url(Path::new("/a b/c.html")), "file:///a%20b/c.html");
    }
}
