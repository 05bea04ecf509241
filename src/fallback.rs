//! Fallback reporter – when markup conversion fails, hand the source to the
//! operator's viewer so they can print it to PDF themselves.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

/// Something that can show a file to the operator.
pub trait Viewer {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// The platform's default opener, spawned without waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemViewer;

impl Viewer for SystemViewer {
    fn open(&self, path: &Path) -> io::Result<()> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]).arg(path);
            c
        } else if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg(path);
            c
        } else {
            let mut c = Command::new("xdg-open");
            c.arg(path);
            c
        };
        log::debug!("launching viewer: {cmd:?}");
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
    }
}

/// Open `source` in the viewer and print the manual print instruction.
/// Never fails: a viewer that cannot start is logged and reported.
pub fn open_for_manual_print(source: &Path, viewer: &dyn Viewer) {
    match viewer.open(source) {
        Ok(()) => println!("\u{2713} Opened HTML in browser: {}", source.display()),
        Err(e) => {
            log::warn!("could not launch viewer for {}: {e}", source.display());
            println!("\u{2717} Could not open {}: {e}", source.display());
        }
    }
    println!("  Please use Print > Save as PDF from your browser");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    struct Recorder(RefCell<Vec<PathBuf>>);

    impl Viewer for Recorder {
        fn open(&self, path: &Path) -> io::Result<()> {
            self.0.borrow_mut().push(path.to_path_buf());
            Err(io::Error::new(io::ErrorKind::NotFound, "no display"))
        }
    }

    #[test]
    fn viewer_failure_is_swallowed() {
        let viewer = Recorder(RefCell::new(Vec::new()));
        open_for_manual_print(Path::new("deck.html"), &viewer);
        assert_eq!(*viewer.0.borrow(), vec![PathBuf::from("deck.html")]);
    }
}
