//! Error types shared by every rendering strategy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::theme::StyleName;

/// Result type alias for deck-forge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The two failure classes a run can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Layout or conversion could not produce output.
    Render,
    /// An input could not be read or the output could not be written.
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Layout, markup conversion, or PDF emission failed.
    #[error("render failed: {0}")]
    Render(String),

    /// A content block references a style the theme does not define.
    #[error("block {block} references undefined style `{style}`")]
    MissingStyle { style: StyleName, block: usize },

    /// No headless browser executable could be located.
    #[error("no headless browser found (tried: {0})")]
    BrowserNotFound(String),

    /// The browser process ran but did not produce a PDF.
    #[error("browser exited with {status}: {stderr}")]
    BrowserFailed { status: String, stderr: String },

    /// Reading an input or writing the output failed.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } => ErrorKind::Io,
            Error::Render(_)
            | Error::MissingStyle { .. }
            | Error::BrowserNotFound(_)
            | Error::BrowserFailed { .. } => ErrorKind::Render,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::Render("x".into()).kind(), ErrorKind::Render);
        let io_err = Error::io("/nope", io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(io_err.kind(), ErrorKind::Io);
        assert_eq!(io_err.to_string(), "/nope: gone");
    }
}
