//! Markdown preview hand-off.
//!
//! # Responsibility
//! - Turn the editor buffer into a standalone HTML document.
//! - Persist it to a temporary `.html` file and pass it to a viewer.
//!
//! # Invariants
//! - The core never parses or validates the produced HTML.
//! - Blank buffers are rejected instead of producing an empty page.

use crate::fs::FsError;
use log::{info, warn};
use pulldown_cmark::{html, Options, Parser};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

const PREVIEW_FILE_PREFIX: &str = "notebook-preview-";

/// Errors from preview rendering and hand-off.
#[derive(Debug)]
pub enum PreviewError {
    /// Buffer has no visible content.
    Empty,
    /// Writing the temporary HTML file failed.
    Write(FsError),
    /// The external viewer could not be launched.
    Open(String),
}

impl Display for PreviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "nothing to preview"),
            Self::Write(err) => write!(f, "failed to write preview: {err}"),
            Self::Open(message) => write!(f, "failed to open preview: {message}"),
        }
    }
}

impl Error for PreviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) => Some(err),
            _ => None,
        }
    }
}

/// Markdown-to-HTML collaborator: text in, HTML fragment out.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

/// CommonMark renderer with the GFM extensions notes commonly use
/// (tables, strikethrough, task lists, footnotes).
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonMarkRenderer;

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_FOOTNOTES);
        let parser = Parser::new_ext(markdown, options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Opens a rendered preview file for the user.
pub trait PreviewViewer: Send + Sync {
    fn open(&self, path: &Path) -> Result<(), PreviewError>;
}

/// Hands the file to the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemViewer;

impl PreviewViewer for SystemViewer {
    fn open(&self, path: &Path) -> Result<(), PreviewError> {
        open::that(path).map_err(|err| PreviewError::Open(err.to_string()))
    }
}

/// Renders buffer text into a full HTML document.
pub fn render_document(
    renderer: &dyn MarkdownRenderer,
    buffer_text: &str,
) -> Result<String, PreviewError> {
    if buffer_text.trim().is_empty() {
        return Err(PreviewError::Empty);
    }
    let body = renderer.render(buffer_text);
    Ok(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Preview</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    ))
}

/// Writes HTML into a temporary file that outlives this process.
pub fn write_preview_file(html: &str) -> Result<PathBuf, PreviewError> {
    let temp_dir = std::env::temp_dir();
    let mut file = tempfile::Builder::new()
        .prefix(PREVIEW_FILE_PREFIX)
        .suffix(".html")
        .tempfile()
        .map_err(|err| PreviewError::Write(FsError::from_io(&temp_dir, err)))?;
    file.write_all(html.as_bytes())
        .map_err(|err| PreviewError::Write(FsError::from_io(file.path(), err)))?;
    let (_, path) = file
        .keep()
        .map_err(|err| PreviewError::Write(FsError::from_io(&temp_dir, err.error)))?;
    Ok(path)
}

/// Renders, persists and opens one preview. Returns the HTML file path.
pub fn open_preview(
    renderer: &dyn MarkdownRenderer,
    viewer: &dyn PreviewViewer,
    buffer_text: &str,
) -> Result<PathBuf, PreviewError> {
    let html = render_document(renderer, buffer_text)?;
    let path = write_preview_file(&html)?;
    if let Err(err) = viewer.open(&path) {
        warn!(
            "event=preview_open module=preview status=error path={} error={}",
            path.display(),
            err
        );
        return Err(err);
    }
    info!(
        "event=preview_open module=preview status=ok path={} bytes={}",
        path.display(),
        html.len()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{render_document, write_preview_file, CommonMarkRenderer, PreviewError};

    #[test]
    fn blank_buffer_is_rejected() {
        let err = render_document(&CommonMarkRenderer, " \n\t").unwrap_err();
        assert!(matches!(err, PreviewError::Empty));
    }

    #[test]
    fn renders_headings_tables_and_strikethrough() {
        let html = render_document(
            &CommonMarkRenderer,
            "# Title\n\n~~gone~~\n\n| a | b |\n| - | - |\n| 1 | 2 |\n",
        )
        .unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn preview_file_is_persisted_with_html_suffix() {
        let path = write_preview_file("<p>x</p>").unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>x</p>");
        std::fs::remove_file(path).unwrap();
    }
}
