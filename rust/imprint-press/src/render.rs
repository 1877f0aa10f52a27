//! Turning HTML into PDF.
//!
//! The [Press](crate::Press) only depends on the [Renderer] contract;
//! [WkHtmlToPdf] fulfils it by running the `wkhtmltopdf` binary.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use imprint_common::ConditionalSync;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// The name of the binary looked up inside a directory given as path.
pub const WKHTMLTOPDF: &str = "wkhtmltopdf";

/// Page margins in millimetres. Unset margins keep the renderer's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    /// `--margin-top`
    pub top: Option<u32>,
    /// `--margin-bottom`
    pub bottom: Option<u32>,
    /// `--margin-left`
    pub left: Option<u32>,
    /// `--margin-right`
    pub right: Option<u32>,
}

/// A document to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// HTML of the page content
    pub body: String,
    /// HTML repeated at the top of every page
    pub header: Option<String>,
    /// HTML repeated at the bottom of every page
    pub footer: Option<String>,
    /// Page margins
    pub margins: Margins,
}

/// The errors that may occur while rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer process could not be started
    #[error("Failed to start renderer '{0}': {1}")]
    Spawn(String, String),

    /// A header or footer could not be written to a temporary file
    #[error("Failed to prepare temporary file: {0}")]
    TempFile(String),

    /// The renderer exited unsuccessfully
    #[error("Renderer exited with {status}: {stderr}")]
    Failed {
        /// Exit status as reported by the OS
        status: String,
        /// Whatever the renderer printed to stderr
        stderr: String,
    },

    /// Talking to the renderer process failed
    #[error("Renderer I/O failed: {0}")]
    Io(String),
}

/// Something that turns a [Document] into PDF bytes.
#[async_trait]
pub trait Renderer: Clone + ConditionalSync {
    /// Render `document`
    async fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError>;
}

/// Renders by running `wkhtmltopdf`, feeding the page on stdin and reading
/// the PDF from stdout.
///
/// Headers and footers can only be passed to `wkhtmltopdf` as files, so they
/// are written to temporary `.html` files that live as long as the render.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    binary: PathBuf,
}

impl Default for WkHtmlToPdf {
    fn default() -> Self {
        Self::new(WKHTMLTOPDF)
    }
}

impl WkHtmlToPdf {
    /// Run `binary`. When `binary` is a directory, the `wkhtmltopdf` inside it
    /// is run instead.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        let binary = binary.into();
        let binary = if binary.is_dir() {
            binary.join(WKHTMLTOPDF)
        } else {
            binary
        };
        Self { binary }
    }

    /// The binary that gets run.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The command line for `document`, with header and footer read from the
    /// given files.
    pub fn arguments(
        document: &Document,
        header: Option<&Path>,
        footer: Option<&Path>,
    ) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = vec!["--no-outline".into()];

        let margins = [
            ("--margin-top", document.margins.top),
            ("--margin-bottom", document.margins.bottom),
            ("--margin-left", document.margins.left),
            ("--margin-right", document.margins.right),
        ];
        for (flag, margin) in margins {
            if let Some(margin) = margin {
                arguments.push(flag.into());
                arguments.push(margin.to_string().into());
            }
        }

        arguments.extend(
            [
                "page",
                "-",
                "--encoding",
                "UTF-8",
                "--disable-smart-shrinking",
                "--load-error-handling",
                "ignore",
            ]
            .map(OsString::from),
        );

        if let Some(header) = header {
            arguments.push("--header-html".into());
            arguments.push(header.into());
        }
        if let Some(footer) = footer {
            arguments.push("--footer-html".into());
            arguments.push(footer.into());
        }

        // Write the PDF to stdout
        arguments.push("-".into());
        arguments
    }
}

#[async_trait]
impl Renderer for WkHtmlToPdf {
    async fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        let header = stage_html(document.header.clone()).await?;
        let footer = stage_html(document.footer.clone()).await?;

        let mut child = Command::new(&self.binary)
            .args(Self::arguments(
                document,
                header.as_ref().map(NamedTempFile::path),
                footer.as_ref().map(NamedTempFile::path),
            ))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                RenderError::Spawn(self.binary.display().to_string(), error.to_string())
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RenderError::Io("renderer stdin unavailable".into()))?;
        let body = document.body.as_bytes();
        let feed = async move {
            stdin.write_all(body).await?;
            stdin.shutdown().await
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|error| RenderError::Io(error.to_string()))?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        fed.map_err(|error| RenderError::Io(error.to_string()))?;

        tracing::debug!(bytes = output.stdout.len(), "Rendered document");
        Ok(output.stdout)
    }
}

/// Write `html` to a temporary `.html` file, removed when the returned handle
/// drops.
async fn stage_html(html: Option<String>) -> Result<Option<NamedTempFile>, RenderError> {
    let Some(html) = html else {
        return Ok(None);
    };

    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("imprint-")
            .suffix(".html")
            .tempfile()?;
        file.write_all(html.as_bytes())?;
        file.flush()?;
        Ok::<_, std::io::Error>(file)
    })
    .await
    .map_err(|error| RenderError::TempFile(error.to_string()))?
    .map(Some)
    .map_err(|error| RenderError::TempFile(error.to_string()))
}
