//! Artifact parsers
//!
//! Each parser turns the text of one kind of project file into a
//! serializable summary. Repository introspection never looks inside these
//! summaries; the service layer only locates files and collects results.

use crate::error::{Result as SnapResult, SnapshotError};
use serde::Serialize;
use std::path::Path;

pub mod html;
pub mod java;
pub mod markdown;
pub mod pom;

pub use html::{HtmlDocument, HtmlParser};
pub use java::{ClassStructure, JavaParser};
pub use markdown::{MarkdownContent, MarkdownParser};
pub use pom::{PomParser, PomStructure};

/// A parser for one kind of project artifact
pub trait ArtifactParser {
    type Output: Serialize;

    /// Short name used in result keys and output file names
    const KIND: &'static str;

    /// Whether `path` is an artifact this parser handles
    fn matches(path: &Path) -> bool;

    /// Parse the decoded content of one file
    fn parse(file_name: &str, content: &str) -> SnapResult<Self::Output>;

    /// Read and parse a file
    ///
    /// Content that is not valid UTF-8 is decoded lossily. Parse failures
    /// are reported against the file's path.
    fn parse_file(path: &Path) -> SnapResult<Self::Output> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::parse(&file_name, &content).map_err(|e| match e {
            SnapshotError::InvalidArtifact { reason, .. } => SnapshotError::InvalidArtifact {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }
}

/// Lower-cased file name of `path`
pub(crate) fn lower_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
