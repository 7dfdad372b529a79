//! Project snapshot library
//!
//! Reads a Git repository's history into a [`RepositorySnapshot`] and
//! summarizes the Java, Maven, HTML and Markdown artifacts around it.

pub mod commands;
pub mod config;
pub mod error;
pub mod files;
pub mod git_ops;
pub mod i18n;
pub mod parsers;
pub mod services;

pub use commands::CommandContext;
pub use config::SnapshotConfig;
pub use error::{Result, SnapshotError};
pub use git_ops::{GitOperations, RepositorySnapshot, parse_repository};
pub use services::{ParseKind, ParseService, ReportService};
