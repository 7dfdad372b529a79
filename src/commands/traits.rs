use crate::config::SnapshotConfig;
use crate::error::Result as SnapResult;
use crate::services::{LogFilter, ParseKind, ParseService, ReportService};
use std::path::PathBuf;

/// Common command interface
pub trait Command {
    type Args;
    type Output;

    /// Execute the command
    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output>;

    /// Validate command arguments
    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        // No validation by default
        let _ = args;
        Ok(())
    }
}

/// Shared resources handed to every command
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: SnapshotConfig,
    pub parse_service: ParseService,
    pub report_service: ReportService,
}

impl CommandContext {
    pub fn new(config: SnapshotConfig) -> Self {
        CommandContext {
            parse_service: ParseService::new(config.clone()),
            report_service: ReportService::new(),
            config,
        }
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new(SnapshotConfig::default())
    }
}

// Command arguments

/// Parse command arguments
#[derive(Debug, Clone)]
pub struct ParseArgs {
    pub kind: ParseKind,
    pub dir: PathBuf,
}

/// Repos command arguments
#[derive(Debug, Clone)]
pub struct ReposArgs {
    pub dir: PathBuf,
}

/// Log command arguments
#[derive(Debug, Clone)]
pub struct LogArgs {
    pub dir: PathBuf,
    pub filter: LogFilter,
}

/// Show command arguments
#[derive(Debug, Clone)]
pub struct ShowArgs {
    pub dir: PathBuf,
    pub rev: String,
}

/// Diff command arguments
#[derive(Debug, Clone)]
pub struct DiffArgs {
    pub dir: PathBuf,
    pub old: String,
    pub new: String,
}

/// Heatmap command arguments
#[derive(Debug, Clone)]
pub struct HeatmapArgs {
    pub dir: PathBuf,
    pub year: i32,
}

/// Active command arguments
#[derive(Debug, Clone)]
pub struct ActiveArgs {
    pub dir: PathBuf,
    pub limit: usize,
}

/// Blame command arguments
#[derive(Debug, Clone)]
pub struct BlameArgs {
    pub dir: PathBuf,
    pub path: String,
}
