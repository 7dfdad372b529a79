pub mod traits;

// Command modules
pub mod active;
pub mod blame;
pub mod diff;
pub mod heatmap;
pub mod log;
pub mod parse;
pub mod repos;
pub mod show;

// Re-export main types
pub use active::ActiveCommand;
pub use blame::BlameCommand;
pub use diff::DiffCommand;
pub use heatmap::HeatmapCommand;
pub use log::LogCommand;
pub use parse::ParseCommand;
pub use repos::ReposCommand;
pub use show::ShowCommand;
pub use traits::{Command, CommandContext};
