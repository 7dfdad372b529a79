//! Service layer between the commands and the library core

pub mod parse_service;
pub mod report_service;

pub use parse_service::{ParseKind, ParseService, is_error};
pub use report_service::{LogFilter, ReportService};
