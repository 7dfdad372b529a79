use crate::commands::traits::{Command, CommandContext, LogArgs};
use crate::error::{Result as SnapResult, SnapshotError};

/// Log command implementation
pub struct LogCommand {
    context: CommandContext,
}

impl LogCommand {
    pub fn new(context: CommandContext) -> Self {
        LogCommand { context }
    }
}

impl Command for LogCommand {
    type Args = LogArgs;
    type Output = ();

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context.report_service.log(&args.dir, &args.filter)
    }

    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        if args.filter.max_count == 0 {
            return Err(SnapshotError::InvalidArgument(
                "number of commits must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
