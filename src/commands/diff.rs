use crate::commands::traits::{Command, CommandContext, DiffArgs};
use crate::error::{Result as SnapResult, SnapshotError};

/// Diff command implementation
pub struct DiffCommand {
    context: CommandContext,
}

impl DiffCommand {
    pub fn new(context: CommandContext) -> Self {
        DiffCommand { context }
    }
}

impl Command for DiffCommand {
    type Args = DiffArgs;
    type Output = ();

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context
            .report_service
            .diff(&args.dir, &args.old, &args.new)
    }

    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        if args.old.trim().is_empty() || args.new.trim().is_empty() {
            return Err(SnapshotError::InvalidArgument(
                "both revisions are required".to_string(),
            ));
        }
        Ok(())
    }
}
