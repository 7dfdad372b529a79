use crate::commands::traits::{Command, CommandContext, ShowArgs};
use crate::error::{Result as SnapResult, SnapshotError};

/// Show command implementation
pub struct ShowCommand {
    context: CommandContext,
}

impl ShowCommand {
    pub fn new(context: CommandContext) -> Self {
        ShowCommand { context }
    }
}

impl Command for ShowCommand {
    type Args = ShowArgs;
    type Output = ();

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context.report_service.show(&args.dir, &args.rev)
    }

    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        if args.rev.trim().is_empty() {
            return Err(SnapshotError::InvalidArgument(
                "revision must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
