use crate::commands::traits::{ActiveArgs, Command, CommandContext};
use crate::error::{Result as SnapResult, SnapshotError};

/// Active command implementation
pub struct ActiveCommand {
    context: CommandContext,
}

impl ActiveCommand {
    pub fn new(context: CommandContext) -> Self {
        ActiveCommand { context }
    }
}

impl Command for ActiveCommand {
    type Args = ActiveArgs;
    type Output = ();

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context
            .report_service
            .most_active_files(&args.dir, args.limit)
    }

    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        if args.limit == 0 {
            return Err(SnapshotError::InvalidArgument(
                "number of files must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
