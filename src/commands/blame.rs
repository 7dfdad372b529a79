use crate::commands::traits::{BlameArgs, Command, CommandContext};
use crate::error::{Result as SnapResult, SnapshotError};

/// Blame command implementation
pub struct BlameCommand {
    context: CommandContext,
}

impl BlameCommand {
    pub fn new(context: CommandContext) -> Self {
        BlameCommand { context }
    }
}

impl Command for BlameCommand {
    type Args = BlameArgs;
    type Output = ();

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context.report_service.blame(&args.dir, &args.path)
    }

    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        if args.path.trim().is_empty() {
            return Err(SnapshotError::InvalidArgument(
                "file path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
