use crate::commands::traits::{Command, CommandContext, ReposArgs};
use crate::error::Result as SnapResult;

/// Repos command implementation
pub struct ReposCommand {
    context: CommandContext,
}

impl ReposCommand {
    pub fn new(context: CommandContext) -> Self {
        ReposCommand { context }
    }
}

impl Command for ReposCommand {
    type Args = ReposArgs;
    type Output = Vec<String>;

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context.report_service.repositories(&args.dir)
    }
}
