use crate::commands::traits::{Command, CommandContext, HeatmapArgs};
use crate::error::{Result as SnapResult, SnapshotError};

/// Heatmap command implementation
pub struct HeatmapCommand {
    context: CommandContext,
}

impl HeatmapCommand {
    pub fn new(context: CommandContext) -> Self {
        HeatmapCommand { context }
    }
}

impl Command for HeatmapCommand {
    type Args = HeatmapArgs;
    type Output = ();

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        self.context.report_service.heat_map(&args.dir, args.year)
    }

    fn validate_args(&self, args: &Self::Args) -> SnapResult<()> {
        if !(1..=9999).contains(&args.year) {
            return Err(SnapshotError::InvalidArgument(format!(
                "year {} is out of range",
                args.year
            )));
        }
        Ok(())
    }
}
