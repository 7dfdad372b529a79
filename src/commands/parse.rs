use crate::commands::traits::{Command, CommandContext, ParseArgs};
use crate::error::Result as SnapResult;
use console::{Color, style};
use serde_json::Value;

/// Parse command: runs one parser over a directory and prints the JSON result
pub struct ParseCommand {
    context: CommandContext,
}

impl ParseCommand {
    pub fn new(context: CommandContext) -> Self {
        ParseCommand { context }
    }
}

impl Command for ParseCommand {
    type Args = ParseArgs;
    type Output = Value;

    fn execute(&self, args: Self::Args) -> SnapResult<Self::Output> {
        let service = &self.context.parse_service;
        let result = service.run(args.kind, &args.dir);

        println!("{}", serde_json::to_string_pretty(&result)?);

        if self.context.config.save_results {
            let path = service.save(args.kind, &result)?;
            eprintln!(
                "{} {}",
                style("💾 Saved to").fg(Color::Green),
                style(path.display()).fg(Color::Cyan)
            );
        }

        Ok(result)
    }
}
