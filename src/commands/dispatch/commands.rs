use super::command::{Command, CommandContext};
use crate::cli::Commands;
use crate::commands;
use filerec_core::error::Result;

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let result = match self {
            Commands::Run {
                files,
                ratings,
                groups,
                db,
                owner,
                if_due,
            } => commands::run::execute(
                ctx.cli,
                ctx.config,
                &commands::run::RunArgs {
                    files,
                    ratings,
                    groups: groups.as_deref(),
                    db: db.as_deref(),
                    owner,
                    if_due: *if_due,
                },
            ),
            Commands::Extract { file, media_type } => {
                commands::extract::execute(ctx.cli, ctx.config, file, media_type.as_deref())
            }
            Commands::Keywords { file, files, limit } => commands::keywords::execute(
                ctx.cli,
                ctx.config,
                file,
                files.as_deref(),
                *limit,
            ),
        };
        tracing::debug!(elapsed = ?ctx.start.elapsed(), "execute_command");
        result
    }
}
