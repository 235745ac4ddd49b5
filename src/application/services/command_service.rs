//! Built-in chat commands

use crate::application::errors::{CommandError, NameError};
use crate::application::messaging::parser::is_word_char;
use crate::domain::entities::{Command, CommandContext, CommandHandler, CommandOutcome, CommandRegistry};

/// The commands every server ships with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    SetName,
    UserList,
    Help,
    Exit,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [Builtin::SetName, Builtin::UserList, Builtin::Help, Builtin::Exit];

    pub fn keyword(self) -> &'static str {
        match self {
            Builtin::SetName => "setname",
            Builtin::UserList => "userlist",
            Builtin::Help => "help",
            Builtin::Exit => "exit",
        }
    }

    fn into_command(self) -> Command {
        Command::new(self.keyword(), self)
    }
}

impl CommandHandler for Builtin {
    fn execute(&self, ctx: &CommandContext<'_>, arg: Option<&str>) -> Result<CommandOutcome, CommandError> {
        match self {
            Builtin::SetName => set_name(ctx, arg),
            Builtin::UserList => Ok(CommandOutcome::Reply(ctx.hub.renderer().notice(&ctx.hub.userlist_text()))),
            Builtin::Help => {
                let keywords = ctx.hub.commands().keywords().join(", ");
                Ok(CommandOutcome::Reply(
                    ctx.hub.renderer().notice(&format!("Available commands: [{}]", keywords)),
                ))
            }
            Builtin::Exit => {
                tracing::info!("Client '{}' sends exit command", ctx.user);
                ctx.hub.announce_except(ctx.session, &format!("The user '{}' has exited.", ctx.user));
                Ok(CommandOutcome::Exit {
                    farewell: "Closing the connection.".to_string(),
                })
            }
        }
    }
}

/// Register setname, userlist, help and exit
pub fn register_defaults(registry: &mut CommandRegistry) {
    for builtin in Builtin::ALL {
        registry.register(builtin.into_command());
    }
}

/// Format rules for display names, checked before uniqueness
pub fn validate_name(name: &str, min: usize, max: usize) -> Result<(), NameError> {
    let len = name.chars().count();
    if len > max {
        return Err(NameError::TooLong { max });
    }
    if len < min {
        return Err(NameError::TooShort { min });
    }
    if !name.chars().all(is_word_char) {
        return Err(NameError::InvalidCharacters);
    }
    Ok(())
}

fn set_name(ctx: &CommandContext<'_>, arg: Option<&str>) -> Result<CommandOutcome, CommandError> {
    let settings = ctx.hub.settings();
    let new_name = arg.ok_or(NameError::Missing)?;
    validate_name(new_name, settings.min_name_length, settings.max_name_length)?;

    let old_name = ctx.hub.sessions().rename(ctx.user, new_name)?;
    ctx.hub.announce(&format!(
        "The user '{}' changed their name to '{}'.",
        old_name, new_name
    ));

    Ok(CommandOutcome::Reply("You've successfully changed your name.".to_string()))
}
