//! Line-oriented controller.
//!
//! Reads commands, one per line, and turns them into [`TodoAction`]s:
//!
//! ```text
//! add <description>   append a todo
//! toggle <n>          flip todo n (1-based)
//! remove <n>          delete todo n
//! all                 mark every todo complete
//! none                mark every todo incomplete
//! clear               delete completed todos
//! ```
//!
//! Lines that do not parse are logged and skipped.

use crate::types::TodoAction;
use async_stream::stream;
use futures::Stream;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// A line that is not a valid command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The first word is not a known command
    #[error("unknown command `{0}`")]
    Unknown(String),

    /// The command needs an argument
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    /// The position is not a number
    #[error("`{0}` is not a todo position")]
    InvalidPosition(String),
}

/// Parse one command line.
///
/// Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`CommandError`] if the line is not a valid command.
pub fn parse_command(line: &str) -> Result<Option<TodoAction>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (command, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(command, rest)| (command, rest.trim()));

    let action = match command {
        "add" => {
            if rest.is_empty() {
                return Err(CommandError::MissingArgument("add"));
            }
            TodoAction::Add {
                description: rest.to_string(),
            }
        }
        "toggle" => TodoAction::Toggle {
            position: parse_position("toggle", rest)?,
        },
        "remove" => TodoAction::Remove {
            position: parse_position("remove", rest)?,
        },
        "all" => TodoAction::CompleteAll { complete: true },
        "none" => TodoAction::CompleteAll { complete: false },
        "clear" => TodoAction::ClearCompleted,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(action))
}

fn parse_position(command: &'static str, argument: &str) -> Result<usize, CommandError> {
    if argument.is_empty() {
        return Err(CommandError::MissingArgument(command));
    }
    argument
        .parse()
        .map_err(|_| CommandError::InvalidPosition(argument.to_string()))
}

/// Stream of actions read from `input` until it ends.
pub fn actions<R>(input: R) -> impl Stream<Item = TodoAction> + Send
where
    R: AsyncBufRead + Unpin + Send,
{
    stream! {
        let mut lines = input.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Ok(Some(action)) => {
                        tracing::debug!(?action, "Command");
                        yield action;
                    }
                    Ok(None) => {}
                    Err(error) => tracing::warn!(%error, line = %line, "Ignoring command"),
                },
                Ok(None) => break,
                Err(error) => {
                    tracing::error!(%error, "Failed to read commands");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn parses_every_command() {
        assert_eq!(
            parse_command("add  buy milk ").unwrap(),
            Some(TodoAction::Add {
                description: "buy milk".to_string()
            })
        );
        assert_eq!(
            parse_command("toggle 3").unwrap(),
            Some(TodoAction::Toggle { position: 3 })
        );
        assert_eq!(
            parse_command("remove 1").unwrap(),
            Some(TodoAction::Remove { position: 1 })
        );
        assert_eq!(
            parse_command("all").unwrap(),
            Some(TodoAction::CompleteAll { complete: true })
        );
        assert_eq!(
            parse_command("none").unwrap(),
            Some(TodoAction::CompleteAll { complete: false })
        );
        assert_eq!(
            parse_command("clear").unwrap(),
            Some(TodoAction::ClearCompleted)
        );
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn rejects_bad_lines() {
        assert_eq!(
            parse_command("frobnicate"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
        assert_eq!(parse_command("add"), Err(CommandError::MissingArgument("add")));
        assert_eq!(
            parse_command("toggle"),
            Err(CommandError::MissingArgument("toggle"))
        );
        assert_eq!(
            parse_command("remove two"),
            Err(CommandError::InvalidPosition("two".to_string()))
        );
    }

    #[tokio::test]
    async fn stream_skips_bad_lines_and_ends_with_input() {
        let input: &[u8] = b"add a\nbogus\n\ntoggle 1\n";

        let actions: Vec<_> = actions(input).collect().await;

        assert_eq!(
            actions,
            vec![
                TodoAction::Add {
                    description: "a".to_string()
                },
                TodoAction::Toggle { position: 1 },
            ]
        );
    }
}
