use monitor_core::{ArtifactKind, Msg, RunRequest};

use crate::platform::app::UiEvent;

pub const HELP: &str = "\
Commands:
  run <start_row> <end_row> <session>  start an automation run
  login                                open the browser for manual login
  continue                             save the session once logged in and run
  cancel                               dismiss the login prompt
  logs | sessions                      refresh a listing
  download <file>                      save a log file locally
  clear                                clear the console
  reset                                forget the current job
  status                               show the current job
  help                                 show this text
  quit                                 exit";

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Option<UiEvent> {
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let rest: Vec<&str> = words.collect();

    let event = match (command.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("run" | "start", [start, end, session @ ..]) if !session.is_empty() => {
            match (start.parse::<u32>(), end.parse::<u32>()) {
                (Ok(start_row), Ok(end_row)) => UiEvent::Msg(Msg::StartRequested(
                    RunRequest::new(start_row, end_row, session.join(" ")),
                )),
                _ => UiEvent::Invalid("row numbers must be whole numbers".to_string()),
            }
        }
        ("run" | "start", _) => {
            UiEvent::Invalid("usage: run <start_row> <end_row> <session>".to_string())
        }
        ("login", []) => UiEvent::Msg(Msg::ManualLoginRequested),
        ("continue", []) => UiEvent::Msg(Msg::ConfirmSessionRequested),
        ("cancel", []) => UiEvent::Msg(Msg::LoginDismissed),
        ("logs", []) => UiEvent::Msg(Msg::ArtifactsRequested(ArtifactKind::Logs)),
        ("sessions", []) => UiEvent::Msg(Msg::ArtifactsRequested(ArtifactKind::Sessions)),
        ("download", [file]) => UiEvent::Msg(Msg::DownloadRequested((*file).to_string())),
        ("download", _) => UiEvent::Invalid("usage: download <file>".to_string()),
        ("clear", []) => UiEvent::Msg(Msg::ClearConsole),
        ("reset", []) => UiEvent::Msg(Msg::Reset),
        ("status", []) => UiEvent::Status,
        ("help" | "?", []) => UiEvent::Help,
        ("quit" | "exit", []) => UiEvent::Quit,
        _ => UiEvent::Invalid(format!("unknown command: {}", line.trim())),
    };
    Some(event)
}
