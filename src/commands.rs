//! Line-oriented command surface for the terminal host
//!
//! Each command maps onto one controller operation or a host pass-through.

use std::str::FromStr;
use std::sync::Arc;

use crate::refresh::controller::RefreshController;
use crate::settings::SettingsStore;

pub const HELP_TEXT: &str = "Commands:
  refresh            Fetch quota usage now
  details            Show quota details
  set-token <token>  Store a new API token
  remove-token       Forget the stored API token
  settings           Show the settings file and current values
  reload             Re-read the settings file
  help               Show this help
  quit               Exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RefreshNow,
    ShowDetails,
    SetToken(String),
    RemoveToken,
    OpenSettings,
    ReloadSettings,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match name {
            "refresh" | "r" => Ok(Command::RefreshNow),
            "details" | "d" => Ok(Command::ShowDetails),
            // Validation happens in the controller so blank input gets the same message
            "set-token" => Ok(Command::SetToken(arg.to_string())),
            "remove-token" => Ok(Command::RemoveToken),
            "settings" => Ok(Command::OpenSettings),
            "reload" => Ok(Command::ReloadSettings),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err("Empty command. Type `help` for a list of commands.".to_string()),
            other => Err(format!("Unknown command: {other}. Type `help` for a list of commands.")),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep running, optionally printing a message
    Continue(Option<String>),
    Quit,
}

/// Execute a command against the controller
pub async fn dispatch(
    command: Command,
    controller: &Arc<RefreshController>,
    settings: &SettingsStore,
) -> CommandOutcome {
    log::debug!("Dispatching command {command:?}");
    let message = match command {
        Command::RefreshNow => {
            controller.refresh().await;
            None
        }
        Command::ShowDetails => Some(controller.show_details()),
        Command::SetToken(token) => match controller.set_credential(&token).await {
            Ok(()) => Some("API token saved.".to_string()),
            Err(e) => Some(e.to_string()),
        },
        Command::RemoveToken => match controller.remove_credential() {
            Ok(()) => Some("API token removed.".to_string()),
            Err(e) => Some(e.to_string()),
        },
        Command::OpenSettings => match toml::to_string(&settings.current()) {
            Ok(current) => Some(format!(
                "Settings file: {}\n{}",
                settings.path().display(),
                current.trim_end()
            )),
            Err(e) => Some(format!("Failed to render settings: {e}")),
        },
        Command::ReloadSettings => match settings.reload() {
            Ok(_) => {
                controller.on_configuration_changed().await;
                Some("Settings reloaded.".to_string())
            }
            Err(e) => {
                log::error!("{e}");
                Some(e.to_string())
            }
        },
        Command::Help => Some(HELP_TEXT.to_string()),
        Command::Quit => return CommandOutcome::Quit,
    };

    CommandOutcome::Continue(message)
}
