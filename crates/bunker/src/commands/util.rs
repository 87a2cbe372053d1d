//! Shared helpers for command handlers.

use std::io::IsTerminal;

use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Parse a `--data` argument: inline JSON, or `@path` to a JSON file.
pub fn read_data<T: DeserializeOwned>(arg: &str) -> Result<T, CliError> {
    let contents = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => arg.to_owned(),
    };
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "data".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, `--yes` is required.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}
