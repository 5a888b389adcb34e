use anyhow::Context;
use serde::Serialize;
use syng_types::ListTarget;

use crate::cli::Command;
use crate::state::AppState;

pub mod bookmarks;
pub mod lists;
pub mod prefs;

use bookmarks::handle_bookmarks;
use lists::{handle_list, show_lists};
use prefs::handle_prefs;

/// Run one command and return its JSON output
pub async fn run(state: &AppState, command: Command) -> anyhow::Result<String> {
    tracing::debug!("Running {:?}", command);

    match command {
        Command::Lists => show_lists(state).await,
        Command::List(command) => handle_list(state, command).await,
        Command::Bookmarks(command) => handle_bookmarks(state, command).await,
        Command::Notes { target, id, notes } => {
            let target = ListTarget::parse(&target)?;
            let updated = state
                .store
                .update_notes(&target, id, &notes)
                .await
                .with_context(|| format!("Failed to update notes of {id} in {target}"))?;

            to_json(&serde_json::json!({ "updated": updated }))
        }
        Command::Prefs(command) => handle_prefs(state, command).await,
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("Failed to format output")
}
