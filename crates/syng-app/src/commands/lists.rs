use anyhow::Context;
use serde_json::json;

use super::to_json;
use crate::cli::ListCommand;
use crate::state::AppState;

pub async fn show_lists(state: &AppState) -> anyhow::Result<String> {
    let registered = state
        .store
        .user_list_names()
        .await
        .context("Failed to read the user list registry")?;
    let loaded = state.store.loaded_lists().await;

    to_json(&json!({
        "registered": registered,
        "loaded": loaded,
    }))
}

pub async fn handle_list(state: &AppState, command: ListCommand) -> anyhow::Result<String> {
    let store = &state.store;

    match command {
        ListCommand::Create { name } => {
            let created = store
                .create_user_list(&name)
                .await
                .with_context(|| format!("Failed to create user list {name}"))?;
            tracing::info!("Created list {created}");

            to_json(&json!({ "created": created }))
        }
        ListCommand::Remove { name } => {
            store
                .remove_user_list(&name)
                .await
                .with_context(|| format!("Failed to remove user list {name}"))?;

            to_json(&json!({ "removed": name }))
        }
        ListCommand::Show { name } => {
            let entries = store
                .user_list_content(&name)
                .await
                .with_context(|| format!("Failed to read user list {name}"))?;

            to_json(&entries)
        }
        ListCommand::Add { name, word } => {
            let entry = store
                .add_to_user_list(&name, word.into())
                .await
                .with_context(|| format!("Failed to add word to {name}"))?;

            to_json(&entry)
        }
        ListCommand::Drop { name, id } => {
            let removed = store
                .remove_from_user_list(&name, id)
                .await
                .with_context(|| format!("Failed to remove entry {id} from {name}"))?;

            to_json(&json!({ "removed": removed }))
        }
    }
}
