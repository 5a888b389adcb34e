use anyhow::Context;
use serde_json::json;

use super::to_json;
use crate::cli::BookmarkCommand;
use crate::state::AppState;

pub async fn handle_bookmarks(state: &AppState, command: BookmarkCommand) -> anyhow::Result<String> {
    let store = &state.store;

    match command {
        BookmarkCommand::Show => {
            let bookmarks = store.bookmarks().await.context("Failed to read bookmarks")?;
            to_json(&bookmarks)
        }
        BookmarkCommand::Add { word } => {
            let entry = store
                .add_to_bookmarks(word.into())
                .await
                .context("Failed to add word to bookmarks")?;
            to_json(&entry)
        }
        BookmarkCommand::Remove { id } => {
            let removed = store
                .remove_from_bookmarks(id)
                .await
                .with_context(|| format!("Failed to remove bookmark {id}"))?;
            to_json(&json!({ "removed": removed }))
        }
        BookmarkCommand::Clear => {
            let removed = store.clear_bookmarks().await.context("Failed to clear bookmarks")?;
            to_json(&json!({ "removed": removed }))
        }
    }
}
