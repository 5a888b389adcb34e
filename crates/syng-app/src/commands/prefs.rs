use anyhow::Context;
use serde_json::{Value, json};

use super::to_json;
use crate::cli::PrefsCommand;
use crate::state::AppState;

pub async fn handle_prefs(state: &AppState, command: PrefsCommand) -> anyhow::Result<String> {
    let mut prefs = state
        .preferences()
        .await
        .context("There was an error loading user preferences")?;

    match command {
        PrefsCommand::Show => to_json(prefs.entries()),
        PrefsCommand::Get { property } => to_json(prefs.get(&property)?),
        PrefsCommand::Set { property, value } => {
            let value = parse_value(&value);
            let requires_restart = prefs
                .set(&property, value.clone())
                .await
                .with_context(|| format!("Cannot save preference {property}"))?;

            if requires_restart {
                tracing::warn!("You must restart Syng for the {property} change to take effect");
            }

            to_json(&json!({
                "property": property,
                "value": value,
                "requiresRestart": requires_restart,
            }))
        }
    }
}

/// `18` and `true` become JSON values, bare words stay strings
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
