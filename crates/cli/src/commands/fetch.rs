use cellarhand_core::config::{AppConfig, LoadOptions};
use cellarhand_core::format_context;
use cellarhand_sheet::SheetClient;
use serde_json::Value;

use super::{block_on, CommandResult};

const DEFAULT_LIMIT: usize = 20;

/// Fetches the live export and prints records exactly as the completion model
/// sees them, which makes sheet formatting problems visible from a terminal.
pub fn run(limit: Option<usize>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("fetch", "config", error.to_string(), 2),
    };

    let fetched = match block_on(async move {
        let client = SheetClient::new(&config.sheet).map_err(|error| error.to_string())?;
        client.fetch_inventory().await.map_err(|error| error.to_string())
    }) {
        Ok(fetched) => fetched,
        Err(message) => return CommandResult::failure("fetch", "runtime", message, 2),
    };

    let snapshot = match fetched {
        Ok(snapshot) => snapshot,
        Err(message) => return CommandResult::failure("fetch", "sheet", message, 3),
    };

    let shown = limit.unwrap_or(DEFAULT_LIMIT).min(snapshot.len());
    let context = format_context(&snapshot.records()[..shown]);

    let pretty = serde_json::from_str::<Value>(&context)
        .and_then(|rows| serde_json::to_string_pretty(&rows))
        .unwrap_or(context);

    CommandResult {
        exit_code: 0,
        output: format!(
            "{pretty}\n{} of {} records shown (fetched at {})",
            shown,
            snapshot.len(),
            snapshot.fetched_at().to_rfc3339()
        ),
    }
}
