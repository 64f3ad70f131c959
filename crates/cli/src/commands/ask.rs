use std::sync::Arc;

use cellarhand_agent::{ChatRuntime, GeminiClient, SubmitOutcome, SubmitRejection};
use cellarhand_core::config::{AppConfig, ChatConfig, LoadOptions};
use cellarhand_sheet::SheetClient;

use super::{block_on, CommandResult};

/// One-shot question from the terminal: fetch, filter, format, complete,
/// print. The same pipeline the server runs, without the server.
pub fn run(question: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("ask", "config", error.to_string(), 2),
    };

    match block_on(async move { ask(&config, question).await }) {
        Ok(Ok(reply)) => CommandResult { exit_code: 0, output: reply },
        Ok(Err(result)) => result,
        Err(message) => CommandResult::failure("ask", "runtime", message, 2),
    }
}

async fn ask(config: &AppConfig, question: &str) -> Result<String, CommandResult> {
    let sheet = SheetClient::new(&config.sheet)
        .map_err(|error| CommandResult::failure("ask", "sheet", error.to_string(), 3))?;
    let snapshot = sheet
        .fetch_inventory()
        .await
        .map_err(|error| CommandResult::failure("ask", "sheet", error.to_string(), 3))?;

    let completion = GeminiClient::new(&config.llm)
        .map_err(|error| CommandResult::failure("ask", "llm", error.to_string(), 3))?;

    // No welcome turn for a one-shot question.
    let chat = ChatConfig {
        max_history_pairs: config.chat.max_history_pairs,
        welcome_message: String::new(),
    };
    let runtime =
        ChatRuntime::new(Arc::new(completion), chat, config.filter.clone(), config.llm.temperature);
    runtime.install_snapshot(snapshot);

    match runtime.submit(question).await {
        SubmitOutcome::Replied { reply } => Ok(reply),
        SubmitOutcome::Rejected(SubmitRejection::EmptyMessage) => {
            Err(CommandResult::failure("ask", "empty_question", "the question was empty", 4))
        }
        SubmitOutcome::Rejected(rejection) => {
            Err(CommandResult::failure("ask", "rejected", rejection.user_message(), 4))
        }
    }
}
