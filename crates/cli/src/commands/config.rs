use cellarhand_core::config::{AppConfig, LoadOptions, LogFormat};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigView {
    sheet: SheetView,
    llm: LlmView,
    server: ServerView,
    chat: ChatView,
    filter: FilterView,
    logging: LoggingView,
}

#[derive(Debug, Serialize)]
struct SheetView {
    export_url: String,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct LlmView {
    api_key: &'static str,
    base_url: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ServerView {
    bind_address: String,
    port: u16,
    graceful_shutdown_secs: u64,
}

#[derive(Debug, Serialize)]
struct ChatView {
    max_history_pairs: usize,
    welcome_message: String,
}

#[derive(Debug, Serialize)]
struct FilterView {
    min_token_len: usize,
    max_tokens: usize,
    substring_score: u32,
    grape_boost: u32,
    glass_boost: u32,
    match_cap: usize,
    fallback_cap: usize,
}

#[derive(Debug, Serialize)]
struct LoggingView {
    level: String,
    format: &'static str,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("configuration failed to load: {error}"),
    };

    let view = view(&config);
    serde_json::to_string_pretty(&view)
        .unwrap_or_else(|error| format!("configuration failed to serialize: {error}"))
}

fn view(config: &AppConfig) -> ConfigView {
    ConfigView {
        sheet: SheetView {
            export_url: config.sheet.export_url.clone(),
            timeout_secs: config.sheet.timeout_secs,
        },
        llm: LlmView {
            api_key: if config.llm.api_key.is_some() { "(redacted)" } else { "(unset)" },
            base_url: config.llm.base_url.clone(),
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            timeout_secs: config.llm.timeout_secs,
            max_retries: config.llm.max_retries,
        },
        server: ServerView {
            bind_address: config.server.bind_address.clone(),
            port: config.server.port,
            graceful_shutdown_secs: config.server.graceful_shutdown_secs,
        },
        chat: ChatView {
            max_history_pairs: config.chat.max_history_pairs,
            welcome_message: config.chat.welcome_message.clone(),
        },
        filter: FilterView {
            min_token_len: config.filter.min_token_len,
            max_tokens: config.filter.max_tokens,
            substring_score: config.filter.substring_score,
            grape_boost: config.filter.grape_boost,
            glass_boost: config.filter.glass_boost,
            match_cap: config.filter.match_cap,
            fallback_cap: config.filter.fallback_cap,
        },
        logging: LoggingView {
            level: config.logging.level.clone(),
            format: match config.logging.format {
                LogFormat::Compact => "compact",
                LogFormat::Pretty => "pretty",
                LogFormat::Json => "json",
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use cellarhand_core::config::AppConfig;

    use super::view;

    #[test]
    fn api_key_is_redacted_in_the_view() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("AIza-very-secret".to_string().into());

        let rendered = serde_json::to_string(&view(&config)).expect("view should serialize");

        assert!(!rendered.contains("AIza-very-secret"));
        assert!(rendered.contains("(redacted)"));
    }

    #[test]
    fn unset_api_key_is_reported() {
        let config = AppConfig::default();
        let rendered = serde_json::to_string(&view(&config)).expect("view should serialize");
        assert!(rendered.contains("(unset)"));
    }
}
