use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::relevance::FilterConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub sheet: SheetConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub filter: FilterConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct SheetConfig {
    /// JSON export endpoint of the live cellar sheet.
    pub export_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// Absent key is a runtime degradation, not a startup failure: submissions
    /// resolve to the fixed apology while staff fix the deployment.
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// History suffix sent with each completion, in user/assistant pairs.
    pub max_history_pairs: usize,
    pub welcome_message: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub sheet_export_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub log_level: Option<String>,
    pub server_bind_address: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_WELCOME: &str = "Welcome to the cellar. I am your wine assistant, \
connected directly to our live inventory. How can I help you assist our guests today?";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet: SheetConfig { export_url: String::new(), timeout_secs: 15 },
            llm: LlmConfig {
                api_key: None,
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                temperature: 0.1,
                timeout_secs: 30,
                max_retries: 2,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            chat: ChatConfig {
                max_history_pairs: 6,
                welcome_message: DEFAULT_WELCOME.to_string(),
            },
            filter: FilterConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("cellarhand.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(sheet) = patch.sheet {
            if let Some(export_url) = sheet.export_url {
                self.sheet.export_url = export_url;
            }
            if let Some(timeout_secs) = sheet.timeout_secs {
                self.sheet.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(chat) = patch.chat {
            if let Some(max_history_pairs) = chat.max_history_pairs {
                self.chat.max_history_pairs = max_history_pairs;
            }
            if let Some(welcome_message) = chat.welcome_message {
                self.chat.welcome_message = welcome_message;
            }
        }

        if let Some(filter) = patch.filter {
            if let Some(min_token_len) = filter.min_token_len {
                self.filter.min_token_len = min_token_len;
            }
            if let Some(max_tokens) = filter.max_tokens {
                self.filter.max_tokens = max_tokens;
            }
            if let Some(substring_score) = filter.substring_score {
                self.filter.substring_score = substring_score;
            }
            if let Some(grape_boost) = filter.grape_boost {
                self.filter.grape_boost = grape_boost;
            }
            if let Some(glass_boost) = filter.glass_boost {
                self.filter.glass_boost = glass_boost;
            }
            if let Some(match_cap) = filter.match_cap {
                self.filter.match_cap = match_cap;
            }
            if let Some(fallback_cap) = filter.fallback_cap {
                self.filter.fallback_cap = fallback_cap;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CELLARHAND_SHEET_EXPORT_URL") {
            self.sheet.export_url = value;
        }
        if let Some(value) = read_env("CELLARHAND_SHEET_TIMEOUT_SECS") {
            self.sheet.timeout_secs = parse_u64("CELLARHAND_SHEET_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CELLARHAND_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("CELLARHAND_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("CELLARHAND_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("CELLARHAND_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("CELLARHAND_LLM_TEMPERATURE", &value)?;
        }
        if let Some(value) = read_env("CELLARHAND_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("CELLARHAND_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CELLARHAND_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("CELLARHAND_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("CELLARHAND_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CELLARHAND_SERVER_PORT") {
            self.server.port = parse_u16("CELLARHAND_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CELLARHAND_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CELLARHAND_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("CELLARHAND_CHAT_MAX_HISTORY_PAIRS") {
            self.chat.max_history_pairs = parse_usize("CELLARHAND_CHAT_MAX_HISTORY_PAIRS", &value)?;
        }

        let log_level =
            read_env("CELLARHAND_LOGGING_LEVEL").or_else(|| read_env("CELLARHAND_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CELLARHAND_LOGGING_FORMAT").or_else(|| read_env("CELLARHAND_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(sheet_export_url) = overrides.sheet_export_url {
            self.sheet.export_url = sheet_export_url;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(server_bind_address) = overrides.server_bind_address {
            self.server.bind_address = server_bind_address;
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sheet(&self.sheet)?;
        validate_llm(&self.llm)?;
        validate_server(&self.server)?;
        validate_chat(&self.chat)?;
        validate_filter(&self.filter)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("cellarhand.toml"), PathBuf::from("config/cellarhand.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_sheet(sheet: &SheetConfig) -> Result<(), ConfigError> {
    let url = sheet.export_url.trim();
    if url.is_empty() {
        return Err(ConfigError::Validation(
            "sheet.export_url is required (the published JSON export of the cellar sheet)"
                .to_string(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "sheet.export_url must start with http:// or https://".to_string(),
        ));
    }

    if sheet.timeout_secs == 0 || sheet.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "sheet.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.base_url.trim().is_empty()
        || (!llm.base_url.starts_with("http://") && !llm.base_url.starts_with("https://"))
    {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation("llm.timeout_secs must be in range 1..=300".to_string()));
    }

    if let Some(api_key) = &llm.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.api_key must not be empty when set (unset it to run degraded)".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_chat(chat: &ChatConfig) -> Result<(), ConfigError> {
    if chat.max_history_pairs == 0 || chat.max_history_pairs > 50 {
        return Err(ConfigError::Validation(
            "chat.max_history_pairs must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_filter(filter: &FilterConfig) -> Result<(), ConfigError> {
    if filter.min_token_len == 0 {
        return Err(ConfigError::Validation(
            "filter.min_token_len must be greater than zero".to_string(),
        ));
    }
    if filter.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "filter.max_tokens must be greater than zero".to_string(),
        ));
    }
    if filter.match_cap == 0 || filter.fallback_cap == 0 {
        return Err(ConfigError::Validation(
            "filter.match_cap and filter.fallback_cap must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    sheet: Option<SheetPatch>,
    llm: Option<LlmPatch>,
    server: Option<ServerPatch>,
    chat: Option<ChatPatch>,
    filter: Option<FilterPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetPatch {
    export_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatPatch {
    max_history_pairs: Option<usize>,
    welcome_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FilterPatch {
    min_token_len: Option<usize>,
    max_tokens: Option<usize>,
    substring_score: Option<u32>,
    grape_boost: Option<u32>,
    glass_boost: Option<u32>,
    match_cap: Option<usize>,
    fallback_cap: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_SHEET_EXPORT_URL", "https://sheet.example/export");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cellarhand.toml");
            fs::write(
                &path,
                r#"
[sheet]
export_url = "${TEST_SHEET_EXPORT_URL}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.sheet.export_url == "https://sheet.example/export",
                "export url should be loaded from environment",
            )
        })();

        clear_vars(&["TEST_SHEET_EXPORT_URL"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CELLARHAND_SHEET_EXPORT_URL", "https://from-env.example/export");
        env::set_var("CELLARHAND_LLM_MODEL", "gemini-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cellarhand.toml");
            fs::write(
                &path,
                r#"
[sheet]
export_url = "https://from-file.example/export"

[llm]
model = "gemini-from-file"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    llm_model: Some("gemini-from-override".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.sheet.export_url == "https://from-env.example/export",
                "env export url should win over file and defaults",
            )?;
            ensure(
                config.llm.model == "gemini-from-override",
                "override model should win over env and file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            Ok(())
        })();

        clear_vars(&["CELLARHAND_SHEET_EXPORT_URL", "CELLARHAND_LLM_MODEL"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CELLARHAND_SHEET_EXPORT_URL", "https://sheet.example/export");
        env::set_var("CELLARHAND_LOG_LEVEL", "warn");
        env::set_var("CELLARHAND_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warn log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&[
            "CELLARHAND_SHEET_EXPORT_URL",
            "CELLARHAND_LOG_LEVEL",
            "CELLARHAND_LOG_FORMAT",
        ]);
        result
    }

    #[test]
    fn filter_heuristics_are_tunable_from_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CELLARHAND_SHEET_EXPORT_URL", "https://sheet.example/export");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("cellarhand.toml");
            fs::write(
                &path,
                r#"
[filter]
match_cap = 25
glass_boost = 9
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.filter.match_cap == 25, "match cap should come from the file")?;
            ensure(config.filter.glass_boost == 9, "glass boost should come from the file")?;
            ensure(config.filter.fallback_cap == 60, "untouched fields keep their defaults")?;
            Ok(())
        })();

        clear_vars(&["CELLARHAND_SHEET_EXPORT_URL"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CELLARHAND_SHEET_EXPORT_URL", "not-a-url");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("sheet.export_url")
            );
            ensure(has_message, "validation failure should mention sheet.export_url")
        })();

        clear_vars(&["CELLARHAND_SHEET_EXPORT_URL"]);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CELLARHAND_SHEET_EXPORT_URL", "https://sheet.example/export");
        env::set_var("CELLARHAND_LLM_API_KEY", "AIza-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("AIza-secret-value"), "debug output should not contain the key")?;
            ensure(
                config
                    .llm
                    .api_key
                    .as_ref()
                    .map(|key| key.expose_secret() == "AIza-secret-value")
                    .unwrap_or(false),
                "key should still be readable through expose_secret",
            )
        })();

        clear_vars(&["CELLARHAND_SHEET_EXPORT_URL", "CELLARHAND_LLM_API_KEY"]);
        result
    }
}
