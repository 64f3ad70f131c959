use std::sync::Arc;

use cellarhand_agent::{ChatRuntime, CompletionError, GeminiClient};
use cellarhand_core::config::{AppConfig, ConfigError, LoadOptions};
use cellarhand_sheet::{SheetClient, SheetError};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<ChatRuntime>,
    pub sheet: Arc<SheetClient>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("sheet client initialization failed: {0}")]
    SheetClient(#[source] SheetError),
    #[error("completion client initialization failed: {0}")]
    CompletionClient(#[source] CompletionError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let sheet = Arc::new(SheetClient::new(&config.sheet).map_err(BootstrapError::SheetClient)?);
    let completion = GeminiClient::new(&config.llm).map_err(BootstrapError::CompletionClient)?;

    if config.llm.api_key.is_none() {
        warn!(
            event_name = "system.bootstrap.missing_api_key",
            "no completion api key configured; submissions will degrade to the apology message"
        );
    }

    let runtime = Arc::new(ChatRuntime::new(
        Arc::new(completion),
        config.chat.clone(),
        config.filter.clone(),
        config.llm.temperature,
    ));

    // First fetch is best-effort: staff can refresh from the UI once the sheet
    // is reachable, and submissions stay disabled until then.
    match sheet.fetch_inventory().await {
        Ok(snapshot) => {
            info!(
                event_name = "system.bootstrap.inventory_loaded",
                record_count = snapshot.len(),
                "initial inventory snapshot installed"
            );
            runtime.install_snapshot(snapshot);
        }
        Err(error) => {
            warn!(
                event_name = "system.bootstrap.inventory_unavailable",
                error = %error,
                "starting without an inventory snapshot"
            );
        }
    }

    Ok(Application { config, runtime, sheet })
}
