use std::time::Duration;

use cellarhand_core::config::SheetConfig;
use cellarhand_core::{InventoryRecord, InventorySnapshot};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("inventory export request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("inventory export returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("inventory export payload was not a record list")]
    MalformedPayload,
}

impl SheetError {
    /// Warning shown to staff when a refresh fails. The underlying cause goes
    /// to the logs, not to the bar.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Request(_) | Self::Status(_) => {
                "Could not load inventory. Check the LIVE sheet is public and reachable."
            }
            Self::MalformedPayload => {
                "Inventory loaded but could not be read. Check the LIVE tab export."
            }
        }
    }
}

/// HTTP client for the published cellar sheet.
#[derive(Clone, Debug)]
pub struct SheetClient {
    http: reqwest::Client,
    export_url: String,
}

impl SheetClient {
    pub fn new(config: &SheetConfig) -> Result<Self, SheetError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, export_url: config.export_url.clone() })
    }

    /// Fetches the export and captures it as a fresh snapshot. Failures are
    /// returned to the caller, which keeps serving the previous snapshot (or
    /// none) until an explicit retry.
    pub async fn fetch_inventory(&self) -> Result<InventorySnapshot, SheetError> {
        let response = self.http.get(&self.export_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::Status(status));
        }

        let payload: Value = response.json().await?;
        let records = unwrap_records(payload)?;

        if let Some(first) = records.first() {
            let keys: Vec<&str> = first.field_names().collect();
            debug!(
                event_name = "sheet.fetch.ok",
                record_count = records.len(),
                first_record_keys = ?keys,
                "inventory export fetched"
            );
        } else {
            warn!(
                event_name = "sheet.fetch.empty",
                "inventory export fetched but contains no records"
            );
        }

        Ok(InventorySnapshot::new(records))
    }
}

/// Accepts either a bare JSON array or the common Apps Script wrappers.
/// Non-object rows are dropped; the sheet occasionally emits stray scalars
/// from blank lines.
fn unwrap_records(payload: Value) -> Result<Vec<InventoryRecord>, SheetError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(mut wrapper) => ["data", "items", "rows", "content"]
            .iter()
            .find_map(|key| match wrapper.remove(*key) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .ok_or(SheetError::MalformedPayload)?,
        _ => return Err(SheetError::MalformedPayload),
    };

    Ok(rows.into_iter().filter_map(InventoryRecord::from_value).collect())
}
