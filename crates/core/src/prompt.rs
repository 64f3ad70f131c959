use serde::Serialize;

use crate::inventory::InventoryRecord;
use crate::numeric::parse_locale_number;

/// One row of the context payload. The completion model is instructed against
/// these exact key names, so the shape is part of the external contract: raw
/// `Price`/`Stock` strings stay verbatim and the `_p`/`_s` helpers carry the
/// coerced numbers (`null` when unparseable).
#[derive(Debug, Serialize)]
struct ContextRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Winemaker")]
    winemaker: String,
    #[serde(rename = "Shelf")]
    shelf: String,
    #[serde(rename = "Colour")]
    colour: String,
    #[serde(rename = "Grapes")]
    grapes: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Vintage")]
    vintage: String,
    #[serde(rename = "Price")]
    price: String,
    #[serde(rename = "Glass")]
    glass: String,
    #[serde(rename = "Stock")]
    stock: String,
    #[serde(rename = "Notes")]
    notes: String,
    #[serde(rename = "_p")]
    price_value: Option<f64>,
    #[serde(rename = "_s")]
    stock_value: Option<f64>,
}

const ABSENT: &str = "(empty)";
const UNNAMED: &str = "(unnamed)";

fn row(record: &InventoryRecord) -> ContextRow {
    let price_raw = record.lookup("Price");
    let stock_raw = record.lookup("Stock");
    let price_value = parse_locale_number(&price_raw);
    let stock_value = parse_locale_number(&stock_raw);

    let name = record.lookup("Name");

    ContextRow {
        name: if name.is_empty() { UNNAMED.to_string() } else { name },
        winemaker: record.lookup("Winemaker"),
        shelf: record.lookup("Shelf"),
        colour: record.lookup("Colour"),
        grapes: record.lookup("Grapes"),
        region: record.lookup("Region"),
        country: record.lookup("Country"),
        vintage: record.lookup("Vintage"),
        price: if price_raw.is_empty() { ABSENT.to_string() } else { price_raw },
        glass: record.lookup("Glass"),
        stock: if stock_raw.is_empty() { ABSENT.to_string() } else { stock_raw },
        notes: record.lookup("Notes"),
        price_value,
        stock_value,
    }
}

/// Serializes the selected records into the compact JSON context embedded in
/// the completion request. Compact on purpose: every byte here competes with
/// conversation history for the model's context window.
pub fn format_context(records: &[InventoryRecord]) -> String {
    let rows: Vec<ContextRow> = records.iter().map(row).collect();
    serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
}
