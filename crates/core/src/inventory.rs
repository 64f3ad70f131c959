use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Canonical form of a sheet column header or lookup name: leading BOM
/// stripped, non-breaking spaces replaced, whitespace runs collapsed, trimmed.
///
/// The export carries whatever the staff typed into the header row, so both
/// record keys and requested field names pass through this before comparison.
pub fn normalize_field_name(raw: &str) -> String {
    let stripped = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);
    let mut normalized = String::with_capacity(stripped.len());
    let mut pending_space = false;

    for ch in stripped.chars() {
        let ch = if ch == '\u{00A0}' { ' ' } else { ch };
        if ch.is_whitespace() {
            pending_space = !normalized.is_empty();
        } else {
            if pending_space {
                normalized.push(' ');
                pending_space = false;
            }
            normalized.push(ch);
        }
    }

    normalized
}

/// One wine's attributes as exported from the cellar sheet.
///
/// No schema is enforced; keys arrive with inconsistent casing and stray
/// whitespace, so all field access goes through [`InventoryRecord::lookup`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InventoryRecord(Map<String, Value>);

impl InventoryRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accepts a JSON value if it is an object; anything else is not a record.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Case- and whitespace-insensitive field access. Absent fields and JSON
    /// nulls yield an empty string rather than an error; scalar values are
    /// stringified and trimmed.
    pub fn lookup(&self, field: &str) -> String {
        let wanted = normalize_field_name(field).to_lowercase();

        for (key, value) in &self.0 {
            if normalize_field_name(key).to_lowercase() != wanted {
                continue;
            }
            return match value {
                Value::String(text) => text.trim().to_string(),
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                _ => String::new(),
            };
        }

        String::new()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Immutable inventory state captured by one refresh. A refresh produces a new
/// snapshot value; a filter pass already running keeps the snapshot it started
/// with.
#[derive(Clone, Debug, PartialEq)]
pub struct InventorySnapshot {
    records: Vec<InventoryRecord>,
    fetched_at: DateTime<Utc>,
}

impl InventorySnapshot {
    pub fn new(records: Vec<InventoryRecord>) -> Self {
        Self { records, fetched_at: Utc::now() }
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
