pub mod config;
pub mod conversation;
pub mod inventory;
pub mod numeric;
pub mod prompt;
pub mod relevance;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use conversation::{ChatMessage, ChatRole, ConversationLog};
pub use inventory::{normalize_field_name, InventoryRecord, InventorySnapshot};
pub use numeric::parse_locale_number;
pub use prompt::format_context;
pub use relevance::{select_relevant, FilterConfig};
