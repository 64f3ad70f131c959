use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use cellarhand_core::config::ChatConfig;
use cellarhand_core::{
    format_context, select_relevant, ChatMessage, ConversationLog, FilterConfig, InventorySnapshot,
};
use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::assembler::build_request;
use crate::llm::CompletionClient;

/// Reply appended when the completion call fails for any reason. The cause
/// goes to the log; staff only ever see this.
pub const COMPLETION_APOLOGY: &str =
    "I encountered an issue accessing the cellar records. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Replied { reply: String },
    Rejected(SubmitRejection),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitRejection {
    /// Empty or whitespace-only input; silently ignored.
    EmptyMessage,
    /// A completion call is already outstanding for this session.
    Busy,
    /// No inventory snapshot has been loaded yet.
    NoInventory,
}

impl SubmitRejection {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyMessage => "",
            Self::Busy => "A reply is already being generated. One question at a time.",
            Self::NoInventory => "Inventory is not loaded. Refresh the cellar list and try again.",
        }
    }
}

/// Stateless-per-submission chat orchestrator: each accepted submission is one
/// transform from (history, snapshot, question) to one completion request and
/// one appended reply. Nothing persists across process restarts.
pub struct ChatRuntime {
    completion: Arc<dyn CompletionClient>,
    history: Mutex<ConversationLog>,
    snapshot: RwLock<Option<InventorySnapshot>>,
    in_flight: AtomicBool,
    chat: ChatConfig,
    filter: FilterConfig,
    temperature: f32,
}

impl ChatRuntime {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        chat: ChatConfig,
        filter: FilterConfig,
        temperature: f32,
    ) -> Self {
        let mut history = ConversationLog::new();
        if !chat.welcome_message.trim().is_empty() {
            history.push(ChatMessage::assistant(chat.welcome_message.clone()));
        }

        Self {
            completion,
            history: Mutex::new(history),
            snapshot: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            chat,
            filter,
            temperature,
        }
    }

    /// Handles one staff submission end to end: gate, filter, format,
    /// assemble, complete, append. Never returns an error; every failure path
    /// degrades to a visible message and leaves the runtime ready for the next
    /// submission.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let question = text.trim();
        if question.is_empty() {
            return SubmitOutcome::Rejected(SubmitRejection::EmptyMessage);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return SubmitOutcome::Rejected(SubmitRejection::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        // Value copy of the snapshot: a refresh completing mid-filter must not
        // affect this pass.
        let snapshot = match read_lock(&self.snapshot).clone() {
            Some(snapshot) => snapshot,
            None => return SubmitOutcome::Rejected(SubmitRejection::NoInventory),
        };

        let prior_history: Vec<ChatMessage> = {
            let mut log = lock(&self.history);
            let prior = log.recent(self.chat.max_history_pairs).to_vec();
            log.push(ChatMessage::user(question));
            prior
        };

        let selected = select_relevant(snapshot.records(), question, &self.filter);
        let context = format_context(&selected);
        let request = build_request(
            question,
            &prior_history,
            &context,
            self.chat.max_history_pairs,
            self.temperature,
        );

        info!(
            event_name = "chat.submit.dispatch",
            record_count = snapshot.len(),
            selected_count = selected.len(),
            history_messages = prior_history.len(),
            "dispatching completion request"
        );

        let reply = match self.completion.complete(&request).await {
            Ok(reply) => reply,
            Err(cause) => {
                error!(
                    event_name = "chat.submit.completion_failed",
                    error = %cause,
                    "completion call failed, degrading to apology"
                );
                COMPLETION_APOLOGY.to_string()
            }
        };

        lock(&self.history).push(ChatMessage::assistant(reply.clone()));
        SubmitOutcome::Replied { reply }
    }

    /// Swaps in a freshly fetched snapshot. Safe to call while a submission is
    /// outstanding; the pass in progress keeps the snapshot it started with.
    pub fn install_snapshot(&self, snapshot: InventorySnapshot) {
        let mut slot = match self.snapshot.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(snapshot);
    }

    /// Marks the inventory unavailable after a failed refresh; submissions are
    /// rejected until a later refresh succeeds.
    pub fn clear_snapshot(&self) {
        let mut slot = match self.snapshot.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = None;
    }

    pub fn has_snapshot(&self) -> bool {
        read_lock(&self.snapshot).is_some()
    }

    /// Record count and fetch time of the current snapshot, if any.
    pub fn snapshot_info(&self) -> Option<(usize, DateTime<Utc>)> {
        read_lock(&self.snapshot)
            .as_ref()
            .map(|snapshot| (snapshot.len(), snapshot.fetched_at()))
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        lock(&self.history).messages().to_vec()
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<'a>(history: &'a Mutex<ConversationLog>) -> std::sync::MutexGuard<'a, ConversationLog> {
    match history.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_lock<'a>(
    snapshot: &'a RwLock<Option<InventorySnapshot>>,
) -> std::sync::RwLockReadGuard<'a, Option<InventorySnapshot>> {
    match snapshot.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
