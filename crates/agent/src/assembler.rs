use cellarhand_core::{ChatMessage, ChatRole};

use crate::llm::{CompletionRequest, TurnContent};

/// System instruction sent with every completion. The stock and price rules
/// mirror the exact field names and sentinels produced by the prompt
/// formatter; changing one side breaks the other.
const SYSTEM_INSTRUCTION: &str = "\
You are the house wine assistant, a professional sommelier tool for bar staff.

DATABASE INFO:
You are looking at a live list of the wine cellar.
Each wine has a \"Price\" (string), \"Stock\" (string), and numeric helpers \"_p\" (price) and \"_s\" (stock).

CRITICAL INSTRUCTIONS ON STOCK:
1. If \"_s\" is 0 or \"Stock\" is \"0\", the wine is SOLD OUT.
2. If \"Stock\" is \"(empty)\" or missing, the stock level is not set in the sheet - tell the staff to check the shelf.
3. If \"Stock\" has any other number (e.g. \"5\"), it is AVAILABLE.

CRITICAL INSTRUCTIONS ON PRICE:
1. If \"Price\" is \"(empty)\", tell the staff the price is not listed.
2. Otherwise, ALWAYS quote the value in \"Price\" verbatim (e.g. \"450,-\"). Never say it is missing if there is a value.

Only answer from wines in the data context. \"Glass\" holds the by-the-glass price; an empty \"Glass\" means bottle only.

DATA CONTEXT:
";

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "model",
    }
}

/// Merges the system instruction, trimmed history, filtered context, and the
/// new user message into the exact request shape the completion API expects.
/// `history` is the log before the new message; the new message always goes
/// last.
pub fn build_request(
    user_message: &str,
    history: &[ChatMessage],
    context: &str,
    max_history_pairs: usize,
    temperature: f32,
) -> CompletionRequest {
    let max_messages = max_history_pairs.saturating_mul(2);
    let start = history.len().saturating_sub(max_messages);

    let mut contents: Vec<TurnContent> = history[start..]
        .iter()
        .map(|message| TurnContent::new(role_name(message.role), message.content.clone()))
        .collect();
    contents.push(TurnContent::new("user", user_message));

    CompletionRequest {
        system_instruction: format!("{SYSTEM_INSTRUCTION}{context}"),
        contents,
        temperature,
    }
}

#[cfg(test)]
mod tests {
    use cellarhand_core::ChatMessage;

    use super::build_request;

    fn history_fixture(pairs: usize) -> Vec<ChatMessage> {
        let mut history = Vec::new();
        for index in 0..pairs {
            history.push(ChatMessage::user(format!("question {index}")));
            history.push(ChatMessage::assistant(format!("answer {index}")));
        }
        history
    }

    #[test]
    fn roles_map_to_the_completion_vocabulary() {
        let request = build_request("next question", &history_fixture(1), "[]", 6, 0.1);

        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
    }

    #[test]
    fn the_new_user_message_goes_last() {
        let request = build_request("is the keller sold out?", &history_fixture(2), "[]", 6, 0.1);

        let last = request.contents.last().expect("contents should not be empty");
        assert_eq!(last.role, "user");
        assert_eq!(last.parts[0].text, "is the keller sold out?");
    }

    #[test]
    fn history_is_trimmed_to_the_newest_pairs() {
        let request = build_request("next", &history_fixture(10), "[]", 6, 0.1);

        // 6 pairs of history plus the new message.
        assert_eq!(request.contents.len(), 13);
        assert_eq!(request.contents[0].parts[0].text, "question 4");
    }

    #[test]
    fn context_is_embedded_in_the_system_instruction() {
        let context = r#"[{"Name":"Felsina Chianti","Price":"450,-"}]"#;
        let request = build_request("any chianti?", &[], context, 6, 0.1);

        assert!(request.system_instruction.ends_with(context));
        assert!(request.system_instruction.contains("CRITICAL INSTRUCTIONS ON STOCK"));
        assert!(request.contents.iter().all(|turn| !turn.parts[0].text.contains("DATA CONTEXT")));
    }

    #[test]
    fn temperature_is_passed_through() {
        let request = build_request("hi there", &[], "[]", 6, 0.1);
        assert!((request.temperature - 0.1).abs() < f32::EPSILON);
    }
}
