//! Chat orchestrator: classify → respond → record.
//!
//! One [`ChatBot`] is one session. Both collaborators are injected as
//! capability objects — [`DomainGate`] for the medical-intent decision and
//! [`CompletionBackend`] for text generation — so tests can stub either.
//!
//! The original system left the off-domain branch undefined (it referenced a
//! response that was never computed). Resolved policy here: reply with a
//! fixed off-topic message and still record the turn in the context window.

use crate::classifier::DomainGate;
use crate::completion::CompletionBackend;
use crate::config::DEFAULT_MAX_TURNS;
use crate::context::ConversationContext;
use crate::formatter::{build_prompt, fallback_response};

/// Fixed reply for empty or whitespace-only input.
pub const EMPTY_INPUT_REPLY: &str = "Please enter a valid message.";

/// Fixed reply when the classifier rejects the input.
pub const OFF_TOPIC_REPLY: &str =
    "I can only help with medical questions. Please describe a health concern.";

/// Single-session chat handler.
pub struct ChatBot<G, C> {
    gate: G,
    completion: C,
    context: ConversationContext,
    max_turns: usize,
}

impl<G, C> ChatBot<G, C>
where
    G: DomainGate,
    C: CompletionBackend,
{
    /// Compose a bot from its collaborators with the default context window.
    pub fn new(gate: G, completion: C) -> Self {
        Self {
            gate,
            completion,
            context: ConversationContext::new(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Override the number of turn pairs kept in the context window.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Read access to the rolling context (tests, diagnostics).
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Process one user message and return one response string.
    ///
    /// Empty input returns the fixed prompt-for-input message and leaves the
    /// context untouched; every other path records exactly one turn.
    pub async fn handle(&mut self, user_input: &str) -> String {
        if user_input.trim().is_empty() {
            return EMPTY_INPUT_REPLY.to_string();
        }

        let response = if self.gate.is_domain_relevant(user_input) {
            let prompt = build_prompt(self.context.as_str(), user_input);
            let generated = self.completion.complete(&prompt).await;

            // Use the fallback template only when the model response is
            // empty or carries the failure sentinel.
            if generated.is_empty() || generated.contains("Sorry") {
                fallback_response(user_input)
            } else {
                generated
            }
        } else {
            tracing::info!("Input rejected by domain classifier");
            OFF_TOPIC_REPLY.to_string()
        };

        self.context
            .append_turn(user_input, &response, self.max_turns);
        response
    }

    /// Clear the conversation window, returning the fixed confirmation.
    pub fn clear(&mut self) -> &'static str {
        self.context.clear()
    }
}
