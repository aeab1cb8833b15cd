//! Rolling conversation window supplied to the completion model.
//!
//! One session, one owner: the orchestrator holds the context by value and
//! mutates it through `&mut self`, so there is no process-global state and
//! no locking. Multi-session use would mean one [`ConversationContext`]
//! per session handle.

/// Fixed confirmation returned by [`ConversationContext::clear`].
pub const CLEAR_CONFIRMATION: &str =
    "Chat history has been cleared. How can I assist you now?";

/// Bounded transcript of the most recent user/assistant turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    transcript: String,
}

impl ConversationContext {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The transcript as a newline-joined string (empty when no turns).
    pub fn as_str(&self) -> &str {
        &self.transcript
    }

    /// `true` when no turns are recorded.
    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// Number of transcript lines (two per turn).
    pub fn line_count(&self) -> usize {
        if self.transcript.is_empty() {
            0
        } else {
            self.transcript.lines().count()
        }
    }

    /// Append one user/assistant turn and trim to the most recent
    /// `2 * max_turns` lines.
    ///
    /// Invariant: the line count after this call never exceeds
    /// `2 * max_turns`, for any `max_turns >= 1`.
    pub fn append_turn(&mut self, user_input: &str, response: &str, max_turns: usize) {
        let mut combined = String::new();
        if !self.transcript.is_empty() {
            combined.push_str(&self.transcript);
            combined.push('\n');
        }
        combined.push_str(&format!("User: {user_input}\nAI: {response}"));

        // Trim over physical lines so multi-line responses cannot grow the
        // window past the bound.
        let lines: Vec<&str> = combined.lines().collect();
        let keep = 2 * max_turns;
        let start = lines.len().saturating_sub(keep);
        self.transcript = lines[start..].join("\n");
    }

    /// Reset to empty and return the fixed confirmation message.
    pub fn clear(&mut self) -> &'static str {
        self.transcript.clear();
        CLEAR_CONFIRMATION
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
