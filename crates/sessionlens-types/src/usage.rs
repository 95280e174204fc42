use serde::{Deserialize, Serialize};

/// Token usage for one increment, one session, or one aggregation window.
///
/// All fields are raw provider counters; the prefill/gen/total splits are
/// derived, never stored, so they cannot drift out of sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsageSnapshot {
    pub input_tokens: u64,
    pub cached_input_tokens: u64,
    pub output_tokens: u64,
    pub reasoning_output_tokens: u64,
}

impl TokenUsageSnapshot {
    pub fn new(
        input_tokens: u64,
        cached_input_tokens: u64,
        output_tokens: u64,
        reasoning_output_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            cached_input_tokens,
            output_tokens,
            reasoning_output_tokens,
        }
    }

    /// Tokens the model had to ingest before generating (fresh + cached)
    pub fn prefill_tokens(&self) -> u64 {
        self.input_tokens + self.cached_input_tokens
    }

    /// Tokens the model produced (visible output + reasoning)
    pub fn gen_tokens(&self) -> u64 {
        self.output_tokens + self.reasoning_output_tokens
    }

    pub fn total_tokens(&self) -> u64 {
        self.prefill_tokens() + self.gen_tokens()
    }

    pub fn is_zero(&self) -> bool {
        self.total_tokens() == 0
    }

    /// Per-field increment since `previous`, clamped to zero.
    ///
    /// Cumulative counters can visibly decrease when the producing tool is
    /// restarted mid-session; a negative step must never subtract from the
    /// running total, and must not poison later correct deltas.
    pub fn saturating_delta(&self, previous: &Self) -> Self {
        Self {
            input_tokens: self.input_tokens.saturating_sub(previous.input_tokens),
            cached_input_tokens: self
                .cached_input_tokens
                .saturating_sub(previous.cached_input_tokens),
            output_tokens: self.output_tokens.saturating_sub(previous.output_tokens),
            reasoning_output_tokens: self
                .reasoning_output_tokens
                .saturating_sub(previous.reasoning_output_tokens),
        }
    }

    pub fn accumulate(&mut self, other: &Self) {
        self.input_tokens += other.input_tokens;
        self.cached_input_tokens += other.cached_input_tokens;
        self.output_tokens += other.output_tokens;
        self.reasoning_output_tokens += other.reasoning_output_tokens;
    }
}
