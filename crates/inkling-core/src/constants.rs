/// Inkling centralized constants.
/// Defaults, endpoints and limits shared by the engine and the CLI.

// ─── Endpoints ────────────────────────────────────────────────────────────────

pub mod endpoints {
    /// Local completion server used when no endpoint is configured.
    pub const COMPLETION_URL: &str = "http://localhost:3000/api/complete";
    pub const DEFAULT_API_KEY_ENV: &str = "INKLING_API_KEY";
}

// ─── Prediction pipeline ──────────────────────────────────────────────────────

pub mod defaults {
    /// Quiet period after the last keystroke before a request is issued.
    pub const DEBOUNCE_MS: u64 = 1000;
    /// Trimmed document text shorter than this never triggers a request.
    pub const MIN_SOURCE_CHARS: usize = 10;
    /// Only the tail of the document is sent as context.
    pub const CONTEXT_CHARS: usize = 2000;
    /// Delay between successive characters of the streaming reveal.
    pub const REVEAL_STAGGER_MS: u64 = 25;
    pub const CONNECT_TIMEOUT_MS: u64 = 10_000;
}

// ─── Virtual document layout ──────────────────────────────────────────────────

pub mod layout {
    pub const CHAR_WIDTH: f64 = 8.0;
    pub const LINE_HEIGHT: f64 = 18.0;
    pub const COLUMNS: usize = 80;
    /// Inline images occupy this many cells.
    pub const IMAGE_CELLS: usize = 2;
}

// ─── Stream framing ───────────────────────────────────────────────────────────

pub mod sse {
    pub const DATA_PREFIX: &str = "data:";
    pub const DONE_SENTINEL: &str = "[DONE]";
}
