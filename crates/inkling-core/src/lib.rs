pub mod error;
pub mod constants;
pub mod config;
pub mod context;
pub mod segment;
pub mod geometry;
pub mod document;
pub mod prediction;
pub mod stream;
pub mod debounce;
pub mod render;
pub mod interaction;
pub mod commit;
pub mod editor;
pub mod runtime;

// Re-export key types
pub use error::InklingError;
pub use config::Settings;
pub use context::RequestContext;
pub use document::{Caret, DocPosition, DocumentView, RunStyle, StyledRun, VirtualDocument};
pub use geometry::{OffsetResolver, Point, Rect};
pub use stream::{
    CompletionRequest, CompletionSource, HttpCompletionSource, PredictionStreamClient,
    StreamEvent, TaggedEvent,
};
pub use interaction::{InteractionController, InteractionEvent, InteractionMode, Key, PointerInfo};
pub use commit::{AcceptanceCommitter, CommitOutcome};
pub use editor::{Editor, Effects, Snapshot};
pub use runtime::{EditorRuntime, UiEvent};
