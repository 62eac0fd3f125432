//! Timed interaction scheduler for long waits.
//!
//! While an asynchronous job runs (say, generating an avatar), a character
//! persona keeps the user company. Elapsed time moves through phases, and
//! each phase shows one piece of content that never repeats within a
//! session:
//!
//! | phase | from | shows |
//! |---|---|---|
//! | micro | 0s | an ambient pose |
//! | tip | 5s | a tip |
//! | fact | 15s | a fact |
//! | verify | 30s | a question about the request |
//! | discover | 60s | a feature suggestion |
//!
//! # Quick Start
//!
//! ```ignore
//! use interlude_core::{ChannelObserver, Companion, CompanionConfig, CompanionHandle};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (observer, mut events) = ChannelObserver::channel();
//!     let companion = Companion::new(CompanionConfig::new(), observer);
//!     let handle = CompanionHandle::new(companion);
//!
//!     handle.start("avatar generation", None).await;
//!     // ... run the real job, forwarding `events` to the renderer ...
//!     let summary = handle.stop().await;
//!     println!("shown {} interactions", summary.interactions_shown_count);
//! }
//! ```

pub mod clock;
pub mod companion;
pub mod config;
pub mod content;
pub mod events;
pub mod persist;
pub mod phase;
pub mod pose;
pub mod runtime;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod testing;

// Primary public API
pub use clock::{Clock, SystemClock};
pub use companion::Companion;
pub use config::{CompanionConfig, ConfigError, DEFAULT_CHARACTER};
pub use content::{
    Category, CharacterContent, ContentOverride, ContentRepository, Feature, Verification,
};
pub use events::{
    ChannelObserver, CompanionEvent, CompanionObserver, Interaction, NoopObserver, ObserverError,
};
pub use persist::{ContentFile, PersistError};
pub use phase::{Phase, PhaseError, PhaseKind, PhaseTable};
pub use pose::{pose_id, PoseEmitter};
pub use runtime::CompanionHandle;
pub use scheduler::PhaseScheduler;
pub use selection::{pick_random, pick_unused, UsedKeys};
pub use session::{SessionId, SessionSummary};
pub use testing::{ManualClock, RecordingObserver, TestHarness};
