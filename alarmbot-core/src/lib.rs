//! Alarmbot core library.
//!
//! Provides the alarm knowledge table, the per-user session store, the
//! device → category → alarm dialogue resolver, and the free-text FAQ matcher
//! shared by every front-end.

pub mod config;
pub mod dialogue;
pub mod faq;
pub mod knowledge;
pub mod session;
pub mod text;

pub use config::{
    Config, ConfigError, DialogueConfig, DiscordConfig, LoggingConfig, SessionConfig, TelegramConfig,
    TelegramMode, WebConfig,
};
pub use dialogue::{Dialogue, Reply, ReplyKind, Transition, UnsupportedCategoryPolicy, resolve};
pub use faq::{FaqError, FaqMatcher};
pub use knowledge::{KnowledgeError, KnowledgeTable, ResolutionEntry};
pub use session::{MemorySessionStore, SessionState, SessionStore, Step};
