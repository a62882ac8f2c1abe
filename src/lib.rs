//! HOH MIS Assistant
//!
//! A server-rendered chat client for the Housing & Habitat Management
//! Information System. The whole UI is a state machine held on the server:
//! pages post intents, the shell applies them, and views are rendered from
//! the resulting snapshot.
//!
//! # Architecture
//!
//! - **Server**: Axum routes, one per intent, plus an SSE stream of state changes
//! - **Shell**: Pure state machine composing session, screen and conversation
//! - **Runtime**: Serializes intents and owns the simulated reply timers
//! - **UI**: Maud views + HTMX
//!
//! # Modules
//!
//! - [`session`]: Authentication and page routing
//! - [`conversation`]: Message history and the canned assistant
//! - [`ui_state`]: Sidebar and profile-menu flags
//! - [`shell`]: Intents, effects and screen lifecycle
//! - [`runtime`]: Shared handle and reply timers

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::unused_async)]
#![allow(clippy::needless_pass_by_value)]

pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod preferences;
pub mod runtime;
pub mod server;
pub mod session;
pub mod shell;
pub mod ui;
pub mod ui_state;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::runtime::ShellHandle;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The running shell.
    pub shell: ShellHandle,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Signed-out state with reply timing taken from `config`.
    #[must_use]
    pub fn new(config: Arc<AppConfig>) -> Self {
        let shell = ShellHandle::new(config.assistant.script(), config.assistant.reply_delay());
        Self { shell, config }
    }
}
