//! Error types.
//!
//! Two families live here:
//!
//! - [`Rejection`]: an intent that was refused by the session or conversation
//!   state machine. Rejections are local and recoverable; the shell logs them
//!   at `debug` and leaves state untouched. They are never shown to the user.
//! - [`AppError`]: process-level failures (configuration, socket binding,
//!   serving) that end the binary.

/// An intent refused by the state machine. No state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Username or password was empty.
    #[error("username and password are both required")]
    InvalidCredentials,

    /// The message text was blank after trimming.
    #[error("message text is empty")]
    EmptyMessage,

    /// A navigation was requested while signed out.
    #[error("navigation requires an authenticated session")]
    UnauthorizedNavigation,

    /// The sign-in page is only reachable by signing out.
    #[error("the sign-in page cannot be navigated to while signed in")]
    SignInNotNavigable,

    /// A deferred reply fired after its conversation was reset or discarded.
    #[error("reply belongs to a conversation that no longer exists")]
    StaleReply,

    /// The intent targets the chat screen but it is not mounted.
    #[error("no conversation is open")]
    NoConversation,

    /// The intent targets the settings screen but it is not mounted.
    #[error("settings screen is not open")]
    NotOnSettings,
}

/// Process-level failures.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be assembled.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Binding or serving the listener failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
