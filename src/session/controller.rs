//! Authentication flag, current page and the navigation gate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Rejection;

/// Top-level pages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    SignIn,
    Dashboard,
    Chat,
    Settings,
}

impl Page {
    /// Path segment used in URLs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Page::SignIn => "signin",
            Page::Dashboard => "dashboard",
            Page::Chat => "chat",
            Page::Settings => "settings",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signin" => Ok(Page::SignIn),
            "dashboard" => Ok(Page::Dashboard),
            "chat" => Ok(Page::Chat),
            "settings" => Ok(Page::Settings),
            other => Err(format!("unknown page: {other}")),
        }
    }
}

/// Sign-in form submission.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Accepted for parity with the form; nothing is persisted.
    pub remember_me: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember_me: false,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Outcome of an accepted session action.
///
/// The controller does not own the conversation; it tells the caller what to
/// do with it through `discard_conversation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Page,
    pub to: Page,
    /// The current conversation must be discarded (sign-out, chat entry).
    pub discard_conversation: bool,
}

impl Transition {
    /// Whether the mounted screen has to be replaced.
    #[must_use]
    pub fn remounts(&self) -> bool {
        self.from != self.to || self.discard_conversation
    }
}

/// Render input for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub authenticated: bool,
    pub current_page: Page,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Process-wide session state machine.
///
/// States are `SignedOut`, `Dashboard`, `Chat` and `Settings`. The pair
/// `(authenticated, current_page)` only changes through [`sign_in`],
/// [`sign_out`] and [`navigate`], and `current_page != SignIn` always
/// implies `authenticated`.
///
/// [`sign_in`]: SessionController::sign_in
/// [`sign_out`]: SessionController::sign_out
/// [`navigate`]: SessionController::navigate
#[derive(Debug, Clone, Default)]
pub struct SessionController {
    authenticated: bool,
    current_page: Page,
    username: Option<String>,
}

impl SessionController {
    /// Signed out, on the sign-in page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn current_page(&self) -> Page {
        self.current_page
    }

    /// Username of the signed-in user.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Accept any non-empty username and password pair.
    ///
    /// There is no credential store; the only check is that both fields are
    /// present.
    pub fn sign_in(&mut self, credentials: &Credentials) -> Result<Transition, Rejection> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            return Err(Rejection::InvalidCredentials);
        }

        let from = self.current_page;
        self.authenticated = true;
        self.current_page = Page::Dashboard;
        self.username = Some(credentials.username.clone());

        tracing::info!(
            name: "session.signed_in",
            username = %credentials.username,
            remember_me = credentials.remember_me,
            "User signed in"
        );

        Ok(Transition {
            from,
            to: Page::Dashboard,
            discard_conversation: from == Page::Chat,
        })
    }

    /// Sign out from any state. Always discards the conversation.
    pub fn sign_out(&mut self) -> Transition {
        let from = self.current_page;
        self.authenticated = false;
        self.current_page = Page::SignIn;
        self.username = None;

        tracing::info!(name: "session.signed_out", from = %from, "User signed out");

        Transition {
            from,
            to: Page::SignIn,
            discard_conversation: true,
        }
    }

    /// Move to `target`. Entering chat always asks for a fresh conversation,
    /// including when chat is already the current page.
    pub fn navigate(&mut self, target: Page) -> Result<Transition, Rejection> {
        if !self.authenticated {
            return Err(Rejection::UnauthorizedNavigation);
        }
        if target == Page::SignIn {
            return Err(Rejection::SignInNotNavigable);
        }

        let from = self.current_page;
        self.current_page = target;

        tracing::debug!(name: "session.navigated", from = %from, to = %target, "Navigated");

        Ok(Transition {
            from,
            to: target,
            discard_conversation: target == Page::Chat || from == Page::Chat,
        })
    }

    /// Copy of the render inputs.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            authenticated: self.authenticated,
            current_page: self.current_page,
            username: self.username.clone(),
        }
    }
}
