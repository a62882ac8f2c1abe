//! Composition root for the session, the mounted screen and its state.
//!
//! The shell is a reducer: presentational views turn user input into an
//! [`Intent`], [`Shell::dispatch`] applies it and returns the [`Effect`]s the
//! caller must run (timers to start or stop). Rendering reads
//! [`Shell::snapshot`]. The shell never sleeps and never spawns; the
//! runtime does that on its behalf.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::conversation::{AssistantScript, ConversationSnapshot, ConversationStore, ReplyTicket};
use crate::error::Rejection;
use crate::preferences::Preferences;
use crate::session::{Credentials, Page, SessionController, SessionSnapshot, Transition};
use crate::ui_state::{ClickTarget, OutsideClickListeners, TransientUiState, UiFlags};

/// Entries of the profile menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Settings,
    Help,
    SignOut,
}

impl FromStr for MenuAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settings" => Ok(MenuAction::Settings),
            "help" => Ok(MenuAction::Help),
            "signout" => Ok(MenuAction::SignOut),
            other => Err(format!("unknown menu action: {other}")),
        }
    }
}

/// A user intent forwarded by the presentational layer.
#[derive(Debug, Clone)]
pub enum Intent {
    SignIn(Credentials),
    SignOut,
    Navigate(Page),
    ToggleSidebar,
    ToggleProfileMenu,
    CloseProfileMenu,
    /// A click observed anywhere on the document.
    Click(ClickTarget),
    MenuAction(MenuAction),
    /// Sidebar or dashboard "new chat" control.
    NewChat,
    SendMessage(String),
    /// Raw key press in the message box. Enter without Shift sends.
    KeyPress {
        key: String,
        shift: bool,
        text: String,
    },
    UpdatePreferences(Preferences),
}

/// Work the caller has to perform after a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start the reply timer for this ticket.
    ScheduleReply(ReplyTicket),
    /// Stop the reply timer for this ticket; its conversation is gone.
    CancelReply(ReplyTicket),
}

/// The mounted screen and the state it owns.
pub enum Screen {
    SignIn,
    Dashboard {
        ui: TransientUiState,
    },
    Chat {
        ui: TransientUiState,
        conversation: ConversationStore,
    },
    Settings {
        ui: TransientUiState,
        preferences: Preferences,
    },
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Screen::SignIn => f.write_str("SignIn"),
            Screen::Dashboard { ui } => f.debug_struct("Dashboard").field("ui", ui).finish(),
            Screen::Chat { ui, conversation } => f
                .debug_struct("Chat")
                .field("ui", ui)
                .field("conversation", &conversation.id())
                .finish(),
            Screen::Settings { ui, .. } => f.debug_struct("Settings").field("ui", ui).finish(),
        }
    }
}

impl Screen {
    fn ui(&self) -> Option<&TransientUiState> {
        match self {
            Screen::SignIn => None,
            Screen::Dashboard { ui } | Screen::Chat { ui, .. } | Screen::Settings { ui, .. } => {
                Some(ui)
            }
        }
    }

    fn ui_mut(&mut self) -> Option<&mut TransientUiState> {
        match self {
            Screen::SignIn => None,
            Screen::Dashboard { ui } | Screen::Chat { ui, .. } | Screen::Settings { ui, .. } => {
                Some(ui)
            }
        }
    }
}

/// Everything the views need to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellSnapshot {
    pub session: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui: Option<UiFlags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}

/// Session plus the one mounted screen.
#[derive(Debug)]
pub struct Shell {
    session: SessionController,
    screen: Screen,
    script: Arc<AssistantScript>,
    listeners: OutsideClickListeners,
}

impl Shell {
    /// Signed out, showing the sign-in page.
    #[must_use]
    pub fn new(script: Arc<AssistantScript>) -> Self {
        Self {
            session: SessionController::new(),
            screen: Screen::SignIn,
            script,
            listeners: OutsideClickListeners::new(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionController {
        &self.session
    }

    #[must_use]
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Outside-click registry shared by all screens.
    #[must_use]
    pub fn listeners(&self) -> &OutsideClickListeners {
        &self.listeners
    }

    /// The open conversation, when the chat screen is mounted.
    #[must_use]
    pub fn conversation(&self) -> Option<&ConversationStore> {
        match &self.screen {
            Screen::Chat { conversation, .. } => Some(conversation),
            _ => None,
        }
    }

    #[must_use]
    pub fn ui_flags(&self) -> Option<UiFlags> {
        self.screen.ui().map(TransientUiState::flags)
    }

    /// Apply an intent, swallowing rejections.
    ///
    /// Rejected intents leave state untouched and are only logged.
    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        match self.try_dispatch(intent) {
            Ok(effects) => effects,
            Err(rejection) => {
                tracing::debug!(
                    name: "shell.intent.rejected",
                    reason = %rejection,
                    "Intent rejected"
                );
                Vec::new()
            }
        }
    }

    /// Apply an intent, reporting why it was refused.
    pub fn try_dispatch(&mut self, intent: Intent) -> Result<Vec<Effect>, Rejection> {
        match intent {
            Intent::SignIn(credentials) => {
                let transition = self.session.sign_in(&credentials)?;
                Ok(self.apply(transition))
            }
            Intent::SignOut => {
                let transition = self.session.sign_out();
                Ok(self.apply(transition))
            }
            Intent::Navigate(page) => {
                let transition = self.session.navigate(page)?;
                Ok(self.apply(transition))
            }
            Intent::ToggleSidebar => {
                if let Some(ui) = self.screen.ui_mut() {
                    ui.toggle_sidebar();
                }
                Ok(Vec::new())
            }
            Intent::ToggleProfileMenu => {
                if let Some(ui) = self.screen.ui_mut() {
                    ui.toggle_profile_menu();
                }
                Ok(Vec::new())
            }
            Intent::CloseProfileMenu => {
                self.close_profile_menu();
                Ok(Vec::new())
            }
            Intent::Click(target) => {
                if let Some(ui) = self.screen.ui_mut() {
                    ui.handle_click(target);
                }
                Ok(Vec::new())
            }
            Intent::MenuAction(action) => self.menu_action(action),
            Intent::NewChat => self.new_chat(),
            Intent::SendMessage(text) => self.send_message(&text),
            Intent::KeyPress { key, shift, text } => {
                if key == "Enter" && !shift {
                    self.send_message(&text)
                } else {
                    Ok(Vec::new())
                }
            }
            Intent::UpdatePreferences(update) => match &mut self.screen {
                Screen::Settings { preferences, .. } => {
                    preferences.apply(update);
                    Ok(Vec::new())
                }
                _ => Err(Rejection::NotOnSettings),
            },
        }
    }

    /// Deliver a reply whose delay has elapsed.
    ///
    /// Fails with [`Rejection::StaleReply`] when the ticket's conversation was
    /// reset or discarded in the meantime.
    pub fn complete_reply(&mut self, ticket: ReplyTicket) -> Result<(), Rejection> {
        match &mut self.screen {
            Screen::Chat { conversation, .. } => conversation.complete_reply(ticket).map(|_| ()),
            _ => Err(Rejection::StaleReply),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> ShellSnapshot {
        let (conversation, preferences) = match &self.screen {
            Screen::Chat { conversation, .. } => (Some(conversation.snapshot()), None),
            Screen::Settings { preferences, .. } => (None, Some(preferences.clone())),
            _ => (None, None),
        };

        ShellSnapshot {
            session: self.session.snapshot(),
            ui: self.ui_flags(),
            conversation,
            preferences,
        }
    }

    fn close_profile_menu(&mut self) {
        if let Some(ui) = self.screen.ui_mut() {
            ui.close_profile_menu();
        }
    }

    // The menu closes in the same dispatch as the action it triggers.
    fn menu_action(&mut self, action: MenuAction) -> Result<Vec<Effect>, Rejection> {
        self.close_profile_menu();
        match action {
            MenuAction::Settings => {
                let transition = self.session.navigate(Page::Settings)?;
                Ok(self.apply(transition))
            }
            MenuAction::Help => Ok(Vec::new()),
            MenuAction::SignOut => {
                let transition = self.session.sign_out();
                Ok(self.apply(transition))
            }
        }
    }

    fn new_chat(&mut self) -> Result<Vec<Effect>, Rejection> {
        if let Screen::Chat { conversation, .. } = &mut self.screen {
            let cancelled = conversation.reset_conversation();
            tracing::info!(
                name: "conversation.reset",
                conversation = %conversation.id(),
                generation = conversation.generation(),
                "Conversation reset"
            );
            return Ok(cancelled.map(Effect::CancelReply).into_iter().collect());
        }

        let transition = self.session.navigate(Page::Chat)?;
        Ok(self.apply(transition))
    }

    fn send_message(&mut self, text: &str) -> Result<Vec<Effect>, Rejection> {
        let Screen::Chat { conversation, .. } = &mut self.screen else {
            return Err(Rejection::NoConversation);
        };

        let ticket = conversation.send_user_message(text)?;
        Ok(ticket.map(Effect::ScheduleReply).into_iter().collect())
    }

    fn apply(&mut self, transition: Transition) -> Vec<Effect> {
        if transition.remounts() {
            self.mount(transition.to)
        } else {
            Vec::new()
        }
    }

    // Replaces the screen. Dropping the old one releases its listener and
    // discards its conversation.
    fn mount(&mut self, page: Page) -> Vec<Effect> {
        let screen = match page {
            Page::SignIn => Screen::SignIn,
            Page::Dashboard => Screen::Dashboard {
                ui: TransientUiState::new(self.listeners.clone()),
            },
            Page::Chat => {
                let conversation = ConversationStore::new(Arc::clone(&self.script));
                tracing::info!(
                    name: "conversation.started",
                    conversation = %conversation.id(),
                    "Conversation started"
                );
                Screen::Chat {
                    ui: TransientUiState::new(self.listeners.clone()),
                    conversation,
                }
            }
            Page::Settings => Screen::Settings {
                ui: TransientUiState::new(self.listeners.clone()),
                preferences: Preferences::for_user(self.session.username().unwrap_or_default()),
            },
        };

        let previous = std::mem::replace(&mut self.screen, screen);
        match previous {
            Screen::Chat { conversation, .. } => conversation
                .pending_ticket()
                .map(Effect::CancelReply)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }
}
