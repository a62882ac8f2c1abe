//! Per-screen transient UI flags.
//!
//! Each mounted screen owns one [`TransientUiState`]. The sidebar flag is a
//! plain toggle. The profile menu holds an [`OutsideClickSubscription`] while
//! it is open; the subscription is released on every close path, including
//! when the owning screen is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Where a click landed relative to the open profile menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickTarget {
    InsideMenu,
    Outside,
}

/// Document-level registry of outside-click listeners.
///
/// Clones share the same counter. The count is the number of live
/// subscriptions, which lets callers check that nothing leaked.
#[derive(Debug, Clone, Default)]
pub struct OutsideClickListeners {
    active: Arc<AtomicUsize>,
}

impl OutsideClickListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the guard is dropped.
    #[must_use]
    pub fn subscribe(&self) -> OutsideClickSubscription {
        self.active.fetch_add(1, Ordering::SeqCst);
        OutsideClickSubscription {
            active: Arc::clone(&self.active),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard for a registered outside-click listener.
#[derive(Debug)]
pub struct OutsideClickSubscription {
    active: Arc<AtomicUsize>,
}

impl Drop for OutsideClickSubscription {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Render input for the transient flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UiFlags {
    pub sidebar_open: bool,
    pub profile_menu_open: bool,
}

/// Sidebar and profile-menu state of one screen instance.
#[derive(Debug)]
pub struct TransientUiState {
    sidebar_open: bool,
    profile_menu: Option<OutsideClickSubscription>,
    listeners: OutsideClickListeners,
}

impl TransientUiState {
    /// Both closed.
    #[must_use]
    pub fn new(listeners: OutsideClickListeners) -> Self {
        Self {
            sidebar_open: false,
            profile_menu: None,
            listeners,
        }
    }

    #[must_use]
    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    #[must_use]
    pub fn profile_menu_open(&self) -> bool {
        self.profile_menu.is_some()
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    /// Open the menu and start listening for outside clicks.
    pub fn open_profile_menu(&mut self) {
        if self.profile_menu.is_none() {
            self.profile_menu = Some(self.listeners.subscribe());
        }
    }

    /// Close the menu and release its listener.
    pub fn close_profile_menu(&mut self) {
        self.profile_menu = None;
    }

    /// The trigger button: open when closed, close when open.
    pub fn toggle_profile_menu(&mut self) {
        if self.profile_menu_open() {
            self.close_profile_menu();
        } else {
            self.open_profile_menu();
        }
    }

    /// Feed a click to the outside-click observer.
    ///
    /// Returns `true` if the click closed the menu. Clicks are ignored while
    /// the menu is closed, because no listener is registered then.
    pub fn handle_click(&mut self, target: ClickTarget) -> bool {
        if self.profile_menu.is_none() {
            return false;
        }
        match target {
            ClickTarget::InsideMenu => false,
            ClickTarget::Outside => {
                self.close_profile_menu();
                true
            }
        }
    }

    #[must_use]
    pub fn flags(&self) -> UiFlags {
        UiFlags {
            sidebar_open: self.sidebar_open,
            profile_menu_open: self.profile_menu_open(),
        }
    }
}
