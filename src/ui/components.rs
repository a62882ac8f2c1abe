//! Shared building blocks: intent buttons, header, sidebar, profile menu,
//! message bubbles.

use chrono::Local;
use maud::{Markup, html};

use crate::conversation::{Message, Sender};
use crate::preferences::Preferences;
use crate::ui_state::UiFlags;

/// Id of the element every intent response replaces.
pub const MAIN_ID: &str = "app-main";

/// A one-button form posting to `action`.
///
/// Works without JavaScript (plain POST, redirect back to `/`) and swaps the
/// main fragment in place when HTMX is loaded.
pub fn intent_button(action: &str, class: &str, label: Markup) -> Markup {
    html! {
        form method="post" action=(action)
            hx-post=(action)
            hx-target={ "#" (MAIN_ID) }
            hx-swap="outerHTML" {
            button type="submit" class=(class) { (label) }
        }
    }
}

/// Top bar with sidebar toggle, page title and profile menu.
pub fn header(title: &str, flags: UiFlags, username: &str, back_to_dashboard: bool) -> Markup {
    html! {
        header class="app-header" {
            div class="app-header-left" {
                (intent_button("/sidebar/toggle", "icon-btn brand-btn", html! { "☰" }))
                @if back_to_dashboard {
                    (intent_button("/navigate/dashboard", "icon-btn", html! { "←" }))
                }
                h1 class="app-title" { (title) }
            }
            (profile_menu(flags.profile_menu_open, username))
        }
    }
}

/// Slide-in sidebar with the new-chat control.
pub fn sidebar(open: bool) -> Markup {
    html! {
        @if open {
            // Clicking the backdrop closes the sidebar.
            div class="sidebar-backdrop" {
                (intent_button("/sidebar/toggle", "backdrop-btn", html! {}))
            }
        }
        aside class=(if open { "sidebar open" } else { "sidebar" }) {
            (intent_button("/chat/new", "btn-primary new-chat", html! { "+ New Chat" }))
        }
    }
}

/// Avatar trigger plus, when open, the dropdown and its outside-click layer.
pub fn profile_menu(open: bool, username: &str) -> Markup {
    let email = Preferences::for_user(username).email;
    html! {
        div class="profile" {
            (intent_button("/profile-menu/toggle", "profile-trigger", html! {
                span class="avatar" { "👤" }
                span class="profile-name" { (username) }
                span class=(if open { "chevron up" } else { "chevron" }) { "▾" }
            }))
            @if open {
                form class="outside-layer" method="post" action="/click"
                    hx-post="/click"
                    hx-target={ "#" (MAIN_ID) }
                    hx-swap="outerHTML" {
                    input type="hidden" name="target" value="outside";
                    button type="submit" class="outside-btn" aria-label="Close menu" {}
                }
                div class="profile-dropdown" role="menu" {
                    div class="profile-dropdown-header" {
                        p class="profile-dropdown-name" { (username) }
                        p class="profile-dropdown-email" { (email) }
                    }
                    (intent_button("/profile-menu/action/settings", "menu-item", html! { "⚙ Settings" }))
                    (intent_button("/profile-menu/action/help", "menu-item", html! { "? Help & Support" }))
                    (intent_button("/profile-menu/action/signout", "menu-item danger", html! { "⎋ Sign Out" }))
                }
            }
        }
    }
}

pub fn message_bubble(message: &Message) -> Markup {
    let (row, bubble) = match message.sender {
        Sender::User => ("message-row user", "bubble user"),
        Sender::Bot => ("message-row bot", "bubble bot"),
    };
    let time = message
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string();

    html! {
        div class=(row) id=(message.id.to_string()) {
            div class=(bubble) {
                p class="bubble-text" { (message.text) }
                p class="bubble-time" { (time) }
            }
        }
    }
}

pub fn typing_indicator() -> Markup {
    html! {
        div class="message-row bot typing" aria-label="Assistant is typing" {
            div class="bubble bot" {
                span class="dot" {}
                span class="dot" {}
                span class="dot" {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_menu_has_no_outside_layer() {
        let html = profile_menu(false, "alice").into_string();
        assert!(html.contains("/profile-menu/toggle"));
        assert!(!html.contains("/click"));
    }

    #[test]
    fn test_open_menu_lists_actions() {
        let html = profile_menu(true, "alice").into_string();
        assert!(html.contains("alice@hoh.com"));
        assert!(html.contains("/profile-menu/action/settings"));
        assert!(html.contains("/profile-menu/action/signout"));
        assert!(html.contains(r#"value="outside""#));
    }

    #[test]
    fn test_message_text_is_escaped() {
        let message = Message {
            id: crate::conversation::MessageId::new(1),
            text: "<script>alert(1)</script>".to_string(),
            sender: Sender::User,
            timestamp: chrono::Utc::now(),
            attachments: Default::default(),
        };
        let html = message_bubble(&message).into_string();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
