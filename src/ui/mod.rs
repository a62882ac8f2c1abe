//! Server-rendered views.
//!
//! Views are pure functions of a [`ShellSnapshot`]: they draw state and emit
//! forms that post intents back to the server. Nothing in here mutates
//! state.
//!
//! # Structure
//!
//! - [`components`]: header, sidebar, profile menu, message bubbles
//! - [`pages`]: one view per page

pub mod components;
pub mod pages;

use maud::{DOCTYPE, Markup, html};

use crate::preferences::Preferences;
use crate::session::Page;
use crate::shell::ShellSnapshot;
use components::MAIN_ID;

/// Seconds between reloads while a reply is pending and scripts are off.
const NOSCRIPT_REFRESH_SECS: u64 = 2;

/// Full HTML document for the current page.
pub fn render_page(snapshot: &ShellSnapshot, brand: &str) -> String {
    let title = match snapshot.session.current_page {
        Page::SignIn => "Sign In",
        Page::Dashboard => "Dashboard",
        Page::Chat => "Chat",
        Page::Settings => "Settings",
    };

    let reply_pending = snapshot
        .conversation
        .as_ref()
        .is_some_and(|conversation| conversation.pending_reply);

    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - " (brand) }
                @if reply_pending {
                    // Without the SSE extension, poll until the reply lands.
                    noscript {
                        meta http-equiv="refresh" content=(NOSCRIPT_REFRESH_SECS);
                    }
                }

                // Local scripts only (no CDN)
                script src="/static/vendor/htmx-2.0.8.min.js" {}
                script src="/static/vendor/htmx-sse.js" {}
                link rel="stylesheet" href="/static/app.css";
            }
            body {
                // Replies arrive after the request that caused them, so the
                // main fragment is refreshed when one is delivered.
                div id="live" hx-ext="sse" sse-connect="/api/events"
                    hx-get="/fragment"
                    hx-trigger="sse:reply.delivered"
                    hx-target={ "#" (MAIN_ID) }
                    hx-swap="outerHTML" {}
                (main_markup(snapshot, brand))
            }
        }
    };

    markup.into_string()
}

/// Just the `#app-main` element, for HTMX swaps.
pub fn render_main_fragment(snapshot: &ShellSnapshot, brand: &str) -> String {
    main_markup(snapshot, brand).into_string()
}

fn main_markup(snapshot: &ShellSnapshot, brand: &str) -> Markup {
    let username = snapshot.session.username.as_deref().unwrap_or_default();
    let flags = snapshot.ui.unwrap_or_default();

    let body = match (snapshot.session.current_page, &snapshot.conversation) {
        (Page::SignIn, _) => pages::sign_in(brand),
        (Page::Dashboard, _) => pages::dashboard(brand, flags, username),
        (Page::Chat, Some(conversation)) => pages::chat(brand, flags, username, conversation),
        // Chat is always mounted with a conversation.
        (Page::Chat, None) => pages::dashboard(brand, flags, username),
        (Page::Settings, _) => {
            let preferences = snapshot
                .preferences
                .clone()
                .unwrap_or_else(|| Preferences::for_user(username));
            pages::settings(brand, flags, username, &preferences)
        }
    };

    html! {
        main id=(MAIN_ID) data-page=(snapshot.session.current_page.as_str()) {
            (body)
        }
    }
}
