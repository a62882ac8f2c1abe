//! One view per page. Each takes the snapshot pieces it needs and nothing
//! else.

use maud::{Markup, html};

use super::components::{MAIN_ID, header, intent_button, message_bubble, sidebar, typing_indicator};
use crate::conversation::ConversationSnapshot;
use crate::preferences::Preferences;
use crate::ui_state::UiFlags;

pub fn sign_in(brand: &str) -> Markup {
    html! {
        section class="signin" {
            div class="card signin-card" {
                div class="signin-logo" { "🤖" }
                h1 { (brand) }
                p class="muted" { "Sign in to your account" }

                form class="signin-form" method="post" action="/signin"
                    hx-post="/signin"
                    hx-target={ "#" (MAIN_ID) }
                    hx-swap="outerHTML" {
                    label for="username" { "Username" }
                    input id="username" type="text" name="username"
                        placeholder="Enter your username" required;

                    label for="password" { "Password" }
                    input id="password" type="password" name="password"
                        placeholder="Enter your password" required;

                    label class="checkbox" {
                        input type="checkbox" name="remember_me" value="on";
                        " Remember me"
                    }

                    button type="submit" class="btn-primary" { "Sign In" }
                }

                p class="muted small" { "Secure access to the Management Information System" }
            }
        }
    }
}

pub fn dashboard(brand: &str, flags: UiFlags, username: &str) -> Markup {
    html! {
        div class="screen" {
            (sidebar(flags.sidebar_open))
            div class="screen-body" {
                (header(brand, flags, username, false))
                section class="card welcome" {
                    h2 { "Welcome to " (brand) "! 👋" }
                    p {
                        "Your intelligent assistant for Housing & Habitat Management Information System. "
                        "Get instant insights, generate reports, track project status, and access all your "
                        "MIS data through natural conversation."
                    }
                    (intent_button("/navigate/chat", "btn-primary", html! { "Start New Chat" }))
                }
            }
        }
    }
}

pub fn chat(brand: &str, flags: UiFlags, username: &str, conversation: &ConversationSnapshot) -> Markup {
    html! {
        div class="screen" data-conversation=(conversation.id.to_string()) {
            (sidebar(flags.sidebar_open))
            div class="screen-body chat" {
                (header(brand, flags, username, false))
                div class="messages" id="messages" {
                    @for message in &conversation.messages {
                        (message_bubble(message))
                    }
                    @if conversation.pending_reply {
                        (typing_indicator())
                    }
                }
                form class="composer" method="post" action="/chat/messages"
                    hx-post="/chat/messages"
                    hx-target={ "#" (MAIN_ID) }
                    hx-swap="outerHTML" {
                    textarea name="text" rows="1"
                        placeholder="Type your message here..."
                        hx-post="/chat/keypress"
                        hx-trigger="keydown[key=='Enter'&&!shiftKey]"
                        hx-vals="{\"key\":\"Enter\",\"shift\":\"false\"}"
                        hx-include="closest form"
                        hx-target={ "#" (MAIN_ID) }
                        hx-swap="outerHTML" {}
                    button type="submit" class="btn-primary send" aria-label="Send" { "➤" }
                }
            }
        }
    }
}

pub fn settings(brand: &str, flags: UiFlags, username: &str, preferences: &Preferences) -> Markup {
    html! {
        div class="screen" {
            (sidebar(flags.sidebar_open))
            div class="screen-body" {
                (header("Settings", flags, username, true))
                form class="card settings" method="post" action="/settings/preferences"
                    hx-post="/settings/preferences"
                    hx-target={ "#" (MAIN_ID) }
                    hx-swap="outerHTML" {
                    h2 { "Profile" }
                    label for="display_name" { "Display name" }
                    input id="display_name" type="text" name="display_name" value=(preferences.display_name);
                    label for="email" { "Email" }
                    input id="email" type="email" name="email" value=(preferences.email);

                    h2 { "Preferences" }
                    label class="checkbox" {
                        input type="checkbox" name="dark_mode" value="on" checked[preferences.dark_mode];
                        " Dark mode"
                    }
                    label class="checkbox" {
                        input type="checkbox" name="notifications" value="on" checked[preferences.notifications];
                        " Notifications"
                    }

                    button type="submit" class="btn-primary" { "Save Changes" }
                }
                p class="muted small" { (brand) }
            }
        }
    }
}
