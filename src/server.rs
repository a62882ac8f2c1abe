use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{
        Html, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::preferences::Preferences;
use crate::session::{Credentials, Page};
use crate::shell::{Intent, MenuAction, ShellSnapshot};
use crate::ui;
use crate::ui_state::ClickTarget;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> Result<(), AppError> {
    info!(
        name: "assistant.config.loaded",
        assistant = %config.assistant.name,
        reply_delay_ms = config.assistant.reply_delay_ms,
        "Assistant configuration loaded"
    );

    let state = AppState::new(Arc::clone(&config));
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// All routes: pages, render inputs, the event stream and one route per
/// intent.
pub fn router(state: AppState) -> Router {
    Router::new()
        // HTML pages
        .route("/", get(index_handler))
        .route("/fragment", get(fragment_handler))
        // Render inputs
        .route("/api/state", get(api_state))
        .route("/api/events", get(api_events))
        // Intents
        .route("/signin", post(sign_in))
        .route("/signout", post(sign_out))
        .route("/navigate/{page}", post(navigate))
        .route("/sidebar/toggle", post(toggle_sidebar))
        .route("/profile-menu/toggle", post(toggle_profile_menu))
        .route("/profile-menu/close", post(close_profile_menu))
        .route("/profile-menu/action/{action}", post(profile_menu_action))
        .route("/click", post(click))
        .route("/chat/new", post(new_chat))
        .route("/chat/messages", post(send_message))
        .route("/chat/keypress", post(key_press))
        .route("/settings/preferences", post(update_preferences))
        // Static assets
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Full document for the current page.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    Html(ui::render_page(
        &state.shell.snapshot(),
        &state.config.assistant.name,
    ))
}

/// GET /fragment - The main element only.
async fn fragment_handler(State(state): State<AppState>) -> Html<String> {
    Html(ui::render_main_fragment(
        &state.shell.snapshot(),
        &state.config.assistant.name,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Render Input Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/state - Current render inputs as JSON.
async fn api_state(State(state): State<AppState>) -> Json<ShellSnapshot> {
    Json(state.shell.snapshot())
}

/// GET /api/events - State changes as Server-Sent Events.
///
/// The stream opens with the current state so a client never starts blind.
async fn api_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let mut rx = state.shell.subscribe();
    let current = state.shell.current_event();

    let stream = async_stream::stream! {
        yield Ok(current.to_sse());
        loop {
            match rx.recv().await {
                Ok(event) => yield Ok(event.to_sse()),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        name: "events.lagged",
                        skipped = skipped,
                        "Event subscriber lagged"
                    );
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Intent Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Sign-in form body. `remember_me` is a checkbox: present means checked.
#[derive(Deserialize)]
struct SignInForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    remember_me: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageForm {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct KeyPressForm {
    key: String,
    #[serde(default)]
    shift: bool,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ClickForm {
    target: ClickTarget,
}

#[derive(Debug, Deserialize)]
struct PreferencesForm {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    dark_mode: Option<String>,
    #[serde(default)]
    notifications: Option<String>,
}

/// POST /signin
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> Response {
    let credentials = Credentials {
        username: form.username,
        password: form.password,
        remember_me: form.remember_me.is_some(),
    };
    apply(&state, &headers, Intent::SignIn(credentials))
}

/// POST /signout
async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    apply(&state, &headers, Intent::SignOut)
}

/// POST /navigate/{page}
async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(page): Path<String>,
) -> Response {
    match page.parse::<Page>() {
        Ok(page) => apply(&state, &headers, Intent::Navigate(page)),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /sidebar/toggle
async fn toggle_sidebar(State(state): State<AppState>, headers: HeaderMap) -> Response {
    apply(&state, &headers, Intent::ToggleSidebar)
}

/// POST /profile-menu/toggle
async fn toggle_profile_menu(State(state): State<AppState>, headers: HeaderMap) -> Response {
    apply(&state, &headers, Intent::ToggleProfileMenu)
}

/// POST /profile-menu/close
async fn close_profile_menu(State(state): State<AppState>, headers: HeaderMap) -> Response {
    apply(&state, &headers, Intent::CloseProfileMenu)
}

/// POST /profile-menu/action/{action}
async fn profile_menu_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(action): Path<String>,
) -> Response {
    match action.parse::<MenuAction>() {
        Ok(action) => apply(&state, &headers, Intent::MenuAction(action)),
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /click - Outside-click observer input.
async fn click(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ClickForm>,
) -> Response {
    apply(&state, &headers, Intent::Click(form.target))
}

/// POST /chat/new
async fn new_chat(State(state): State<AppState>, headers: HeaderMap) -> Response {
    apply(&state, &headers, Intent::NewChat)
}

/// POST /chat/messages
async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<MessageForm>,
) -> Response {
    apply(&state, &headers, Intent::SendMessage(form.text))
}

/// POST /chat/keypress
async fn key_press(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<KeyPressForm>,
) -> Response {
    apply(
        &state,
        &headers,
        Intent::KeyPress {
            key: form.key,
            shift: form.shift,
            text: form.text,
        },
    )
}

/// POST /settings/preferences
async fn update_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<PreferencesForm>,
) -> Response {
    let preferences = Preferences {
        display_name: form.display_name,
        email: form.email,
        dark_mode: form.dark_mode.is_some(),
        notifications: form.notifications.is_some(),
    };
    apply(&state, &headers, Intent::UpdatePreferences(preferences))
}

/// Dispatch and answer: HTMX requests get the new main fragment, plain form
/// posts are redirected back to the page.
fn apply(state: &AppState, headers: &HeaderMap, intent: Intent) -> Response {
    let snapshot = state.shell.dispatch(intent);

    if headers.contains_key("hx-request") {
        Html(ui::render_main_fragment(
            &snapshot,
            &state.config.assistant.name,
        ))
        .into_response()
    } else {
        Redirect::to("/").into_response()
    }
}
