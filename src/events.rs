//! State-change events pushed to connected views.
//!
//! Every accepted transition bumps the runtime revision and produces one
//! [`ShellEvent::StateChanged`]. A delivered bot reply additionally produces
//! [`ShellEvent::ReplyDelivered`] first, so a view can animate the new
//! bubble before re-rendering.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hoh_mis_assistant::conversation::AssistantScript;
//! use hoh_mis_assistant::events::{ShellEvent, event_name};
//! use hoh_mis_assistant::shell::Shell;
//!
//! let shell = Shell::new(Arc::new(AssistantScript::default()));
//! let event = ShellEvent::StateChanged {
//!     revision: 1,
//!     snapshot: shell.snapshot(),
//! };
//! assert_eq!(event_name(&event), "state.changed");
//! ```

use axum::response::sse::Event;
use serde::Serialize;
use uuid::Uuid;

use crate::conversation::Message;
use crate::shell::ShellSnapshot;

/// Events broadcast by the runtime.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ShellEvent {
    /// Render inputs after a change.
    #[serde(rename = "state.changed")]
    StateChanged {
        revision: u64,
        snapshot: ShellSnapshot,
    },

    /// A simulated reply was appended.
    #[serde(rename = "reply.delivered")]
    ReplyDelivered {
        revision: u64,
        conversation: Uuid,
        message: Message,
    },
}

impl ShellEvent {
    /// Revision the event belongs to.
    #[must_use]
    pub fn revision(&self) -> u64 {
        match self {
            ShellEvent::StateChanged { revision, .. }
            | ShellEvent::ReplyDelivered { revision, .. } => *revision,
        }
    }

    /// Frame as an SSE event named after the variant.
    #[must_use]
    pub fn to_sse(&self) -> Event {
        let json = serde_json::to_string(self).unwrap_or_else(|e| {
            serde_json::json!({ "type": "error", "data": { "message": e.to_string() } })
                .to_string()
        });

        Event::default()
            .event(event_name(self))
            .id(self.revision().to_string())
            .data(json)
    }
}

/// SSE event name for a [`ShellEvent`].
#[must_use]
pub fn event_name(evt: &ShellEvent) -> &'static str {
    match evt {
        ShellEvent::StateChanged { .. } => "state.changed",
        ShellEvent::ReplyDelivered { .. } => "reply.delivered",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::conversation::AssistantScript;
    use crate::shell::Shell;

    #[test]
    fn test_state_changed_serialization() {
        let shell = Shell::new(Arc::new(AssistantScript::default()));
        let event = ShellEvent::StateChanged {
            revision: 4,
            snapshot: shell.snapshot(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "state.changed");
        assert_eq!(json["data"]["revision"], 4);
        assert_eq!(json["data"]["snapshot"]["session"]["current_page"], "signin");
        assert_eq!(event.revision(), 4);
    }
}
