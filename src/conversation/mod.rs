//! Conversation state for the chat screen.
//!
//! A conversation is an ordered, append-only list of messages plus the flag
//! for a simulated reply in flight. It is owned by one chat-screen instance
//! and discarded with it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hoh_mis_assistant::conversation::{AssistantScript, ConversationStore, Sender};
//!
//! let mut store = ConversationStore::new(Arc::new(AssistantScript::default()));
//! let ticket = store.send_user_message("hello").unwrap().unwrap();
//! assert!(store.pending_reply());
//!
//! store.complete_reply(ticket).unwrap();
//! assert_eq!(store.messages().len(), 3);
//! assert_eq!(store.messages()[2].sender, Sender::Bot);
//! ```

mod message;
mod store;

pub use message::{Attachment, Message, MessageId, Sender};
pub use store::{
    AssistantScript, ConversationSnapshot, ConversationStore, DEFAULT_CANNED_REPLY,
    DEFAULT_GREETING, ReplyTicket,
};
