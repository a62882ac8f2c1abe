//! Conversation state and reply bookkeeping.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::message::{Message, MessageId, Sender};
use crate::error::Rejection;

/// Welcome text seeded into every new conversation.
pub const DEFAULT_GREETING: &str = "Hello! I'm HOH MIS Assistant. How can I help you with your management information needs today?";

/// Text of the simulated bot reply.
pub const DEFAULT_CANNED_REPLY: &str = "I understand your query about the MIS system. Let me fetch the relevant information for you. This might take a moment as I'm accessing the database...";

/// Fixed texts the simulated assistant speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantScript {
    /// First bot message of every conversation.
    pub greeting: String,
    /// Body of every simulated reply.
    pub canned_reply: String,
}

impl Default for AssistantScript {
    fn default() -> Self {
        Self {
            greeting: DEFAULT_GREETING.to_string(),
            canned_reply: DEFAULT_CANNED_REPLY.to_string(),
        }
    }
}

/// Handle for one in-flight simulated reply.
///
/// A ticket only resolves against the conversation instance and generation
/// that issued it. Re-mounting the chat screen creates a new instance;
/// [`ConversationStore::reset_conversation`] starts a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ReplyTicket {
    /// Instance that scheduled the reply.
    pub conversation: Uuid,
    /// Generation of that instance at scheduling time.
    pub generation: u64,
}

/// Render input for the chat view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSnapshot {
    pub id: Uuid,
    pub messages: Vec<Message>,
    pub pending_reply: bool,
}

/// One conversation: ordered messages plus at most one pending reply.
///
/// The store is pure state. Scheduling only hands out a [`ReplyTicket`];
/// the caller owns the timer and feeds the ticket back through
/// [`ConversationStore::complete_reply`] once the delay has elapsed.
#[derive(Debug)]
pub struct ConversationStore {
    id: Uuid,
    generation: u64,
    messages: Vec<Message>,
    pending: Option<ReplyTicket>,
    next_id: u64,
    script: Arc<AssistantScript>,
}

impl ConversationStore {
    /// Create a conversation already seeded with the welcome message.
    #[must_use]
    pub fn new(script: Arc<AssistantScript>) -> Self {
        let mut store = Self {
            id: Uuid::new_v4(),
            generation: 0,
            messages: Vec::new(),
            pending: None,
            next_id: 1,
            script,
        };
        store.initialize();
        store
    }

    /// Instance identity of this conversation.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current generation; bumped by every reset.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Messages in display order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether a simulated reply is in flight.
    #[must_use]
    pub fn pending_reply(&self) -> bool {
        self.pending.is_some()
    }

    /// The in-flight reply, if any.
    #[must_use]
    pub fn pending_ticket(&self) -> Option<ReplyTicket> {
        self.pending
    }

    /// Seed the welcome message. No-op when messages already exist.
    pub fn initialize(&mut self) {
        if self.messages.is_empty() {
            let greeting = self.script.greeting.clone();
            self.push(Sender::Bot, greeting);
        }
    }

    /// Append a user message and schedule a reply if none is in flight.
    ///
    /// Returns the ticket of a newly scheduled reply, or `None` when a reply
    /// was already pending. The input text is stored verbatim; only the
    /// emptiness check trims it.
    pub fn send_user_message(&mut self, text: &str) -> Result<Option<ReplyTicket>, Rejection> {
        if text.trim().is_empty() {
            return Err(Rejection::EmptyMessage);
        }

        let id = self.push(Sender::User, text);
        tracing::debug!(
            name: "conversation.message.sent",
            conversation = %self.id,
            message_id = %id,
            "User message appended"
        );

        Ok(self.schedule_reply())
    }

    /// Mark a reply as pending and return its ticket.
    ///
    /// Returns `None` if a reply is already in flight; at most one reply is
    /// pending per conversation.
    pub fn schedule_reply(&mut self) -> Option<ReplyTicket> {
        if self.pending.is_some() {
            return None;
        }

        let ticket = ReplyTicket {
            conversation: self.id,
            generation: self.generation,
        };
        self.pending = Some(ticket);
        Some(ticket)
    }

    /// Resolve a pending reply by appending the canned bot message.
    ///
    /// Tickets from another instance, an earlier generation, or an already
    /// resolved reply are rejected as [`Rejection::StaleReply`] and change
    /// nothing.
    pub fn complete_reply(&mut self, ticket: ReplyTicket) -> Result<&Message, Rejection> {
        if self.pending != Some(ticket) {
            return Err(Rejection::StaleReply);
        }

        self.pending = None;
        let reply = self.script.canned_reply.clone();
        let id = self.push(Sender::Bot, reply);
        tracing::debug!(
            name: "conversation.reply.appended",
            conversation = %self.id,
            message_id = %id,
            "Bot reply appended"
        );

        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Start over: drop all messages, cancel the pending reply and re-seed
    /// the welcome message.
    ///
    /// Returns the ticket that was cancelled, if any, so the owner can stop
    /// its timer.
    pub fn reset_conversation(&mut self) -> Option<ReplyTicket> {
        let cancelled = self.pending.take();
        self.messages.clear();
        self.generation += 1;
        self.initialize();
        cancelled
    }

    /// Copy of the render inputs.
    #[must_use]
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            id: self.id,
            messages: self.messages.clone(),
            pending_reply: self.pending_reply(),
        }
    }

    fn push(&mut self, sender: Sender, text: impl Into<String>) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        self.messages.push(Message::new(id, sender, text));
        id
    }
}
