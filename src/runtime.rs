//! Process-wide owner of the [`Shell`] and its reply timers.
//!
//! All transitions go through one mutex, so intents and timer callbacks are
//! applied one at a time in arrival order. A reply timer is a spawned task
//! that sleeps for the configured delay and then hands its ticket back to
//! the shell. Timers are cancelled when their conversation is reset or
//! discarded; if a timer still fires late, the shell rejects the ticket as
//! stale and nothing changes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::conversation::{AssistantScript, ReplyTicket};
use crate::events::ShellEvent;
use crate::shell::{Effect, Intent, Shell, ShellSnapshot};

/// Buffered events per subscriber before it starts lagging.
const EVENT_BUFFER: usize = 64;

/// Cloneable handle to the running shell.
#[derive(Debug, Clone)]
pub struct ShellHandle {
    inner: Arc<ShellHandleInner>,
}

#[derive(Debug)]
struct ShellHandleInner {
    state: Mutex<RuntimeState>,
    events: broadcast::Sender<ShellEvent>,
    reply_delay: Duration,
}

#[derive(Debug)]
struct RuntimeState {
    shell: Shell,
    revision: u64,
    timers: HashMap<ReplyTicket, CancellationToken>,
}

impl ShellHandle {
    /// Create a signed-out shell. Replies arrive `reply_delay` after the
    /// message that triggered them.
    #[must_use]
    pub fn new(script: AssistantScript, reply_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            inner: Arc::new(ShellHandleInner {
                state: Mutex::new(RuntimeState {
                    shell: Shell::new(Arc::new(script)),
                    revision: 0,
                    timers: HashMap::new(),
                }),
                events,
                reply_delay,
            }),
        }
    }

    /// Apply an intent and return the resulting render inputs.
    ///
    /// Must be called from within a Tokio runtime, since sending a message
    /// spawns the reply timer.
    pub fn dispatch(&self, intent: Intent) -> ShellSnapshot {
        let mut state = self.lock();
        let before = state.shell.snapshot();
        let effects = state.shell.dispatch(intent);

        for effect in effects {
            match effect {
                Effect::ScheduleReply(ticket) => self.schedule(&mut state, ticket),
                Effect::CancelReply(ticket) => {
                    if let Some(token) = state.timers.remove(&ticket) {
                        token.cancel();
                    }
                }
            }
        }

        let after = state.shell.snapshot();
        if after != before {
            state.revision += 1;
            self.publish(ShellEvent::StateChanged {
                revision: state.revision,
                snapshot: after.clone(),
            });
        }
        after
    }

    /// Current render inputs.
    #[must_use]
    pub fn snapshot(&self) -> ShellSnapshot {
        self.lock().shell.snapshot()
    }

    /// Number of accepted changes so far.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    /// The current state as a `state.changed` event, read under one lock.
    #[must_use]
    pub fn current_event(&self) -> ShellEvent {
        let state = self.lock();
        ShellEvent::StateChanged {
            revision: state.revision,
            snapshot: state.shell.snapshot(),
        }
    }

    /// Reply timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.lock().timers.len()
    }

    /// Live outside-click listeners across all screens.
    #[must_use]
    pub fn active_listeners(&self) -> usize {
        self.lock().shell.listeners().active()
    }

    /// Subscribe to state-change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.inner.events.subscribe()
    }

    /// Configured reply delay.
    #[must_use]
    pub fn reply_delay(&self) -> Duration {
        self.inner.reply_delay
    }

    fn schedule(&self, state: &mut RuntimeState, ticket: ReplyTicket) {
        let token = CancellationToken::new();
        state.timers.insert(ticket, token.clone());

        let handle = self.clone();
        let delay = self.inner.reply_delay;
        // The deadline is fixed here, not when the task is first polled.
        let sleep = tokio::time::sleep(delay);
        tracing::debug!(
            name: "conversation.reply.scheduled",
            conversation = %ticket.conversation,
            generation = ticket.generation,
            delay_ms = delay.as_millis(),
            "Reply scheduled"
        );

        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!(
                        name: "conversation.reply.cancelled",
                        conversation = %ticket.conversation,
                        "Reply timer cancelled"
                    );
                }
                () = sleep => handle.deliver(ticket),
            }
        });
    }

    fn deliver(&self, ticket: ReplyTicket) {
        let mut state = self.lock();
        state.timers.remove(&ticket);

        if let Err(rejection) = state.shell.complete_reply(ticket) {
            tracing::debug!(
                name: "conversation.reply.dropped",
                conversation = %ticket.conversation,
                reason = %rejection,
                "Stale reply dropped"
            );
            return;
        }

        state.revision += 1;
        let snapshot = state.shell.snapshot();
        if let Some(message) = snapshot
            .conversation
            .as_ref()
            .and_then(|c| c.messages.last())
        {
            tracing::info!(
                name: "conversation.reply.delivered",
                conversation = %ticket.conversation,
                message_id = %message.id,
                "Reply delivered"
            );
            self.publish(ShellEvent::ReplyDelivered {
                revision: state.revision,
                conversation: ticket.conversation,
                message: message.clone(),
            });
        }
        self.publish(ShellEvent::StateChanged {
            revision: state.revision,
            snapshot,
        });
    }

    // No subscribers is not an error.
    fn publish(&self, event: ShellEvent) {
        let _ = self.inner.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Sender;
    use crate::session::{Credentials, Page};

    const DELAY: Duration = Duration::from_millis(1500);

    fn in_chat() -> ShellHandle {
        let handle = ShellHandle::new(AssistantScript::default(), DELAY);
        handle.dispatch(Intent::SignIn(Credentials::new("alice", "pw")));
        handle.dispatch(Intent::Navigate(Page::Chat));
        handle
    }

    fn message_count(handle: &ShellHandle) -> usize {
        handle.snapshot().conversation.unwrap().messages.len()
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_arrives_after_delay() {
        let handle = in_chat();

        let snapshot = handle.dispatch(Intent::SendMessage("hello".into()));
        let conversation = snapshot.conversation.unwrap();
        assert!(conversation.pending_reply);
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(handle.pending_timers(), 1);

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(message_count(&handle), 2);

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;

        let conversation = handle.snapshot().conversation.unwrap();
        assert!(!conversation.pending_reply);
        assert_eq!(conversation.messages.len(), 3);
        assert_eq!(conversation.messages[2].sender, Sender::Bot);
        assert_eq!(handle.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_double_send_yields_one_reply() {
        let handle = in_chat();

        handle.dispatch(Intent::SendMessage("one".into()));
        handle.dispatch(Intent::SendMessage("two".into()));
        assert_eq!(handle.pending_timers(), 1);

        tokio::time::sleep(DELAY * 3).await;
        settle().await;

        let messages = handle.snapshot().conversation.unwrap().messages;
        assert_eq!(messages.len(), 4);
        let bots = messages.iter().filter(|m| m.sender == Sender::Bot).count();
        assert_eq!(bots, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_before_delay_drops_reply() {
        let handle = in_chat();
        handle.dispatch(Intent::SendMessage("hello".into()));

        handle.dispatch(Intent::NewChat);
        assert_eq!(handle.pending_timers(), 0);

        tokio::time::sleep(DELAY * 2).await;
        settle().await;

        let conversation = handle.snapshot().conversation.unwrap();
        assert_eq!(conversation.messages.len(), 1);
        assert!(!conversation.pending_reply);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_chat_drops_reply() {
        let handle = in_chat();
        handle.dispatch(Intent::SendMessage("hello".into()));
        handle.dispatch(Intent::Navigate(Page::Dashboard));
        handle.dispatch(Intent::Navigate(Page::Chat));

        tokio::time::sleep(DELAY * 2).await;
        settle().await;

        assert_eq!(message_count(&handle), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_revisions() {
        let handle = in_chat();
        let mut rx = handle.subscribe();
        let start = handle.revision();

        handle.dispatch(Intent::SendMessage("hello".into()));
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ShellEvent::StateChanged { .. }));
        assert_eq!(first.revision(), start + 1);

        let delivered = rx.recv().await.unwrap();
        match delivered {
            ShellEvent::ReplyDelivered { revision, message, .. } => {
                assert_eq!(revision, start + 2);
                assert_eq!(message.sender, Sender::Bot);
            }
            other => panic!("expected reply, got {other:?}"),
        }
        let changed = rx.recv().await.unwrap();
        assert_eq!(changed.revision(), start + 2);
    }

    #[tokio::test]
    async fn test_rejected_intent_does_not_bump_revision() {
        let handle = ShellHandle::new(AssistantScript::default(), DELAY);
        let before = handle.revision();

        handle.dispatch(Intent::Navigate(Page::Chat));
        handle.dispatch(Intent::SignIn(Credentials::new("", "pw")));

        assert_eq!(handle.revision(), before);
        assert_eq!(handle.snapshot().session.current_page, Page::SignIn);
    }
}
