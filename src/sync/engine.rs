//! Synchronization engine: drives the polling timers and applies their results.
//!
//! Network calls run in spawned tokio tasks that report back through an mpsc
//! channel as `SyncEvent` values. The owner of the engine (the TUI loop)
//! receives those events and hands them to [`SyncEngine::apply`], so all state
//! mutation happens on one task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use super::poll::PollTask;
use super::state::{MessagesOutcome, SyncState};
use crate::api::{ApiError, ChatApi};
use crate::models::{Conversation, Message};

/// Results reported by background tasks.
#[derive(Debug)]
pub enum SyncEvent {
    Conversations(Result<Vec<Conversation>, ApiError>),
    Messages {
        conversation_id: String,
        result: Result<Vec<Message>, ApiError>,
    },
    MessageSent {
        conversation_id: String,
        result: Result<Message, ApiError>,
    },
    MarkedRead {
        conversation_id: String,
        result: Result<(), ApiError>,
    },
}

/// What an applied event changed, for the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncUpdate {
    /// Nothing visible changed (stale result, read receipt, send for a
    /// conversation that is no longer active).
    Unchanged,
    ConversationsRefreshed,
    MessagesRefreshed,
    /// The backend accepted the pending message; the input can be cleared.
    MessageSent,
    /// The pending message was not sent; the input should be kept.
    SendFailed,
}

/// Receiving half of the engine's event channel.
pub struct SyncEvents {
    rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl SyncEvents {
    /// Wait for the next background result. Designed for `tokio::select!`.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        self.rx.recv().await
    }

    /// Take an already-delivered event without waiting.
    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<SyncEvent> {
        self.rx.try_recv().ok()
    }
}

pub struct SyncEngine<A: ChatApi> {
    api: Arc<A>,
    state: SyncState,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
    interval: Duration,
    conversation_poll: Option<PollTask>,
    message_poll: Option<PollTask>,
}

impl<A: ChatApi> SyncEngine<A> {
    /// Create an engine polling every `interval`. Nothing runs until [`start`].
    ///
    /// [`start`]: SyncEngine::start
    pub fn new(api: Arc<A>, interval: Duration) -> (Self, SyncEvents) {
        let (events_tx, rx) = mpsc::unbounded_channel();
        let engine = Self {
            api,
            state: SyncState::default(),
            events_tx,
            interval,
            conversation_poll: None,
            message_poll: None,
        };
        (engine, SyncEvents { rx })
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Arm the conversation refresh (first tick is immediate).
    pub fn start(&mut self) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        self.conversation_poll = Some(PollTask::spawn(
            "conversations",
            self.interval,
            move || {
                let api = Arc::clone(&api);
                let tx = tx.clone();
                async move {
                    let result = api.list_conversations().await;
                    let _ = tx.send(SyncEvent::Conversations(result));
                }
            },
        ));
    }

    /// Cancel both timers. No polling request is issued afterwards.
    ///
    /// A send or read receipt already in flight is left to finish.
    pub fn shutdown(&mut self) {
        self.conversation_poll = None;
        self.message_poll = None;
        tracing::info!("Polling stopped");
    }

    /// Apply one background result to the state.
    pub fn apply(&mut self, event: SyncEvent) -> SyncUpdate {
        match event {
            SyncEvent::Conversations(result) => {
                if let Some(selected) = self.state.apply_conversations(result) {
                    tracing::info!("Auto-selected conversation {}", selected);
                    self.arm_message_poll();
                }
                SyncUpdate::ConversationsRefreshed
            }
            SyncEvent::Messages {
                conversation_id,
                result,
            } => match self.state.apply_messages(&conversation_id, result) {
                MessagesOutcome::Applied => {
                    self.spawn_mark_read(conversation_id);
                    SyncUpdate::MessagesRefreshed
                }
                MessagesOutcome::Failed => SyncUpdate::MessagesRefreshed,
                MessagesOutcome::Stale => SyncUpdate::Unchanged,
            },
            SyncEvent::MessageSent {
                conversation_id,
                result,
            } => {
                tracing::debug!("Send to {} completed", conversation_id);
                let sent = self.state.finish_send(result);
                // The draft on screen belongs to whatever is active now.
                if !self.state.conversations.is_active(&conversation_id) {
                    SyncUpdate::Unchanged
                } else if sent {
                    SyncUpdate::MessageSent
                } else {
                    SyncUpdate::SendFailed
                }
            }
            SyncEvent::MarkedRead {
                conversation_id,
                result,
            } => {
                match result {
                    Ok(()) => tracing::debug!("Marked {} as read", conversation_id),
                    Err(e) => tracing::warn!(
                        "Error marking conversation {} as read: {}",
                        conversation_id,
                        e
                    ),
                }
                SyncUpdate::Unchanged
            }
        }
    }

    /// Make a conversation active and re-arm the message refresh for it.
    ///
    /// Returns false if it was already active or is unknown.
    pub fn select(&mut self, conversation_id: &str) -> bool {
        if !self.state.select(conversation_id) {
            return false;
        }
        tracing::info!("Selected conversation {}", conversation_id);
        self.arm_message_poll();
        true
    }

    /// Submit a message for the active conversation.
    ///
    /// Blank content and submits while another send is in flight are ignored.
    /// Returns true if a request was started.
    pub fn submit(&mut self, content: &str) -> bool {
        let Some(request) = self.state.begin_send(content) else {
            return false;
        };

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api
                .send_message(&request.conversation_id, &request.content)
                .await;
            let _ = tx.send(SyncEvent::MessageSent {
                conversation_id: request.conversation_id,
                result,
            });
        });
        true
    }

    /// Replace the message timer with one for the current selection.
    fn arm_message_poll(&mut self) {
        // Drop first so the old timer is cancelled even if nothing is active.
        self.message_poll = None;

        let Some(conversation_id) = self.state.conversations.active_id().map(String::from) else {
            return;
        };

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let name = format!("messages:{}", conversation_id);
        self.message_poll = Some(PollTask::spawn(name, self.interval, move || {
            let api = Arc::clone(&api);
            let tx = tx.clone();
            let conversation_id = conversation_id.clone();
            async move {
                let result = api.list_messages(&conversation_id).await;
                let _ = tx.send(SyncEvent::Messages {
                    conversation_id,
                    result,
                });
            }
        }));
    }

    /// Best-effort read receipt; the outcome only gets logged.
    fn spawn_mark_read(&self, conversation_id: String) {
        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.mark_read(&conversation_id).await;
            let _ = tx.send(SyncEvent::MarkedRead {
                conversation_id,
                result,
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fake::{conversation, message, Call, FakeApi};
    use std::sync::atomic::Ordering;

    const INTERVAL: Duration = Duration::from_secs(120);

    fn engine_with(api: FakeApi) -> (Arc<FakeApi>, SyncEngine<FakeApi>, SyncEvents) {
        let api = Arc::new(api);
        let (engine, events) = SyncEngine::new(Arc::clone(&api), INTERVAL);
        (api, engine, events)
    }

    fn two_conversations() -> FakeApi {
        let api = FakeApi::with_conversations(vec![
            conversation("c1", "John"),
            conversation("c2", "Amy"),
        ]);
        api.set_messages("c1", vec![message("a1", "c1", "2024-01-01T10:00:00Z")]);
        api.set_messages("c2", vec![message("b1", "c2", "2024-01-01T11:00:00Z")]);
        api
    }

    /// Receive the next event and apply it.
    async fn step(engine: &mut SyncEngine<FakeApi>, events: &mut SyncEvents) -> SyncUpdate {
        let event = events.recv().await.expect("event channel open");
        engine.apply(event)
    }

    /// Run the startup sequence: conversations, first messages, read receipt.
    async fn boot(engine: &mut SyncEngine<FakeApi>, events: &mut SyncEvents) {
        engine.start();
        assert_eq!(step(engine, events).await, SyncUpdate::ConversationsRefreshed);
        assert_eq!(step(engine, events).await, SyncUpdate::MessagesRefreshed);
        assert_eq!(step(engine, events).await, SyncUpdate::Unchanged);
    }

    fn message_ids(engine: &SyncEngine<FakeApi>) -> Vec<String> {
        engine
            .state()
            .messages
            .items()
            .iter()
            .map(|m| m.id.clone())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_selects_first_and_marks_read() {
        let (api, mut engine, mut events) = engine_with(two_conversations());

        boot(&mut engine, &mut events).await;

        assert_eq!(engine.state().conversations.active_id(), Some("c1"));
        assert_eq!(message_ids(&engine), vec!["a1"]);
        assert_eq!(
            api.calls(),
            vec![
                Call::ListConversations,
                Call::ListMessages("c1".to_string()),
                Call::MarkRead("c1".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_again_after_interval() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(api.count(&Call::ListConversations), 2);
        assert_eq!(api.count(&Call::ListMessages("c1".to_string())), 2);

        // Drain the refreshed results; each message refresh marks read once.
        while let Some(event) = events.try_recv() {
            engine.apply(event);
        }
        step(&mut engine, &mut events).await;
        assert_eq!(api.count(&Call::MarkRead("c1".to_string())), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_rearms_message_poll() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;

        assert!(engine.select("c2"));
        assert!(engine.state().messages.items().is_empty());
        assert_eq!(step(&mut engine, &mut events).await, SyncUpdate::MessagesRefreshed);
        assert_eq!(message_ids(&engine), vec!["b1"]);

        // Only c2 is polled from now on.
        tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
        assert_eq!(api.count(&Call::ListMessages("c1".to_string())), 1);
        assert_eq!(api.count(&Call::ListMessages("c2".to_string())), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reselecting_active_is_noop() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;

        assert!(!engine.select("c1"));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.count(&Call::ListMessages("c1".to_string())), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_messages_event_discarded() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;
        engine.select("c2");
        step(&mut engine, &mut events).await;
        step(&mut engine, &mut events).await;

        // A's fetch completes after B became active.
        let update = engine.apply(SyncEvent::Messages {
            conversation_id: "c1".to_string(),
            result: Ok(vec![message("late", "c1", "2024-01-01T09:00:00Z")]),
        });

        assert_eq!(update, SyncUpdate::Unchanged);
        assert_eq!(message_ids(&engine), vec!["b1"]);
        assert_eq!(api.count(&Call::MarkRead("c1".to_string())), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_for_previous_selection_never_lands() {
        let api = two_conversations();
        api.set_message_delay("c1", Duration::from_secs(30));
        let (api, mut engine, mut events) = engine_with(api);

        engine.start();
        step(&mut engine, &mut events).await;
        // Let c1's slow fetch get in flight, then switch.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(api.count(&Call::ListMessages("c1".to_string())), 1);
        engine.select("c2");

        assert_eq!(step(&mut engine, &mut events).await, SyncUpdate::MessagesRefreshed);
        tokio::time::sleep(Duration::from_secs(60)).await;
        while let Some(event) = events.try_recv() {
            engine.apply(event);
        }

        assert_eq!(engine.state().conversations.active_id(), Some("c2"));
        assert_eq!(message_ids(&engine), vec!["b1"]);
        assert_eq!(api.count(&Call::MarkRead("c1".to_string())), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_submit_makes_no_call() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;

        assert!(!engine.submit(""));
        assert!(!engine.submit("   "));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(api
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::Send(_, _))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_submit_sends_once() {
        let api = two_conversations();
        api.set_send_delay(Duration::from_secs(2));
        let (api, mut engine, mut events) = engine_with(api);
        boot(&mut engine, &mut events).await;

        assert!(engine.submit("hello"));
        assert!(!engine.submit("hello"));
        assert!(engine.state().is_sending());

        assert_eq!(step(&mut engine, &mut events).await, SyncUpdate::MessageSent);
        assert_eq!(
            api.count(&Call::Send("c1".to_string(), "hello".to_string())),
            1
        );
        assert!(!engine.state().is_sending());
        // No local echo: the thread is unchanged until the next refresh.
        assert_eq!(message_ids(&engine), vec!["a1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_landing_after_switch_is_not_reported() {
        let api = two_conversations();
        api.set_send_delay(Duration::from_secs(2));
        let (_api, mut engine, mut events) = engine_with(api);
        boot(&mut engine, &mut events).await;

        assert!(engine.submit("hello"));
        assert!(engine.select("c2"));

        let update = loop {
            let event = events.recv().await.expect("event channel open");
            let sent = matches!(event, SyncEvent::MessageSent { .. });
            let update = engine.apply(event);
            if sent {
                break update;
            }
        };

        assert_eq!(update, SyncUpdate::Unchanged);
        assert!(!engine.state().is_sending());
        assert!(engine.submit("next"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_is_not_visible() {
        let api = two_conversations();
        api.fail_send.store(true, Ordering::SeqCst);
        let (_api, mut engine, mut events) = engine_with(api);
        boot(&mut engine, &mut events).await;

        assert!(engine.submit("hello"));
        assert_eq!(step(&mut engine, &mut events).await, SyncUpdate::SendFailed);
        assert_eq!(engine.state().error(), None);
        assert!(!engine.state().is_sending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_read_failure_is_harmless() {
        let api = two_conversations();
        api.fail_mark_read.store(true, Ordering::SeqCst);
        let (api, mut engine, mut events) = engine_with(api);

        boot(&mut engine, &mut events).await;

        assert_eq!(api.count(&Call::MarkRead("c1".to_string())), 1);
        assert_eq!(message_ids(&engine), vec!["a1"]);
        assert_eq!(engine.state().error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_message_fetch_skips_mark_read() {
        let api = two_conversations();
        api.fail_messages.store(true, Ordering::SeqCst);
        let (api, mut engine, mut events) = engine_with(api);

        engine.start();
        step(&mut engine, &mut events).await;
        step(&mut engine, &mut events).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(engine.state().error(), Some("Failed to load messages"));
        assert_eq!(api.count(&Call::MarkRead("c1".to_string())), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_conversation_failure_sets_flag() {
        let api = two_conversations();
        api.fail_conversations.store(true, Ordering::SeqCst);
        let (_api, mut engine, mut events) = engine_with(api);

        engine.start();
        step(&mut engine, &mut events).await;

        assert!(!engine.state().is_loading());
        assert_eq!(engine.state().error(), Some("Failed to load conversations"));
        assert_eq!(engine.state().conversations.active_id(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;
        let before = api.calls().len();

        engine.shutdown();
        tokio::time::sleep(INTERVAL * 5).await;

        assert_eq!(api.calls().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let (api, mut engine, mut events) = engine_with(two_conversations());
        boot(&mut engine, &mut events).await;
        let before = api.calls().len();

        drop(engine);
        tokio::time::sleep(INTERVAL * 5).await;

        assert_eq!(api.calls().len(), before);
    }
}
