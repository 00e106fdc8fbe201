//! The transcript reducer: one chat session, one turn in flight at a time.

use std::sync::Arc;

use civic_stream::decode_stream;
use civic_types::{
    ChatRequest, ConversationEntry, Language, SessionState, StreamEvent, TransportError,
    ValidationError,
};
use futures::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::client::ChatTransport;
use crate::config::ChatConfig;
use crate::transcript::Transcript;

/// What happened to an accepted turn.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The reply stream ended normally.
    Completed,
    /// The turn failed; the transcript carries the localized error entry.
    Failed(TransportError),
    /// The session was torn down mid-turn; the transcript was left untouched.
    Abandoned,
}

impl TurnOutcome {
    /// Whether the reply stream ended normally.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Render view published after every transcript mutation.
///
/// Committed entries are shared with the session rather than copied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Committed entries.
    pub history: Arc<Vec<ConversationEntry>>,
    /// The assistant reply still growing, if any.
    pub pending: Option<ConversationEntry>,
    /// Session state at the time of the snapshot.
    pub session: SessionState,
}

impl SessionSnapshot {
    /// All entries in order, pending reply last.
    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.history.iter().chain(self.pending.as_ref())
    }

    /// The last entry.
    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.pending.as_ref().or_else(|| self.history.last())
    }
}

/// One step of a running turn.
enum Step {
    Event(StreamEvent),
    Failed(TransportError),
    Ended,
    TornDown,
}

/// Owns a transcript and its session state across turns.
///
/// [`submit`](Self::submit) runs a whole turn. The turn is also available as
/// its parts, [`begin`](Self::begin), [`apply`](Self::apply) and
/// [`fail`](Self::fail), for callers that drive the reply stream themselves.
pub struct ChatSession<T> {
    transport: T,
    config: ChatConfig,
    transcript: Transcript,
    state: SessionState,
    /// Full reply text of the current turn.
    accumulator: String,
    abort: CancellationToken,
    teardown: CancellationToken,
    updates: watch::Sender<SessionSnapshot>,
}

impl<T> ChatSession<T> {
    /// Create an empty session.
    pub fn new(transport: T, config: ChatConfig) -> Self {
        let (updates, _) = watch::channel(SessionSnapshot::default());
        Self {
            transport,
            config,
            transcript: Transcript::new(),
            state: SessionState::default(),
            accumulator: String::new(),
            abort: CancellationToken::new(),
            teardown: CancellationToken::new(),
            updates,
        }
    }

    /// The transcript so far.
    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Conversation id, department and streaming flag.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Active session language.
    #[must_use]
    pub fn language(&self) -> Language {
        self.config.language
    }

    /// Switch the session language for subsequent requests and error messages.
    pub fn set_language(&mut self, language: Language) {
        self.config.language = language;
    }

    /// Receive a [`SessionSnapshot`] after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Token that aborts the in-flight turn when cancelled.
    ///
    /// An aborted turn takes the failure path with [`TransportError::Aborted`].
    /// A cancelled token is replaced as soon as the turn it aborted ends, and
    /// a token cancelled between turns is replaced when the next turn begins,
    /// so fetch a fresh handle for each turn.
    #[must_use]
    pub fn abort_handle(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Token that tears the session down when cancelled.
    ///
    /// After teardown the in-flight read is abandoned, nothing in the session
    /// changes any more, and new submissions are rejected.
    #[must_use]
    pub fn teardown_handle(&self) -> CancellationToken {
        self.teardown.clone()
    }

    /// Whether the session has not been torn down.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.teardown.is_cancelled()
    }

    /// Start a new chat session: empty transcript, no pinned conversation.
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.state = SessionState::default();
        self.accumulator.clear();
        self.abort = CancellationToken::new();
        self.publish();
        tracing::debug!("civic.session.reset");
    }

    /// Accept a submission and open its turn.
    ///
    /// Appends the user entry and an empty assistant placeholder, marks the
    /// session as streaming, and returns the request body to send. Nothing is
    /// mutated when the submission is rejected.
    pub fn begin(&mut self, text: &str) -> Result<ChatRequest, ValidationError> {
        if !self.is_live() {
            return Err(ValidationError::SessionClosed);
        }
        if self.state.is_streaming {
            return Err(ValidationError::TurnInFlight);
        }
        if text.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = text.chars().count();
        if len > self.config.max_message_chars {
            return Err(ValidationError::TooLong {
                len,
                max: self.config.max_message_chars,
            });
        }

        if self.abort.is_cancelled() {
            self.abort = CancellationToken::new();
        }
        self.transcript.push(ConversationEntry::user(text));
        self.transcript.open_pending();
        self.accumulator.clear();
        self.state.is_streaming = true;
        self.publish();

        tracing::debug!(
            chars = len,
            conversation_id = ?self.state.conversation_id,
            language = %self.config.language,
            "civic.turn.begin"
        );

        Ok(ChatRequest {
            message: text.to_string(),
            conversation_id: self.state.conversation_id.clone(),
            language: self.config.language,
        })
    }

    /// Apply one decoded event to the running turn.
    ///
    /// Events arriving outside a turn are ignored.
    pub fn apply(&mut self, event: StreamEvent) {
        if !self.is_live() {
            return;
        }
        if !self.state.is_streaming {
            tracing::debug!(?event, "civic.turn.event_outside_turn");
            return;
        }

        match event {
            StreamEvent::Metadata {
                conversation_id,
                department,
            } => {
                match &self.state.conversation_id {
                    _ if conversation_id.is_empty() => {
                        tracing::debug!("civic.turn.empty_conversation_id");
                    }
                    None => {
                        tracing::debug!(conversation_id = %conversation_id, "civic.turn.conversation_pinned");
                        self.state.conversation_id = Some(conversation_id);
                    }
                    Some(current) if *current != conversation_id => {
                        tracing::warn!(
                            current = %current,
                            received = %conversation_id,
                            "civic.turn.conversation_id_conflict"
                        );
                    }
                    Some(_) => {}
                }
                if department.is_some() {
                    self.state.department = department;
                }
            }
            StreamEvent::TextChunk { text } => {
                self.accumulator.push_str(&text);
                if !self.transcript.replace_pending(&self.accumulator) {
                    tracing::warn!("civic.turn.no_pending_entry");
                }
            }
            StreamEvent::Terminal => {
                self.finish_turn();
                tracing::debug!(chars = self.accumulator.len(), "civic.turn.completed");
                return;
            }
        }
        self.publish();
    }

    /// End the running turn with a localized error entry.
    ///
    /// An untouched placeholder is replaced by the message; partial text
    /// already shown is kept and the message is appended after it.
    pub fn fail(&mut self, error: &TransportError) {
        if !self.is_live() || !self.state.is_streaming {
            return;
        }
        tracing::warn!(
            error = %error,
            retryable = error.is_retryable(),
            "civic.turn.failed"
        );

        let message = self.config.language.turn_failed_message();
        let placeholder_untouched = self
            .transcript
            .pending()
            .is_some_and(|entry| entry.content.is_empty());
        if placeholder_untouched {
            self.transcript.replace_pending(message);
        } else {
            self.transcript.push(ConversationEntry::assistant(message));
        }
        self.finish_turn();
    }

    fn finish_turn(&mut self) {
        self.transcript.commit();
        self.state.is_streaming = false;
        if self.abort.is_cancelled() {
            self.abort = CancellationToken::new();
        }
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(SessionSnapshot {
            history: self.transcript.history(),
            pending: self.transcript.pending().cloned(),
            session: self.state.clone(),
        });
    }
}

impl<T: ChatTransport> ChatSession<T> {
    /// Run one turn: submit `text`, stream the reply into the transcript.
    ///
    /// Only the submission itself can be rejected. Transport failures, aborts
    /// and broken streams end the turn through [`fail`](Self::fail) and are
    /// reported as [`TurnOutcome::Failed`].
    ///
    /// Dropping the returned future mid-turn (a timeout, a losing `select!`
    /// branch) fails the turn with [`TransportError::Aborted`], so the session
    /// accepts the next submission right away.
    pub async fn submit(&mut self, text: &str) -> Result<TurnOutcome, ValidationError> {
        let request = self.begin(text)?;
        let mut turn = TurnGuard(self);
        let outcome = turn.0.drive(request).await;
        Ok(outcome)
    }

    async fn drive(&mut self, request: ChatRequest) -> TurnOutcome {
        let abort = self.abort.clone();
        let teardown = self.teardown.clone();

        let opened = tokio::select! {
            biased;
            () = teardown.cancelled() => None,
            () = abort.cancelled() => Some(Err(TransportError::Aborted)),
            result = self.transport.open(request) => Some(result),
        };
        let body = match opened {
            _ if !self.is_live() => return self.abandoned(),
            None => return self.abandoned(),
            Some(Err(error)) => return self.fail_turn(error),
            Some(Ok(body)) => body,
        };

        let mut events = std::pin::pin!(decode_stream(body));
        loop {
            let step = tokio::select! {
                biased;
                () = teardown.cancelled() => Step::TornDown,
                () = abort.cancelled() => Step::Failed(TransportError::Aborted),
                next = events.next() => match next {
                    Some(Ok(event)) => Step::Event(event),
                    Some(Err(error)) => Step::Failed(error),
                    None => Step::Ended,
                },
            };
            if !self.is_live() {
                return self.abandoned();
            }

            match step {
                Step::Event(event) => self.apply(event),
                Step::Failed(error) => return self.fail_turn(error),
                Step::Ended => {
                    self.apply(StreamEvent::Terminal);
                    return TurnOutcome::Completed;
                }
                Step::TornDown => return self.abandoned(),
            }
        }
    }

    fn fail_turn(&mut self, error: TransportError) -> TurnOutcome {
        self.fail(&error);
        TurnOutcome::Failed(error)
    }

    fn abandoned(&self) -> TurnOutcome {
        tracing::debug!(entries = self.transcript.len(), "civic.turn.abandoned");
        TurnOutcome::Abandoned
    }
}

/// Fails a turn whose `submit` future was dropped before it finished.
struct TurnGuard<'a, T>(&'a mut ChatSession<T>);

impl<T> Drop for TurnGuard<'_, T> {
    fn drop(&mut self) {
        let session = &mut *self.0;
        if session.is_live() && session.state.is_streaming {
            tracing::debug!("civic.turn.dropped");
            session.fail(&TransportError::Aborted);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoTransport;

    fn session() -> ChatSession<NoTransport> {
        ChatSession::new(NoTransport, ChatConfig::default())
    }

    fn contents(s: &ChatSession<NoTransport>) -> Vec<String> {
        s.transcript().entries().map(|e| e.content.clone()).collect()
    }

    #[test]
    fn begin_appends_user_and_placeholder() {
        let mut s = session();
        let request = s.begin("hello").unwrap();
        assert_eq!(request.message, "hello");
        assert_eq!(request.conversation_id, None);
        assert_eq!(request.language, Language::En);
        assert_eq!(contents(&s), vec!["hello", ""]);
        assert!(s.state().is_streaming);
    }

    #[test]
    fn chunks_accumulate_into_placeholder() {
        let mut s = session();
        s.begin("hello").unwrap();
        s.apply(StreamEvent::text("Hi "));
        s.apply(StreamEvent::text("there"));
        s.apply(StreamEvent::Terminal);
        assert_eq!(
            s.transcript().last(),
            Some(&ConversationEntry::assistant("Hi there"))
        );
        assert!(!s.state().is_streaming);
    }

    #[test]
    fn empty_and_blank_submissions_are_rejected() {
        let mut s = session();
        assert_eq!(s.begin(""), Err(ValidationError::Empty));
        assert_eq!(s.begin("   \n\t"), Err(ValidationError::Empty));
        assert!(s.transcript().is_empty());
        assert!(!s.state().is_streaming);
    }

    #[test]
    fn overlong_submission_is_rejected() {
        let mut s = ChatSession::new(NoTransport, ChatConfig::default().max_message_chars(5));
        assert_eq!(
            s.begin("ñandú!"),
            Err(ValidationError::TooLong { len: 6, max: 5 })
        );
        assert!(s.begin("ñandú").is_ok());
    }

    #[test]
    fn second_begin_while_streaming_is_rejected() {
        let mut s = session();
        s.begin("first").unwrap();
        s.apply(StreamEvent::text("partial"));
        let before = s.transcript().clone();
        assert_eq!(s.begin("second"), Err(ValidationError::TurnInFlight));
        assert_eq!(s.transcript(), &before);
    }

    #[test]
    fn first_conversation_id_wins() {
        let mut s = session();
        s.begin("q1").unwrap();
        s.apply(StreamEvent::Metadata {
            conversation_id: "abc".into(),
            department: Some("Utilities".into()),
        });
        s.apply(StreamEvent::Metadata {
            conversation_id: "xyz".into(),
            department: None,
        });
        assert_eq!(s.state().conversation_id.as_deref(), Some("abc"));
        assert_eq!(s.state().department.as_deref(), Some("Utilities"));
    }

    #[test]
    fn pinned_conversation_is_sent_on_next_turn() {
        let mut s = session();
        s.begin("q1").unwrap();
        s.apply(StreamEvent::Metadata {
            conversation_id: "abc".into(),
            department: None,
        });
        s.apply(StreamEvent::Terminal);
        let request = s.begin("q2").unwrap();
        assert_eq!(request.conversation_id.as_deref(), Some("abc"));
    }

    #[test]
    fn failure_replaces_untouched_placeholder() {
        let mut s = session();
        s.begin("hello").unwrap();
        let count = s.transcript().len();
        s.fail(&TransportError::Status {
            status: 500,
            body: String::new(),
        });
        assert_eq!(s.transcript().len(), count);
        assert_eq!(
            s.transcript().last().unwrap().content,
            Language::En.turn_failed_message()
        );
        assert!(!s.state().is_streaming);
    }

    #[test]
    fn failure_after_partial_text_appends_error() {
        let mut s = session();
        s.set_language(Language::Es);
        s.begin("hola").unwrap();
        s.apply(StreamEvent::text("Claro, "));
        s.fail(&TransportError::Stream("reset".into()));
        assert_eq!(
            contents(&s),
            vec![
                "hola".to_string(),
                "Claro, ".to_string(),
                Language::Es.turn_failed_message().to_string(),
            ]
        );
    }

    #[test]
    fn events_outside_a_turn_are_ignored() {
        let mut s = session();
        s.apply(StreamEvent::text("stray"));
        s.apply(StreamEvent::Metadata {
            conversation_id: "abc".into(),
            department: None,
        });
        assert!(s.transcript().is_empty());
        assert!(s.state().conversation_id.is_none());
    }

    #[test]
    fn reset_starts_a_new_session() {
        let mut s = session();
        s.begin("q1").unwrap();
        s.apply(StreamEvent::Metadata {
            conversation_id: "abc".into(),
            department: Some("Parks".into()),
        });
        s.apply(StreamEvent::Terminal);
        s.reset();
        assert!(s.transcript().is_empty());
        assert_eq!(s.state(), &SessionState::default());
    }

    #[test]
    fn torn_down_session_rejects_submissions() {
        let mut s = session();
        s.teardown_handle().cancel();
        assert!(!s.is_live());
        assert_eq!(s.begin("hello"), Err(ValidationError::SessionClosed));
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn subscribers_see_growing_reply() {
        let mut s = session();
        let rx = s.subscribe();
        s.begin("hello").unwrap();
        s.apply(StreamEvent::text("Hi"));
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.last().unwrap().content, "Hi");
        assert_eq!(snapshot.entries().count(), 2);
        assert!(snapshot.session.is_streaming);
    }

    #[test]
    fn empty_conversation_id_is_not_pinned() {
        let mut s = session();
        s.begin("q1").unwrap();
        s.apply(StreamEvent::Metadata {
            conversation_id: String::new(),
            department: Some("Parks".into()),
        });
        s.apply(StreamEvent::Metadata {
            conversation_id: "abc".into(),
            department: None,
        });
        s.apply(StreamEvent::Terminal);
        assert_eq!(s.state().conversation_id.as_deref(), Some("abc"));
        assert_eq!(s.state().department.as_deref(), Some("Parks"));
    }

    #[test]
    fn empty_conversation_id_is_sent_as_null() {
        let mut s = session();
        s.begin("q1").unwrap();
        s.apply(StreamEvent::Metadata {
            conversation_id: String::new(),
            department: None,
        });
        s.apply(StreamEvent::Terminal);
        assert_eq!(s.begin("q2").unwrap().conversation_id, None);
    }

    #[test]
    fn manual_driver_cannot_mutate_after_teardown() {
        let mut s = session();
        s.begin("hello").unwrap();
        s.apply(StreamEvent::text("Hi"));
        s.teardown_handle().cancel();
        let before = s.transcript().clone();

        s.apply(StreamEvent::text(" there"));
        s.apply(StreamEvent::Metadata {
            conversation_id: "abc".into(),
            department: None,
        });
        s.fail(&TransportError::Aborted);
        s.apply(StreamEvent::Terminal);

        assert_eq!(s.transcript(), &before);
        assert!(s.state().conversation_id.is_none());
        assert!(s.state().is_streaming);
    }

    #[test]
    fn finished_turn_refreshes_cancelled_abort_token() {
        let mut s = session();
        s.begin("hello").unwrap();
        let first = s.abort_handle();
        first.cancel();
        s.fail(&TransportError::Aborted);
        let second = s.abort_handle();
        assert!(!second.is_cancelled());
        assert!(first.is_cancelled());
    }
}
