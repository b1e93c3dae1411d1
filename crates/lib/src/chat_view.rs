//! ChatView: the message list, the draft input, and the one operation that sends it.
//!
//! `submit` echoes the draft into the list, clears it, and spawns the request on a tokio
//! runtime. Results come back over an mpsc channel and are applied only by [`ChatView::poll`]
//! or [`ChatView::wait_for_responses`], on whichever thread owns the view. Completion handling
//! is therefore serialized with the UI's own state changes.
//!
//! Requests are neither cancelled nor sequenced: the input stays submittable while replies are
//! outstanding, and replies are appended in completion order, which can differ from send order.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::api::{ChatError, ChatTransport};
use crate::message::Message;

/// Sequence number of a submitted request (starts at 1). Used to correlate log lines.
pub type RequestId = u64;

type Notify = Arc<dyn Fn() + Send + Sync>;

struct Completion {
    id: RequestId,
    result: Result<String, ChatError>,
}

pub struct ChatView {
    /// Transcript in send/receive order. Append-only.
    messages: Vec<Message>,
    /// Text currently in the input field.
    draft_input: String,
    transport: Arc<dyn ChatTransport>,
    runtime: Handle,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    next_request: RequestId,
    /// Requests spawned whose completion has not been applied yet.
    in_flight: usize,
    /// Requests whose completion was a failure (shown as the error entry).
    failed: usize,
    /// Called from the runtime after a completion is queued (e.g. request a repaint).
    notify: Option<Notify>,
}

impl ChatView {
    pub fn new(transport: Arc<dyn ChatTransport>, runtime: Handle) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            messages: Vec::new(),
            draft_input: String::new(),
            transport,
            runtime,
            completion_tx,
            completion_rx,
            next_request: 1,
            in_flight: 0,
            failed: 0,
            notify: None,
        }
    }

    pub fn with_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft_input(&self) -> &str {
        &self.draft_input
    }

    /// Mutable access for a text widget bound to the input field.
    pub fn draft_input_mut(&mut self) -> &mut String {
        &mut self.draft_input
    }

    pub fn set_draft_input(&mut self, text: impl Into<String>) {
        self.draft_input = text.into();
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Number of applied completions that failed. A reply whose text happens to equal the error
    /// entry does not count.
    pub fn failed_requests(&self) -> usize {
        self.failed
    }

    /// Send the draft. No-op (returns None, nothing spawned) when the draft is blank after trimming.
    ///
    /// The user entry is appended and the draft cleared before this returns; the raw, untrimmed
    /// text is what gets posted.
    pub fn submit(&mut self) -> Option<RequestId> {
        if self.draft_input.trim().is_empty() {
            return None;
        }
        let text = self.draft_input.clone();
        self.messages.push(Message::user(text.clone()));
        self.draft_input.clear();

        let id = self.next_request;
        self.next_request += 1;
        self.in_flight += 1;
        log::debug!("chat request {} submitted ({} bytes)", id, text.len());

        let transport = Arc::clone(&self.transport);
        let tx = self.completion_tx.clone();
        let notify = self.notify.clone();
        let request = self
            .runtime
            .spawn(async move { transport.send(&text).await });
        self.runtime.spawn(async move {
            // A panicking transport still yields a completion.
            let result = match request.await {
                Ok(result) => result,
                Err(e) => Err(ChatError::Aborted(e.to_string())),
            };
            let _ = tx.send(Completion { id, result });
            if let Some(notify) = notify {
                notify();
            }
        });
        Some(id)
    }

    /// Apply every completion that has already arrived. Never blocks. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it. Returns false when nothing is outstanding.
    pub async fn wait_for_next(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is outstanding.
    pub async fn wait_for_responses(&mut self) {
        while self.wait_for_next().await {}
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion.result {
            Ok(reply) => {
                log::debug!("chat request {} answered ({} bytes)", completion.id, reply.len());
                self.messages.push(Message::remote(reply));
            }
            Err(e) => {
                log::error!("chat request {} failed: {}", completion.id, e);
                self.failed += 1;
                self.messages.push(Message::error());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Answers every message immediately from a closure and records what was sent.
    struct ScriptedTransport {
        sent: Mutex<Vec<String>>,
        reply: Box<dyn Fn(&str) -> Result<String, ChatError> + Send + Sync>,
    }

    impl ScriptedTransport {
        fn new(reply: impl Fn(&str) -> Result<String, ChatError> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                reply: Box::new(reply),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            self.sent.lock().unwrap().push(message.to_string());
            (self.reply)(message)
        }
    }

    /// Holds each message until the test releases it, so completion order is test-controlled.
    #[derive(Default)]
    struct GatedTransport {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<String, ChatError>>>>,
    }

    impl GatedTransport {
        fn gate(&self, message: &str) -> oneshot::Sender<Result<String, ChatError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(message.to_string(), rx);
            tx
        }
    }

    #[async_trait]
    impl ChatTransport for GatedTransport {
        async fn send(&self, message: &str) -> Result<String, ChatError> {
            let rx = self
                .gates
                .lock()
                .unwrap()
                .remove(message)
                .expect("no gate registered for message");
            rx.await.expect("gate dropped")
        }
    }

    fn malformed() -> ChatError {
        ChatError::Malformed(serde_json::from_str::<serde_json::Value>("nope").unwrap_err())
    }

    #[tokio::test]
    async fn submit_then_success_appends_reply_after_user_entry() {
        let transport = ScriptedTransport::new(|_| Ok("hello there".to_string()));
        let mut view = ChatView::new(transport.clone(), Handle::current());
        view.set_draft_input("hi");

        assert_eq!(view.submit(), Some(1));
        assert_eq!(view.messages(), &[Message::user("hi")]);
        assert_eq!(view.draft_input(), "");

        view.wait_for_responses().await;
        assert_eq!(
            view.messages(),
            &[Message::user("hi"), Message::remote("hello there")]
        );
        assert_eq!(transport.sent(), vec!["hi".to_string()]);
        assert_eq!(view.in_flight(), 0);
    }

    #[tokio::test]
    async fn blank_draft_is_a_no_op() {
        let transport = ScriptedTransport::new(|_| Ok("unused".to_string()));
        let mut view = ChatView::new(transport.clone(), Handle::current());

        for draft in ["", "   ", "\t\n "] {
            view.set_draft_input(draft);
            assert_eq!(view.submit(), None);
            assert_eq!(view.draft_input(), draft);
        }
        tokio::task::yield_now().await;
        view.wait_for_responses().await;

        assert!(view.messages().is_empty());
        assert_eq!(view.in_flight(), 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn untrimmed_text_is_echoed_and_sent() {
        let transport = ScriptedTransport::new(|m| Ok(format!("echo:{}", m)));
        let mut view = ChatView::new(transport.clone(), Handle::current());
        view.set_draft_input("  spaced  ");
        view.submit();
        view.wait_for_responses().await;

        assert_eq!(view.messages()[0], Message::user("  spaced  "));
        assert_eq!(view.messages()[1], Message::remote("echo:  spaced  "));
        assert_eq!(transport.sent(), vec!["  spaced  ".to_string()]);
    }

    #[tokio::test]
    async fn http_error_appends_error_entry() {
        let transport = ScriptedTransport::new(|_| {
            Err(ChatError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            })
        });
        let mut view = ChatView::new(transport, Handle::current());
        view.set_draft_input("hi");
        view.submit();
        view.wait_for_responses().await;

        assert_eq!(view.messages(), &[Message::user("hi"), Message::error()]);
    }

    #[tokio::test]
    async fn parse_error_appends_error_entry() {
        let transport = ScriptedTransport::new(|_| Err(malformed()));
        let mut view = ChatView::new(transport, Handle::current());
        view.set_draft_input("hi");
        view.submit();
        view.wait_for_responses().await;

        assert_eq!(view.messages(), &[Message::user("hi"), Message::error()]);
        assert_eq!(view.failed_requests(), 1);
    }

    struct PanickingTransport;

    #[async_trait]
    impl ChatTransport for PanickingTransport {
        async fn send(&self, _message: &str) -> Result<String, ChatError> {
            panic!("transport blew up");
        }
    }

    #[tokio::test]
    async fn panicking_transport_appends_error_entry() {
        let mut view = ChatView::new(Arc::new(PanickingTransport), Handle::current());
        view.set_draft_input("hi");
        view.submit();

        tokio::time::timeout(std::time::Duration::from_secs(2), view.wait_for_responses())
            .await
            .expect("completion never arrived");
        assert_eq!(view.messages(), &[Message::user("hi"), Message::error()]);
        assert_eq!(view.in_flight(), 0);
        assert_eq!(view.failed_requests(), 1);
    }

    #[tokio::test]
    async fn reply_reading_error_text_is_not_a_failure() {
        let transport = ScriptedTransport::new(|_| Ok(crate::ERROR_TEXT.to_string()));
        let mut view = ChatView::new(transport, Handle::current());
        view.set_draft_input("say it");
        view.submit();
        view.wait_for_responses().await;

        assert_eq!(view.messages()[1], Message::remote("Error."));
        assert_eq!(view.failed_requests(), 0);
    }

    #[tokio::test]
    async fn user_entry_is_visible_before_reply_resolves() {
        let transport = Arc::new(GatedTransport::default());
        let release = transport.gate("hi");
        let mut view = ChatView::new(transport.clone(), Handle::current());
        view.set_draft_input("hi");
        view.submit();

        tokio::task::yield_now().await;
        assert_eq!(view.poll(), 0);
        assert_eq!(view.messages(), &[Message::user("hi")]);
        assert_eq!(view.draft_input(), "");
        assert_eq!(view.in_flight(), 1);

        release.send(Ok("hello".to_string())).unwrap();
        view.wait_for_responses().await;
        assert_eq!(view.messages(), &[Message::user("hi"), Message::remote("hello")]);
    }

    #[tokio::test]
    async fn replies_are_appended_in_completion_order() {
        let transport = Arc::new(GatedTransport::default());
        let first = transport.gate("first");
        let second = transport.gate("second");
        let mut view = ChatView::new(transport.clone(), Handle::current());

        view.set_draft_input("first");
        assert_eq!(view.submit(), Some(1));
        view.set_draft_input("second");
        assert_eq!(view.submit(), Some(2));
        assert_eq!(view.in_flight(), 2);

        second.send(Ok("reply to second".to_string())).unwrap();
        assert!(view.wait_for_next().await);
        first.send(Err(malformed())).unwrap();
        view.wait_for_responses().await;

        assert_eq!(
            view.messages(),
            &[
                Message::user("first"),
                Message::user("second"),
                Message::remote("reply to second"),
                Message::error(),
            ]
        );
    }

    #[tokio::test]
    async fn poll_applies_arrived_completions_and_notifies() {
        let transport = ScriptedTransport::new(|m| Ok(m.to_uppercase()));
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let mut view = ChatView::new(transport, Handle::current()).with_notify(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        view.set_draft_input("a");
        view.submit();
        view.set_draft_input("b");
        view.submit();

        while notified.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(view.poll(), 2);
        assert_eq!(view.in_flight(), 0);
        assert_eq!(view.messages().len(), 4);
        assert!(view.messages()[2..].iter().all(|m| !m.is_user));
    }

    #[tokio::test]
    async fn wait_for_next_without_requests_returns_false() {
        let transport = ScriptedTransport::new(|_| Ok(String::new()));
        let mut view = ChatView::new(transport, Handle::current());
        assert!(!view.wait_for_next().await);
    }
}
