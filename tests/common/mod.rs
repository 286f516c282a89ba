//! Mock collaborators for end-to-end session tests.
//!
//! The transport is scripted: tests push [`ChatEvent`]s through the sender
//! it exposes after `start`, and assert on the messages the registry sent
//! back. Settings, notifications, and the host announcer record every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use sharkpool::{
    ChatEvent, ChatMessage, ChatTransport, HostAnnouncer, LoadingHandle, NameRegistry,
    NotificationSink, SettingsStore, TransportError,
};

/// Transport whose event stream is driven by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    event_tx: Mutex<Option<mpsc::UnboundedSender<ChatEvent>>>,
    pub sent: Mutex<Vec<(String, String)>>,
    pub joined: Mutex<Vec<String>>,
    /// When set, `start` fails outright.
    pub refuse_connections: bool,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A transport whose `start` always fails, for connect-error paths.
    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            refuse_connections: true,
            ..Self::default()
        })
    }

    /// Inject an inbound event, as the chat network would. Events emitted
    /// after the session loop has wound down are dropped, like a network
    /// read racing a disconnect.
    pub fn emit(&self, event: ChatEvent) {
        let guard = self.event_tx.lock().unwrap();
        let tx = guard.as_ref().expect("transport not started");
        let _ = tx.send(event);
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn start(
        &self,
        _username: &str,
        _token: &str,
        _cancel: CancellationToken,
    ) -> Result<mpsc::UnboundedReceiver<ChatEvent>, TransportError> {
        if self.refuse_connections {
            return Err(TransportError::Connect("scripted refusal".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.event_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn join_channel(&self, channel: &str) -> Result<(), TransportError> {
        self.joined.lock().unwrap().push(channel.to_owned());
        Ok(())
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_owned(), text.to_owned()));
        Ok(())
    }
}

/// In-memory settings store with recorded blacklist writes.
#[derive(Default)]
pub struct MemorySettings {
    pub checkboxes: Mutex<HashMap<String, bool>>,
    pub lists: Mutex<HashMap<String, Vec<String>>>,
    pub combos: Mutex<HashMap<String, String>>,
    pub inputs: Mutex<HashMap<String, String>>,
    pub single_writes: Mutex<Vec<(String, String, String)>>,
    pub full_writes: Mutex<Vec<(String, HashMap<String, String>)>>,
}

impl MemorySettings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_checkbox(&self, key: &str, value: bool) {
        self.checkboxes.lock().unwrap().insert(key.to_owned(), value);
    }

    pub fn set_list(&self, key: &str, names: &[&str]) {
        self.lists
            .lock()
            .unwrap()
            .insert(key.to_owned(), names.iter().map(|n| n.to_string()).collect());
    }

    pub fn set_combo(&self, key: &str, value: &str) {
        self.combos
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }

    pub fn set_input(&self, key: &str, value: &str) {
        self.inputs
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
    }
}

impl SettingsStore for MemorySettings {
    fn checkbox(&self, key: &str) -> bool {
        self.checkboxes
            .lock()
            .unwrap()
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    fn names_list(&self, key: &str) -> Vec<String> {
        self.lists
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn set_value(&self, key: &str, name: &str, value: &str) {
        self.single_writes.lock().unwrap().push((
            key.to_owned(),
            name.to_owned(),
            value.to_owned(),
        ));
    }

    fn set_all_values(&self, key: &str, values: HashMap<String, String>) {
        self.full_writes
            .lock()
            .unwrap()
            .push((key.to_owned(), values));
    }

    fn combo_selection(&self, key: &str) -> String {
        self.combos
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn text_input(&self, key: &str) -> String {
        self.inputs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

/// Notification sink that counts everything it is shown.
#[derive(Default)]
pub struct RecordingNotifier {
    pub loading_shown: Mutex<Vec<String>>,
    pub loading_closed: Arc<Mutex<usize>>,
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

pub struct CountingHandle {
    closed: Arc<Mutex<usize>>,
}

impl LoadingHandle for CountingHandle {
    fn close(self: Box<Self>) {
        *self.closed.lock().unwrap() += 1;
    }
}

impl NotificationSink for RecordingNotifier {
    fn show_loading(&self, text: &str) -> Box<dyn LoadingHandle> {
        self.loading_shown.lock().unwrap().push(text.to_owned());
        Box::new(CountingHandle {
            closed: Arc::clone(&self.loading_closed),
        })
    }

    fn show_success(&self, text: &str) {
        self.successes.lock().unwrap().push(text.to_owned());
    }

    fn show_error(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_owned());
    }
}

/// Host announcer that records broadcasts; `in_world` is a toggle.
pub struct RecordingHost {
    pub in_world: Mutex<bool>,
    pub broadcasts: Mutex<Vec<String>>,
}

impl RecordingHost {
    pub fn new(in_world: bool) -> Arc<Self> {
        Arc::new(Self {
            in_world: Mutex::new(in_world),
            broadcasts: Mutex::new(Vec::new()),
        })
    }
}

impl HostAnnouncer for RecordingHost {
    fn in_world(&self) -> bool {
        *self.in_world.lock().unwrap()
    }

    fn broadcast(&self, text: &str) {
        self.broadcasts.lock().unwrap().push(text.to_owned());
    }
}

/// Everything a session test needs, wired together.
pub struct Fixture {
    pub transport: Arc<ScriptedTransport>,
    pub settings: Arc<MemorySettings>,
    pub notifier: Arc<RecordingNotifier>,
    pub host: Arc<RecordingHost>,
    pub registry: NameRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_transport(ScriptedTransport::new())
    }

    pub fn with_transport(transport: Arc<ScriptedTransport>) -> Self {
        let settings = MemorySettings::new();
        let notifier = RecordingNotifier::new();
        let host = RecordingHost::new(false);
        let registry = NameRegistry::new(
            Arc::clone(&transport) as Arc<dyn ChatTransport>,
            Arc::clone(&settings) as Arc<dyn SettingsStore>,
            Arc::clone(&notifier) as Arc<dyn NotificationSink>,
            Arc::clone(&host) as Arc<dyn HostAnnouncer>,
        );
        Fixture {
            transport,
            settings,
            notifier,
            host,
            registry,
        }
    }

    /// Start a session as "streamer" in "#tank" and report success.
    pub async fn start_connected(&self) {
        self.start_connected_as("streamer").await;
    }

    /// Start a session under a specific identity and report success.
    pub async fn start_connected_as(&self, username: &str) {
        self.registry
            .start(username, "oauth:token", "#tank", false)
            .await
            .expect("start failed");
        self.transport.emit(ChatEvent::Connected { success: true });
        self.wait_for_state(sharkpool::SessionState::Connected).await;
    }

    /// Emit a plain chat message from `sender`.
    pub fn say(&self, sender: &str, text: &str) {
        self.say_tagged(sender, text, false, false);
    }

    pub fn say_tagged(&self, sender: &str, text: &str, is_sub: bool, is_mod: bool) {
        self.transport.emit(ChatEvent::Message(ChatMessage {
            sender: sender.to_owned(),
            text: text.to_owned(),
            channel: "#tank".to_owned(),
            timestamp: Utc::now(),
            is_sub,
            is_mod,
            color: None,
        }));
    }

    /// Poll until `sender` shows up in the pool (or fail after ~1s).
    pub async fn wait_for_entry(&self, sender: &str) {
        for _ in 0..200 {
            if self.registry.entries().await.contains_key(sender) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{sender} never entered the pool");
    }

    pub async fn wait_for_state(&self, want: sharkpool::SessionState) {
        for _ in 0..200 {
            if self.registry.state().await == want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never reached {want:?}");
    }
}
