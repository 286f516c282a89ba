//! Session controller — owns the chat connection lifecycle and routes
//! classified messages to the blacklist or the entry pool.
//!
//! One spawned task owns the inbound event stream; every chat message is
//! dispatched as its own fire-and-forget task, so message handling, the
//! connection handler, and the host's `next()` trigger are three
//! independent paths into the shared pool and blacklist. All shared state
//! lives behind tokio locks and every handler consults the cancellation
//! token before doing work or sending anything outbound.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blacklist::Blacklist;
use crate::classify::{classify, Classified};
use crate::notify::{HostAnnouncer, LoadingHandle, NotificationSink};
use crate::pool::{Color, Entrant, EntryPool};
use crate::settings::{keys, SettingsStore};
use crate::timeout::TimeoutSetting;
use crate::transport::{ChatEvent, ChatMessage, ChatTransport, TransportError};

/// Connection lifecycle of the current (or last) session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Stopped,
    Failed,
}

/// Connection-failure wording, shared by every path that gives up on chat.
const CONNECT_ERROR: &str = "Could not connect to Twitch. Please check your settings.";

/// The active session: identity, target channel, and its cancellation
/// handle. Replaced wholesale by the next `start()`, which cancels the
/// outgoing one. The id tells a wound-down session loop apart from the
/// current one so it never touches the current session's state.
struct Session {
    id: u64,
    username: String,
    channel: String,
    cancel: CancellationToken,
}

/// State reachable from detached handler tasks.
struct Shared {
    transport: Arc<dyn ChatTransport>,
    settings: Arc<dyn SettingsStore>,
    notify: Arc<dyn NotificationSink>,
    host: Arc<dyn HostAnnouncer>,
    pool: Mutex<EntryPool>,
    blacklist: RwLock<Blacklist>,
    state: Mutex<SessionState>,
    session: Mutex<Option<Session>>,
}

/// Everything a spawned handler needs, pinned for the session's lifetime.
struct SessionCtx {
    shared: Arc<Shared>,
    session_id: u64,
    username: String,
    channel: String,
    is_test: bool,
    cancel: CancellationToken,
}

impl SessionCtx {
    /// Is this context still the registry's active session? A session that
    /// was replaced by a later `start()` keeps running until its token is
    /// observed, but must no longer write session state.
    async fn is_current(&self) -> bool {
        self.shared
            .session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.id == self.session_id)
    }

    async fn set_state(&self, state: SessionState) {
        if self.is_current().await {
            *self.shared.state.lock().await = state;
        }
    }
}

/// The chat-driven name registry.
///
/// Owns the entry pool and blacklist (no process-wide statics), drives one
/// chat session at a time, and exposes the selection surface the host
/// application draws names from.
pub struct NameRegistry {
    shared: Arc<Shared>,
    next_session_id: AtomicU64,
}

impl NameRegistry {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        settings: Arc<dyn SettingsStore>,
        notify: Arc<dyn NotificationSink>,
        host: Arc<dyn HostAnnouncer>,
    ) -> Self {
        let blacklist = Blacklist::load(Arc::clone(&settings));
        NameRegistry {
            shared: Arc::new(Shared {
                transport,
                settings,
                notify,
                host,
                pool: Mutex::new(EntryPool::new()),
                blacklist: RwLock::new(blacklist),
                state: Mutex::new(SessionState::Idle),
                session: Mutex::new(None),
            }),
            next_session_id: AtomicU64::new(0),
        }
    }

    /// Connect to chat and begin filling the pool.
    ///
    /// In test mode the session tears itself down right after the
    /// connection result arrives — a one-shot connectivity check.
    pub async fn start(
        &self,
        username: &str,
        token: &str,
        channel: &str,
        is_test: bool,
    ) -> Result<(), TransportError> {
        // A fresh start supersedes any session still running; cancel it so
        // its event loop winds down instead of lingering alongside the new
        // one.
        if let Some(previous) = self.shared.session.lock().await.take() {
            debug!(channel = %previous.channel, "cancelling replaced session");
            previous.cancel.cancel();
        }

        *self.shared.state.lock().await = SessionState::Connecting;
        let blacklisted = {
            let mut blacklist = self.shared.blacklist.write().await;
            blacklist.reload();
            blacklist.len()
        };
        debug!(blacklisted, "blacklist reloaded");

        let text = if is_test {
            "Testing Twitch Connection"
        } else {
            "Connecting to Twitch"
        };
        let loading = self.shared.notify.show_loading(text);

        let cancel = CancellationToken::new();
        let events = match self
            .shared
            .transport
            .start(username, token, cancel.clone())
            .await
        {
            Ok(events) => events,
            Err(e) => {
                loading.close();
                self.shared.notify.show_error(CONNECT_ERROR);
                *self.shared.state.lock().await = SessionState::Failed;
                warn!(error = %e, "could not start chat transport");
                return Err(e);
            }
        };

        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        *self.shared.session.lock().await = Some(Session {
            id,
            username: username.to_owned(),
            channel: channel.to_owned(),
            cancel: cancel.clone(),
        });

        let ctx = Arc::new(SessionCtx {
            shared: Arc::clone(&self.shared),
            session_id: id,
            username: username.to_owned(),
            channel: channel.to_owned(),
            is_test,
            cancel: cancel.clone(),
        });
        tokio::spawn(run_session(ctx, events, loading));

        if let Err(e) = self.shared.transport.join_channel(channel).await {
            self.shared.notify.show_error(CONNECT_ERROR);
            *self.shared.state.lock().await = SessionState::Failed;
            // The session loop closes the loading handle on cancellation.
            cancel.cancel();
            warn!(error = %e, channel, "could not join channel");
            return Err(e);
        }
        info!(channel, "session started");
        Ok(())
    }

    /// Request cooperative cancellation of the active session.
    ///
    /// Idempotent: with no active session (or one already cancelled) this
    /// logs and returns. Handler tasks already in flight may still finish.
    pub async fn stop(&self) {
        info!("stop requested");
        match self.shared.session.lock().await.as_ref() {
            Some(session) => {
                debug!(
                    username = %session.username,
                    channel = %session.channel,
                    "cancelling session"
                );
                session.cancel.cancel();
            }
            None => {
                if self.shared.settings.checkbox(keys::DEBUG) {
                    debug!("no active session, nothing to cancel");
                }
            }
        }
    }

    /// Clear the entry pool (used when a new round begins).
    pub async fn reset(&self) {
        self.shared.pool.lock().await.reset();
    }

    /// Draw one entrant at random, evicting expired entries along the way.
    /// An empty pool yields the configured default name.
    pub async fn next(&self) -> Entrant {
        let timeout =
            TimeoutSetting::parse(&self.shared.settings.combo_selection(keys::ENTRY_TIMEOUT));
        let default_name = self.shared.settings.text_input(keys::DEFAULT_NAME);
        self.shared.pool.lock().await.draw(timeout, &default_name)
    }

    /// Snapshot of the current pool for the host application.
    pub async fn entries(&self) -> HashMap<String, Entrant> {
        self.shared.pool.lock().await.entries()
    }

    pub async fn state(&self) -> SessionState {
        *self.shared.state.lock().await
    }
}

/// Session event loop. Holds the loading notification until the connection
/// result arrives; dispatches each chat message as its own task.
async fn run_session(
    ctx: Arc<SessionCtx>,
    mut events: mpsc::UnboundedReceiver<ChatEvent>,
    loading: Box<dyn LoadingHandle>,
) {
    let mut loading = Some(loading);
    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                if let Some(handle) = loading.take() {
                    handle.close();
                }
                if ctx.is_current().await {
                    let mut state = ctx.shared.state.lock().await;
                    if *state != SessionState::Failed {
                        *state = SessionState::Stopped;
                    }
                }
                info!(channel = %ctx.channel, "session cancelled");
                break;
            }
            event = events.recv() => match event {
                Some(ChatEvent::Connected { success }) => {
                    if let Some(handle) = loading.take() {
                        handle.close();
                    }
                    on_connection(&ctx, success).await;
                }
                Some(ChatEvent::Message(msg)) => {
                    tokio::spawn(handle_message(Arc::clone(&ctx), msg));
                }
                None => {
                    if let Some(handle) = loading.take() {
                        handle.close();
                    }
                    debug!(channel = %ctx.channel, "event stream closed");
                    break;
                }
            }
        }
    }
}

async fn on_connection(ctx: &SessionCtx, success: bool) {
    if success {
        ctx.set_state(SessionState::Connected).await;
        ctx.shared.notify.show_success("Connected to Twitch");
        info!(channel = %ctx.channel, "connected");
        if ctx.is_test {
            info!("test successful");
            ctx.cancel.cancel();
        }
        return;
    }

    ctx.shared.notify.show_error(CONNECT_ERROR);
    warn!(channel = %ctx.channel, "connection failed");
    ctx.set_state(SessionState::Failed).await;
    // A failed session is terminal: stop consuming events so later chat
    // messages can no longer reach the pool.
    ctx.cancel.cancel();
}

/// Handle one inbound chat message. Runs as a detached task; checks the
/// cancellation token before touching shared state.
async fn handle_message(ctx: Arc<SessionCtx>, msg: ChatMessage) {
    if ctx.cancel.is_cancelled() {
        return;
    }

    match classify(&msg.text) {
        Classified::Command { name, args } => {
            // Commands are moderator-only; anyone else's are dropped whole.
            if !msg.is_mod {
                return;
            }
            match name.as_str() {
                "noshark" => {
                    let target = command_target(&args);
                    let added = ctx.shared.blacklist.write().await.add(&target);
                    let text = if added {
                        format!("{target} is now blacklisted")
                    } else {
                        format!("{target} is already blacklisted")
                    };
                    info!("{text}");
                    announce(&ctx, &msg.channel, &text, false).await;
                }
                "allowshark" => {
                    let target = command_target(&args);
                    let removed = ctx.shared.blacklist.write().await.remove(&target);
                    let text = if removed {
                        format!("{target} is now allowed to be a shark")
                    } else {
                        format!("{target} is not blacklisted")
                    };
                    info!("{text}");
                    announce(&ctx, &msg.channel, &text, false).await;
                }
                other => debug!(command = other, "ignoring unknown command"),
            }
        }
        Classified::Regular { .. } => {
            if !should_add_name(&ctx, &msg).await {
                return;
            }

            let entrant = Entrant {
                name: msg.sender.clone(),
                color: msg
                    .color
                    .as_deref()
                    .and_then(Color::from_hex)
                    .unwrap_or(Color::DEFAULT),
                entered_at: msg.timestamp,
            };
            if !ctx.shared.pool.lock().await.try_admit(entrant) {
                return;
            }

            let text = format!("{} just entered the Shark Name Pool", msg.sender);
            info!("{text}");
            announce(&ctx, &msg.channel, &text, true).await;
        }
    }
}

/// Admission rule for regular messages: not the session's own identity
/// (case-insensitive), not blacklisted (case-insensitive), not already in
/// the pool (case-sensitive), and sub/mod when sub-only mode is on.
async fn should_add_name(ctx: &SessionCtx, msg: &ChatMessage) -> bool {
    if msg.sender.to_lowercase() == ctx.username.to_lowercase() {
        return false;
    }
    if ctx.shared.blacklist.read().await.contains(&msg.sender) {
        return false;
    }
    if ctx.shared.pool.lock().await.contains(&msg.sender) {
        return false;
    }
    if ctx.shared.settings.checkbox(keys::SUB_ONLY) && !msg.is_sub && !msg.is_mod {
        return false;
    }
    true
}

/// First argument of a command, lowercased, with one leading `@` stripped.
/// A command with no argument yields the empty string — inherited behavior,
/// kept literally.
fn command_target(args: &str) -> String {
    let first = args.split(' ').next().unwrap_or("").to_lowercase();
    match first.strip_prefix('@') {
        Some(rest) => rest.to_owned(),
        None => first,
    }
}

/// Fire-and-forget announcement through the configured channels. `mention`
/// prefixes the chat copy with `@` so the chat service highlights the user.
/// Failures are logged and never propagated to the triggering handler.
async fn announce(ctx: &SessionCtx, channel: &str, text: &str, mention: bool) {
    if ctx.cancel.is_cancelled() {
        return;
    }

    if ctx.shared.settings.checkbox(keys::ANNOUNCE_CHAT) {
        let chat_text = if mention {
            format!("@{text}")
        } else {
            text.to_owned()
        };
        if let Err(e) = ctx.shared.transport.send_message(channel, &chat_text).await {
            warn!(error = %e, channel, "chat announce failed");
        }
    }

    if ctx.shared.settings.checkbox(keys::ANNOUNCE_GAME) && ctx.shared.host.in_world() {
        ctx.shared.host.broadcast(text);
    }
}
