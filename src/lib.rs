//! sharkpool — a chat-driven name registry.
//!
//! Chatters enter a selection pool by talking in the channel; moderators
//! curate a persisted blacklist with `!noshark` / `!allowshark`; the host
//! application draws one non-expired entrant at random with [`NameRegistry::next`].
//!
//! The chat client, notification UI, settings storage, and in-game chat are
//! all collaborators behind traits ([`ChatTransport`], [`NotificationSink`],
//! [`SettingsStore`], [`HostAnnouncer`]) — this crate owns only the
//! classification, admission, blacklist, and selection logic.

pub mod blacklist;
pub mod classify;
pub mod notify;
pub mod pool;
pub mod session;
pub mod settings;
pub mod timeout;
pub mod transport;

pub use blacklist::Blacklist;
pub use classify::{classify, Classified};
pub use notify::{HostAnnouncer, LoadingHandle, NotificationSink};
pub use pool::{Color, Entrant, EntryPool};
pub use session::{NameRegistry, SessionState};
pub use settings::SettingsStore;
pub use timeout::TimeoutSetting;
pub use transport::{ChatEvent, ChatMessage, ChatTransport, TransportError};
