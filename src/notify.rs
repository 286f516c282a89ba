//! Notification and host-game collaborators.

/// A visible loading notification. Closed once the connection resolves
/// either way; dropping without closing leaves it on screen, so the
/// session loop holds it until the connection event arrives.
pub trait LoadingHandle: Send {
    fn close(self: Box<Self>);
}

/// User-visible notifications in the host application.
pub trait NotificationSink: Send + Sync {
    fn show_loading(&self, text: &str) -> Box<dyn LoadingHandle>;
    fn show_success(&self, text: &str);
    fn show_error(&self, text: &str);
}

/// In-game chat announcements, only meaningful while a world is loaded.
pub trait HostAnnouncer: Send + Sync {
    fn in_world(&self) -> bool;
    fn broadcast(&self, text: &str);
}
