//! Feedback about the pre-caching step of a worker installation

use std::fmt::{Display, Error, Formatter};

use url::Url;

/// The latest step of an installation
#[derive(Clone, Debug, PartialEq)]
pub enum InstallEvent {
    /// The worker has not fetched anything yet
    Waiting,
    /// The `done`-th URL (out of `total`) has been fetched
    Fetched{ url: Url, status: u16, done: usize, total: usize },
    /// Every URL is in the cache
    Installed{ total: usize },
    /// Nothing has been cached, and the worker is redundant
    Failed{ reason: String },
}

impl InstallEvent {
    /// Whether the installation is over, whatever its outcome
    pub fn is_final(&self) -> bool {
        matches!(self, InstallEvent::Installed{..} | InstallEvent::Failed{..})
    }
}

impl Display for InstallEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            InstallEvent::Waiting => write!(f, "Waiting for the installation to start"),
            InstallEvent::Fetched{url, status, done, total} => write!(f, "[{}/{}] {} ({})", done, total, url, status),
            InstallEvent::Installed{total} => write!(f, "Installed, {} URLs are available offline", total),
            InstallEvent::Failed{reason} => write!(f, "Installation failed: {}", reason),
        }
    }
}

impl Default for InstallEvent {
    fn default() -> Self {
        Self::Waiting
    }
}


/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<InstallEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<InstallEvent>;

/// Create a feeback channel, that can be used to retrieve the current step of an installation
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(InstallEvent::default())
}

/// Send `event` to the listener, if any
pub(crate) fn notify(sender: Option<&FeedbackSender>, event: InstallEvent) {
    if let Some(sender) = sender {
        log::trace!("Install feedback: {}", event);
        // Nobody listening is fine
        let _ = sender.send(event);
    }
}
