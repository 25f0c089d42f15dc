use std::sync::Arc;

use tokio::sync::watch;

use storefront_types::models::{MediaKind, SessionUser};

/// Client-side copy of the signed-in user's profile.
///
/// Only mirrors what the server already persisted; nothing here writes back.
/// Every change is broadcast to subscribers.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<SessionUser>>>,
}

impl SessionStore {
    pub fn new(user: Option<SessionUser>) -> Self {
        let (tx, _rx) = watch::channel(user);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionUser>> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> Option<SessionUser> {
        self.tx.borrow().clone()
    }

    /// Swap the whole snapshot, e.g. after re-fetching `/me` or signing out.
    pub fn replace(&self, user: Option<SessionUser>) {
        self.tx.send_replace(user);
    }

    pub fn update_avatar(&self, url: Option<String>) {
        self.update_media(MediaKind::Avatar, url);
    }

    pub fn update_background(&self, url: Option<String>) {
        self.update_media(MediaKind::Background, url);
    }

    /// No-op without a signed-in user.
    pub fn update_media(&self, kind: MediaKind, url: Option<String>) {
        self.tx.send_if_modified(|current| {
            let Some(user) = current.as_mut() else {
                return false;
            };
            let slot = match kind {
                MediaKind::Avatar => &mut user.avatar_url,
                MediaKind::Background => &mut user.background_url,
            };
            if *slot == url {
                return false;
            }
            *slot = url;
            true
        });
    }
}
