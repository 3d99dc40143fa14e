//! Connectivity signal shared by the store and its host.

use tokio::sync::watch;

/// Online/offline flag with change notification.
#[derive(Debug, Clone)]
pub struct Connectivity {
    sender: watch::Sender<bool>,
}

impl Connectivity {
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self { sender }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Set the flag. Returns true when the value changed.
    pub fn set_online(&self, online: bool) -> bool {
        self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        })
    }

    /// Notify watchers without changing the flag.
    pub fn wake(&self) {
        self.sender.send_modify(|_| {});
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_online_reports_changes() {
        let connectivity = Connectivity::new(true);
        assert!(!connectivity.set_online(true));
        assert!(connectivity.set_online(false));
        assert!(!connectivity.is_online());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let connectivity = Connectivity::new(false);
        let mut rx = connectivity.subscribe();
        connectivity.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }
}
