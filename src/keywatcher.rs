use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Tracks tasks blocked in `BLPOP`/`BRPOP` on the in-memory engine.
///
/// A blocked pop registers one `Notify` under every key it waits on; a push
/// to any of those keys fires it once and forgets every waiter on that key.
#[derive(Debug, Default)]
pub struct KeyWatcher {
    waiters: HashMap<String, Vec<Arc<Notify>>>,
}

impl KeyWatcher {
    pub fn new() -> Self {
        KeyWatcher::default()
    }

    /// Register one shared handle across `keys`.
    pub fn register_many(&mut self, keys: &[String]) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        for key in keys {
            self.waiters
                .entry(key.clone())
                .or_default()
                .push(notify.clone());
        }
        notify
    }

    /// Wake every waiter on each of `keys`. Returns how many handles fired.
    pub fn notify_keys(&mut self, keys: &[String]) -> usize {
        let mut woken = 0;
        for key in keys {
            if let Some(waiters) = self.waiters.remove(key) {
                woken += waiters.len();
                // notify_one stores a permit, so a waiter that has registered
                // but not yet started awaiting still sees the wake-up.
                waiters.iter().for_each(|w| w.notify_one());
            }
        }
        woken
    }

    /// Drop a handle from `keys` after its waiter gave up or was served.
    pub fn unregister_many(&mut self, keys: &[String], notify: &Arc<Notify>) {
        for key in keys {
            if let Some(waiters) = self.waiters.get_mut(key) {
                waiters.retain(|w| !Arc::ptr_eq(w, notify));
                if waiters.is_empty() {
                    self.waiters.remove(key);
                }
            }
        }
    }

    pub fn waiting_on(&self, key: &str) -> usize {
        self.waiters.get(key).map_or(0, Vec::len)
    }
}

pub type SharedKeyWatcher = Arc<Mutex<KeyWatcher>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_wakes_registered_waiter() {
        let mut watcher = KeyWatcher::new();
        let keys = vec!["a".to_string(), "b".to_string()];
        let notify = watcher.register_many(&keys);
        assert_eq!(watcher.waiting_on("a"), 1);

        assert_eq!(watcher.notify_keys(&["b".to_string()]), 1);
        // Permit was stored before anyone awaited.
        notify.notified().await;

        watcher.unregister_many(&keys, &notify);
        assert_eq!(watcher.waiting_on("a"), 0);
        assert_eq!(watcher.notify_keys(&keys), 0);
    }
}
