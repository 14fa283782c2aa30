use crate::cmd::Cmd;
use crate::command::{self, list};
use crate::error::{Error, Result};
use crate::keywatcher::{KeyWatcher, SharedKeyWatcher};
use crate::resp::RespValue;
use crate::store::{Database, Store};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace};

/// A store held entirely in process memory.
///
/// Cloning shares the same keyspace, the way several connections to one
/// server would.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    db: Arc<RwLock<Database>>,
    watcher: SharedKeyWatcher,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            db: Arc::new(RwLock::new(Database::new())),
            watcher: Arc::new(Mutex::new(KeyWatcher::new())),
        }
    }

    /// Run a command to completion under the write lock.
    async fn dispatch(&self, name: &str, args: &[RespValue]) -> RespValue {
        let (reply, ready) = {
            let mut db = self.db.write().await;
            let reply = command::dispatch(name, args, &mut db);
            (reply, db.take_ready_keys())
        };
        self.wake(&ready).await;
        reply
    }

    async fn wake(&self, ready: &[String]) {
        if ready.is_empty() {
            return;
        }
        let woken = self.watcher.lock().await.notify_keys(ready);
        if woken > 0 {
            trace!("woke {woken} blocked pop(s) on {ready:?}");
        }
    }

    /// BLPOP / BRPOP: pop at once if any list has data, otherwise park until
    /// a push lands on one of the keys or the timeout runs out.
    async fn blocking_pop(&self, name: &str, args: &[RespValue]) -> RespValue {
        let end = if name == "BLPOP" { list::End::Left } else { list::End::Right };
        let (keys, timeout) = match list::parse_blocking_args(args, &name.to_ascii_lowercase()) {
            Ok(parsed) => parsed,
            Err(e) => return e,
        };
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));

        loop {
            let notify = {
                let mut db = self.db.write().await;
                match list::try_pop_from_keys(&mut db, &keys, end) {
                    Ok(Some(reply)) => return reply,
                    Ok(None) => {}
                    Err(e) => return e,
                }
                // Registered while the db lock is still held, so no push can
                // slip in between the failed pop and the registration.
                self.watcher.lock().await.register_many(&keys)
            };

            let notified = match deadline {
                Some(deadline) => tokio::select! {
                    _ = notify.notified() => true,
                    _ = tokio::time::sleep_until(deadline) => false,
                },
                None => {
                    notify.notified().await;
                    true
                }
            };

            self.watcher.lock().await.unregister_many(&keys, &notify);

            if !notified {
                debug!("{name} on {keys:?} timed out");
                return RespValue::null_array();
            }
            // Another waiter may have taken the element first; go around.
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn execute(&self, cmd: Cmd) -> Result<RespValue> {
        trace!("memory: {cmd}");
        let args: Vec<RespValue> = cmd
            .arg_values()
            .iter()
            .cloned()
            .map(RespValue::bulk_string)
            .collect();
        let reply = if command::is_blocking(cmd.name()) {
            self.blocking_pop(cmd.name(), &args).await
        } else {
            self.dispatch(cmd.name(), &args).await
        };
        match reply {
            RespValue::Error(msg) => Err(Error::Upstream(msg)),
            reply => Ok(reply),
        }
    }

    async fn execute_batch(&self, cmds: Vec<Cmd>) -> Result<Vec<RespValue>> {
        trace!("memory: batch of {}", cmds.len());
        let (replies, ready) = {
            let mut db = self.db.write().await;
            let replies: Vec<RespValue> = cmds
                .iter()
                .map(|cmd| {
                    let args: Vec<RespValue> = cmd
                        .arg_values()
                        .iter()
                        .cloned()
                        .map(RespValue::bulk_string)
                        .collect();
                    command::dispatch(cmd.name(), &args, &mut db)
                })
                .collect();
            (replies, db.take_ready_keys())
        };
        self.wake(&ready).await;
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::cmd;
    use std::time::Duration;

    #[tokio::test]
    async fn test_execute_maps_error_replies() {
        let store = MemoryStore::new();
        store.execute(cmd("SET").arg("k").arg("v")).await.unwrap();
        let err = store.execute(cmd("LPUSH").arg("k").arg("x")).await.unwrap_err();
        assert!(err.is_upstream("WRONGTYPE"));
    }

    #[tokio::test]
    async fn test_batch_returns_error_in_place() {
        let store = MemoryStore::new();
        let replies = store
            .execute_batch(vec![
                cmd("SET").arg("s").arg("1"),
                cmd("LPUSH").arg("s").arg("x"),
                cmd("INCR").arg("s"),
            ])
            .await
            .unwrap();
        assert_eq!(replies[0], RespValue::ok());
        assert!(matches!(replies[1], RespValue::Error(_)));
        assert_eq!(replies[2], RespValue::integer(2));
    }

    #[tokio::test]
    async fn test_blocking_pop_times_out() {
        let store = MemoryStore::new();
        let reply = store
            .execute(cmd("BLPOP").arg("empty").arg(0.05))
            .await
            .unwrap();
        assert_eq!(reply, RespValue::null_array());
        assert_eq!(store.watcher.lock().await.waiting_on("empty"), 0);
    }

    #[tokio::test]
    async fn test_blocking_pop_woken_by_push() {
        let store = MemoryStore::new();
        let waiter = {
            let store = store.clone();
            tokio::spawn(async move { store.execute(cmd("BRPOP").arg("q").arg(0)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.execute(cmd("LPUSH").arg("q").arg("job")).await.unwrap();
        let reply = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            reply,
            RespValue::array(vec![RespValue::bulk_string("q"), RespValue::bulk_string("job")])
        );
        assert_eq!(store.execute(cmd("LLEN").arg("q")).await.unwrap(), RespValue::integer(0));
    }

    #[tokio::test]
    async fn test_blocking_pop_inside_batch_does_not_wait() {
        let store = MemoryStore::new();
        let replies = store
            .execute_batch(vec![cmd("BLPOP").arg("none").arg(0)])
            .await
            .unwrap();
        assert_eq!(replies, vec![RespValue::null_array()]);
    }
}
