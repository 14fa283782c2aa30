use crate::cmd::{FromReply, ToArg, cmd};
use crate::error::{Error, Result};
use crate::key::IntoKey;
use crate::store::SharedStore;
use std::time::Duration;

/// Order in which a [`Queue`] hands items back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// Push left, pop right.
    Fifo,
    /// Push left, pop left.
    Lifo,
}

/// A work queue on a store list. Blocking reads wait inside the store.
#[derive(Clone)]
pub struct Queue {
    key: String,
    store: SharedStore,
    kind: QueueKind,
    maxsize: Option<usize>,
}

impl Queue {
    pub fn new(key: impl IntoKey, store: SharedStore, kind: QueueKind) -> Self {
        Queue {
            key: key.into_key(),
            store,
            kind,
            maxsize: None,
        }
    }

    /// Make `put` fail with `Full` once the queue holds `maxsize` items.
    /// A `maxsize` of 0 leaves the queue unbounded.
    pub fn with_maxsize(mut self, maxsize: usize) -> Self {
        self.maxsize = (maxsize > 0).then_some(maxsize);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Enqueue. The size check and the push are separate commands.
    pub async fn put(&self, item: impl ToArg) -> Result<()> {
        if self.is_full().await? {
            return Err(Error::Full);
        }
        let _: usize = cmd("LPUSH").arg(&self.key).arg(item).query(&*self.store).await?;
        Ok(())
    }

    /// Dequeue, waiting up to `timeout` (`None` waits forever). `Empty` when
    /// the wait runs out.
    pub async fn get<T: FromReply>(&self, timeout: Option<Duration>) -> Result<T> {
        let seconds = match timeout {
            None => 0.0,
            Some(t) if t.is_zero() => return self.get_nowait().await,
            // The store reads 0 as "forever", so round tiny waits up.
            Some(t) => t.as_secs_f64().max(0.001),
        };
        let name = match self.kind {
            QueueKind::Fifo => "BRPOP",
            QueueKind::Lifo => "BLPOP",
        };
        let popped: Option<(String, T)> = cmd(name).arg(&self.key).arg(seconds).query(&*self.store).await?;
        popped.map(|(_, item)| item).ok_or(Error::Empty)
    }

    /// Dequeue without waiting; `Empty` if nothing is queued.
    pub async fn get_nowait<T: FromReply>(&self) -> Result<T> {
        let name = match self.kind {
            QueueKind::Fifo => "RPOP",
            QueueKind::Lifo => "LPOP",
        };
        let item: Option<T> = cmd(name).arg(&self.key).query(&*self.store).await?;
        item.ok_or(Error::Empty)
    }

    pub async fn qsize(&self) -> Result<usize> {
        cmd("LLEN").arg(&self.key).query(&*self.store).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.qsize().await? == 0)
    }

    pub async fn is_full(&self) -> Result<bool> {
        match self.maxsize {
            Some(max) => Ok(self.qsize().await? >= max),
            None => Ok(false),
        }
    }
}

impl std::fmt::Debug for Queue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queue")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("maxsize", &self.maxsize)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_and_lifo_order() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let fifo = Queue::new("fifo", store.clone(), QueueKind::Fifo);
        let lifo = Queue::new("lifo", store, QueueKind::Lifo);
        for n in 1..=3i64 {
            fifo.put(n).await.unwrap();
            lifo.put(n).await.unwrap();
        }
        assert_eq!(fifo.get_nowait::<i64>().await.unwrap(), 1);
        assert_eq!(fifo.get::<i64>(Some(Duration::from_millis(50))).await.unwrap(), 2);
        assert_eq!(lifo.get_nowait::<i64>().await.unwrap(), 3);
        assert_eq!(lifo.get::<i64>(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_and_full() {
        let q = Queue::new("q", Arc::new(MemoryStore::new()), QueueKind::Fifo).with_maxsize(1);
        assert!(matches!(q.get_nowait::<String>().await, Err(Error::Empty)));
        assert!(matches!(q.get::<String>(Some(Duration::ZERO)).await, Err(Error::Empty)));
        assert!(matches!(
            q.get::<String>(Some(Duration::from_millis(30))).await,
            Err(Error::Empty)
        ));
        q.put("job").await.unwrap();
        assert!(q.is_full().await.unwrap());
        assert!(matches!(q.put("again").await, Err(Error::Full)));
        assert_eq!(q.qsize().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_maxsize_is_unbounded() {
        let q = Queue::new("q", Arc::new(MemoryStore::new()), QueueKind::Fifo).with_maxsize(0);
        for n in 0..5i64 {
            q.put(n).await.unwrap();
        }
        assert!(!q.is_full().await.unwrap());
    }

    #[tokio::test]
    async fn test_huge_timeout_pops_available_item() {
        let q = Queue::new("q", Arc::new(MemoryStore::new()), QueueKind::Lifo);
        q.put("ready").await.unwrap();
        assert_eq!(q.get::<String>(Some(Duration::MAX)).await.unwrap(), "ready");
    }
}
