use crate::cmd::cmd;
use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::key::{IntoKey, mkey};
use crate::proxy::Proxy;
use crate::serializer::{self, Binary, Payload, SharedSerializer};
use crate::store::{MemoryStore, SharedStore};
use crate::views::{Counter, HashView, ListView, Queue, QueueKind, SetView, SortedSetView};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Entry point: a store handle plus the serializer used for scalar values.
///
/// The client itself behaves like a map from keys to [`Payload`]s; the
/// collection constructors hand out views bound to the same store.
#[derive(Clone)]
pub struct Client {
    store: SharedStore,
    serializer: SharedSerializer,
    label: String,
}

impl Client {
    /// Connect as configured: TCP, or the in-process engine when
    /// `config.memory` is set.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let serializer = serializer::from_name(&config.serializer, config.compress)?;
        let (store, label): (SharedStore, String) = if config.memory {
            (Arc::new(MemoryStore::new()), "memory".to_string())
        } else {
            let conn = Connection::connect(config).await?;
            let label = format!("{}/{}", conn.addr(), config.db);
            (Arc::new(conn), label)
        };
        debug!("client ready on {label} ({} serializer)", config.serializer);
        Ok(Client {
            store,
            serializer,
            label,
        })
    }

    /// A client on a fresh in-process store with the binary serializer.
    pub fn in_memory() -> Self {
        Client::with_store(Arc::new(MemoryStore::new()), Arc::new(Binary))
    }

    pub fn with_store(store: SharedStore, serializer: SharedSerializer) -> Self {
        Client {
            store,
            serializer,
            label: "custom".to_string(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn serializer(&self) -> &SharedSerializer {
        &self.serializer
    }

    /// Value at `key`; `NotFound` if the key does not exist.
    pub async fn get(&self, key: impl IntoKey) -> Result<Payload> {
        let key = key.into_key();
        let raw: Option<Bytes> = cmd("GET").arg(&key).query(&*self.store).await?;
        match raw {
            Some(raw) => self.serializer.decode(&raw),
            None => Err(Error::NotFound(key)),
        }
    }

    pub async fn get_or(&self, key: impl IntoKey, default: Payload) -> Result<Payload> {
        match self.get(key).await {
            Err(Error::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    pub async fn set(&self, key: impl IntoKey, value: &Payload) -> Result<()> {
        let encoded = self.serializer.encode(value)?;
        cmd("SET").arg(key.into_key()).arg(encoded).query(&*self.store).await
    }

    /// `NotFound` if there was nothing to delete.
    pub async fn delete(&self, key: impl IntoKey) -> Result<()> {
        let key = key.into_key();
        let removed: bool = cmd("DEL").arg(&key).query(&*self.store).await?;
        if !removed {
            return Err(Error::NotFound(key));
        }
        Ok(())
    }

    pub async fn contains(&self, key: impl IntoKey) -> Result<bool> {
        cmd("EXISTS").arg(key.into_key()).query(&*self.store).await
    }

    /// Number of keys in the database.
    pub async fn len(&self) -> Result<usize> {
        cmd("DBSIZE").query(&*self.store).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Remove every key in the database.
    pub async fn clear(&self) -> Result<()> {
        cmd("FLUSHDB").query(&*self.store).await
    }

    /// Set many keys with one `MSET`.
    pub async fn update<I, K>(&self, mapping: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Payload)>,
        K: IntoKey,
    {
        let mut mset = cmd("MSET");
        for (key, value) in mapping {
            mset = mset.arg(key.into_key()).arg(self.serializer.encode(&value)?);
        }
        if mset.arg_values().is_empty() {
            return Ok(());
        }
        mset.query(&*self.store).await
    }

    /// Values of several keys, `None` where a key is missing.
    pub async fn get_many<I, K>(&self, keys: I) -> Result<Vec<Option<Payload>>>
    where
        I: IntoIterator<Item = K>,
        K: IntoKey,
    {
        let mget = cmd("MGET").args(keys.into_iter().map(IntoKey::into_key));
        if mget.arg_values().is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<Option<Bytes>> = mget.query(&*self.store).await?;
        raw.into_iter()
            .map(|value| value.map(|v| self.serializer.decode(&v)).transpose())
            .collect()
    }

    /// `NotFound(old)` if `old` does not exist.
    pub async fn rename(&self, old: impl IntoKey, new: impl IntoKey) -> Result<()> {
        let old = old.into_key();
        cmd("RENAME")
            .arg(&old)
            .arg(new.into_key())
            .query(&*self.store)
            .await
            .map_err(|e| if e.is_upstream("no such key") { Error::NotFound(old) } else { e })
    }

    /// Keys matching a glob pattern (`"*"` for all), sorted.
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = cmd("KEYS").arg(pattern).query(&*self.store).await?;
        keys.sort();
        Ok(keys)
    }

    pub async fn items(&self, pattern: &str) -> Result<Vec<(String, Payload)>> {
        let mut items = Vec::new();
        for key in self.keys(pattern).await? {
            let value = self.get(&key).await?;
            items.push((key, value));
        }
        Ok(items)
    }

    pub async fn values(&self, pattern: &str) -> Result<Vec<Payload>> {
        Ok(self.items(pattern).await?.into_iter().map(|(_, v)| v).collect())
    }

    /// Remove `key` and return its value. The key is first renamed aside so
    /// no other client can read it in between.
    pub async fn pop(&self, key: impl IntoKey) -> Result<Payload> {
        let key = key.into_key();
        let temp = mkey([key.as_str(), "__poptmp__"]);
        self.rename(&key, &temp).await?;
        let value = self.get(&temp).await?;
        self.delete(&temp).await?;
        Ok(value)
    }

    /// Next id for `name`, as `"name:N"`.
    pub async fn id(&self, name: &str) -> Result<String> {
        let n: i64 = cmd("INCR").arg(mkey(["ids", name])).query(&*self.store).await?;
        Ok(mkey([name.to_string(), n.to_string()]))
    }

    pub fn list(&self, key: impl IntoKey) -> ListView {
        ListView::new(key, self.store.clone())
    }

    pub fn set_view(&self, key: impl IntoKey) -> SetView {
        SetView::new(key, self.store.clone())
    }

    pub fn sorted_set(&self, key: impl IntoKey) -> SortedSetView {
        SortedSetView::new(key, self.store.clone())
    }

    pub fn hash(&self, key: impl IntoKey) -> HashView {
        HashView::new(key, self.store.clone())
    }

    /// A FIFO queue, bounded when `maxsize` is given.
    pub fn queue(&self, key: impl IntoKey, maxsize: Option<usize>) -> Queue {
        self.make_queue(key, QueueKind::Fifo, maxsize)
    }

    pub fn lifo_queue(&self, key: impl IntoKey, maxsize: Option<usize>) -> Queue {
        self.make_queue(key, QueueKind::Lifo, maxsize)
    }

    fn make_queue(&self, key: impl IntoKey, kind: QueueKind, maxsize: Option<usize>) -> Queue {
        let queue = Queue::new(key, self.store.clone(), kind);
        match maxsize {
            Some(max) => queue.with_maxsize(max),
            None => queue,
        }
    }

    pub fn counter(&self, key: impl IntoKey) -> Counter {
        Counter::new(key, self.store.clone())
    }

    /// A typed-view dispatcher on the same store.
    pub fn proxy(&self) -> Proxy {
        Proxy::new(self.store.clone())
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Client: {} {:?}>", self.label, self.serializer)
    }
}
