//! Typed access to whole keys: ask for a key and get back a view matching
//! whatever the store holds there; assign a [`Value`] and the key's contents
//! are replaced.
//!
//! The store cannot hold an empty list, set, sorted set or hash, so assigning
//! one deletes the key and leaves an empty placeholder behind in the proxy.
//! Reads of that key then come back as an empty view of the assigned type
//! until something real is written there.

use crate::cmd::{Cmd, cmd};
use crate::error::{Error, Result};
use crate::glob::glob_match;
use crate::key::IntoKey;
use crate::keyspace::Keyspaces;
use crate::store::{SharedStore, run_batch};
use crate::views::{KeyType, TypedView, Value, ValueKind};
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tokio::sync::Mutex;
use tracing::trace;

/// One key, or every key matching a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Key(String),
    Glob(String),
}

impl Selector {
    pub fn glob(pattern: impl Into<String>) -> Self {
        Selector::Glob(pattern.into())
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Selector::Key(key.to_string())
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Selector::Key(key)
    }
}

/// Result of [`Proxy::lookup`].
pub enum Lookup<'a> {
    One(TypedView),
    Many(Multikey<'a>),
}

/// Views of the keys matched by a glob, resolved one per `next` call.
///
/// Keys removed after the match are skipped.
pub struct Multikey<'a> {
    proxy: &'a Proxy,
    keys: VecDeque<String>,
}

impl Multikey<'_> {
    pub async fn next(&mut self) -> Option<Result<(String, TypedView)>> {
        while let Some(key) = self.keys.pop_front() {
            match self.proxy.get(&key).await {
                Ok(view) => return Some(Ok((key, view))),
                Err(Error::NotFound(_)) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    /// Keys not yet resolved.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }

    pub async fn collect(mut self) -> Result<Vec<(String, TypedView)>> {
        let mut out = Vec::with_capacity(self.keys.len());
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}

pub struct Proxy {
    store: SharedStore,
    empties: Mutex<HashMap<String, ValueKind>>,
    keyspaces: Keyspaces,
}

impl Proxy {
    pub fn new(store: SharedStore) -> Self {
        Proxy {
            store,
            empties: Mutex::new(HashMap::new()),
            keyspaces: Keyspaces::new(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub async fn lookup(&self, selector: impl Into<Selector>) -> Result<Lookup<'_>> {
        match selector.into() {
            Selector::Key(key) => Ok(Lookup::One(self.get(key).await?)),
            Selector::Glob(pattern) => {
                let keys: Vec<String> = cmd("KEYS").arg(&pattern).query(&*self.store).await?;
                Ok(Lookup::Many(Multikey {
                    proxy: self,
                    keys: keys.into(),
                }))
            }
        }
    }

    /// View of whatever `key` holds. `NotFound` if it holds nothing and was
    /// not assigned an empty collection.
    pub async fn get(&self, key: impl IntoKey) -> Result<TypedView> {
        let key = key.into_key();
        let key_type: KeyType = cmd("TYPE").arg(&key).query(&*self.store).await?;
        let kind = match key_type {
            KeyType::String => {
                if self.empties.lock().await.remove(&key).is_some() {
                    trace!("{key} now holds a string; dropping empty placeholder");
                }
                let raw: Option<Bytes> = cmd("GET").arg(&key).query(&*self.store).await?;
                return match raw {
                    Some(raw) => Ok(decode_scalar(&raw)),
                    None => Err(Error::NotFound(key)),
                };
            }
            KeyType::List => Some(ValueKind::List),
            KeyType::Set => Some(ValueKind::Set),
            KeyType::SortedSet => Some(ValueKind::SortedSet),
            KeyType::Hash => Some(ValueKind::Hash),
            KeyType::None => None,
        };

        {
            let mut empties = self.empties.lock().await;
            if let Some(&placeholder) = empties.get(&key) {
                if kind.is_none() {
                    return Ok(TypedView::collection(placeholder, key, self.store.clone()));
                }
                trace!("{key} now holds a {key_type}; dropping empty placeholder");
                empties.remove(&key);
            }
        }

        match kind {
            Some(kind) => Ok(TypedView::collection(kind, key, self.store.clone())),
            None => Err(Error::NotFound(key)),
        }
    }

    /// Replace the contents of `key` with `value`.
    ///
    /// Collections are written as one batch (delete, then a single bulk
    /// write). A failure partway through is not rolled back.
    pub async fn set(&self, key: impl IntoKey, value: Value) -> Result<()> {
        let key = key.into_key();
        self.empties.lock().await.remove(&key);

        if let (Some(kind), true) = (value.kind(), value.is_empty_collection()) {
            let _: i64 = cmd("DEL").arg(&key).query(&*self.store).await?;
            self.empties.lock().await.insert(key, kind);
            return Ok(());
        }

        let write = match value {
            Value::Int(n) => return cmd("SET").arg(&key).arg(n).query(&*self.store).await,
            Value::Text(s) => return cmd("SET").arg(&key).arg(s).query(&*self.store).await,
            Value::List(items) => cmd("RPUSH").arg(&key).args(items),
            Value::Set(members) => cmd("SADD").arg(&key).args(members),
            Value::Hash(fields) => fields
                .into_iter()
                .fold(cmd("HSET").arg(&key), |c, (field, v)| c.arg(field).arg(v)),
            Value::SortedSet(pairs) => pairs
                .into_iter()
                .fold(cmd("ZADD").arg(&key), |c, (member, score)| c.arg(score).arg(member)),
        };
        let batch: Vec<Cmd> = vec![cmd("DEL").arg(&key), write];
        run_batch(&*self.store, batch).await?;
        Ok(())
    }

    /// True if the store has `key` or it holds an empty placeholder.
    pub async fn contains(&self, key: impl IntoKey) -> Result<bool> {
        let key = key.into_key();
        if self.empties.lock().await.contains_key(&key) {
            return Ok(true);
        }
        cmd("EXISTS").arg(&key).query(&*self.store).await
    }

    /// Delete one key or every key matching a glob, placeholders included.
    /// Returns how many store keys were removed.
    pub async fn delete(&self, selector: impl Into<Selector>) -> Result<usize> {
        match selector.into() {
            Selector::Key(key) => {
                let had_placeholder = self.empties.lock().await.remove(&key).is_some();
                let removed: usize = cmd("DEL").arg(&key).query(&*self.store).await?;
                if removed == 0 && !had_placeholder {
                    return Err(Error::NotFound(key));
                }
                Ok(removed)
            }
            Selector::Glob(pattern) => {
                self.empties
                    .lock()
                    .await
                    .retain(|key, _| !glob_match(&pattern, key));
                let keys: Vec<String> = cmd("KEYS").arg(&pattern).query(&*self.store).await?;
                if keys.is_empty() {
                    return Ok(0);
                }
                cmd("DEL").args(&keys).query(&*self.store).await
            }
        }
    }

    /// True if `key` is only known through an empty placeholder.
    pub async fn is_placeholder(&self, key: &str) -> bool {
        self.empties.lock().await.contains_key(key)
    }

    pub fn register_keyspace(&mut self, shortcut: &str, template: &str) -> Result<String> {
        self.keyspaces.register(shortcut, template)
    }

    pub fn keyspaces(&self) -> &Keyspaces {
        &self.keyspaces
    }

    /// Concrete key for a keyspace shortcut (or raw template) and arguments.
    pub fn keyspace_key(&self, keyspace: &str, args: &[&dyn fmt::Display]) -> Result<String> {
        self.keyspaces.resolve(keyspace, args)
    }

    pub async fn get_in(&self, keyspace: &str, args: &[&dyn fmt::Display]) -> Result<TypedView> {
        let key = self.keyspace_key(keyspace, args)?;
        self.get(key).await
    }

    pub async fn set_in(&self, keyspace: &str, args: &[&dyn fmt::Display], value: Value) -> Result<()> {
        let key = self.keyspace_key(keyspace, args)?;
        self.set(key, value).await
    }

    /// Store keys belonging to a keyspace, sorted.
    pub async fn keyspace_keys(&self, keyspace: &str) -> Result<Vec<String>> {
        let pattern = self.keyspaces.glob_of(keyspace)?;
        let mut keys: Vec<String> = cmd("KEYS").arg(pattern).query(&*self.store).await?;
        keys.sort();
        Ok(keys)
    }

    pub async fn keyspace_values(&self, keyspace: &str) -> Result<Vec<TypedView>> {
        Ok(self
            .keyspace_items(keyspace)
            .await?
            .into_iter()
            .map(|(_, view)| view)
            .collect())
    }

    pub async fn keyspace_items(&self, keyspace: &str) -> Result<Vec<(String, TypedView)>> {
        let keys = self.keyspace_keys(keyspace).await?;
        Multikey {
            proxy: self,
            keys: keys.into(),
        }
        .collect()
        .await
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("keyspaces", &self.keyspaces)
            .finish_non_exhaustive()
    }
}

/// A string value reads as an integer when it parses as one, text otherwise.
fn decode_scalar(raw: &[u8]) -> TypedView {
    let text = String::from_utf8_lossy(raw);
    match text.parse::<i64>() {
        Ok(n) => TypedView::Int(n),
        Err(_) => TypedView::Text(text.into_owned()),
    }
}
