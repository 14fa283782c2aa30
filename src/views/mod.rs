//! Typed views over single store keys.
//!
//! A view is just a key plus a store handle; every method forwards to one
//! store command (or a short fixed batch) and decodes the reply into the
//! caller's chosen type.

pub mod counter;
pub mod hash;
pub mod list;
pub mod queue;
pub mod set;
pub mod sorted_set;

pub use counter::Counter;
pub use hash::HashView;
pub use list::ListView;
pub use queue::{Queue, QueueKind};
pub use set::SetView;
pub use sorted_set::SortedSetView;

use crate::cmd::{FromReply, ToArg};
use crate::error::{Error, Result};
use crate::resp::RespValue;
use crate::store::SharedStore;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The type tag the store reports for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    String,
    List,
    Set,
    SortedSet,
    Hash,
    None,
}

impl KeyType {
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "string" => Ok(KeyType::String),
            "list" => Ok(KeyType::List),
            "set" => Ok(KeyType::Set),
            "zset" => Ok(KeyType::SortedSet),
            "hash" => Ok(KeyType::Hash),
            "none" => Ok(KeyType::None),
            other => Err(Error::unexpected("type tag", other)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::SortedSet => "zset",
            KeyType::Hash => "hash",
            KeyType::None => "none",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromReply for KeyType {
    fn from_reply(reply: RespValue) -> Result<Self> {
        KeyType::parse(&String::from_reply(reply)?)
    }
}

/// Collection kinds that can be assigned empty and remembered client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    List,
    Set,
    SortedSet,
    Hash,
}

impl From<ValueKind> for KeyType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::List => KeyType::List,
            ValueKind::Set => KeyType::Set,
            ValueKind::SortedSet => KeyType::SortedSet,
            ValueKind::Hash => KeyType::Hash,
        }
    }
}

/// What a key holds, as returned by [`Proxy::get`](crate::Proxy::get).
#[derive(Debug, Clone)]
pub enum TypedView {
    Int(i64),
    Text(String),
    List(ListView),
    Set(SetView),
    SortedSet(SortedSetView),
    Hash(HashView),
}

impl TypedView {
    /// A view of `kind` bound to `key`.
    pub fn collection(kind: ValueKind, key: String, store: SharedStore) -> Self {
        match kind {
            ValueKind::List => TypedView::List(ListView::new(key, store)),
            ValueKind::Set => TypedView::Set(SetView::new(key, store)),
            ValueKind::SortedSet => TypedView::SortedSet(SortedSetView::new(key, store)),
            ValueKind::Hash => TypedView::Hash(HashView::new(key, store)),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            TypedView::Int(_) | TypedView::Text(_) => KeyType::String,
            TypedView::List(_) => KeyType::List,
            TypedView::Set(_) => KeyType::Set,
            TypedView::SortedSet(_) => KeyType::SortedSet,
            TypedView::Hash(_) => KeyType::Hash,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypedView::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedView::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListView> {
        match self {
            TypedView::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetView> {
        match self {
            TypedView::Set(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sorted_set(&self) -> Option<&SortedSetView> {
        match self {
            TypedView::SortedSet(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&HashView> {
        match self {
            TypedView::Hash(v) => Some(v),
            _ => None,
        }
    }
}

/// A value to assign to a key through [`Proxy::set`](crate::Proxy::set).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Text(String),
    List(Vec<Vec<u8>>),
    Set(BTreeSet<Vec<u8>>),
    Hash(BTreeMap<String, Vec<u8>>),
    SortedSet(Vec<(Vec<u8>, f64)>),
}

impl Value {
    /// Collection kind, `None` for scalars.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Int(_) | Value::Text(_) => None,
            Value::List(_) => Some(ValueKind::List),
            Value::Set(_) => Some(ValueKind::Set),
            Value::Hash(_) => Some(ValueKind::Hash),
            Value::SortedSet(_) => Some(ValueKind::SortedSet),
        }
    }

    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Int(_) | Value::Text(_) => false,
            Value::List(items) => items.is_empty(),
            Value::Set(members) => members.is_empty(),
            Value::Hash(fields) => fields.is_empty(),
            Value::SortedSet(pairs) => pairs.is_empty(),
        }
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, T>(members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Vec<u8>>,
    {
        Value::Set(members.into_iter().map(Into::into).collect())
    }

    pub fn hash<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        Value::Hash(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn sorted_set<I, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (M, f64)>,
        M: Into<Vec<u8>>,
    {
        Value::SortedSet(pairs.into_iter().map(|(m, s)| (m.into(), s)).collect())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Lossy text of an argument, for error messages.
pub(crate) fn describe(value: &impl ToArg) -> String {
    let mut encoded = Vec::new();
    value.write_arg(&mut encoded);
    encoded
        .iter()
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Store-relative inclusive stop for an exclusive `stop`; `None` means the
/// range is empty.
pub(crate) fn inclusive_stop(stop: Option<i64>) -> Option<i64> {
    match stop {
        None => Some(-1),
        Some(0) => None,
        Some(n) => Some(n.saturating_sub(1)),
    }
}
