//! # keyview
//!
//! Native store collections as Rust objects. Lists, sets, sorted sets,
//! hashes, queues and counters living in a Redis-compatible store are
//! exposed as thin typed views whose methods forward to store commands.
//!
//! A [`Proxy`] looks at what a key holds and hands back the matching view;
//! a [`Client`] stores serialized scalar values and builds views. Both run
//! against any [`Store`]: a RESP [`Connection`] over TCP, or the
//! [`MemoryStore`] engine that executes the same commands in process.

pub mod client;
pub mod cmd;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod glob;
pub mod key;
pub mod keyspace;
pub mod keywatcher;
pub mod proxy;
pub mod resp;
pub mod serializer;
pub mod store;
pub mod types;
pub mod views;

pub use client::Client;
pub use cmd::{Cmd, FromReply, ToArg, cmd};
pub use config::ClientConfig;
pub use connection::Connection;
pub use error::{Error, Result};
pub use key::{IntoKey, mkey};
pub use proxy::{Lookup, Multikey, Proxy, Selector};
pub use serializer::{Payload, Serializer};
pub use store::{MemoryStore, SharedStore, Store};
pub use views::{
    Counter, HashView, KeyType, ListView, Queue, QueueKind, SetView, SortedSetView, TypedView,
    Value,
};
