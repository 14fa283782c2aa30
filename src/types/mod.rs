//! Value types held by the in-memory engine, one per native store type.

pub mod hash;
pub mod list;
pub mod rstring;
pub mod set;
pub mod sorted_set;

use std::ops::RangeInclusive;

/// A value stored under one key.
#[derive(Debug, Clone)]
pub enum RedisValue {
    String(rstring::RedisString),
    List(list::RedisList),
    Hash(hash::RedisHash),
    Set(set::RedisSet),
    SortedSet(sorted_set::RedisSortedSet),
}

impl RedisValue {
    /// The tag reported by `TYPE`.
    pub fn type_name(&self) -> &'static str {
        match self {
            RedisValue::String(_) => "string",
            RedisValue::List(_) => "list",
            RedisValue::Hash(_) => "hash",
            RedisValue::Set(_) => "set",
            RedisValue::SortedSet(_) => "zset",
        }
    }

    /// Collections with no elements are not kept in the keyspace.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            RedisValue::String(_) => false,
            RedisValue::List(l) => l.is_empty(),
            RedisValue::Hash(h) => h.is_empty(),
            RedisValue::Set(s) => s.is_empty(),
            RedisValue::SortedSet(z) => z.is_empty(),
        }
    }
}

/// Resolve an inclusive `start..=stop` pair of store indices (negative counts
/// from the end) against a collection of `len` items. `None` if the range
/// selects nothing.
pub fn normalize_range(start: i64, stop: i64, len: usize) -> Option<RangeInclusive<usize>> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some(start as usize..=stop as usize)
}
