use crate::glob::glob_match;
use crate::types::RedisValue;
use std::collections::HashMap;

/// One keyspace of the in-memory engine.
#[derive(Debug, Default)]
pub struct Database {
    data: HashMap<String, RedisValue>,
    /// List keys that received pushes since the last drain; blocked pops
    /// waiting on them get woken.
    ready_keys: Vec<String>,
}

impl Database {
    pub fn new() -> Self {
        Database::default()
    }

    pub fn get(&self, key: &str) -> Option<&RedisValue> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RedisValue> {
        self.data.get_mut(key)
    }

    pub fn set(&mut self, key: String, value: RedisValue) {
        self.data.insert(key, value);
    }

    /// Delete a key. Returns true if it existed.
    pub fn del(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    pub fn exists(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// `TYPE` tag of a key, `None` if it does not exist.
    pub fn key_type(&self, key: &str) -> Option<&'static str> {
        self.data.get(key).map(RedisValue::type_name)
    }

    /// Move a value to a new key, replacing whatever was there.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        match self.data.remove(old) {
            Some(value) => {
                self.data.insert(new.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Keys matching a glob pattern, sorted.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .data
            .keys()
            .filter(|key| glob_match(pattern, key))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn dbsize(&self) -> usize {
        self.data.len()
    }

    pub fn flush(&mut self) {
        self.data.clear();
    }

    /// Drop `key` if it holds a collection that became empty.
    pub fn remove_if_empty(&mut self, key: &str) {
        if self.data.get(key).is_some_and(RedisValue::is_empty_collection) {
            self.data.remove(key);
        }
    }

    pub fn signal_ready(&mut self, key: &str) {
        if !self.ready_keys.iter().any(|k| k == key) {
            self.ready_keys.push(key.to_string());
        }
    }

    pub fn take_ready_keys(&mut self) -> Vec<String> {
        std::mem::take(&mut self.ready_keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::list::RedisList;
    use crate::types::rstring::RedisString;

    #[test]
    fn test_keys_and_rename() {
        let mut db = Database::new();
        db.set("user:1".into(), RedisValue::String(RedisString::from_i64(1)));
        db.set("user:2".into(), RedisValue::String(RedisString::from_i64(2)));
        db.set("post:1".into(), RedisValue::List(RedisList::new()));
        assert_eq!(db.keys("user:*"), vec!["user:1", "user:2"]);

        assert!(db.rename("user:2", "user:3"));
        assert!(!db.rename("user:2", "user:4"));
        assert_eq!(db.key_type("user:3"), Some("string"));
        assert_eq!(db.dbsize(), 3);
    }

    #[test]
    fn test_remove_if_empty() {
        let mut db = Database::new();
        db.set("l".into(), RedisValue::List(RedisList::new()));
        db.set("s".into(), RedisValue::String(RedisString::new(Vec::new())));
        db.remove_if_empty("l");
        db.remove_if_empty("s");
        assert!(!db.exists("l"));
        assert!(db.exists("s"));
    }

    #[test]
    fn test_ready_keys_dedup() {
        let mut db = Database::new();
        db.signal_ready("q");
        db.signal_ready("q");
        assert_eq!(db.take_ready_keys(), vec!["q"]);
        assert!(db.take_ready_keys().is_empty());
    }
}
