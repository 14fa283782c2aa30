use rand::seq::IteratorRandom;
use std::collections::HashSet;

/// Set value.
#[derive(Debug, Clone, Default)]
pub struct RedisSet {
    data: HashSet<Vec<u8>>,
}

impl RedisSet {
    pub fn new() -> Self {
        RedisSet::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Add a member. Returns true if the member was new.
    pub fn add(&mut self, member: Vec<u8>) -> bool {
        self.data.insert(member)
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        self.data.remove(member)
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.data.contains(member)
    }

    pub fn union(&self, other: &RedisSet) -> RedisSet {
        RedisSet {
            data: self.data.union(&other.data).cloned().collect(),
        }
    }

    pub fn intersect(&self, other: &RedisSet) -> RedisSet {
        RedisSet {
            data: self.data.intersection(&other.data).cloned().collect(),
        }
    }

    pub fn difference(&self, other: &RedisSet) -> RedisSet {
        RedisSet {
            data: self.data.difference(&other.data).cloned().collect(),
        }
    }

    /// Remove and return a random member.
    pub fn pop(&mut self) -> Option<Vec<u8>> {
        let member = self.data.iter().choose(&mut rand::thread_rng())?.clone();
        self.data.remove(&member);
        Some(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.data.iter()
    }
}
