use std::collections::HashMap;

/// Hash value: field to value, both binary-safe.
#[derive(Debug, Clone, Default)]
pub struct RedisHash {
    data: HashMap<Vec<u8>, Vec<u8>>,
}

impl RedisHash {
    pub fn new() -> Self {
        RedisHash::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, field: &[u8]) -> Option<&Vec<u8>> {
        self.data.get(field)
    }

    /// Set a field. Returns true if the field is new.
    pub fn set(&mut self, field: Vec<u8>, value: Vec<u8>) -> bool {
        self.data.insert(field, value).is_none()
    }

    pub fn del(&mut self, field: &[u8]) -> bool {
        self.data.remove(field).is_some()
    }

    pub fn exists(&self, field: &[u8]) -> bool {
        self.data.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &Vec<u8>)> {
        self.data.iter()
    }
}
