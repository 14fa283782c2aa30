use super::normalize_range;
use std::collections::VecDeque;

/// List value: a VecDeque so both ends push and pop in O(1).
#[derive(Debug, Clone, Default)]
pub struct RedisList {
    data: VecDeque<Vec<u8>>,
}

impl RedisList {
    pub fn new() -> Self {
        RedisList::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn lpush(&mut self, value: Vec<u8>) {
        self.data.push_front(value);
    }

    pub fn rpush(&mut self, value: Vec<u8>) {
        self.data.push_back(value);
    }

    pub fn lpop(&mut self) -> Option<Vec<u8>> {
        self.data.pop_front()
    }

    pub fn rpop(&mut self) -> Option<Vec<u8>> {
        self.data.pop_back()
    }

    pub fn lindex(&self, index: i64) -> Option<&Vec<u8>> {
        self.data.get(self.resolve_index(index)?)
    }

    /// Replace the element at `index`. False if the index is out of range.
    pub fn lset(&mut self, index: i64, value: Vec<u8>) -> bool {
        match self.resolve_index(index).and_then(|idx| self.data.get_mut(idx)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn lrange(&self, start: i64, stop: i64) -> Vec<&Vec<u8>> {
        match normalize_range(start, stop, self.data.len()) {
            Some(range) => self.data.range(range).collect(),
            None => Vec::new(),
        }
    }

    /// Remove up to `count` occurrences of `value`: from the head when
    /// positive, from the tail when negative, all of them when zero.
    pub fn lrem(&mut self, count: i64, value: &[u8]) -> i64 {
        let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
        let positions: Vec<usize> = if count >= 0 {
            self.positions(value).take(limit).collect()
        } else {
            self.positions(value).rev().take(limit).collect()
        };
        let mut sorted = positions;
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        for idx in &sorted {
            self.data.remove(*idx);
        }
        sorted.len() as i64
    }

    /// Keep only `start..=stop`; an empty range clears the list.
    pub fn ltrim(&mut self, start: i64, stop: i64) {
        match normalize_range(start, stop, self.data.len()) {
            Some(range) => {
                self.data.truncate(range.end() + 1);
                self.data.drain(..*range.start());
            }
            None => self.data.clear(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.data.iter()
    }

    fn positions<'a>(&'a self, value: &'a [u8]) -> impl DoubleEndedIterator<Item = usize> + 'a {
        self.data
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.as_slice() == value)
            .map(|(i, _)| i)
    }

    fn resolve_index(&self, index: i64) -> Option<usize> {
        let len = self.data.len() as i64;
        let idx = if index < 0 { len + index } else { index };
        (0..len).contains(&idx).then_some(idx as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(items: &[&str]) -> RedisList {
        let mut list = RedisList::new();
        for item in items {
            list.rpush(item.as_bytes().to_vec());
        }
        list
    }

    fn contents(list: &RedisList) -> Vec<String> {
        list.iter().map(|v| String::from_utf8_lossy(v).into_owned()).collect()
    }

    #[test]
    fn test_index_and_set() {
        let mut list = list_of(&["a", "b", "c"]);
        assert_eq!(list.lindex(-1), Some(&b"c".to_vec()));
        assert_eq!(list.lindex(3), None);
        assert!(list.lset(-3, b"z".to_vec()));
        assert!(!list.lset(5, b"q".to_vec()));
        assert_eq!(contents(&list), vec!["z", "b", "c"]);
    }

    #[test]
    fn test_lrem_directions() {
        let mut list = list_of(&["x", "a", "x", "b", "x"]);
        assert_eq!(list.lrem(-1, b"x"), 1);
        assert_eq!(contents(&list), vec!["x", "a", "x", "b"]);
        assert_eq!(list.lrem(1, b"x"), 1);
        assert_eq!(contents(&list), vec!["a", "x", "b"]);
        assert_eq!(list.lrem(0, b"x"), 1);
        assert_eq!(list.lrem(0, b"missing"), 0);
        assert_eq!(contents(&list), vec!["a", "b"]);
    }

    #[test]
    fn test_ltrim() {
        let mut list = list_of(&["a", "b", "c", "d"]);
        list.ltrim(1, -2);
        assert_eq!(contents(&list), vec!["b", "c"]);
        list.ltrim(5, 10);
        assert!(list.is_empty());
    }
}
