use super::normalize_range;
use std::collections::{BTreeSet, HashMap};

/// Sorted set value.
///
/// `scores` answers member lookups; `order` keeps (score, member) pairs in
/// iteration order so ranks and rank ranges walk a BTreeSet.
#[derive(Debug, Clone, Default)]
pub struct RedisSortedSet {
    scores: HashMap<Vec<u8>, f64>,
    order: BTreeSet<SortedSetKey>,
}

/// Orders by score first, then by member bytes.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct SortedSetKey {
    score_bits: u64,
    member: Vec<u8>,
}

impl SortedSetKey {
    fn new(score: f64, member: Vec<u8>) -> Self {
        SortedSetKey {
            score_bits: f64_to_orderable(score),
            member,
        }
    }
}

/// Map f64 bits onto u64 so that integer order matches float order.
fn f64_to_orderable(f: f64) -> u64 {
    let bits = f.to_bits();
    if bits >> 63 == 1 { !bits } else { bits ^ (1 << 63) }
}

impl RedisSortedSet {
    pub fn new() -> Self {
        RedisSortedSet::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Add a member or move it to a new score. Returns true if it was new.
    pub fn add(&mut self, member: Vec<u8>, score: f64) -> bool {
        let previous = self.scores.insert(member.clone(), score);
        if let Some(old) = previous {
            self.order.remove(&SortedSetKey::new(old, member.clone()));
        }
        self.order.insert(SortedSetKey::new(score, member));
        previous.is_none()
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.order.remove(&SortedSetKey::new(score, member.to_vec()));
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &[u8]) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Zero-based position in ascending order.
    pub fn rank(&self, member: &[u8]) -> Option<usize> {
        let key = SortedSetKey::new(self.score(member)?, member.to_vec());
        Some(self.order.range(..&key).count())
    }

    /// Zero-based position in descending order.
    pub fn rev_rank(&self, member: &[u8]) -> Option<usize> {
        Some(self.len() - 1 - self.rank(member)?)
    }

    /// Add `delta` to a member's score (a missing member starts at 0).
    pub fn incr_by(&mut self, member: Vec<u8>, delta: f64) -> f64 {
        let new_score = self.score(&member).unwrap_or(0.0) + delta;
        self.add(member, new_score);
        new_score
    }

    /// Members by ascending rank range, inclusive on both ends.
    pub fn range(&self, start: i64, stop: i64) -> Vec<(&[u8], f64)> {
        self.rank_range(start, stop, false)
    }

    /// Members by descending rank range, inclusive on both ends.
    pub fn rev_range(&self, start: i64, stop: i64) -> Vec<(&[u8], f64)> {
        self.rank_range(start, stop, true)
    }

    /// Members with `min <= score <= max`, ascending.
    pub fn range_by_score(&self, min: f64, max: f64) -> Vec<(&[u8], f64)> {
        if min > max {
            return Vec::new();
        }
        let lower = SortedSetKey::new(min, Vec::new());
        self.order
            .range(lower..)
            .map(|k| (k.member.as_slice(), self.scores[&k.member]))
            .take_while(|(_, score)| *score <= max)
            .collect()
    }

    /// All (member, score) pairs in ascending order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&[u8], f64)> {
        self.order
            .iter()
            .map(|k| (k.member.as_slice(), self.scores[&k.member]))
    }

    fn rank_range(&self, start: i64, stop: i64, reverse: bool) -> Vec<(&[u8], f64)> {
        let Some(range) = normalize_range(start, stop, self.len()) else {
            return Vec::new();
        };
        let skip = *range.start();
        let take = range.end() - range.start() + 1;
        let pairs = self.iter();
        if reverse {
            pairs.rev().skip(skip).take(take).collect()
        } else {
            pairs.skip(skip).take(take).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RedisSortedSet {
        let mut z = RedisSortedSet::new();
        z.add(b"foo".to_vec(), 0.9);
        z.add(b"bar".to_vec(), 0.1);
        z.add(b"baz".to_vec(), 0.3);
        z
    }

    fn members(pairs: Vec<(&[u8], f64)>) -> Vec<String> {
        pairs
            .into_iter()
            .map(|(m, _)| String::from_utf8_lossy(m).into_owned())
            .collect()
    }

    #[test]
    fn test_order_and_rank() {
        let z = sample();
        assert_eq!(members(z.range(0, -1)), vec!["bar", "baz", "foo"]);
        assert_eq!(members(z.rev_range(0, 0)), vec!["foo"]);
        assert_eq!(z.rank(b"bar"), Some(0));
        assert_eq!(z.rev_rank(b"bar"), Some(2));
        assert_eq!(z.rank(b"nope"), None);
    }

    #[test]
    fn test_equal_scores_order_by_member() {
        let mut z = RedisSortedSet::new();
        z.add(b"b".to_vec(), 1.0);
        z.add(b"a".to_vec(), 1.0);
        z.add(b"c".to_vec(), -2.5);
        assert_eq!(members(z.range(0, -1)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_rescore_and_incr() {
        let mut z = sample();
        assert!(!z.add(b"bar".to_vec(), 5.0));
        assert_eq!(z.rank(b"bar"), Some(2));
        assert_eq!(z.incr_by(b"bar".to_vec(), 1.5), 6.5);
        assert_eq!(z.incr_by(b"new".to_vec(), 2.0), 2.0);
        assert_eq!(z.len(), 4);
    }

    #[test]
    fn test_range_by_score() {
        let z = sample();
        assert_eq!(members(z.range_by_score(0.1, 0.3)), vec!["bar", "baz"]);
        assert_eq!(members(z.range_by_score(f64::NEG_INFINITY, f64::INFINITY)).len(), 3);
        assert!(z.range_by_score(1.0, 0.0).is_empty());
    }
}
