use crate::cmd::{FromReply, ToArg, cmd, pairs};
use crate::error::{Error, Result};
use crate::key::IntoKey;
use crate::resp::RespValue;
use crate::store::SharedStore;
use crate::views::{describe, inclusive_stop};

/// A store sorted set, ordered by (score, member) ascending.
#[derive(Clone)]
pub struct SortedSetView {
    key: String,
    store: SharedStore,
}

impl SortedSetView {
    pub fn new(key: impl IntoKey, store: SharedStore) -> Self {
        SortedSetView {
            key: key.into_key(),
            store,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add `member` or move it to `score`. True if it was new.
    pub async fn add(&self, member: impl ToArg, score: f64) -> Result<bool> {
        cmd("ZADD")
            .arg(&self.key)
            .arg(score)
            .arg(member)
            .query(&*self.store)
            .await
    }

    pub async fn remove(&self, member: impl ToArg) -> Result<()> {
        let removed: bool = cmd("ZREM").arg(&self.key).arg(&member).query(&*self.store).await?;
        if !removed {
            return Err(Error::NotFound(describe(&member)));
        }
        Ok(())
    }

    pub async fn len(&self) -> Result<usize> {
        cmd("ZCARD").arg(&self.key).query(&*self.store).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn members<T: FromReply>(&self) -> Result<Vec<T>> {
        self.slice(0, None).await
    }

    /// Every member with its score, in order.
    pub async fn items<T: FromReply>(&self) -> Result<Vec<(T, f64)>> {
        let reply: RespValue = cmd("ZRANGE")
            .arg(&self.key)
            .arg(0)
            .arg(-1)
            .arg("WITHSCORES")
            .query(&*self.store)
            .await?;
        pairs(reply)
    }

    /// Members ranked `start..stop` ascending.
    pub async fn slice<T: FromReply>(&self, start: i64, stop: Option<i64>) -> Result<Vec<T>> {
        self.rank_range("ZRANGE", start, stop).await
    }

    /// Members ranked `start..stop` descending.
    pub async fn rev_range<T: FromReply>(&self, start: i64, stop: Option<i64>) -> Result<Vec<T>> {
        self.rank_range("ZREVRANGE", start, stop).await
    }

    async fn rank_range<T: FromReply>(&self, name: &str, start: i64, stop: Option<i64>) -> Result<Vec<T>> {
        let Some(stop) = inclusive_stop(stop) else {
            return Ok(Vec::new());
        };
        cmd(name)
            .arg(&self.key)
            .arg(start)
            .arg(stop)
            .query(&*self.store)
            .await
    }

    /// Add `amount` to the member's score (creating it at 0); returns the new score.
    pub async fn increment(&self, member: impl ToArg, amount: f64) -> Result<f64> {
        cmd("ZINCRBY")
            .arg(&self.key)
            .arg(amount)
            .arg(member)
            .query(&*self.store)
            .await
    }

    pub async fn rank(&self, member: impl ToArg) -> Result<usize> {
        self.position("ZRANK", member).await
    }

    pub async fn reverse_rank(&self, member: impl ToArg) -> Result<usize> {
        self.position("ZREVRANK", member).await
    }

    async fn position(&self, name: &str, member: impl ToArg) -> Result<usize> {
        let rank: Option<usize> = cmd(name).arg(&self.key).arg(&member).query(&*self.store).await?;
        rank.ok_or_else(|| Error::NotFound(describe(&member)))
    }

    pub async fn score(&self, member: impl ToArg) -> Result<f64> {
        let score: Option<f64> = cmd("ZSCORE").arg(&self.key).arg(&member).query(&*self.store).await?;
        score.ok_or_else(|| Error::NotFound(describe(&member)))
    }

    /// Members with `min <= score <= max`, ascending.
    pub async fn range_by_score<T: FromReply>(&self, min: f64, max: f64) -> Result<Vec<T>> {
        cmd("ZRANGEBYSCORE")
            .arg(&self.key)
            .arg(min)
            .arg(max)
            .query(&*self.store)
            .await
    }

    /// Add or rescore many members with one `ZADD`; returns how many were new.
    pub async fn update<I, M>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (M, f64)>,
        M: ToArg,
    {
        let mut zadd = cmd("ZADD").arg(&self.key);
        for (member, score) in entries {
            zadd = zadd.arg(score).arg(member);
        }
        if zadd.arg_values().len() == 1 {
            return Ok(0);
        }
        zadd.query(&*self.store).await
    }
}

impl std::fmt::Debug for SortedSetView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedSetView").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn scores() -> SortedSetView {
        let z = SortedSetView::new("z", Arc::new(MemoryStore::new()));
        z.update([("foo", 1.0), ("bar", 2.0), ("baz", 2.0)]).await.unwrap();
        z
    }

    #[tokio::test]
    async fn test_order_is_score_then_member() {
        let z = scores().await;
        assert_eq!(z.members::<String>().await.unwrap(), ["foo", "bar", "baz"]);
        assert_eq!(z.rank("baz").await.unwrap(), 2);
        assert_eq!(z.reverse_rank("baz").await.unwrap(), 0);
        assert_eq!(z.rev_range::<String>(0, Some(2)).await.unwrap(), ["baz", "bar"]);
        assert_eq!(z.slice::<String>(1, None).await.unwrap(), ["bar", "baz"]);
    }

    #[tokio::test]
    async fn test_scores() {
        let z = scores().await;
        assert_eq!(z.increment("foo", 2.5).await.unwrap(), 3.5);
        assert_eq!(z.score("foo").await.unwrap(), 3.5);
        assert_eq!(
            z.items::<String>().await.unwrap(),
            vec![("bar".to_string(), 2.0), ("baz".to_string(), 2.0), ("foo".to_string(), 3.5)]
        );
        assert_eq!(z.range_by_score::<String>(2.0, 3.0).await.unwrap(), ["bar", "baz"]);
        assert!(matches!(z.score("nope").await, Err(Error::NotFound(_))));
        assert!(matches!(z.rank("nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_remove() {
        let z = scores().await;
        assert!(z.add("qux", -1.0).await.unwrap());
        assert!(!z.add("qux", -2.0).await.unwrap());
        assert_eq!(z.len().await.unwrap(), 4);
        z.remove("qux").await.unwrap();
        assert!(matches!(z.remove("qux").await, Err(Error::NotFound(_))));
        assert_eq!(z.update(Vec::<(String, f64)>::new()).await.unwrap(), 0);
    }
}
