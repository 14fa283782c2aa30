use crate::cmd::cmd;
use crate::error::Result;
use crate::key::IntoKey;
use crate::store::SharedStore;

/// An integer kept in a plain string key and changed atomically store-side.
#[derive(Clone)]
pub struct Counter {
    key: String,
    store: SharedStore,
}

impl Counter {
    pub fn new(key: impl IntoKey, store: SharedStore) -> Self {
        Counter {
            key: key.into_key(),
            store,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value; a missing key reads as 0.
    pub async fn get(&self) -> Result<i64> {
        let value: Option<i64> = cmd("GET").arg(&self.key).query(&*self.store).await?;
        Ok(value.unwrap_or(0))
    }

    pub async fn set(&self, value: i64) -> Result<()> {
        cmd("SET").arg(&self.key).arg(value).query(&*self.store).await
    }

    pub async fn incr(&self) -> Result<i64> {
        cmd("INCR").arg(&self.key).query(&*self.store).await
    }

    pub async fn decr(&self) -> Result<i64> {
        cmd("DECR").arg(&self.key).query(&*self.store).await
    }

    pub async fn incr_by(&self, amount: i64) -> Result<i64> {
        cmd("INCRBY").arg(&self.key).arg(amount).query(&*self.store).await
    }

    pub async fn decr_by(&self, amount: i64) -> Result<i64> {
        cmd("DECRBY").arg(&self.key).arg(amount).query(&*self.store).await
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_counting() {
        let c = Counter::new(["hits", "home"], Arc::new(MemoryStore::new()));
        assert_eq!(c.key(), "hits:home");
        assert_eq!(c.get().await.unwrap(), 0);
        assert_eq!(c.incr().await.unwrap(), 1);
        assert_eq!(c.incr_by(10).await.unwrap(), 11);
        assert_eq!(c.decr().await.unwrap(), 10);
        assert_eq!(c.decr_by(4).await.unwrap(), 6);
        c.set(-3).await.unwrap();
        assert_eq!(c.get().await.unwrap(), -3);
    }
}
