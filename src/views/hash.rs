use crate::cmd::{FromReply, ToArg, cmd, pairs};
use crate::error::{Error, Result};
use crate::key::IntoKey;
use crate::resp::RespValue;
use crate::store::{SharedStore, run_batch};
use std::sync::Arc;

/// Produces a value for a missing field instead of failing the lookup.
pub type DefaultHook = Arc<dyn Fn(&str) -> Vec<u8> + Send + Sync>;

/// A store hash, used like a map from field names to values.
#[derive(Clone)]
pub struct HashView {
    key: String,
    store: SharedStore,
    default: Option<DefaultHook>,
}

impl HashView {
    pub fn new(key: impl IntoKey, store: SharedStore) -> Self {
        HashView {
            key: key.into_key(),
            store,
            default: None,
        }
    }

    /// Answer lookups of missing fields with `hook(field)`. Nothing is
    /// written back to the store.
    pub fn with_default(mut self, hook: impl Fn(&str) -> Vec<u8> + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(hook));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value of `field`; `NotFound` on a miss unless a default hook is set.
    pub async fn get<T: FromReply>(&self, field: &str) -> Result<T> {
        let reply: RespValue = cmd("HGET").arg(&self.key).arg(field).query(&*self.store).await?;
        if !reply.is_null() {
            return T::from_reply(reply);
        }
        match &self.default {
            Some(hook) => T::from_reply(RespValue::bulk_string(hook(field))),
            None => Err(Error::NotFound(field.to_string())),
        }
    }

    pub async fn get_or<T: FromReply>(&self, field: &str, default: T) -> Result<T> {
        let value: Option<T> = cmd("HGET").arg(&self.key).arg(field).query(&*self.store).await?;
        Ok(value.unwrap_or(default))
    }

    /// True if the field is new.
    pub async fn set(&self, field: &str, value: impl ToArg) -> Result<bool> {
        cmd("HSET")
            .arg(&self.key)
            .arg(field)
            .arg(value)
            .query(&*self.store)
            .await
    }

    pub async fn remove(&self, field: &str) -> Result<()> {
        let removed: bool = cmd("HDEL").arg(&self.key).arg(field).query(&*self.store).await?;
        if !removed {
            return Err(Error::NotFound(field.to_string()));
        }
        Ok(())
    }

    pub async fn contains(&self, field: &str) -> Result<bool> {
        cmd("HEXISTS").arg(&self.key).arg(field).query(&*self.store).await
    }

    pub async fn len(&self) -> Result<usize> {
        cmd("HLEN").arg(&self.key).query(&*self.store).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        cmd("HKEYS").arg(&self.key).query(&*self.store).await
    }

    pub async fn values<T: FromReply>(&self) -> Result<Vec<T>> {
        cmd("HVALS").arg(&self.key).query(&*self.store).await
    }

    pub async fn items<T: FromReply>(&self) -> Result<Vec<(String, T)>> {
        let reply: RespValue = cmd("HGETALL").arg(&self.key).query(&*self.store).await?;
        pairs(reply)
    }

    /// Value of `field`, first storing `default` there if it is missing.
    ///
    /// Read then write: a concurrent writer can land in between.
    pub async fn setdefault<T: FromReply>(&self, field: &str, default: impl ToArg) -> Result<T> {
        let current: RespValue = cmd("HGET").arg(&self.key).arg(field).query(&*self.store).await?;
        if !current.is_null() {
            return T::from_reply(current);
        }
        self.set(field, &default).await?;
        let mut encoded = Vec::new();
        default.write_arg(&mut encoded);
        T::from_reply(RespValue::bulk_string(encoded.concat()))
    }

    /// Remove `field` and return its value, read and delete in one batch.
    pub async fn pop<T: FromReply>(&self, field: &str) -> Result<Option<T>> {
        let replies = run_batch(
            &*self.store,
            vec![
                cmd("HGET").arg(&self.key).arg(field),
                cmd("HDEL").arg(&self.key).arg(field),
            ],
        )
        .await?;
        match replies.into_iter().next() {
            Some(value) => Option::<T>::from_reply(value),
            None => Err(Error::unexpected("two batch replies", "none")),
        }
    }

    /// Set many fields with one `HMSET`.
    pub async fn update<I, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, V)>,
        V: ToArg,
    {
        let mut hmset = cmd("HMSET").arg(&self.key);
        for (field, value) in entries {
            hmset = hmset.arg(field).arg(value);
        }
        if hmset.arg_values().len() == 1 {
            return Ok(());
        }
        hmset.query(&*self.store).await
    }
}

impl std::fmt::Debug for HashView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashView")
            .field("key", &self.key)
            .field("default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn view() -> HashView {
        HashView::new("h", Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_fields() {
        let h = view();
        assert!(h.set("a", 1i64).await.unwrap());
        assert!(!h.set("a", 2i64).await.unwrap());
        assert_eq!(h.get::<i64>("a").await.unwrap(), 2);
        assert!(matches!(h.get::<i64>("zz").await, Err(Error::NotFound(f)) if f == "zz"));
        assert_eq!(h.get_or("zz", 9i64).await.unwrap(), 9);
        assert!(h.contains("a").await.unwrap());
        h.remove("a").await.unwrap();
        assert!(matches!(h.remove("a").await, Err(Error::NotFound(_))));
        assert!(h.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_default_hook_does_not_write() {
        let h = view().with_default(|field| format!("default-{field}").into_bytes());
        assert_eq!(h.get::<String>("x").await.unwrap(), "default-x");
        assert!(!h.contains("x").await.unwrap());
    }

    #[tokio::test]
    async fn test_bulk_operations() {
        let h = view();
        h.update(vec![("a".to_string(), "1"), ("b".to_string(), "2")]).await.unwrap();
        h.update(Vec::<(String, String)>::new()).await.unwrap();
        let mut keys = h.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, ["a", "b"]);
        let mut items = h.items::<i64>().await.unwrap();
        items.sort();
        assert_eq!(items, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(h.setdefault::<String>("a", "x").await.unwrap(), "1");
        assert_eq!(h.setdefault::<String>("c", "3").await.unwrap(), "3");
        assert_eq!(h.pop::<String>("c").await.unwrap().as_deref(), Some("3"));
        assert_eq!(h.pop::<String>("c").await.unwrap(), None);
        assert_eq!(h.len().await.unwrap(), 2);
    }
}
