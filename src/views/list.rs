use crate::cmd::{FromReply, ToArg, cmd};
use crate::error::{Error, Result};
use crate::key::IntoKey;
use crate::store::SharedStore;
use crate::views::{describe, inclusive_stop};

/// A store list, indexed like a double-ended vector.
///
/// Ranges take an exclusive `stop` (`None` for "to the end"), negative
/// indices count from the back.
#[derive(Clone)]
pub struct ListView {
    key: String,
    store: SharedStore,
}

impl ListView {
    pub fn new(key: impl IntoKey, store: SharedStore) -> Self {
        ListView {
            key: key.into_key(),
            store,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Element at `index`; `OutOfRange` past either end.
    pub async fn get<T: FromReply>(&self, index: i64) -> Result<T> {
        let value: Option<T> = cmd("LINDEX").arg(&self.key).arg(index).query(&*self.store).await?;
        value.ok_or(Error::OutOfRange)
    }

    pub async fn set(&self, index: i64, value: impl ToArg) -> Result<()> {
        cmd("LSET")
            .arg(&self.key)
            .arg(index)
            .arg(value)
            .query(&*self.store)
            .await
            .map_err(|e| {
                if e.is_upstream("index out of range") || e.is_upstream("no such key") {
                    Error::OutOfRange
                } else {
                    e
                }
            })
    }

    pub async fn len(&self) -> Result<usize> {
        cmd("LLEN").arg(&self.key).query(&*self.store).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn to_vec<T: FromReply>(&self) -> Result<Vec<T>> {
        self.slice(0, None).await
    }

    /// Elements in `start..stop`.
    pub async fn slice<T: FromReply>(&self, start: i64, stop: Option<i64>) -> Result<Vec<T>> {
        let Some(stop) = inclusive_stop(stop) else {
            return Ok(Vec::new());
        };
        cmd("LRANGE")
            .arg(&self.key)
            .arg(start)
            .arg(stop)
            .query(&*self.store)
            .await
    }

    /// Append; returns the new length.
    pub async fn push_back(&self, value: impl ToArg) -> Result<usize> {
        cmd("RPUSH").arg(&self.key).arg(value).query(&*self.store).await
    }

    pub async fn push_front(&self, value: impl ToArg) -> Result<usize> {
        cmd("LPUSH").arg(&self.key).arg(value).query(&*self.store).await
    }

    pub async fn pop_back<T: FromReply>(&self) -> Result<Option<T>> {
        cmd("RPOP").arg(&self.key).query(&*self.store).await
    }

    pub async fn pop_front<T: FromReply>(&self) -> Result<Option<T>> {
        cmd("LPOP").arg(&self.key).query(&*self.store).await
    }

    /// Keep only `start..stop`.
    pub async fn trim(&self, start: i64, stop: Option<i64>) -> Result<()> {
        // An empty range: any start past stop clears the list.
        let (start, stop) = match inclusive_stop(stop) {
            Some(stop) => (start, stop),
            None => (1, 0),
        };
        cmd("LTRIM")
            .arg(&self.key)
            .arg(start)
            .arg(stop)
            .query(&*self.store)
            .await
    }

    /// Remove occurrences of `value`: `count > 0` from the head, `< 0` from
    /// the tail, `0` all of them. `ValueNotMember` if nothing was removed.
    pub async fn remove(&self, value: impl ToArg, count: i64) -> Result<usize> {
        let removed: usize = cmd("LREM")
            .arg(&self.key)
            .arg(count)
            .arg(&value)
            .query(&*self.store)
            .await?;
        if removed == 0 {
            return Err(Error::ValueNotMember(describe(&value)));
        }
        Ok(removed)
    }

    /// Append every value in one push.
    pub async fn extend<I>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.push_many("RPUSH", values).await
    }

    /// Prepend every value in one push; the last value ends up first.
    pub async fn extend_front<I>(&self, values: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.push_many("LPUSH", values).await
    }

    async fn push_many<I>(&self, name: &str, values: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let push = cmd(name).arg(&self.key).args(values);
        if push.arg_values().len() == 1 {
            return self.len().await;
        }
        push.query(&*self.store).await
    }
}

impl std::fmt::Debug for ListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView").field("key", &self.key).finish()
    }
}
