use crate::cmd::{FromReply, ToArg, cmd};
use crate::error::{Error, Result};
use crate::key::IntoKey;
use crate::store::SharedStore;
use crate::views::describe;
use std::collections::HashSet;
use std::hash::Hash;

/// A store set.
#[derive(Clone)]
pub struct SetView {
    key: String,
    store: SharedStore,
}

impl SetView {
    pub fn new(key: impl IntoKey, store: SharedStore) -> Self {
        SetView {
            key: key.into_key(),
            store,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True if `member` was not already present.
    pub async fn add(&self, member: impl ToArg) -> Result<bool> {
        cmd("SADD").arg(&self.key).arg(member).query(&*self.store).await
    }

    /// `NotFound` if `member` was absent.
    pub async fn remove(&self, member: impl ToArg) -> Result<()> {
        let removed: bool = cmd("SREM").arg(&self.key).arg(&member).query(&*self.store).await?;
        if !removed {
            return Err(Error::NotFound(describe(&member)));
        }
        Ok(())
    }

    /// Remove and return an arbitrary member; `Empty` if there is none.
    pub async fn pop<T: FromReply>(&self) -> Result<T> {
        let member: Option<T> = cmd("SPOP").arg(&self.key).query(&*self.store).await?;
        member.ok_or(Error::Empty)
    }

    pub async fn contains(&self, member: impl ToArg) -> Result<bool> {
        cmd("SISMEMBER").arg(&self.key).arg(member).query(&*self.store).await
    }

    pub async fn len(&self) -> Result<usize> {
        cmd("SCARD").arg(&self.key).query(&*self.store).await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    pub async fn members<T: FromReply + Eq + Hash>(&self) -> Result<HashSet<T>> {
        cmd("SMEMBERS").arg(&self.key).query(&*self.store).await
    }

    /// Add every member in one command; returns how many were new.
    pub async fn extend<I>(&self, members: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        let add = cmd("SADD").arg(&self.key).args(members);
        if add.arg_values().len() == 1 {
            return Ok(0);
        }
        add.query(&*self.store).await
    }

    pub async fn union<T: FromReply + Eq + Hash>(&self, other: &SetView) -> Result<HashSet<T>> {
        self.combine("SUNION", other).await
    }

    pub async fn intersection<T: FromReply + Eq + Hash>(&self, other: &SetView) -> Result<HashSet<T>> {
        self.combine("SINTER", other).await
    }

    pub async fn difference<T: FromReply + Eq + Hash>(&self, other: &SetView) -> Result<HashSet<T>> {
        self.combine("SDIFF", other).await
    }

    /// Store `self | other` into this key; returns the new size.
    pub async fn union_update(&self, other: &SetView) -> Result<usize> {
        self.combine_store("SUNIONSTORE", other).await
    }

    pub async fn intersection_update(&self, other: &SetView) -> Result<usize> {
        self.combine_store("SINTERSTORE", other).await
    }

    pub async fn difference_update(&self, other: &SetView) -> Result<usize> {
        self.combine_store("SDIFFSTORE", other).await
    }

    async fn combine<T: FromReply + Eq + Hash>(&self, name: &str, other: &SetView) -> Result<HashSet<T>> {
        cmd(name).arg(&self.key).arg(&other.key).query(&*self.store).await
    }

    async fn combine_store(&self, name: &str, other: &SetView) -> Result<usize> {
        cmd(name)
            .arg(&self.key)
            .arg(&self.key)
            .arg(&other.key)
            .query(&*self.store)
            .await
    }
}

impl std::fmt::Debug for SetView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetView").field("key", &self.key).finish()
    }
}
