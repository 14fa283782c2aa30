//! The store handle: anything that executes named commands against a
//! key-addressed store.

pub mod database;
pub mod memory;

pub use database::Database;
pub use memory::MemoryStore;

use crate::cmd::{Cmd, check_reply};
use crate::error::Result;
use crate::resp::RespValue;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

#[async_trait]
pub trait Store: Send + Sync {
    /// Run one command. An error reply comes back as `Error::Upstream`.
    async fn execute(&self, cmd: Cmd) -> Result<RespValue>;

    /// Run several commands in one round trip without interleaving other
    /// clients' commands. Per-command error replies are returned in place as
    /// `RespValue::Error`; a failure of the batch itself is an `Err`.
    async fn execute_batch(&self, cmds: Vec<Cmd>) -> Result<Vec<RespValue>>;
}

pub type SharedStore = Arc<dyn Store>;

/// Run a batch and fail with the first per-command error reply. Commands
/// after the failing one have still been applied; nothing is rolled back.
pub async fn run_batch<S: Store + ?Sized>(store: &S, cmds: Vec<Cmd>) -> Result<Vec<RespValue>> {
    let names: Vec<String> = cmds.iter().map(|c| c.name().to_string()).collect();
    let replies = store.execute_batch(cmds).await?;
    let mut checked = Vec::with_capacity(replies.len());
    for (name, reply) in names.iter().zip(replies) {
        match check_reply(reply) {
            Ok(reply) => checked.push(reply),
            Err(e) => {
                warn!("batch command {name} failed: {e}");
                return Err(e);
            }
        }
    }
    Ok(checked)
}
