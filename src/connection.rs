use crate::cmd::{Cmd, cmd};
use crate::command;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::resp::{RespParser, RespValue};
use crate::store::Store;
use async_trait::async_trait;
use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

/// Socket plus whatever part of the next reply has already arrived.
#[derive(Debug)]
struct Wire {
    stream: TcpStream,
    buf: BytesMut,
    /// Set while a request is on the wire; still set on the next lock means
    /// the caller was dropped mid-exchange and a reply may be left unread.
    in_flight: bool,
}

impl Wire {
    async fn open(addr: &str, db: i64) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let mut wire = Wire {
            stream,
            buf: BytesMut::with_capacity(4096),
            in_flight: false,
        };
        if db != 0 {
            match wire.request(&cmd("SELECT").arg(db).to_resp().serialize()).await? {
                RespValue::Error(msg) => return Err(Error::Upstream(msg)),
                _ => debug!("selected db {db}"),
            }
        }
        Ok(wire)
    }

    async fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.stream.write_all(payload).await?;
        Ok(())
    }

    /// Read exactly one reply, pulling more bytes off the socket as needed.
    async fn read_reply(&mut self) -> Result<RespValue> {
        loop {
            if let Some(reply) = RespParser::parse(&mut self.buf)? {
                return Ok(reply);
            }
            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }
        }
    }

    /// One command out, one reply back.
    async fn request(&mut self, payload: &[u8]) -> Result<RespValue> {
        self.in_flight = true;
        self.send(payload).await?;
        let reply = self.read_reply().await?;
        self.in_flight = false;
        Ok(reply)
    }
}

/// A RESP connection to a Redis-compatible server.
///
/// Commands on one `Connection` are serialized: the socket sits behind a
/// mutex held for the full request/reply exchange, batches included.
/// Blocking pops run on side connections from a small idle pool so they
/// never hold up other commands.
#[derive(Debug)]
pub struct Connection {
    wire: Mutex<Wire>,
    idle: Mutex<Vec<Wire>>,
    addr: String,
    db: i64,
}

impl Connection {
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let addr = config.addr();
        let wire = Wire::open(&addr, config.db).await?;
        debug!("connected to {addr}");
        Ok(Connection {
            wire: Mutex::new(wire),
            idle: Mutex::new(Vec::new()),
            addr,
            db: config.db,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Lock the main socket, replacing it if a previous exchange never
    /// finished.
    async fn lock_wire(&self) -> Result<MutexGuard<'_, Wire>> {
        let mut wire = self.wire.lock().await;
        if wire.in_flight {
            warn!("{}: previous request was interrupted, reconnecting", self.addr);
            *wire = Wire::open(&self.addr, self.db).await?;
        }
        Ok(wire)
    }

    /// Run a blocking command on a side connection. A cancelled wait drops
    /// its socket instead of returning it to the pool.
    async fn execute_blocking(&self, cmd: &Cmd) -> Result<RespValue> {
        let pooled = self.idle.lock().await.pop();
        let mut wire = match pooled {
            Some(wire) => wire,
            None => {
                trace!("{}: opening side connection for {}", self.addr, cmd.name());
                Wire::open(&self.addr, self.db).await?
            }
        };
        let reply = wire.request(&cmd.to_resp().serialize()).await?;
        let mut idle = self.idle.lock().await;
        if idle.len() < MAX_IDLE {
            idle.push(wire);
        }
        Ok(reply)
    }
}

/// Side connections kept open for reuse.
const MAX_IDLE: usize = 4;

#[async_trait]
impl Store for Connection {
    async fn execute(&self, cmd: Cmd) -> Result<RespValue> {
        trace!("{}: {cmd}", self.addr);
        let reply = if command::is_blocking(cmd.name()) {
            self.execute_blocking(&cmd).await?
        } else {
            self.lock_wire().await?.request(&cmd.to_resp().serialize()).await?
        };
        match reply {
            RespValue::Error(msg) => Err(Error::Upstream(msg)),
            reply => Ok(reply),
        }
    }

    /// Sent as `MULTI`, the commands, `EXEC` in a single write.
    async fn execute_batch(&self, cmds: Vec<Cmd>) -> Result<Vec<RespValue>> {
        if cmds.is_empty() {
            return Ok(Vec::new());
        }
        trace!("{}: batch of {}", self.addr, cmds.len());

        let mut payload = Vec::new();
        cmd("MULTI").to_resp().write_to(&mut payload);
        for c in &cmds {
            c.to_resp().write_to(&mut payload);
        }
        cmd("EXEC").to_resp().write_to(&mut payload);

        let mut wire = self.lock_wire().await?;
        wire.in_flight = true;
        wire.send(&payload).await?;

        // MULTI's +OK, one +QUEUED per command, then EXEC's array. Every reply
        // is drained even after a failure so the stream stays in sync.
        let mut queue_error = match wire.read_reply().await? {
            RespValue::Error(msg) => Some(msg),
            _ => None,
        };
        for _ in &cmds {
            if let RespValue::Error(msg) = wire.read_reply().await? {
                queue_error.get_or_insert(msg);
            }
        }
        let exec = wire.read_reply().await?;
        wire.in_flight = false;
        if let Some(msg) = queue_error {
            return Err(Error::Upstream(msg));
        }
        match exec {
            RespValue::Array(Some(replies)) if replies.len() == cmds.len() => Ok(replies),
            RespValue::Array(None) => Err(Error::Upstream("EXECABORT transaction discarded".into())),
            RespValue::Error(msg) => Err(Error::Upstream(msg)),
            other => Err(Error::unexpected("EXEC reply array", other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Answers every command with `+NAME`, taking 200 ms for `SLOW`.
    async fn echo_server() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = BytesMut::new();
                    loop {
                        let name = match RespParser::parse(&mut buf) {
                            Ok(Some(RespValue::Array(Some(items)))) => {
                                items[0].to_string_lossy().unwrap_or_default()
                            }
                            Ok(Some(_)) | Err(_) => return,
                            Ok(None) => match socket.read_buf(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(_) => continue,
                            },
                        };
                        if name == "SLOW" {
                            tokio::time::sleep(Duration::from_millis(200)).await;
                        }
                        let reply = RespValue::simple_string(name).serialize();
                        if socket.write_all(&reply).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        port
    }

    #[tokio::test]
    async fn test_interrupted_request_reconnects() {
        let port = echo_server().await;
        let config = ClientConfig {
            port,
            ..Default::default()
        };
        let conn = Connection::connect(&config).await.unwrap();
        assert_eq!(conn.execute(cmd("PING")).await.unwrap(), RespValue::simple_string("PING"));

        let slow = tokio::time::timeout(Duration::from_millis(20), conn.execute(cmd("SLOW"))).await;
        assert!(slow.is_err());

        // The SLOW reply must not be taken for the answer to ECHO.
        assert_eq!(conn.execute(cmd("ECHO")).await.unwrap(), RespValue::simple_string("ECHO"));
        assert_eq!(conn.execute(cmd("PING")).await.unwrap(), RespValue::simple_string("PING"));
    }
}
