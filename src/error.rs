use crate::resp::RespError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A key, member or field was absent on read, delete or remove.
    #[error("no such key: {0}")]
    NotFound(String),

    #[error("index out of range")]
    OutOfRange,

    #[error("collection is empty")]
    Empty,

    #[error("queue is full")]
    Full,

    #[error("value not in list: {0}")]
    ValueNotMember(String),

    /// Error reply from the store, passed through verbatim.
    #[error("{0}")]
    Upstream(String),

    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: String,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("keyspace error: {0}")]
    Keyspace(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] RespError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unexpected(expected: &'static str, got: impl Into<String>) -> Self {
        Error::UnexpectedReply {
            expected,
            got: got.into(),
        }
    }

    /// True if this is an error reply whose message contains `needle`.
    pub fn is_upstream(&self, needle: &str) -> bool {
        matches!(self, Error::Upstream(msg) if msg.contains(needle))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
