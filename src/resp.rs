use bytes::{Buf, BytesMut};
use std::io;

/// A RESP2 value. Used both for commands on the wire and for store replies.
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n  or  $-1\r\n (null)
    BulkString(Option<Vec<u8>>),
    /// *2\r\n...  or  *-1\r\n (null)
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    pub fn bulk_string(data: impl Into<Vec<u8>>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    pub fn null_bulk_string() -> Self {
        RespValue::BulkString(None)
    }

    pub fn null_array() -> Self {
        RespValue::Array(None)
    }

    pub fn array(items: Vec<RespValue>) -> Self {
        RespValue::Array(Some(items))
    }

    /// True for both null forms (`$-1` and `*-1`).
    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::BulkString(None) | RespValue::Array(None))
    }

    /// Short name of the reply shape, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            RespValue::SimpleString(_) => "simple string",
            RespValue::Error(_) => "error",
            RespValue::Integer(_) => "integer",
            RespValue::BulkString(None) => "nil",
            RespValue::BulkString(Some(_)) => "bulk string",
            RespValue::Array(None) => "nil array",
            RespValue::Array(Some(_)) => "array",
        }
    }

    /// Serialize this value to RESP bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    /// Write RESP bytes into the given buffer.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(b'+');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.push(b'-');
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.push(b':');
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::BulkString(None) => {
                buf.extend_from_slice(b"$-1\r\n");
            }
            RespValue::BulkString(Some(data)) => {
                buf.push(b'$');
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                buf.extend_from_slice(data);
                buf.extend_from_slice(b"\r\n");
            }
            RespValue::Array(None) => {
                buf.extend_from_slice(b"*-1\r\n");
            }
            RespValue::Array(Some(items)) => {
                buf.push(b'*');
                buf.extend_from_slice(items.len().to_string().as_bytes());
                buf.extend_from_slice(b"\r\n");
                for item in items {
                    item.write_to(buf);
                }
            }
        }
    }

    /// Borrow the payload of a bulk or simple string.
    pub fn as_str(&self) -> Option<&[u8]> {
        match self {
            RespValue::BulkString(Some(data)) => Some(data),
            RespValue::SimpleString(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Convert to a UTF-8 string, if possible.
    pub fn to_string_lossy(&self) -> Option<String> {
        self.as_str()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

/// Streaming RESP parser.
///
/// Handles partial reads; call `parse()` repeatedly as data arrives.
/// Returns `Ok(Some(value))` when a complete value is parsed,
/// `Ok(None)` when more data is needed.
pub struct RespParser;

impl RespParser {
    /// Try to parse a complete RESP value from the buffer.
    /// On success, consumes the parsed bytes from `buf` and returns the value.
    /// Returns `Ok(None)` if the buffer doesn't contain a complete value yet.
    pub fn parse(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        if buf.is_empty() {
            return Ok(None);
        }

        match buf[0] {
            b'+' => Self::parse_line(buf).map(|line| line.map(RespValue::SimpleString)),
            b'-' => Self::parse_line(buf).map(|line| line.map(RespValue::Error)),
            b':' => Self::parse_integer(buf),
            b'$' => Self::parse_bulk_string(buf),
            b'*' => Self::parse_array(buf),
            other => Err(RespError::InvalidByte(other)),
        }
    }

    fn parse_line(buf: &mut BytesMut) -> Result<Option<String>, RespError> {
        match find_crlf_from(buf, 1) {
            Some(end) => {
                let s = String::from_utf8_lossy(&buf[1..end]).to_string();
                buf.advance(end + 2);
                Ok(Some(s))
            }
            None => Ok(None),
        }
    }

    fn parse_integer(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let end = match find_crlf_from(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };
        let n = parse_length(&buf[1..end], "integer")?;
        buf.advance(end + 2);
        Ok(Some(RespValue::Integer(n)))
    }

    fn parse_bulk_string(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let crlf = match find_crlf_from(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len = parse_length(&buf[1..crlf], "bulk length")?;
        if len == -1 {
            buf.advance(crlf + 2);
            return Ok(Some(RespValue::BulkString(None)));
        }
        if !(0..=MAX_BULK_LEN).contains(&len) {
            return Err(RespError::InvalidData(format!("invalid bulk length {len}")));
        }

        let len = len as usize;
        let total_needed = crlf + 2 + len + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[crlf + 2 + len..total_needed] != b"\r\n" {
            return Err(RespError::InvalidData(
                "missing trailing CRLF after bulk string".into(),
            ));
        }

        let data = buf[crlf + 2..crlf + 2 + len].to_vec();
        buf.advance(total_needed);
        Ok(Some(RespValue::BulkString(Some(data))))
    }

    fn parse_array(buf: &mut BytesMut) -> Result<Option<RespValue>, RespError> {
        let crlf = match find_crlf_from(buf, 1) {
            Some(pos) => pos,
            None => return Ok(None),
        };

        let len = parse_length(&buf[1..crlf], "multibulk length")?;
        if len < 0 {
            buf.advance(crlf + 2);
            return Ok(Some(RespValue::Array(None)));
        }
        if len > MAX_ARRAY_LEN {
            return Err(RespError::InvalidData(format!("invalid multibulk length {len}")));
        }

        // Parse from a snapshot so a partial array leaves `buf` untouched.
        let mut rest = buf.clone();
        rest.advance(crlf + 2);

        let mut items = Vec::with_capacity(len as usize);
        for _ in 0..len {
            match Self::parse(&mut rest)? {
                Some(val) => items.push(val),
                None => return Ok(None),
            }
        }

        *buf = rest;
        Ok(Some(RespValue::Array(Some(items))))
    }
}

const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
const MAX_ARRAY_LEN: i64 = 1024 * 1024;

fn parse_length(raw: &[u8], what: &str) -> Result<i64, RespError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| RespError::InvalidData(format!("invalid {what}")))
}

/// Find \r\n starting from the given position.
fn find_crlf_from(buf: &[u8], start: usize) -> Option<usize> {
    if buf.len() < start + 2 {
        return None;
    }
    buf[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|pos| pos + start)
}

#[derive(Debug, thiserror::Error)]
pub enum RespError {
    #[error("unexpected type byte '{}'", *.0 as char)]
    InvalidByte(u8),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> RespValue {
        let mut buf = BytesMut::from(input);
        let value = RespParser::parse(&mut buf).unwrap().unwrap();
        assert!(buf.is_empty(), "parser left {} bytes", buf.len());
        value
    }

    #[test]
    fn test_parse_simple_string_and_error() {
        assert_eq!(parse_one("+OK\r\n"), RespValue::ok());
        assert_eq!(
            parse_one("-ERR no such key\r\n"),
            RespValue::Error("ERR no such key".to_string())
        );
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_one(":1000\r\n"), RespValue::Integer(1000));
        assert_eq!(parse_one(":-42\r\n"), RespValue::Integer(-42));
    }

    #[test]
    fn test_parse_bulk_strings() {
        assert_eq!(parse_one("$6\r\nfoobar\r\n"), RespValue::bulk_string("foobar"));
        assert_eq!(parse_one("$0\r\n\r\n"), RespValue::bulk_string(""));
        assert!(parse_one("$-1\r\n").is_null());
    }

    #[test]
    fn test_parse_nested_array() {
        let value = parse_one("*2\r\n*1\r\n:1\r\n*2\r\n$3\r\nfoo\r\n$-1\r\n");
        assert_eq!(
            value,
            RespValue::array(vec![
                RespValue::array(vec![RespValue::Integer(1)]),
                RespValue::array(vec![RespValue::bulk_string("foo"), RespValue::null_bulk_string()]),
            ])
        );
        assert!(parse_one("*-1\r\n").is_null());
    }

    #[test]
    fn test_partial_array_keeps_buffer() {
        let mut buf = BytesMut::from("*2\r\n$3\r\nfoo\r\n$3\r\nba");
        assert!(RespParser::parse(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"*2\r\n$3\r\nfoo\r\n$3\r\nba");

        buf.extend_from_slice(b"r\r\n");
        let value = RespParser::parse(&mut buf).unwrap().unwrap();
        assert_eq!(
            value,
            RespValue::array(vec![RespValue::bulk_string("foo"), RespValue::bulk_string("bar")])
        );
    }

    #[test]
    fn test_pipelined_replies() {
        let mut buf = BytesMut::from("+OK\r\n+QUEUED\r\n:3\r\n");
        assert_eq!(RespParser::parse(&mut buf).unwrap(), Some(RespValue::ok()));
        assert_eq!(
            RespParser::parse(&mut buf).unwrap(),
            Some(RespValue::simple_string("QUEUED"))
        );
        assert_eq!(RespParser::parse(&mut buf).unwrap(), Some(RespValue::Integer(3)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_rejects_garbage() {
        let mut buf = BytesMut::from("PING\r\n");
        assert!(matches!(
            RespParser::parse(&mut buf),
            Err(RespError::InvalidByte(b'P'))
        ));

        let mut buf = BytesMut::from("$3\r\nfooXX");
        assert!(RespParser::parse(&mut buf).is_err());
    }

    #[test]
    fn test_serialize_command_array() {
        let cmd = RespValue::array(vec![
            RespValue::bulk_string("LPUSH"),
            RespValue::bulk_string("q"),
            RespValue::bulk_string("hello"),
        ]);
        assert_eq!(
            cmd.serialize(),
            b"*3\r\n$5\r\nLPUSH\r\n$1\r\nq\r\n$5\r\nhello\r\n"
        );
        assert_eq!(RespValue::null_array().serialize(), b"*-1\r\n");
        assert_eq!(RespValue::Integer(-7).serialize(), b":-7\r\n");
    }
}
