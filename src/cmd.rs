//! Command building and reply decoding.
//!
//! A [`Cmd`] is a command name plus its arguments, already encoded to bytes.
//! Arguments go in through [`ToArg`]; replies come back out through
//! [`FromReply`], so callers pick the Rust type they want:
//!
//! ```ignore
//! let len: usize = cmd("LLEN").arg("queue").query(&*store).await?;
//! ```

use crate::error::{Error, Result};
use crate::resp::RespValue;
use crate::store::Store;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

/// A single store command.
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd {
    name: String,
    args: Vec<Vec<u8>>,
}

/// Shorthand for [`Cmd::new`].
pub fn cmd(name: &str) -> Cmd {
    Cmd::new(name)
}

impl Cmd {
    pub fn new(name: &str) -> Self {
        Cmd {
            name: name.to_ascii_uppercase(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl ToArg) -> Self {
        arg.write_arg(&mut self.args);
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToArg,
    {
        for arg in args {
            arg.write_arg(&mut self.args);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_values(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// The command as a RESP array of bulk strings, name first.
    pub fn to_resp(&self) -> RespValue {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(RespValue::bulk_string(self.name.as_bytes().to_vec()));
        items.extend(self.args.iter().cloned().map(RespValue::bulk_string));
        RespValue::array(items)
    }

    /// Run this command against `store` and decode the reply.
    pub async fn query<T, S>(self, store: &S) -> Result<T>
    where
        T: FromReply,
        S: Store + ?Sized,
    {
        T::from_reply(store.execute(self).await?)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in self.args.iter().take(8) {
            let text = String::from_utf8_lossy(arg);
            if text.chars().count() > 32 {
                let head: String = text.chars().take(32).collect();
                write!(f, " {head}…")?;
            } else {
                write!(f, " {text}")?;
            }
        }
        if self.args.len() > 8 {
            write!(f, " …(+{})", self.args.len() - 8)?;
        }
        Ok(())
    }
}

/// Types that can be encoded as command arguments.
pub trait ToArg {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>);
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        (**self).write_arg(out)
    }
}

impl ToArg for str {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.as_bytes().to_vec());
    }
}

impl ToArg for String {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.as_bytes().to_vec());
    }
}

impl ToArg for [u8] {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.to_vec());
    }
}

impl ToArg for Vec<u8> {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.clone());
    }
}

impl ToArg for Bytes {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        out.push(self.to_vec());
    }
}

impl ToArg for f64 {
    fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
        out.push(format_score(*self).into_bytes());
    }
}

macro_rules! int_to_arg {
    ($($t:ty),*) => {
        $(
            impl ToArg for $t {
                fn write_arg(&self, out: &mut Vec<Vec<u8>>) {
                    out.push(self.to_string().into_bytes());
                }
            }
        )*
    };
}

int_to_arg!(i32, i64, u32, u64, usize, isize);

/// Format a score the way the store prints it: integral values without a
/// fractional part, infinities as `inf`/`-inf`.
pub fn format_score(n: f64) -> String {
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

/// Types a reply can be decoded into.
pub trait FromReply: Sized {
    fn from_reply(reply: RespValue) -> Result<Self>;
}

/// Turn an error reply into `Error::Upstream`, pass anything else through.
pub fn check_reply(reply: RespValue) -> Result<RespValue> {
    match reply {
        RespValue::Error(msg) => Err(Error::Upstream(msg)),
        other => Ok(other),
    }
}

impl FromReply for RespValue {
    fn from_reply(reply: RespValue) -> Result<Self> {
        check_reply(reply)
    }
}

impl FromReply for () {
    fn from_reply(reply: RespValue) -> Result<Self> {
        check_reply(reply).map(|_| ())
    }
}

impl FromReply for Bytes {
    fn from_reply(reply: RespValue) -> Result<Self> {
        match check_reply(reply)? {
            RespValue::BulkString(Some(data)) => Ok(Bytes::from(data)),
            RespValue::SimpleString(s) => Ok(Bytes::from(s.into_bytes())),
            RespValue::Integer(n) => Ok(Bytes::from(n.to_string().into_bytes())),
            other => Err(Error::unexpected("bytes", other.kind())),
        }
    }
}

impl FromReply for String {
    fn from_reply(reply: RespValue) -> Result<Self> {
        match check_reply(reply)? {
            RespValue::BulkString(Some(data)) => String::from_utf8(data)
                .map_err(|_| Error::unexpected("string", "non-UTF-8 bulk string")),
            RespValue::SimpleString(s) => Ok(s),
            RespValue::Integer(n) => Ok(n.to_string()),
            other => Err(Error::unexpected("string", other.kind())),
        }
    }
}

impl FromReply for f64 {
    fn from_reply(reply: RespValue) -> Result<Self> {
        match check_reply(reply)? {
            RespValue::Integer(n) => Ok(n as f64),
            other => {
                let text = other
                    .to_string_lossy()
                    .ok_or_else(|| Error::unexpected("float", other.kind()))?;
                parse_score(&text).ok_or_else(|| Error::unexpected("float", text))
            }
        }
    }
}

/// Parse a score as printed by the store, accepting `inf`/`-inf`.
pub fn parse_score(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        "inf" | "+inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        other => other.parse().ok(),
    }
}

impl FromReply for bool {
    fn from_reply(reply: RespValue) -> Result<Self> {
        match check_reply(reply)? {
            RespValue::Integer(n) => Ok(n != 0),
            RespValue::SimpleString(s) => Ok(s == "OK"),
            RespValue::BulkString(Some(data)) => Ok(data != b"0"),
            RespValue::BulkString(None) | RespValue::Array(None) => Ok(false),
            other => Err(Error::unexpected("boolean", other.kind())),
        }
    }
}

macro_rules! int_from_reply {
    ($($t:ty),*) => {
        $(
            impl FromReply for $t {
                fn from_reply(reply: RespValue) -> Result<Self> {
                    match check_reply(reply)? {
                        RespValue::Integer(n) => <$t>::try_from(n)
                            .map_err(|_| Error::unexpected("integer in range", n.to_string())),
                        other => {
                            let text = other
                                .to_string_lossy()
                                .ok_or_else(|| Error::unexpected("integer", other.kind()))?;
                            text.parse()
                                .map_err(|_| Error::unexpected("integer", text))
                        }
                    }
                }
            }
        )*
    };
}

int_from_reply!(i32, i64, u32, u64, usize);

impl<T: FromReply> FromReply for Option<T> {
    fn from_reply(reply: RespValue) -> Result<Self> {
        let reply = check_reply(reply)?;
        if reply.is_null() {
            Ok(None)
        } else {
            T::from_reply(reply).map(Some)
        }
    }
}

/// The items of an array reply; a nil array is empty.
fn array_items(reply: RespValue) -> Result<Vec<RespValue>> {
    match check_reply(reply)? {
        RespValue::Array(Some(items)) => Ok(items),
        RespValue::Array(None) => Ok(Vec::new()),
        other => Err(Error::unexpected("array", other.kind())),
    }
}

impl<T: FromReply> FromReply for Vec<T> {
    fn from_reply(reply: RespValue) -> Result<Self> {
        array_items(reply)?.into_iter().map(T::from_reply).collect()
    }
}

impl<T: FromReply + Eq + Hash> FromReply for HashSet<T> {
    fn from_reply(reply: RespValue) -> Result<Self> {
        array_items(reply)?.into_iter().map(T::from_reply).collect()
    }
}

impl<T: FromReply + Ord> FromReply for BTreeSet<T> {
    fn from_reply(reply: RespValue) -> Result<Self> {
        array_items(reply)?.into_iter().map(T::from_reply).collect()
    }
}

impl<A: FromReply, B: FromReply> FromReply for (A, B) {
    fn from_reply(reply: RespValue) -> Result<Self> {
        let mut items = array_items(reply)?.into_iter();
        match (items.next(), items.next(), items.next()) {
            (Some(a), Some(b), None) => Ok((A::from_reply(a)?, B::from_reply(b)?)),
            _ => Err(Error::unexpected("two-element array", "array of another length")),
        }
    }
}

/// Decode a flat `[k1, v1, k2, v2, ...]` array into pairs.
pub fn pairs<A: FromReply, B: FromReply>(reply: RespValue) -> Result<Vec<(A, B)>> {
    let items = array_items(reply)?;
    if items.len() % 2 != 0 {
        return Err(Error::unexpected("even-length array", items.len().to_string()));
    }
    let mut out = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        out.push((A::from_reply(a)?, B::from_reply(b)?));
    }
    Ok(out)
}

impl<K: FromReply + Eq + Hash, V: FromReply> FromReply for HashMap<K, V> {
    fn from_reply(reply: RespValue) -> Result<Self> {
        Ok(pairs(reply)?.into_iter().collect())
    }
}

impl<K: FromReply + Ord, V: FromReply> FromReply for BTreeMap<K, V> {
    fn from_reply(reply: RespValue) -> Result<Self> {
        Ok(pairs(reply)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_encodes_args() {
        let c = cmd("zadd").arg("scores").arg(1.5).arg("alice").arg(3i64);
        assert_eq!(c.name(), "ZADD");
        assert_eq!(
            c.arg_values(),
            &[b"scores".to_vec(), b"1.5".to_vec(), b"alice".to_vec(), b"3".to_vec()]
        );
        assert_eq!(c.to_string(), "ZADD scores 1.5 alice 3");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(2.0), "2");
        assert_eq!(format_score(0.25), "0.25");
        assert_eq!(format_score(f64::NEG_INFINITY), "-inf");
        assert_eq!(parse_score("+inf"), Some(f64::INFINITY));
        assert_eq!(parse_score("0.9"), Some(0.9));
    }

    #[test]
    fn test_scalar_replies() {
        assert_eq!(String::from_reply(RespValue::bulk_string("hi")).unwrap(), "hi");
        assert_eq!(i64::from_reply(RespValue::Integer(7)).unwrap(), 7);
        assert_eq!(i64::from_reply(RespValue::bulk_string("-3")).unwrap(), -3);
        assert_eq!(f64::from_reply(RespValue::bulk_string("0.5")).unwrap(), 0.5);
        assert!(bool::from_reply(RespValue::Integer(1)).unwrap());
        assert!(usize::from_reply(RespValue::Integer(-1)).is_err());
        assert!(matches!(
            String::from_reply(RespValue::error("ERR boom")),
            Err(Error::Upstream(msg)) if msg == "ERR boom"
        ));
    }

    #[test]
    fn test_optional_and_collections() {
        assert_eq!(Option::<String>::from_reply(RespValue::null_bulk_string()).unwrap(), None);
        let reply = RespValue::array(vec![RespValue::bulk_string("a"), RespValue::bulk_string("b")]);
        assert_eq!(Vec::<String>::from_reply(reply.clone()).unwrap(), vec!["a", "b"]);
        assert_eq!(HashSet::<String>::from_reply(reply).unwrap().len(), 2);
        assert!(Vec::<String>::from_reply(RespValue::null_array()).unwrap().is_empty());
    }

    #[test]
    fn test_pairs_and_maps() {
        let reply = RespValue::array(vec![
            RespValue::bulk_string("f1"),
            RespValue::bulk_string("1"),
            RespValue::bulk_string("f2"),
            RespValue::bulk_string("2"),
        ]);
        let map = BTreeMap::<String, i64>::from_reply(reply.clone()).unwrap();
        assert_eq!(map.get("f2"), Some(&2));
        let scored: Vec<(String, f64)> = pairs(reply).unwrap();
        assert_eq!(scored[0], ("f1".to_string(), 1.0));

        let odd = RespValue::array(vec![RespValue::bulk_string("x")]);
        assert!(pairs::<String, String>(odd).is_err());
    }
}
