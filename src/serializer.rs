//! Encoding of scalar values stored by [`Client`](crate::Client).
//!
//! Values go through the [`Payload`] data model so the same call sites work
//! with any encoding: raw bytes, a compact binary form, JSON, or one of those
//! wrapped in zlib compression.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// A serializable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Payload>),
    Map(BTreeMap<String, Payload>),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Payload::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<i64> for Payload {
    fn from(n: i64) -> Self {
        Payload::Int(n)
    }
}

impl From<f64> for Payload {
    fn from(n: f64) -> Self {
        Payload::Float(n)
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Bool(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Payload::List(items)
    }
}

pub trait Serializer: Send + Sync + fmt::Debug {
    fn encode(&self, value: &Payload) -> Result<Vec<u8>>;
    fn decode(&self, data: &[u8]) -> Result<Payload>;
}

pub type SharedSerializer = Arc<dyn Serializer>;

/// Stores text and bytes as-is. Reads back text when the bytes are UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Serializer for Raw {
    fn encode(&self, value: &Payload) -> Result<Vec<u8>> {
        match value {
            Payload::Text(s) => Ok(s.as_bytes().to_vec()),
            Payload::Bytes(b) => Ok(b.clone()),
            Payload::Int(n) => Ok(n.to_string().into_bytes()),
            Payload::Float(n) => Ok(n.to_string().into_bytes()),
            other => Err(Error::Serialization(format!(
                "raw serializer cannot store {other:?}"
            ))),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Payload> {
        Ok(match std::str::from_utf8(data) {
            Ok(text) => Payload::Text(text.to_string()),
            Err(_) => Payload::Bytes(data.to_vec()),
        })
    }
}

/// bincode encoding of the full [`Payload`] tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binary;

impl Serializer for Binary {
    fn encode(&self, value: &Payload) -> Result<Vec<u8>> {
        bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<Payload> {
        bincode::deserialize(data).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Plain JSON, readable by other languages. Byte strings have no JSON form
/// and are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Json {
    fn to_json(value: &Payload) -> Result<serde_json::Value> {
        use serde_json::Value;
        Ok(match value {
            Payload::Nil => Value::Null,
            Payload::Bool(b) => Value::Bool(*b),
            Payload::Int(n) => Value::from(*n),
            Payload::Float(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .ok_or_else(|| Error::Serialization(format!("{n} has no JSON form")))?,
            Payload::Text(s) => Value::String(s.clone()),
            Payload::Bytes(_) => {
                return Err(Error::Serialization(
                    "json serializer cannot store raw bytes".into(),
                ));
            }
            Payload::List(items) => {
                Value::Array(items.iter().map(Json::to_json).collect::<Result<_>>()?)
            }
            Payload::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Json::to_json(v)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    fn from_json(value: serde_json::Value) -> Payload {
        use serde_json::Value;
        match value {
            Value::Null => Payload::Nil,
            Value::Bool(b) => Payload::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Payload::Int(i),
                None => Payload::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Payload::Text(s),
            Value::Array(items) => Payload::List(items.into_iter().map(Json::from_json).collect()),
            Value::Object(map) => Payload::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Json::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl Serializer for Json {
    fn encode(&self, value: &Payload) -> Result<Vec<u8>> {
        serde_json::to_vec(&Json::to_json(value)?).map_err(|e| Error::Serialization(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> Result<Payload> {
        let value = serde_json::from_slice(data).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(Json::from_json(value))
    }
}

/// Upper bound on inflated size, against compression bombs.
const MAX_DECOMPRESSED_SIZE: u64 = 512 * 1024 * 1024;

/// zlib compression around another serializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compressed<S>(pub S);

impl<S: Serializer> Serializer for Compressed<S> {
    fn encode(&self, value: &Payload) -> Result<Vec<u8>> {
        let plain = self.0.encode(value)?;
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&plain)?;
        Ok(encoder.finish()?)
    }

    fn decode(&self, data: &[u8]) -> Result<Payload> {
        let mut plain = Vec::new();
        flate2::read::ZlibDecoder::new(data)
            .take(MAX_DECOMPRESSED_SIZE + 1)
            .read_to_end(&mut plain)
            .map_err(|e| Error::Serialization(format!("zlib: {e}")))?;
        if plain.len() as u64 > MAX_DECOMPRESSED_SIZE {
            return Err(Error::Serialization("decompressed value too large".into()));
        }
        self.0.decode(&plain)
    }
}

/// Serializer by configuration name: `raw`, `binary` or `json`.
pub fn from_name(name: &str, compress: bool) -> Result<SharedSerializer> {
    Ok(match (name.to_lowercase().as_str(), compress) {
        ("raw", false) => Arc::new(Raw),
        ("raw", true) => Arc::new(Compressed(Raw)),
        ("binary", false) => Arc::new(Binary),
        ("binary", true) => Arc::new(Compressed(Binary)),
        ("json", false) => Arc::new(Json),
        ("json", true) => Arc::new(Compressed(Json)),
        (other, _) => return Err(Error::Config(format!("unknown serializer: {other}"))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Payload {
        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Payload::from("ada"));
        map.insert("tags".to_string(), Payload::from(vec![Payload::from("x"), Payload::from("y")]));
        map.insert("score".to_string(), Payload::Float(1.5));
        map.insert("admin".to_string(), Payload::Bool(true));
        map.insert("id".to_string(), Payload::Int(7));
        map.insert("none".to_string(), Payload::Nil);
        Payload::Map(map)
    }

    #[test]
    fn test_binary_and_json_keep_structure() {
        for s in [&Binary as &dyn Serializer, &Json, &Compressed(Json)] {
            let encoded = s.encode(&sample()).unwrap();
            assert_eq!(s.decode(&encoded).unwrap(), sample(), "{s:?}");
        }
    }

    #[test]
    fn test_raw() {
        assert_eq!(Raw.encode(&Payload::from("hi")).unwrap(), b"hi");
        assert_eq!(Raw.encode(&Payload::Int(12)).unwrap(), b"12");
        assert_eq!(Raw.decode(b"hi").unwrap(), Payload::from("hi"));
        assert_eq!(Raw.decode(&[0xff, 0x00]).unwrap(), Payload::Bytes(vec![0xff, 0x00]));
        assert!(Raw.encode(&sample()).is_err());
    }

    #[test]
    fn test_json_rejects_bytes() {
        assert!(Json.encode(&Payload::Bytes(vec![1])).is_err());
        assert_eq!(Json.encode(&Payload::from("a")).unwrap(), br#""a""#);
    }

    #[test]
    fn test_compression_shrinks_repetitive_values() {
        let big = Payload::Text("abc".repeat(1000));
        let plain = Binary.encode(&big).unwrap();
        let packed = Compressed(Binary).encode(&big).unwrap();
        assert!(packed.len() < plain.len() / 10);
        assert_eq!(Compressed(Binary).decode(&packed).unwrap(), big);
        assert!(Compressed(Binary).decode(b"not zlib").is_err());
    }

    #[test]
    fn test_from_name() {
        assert!(from_name("json", true).is_ok());
        assert!(matches!(from_name("pickle", false), Err(Error::Config(_))));
    }
}
