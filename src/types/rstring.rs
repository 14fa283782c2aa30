/// String value: binary-safe bytes with integer arithmetic for INCR/DECR.
#[derive(Debug, Clone)]
pub struct RedisString {
    data: Vec<u8>,
}

impl RedisString {
    pub fn new(data: Vec<u8>) -> Self {
        RedisString { data }
    }

    pub fn from_i64(n: i64) -> Self {
        RedisString {
            data: n.to_string().into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The value as an i64, if it is a canonical integer.
    pub fn as_i64(&self) -> Option<i64> {
        std::str::from_utf8(&self.data)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
    }

    /// Add `delta` and return the new value.
    pub fn incr_by(&mut self, delta: i64) -> Result<i64, &'static str> {
        let current = self
            .as_i64()
            .ok_or("value is not an integer or out of range")?;
        let new_val = current
            .checked_add(delta)
            .ok_or("increment or decrement would overflow")?;
        self.data = new_val.to_string().into_bytes();
        Ok(new_val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incr_by() {
        let mut s = RedisString::from_i64(41);
        assert_eq!(s.incr_by(1), Ok(42));
        assert_eq!(s.as_bytes(), b"42");
        assert!(RedisString::new(b"abc".to_vec()).incr_by(1).is_err());
        assert!(RedisString::from_i64(i64::MAX).incr_by(1).is_err());
    }
}
