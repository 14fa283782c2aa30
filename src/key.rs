//! Multi-part keys joined with `:`.
//!
//! `mkey(["user", "42", "posts"])` is `"user:42:posts"`. Splitting is the
//! inverse only when no part contains `:` itself.

pub const SEPARATOR: char = ':';

/// Anything that names a single store key.
pub trait IntoKey {
    fn into_key(self) -> String;
}

impl IntoKey for &str {
    fn into_key(self) -> String {
        self.to_string()
    }
}

impl IntoKey for String {
    fn into_key(self) -> String {
        self
    }
}

impl IntoKey for &String {
    fn into_key(self) -> String {
        self.clone()
    }
}

impl<S: AsRef<str>> IntoKey for &[S] {
    fn into_key(self) -> String {
        join(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoKey for [S; N] {
    fn into_key(self) -> String {
        join(&self)
    }
}

impl<S: AsRef<str>> IntoKey for Vec<S> {
    fn into_key(self) -> String {
        join(&self)
    }
}

fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(part.as_ref());
    }
    key
}

/// Compose a key from one or more parts.
pub fn mkey(parts: impl IntoKey) -> String {
    parts.into_key()
}

pub fn split(key: &str) -> Vec<&str> {
    key.split(SEPARATOR).collect()
}
