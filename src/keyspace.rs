//! Keyspace templates: a short name standing for a family of keys such as
//! `user:{}:posts`.
//!
//! Templates are parsed once into segments, so an arity mismatch is caught at
//! resolve time and every template can be turned into the glob pattern that
//! enumerates its keys.

use crate::error::{Error, Result};
use crate::glob;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `{}`
    Positional,
    /// `{name}`
    Named(String),
}

/// A parsed key template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse `{}` / `{name}` placeholders; `{{` and `}}` are literal braces.
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(Error::Keyspace(format!(
                                    "unclosed placeholder in template {source:?}"
                                )));
                            }
                            Some(c) => name.push(c),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(if name.is_empty() {
                        Segment::Positional
                    } else {
                        Segment::Named(name)
                    });
                }
                '}' => {
                    return Err(Error::Keyspace(format!(
                        "unmatched '}}' in template {source:?}"
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of placeholders, named ones included.
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| !matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Fill every placeholder in order.
    pub fn resolve(&self, args: &[&dyn fmt::Display]) -> Result<String> {
        if args.len() != self.arity() {
            return Err(Error::Keyspace(format!(
                "template {:?} takes {} argument(s), got {}",
                self.source,
                self.arity(),
                args.len()
            )));
        }
        let mut args = args.iter();
        let mut key = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => key.push_str(text),
                _ => {
                    if let Some(arg) = args.next() {
                        key.push_str(&arg.to_string());
                    }
                }
            }
        }
        Ok(key)
    }

    /// Fill named placeholders from `(name, value)` pairs. Every placeholder
    /// must be named and bound.
    pub fn resolve_named(&self, pairs: &[(&str, &dyn fmt::Display)]) -> Result<String> {
        let mut key = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => key.push_str(text),
                Segment::Positional => {
                    return Err(Error::Keyspace(format!(
                        "template {:?} has a positional placeholder",
                        self.source
                    )));
                }
                Segment::Named(name) => {
                    let (_, value) = pairs.iter().find(|(n, _)| n == name).ok_or_else(|| {
                        Error::Keyspace(format!("no value for {{{name}}} in {:?}", self.source))
                    })?;
                    key.push_str(&value.to_string());
                }
            }
        }
        Ok(key)
    }

    /// Glob pattern matching every key this template can produce.
    pub fn glob(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => glob::escape(text),
                _ => "*".to_string(),
            })
            .collect()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Registered templates by shortcut name.
#[derive(Debug, Clone, Default)]
pub struct Keyspaces {
    templates: HashMap<String, Template>,
}

impl Keyspaces {
    pub fn new() -> Self {
        Keyspaces::default()
    }

    /// Register `template` under `shortcut`, replacing any previous one.
    pub fn register(&mut self, shortcut: &str, template: &str) -> Result<String> {
        let parsed = Template::parse(template)?;
        self.templates.insert(shortcut.to_string(), parsed);
        Ok(shortcut.to_string())
    }

    /// A registered template, or `name` parsed as a raw template.
    pub fn template(&self, name: &str) -> Result<Template> {
        match self.templates.get(name) {
            Some(template) => Ok(template.clone()),
            None => Template::parse(name),
        }
    }

    pub fn resolve(&self, name: &str, args: &[&dyn fmt::Display]) -> Result<String> {
        self.template(name)?.resolve(args)
    }

    pub fn glob_of(&self, name: &str) -> Result<String> {
        Ok(self.template(name)?.glob())
    }

    pub fn is_registered(&self, shortcut: &str) -> bool {
        self.templates.contains_key(shortcut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_resolve() {
        let t = Template::parse("user:{}:posts").unwrap();
        assert_eq!(t.arity(), 1);
        assert_eq!(t.resolve(&[&42]).unwrap(), "user:42:posts");
        assert!(t.resolve(&[]).is_err());
        assert!(t.resolve(&[&1, &2]).is_err());
    }

    #[test]
    fn test_escaped_braces() {
        let t = Template::parse("{{literal}}:{}").unwrap();
        assert_eq!(t.resolve(&[&"x"]).unwrap(), "{literal}:x");
        assert_eq!(t.glob(), "{literal}:*");
    }

    #[test]
    fn test_bad_templates() {
        assert!(matches!(Template::parse("user:{id"), Err(Error::Keyspace(_))));
        assert!(matches!(Template::parse("user:}"), Err(Error::Keyspace(_))));
    }

    #[test]
    fn test_named() {
        let t = Template::parse("post:{user}:{slug}").unwrap();
        assert_eq!(
            t.resolve_named(&[("slug", &"hello"), ("user", &7)]).unwrap(),
            "post:7:hello"
        );
        assert!(t.resolve_named(&[("user", &7)]).is_err());
        assert_eq!(t.resolve(&[&7, &"hello"]).unwrap(), "post:7:hello");
    }

    #[test]
    fn test_glob_escapes_literals() {
        let t = Template::parse("tag[{}]*").unwrap();
        assert_eq!(t.glob(), r"tag\[*\]\*");
    }

    #[test]
    fn test_registry_checks_shortcuts_first() {
        let mut ks = Keyspaces::new();
        assert_eq!(ks.register("posts", "user:{}:posts").unwrap(), "posts");
        assert_eq!(ks.resolve("posts", &[&1]).unwrap(), "user:1:posts");
        assert_eq!(ks.glob_of("posts").unwrap(), "user:*:posts");
        // Not registered: parsed as a raw template.
        assert_eq!(ks.resolve("raw:{}", &[&"a"]).unwrap(), "raw:a");
        assert_eq!(ks.glob_of("user:{}:posts").unwrap(), "user:*:posts");
        assert!(ks.resolve("posts", &[]).is_err());
    }
}
