use crate::error::{Error, Result};

/// Connection and encoding settings for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    /// `raw`, `binary` or `json`; see [`serializer::from_name`](crate::serializer::from_name).
    pub serializer: String,
    pub compress: bool,
    /// Use the in-process engine instead of a TCP connection.
    pub memory: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            serializer: "binary".to_string(),
            compress: false,
            memory: false,
        }
    }
}

impl ClientConfig {
    /// Parse `--host H --port P --db N --serializer S --compress yes|no --memory`.
    /// Unknown flags are ignored; a malformed value is an error.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = ClientConfig::default();
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--memory" => config.memory = true,
                "--url" => {
                    if i + 1 < args.len() {
                        let memory = config.memory;
                        config = ClientConfig {
                            memory,
                            ..ClientConfig::from_url(&args[i + 1])?
                        };
                        i += 1;
                    }
                }
                flag @ ("--host" | "-h" | "--port" | "-p" | "--db" | "-n" | "--serializer"
                | "--compress") => {
                    if i + 1 < args.len() {
                        let key = match flag {
                            "-h" => "host",
                            "-p" => "port",
                            "-n" => "db",
                            long => &long[2..],
                        };
                        config.set(key, &args[i + 1])?;
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Ok(config)
    }

    /// Parse `redis://host[:port][/db]`.
    pub fn from_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("redis://")
            .ok_or_else(|| Error::Config(format!("unsupported url scheme: {url}")))?;
        let mut config = ClientConfig::default();
        let (authority, path) = match rest.split_once('/') {
            Some((authority, path)) => (authority, Some(path)),
            None => (rest, None),
        };
        match authority.rsplit_once(':') {
            Some((host, port)) => {
                config.set("port", port)?;
                if !host.is_empty() {
                    config.host = host.to_string();
                }
            }
            None if !authority.is_empty() => config.host = authority.to_string(),
            None => {}
        }
        if let Some(db) = path.filter(|p| !p.is_empty()) {
            config.set("db", db)?;
        }
        Ok(config)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key.to_lowercase().as_str() {
            "host" => Some(self.host.clone()),
            "port" => Some(self.port.to_string()),
            "db" => Some(self.db.to_string()),
            "serializer" => Some(self.serializer.clone()),
            "compress" => Some(if self.compress { "yes" } else { "no" }.to_string()),
            "memory" => Some(if self.memory { "yes" } else { "no" }.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key.to_lowercase().as_str() {
            "host" => {
                self.host = value.to_string();
                Ok(())
            }
            "port" => {
                self.port = value
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid port: {value}")))?;
                Ok(())
            }
            "db" => {
                self.db = value
                    .parse()
                    .ok()
                    .filter(|db: &i64| *db >= 0)
                    .ok_or_else(|| Error::Config(format!("invalid db index: {value}")))?;
                Ok(())
            }
            "serializer" => match value.to_lowercase().as_str() {
                name @ ("raw" | "binary" | "json") => {
                    self.serializer = name.to_string();
                    Ok(())
                }
                _ => Err(Error::Config(format!("unknown serializer: {value}"))),
            },
            "compress" => {
                self.compress = parse_yes_no(value)?;
                Ok(())
            }
            "memory" => {
                self.memory = parse_yes_no(value)?;
                Ok(())
            }
            _ => Err(Error::Config(format!("unknown option: {key}"))),
        }
    }

    /// `host:port` for `TcpStream::connect`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_yes_no(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "1" => Ok(true),
        "no" | "false" | "0" => Ok(false),
        _ => Err(Error::Config(format!("expected yes or no, got {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_args() {
        let config = ClientConfig::from_args(&args(&[
            "--host", "10.0.0.5", "-p", "6380", "--db", "2", "--serializer", "json",
            "--compress", "yes", "--bogus",
        ]))
        .unwrap();
        assert_eq!(config.addr(), "10.0.0.5:6380");
        assert_eq!(config.db, 2);
        assert_eq!(config.serializer, "json");
        assert!(config.compress);
        assert!(!config.memory);
    }

    #[test]
    fn test_from_args_rejects_bad_values() {
        assert!(ClientConfig::from_args(&args(&["--port", "lots"])).is_err());
        assert!(ClientConfig::from_args(&args(&["--serializer", "xml"])).is_err());
        assert!(ClientConfig::from_args(&args(&["--db", "-1"])).is_err());
    }

    #[test]
    fn test_from_url() {
        let config = ClientConfig::from_url("redis://cache.local:7000/3").unwrap();
        assert_eq!(config.host, "cache.local");
        assert_eq!(config.port, 7000);
        assert_eq!(config.db, 3);

        let config = ClientConfig::from_url("redis://cache.local").unwrap();
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);

        assert!(ClientConfig::from_url("http://x").is_err());
    }

    #[test]
    fn test_get_set() {
        let mut config = ClientConfig::default();
        config.set("compress", "yes").unwrap();
        assert_eq!(config.get("compress").as_deref(), Some("yes"));
        assert_eq!(config.get("serializer").as_deref(), Some("binary"));
        assert!(config.set("nope", "1").is_err());
        assert_eq!(config.get("nope"), None);
    }
}
