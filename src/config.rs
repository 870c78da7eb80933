use std::{env, fmt, net::SocketAddr, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone, PartialEq)]
pub enum StorageKind {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub storage: StorageKind,
}

#[derive(Debug)]
pub struct ConfigError(String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads `PORT`, `APP_STORAGE` and `APP_DATA_PATH`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let storage = match lookup("APP_STORAGE").as_deref().map(str::trim) {
            None | Some("") | Some("file") => StorageKind::File(data_path),
            Some("memory") => StorageKind::Memory,
            Some(other) => {
                return Err(ConfigError(format!(
                    "APP_STORAGE must be 'file' or 'memory', got '{other}'"
                )));
            }
        };

        Ok(Self { port, storage })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_file_storage_on_8080() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageKind::File(PathBuf::from("data/state.json")));
    }

    #[test]
    fn reads_port_path_and_backend() {
        let config = load(&[("PORT", "9100"), ("APP_DATA_PATH", "/tmp/spins.json")]).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.storage, StorageKind::File(PathBuf::from("/tmp/spins.json")));

        let config = load(&[("APP_STORAGE", "memory"), ("PORT", "nope")]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.storage, StorageKind::Memory);
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(load(&[("APP_STORAGE", "firestore")]).is_err());
    }
}
