use serde::Deserialize;

/// Path value that selects a private in-memory database instead of a file.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub db_path: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Number of rows returned by the history view when the caller gives no limit.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    8
}

fn default_history_limit() -> u32 {
    50
}

impl Config {
    pub fn load() -> eyre::Result<Self> {
        Ok(envy::prefixed("FLOODCAST_").from_env::<Self>()?)
    }

    pub fn db_path(&self) -> &str {
        self.db_path
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("floodcast.db")
    }

    pub fn in_memory(&self) -> bool {
        self.db_path() == IN_MEMORY_DB
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            history_limit: default_history_limit(),
        }
    }
}
