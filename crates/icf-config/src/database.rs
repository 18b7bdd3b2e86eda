//! libSQL database configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    String::from("icflog.db")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Local database file. Ignored when `url` is set.
    #[serde(default = "default_path")]
    pub path: String,

    /// Remote database URL (e.g., `libsql://icflog-org.turso.io`).
    #[serde(default)]
    pub url: String,

    /// Auth token for the remote database.
    #[serde(default)]
    pub auth_token: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            url: String::new(),
            auth_token: String::new(),
        }
    }
}

impl DatabaseConfig {
    /// A local path or a remote URL with a token is enough to open the store.
    pub fn is_configured(&self) -> bool {
        self.is_remote() || !self.path.is_empty()
    }

    pub fn is_remote(&self) -> bool {
        !self.url.is_empty() && !self.auth_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local_file() {
        let config = DatabaseConfig::default();
        assert!(config.is_configured());
        assert!(!config.is_remote());
        assert_eq!(config.path, "icflog.db");
    }

    #[test]
    fn remote_needs_token() {
        let config = DatabaseConfig {
            url: "libsql://db.turso.io".into(),
            ..Default::default()
        };
        assert!(!config.is_remote());
    }
}
