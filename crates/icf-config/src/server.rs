//! HTTP server configuration.

use serde::{Deserialize, Serialize};

fn default_host() -> String {
    String::from("127.0.0.1")
}

const fn default_port() -> u16 {
    8080
}

fn default_app_url() -> String {
    String::from("http://localhost:3000")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public URL of the web frontend. Used for redirect URLs and email links.
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Allowed CORS origins. Empty means `app_url` only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            app_url: default_app_url(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `app_url` without a trailing slash.
    pub fn app_url(&self) -> &str {
        self.app_url.trim_end_matches('/')
    }

    /// Origins the CORS layer should allow.
    pub fn allowed_origins(&self) -> Vec<String> {
        if self.cors_origins.is_empty() {
            vec![self.app_url().to_string()]
        } else {
            self.cors_origins.clone()
        }
    }
}
