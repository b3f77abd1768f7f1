//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite file path or `sqlite:` URL
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5000),
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:database.db".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(5),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = ["HOST", "PORT", "DATABASE_URL", "DATABASE_MAX_CONNECTIONS"];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env();
        assert_eq!(config.server_addr(), "127.0.0.1:5000");
        assert_eq!(config.database.url, "sqlite:database.db");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("HOST", "0.0.0.0");
        env::set_var("PORT", "8081");
        env::set_var("DATABASE_URL", "sqlite:/var/lib/users.db");
        env::set_var("DATABASE_MAX_CONNECTIONS", "10");

        let config = Config::from_env();
        assert_eq!(config.server_addr(), "0.0.0.0:8081");
        assert_eq!(config.database.url, "sqlite:/var/lib/users.db");
        assert_eq!(config.database.max_connections, 10);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_falls_back() {
        clear_env();
        env::set_var("PORT", "not-a-port");
        let config = Config::from_env();
        assert_eq!(config.server.port, 5000);
        clear_env();
    }
}
