//! Application configuration, read from environment variables.

use std::{env, path::PathBuf, str::FromStr};

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";
pub const DEFAULT_VISITOR_SECRET: &str = "default-visitor-secret-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            _ => Ok(Environment::Development),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// `SameSite` attribute of the visitor cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    /// Needed when the site and the API are on different sites.
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl FromStr for SameSite {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set to a secure, unique value in production")]
    InsecureSecret(&'static str),
    #[error("invalid bind address {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub visitor_secret: String,
    /// Directory blog images are written to.
    pub upload_dir: PathBuf,
    /// Prefix used to build public image URLs, e.g. `https://api.example.com`.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    /// When false, new blog comments are visible immediately.
    pub comments_require_approval: bool,
    pub cookie_same_site: SameSite,
}

fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 3001,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            visitor_secret: DEFAULT_VISITOR_SECRET.to_string(),
            upload_dir: PathBuf::from("uploads/blog-images"),
            public_base_url: String::new(),
            max_upload_bytes: 5 * 1024 * 1024,
            comments_require_approval: true,
            cookie_same_site: SameSite::Lax,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = env_or("ENVIRONMENT", defaults.environment);
        // Cross-site front ends only send the cookie with SameSite=None.
        let same_site = if environment == Environment::Production {
            SameSite::None
        } else {
            defaults.cookie_same_site
        };
        Self {
            environment,
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            jwt_secret: env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            visitor_secret: env::var("VISITOR_SECRET").unwrap_or(defaults.visitor_secret),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            comments_require_approval: env_or(
                "COMMENTS_REQUIRE_APPROVAL",
                defaults.comments_require_approval,
            ),
            cookie_same_site: env_or("COOKIE_SAMESITE", same_site),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Refuse to run in production with the shipped default secrets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_production() {
            return Ok(());
        }
        if self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InsecureSecret("JWT_SECRET"));
        }
        if self.visitor_secret.is_empty() || self.visitor_secret == DEFAULT_VISITOR_SECRET {
            return Err(ConfigError::InsecureSecret("VISITOR_SECRET"));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> Result<std::net::SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::InvalidAddress(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parses_loosely() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Development));
    }

    #[test]
    fn test_same_site_parses() {
        assert_eq!("none".parse::<SameSite>(), Ok(SameSite::None));
        assert_eq!("Strict".parse::<SameSite>(), Ok(SameSite::Strict));
        assert!("sometimes".parse::<SameSite>().is_err());
    }

    #[test]
    fn test_development_accepts_default_secrets() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_production_rejects_default_secrets() {
        let config = AppConfig {
            environment: Environment::Production,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsecureSecret("JWT_SECRET"))
        ));

        let config = AppConfig {
            environment: Environment::Production,
            jwt_secret: "a-real-secret".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InsecureSecret("VISITOR_SECRET"))
        ));
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address().unwrap().port(), 3001);

        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(config.bind_address().is_err());
    }
}
