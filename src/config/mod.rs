pub mod loader;

pub use loader::load_or_default;

use encoding_rs::{Encoding, UTF_8};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub projects_path: PathBuf,
    pub encoding_name: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub key: Option<String>,
    pub issuer: String,
    pub audience: String,
    pub expires_hours: i64,
}

impl StorageConfig {
    /// Resolve the configured encoding label, falling back to UTF-8 when the
    /// label is not recognized.
    pub fn encoding(&self) -> &'static Encoding {
        Encoding::for_label(self.encoding_name.as_bytes()).unwrap_or(UTF_8)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                projects_path: PathBuf::from("./data/projects.xml"),
                encoding_name: "windows-1250".to_string(),
            },
            auth: AuthConfig {
                username: "admin".to_string(),
                password: String::new(),
            },
            jwt: JwtConfig {
                key: None,
                issuer: "projman".to_string(),
                audience: "projman".to_string(),
                expires_hours: 8,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_encoding_resolves() {
        let config = AppConfig::default();
        assert_eq!(config.storage.encoding().name(), "windows-1250");
    }

    #[test]
    fn test_unknown_encoding_falls_back_to_utf8() {
        let storage = StorageConfig {
            projects_path: PathBuf::from("p.xml"),
            encoding_name: "no-such-charset".to_string(),
        };
        assert_eq!(storage.encoding().name(), "UTF-8");
    }
}
