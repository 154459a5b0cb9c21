pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod service;
pub mod storage;
pub mod token;

pub use error::{Error, Result};

use std::path::Path;

/// Wires the configured components together: one backing document, one
/// credential pair, one token issuer.
pub struct App {
    config: config::AppConfig,
    service: service::ProjectService,
    auth: auth::Authenticator,
    tokens: token::TokenIssuer,
}

impl App {
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(config::load_or_default(config_path))
    }

    pub fn from_config(config: config::AppConfig) -> Result<Self> {
        let repository = storage::XmlProjectRepository::new(&config.storage)?;
        let service = service::ProjectService::new(repository);
        let auth = auth::Authenticator::new(&config.auth);
        let tokens = token::TokenIssuer::new(&config.jwt);

        Ok(Self {
            config,
            service,
            auth,
            tokens,
        })
    }

    pub fn config(&self) -> &config::AppConfig {
        &self.config
    }

    pub fn service(&self) -> &service::ProjectService {
        &self.service
    }

    pub fn auth(&self) -> &auth::Authenticator {
        &self.auth
    }

    pub fn tokens(&self) -> &token::TokenIssuer {
        &self.tokens
    }
}
