use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::error::TokenError;

/// Claims carried by an issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies HS256 bearer tokens for the login endpoint.
///
/// Without a configured key the issuer runs on a random per-process key, so
/// tokens stop verifying after a restart.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expires_hours: i64,
}

impl TokenIssuer {
    pub fn new(config: &JwtConfig) -> Self {
        let key_bytes = match config.key.as_deref() {
            Some(key) => BASE64.decode(key).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "configured JWT key is not valid base64, using a random key");
                random_key()
            }),
            None => random_key(),
        };

        Self {
            encoding_key: EncodingKey::from_secret(&key_bytes),
            decoding_key: DecodingKey::from_secret(&key_bytes),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expires_hours: config.expires_hours,
        }
    }

    pub fn issue(&self, username: &str) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.expires_hours);

        let claims = Claims {
            sub: username.trim().to_string(),
            jti: random_jti(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

fn random_key() -> Vec<u8> {
    rand::thread_rng().gen::<[u8; 32]>().to_vec()
}

fn random_jti() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&JwtConfig {
            key: Some(BASE64.encode(b"an-adequately-long-test-secret!!")),
            issuer: "projman".to_string(),
            audience: "projman".to_string(),
            expires_hours: 8,
        })
    }

    #[test]
    fn test_issued_token_verifies() {
        let issuer = issuer();
        let issued = issuer.issue("  admin  ").unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.iss, "projman");
        assert_eq!(claims.aud, "projman");
        assert_eq!(claims.jti.len(), 32);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let issuer = issuer();
        let issued = issuer.issue("admin").unwrap();

        let mut tampered = issued.token.clone();
        tampered.pop();
        assert!(issuer.verify(&tampered).is_err());
    }

    #[test]
    fn test_token_from_other_issuer_is_rejected() {
        let ours = issuer();
        let theirs = TokenIssuer::new(&JwtConfig {
            key: Some(BASE64.encode(b"an-adequately-long-test-secret!!")),
            issuer: "someone-else".to_string(),
            audience: "projman".to_string(),
            expires_hours: 8,
        });

        let issued = theirs.issue("admin").unwrap();
        assert!(ours.verify(&issued.token).is_err());
    }

    #[test]
    fn test_random_key_issuers_do_not_trust_each_other() {
        let config = JwtConfig {
            key: None,
            issuer: "projman".to_string(),
            audience: "projman".to_string(),
            expires_hours: 8,
        };
        let a = TokenIssuer::new(&config);
        let b = TokenIssuer::new(&config);

        let issued = a.issue("admin").unwrap();
        assert!(a.verify(&issued.token).is_ok());
        assert!(b.verify(&issued.token).is_err());
    }
}
