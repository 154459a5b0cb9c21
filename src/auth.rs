use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// Credential check against the statically configured account.
///
/// Fails closed on blank input and never reveals which of the two fields
/// mismatched.
#[derive(Debug, Clone)]
pub struct Authenticator {
    username: String,
    password: String,
}

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Usernames are compared after trimming both sides; passwords are
    /// compared exactly as given.
    pub fn validate_credentials(&self, username: &str, password: &str) -> bool {
        if username.trim().is_empty() || password.trim().is_empty() {
            return false;
        }

        if !safe_equals(
            username.trim().as_bytes(),
            self.username.trim().as_bytes(),
        ) {
            return false;
        }

        safe_equals(password.as_bytes(), self.password.as_bytes())
    }
}

/// Length is checked up front; equal-length inputs are compared over their
/// full UTF-8 byte strings without short-circuiting on the first mismatch.
fn safe_equals(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
