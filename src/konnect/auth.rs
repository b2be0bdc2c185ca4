//! Konnect Authentication
//!
//! Konnect accepts personal access tokens (`kpat_...`) and system account
//! tokens (`spat_...`) as bearer tokens. Acquiring one is up to the user; this
//! module only picks it up and keeps it out of logs.

use std::fmt;

/// Environment variable holding the access token
pub const TOKEN_ENV: &str = "KONNECT_TOKEN";

const TOKEN_PREFIXES: &[&str] = &["kpat_", "spat_"];

/// Bearer token holder
#[derive(Clone)]
pub struct KonnectCredentials {
    token: String,
}

impl KonnectCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into().trim().to_string();
        if !looks_like_access_token(&token) {
            tracing::warn!("Access token does not have a known Konnect prefix");
        }
        Self { token }
    }

    /// Read the token from `KONNECT_TOKEN`
    pub fn from_env() -> Option<Self> {
        std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    /// Resolve credentials (explicit token > environment)
    pub fn resolve(explicit: Option<&str>) -> Option<Self> {
        explicit
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
            .or_else(Self::from_env)
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for KonnectCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Security: never print the token itself
        f.debug_struct("KonnectCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Validate the access token shape
/// Known prefix followed by at least one alphanumeric character
fn looks_like_access_token(token: &str) -> bool {
    TOKEN_PREFIXES.iter().any(|prefix| {
        token
            .strip_prefix(prefix)
            .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_prefixes() {
        assert!(looks_like_access_token("kpat_abc123"));
        assert!(looks_like_access_token("spat_XYZ"));
        assert!(!looks_like_access_token("kpat_"));
        assert!(!looks_like_access_token("Bearer abc"));
        assert!(!looks_like_access_token("kpat_abc def"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = KonnectCredentials::new("kpat_secret");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn test_explicit_token_is_trimmed() {
        let creds = KonnectCredentials::resolve(Some("  kpat_abc \n")).unwrap();
        assert_eq!(creds.token(), "kpat_abc");
    }
}
