//! Valence request signing
//!
//! Every Brightspace API call carries the application and user ids plus two HMAC-SHA256
//! signatures over `METHOD&/lower/case/path&timestamp`, one keyed with the application key
//! and one with the user key.

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Signing context for one application/user key pair
#[derive(Clone)]
pub struct TargetContext {
    host: Url,
    app_id: String,
    app_key: String,
    user_id: String,
    user_key: String,
}

impl std::fmt::Debug for TargetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetContext")
            .field("host", &self.host.as_str())
            .field("app_id", &self.app_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl TargetContext {
    /// Build a context for `host` from the key-tool credentials
    ///
    /// # Errors
    /// Returns a configuration error if `host` is not an absolute URL
    pub fn new(
        host: &str,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
        user_id: impl Into<String>,
        user_key: impl Into<String>,
    ) -> Result<Self> {
        let host = Url::parse(host).map_err(|e| Error::Config {
            message: format!("invalid target.host '{}': {}", host, e),
            key: Some("target.host".to_string()),
        })?;
        if host.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("'{}' cannot be used as a base URL", host),
                key: Some("target.host".to_string()),
            });
        }
        Ok(Self {
            host,
            app_id: app_id.into(),
            app_key: app_key.into(),
            user_id: user_id.into(),
            user_key: user_key.into(),
        })
    }

    /// Same application, different user key pair
    pub fn with_user(&self, user_id: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_key: user_key.into(),
            ..self.clone()
        }
    }

    /// User id this context signs as
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Signed URL for `segments` (a trailing empty segment yields a trailing slash)
    pub fn signed_url(&self, method: &Method, segments: &[String]) -> Result<Url> {
        self.signed_url_at(method, segments, chrono::Utc::now().timestamp())
    }

    pub(crate) fn signed_url_at(
        &self,
        method: &Method,
        segments: &[String],
        timestamp: i64,
    ) -> Result<Url> {
        let mut url = self.host.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| Error::Config {
                message: format!("'{}' cannot be used as a base URL", self.host),
                key: Some("target.host".to_string()),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }

        let base = signature_base(method, url.path(), timestamp);
        let app_sig = sign(&self.app_key, &base)?;
        let user_sig = sign(&self.user_key, &base)?;

        url.query_pairs_mut()
            .append_pair("x_a", &self.app_id)
            .append_pair("x_b", &self.user_id)
            .append_pair("x_c", &app_sig)
            .append_pair("x_d", &user_sig)
            .append_pair("x_t", &timestamp.to_string());
        Ok(url)
    }
}

/// `METHOD&/decoded/lower/case/path&timestamp`
fn signature_base(method: &Method, encoded_path: &str, timestamp: i64) -> String {
    let path = urlencoding::decode(encoded_path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| encoded_path.to_string());
    format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        path.to_lowercase(),
        timestamp
    )
}

/// Base64url (no padding) HMAC-SHA256 of `data` keyed with `key`
fn sign(key: &str, data: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).map_err(|e| Error::Config {
        message: format!("unusable signing key: {}", e),
        key: None,
    })?;
    mac.update(data.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn segments(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn context() -> TargetContext {
        TargetContext::new("https://lms.example.edu", "app", "appkey", "user", "userkey").unwrap()
    }

    #[test]
    fn test_sign_matches_rfc4231_vector() {
        assert_eq!(
            sign("Jefe", "what do ya want for nothing?").unwrap(),
            "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM"
        );
    }

    #[test]
    fn test_signature_base_is_decoded_and_lowercased() {
        assert_eq!(
            signature_base(&Method::GET, "/d2l/api/LP/1.47/Users/whoami", 42),
            "GET&/d2l/api/lp/1.47/users/whoami&42"
        );
        assert_eq!(
            signature_base(&Method::POST, "/d2l/api/le/1.74/My%20Unit/", 1),
            "POST&/d2l/api/le/1.74/my unit/&1"
        );
    }

    #[test]
    fn test_signed_url_carries_all_parameters() {
        let url = context()
            .signed_url_at(
                &Method::GET,
                &segments(&["d2l", "api", "lp", "1.47", "users", "whoami"]),
                1_570_000_000,
            )
            .unwrap();

        assert_eq!(url.path(), "/d2l/api/lp/1.47/users/whoami");
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["x_a"], "app");
        assert_eq!(query["x_b"], "user");
        assert_eq!(query["x_c"], "3lA3ICZqM1UurBovpKwEYJIyCtJ6HlKvnnSxBPyGQwc");
        assert_eq!(query["x_d"], "iLzafhEdJxphtL7y05NNgwZ3xpQeAWYEpwPBqUg2SUM");
        assert_eq!(query["x_t"], "1570000000");
    }

    #[test]
    fn test_trailing_empty_segment_keeps_slash() {
        let url = context()
            .signed_url_at(
                &Method::POST,
                &segments(&["d2l", "api", "le", "1.74", "6606", "dropbox", "folders", ""]),
                1,
            )
            .unwrap();
        assert_eq!(url.path(), "/d2l/api/le/1.74/6606/dropbox/folders/");
    }

    #[test]
    fn test_with_user_changes_only_user_pair() {
        let service = context().with_user("svc", "svckey");
        assert_eq!(service.user_id(), "svc");

        let url = service
            .signed_url_at(&Method::GET, &segments(&["x"]), 1)
            .unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["x_a"], "app");
        assert_eq!(query["x_b"], "svc");
    }

    #[test]
    fn test_debug_hides_keys() {
        let rendered = format!("{:?}", context());
        assert!(!rendered.contains("appkey"));
        assert!(!rendered.contains("userkey"));
    }

    #[test]
    fn test_rejects_relative_host() {
        assert!(matches!(
            TargetContext::new("lms.example.edu", "a", "b", "c", "d"),
            Err(Error::Config { .. })
        ));
    }
}
