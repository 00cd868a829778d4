//! Capability token encoding.
//!
//! A token is two base64url segments (no padding) joined by a dot:
//!
//! ```text
//! base64url(json claims) "." base64url(HMAC-SHA256(secret, first segment))
//! ```
//!
//! The MAC covers the encoded claims segment exactly as transmitted, so the
//! signature is checked before anything in the token is decoded.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use warrant_types::{Error, Result, ShareId, WorkspaceId};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::share::SharePermission;

type HmacSha256 = Hmac<Sha256>;

const INVALID_TOKEN: &str = "invalid token";

/// HMAC key material for token signing.
///
/// Zeroed on drop and never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl SigningKey {
    /// Wraps raw key bytes. Empty keys are rejected.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::validation("signing secret is required"));
        }
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(&self.bytes)
            .map_err(|e| Error::internal(format!("hmac key rejected: {e}")))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Claims carried inside a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub share_id: ShareId,
    pub workspace_id: WorkspaceId,
    pub permission: SharePermission,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
}

/// Wire form of the claims segment. Timestamps are Unix seconds.
#[derive(Serialize, Deserialize)]
struct Payload {
    sid: Uuid,
    wid: String,
    perm: SharePermission,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    iat: i64,
}

/// Issues and verifies capability tokens under a single secret.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    key: SigningKey,
}

impl TokenSigner {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Builds a signer from a configured secret string.
    pub fn from_secret(secret: &str) -> Result<Self> {
        Ok(Self::new(SigningKey::new(secret.as_bytes())?))
    }

    /// Encodes and signs a token for a share.
    ///
    /// Timestamps are truncated to whole seconds.
    pub fn generate_token(
        &self,
        share_id: ShareId,
        workspace_id: &WorkspaceId,
        permission: SharePermission,
        expires_at: Option<DateTime<Utc>>,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let payload = Payload {
            sid: share_id.as_uuid(),
            wid: workspace_id.as_str().to_string(),
            perm: permission,
            exp: expires_at.map(|t| t.timestamp()),
            iat: issued_at.timestamp(),
        };
        let json = serde_json::to_vec(&payload)
            .map_err(|e| Error::internal(format!("token encoding failed: {e}")))?;
        let claims = URL_SAFE_NO_PAD.encode(json);

        let mut mac = self.key.mac()?;
        mac.update(claims.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{claims}.{signature}"))
    }

    /// Verifies a token's signature and decodes its claims.
    ///
    /// Every failure, malformed or forged, is the same generic validation
    /// error.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims> {
        let invalid = || Error::validation(INVALID_TOKEN);

        let (claims, signature) = token.split_once('.').ok_or_else(invalid)?;
        if claims.is_empty() || signature.is_empty() {
            return Err(invalid());
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| invalid())?;

        let mut mac = self.key.mac()?;
        mac.update(claims.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        let json = URL_SAFE_NO_PAD.decode(claims).map_err(|_| invalid())?;
        let payload: Payload = serde_json::from_slice(&json).map_err(|_| invalid())?;

        let workspace_id = WorkspaceId::parse(&payload.wid).map_err(|_| invalid())?;
        let issued_at = DateTime::from_timestamp(payload.iat, 0).ok_or_else(invalid)?;
        let expires_at = match payload.exp {
            Some(secs) => Some(DateTime::from_timestamp(secs, 0).ok_or_else(invalid)?),
            None => None,
        };

        Ok(TokenClaims {
            share_id: ShareId::from_uuid(payload.sid),
            workspace_id,
            permission: payload.perm,
            expires_at,
            issued_at,
        })
    }
}

/// Hex SHA-256 of a token.
///
/// Used for cache keys and log fields so raw tokens never leave the service.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;
    use test_case::test_case;

    fn signer() -> TokenSigner {
        TokenSigner::from_secret("an-adequately-long-test-secret-value-0123").unwrap()
    }

    fn issued() -> DateTime<Utc> {
        DateTime::from_timestamp(1_772_366_400, 0).unwrap()
    }

    fn token_for(permission: SharePermission, expires_at: Option<DateTime<Utc>>) -> (ShareId, String) {
        let id = ShareId::generate();
        let token = signer()
            .generate_token(id, &WorkspaceId::new("ws1"), permission, expires_at, issued())
            .unwrap();
        (id, token)
    }

    #[test]
    fn test_round_trip_preserves_claims() {
        let expires = issued() + Duration::days(7);
        let (id, token) = token_for(SharePermission::Edit, Some(expires));

        let claims = signer().verify_token(&token).unwrap();
        assert_eq!(claims.share_id, id);
        assert_eq!(claims.workspace_id, WorkspaceId::new("ws1"));
        assert_eq!(claims.permission, SharePermission::Edit);
        assert_eq!(claims.expires_at, Some(expires));
        assert_eq!(claims.issued_at, issued());
    }

    #[test]
    fn test_permanent_token_has_no_expiry() {
        let (_, token) = token_for(SharePermission::ReadOnly, None);
        assert_eq!(signer().verify_token(&token).unwrap().expires_at, None);
    }

    #[test]
    fn test_tokens_are_url_safe() {
        let (_, token) = token_for(SharePermission::Comment, None);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        );
        assert_eq!(token.matches('.').count(), 1);
    }

    #[test]
    fn test_other_secret_rejects() {
        let (_, token) = token_for(SharePermission::Edit, None);
        let other = TokenSigner::from_secret("a-different-but-equally-long-secret-4567").unwrap();
        assert_eq!(other.verify_token(&token).unwrap_err(), Error::validation("invalid token"));
    }

    #[test]
    fn test_swapped_claims_rejected() {
        let (_, first) = token_for(SharePermission::ReadOnly, None);
        let (_, second) = token_for(SharePermission::Edit, None);
        let (claims, _) = second.split_once('.').unwrap();
        let (_, signature) = first.split_once('.').unwrap();

        let forged = format!("{claims}.{signature}");
        assert!(signer().verify_token(&forged).is_err());
    }

    #[test_case("" ; "empty")]
    #[test_case("." ; "dot only")]
    #[test_case("abc" ; "no separator")]
    #[test_case("abc." ; "missing signature")]
    #[test_case(".abc" ; "missing claims")]
    #[test_case("a.b.c" ; "extra segment")]
    #[test_case("!!!.???" ; "not base64")]
    fn test_malformed_tokens_rejected(token: &str) {
        assert_eq!(signer().verify_token(token).unwrap_err(), Error::validation("invalid token"));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(TokenSigner::from_secret(""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_signing_key_debug_hides_material() {
        let key = SigningKey::new("super-sensitive-material").unwrap();
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-sensitive"));
        assert!(rendered.contains("len"));
    }

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let fp = fingerprint("token");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, fingerprint("token"));
        assert_ne!(fp, fingerprint("token2"));
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    const B64URL: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    proptest! {
        #[test]
        fn prop_altered_signature_never_verifies(pos in any::<prop::sample::Index>(), replacement in any::<u8>()) {
            let (_, token) = token_for(SharePermission::Edit, None);
            let dot = token.find('.').unwrap();
            let sig_len = token.len() - dot - 1;
            let at = dot + 1 + pos.index(sig_len);

            let original = token.as_bytes()[at];
            let mut replacement = B64URL[usize::from(replacement) % B64URL.len()];
            if replacement == original {
                replacement = if original == b'A' { b'B' } else { b'A' };
            }

            let mut bytes = token.into_bytes();
            bytes[at] = replacement;
            let tampered = String::from_utf8(bytes).unwrap();
            prop_assert!(signer().verify_token(&tampered).is_err());
        }

        #[test]
        fn prop_altered_claims_never_verify(pos in any::<prop::sample::Index>(), replacement in any::<u8>()) {
            let (_, token) = token_for(SharePermission::ReadOnly, None);
            let dot = token.find('.').unwrap();
            let at = pos.index(dot);

            let original = token.as_bytes()[at];
            let mut replacement = B64URL[usize::from(replacement) % B64URL.len()];
            if replacement == original {
                replacement = if original == b'A' { b'B' } else { b'A' };
            }

            let mut bytes = token.into_bytes();
            bytes[at] = replacement;
            let tampered = String::from_utf8(bytes).unwrap();
            prop_assert!(signer().verify_token(&tampered).is_err());
        }
    }
}
