//! Admin sessions: HMAC-SHA256-signed expiring tokens carried in an
//! HttpOnly cookie.
//!
//! Token format: `<issued_at_hex>.<signature_hex>`. The signature covers
//! the timestamp, keyed by the admin password, so tokens survive restarts
//! without any server-side session table.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Session lifetime (7 days).
const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Cookie carrying the admin token.
pub const SESSION_COOKIE: &str = "admin_session";

/// Issues and validates admin session tokens. Handed to handlers through
/// `AppState`; nothing here is process-global.
#[derive(Clone)]
pub struct AdminSessions {
    secret: String,
}

impl AdminSessions {
    /// With an empty password the admin surface is disabled: `login`
    /// always fails and `validate` always returns false.
    pub fn new(admin_password: String) -> Self {
        Self {
            secret: admin_password,
        }
    }

    pub fn password_matches(&self, candidate: &str) -> bool {
        !self.secret.is_empty() && candidate == self.secret
    }

    /// Mint a token stamped with the current time.
    pub fn issue(&self) -> String {
        let issued_at = chrono::Utc::now().timestamp();
        let payload = format!("{:x}", issued_at);
        let sig = self.sign(&payload);
        format!("{}.{}", payload, sig)
    }

    /// Check signature (constant-time) and age.
    pub fn validate(&self, token: &str) -> bool {
        if self.secret.is_empty() {
            return false;
        }
        let Some((payload, sig_hex)) = token.split_once('.') else {
            return false;
        };
        let Ok(sig) = hex::decode(sig_hex) else {
            return false;
        };

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        if mac.verify_slice(&sig).is_err() {
            return false;
        }

        let Ok(issued_at) = i64::from_str_radix(payload, 16) else {
            return false;
        };
        let age = chrono::Utc::now().timestamp() - issued_at;
        (0..SESSION_TTL_SECS).contains(&age)
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

// ── Cookie helpers ──

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, SESSION_TTL_SECS
    )
}

pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

fn token_from_cookies(cookie_header: &str) -> Option<&str> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
}

// ── Middleware ──

/// Rejects requests without a valid admin session cookie.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(token_from_cookies)
        .ok_or(ApiError::Unauthorized)?;

    if !state.sessions.validate(token) {
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions() -> AdminSessions {
        AdminSessions::new("s3cret".into())
    }

    #[test]
    fn test_issue_then_validate() {
        let s = sessions();
        let token = s.issue();
        assert!(s.validate(&token));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let s = sessions();
        let token = s.issue();
        let (payload, _) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", payload, "00".repeat(32));
        assert!(!s.validate(&forged));
    }

    #[test]
    fn test_tampered_timestamp_rejected() {
        let s = sessions();
        let token = s.issue();
        let (_, sig) = token.split_once('.').unwrap();
        let future = format!("{:x}", chrono::Utc::now().timestamp() + 1000);
        assert!(!s.validate(&format!("{}.{}", future, sig)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let s = sessions();
        let old = chrono::Utc::now().timestamp() - SESSION_TTL_SECS - 1;
        let payload = format!("{:x}", old);
        let sig = s.sign(&payload);
        assert!(!s.validate(&format!("{}.{}", payload, sig)));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = sessions().issue();
        let other = AdminSessions::new("different".into());
        assert!(!other.validate(&token));
    }

    #[test]
    fn test_empty_password_disables_admin() {
        let s = AdminSessions::new(String::new());
        assert!(!s.password_matches(""));
        let token = s.issue();
        assert!(!s.validate(&token));
    }

    #[test]
    fn test_garbage_tokens_rejected() {
        let s = sessions();
        assert!(!s.validate(""));
        assert!(!s.validate("no-dot-here"));
        assert!(!s.validate("abc.nothex"));
    }

    #[test]
    fn test_cookie_parsing() {
        assert_eq!(
            token_from_cookies("theme=dark; admin_session=abc.def; lang=pt"),
            Some("abc.def")
        );
        assert_eq!(token_from_cookies("theme=dark"), None);
        // Prefix of another cookie name must not match.
        assert_eq!(token_from_cookies("admin_sessionx=abc"), None);
    }
}
