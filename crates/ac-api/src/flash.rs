//! Flash messages: notices that survive exactly one redirect.
//!
//! The messages travel in a cookie holding `payload.signature`, both
//! base64url. The payload is a JSON array of strings and the signature is
//! HMAC-SHA256 over the encoded payload, keyed with the configured secret.
//! The board page reads the cookie once and clears it.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const FLASH_COOKIE: &str = "altchan_flash";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct FlashSigner {
    mac: HmacSha256,
}

impl FlashSigner {
    pub fn new(secret: &[u8]) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    fn signature(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac
    }

    pub fn encode(&self, messages: &[String]) -> serde_json::Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(messages)?);
        let signature = URL_SAFE_NO_PAD.encode(self.signature(&payload).finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Returns `None` for anything not produced by `encode` with this key.
    pub fn decode(&self, value: &str) -> Option<Vec<String>> {
        let (payload, signature) = value.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        self.signature(payload).verify_slice(&signature).ok()?;
        let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// Adds the messages to the jar for the next request to pick up.
    pub fn set(&self, jar: CookieJar, messages: &[String]) -> serde_json::Result<CookieJar> {
        let cookie = Cookie::build((FLASH_COOKIE, self.encode(messages)?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        Ok(jar.add(cookie))
    }

    /// Reads and clears pending messages. Invalid cookies are dropped.
    pub fn take(&self, jar: CookieJar) -> (CookieJar, Vec<String>) {
        let pending = jar.get(FLASH_COOKIE).map(|c| self.decode(c.value()));
        let Some(pending) = pending else {
            return (jar, Vec::new());
        };
        let messages = pending.unwrap_or_else(|| {
            tracing::debug!("discarding flash cookie with a bad signature");
            Vec::new()
        });
        (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
    }
}
