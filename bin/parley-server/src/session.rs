//! Cookie-backed session identity.
//!
//! The conversation store is keyed by an opaque id; this module is the only
//! place that knows the id lives in a browser cookie. Handlers call
//! [`ensure_session`] and send the returned jar back with the response so a
//! newly minted cookie reaches the client.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "parley_session";

/// Read the session id from the jar, minting a new cookie if absent.
pub fn ensure_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_owned();
        return (jar, id);
    }

    let id = Uuid::new_v4().to_string();
    let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
        .path("/")
        .http_only(true)
        .build();
    (jar.add(cookie), id)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
