//! Helpers to build, clear and look up the session cookies.
//!
//! Two cookies matter. The browser console keeps its token in `Signatrust`
//! (scoped to `path=/` and the configured domain); these helpers produce and
//! read that cookie so a token copied from a browser can be imported as-is.
//! The key-management backend keeps its own session in `signatrust` and hands
//! out a short-lived `Xsrf-Token` cookie on every authorised response, which
//! has to be echoed back in the header of the same name.

use std::collections::BTreeMap;

use cookie::Cookie;
use time::Duration;

use super::{CSRF_HEADER, Session, TokenKind};

/// Cookie name for the session token.
pub const SESSION_COOKIE: &str = "Signatrust";
/// Session cookie set by the backend after the code exchange.
pub const BACKEND_COOKIE: &str = "signatrust";
/// Cookie carrying the current CSRF token.
pub const CSRF_COOKIE: &str = CSRF_HEADER;

/// Build the session cookie. `max_age` of `None` makes it a browser-session cookie.
pub fn session_cookie(token: &str, domain: Option<&str>, max_age: Option<Duration>) -> Cookie<'static> {
    let mut builder = Cookie::build((SESSION_COOKIE, token.to_string())).path("/");
    if let Some(domain) = domain {
        builder = builder.domain(domain.to_string());
    }
    if let Some(max_age) = max_age {
        builder = builder.max_age(max_age);
    }
    builder.build()
}

/// Build an expired cookie that deletes the session.
pub fn clear_session_cookie(domain: Option<&str>) -> Cookie<'static> {
    session_cookie("null", domain, Some(Duration::ZERO))
}

/// Look up `name` in a `Cookie:` header / `document.cookie` string.
///
/// The first matching entry with a value wins; an empty value counts as absent.
pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

/// `Cookie:` header value for a jar.
pub fn cookie_header(jar: &BTreeMap<String, String>) -> String {
    jar.iter()
        .map(|(name, value)| Cookie::new(name.as_str(), value.as_str()).to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Applies one `Set-Cookie` value to a browser credential.
///
/// `Xsrf-Token` replaces `token`; any other cookie is stored in `jar`, or
/// removed from it when the server expires it. Returns whether anything
/// changed. Unparseable values are ignored.
pub fn apply_set_cookie(raw: &str, token: &mut String, jar: &mut BTreeMap<String, String>) -> bool {
    let Ok(cookie) = Cookie::parse(raw) else {
        return false;
    };
    let expired = cookie.value().is_empty() || cookie.max_age() == Some(Duration::ZERO);

    if cookie.name() == CSRF_COOKIE {
        if expired || token.as_str() == cookie.value() {
            return false;
        }
        *token = cookie.value().to_string();
        return true;
    }

    if expired {
        return jar.remove(cookie.name()).is_some();
    }
    let previous = jar.insert(cookie.name().to_string(), cookie.value().to_string());
    previous.as_deref() != Some(cookie.value())
}

impl Session {
    /// Applies a `Set-Cookie` response header. API-key sessions ignore cookies.
    pub fn absorb_set_cookie(&mut self, raw: &str) -> bool {
        if self.kind != TokenKind::Csrf {
            return false;
        }
        apply_set_cookie(raw, &mut self.token, &mut self.cookies)
    }
}

/// Session carried by a cookie header.
///
/// `Xsrf-Token` (or the browser console's `Signatrust` cookie) becomes the
/// token and the backend's `signatrust` cookie goes into the jar. `None` when
/// the header carries neither.
pub fn session_from_cookie_header(header: &str) -> Option<Session> {
    let token = find_cookie(header, CSRF_COOKIE).or_else(|| find_cookie(header, SESSION_COOKIE));
    let backend = find_cookie(header, BACKEND_COOKIE);
    if token.is_none() && backend.is_none() {
        return None;
    }

    let mut session = Session::new(token.unwrap_or_default(), TokenKind::Csrf);
    if let Some(value) = backend {
        session.cookies.insert(BACKEND_COOKIE.to_string(), value);
    }
    Some(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_scoped_to_root_and_domain() {
        let c = session_cookie("tok", Some("example.com"), None);
        assert_eq!(c.name(), SESSION_COOKIE);
        assert_eq!(c.value(), "tok");
        assert_eq!(c.path(), Some("/"));
        assert_eq!(c.domain(), Some("example.com"));
        assert!(c.max_age().is_none());
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let c = clear_session_cookie(None);
        assert_eq!(c.max_age(), Some(Duration::ZERO));
        assert!(c.to_string().contains("Max-Age=0"));
    }

    #[test]
    fn find_cookie_returns_first_match() {
        let header = "lang=en; Signatrust=abc; Signatrust=def";
        assert_eq!(find_cookie(header, "Signatrust"), Some("abc".into()));
    }

    #[test]
    fn find_cookie_treats_empty_as_absent() {
        assert_eq!(find_cookie("Signatrust=; lang=en", "Signatrust"), None);
        assert_eq!(find_cookie("", "Signatrust"), None);
        assert_eq!(
            find_cookie("Signatrust=; Signatrust=later", "Signatrust"),
            Some("later".into())
        );
    }

    #[test]
    fn find_cookie_does_not_match_name_suffix() {
        assert_eq!(find_cookie("XSignatrust=abc", "Signatrust"), None);
    }

    #[test]
    fn find_cookie_is_case_sensitive() {
        assert_eq!(find_cookie("signatrust=backend", "Signatrust"), None);
        assert_eq!(find_cookie("signatrust=backend", BACKEND_COOKIE), Some("backend".into()));
    }

    #[test]
    fn cookie_header_yields_csrf_session() {
        let s = session_from_cookie_header("Signatrust=xyz").unwrap();
        assert_eq!(s.token, "xyz");
        assert_eq!(s.kind, TokenKind::Csrf);
        assert!(s.cookies.is_empty());
    }

    #[test]
    fn backend_cookies_are_imported_into_the_jar() {
        let s = session_from_cookie_header("lang=en; signatrust=sess; Xsrf-Token=x1").unwrap();
        assert_eq!(s.token, "x1");
        assert_eq!(s.cookies.get(BACKEND_COOKIE).map(String::as_str), Some("sess"));

        let s = session_from_cookie_header("signatrust=sess").unwrap();
        assert!(s.needs_csrf());

        assert!(session_from_cookie_header("lang=en").is_none());
    }

    #[test]
    fn set_cookie_rotates_csrf_and_fills_jar() {
        let mut s = Session::new("", TokenKind::Csrf);
        assert!(s.absorb_set_cookie("signatrust=sess; Path=/; HttpOnly"));
        assert!(s.absorb_set_cookie("Xsrf-Token=x1; Secure; Path=/; Max-Age=600"));
        assert!(!s.absorb_set_cookie("Xsrf-Token=x1; Secure; Path=/; Max-Age=600"));
        assert!(s.absorb_set_cookie("Xsrf-Token=x2; Secure; Path=/; Max-Age=600"));
        assert_eq!(s.token, "x2");
        assert_eq!(cookie_header(&s.cookies), "signatrust=sess");

        assert!(s.absorb_set_cookie("signatrust=; Path=/; Max-Age=0"));
        assert!(s.cookies.is_empty());
        assert!(!s.absorb_set_cookie("not a cookie"));
    }

    #[test]
    fn api_key_sessions_ignore_cookies() {
        let mut s = Session::new("key", TokenKind::ApiKey);
        assert!(!s.absorb_set_cookie("Xsrf-Token=x1"));
        assert_eq!(s.token, "key");
    }
}
