//! Authorization-code handling for the identity-provider redirect.

use url::{Url, form_urlencoded};

const CODE_PARAM: &str = "code";
const STATE_PARAM: &str = "state";

/// Code (and optional CSRF state) carried by the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCode {
    pub code: String,
    pub state: Option<String>,
}

/// Extracts the authorization code from a redirect URL. A missing or empty
/// `code` yields `None`.
pub fn parse_callback(url: &Url) -> Option<AuthCode> {
    let mut code = None;
    let mut state = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            CODE_PARAM if code.is_none() => code = Some(v.into_owned()),
            STATE_PARAM if state.is_none() => state = Some(v.into_owned()),
            _ => {}
        }
    }
    let code = code.filter(|c| !c.is_empty())?;
    Some(AuthCode {
        code,
        state: state.filter(|s| !s.is_empty()),
    })
}

/// Whether the URL still carries `code` or `state`.
pub fn has_callback_params(url: &Url) -> bool {
    url.query_pairs()
        .any(|(k, _)| k == CODE_PARAM || k == STATE_PARAM)
}

/// Returns `url` without `code`/`state`, keeping every other parameter
/// verbatim and the fragment. A URL without those parameters is returned
/// unchanged.
pub fn strip_callback_params(url: &Url) -> Url {
    if !has_callback_params(url) {
        return url.clone();
    }
    let remaining = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_callback_pair(pair))
        .collect::<Vec<_>>()
        .join("&");

    let mut clean = url.clone();
    clean.set_query((!remaining.is_empty()).then_some(remaining.as_str()));
    clean
}

fn is_callback_pair(pair: &str) -> bool {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .is_some_and(|(k, _)| k == CODE_PARAM || k == STATE_PARAM)
}
