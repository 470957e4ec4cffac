//! Login guard: what happens when the backend rejects the session.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;
use url::Url;

/// Sends the operator back to the identity provider.
pub trait AuthGuard: Send + Sync {
    fn redirect_to_login(&self);
}

/// Guard that announces the login URL. A terminal cannot navigate, so the
/// redirect is surfaced as a warning with the URL to open.
#[derive(Debug)]
pub struct LoginRedirect {
    login_url: Url,
    redirects: AtomicUsize,
}

impl LoginRedirect {
    pub fn new(login_url: Url) -> Self {
        Self {
            login_url,
            redirects: AtomicUsize::new(0),
        }
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Number of redirects issued so far.
    pub fn redirect_count(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl AuthGuard for LoginRedirect {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        warn!(login_url = %self.login_url, "session rejected, log in again");
    }
}

/// Identity-provider logout URL that lands back on the console login.
pub fn provider_logout_url(provider_logout: &Url, return_to: &Url) -> Url {
    let mut url = provider_logout.clone();
    url.query_pairs_mut()
        .append_pair("redirect_uri", return_to.as_str());
    url
}
