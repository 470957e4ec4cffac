//! Console configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::session::ExpiryPolicy;

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Path of the backend login endpoint, relative to the base URL.
pub const LOGIN_PATH: &str = "/api/v1/users/login";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL in {var}: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Console flavour. Selects the API-token route and the code-exchange endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Key management console.
    #[default]
    Signatrust,
    /// Certification console.
    Certification,
}

impl Variant {
    /// Route of the API-token page.
    pub fn tokens_route(&self) -> &'static str {
        match self {
            Variant::Signatrust => "/tokens",
            Variant::Certification => "/apiTokens",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Signatrust => "signatrust",
            Variant::Certification => "certification",
        })
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signatrust" => Ok(Variant::Signatrust),
            "certification" => Ok(Variant::Certification),
            other => Err(format!("unknown variant '{other}'")),
        }
    }
}

/// Configuration for the console.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Backend base URL; API paths are joined onto it.
    pub base_url: Url,
    /// Where the operator is sent to log in.
    pub login_url: Url,
    /// Identity-provider logout endpoint, if any.
    pub provider_logout_url: Option<Url>,
    /// Domain of the `Signatrust` cookie.
    pub cookie_domain: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub variant: Variant,
    /// File holding the session token.
    pub session_path: PathBuf,
    /// Session lifetime; `None` keeps it until logout or a 401.
    pub session_max_age: Option<chrono::Duration>,
}

impl ConsoleConfig {
    /// Defaults for a backend at `base_url`.
    pub fn new(base_url: Url) -> Self {
        let login_url = base_url.join(LOGIN_PATH).unwrap_or_else(|_| base_url.clone());
        Self {
            base_url,
            login_url,
            provider_logout_url: None,
            cookie_domain: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            variant: Variant::default(),
            session_path: default_session_path(),
            session_max_age: None,
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                          | Default                              |
    /// |-----------------------------------|--------------------------------------|
    /// | `SIGNATRUST_URL`                  | `http://127.0.0.1:8080`              |
    /// | `SIGNATRUST_LOGIN_URL`            | `<base>/api/v1/users/login`          |
    /// | `SIGNATRUST_LOGOUT_URL`           | unset                                |
    /// | `SIGNATRUST_COOKIE_DOMAIN`        | unset                                |
    /// | `SIGNATRUST_TIMEOUT_SECS`         | `60`                                 |
    /// | `SIGNATRUST_VARIANT`              | `signatrust`                         |
    /// | `SIGNATRUST_SESSION_FILE`         | `<cache dir>/signatrust/session.json`|
    /// | `SIGNATRUST_SESSION_MAX_AGE_SECS` | unset                                |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ConsoleConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let base_url = parse_url(
            "SIGNATRUST_URL",
            &get("SIGNATRUST_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
        )?;
        let mut config = Self::new(base_url);

        if let Some(v) = get("SIGNATRUST_LOGIN_URL") {
            config.login_url = parse_url("SIGNATRUST_LOGIN_URL", &v)?;
        }
        if let Some(v) = get("SIGNATRUST_LOGOUT_URL") {
            config.provider_logout_url = Some(parse_url("SIGNATRUST_LOGOUT_URL", &v)?);
        }
        config.cookie_domain = get("SIGNATRUST_COOKIE_DOMAIN");
        if let Some(v) = get("SIGNATRUST_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_u64("SIGNATRUST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("SIGNATRUST_VARIANT") {
            config.variant = v.parse().map_err(|_| ConfigError::InvalidValue {
                var: "SIGNATRUST_VARIANT",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("SIGNATRUST_SESSION_FILE") {
            config.session_path = PathBuf::from(v);
        }
        if let Some(v) = get("SIGNATRUST_SESSION_MAX_AGE_SECS") {
            let secs = parse_u64("SIGNATRUST_SESSION_MAX_AGE_SECS", &v)?;
            config.session_max_age = Some(chrono::Duration::seconds(secs as i64));
        }
        Ok(config)
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        match self.session_max_age {
            Some(age) => ExpiryPolicy::MaxAge(age),
            None => ExpiryPolicy::UntilCleared,
        }
    }
}

/// `<cache dir>/signatrust/session.json`, falling back to the working directory.
pub fn default_session_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("signatrust")
        .join("session.json")
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { var, source })
}

fn parse_u64(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let c = ConsoleConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(c.base_url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(c.login_url.as_str(), "http://127.0.0.1:8080/api/v1/users/login");
        assert_eq!(c.timeout, Duration::from_secs(60));
        assert_eq!(c.variant, Variant::Signatrust);
        assert_eq!(c.expiry_policy(), ExpiryPolicy::UntilCleared);
        assert!(c.session_path.ends_with("signatrust/session.json"));
    }

    #[test]
    fn env_overrides() {
        let c = ConsoleConfig::from_lookup(lookup(&[
            ("SIGNATRUST_URL", "https://sig.example.com"),
            ("SIGNATRUST_LOGOUT_URL", "https://id.example.com/logout"),
            ("SIGNATRUST_COOKIE_DOMAIN", "example.com"),
            ("SIGNATRUST_TIMEOUT_SECS", "5"),
            ("SIGNATRUST_VARIANT", "certification"),
            ("SIGNATRUST_SESSION_FILE", "/tmp/s.json"),
            ("SIGNATRUST_SESSION_MAX_AGE_SECS", "600"),
        ]))
        .unwrap();
        assert_eq!(c.login_url.as_str(), "https://sig.example.com/api/v1/users/login");
        assert!(c.provider_logout_url.is_some());
        assert_eq!(c.cookie_domain.as_deref(), Some("example.com"));
        assert_eq!(c.timeout, Duration::from_secs(5));
        assert_eq!(c.variant, Variant::Certification);
        assert_eq!(c.session_path, PathBuf::from("/tmp/s.json"));
        assert_eq!(
            c.expiry_policy(),
            ExpiryPolicy::MaxAge(chrono::Duration::seconds(600))
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let c = ConsoleConfig::from_lookup(lookup(&[("SIGNATRUST_URL", "  ")])).unwrap();
        assert_eq!(c.base_url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            ConsoleConfig::from_lookup(lookup(&[("SIGNATRUST_URL", "not a url")])),
            Err(ConfigError::InvalidUrl { var: "SIGNATRUST_URL", .. })
        ));
        assert!(matches!(
            ConsoleConfig::from_lookup(lookup(&[("SIGNATRUST_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            ConsoleConfig::from_lookup(lookup(&[("SIGNATRUST_VARIANT", "desktop")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn tokens_route_depends_on_variant() {
        assert_eq!(Variant::Signatrust.tokens_route(), "/tokens");
        assert_eq!(Variant::Certification.tokens_route(), "/apiTokens");
    }
}
