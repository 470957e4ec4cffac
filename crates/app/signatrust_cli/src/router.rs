use signatrust_core::config::Variant;

/// Console pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `/`
    KeyList,
    /// `/tokens` or `/apiTokens`, depending on the variant.
    ApiTokens,
}

impl Route {
    /// Matches a console path. Query string, fragment and a trailing slash
    /// are ignored; a hash route (`#/tokens`) is accepted too.
    pub fn resolve(path: &str, variant: Variant) -> Option<Route> {
        let path = path.strip_prefix('#').unwrap_or(path);
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        if path.is_empty() {
            return Some(Route::KeyList);
        }
        (path == variant.tokens_route()).then_some(Route::ApiTokens)
    }

    pub fn path(&self, variant: Variant) -> &'static str {
        match self {
            Route::KeyList => "/",
            Route::ApiTokens => variant.tokens_route(),
        }
    }
}
