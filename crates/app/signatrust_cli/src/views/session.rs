//! Login, logout, identity and route views.

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::json;
use signatrust_core::auth::provider_logout_url;
use signatrust_core::format::humanize_secs;
use signatrust_core::models::QueryParams;
use signatrust_core::session::cookie::{clear_session_cookie, session_cookie, session_from_cookie_header};
use signatrust_core::session::Session;
use url::Url;

use super::render::print_json;
use super::{keys, tokens};
use crate::cli::LoginArgs;
use crate::context::AppContext;
use crate::router::Route;
use crate::{Error, Result};

pub async fn login(ctx: &mut AppContext, args: LoginArgs) -> Result<()> {
    if let Some(key) = args.api_key {
        ctx.auth.login_with_api_key(&key)?;
        info!("API key stored in {}", ctx.config.session_path.display());
        return identify(ctx).await;
    }

    if let Some(header) = args.cookie {
        let session = session_from_cookie_header(&header)
            .ok_or_else(|| Error::Custom("no Signatrust, signatrust or Xsrf-Token cookie in the given header".into()))?;
        ctx.auth.adopt(session)?;
        info!("Browser session imported");
        return identify(ctx).await;
    }

    if let Some(callback) = args.callback {
        ctx.ui.begin_login(ctx.config.login_url.clone());
        let outcome = ctx.auth.complete_redirect(&ctx.client, &callback).await;
        debug!("Redirect cleaned to {}", outcome.clean_url);
        if let Err(e) = outcome.result {
            ctx.ui.finish_login(None);
            return Err(e.into());
        }
        let identity = ctx.client.user_info().await.ok();
        let email = identity.as_ref().map(|i| i.email.clone());
        ctx.ui.finish_login(identity);
        println!("Logged in{}", email.map(|e| format!(" as {e}")).unwrap_or_default());
        return Ok(());
    }

    ctx.ui.begin_login(ctx.config.login_url.clone());
    if let Some(url) = ctx.ui.login_frame_url() {
        println!("Open {url} in a browser and sign in.");
    }
    println!("Then run: signatrust login --callback '<URL the browser was redirected to>'");
    Ok(())
}

/// Fetches the identity for a freshly stored session.
async fn identify(ctx: &mut AppContext) -> Result<()> {
    let me = ctx.client.user_info().await?;
    println!("Logged in as {} (id {})", me.email, me.id);
    ctx.ui.set_identity(me);
    Ok(())
}

pub async fn logout(ctx: &mut AppContext) -> Result<()> {
    if !ctx.auth.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    let result = ctx.auth.logout(&ctx.client).await;
    ctx.ui.reset_identity();
    debug!(
        "Browser cookie to clear: {}",
        clear_session_cookie(ctx.config.cookie_domain.as_deref())
    );
    if let Err(e) = result {
        warn!("{e}; local session removed anyway");
    }
    println!("Logged out.");
    if let Some(provider) = &ctx.config.provider_logout_url {
        println!(
            "To end the identity-provider session open {}",
            provider_logout_url(provider, &ctx.config.login_url)
        );
    }
    Ok(())
}

pub async fn whoami(ctx: &mut AppContext, cookie: bool, permissions: bool) -> Result<()> {
    let me = ctx.client.user_info().await?;
    ctx.ui.set_identity(me.clone());
    let granted = if permissions {
        Some(ctx.client.permissions(&QueryParams::new()).await?)
    } else {
        None
    };
    let session = ctx.auth.reload()?.cloned();

    if ctx.json {
        let mut out = json!({
            "id": me.id,
            "email": me.email,
            "session": session,
        });
        if let Some(granted) = granted {
            out["permissions"] = granted;
        }
        return print_json(&out);
    }
    println!("{} (id {})", me.email, me.id);
    if let Some(granted) = &granted {
        println!("Permissions: {granted}");
    }
    if let Some(session) = &session {
        println!("{}", describe_session(session));
        if cookie {
            let max_age = session
                .expires_at
                .map(|at| time::Duration::seconds((at - Utc::now()).num_seconds().max(0)));
            println!(
                "Set-Cookie: {}",
                session_cookie(&session.token, ctx.config.cookie_domain.as_deref(), max_age)
            );
        }
    }
    Ok(())
}

fn describe_session(session: &Session) -> String {
    let kind = match session.kind {
        signatrust_core::session::TokenKind::Csrf => "browser session",
        signatrust_core::session::TokenKind::ApiKey => "API key",
    };
    match session.expires_at {
        Some(at) => {
            let left = (at - Utc::now()).num_seconds().max(0) as u64;
            format!("{kind}, expires in {}", humanize_secs(left))
        }
        None => format!("{kind}, no expiry"),
    }
}

/// Shows the view behind a console route. A full redirect URL carrying an
/// authorization code completes the login first.
pub async fn open(ctx: &mut AppContext, path: &str) -> Result<()> {
    let route_path = match Url::parse(path) {
        Ok(url) => {
            if signatrust_core::auth::has_callback_params(&url) {
                login(
                    ctx,
                    LoginArgs {
                        callback: Some(url.clone()),
                        api_key: None,
                        cookie: None,
                    },
                )
                .await?;
            }
            match url.fragment() {
                Some(fragment) if fragment.starts_with('/') => fragment.to_string(),
                _ => url.path().to_string(),
            }
        }
        Err(_) => path.to_string(),
    };

    let variant = ctx.config.variant;
    match Route::resolve(&route_path, variant) {
        Some(Route::KeyList) => {
            let filter = keys::ListFilter {
                page: 1,
                page_size: signatrust_core::state::keys::DEFAULT_PAGE_SIZE,
                search: String::new(),
                select: Default::default(),
            };
            keys::list(ctx, None, filter).await
        }
        Some(Route::ApiTokens) => tokens::list(ctx).await,
        None => Err(Error::Custom(format!(
            "no view at '{route_path}' (try '/' or '{}')",
            Route::ApiTokens.path(variant)
        ))),
    }
}
