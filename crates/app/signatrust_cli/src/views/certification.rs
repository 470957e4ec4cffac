//! Certification console views: certificate records and cooperators.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::Value;
use signatrust_client::Upload;
use signatrust_client::api::cooperator::UPLOAD_FIELD;
use signatrust_core::models::QueryParams;

use super::render::{print_json, value_table};
use crate::context::AppContext;
use crate::{Error, Result};

fn show(ctx: &AppContext, value: &Value) -> Result<()> {
    if ctx.json {
        return print_json(value);
    }
    let text = value_table(value)?;
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
    Ok(())
}

pub async fn search(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let found = ctx.client.search_certificates(&params).await?;
    show(ctx, &found)
}

/// Writes the CSV export to `out`.
pub async fn export(ctx: &mut AppContext, params: QueryParams, out: &Path) -> Result<()> {
    let bytes = ctx.client.export_certificates(&params).await?;
    fs::write(out, &bytes)?;
    println!("Wrote {} bytes to {}", bytes.len(), out.display());
    Ok(())
}

pub async fn edit(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let res = ctx.client.edit_certificate(&params).await?;
    show(ctx, &res)
}

pub async fn upload_info(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let res = ctx.client.upload_certificate_info(&params).await?;
    show(ctx, &res)
}

pub async fn delete(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let res = ctx.client.delete_certificate(&params).await?;
    show(ctx, &res)
}

pub async fn cooperators(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let list = ctx.client.cooperators(&params).await?;
    show(ctx, &list)
}

pub async fn categories(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let list = ctx.client.cooperator_categories(&params).await?;
    show(ctx, &list)
}

pub async fn cert_types(ctx: &mut AppContext) -> Result<()> {
    let list = ctx.client.cert_types().await?;
    show(ctx, &list)
}

/// Reads a JSON document from `path`, or stdin for `-`.
fn read_json(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&text)?)
}

pub async fn save_cooperator(ctx: &mut AppContext, path: &Path) -> Result<()> {
    let body = read_json(path)?;
    if !body.is_object() {
        return Err(Error::Custom("cooperator document must be a JSON object".into()));
    }
    let saved = ctx.client.save_cooperator(&body).await?;
    show(ctx, &saved)
}

pub async fn delete_cooperator(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let res = ctx.client.delete_cooperator(&params).await?;
    show(ctx, &res)
}

pub async fn cooperator_detail(ctx: &mut AppContext, params: QueryParams) -> Result<()> {
    let detail = ctx.client.cooperator_detail(&params).await?;
    if let Some(logo) = logo_url(&detail) {
        ctx.ui.show_image(logo);
    }
    show(ctx, &detail)?;
    if let (false, Some(logo)) = (ctx.json, ctx.ui.dialog_image_url()) {
        println!("Logo: {logo}");
    }
    Ok(())
}

pub async fn upload_logo(ctx: &mut AppContext, path: &Path, mime: Option<String>) -> Result<()> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "logo".to_string());
    let mime = mime.or_else(|| guess_mime(path));
    let mut upload = Upload::new(UPLOAD_FIELD, file_name, bytes);
    if let Some(mime) = mime {
        upload = upload.with_mime(mime);
    }
    let res = ctx.client.upload_logo(upload).await?;
    if let Some(url) = logo_url(&res) {
        ctx.ui.show_image(url);
    }
    show(ctx, &res)
}

/// Content type from the file extension; unknown extensions leave it to the server.
fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first().map(|mime| mime.to_string())
}

/// Logo location in a cooperator record or upload response.
fn logo_url(value: &Value) -> Option<String> {
    let candidates = [value.get("data").unwrap_or(value), value];
    candidates.iter().find_map(|v| match v {
        Value::String(s) if s.starts_with("http") || s.starts_with('/') => Some(s.clone()),
        Value::Object(map) => ["logo", "logoUrl", "url"]
            .iter()
            .find_map(|k| map.get(*k)?.as_str().map(str::to_string)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(guess_mime(Path::new("a/logo.PNG")).as_deref(), Some("image/png"));
        assert_eq!(guess_mime(Path::new("logo.jpeg")).as_deref(), Some("image/jpeg"));
        assert_eq!(guess_mime(Path::new("logo.svg")).as_deref(), Some("image/svg+xml"));
        assert_eq!(guess_mime(Path::new("logo.webp")).as_deref(), Some("image/webp"));
        assert_eq!(guess_mime(Path::new("logo")), None);
    }

    #[test]
    fn logo_url_is_found_in_common_shapes() {
        assert_eq!(
            logo_url(&json!({"data": "https://cdn.example.com/l.png"})).as_deref(),
            Some("https://cdn.example.com/l.png")
        );
        assert_eq!(
            logo_url(&json!({"data": {"name": "acme", "logo": "/files/acme.png"}})).as_deref(),
            Some("/files/acme.png")
        );
        assert_eq!(logo_url(&json!({"name": "acme"})), None);
    }

    #[test]
    fn json_document_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coop.json");
        fs::write(&path, r#"{"name":"acme"}"#).unwrap();
        assert_eq!(read_json(&path).unwrap(), json!({"name": "acme"}));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(read_json(&path), Err(Error::Json(_))));
    }
}
