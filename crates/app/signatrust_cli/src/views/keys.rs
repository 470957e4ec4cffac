//! Key list view (`/`) and key lifecycle commands.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Utc};
use serde_json::json;
use signatrust_core::models::{
    CreateKey, DataKey, ImportKey, KeyAction, KeyType, KeyValue, SearchField, Visibility,
};
use signatrust_core::state::KeyListState;

use super::render::{Table, print_json, timestamp};
use crate::{Error, Result};
use crate::context::AppContext;

/// Longest validity accepted for a new key: one hundred years.
pub const MAX_EXPIRE_DAYS: i64 = 100 * 366;

/// Paging and search applied to each listed scope.
#[derive(Debug, Clone)]
pub struct ListFilter {
    pub page: u64,
    pub page_size: u64,
    pub search: String,
    pub select: SearchField,
}

impl ListFilter {
    fn apply(&self, state: &mut KeyListState) {
        state.set_page_size(self.page_size);
        state.set_select(self.select);
        state.set_search(self.search.clone());
        state.set_page(self.page);
    }
}

pub async fn list(
    ctx: &mut AppContext,
    visibility: Option<Visibility>,
    filter: ListFilter,
) -> Result<()> {
    let scopes = match visibility {
        Some(v) => vec![v],
        None => vec![Visibility::Public, Visibility::Private],
    };
    for scope in &scopes {
        filter.apply(ctx.keys.scope_mut(*scope));
    }
    match visibility {
        Some(v) => {
            ctx.keys.scope_mut(v).fetch(&ctx.client).await?;
        }
        None => ctx.keys.fetch_all(&ctx.client).await?,
    }

    if ctx.json {
        let mut out = serde_json::Map::new();
        for scope in &scopes {
            let state = ctx.keys.scope(*scope);
            out.insert(
                scope.to_string(),
                json!({
                    "total_count": state.total_count(),
                    "page": state.pagination().current_page,
                    "page_size": state.pagination().page_size,
                    "data": state.displayed(),
                }),
            );
        }
        return print_json(&out);
    }

    for scope in &scopes {
        print_scope(ctx.keys.scope(*scope));
    }
    Ok(())
}

fn print_scope(state: &KeyListState) {
    let counts = state.counts();
    let p = state.pagination();
    println!(
        "{} keys: {} total, page {}/{} (pgp {}, x509 {})",
        state.visibility(),
        state.total_count(),
        p.current_page,
        state.page_count().max(1),
        counts.get(KeyType::Pgp),
        counts.get(KeyType::X509),
    );
    let mut table = Table::new(["ID", "NAME", "TYPE", "STATE", "EXPIRES", "DESCRIPTION"]);
    for key in state.displayed() {
        table.push(vec![
            key.id.to_string(),
            key.name.clone(),
            key.key_type.clone(),
            key.key_state.to_string(),
            timestamp(&key.expire_at),
            key.description.clone(),
        ]);
    }
    if table.is_empty() {
        println!("(no keys)\n");
    } else {
        println!("{table}");
    }
}

pub async fn show(ctx: &mut AppContext, id: i32) -> Result<()> {
    let key = ctx.client.show_key(id).await?;
    if ctx.json {
        return print_json(&key);
    }
    print_key(&key);
    Ok(())
}

fn print_key(key: &DataKey) {
    let mut table = Table::new(["FIELD", "VALUE"]);
    let mut row = |k: &str, v: String| table.push(vec![k.to_string(), v]);
    row("id", key.id.to_string());
    row("name", key.name.clone());
    row("description", key.description.clone());
    row("visibility", key.visibility.to_string());
    row("type", key.key_type.clone());
    row("state", key.key_state.to_string());
    row("owner", key.user_email.clone().unwrap_or_else(|| key.user.to_string()));
    row("fingerprint", key.fingerprint.clone());
    row("serial", key.serial_number.clone().unwrap_or_default());
    row(
        "parent",
        key.parent_id.map(|p| p.to_string()).unwrap_or_default(),
    );
    row("created", timestamp(&key.create_at));
    row("expires", timestamp(&key.expire_at));
    for (k, v) in &key.attributes {
        row(&format!("attr.{k}"), v.clone());
    }
    if let Some(users) = &key.request_delete_users {
        row("delete requested by", users.clone());
    }
    if let Some(users) = &key.request_revoke_users {
        row("revoke requested by", users.clone());
    }
    print!("{table}");
}

/// Fields shared by create and import.
#[derive(Debug, Clone)]
pub struct KeyDraft {
    pub name: String,
    pub description: String,
    pub visibility: Option<Visibility>,
    pub key_type: String,
    pub attributes: Vec<KeyValue>,
}

impl KeyDraft {
    fn attributes(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .map(|KeyValue(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Body for a new key valid for `expire_days` from now.
    pub fn into_create(self, parent_id: Option<i32>, expire_days: i64) -> Result<CreateKey> {
        let expire_at = (expire_days > 0)
            .then(|| TimeDelta::try_days(expire_days))
            .flatten()
            .and_then(|validity| Utc::now().checked_add_signed(validity))
            .ok_or_else(|| Error::Custom(format!("cannot expire a key in {expire_days} days")))?;
        let attributes = self.attributes();
        Ok(CreateKey {
            name: self.name,
            description: self.description,
            visibility: self.visibility,
            attributes,
            key_type: self.key_type,
            parent_id,
            expire_at: expire_at.to_string(),
        })
    }

    /// Body for importing key material read from `files`.
    pub fn into_import(self, files: &KeyFiles) -> Result<ImportKey> {
        let attributes = self.attributes();
        Ok(ImportKey {
            name: self.name,
            description: self.description,
            visibility: self.visibility,
            attributes,
            key_type: self.key_type,
            private_key: fs::read_to_string(&files.private_key)?,
            public_key: fs::read_to_string(&files.public_key)?,
            certificate: match &files.certificate {
                Some(path) => fs::read_to_string(path)?,
                None => String::new(),
            },
        })
    }
}

/// Key material on disk.
#[derive(Debug, Clone)]
pub struct KeyFiles {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
    pub certificate: Option<PathBuf>,
}

pub async fn create(ctx: &mut AppContext, body: CreateKey) -> Result<()> {
    let key = ctx.client.create_key(&body).await?;
    if ctx.json {
        return print_json(&key);
    }
    println!("Created key {} ({})", key.id, key.name);
    Ok(())
}

pub async fn import(ctx: &mut AppContext, body: ImportKey) -> Result<()> {
    let key = ctx.client.import_key(&body).await?;
    if ctx.json {
        return print_json(&key);
    }
    println!("Imported key {} ({})", key.id, key.name);
    Ok(())
}

pub async fn action(ctx: &mut AppContext, id: i32, action: KeyAction) -> Result<()> {
    ctx.client.key_action(id, action).await?;
    println!("{}: key {id}", action.path_segment().replace('_', " "));
    Ok(())
}

/// Prints the exported material, or writes each non-empty part under `out`.
pub async fn export(ctx: &mut AppContext, id: i32, out: Option<&Path>) -> Result<()> {
    let exported = ctx.client.export_key(id).await?;
    let Some(dir) = out else {
        if ctx.json {
            return print_json(&exported);
        }
        for part in [
            &exported.public_key,
            &exported.certificate,
            &exported.private_key,
        ] {
            if !part.is_empty() {
                println!("{}", part.trim_end());
            }
        }
        return Ok(());
    };

    fs::create_dir_all(dir)?;
    for (file, content) in [
        ("private.key", &exported.private_key),
        ("public.key", &exported.public_key),
        ("certificate.pem", &exported.certificate),
    ] {
        if content.is_empty() {
            continue;
        }
        let path = dir.join(file);
        fs::write(&path, content)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

pub async fn check_name(ctx: &mut AppContext, name: &str, visibility: Visibility) -> Result<()> {
    let available = ctx.client.name_available(name, visibility).await?;
    if ctx.json {
        return print_json(&json!({"name": name, "visibility": visibility, "available": available}));
    }
    if available {
        println!("'{name}' is available ({visibility})");
    } else {
        println!("'{name}' is already taken ({visibility})");
    }
    Ok(())
}
