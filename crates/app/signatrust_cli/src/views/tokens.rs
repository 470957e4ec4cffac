//! API token view (`/tokens`, `/apiTokens`).

use signatrust_core::models::ApiToken;

use super::render::{Table, print_json, timestamp};
use crate::Result;
use crate::context::AppContext;

pub async fn list(ctx: &mut AppContext) -> Result<()> {
    ctx.tokens.refresh(&ctx.client).await?;
    print_tokens(ctx.json, ctx.tokens.tokens())
}

fn print_tokens(json: bool, tokens: &[ApiToken]) -> Result<()> {
    if json {
        return print_json(&tokens);
    }
    if tokens.is_empty() {
        println!("No API tokens.");
        return Ok(());
    }
    let mut table = Table::new(["ID", "DESCRIPTION", "CREATED", "EXPIRES"]);
    for t in tokens {
        table.push(vec![
            t.id.to_string(),
            t.description.clone(),
            timestamp(&t.create_at),
            timestamp(&t.expire_at),
        ]);
    }
    print!("{table}");
    Ok(())
}

/// Creates a token. Its value is only returned once, so it is printed here.
pub async fn create(ctx: &mut AppContext, description: &str) -> Result<()> {
    let token = ctx.tokens.create(&ctx.client, description).await?;
    if ctx.json {
        return print_json(&token);
    }
    println!("Created API token {} ({})", token.id, token.description);
    println!("{}", token.token);
    println!("Store it now; it cannot be shown again.");
    Ok(())
}

pub async fn delete(ctx: &mut AppContext, id: i32) -> Result<()> {
    ctx.tokens.delete(&ctx.client, id).await?;
    println!("Deleted API token {id}");
    print_tokens(ctx.json, ctx.tokens.tokens())
}
