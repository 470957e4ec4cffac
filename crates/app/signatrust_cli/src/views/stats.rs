//! Statistics dashboard.

use chrono::Utc;
use serde_json::json;
use signatrust_core::format::console_timestamp;
use signatrust_core::state::{CountWay, GrowthWindow};

use super::render::{count_table, counts, print_json, value_table};
use crate::{Error, Result};
use crate::context::AppContext;

pub async fn types(ctx: &mut AppContext) -> Result<()> {
    ctx.stats.fetch_cooperators(&ctx.client).await?;
    let Some(value) = ctx.stats.by_cooperator() else {
        return Ok(());
    };
    if ctx.json {
        return print_json(value);
    }
    let pairs = counts(value);
    if pairs.is_empty() {
        println!("{}", value_table(value)?);
    } else {
        print!("{}", count_table(&pairs));
    }
    Ok(())
}

pub async fn growth(ctx: &mut AppContext, hours: i64, count_way: CountWay) -> Result<()> {
    let window = GrowthWindow::ending_at(Utc::now(), hours, count_way)
        .ok_or_else(|| Error::Custom(format!("a window of {hours} hours is out of range")))?;
    ctx.stats.set_window(window);
    ctx.stats.fetch_growth(&ctx.client).await?;
    let window = ctx.stats.window;
    let Some(value) = ctx.stats.growth() else {
        return Ok(());
    };
    if ctx.json {
        return print_json(&json!({
            "start": window.start,
            "end": window.end,
            "count_way": window.count_way.to_string(),
            "series": value,
        }));
    }
    println!(
        "{} to {} by {}",
        console_timestamp(&window.start),
        console_timestamp(&window.end),
        window.count_way
    );
    let pairs = counts(value);
    if pairs.is_empty() {
        println!("{}", value_table(value)?);
    } else {
        print!("{}", count_table(&pairs));
    }
    Ok(())
}
