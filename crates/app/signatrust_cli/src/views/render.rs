//! Plain-text rendering shared by the views.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use signatrust_core::format::{compact_number, console_timestamp, percentage, thousands};

use crate::Result;

/// Left-aligned text table.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let line = |f: &mut fmt::Formatter<'_>, cells: &[String]| -> fmt::Result {
            let mut out = String::new();
            for (i, cell) in cells.iter().enumerate() {
                if i > 0 {
                    out.push_str("  ");
                }
                let width = widths.get(i).copied().unwrap_or(0);
                out.push_str(&format!("{cell:<width$}"));
            }
            writeln!(f, "{}", out.trim_end())
        };
        line(f, &self.headers)?;
        for row in &self.rows {
            line(f, row)?;
        }
        Ok(())
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Backend timestamps (RFC 3339 or `2024-04-08 13:36:35.328324 UTC`) in the
/// console's display zone. Unparseable values are shown as-is.
pub fn timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return "-".to_string();
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return console_timestamp(&at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f UTC") {
        return console_timestamp(&naive.and_utc());
    }
    raw.to_string()
}

/// Array of records inside a certification response: the value itself, or
/// its `data`/`list`/`records` member.
pub fn records(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["data", "list", "records", "rows"]
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(records),
        _ => None,
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a list of JSON objects as a table, or anything else as JSON.
pub fn value_table(value: &Value) -> Result<String> {
    let Some(items) = records(value) else {
        return Ok(serde_json::to_string_pretty(value)?);
    };
    let Some(Value::Object(first)) = items.first() else {
        return Ok(serde_json::to_string_pretty(value)?);
    };
    let columns: Vec<String> = first.keys().cloned().collect();
    let mut table = Table::new(columns.iter().map(|c| c.to_uppercase()));
    for item in items {
        table.push(
            columns
                .iter()
                .map(|c| item.get(c).map(cell).unwrap_or_default())
                .collect(),
        );
    }
    Ok(table.to_string())
}

const LABEL_FIELDS: [&str; 6] = ["name", "cooperatorName", "cooperator", "month", "date", "time"];
const COUNT_FIELDS: [&str; 4] = ["count", "value", "total", "num"];

/// `(label, count)` pairs from a statistics response. Accepts a flat
/// `{label: number}` object or a list of records with a label and a count.
pub fn counts(value: &Value) -> Vec<(String, u64)> {
    if let Value::Object(map) = value {
        let flat: Vec<(String, u64)> = map
            .iter()
            .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
            .collect();
        if !flat.is_empty() {
            return flat;
        }
    }
    let Some(items) = records(value) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let label = LABEL_FIELDS.iter().find_map(|k| item.get(*k)).map(cell)?;
            let count = COUNT_FIELDS.iter().find_map(|k| item.get(*k)?.as_u64())?;
            Some((label, count))
        })
        .collect()
}

/// Count table with thousands separators, share of total and compact form.
pub fn count_table(pairs: &[(String, u64)]) -> Table {
    let total: u64 = pairs.iter().map(|(_, n)| n).sum();
    let mut table = Table::new(["NAME", "COUNT", "SHARE", "COMPACT"]);
    for (label, n) in pairs {
        table.push(vec![
            label.clone(),
            thousands(*n),
            percentage(*n, total),
            compact_number(*n),
        ]);
    }
    table
}
