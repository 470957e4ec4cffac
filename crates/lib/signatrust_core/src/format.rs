//! Number, duration and timestamp formatting used by the views.

use chrono::{DateTime, Duration, Utc};

/// `1234` → `1.2K`. Values below a thousand are printed as-is.
pub fn compact_number(n: u64) -> String {
    if n < 1_000 {
        return n.to_string();
    }
    // one decimal, truncated
    let tenths = n / 100;
    let (whole, frac) = (tenths / 10, tenths % 10);
    if frac == 0 {
        format!("{whole}K")
    } else {
        format!("{whole}.{frac}K")
    }
}

/// `1234567` → `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Share of `part` in `total` with one decimal, e.g. `33.3%`.
pub fn percentage(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}

/// Breakdown of a duration in days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParts {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl DurationParts {
    pub fn from_secs(total: u64) -> Self {
        Self {
            days: total / 86_400,
            hours: total % 86_400 / 3_600,
            minutes: total % 3_600 / 60,
            seconds: total % 60,
        }
    }
}

/// `93784` seconds → `1days 2h 3min 4s`; zero parts are skipped, an empty
/// duration is `0s`.
pub fn humanize_secs(total: u64) -> String {
    let p = DurationParts::from_secs(total);
    let mut parts = Vec::new();
    if p.days > 0 {
        parts.push(format!("{}days", p.days));
    }
    if p.hours > 0 {
        parts.push(format!("{}h", p.hours));
    }
    if p.minutes > 0 {
        parts.push(format!("{}min", p.minutes));
    }
    if p.seconds > 0 {
        parts.push(format!("{}s", p.seconds));
    }
    if parts.is_empty() {
        return "0s".to_string();
    }
    parts.join(" ")
}

/// Offset of the console's display zone (China Standard Time).
pub const CONSOLE_UTC_OFFSET_HOURS: i64 = 8;

/// `yyyy-MM-dd hh:mm:ss+08:00` in the console's display zone.
pub fn console_timestamp(at: &DateTime<Utc>) -> String {
    let local = at.naive_utc() + Duration::hours(CONSOLE_UTC_OFFSET_HOURS);
    format!(
        "{}+{:02}:00",
        local.format("%Y-%m-%d %H:%M:%S"),
        CONSOLE_UTC_OFFSET_HOURS
    )
}
