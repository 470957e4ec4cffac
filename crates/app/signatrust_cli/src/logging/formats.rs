use std::io::Write;

use flexi_logger::{DeferredNow, style};
use log::Record;

/// `12:00:00 INFO  message`, with the level colored.
pub fn cli_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    write!(
        w,
        "{} {} {}",
        now.format("%H:%M:%S"),
        style(level).paint(format!("{level:<5}")),
        record.args()
    )
}
