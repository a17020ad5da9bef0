//! Output formatting: console tables and CSV files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};

use crate::error::Result;
use crate::reports::{ColumnType, Report};

/// Timestamp format used in tables and CSV files.
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a report as a console table.
///
/// `Number` columns and the last column are right-aligned.
pub fn render_table(report: &Report) -> String {
    let mut builder = Builder::default();
    builder.push_record(report.header.iter().cloned());
    for row in &report.rows {
        builder.push_record(row.iter().cloned());
    }

    let mut table = builder.build();
    table.with(Style::psql());

    let last = report.header.len().saturating_sub(1);
    for (i, kind) in report.column_types.iter().enumerate() {
        if *kind == ColumnType::Number || i == last {
            table.modify(Columns::single(i), Alignment::right());
        }
    }
    if report.column_types.len() <= last {
        table.modify(Columns::single(last), Alignment::right());
    }

    table.to_string()
}

/// Write a header row followed by `rows` to `path`, replacing any existing file.
///
/// The rows go to `<path>.tmp` first, which is renamed over `path` once
/// complete, so `path` never holds a partial file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_csv<I, R>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let tmp = sibling(path, ".tmp");
    let mut writer = csv::Writer::from_path(&tmp)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    drop(writer);
    fs::rename(&tmp, path)?;
    Ok(())
}

/// `path` with `suffix` appended to its file name.
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write a report's header and rows to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_report_csv(path: &Path, report: &Report) -> Result<()> {
    let header: Vec<&str> = report.header.iter().map(String::as_str).collect();
    write_csv(path, &header, &report.rows)
}

/// Format an instant in the machine's local timezone.
pub fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format(DISPLAY_TIME_FORMAT).to_string()
}

/// Format an instant in `tz`.
pub fn zoned_time(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format(DISPLAY_TIME_FORMAT).to_string()
}

/// Format an optional number with three decimals; missing values are blank.
pub fn number(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.3}")).unwrap_or_default()
}

/// Optional text; missing values are blank.
pub fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}
