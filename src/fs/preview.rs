use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, FsOp, Result};

/// Content read for the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// UTF-8 content split into lines.
    Text(Vec<String>),
    /// Content that is not valid UTF-8.
    Binary,
}

/// Read at most `limit` bytes of `path` and classify them.
///
/// A multi-byte character cut off by the limit does not make the content
/// binary; the partial character is dropped.
pub fn read_preview(path: &Path, limit: u64) -> Result<Preview> {
    let file = File::open(path).map_err(|e| AppError::fs(FsOp::Read, path, e))?;
    let mut bytes = Vec::new();
    file.take(limit)
        .read_to_end(&mut bytes)
        .map_err(|e| AppError::fs(FsOp::Read, path, e))?;

    let text = match std::str::from_utf8(&bytes) {
        Ok(text) => text,
        Err(e) if e.error_len().is_none() => {
            // Only the trailing character is incomplete.
            std::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return Ok(Preview::Binary),
    };
    Ok(Preview::Text(text.lines().map(str::to_string).collect()))
}

const SIZE_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Human-readable size in binary units.
///
/// Bytes and KiB are shown without decimals, larger units with two.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit > 1 {
        format!("{:.2} {}", value, SIZE_UNITS[unit])
    } else {
        format!("{:.0} {}", value, SIZE_UNITS[unit])
    }
}

/// Unix permission bits as `rwxr-xr-x`.
pub fn format_permissions(mode: u32) -> String {
    (0..9)
        .rev()
        .map(|bit| {
            if mode & (1 << bit) == 0 {
                '-'
            } else {
                ['x', 'w', 'r'][bit % 3]
            }
        })
        .collect()
}

/// Modification time as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_modified(time: Option<SystemTime>) -> String {
    let Some(secs) = time
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
    else {
        return "-".to_string();
    };
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    let minutes = (secs % 86_400) / 60;
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        year,
        month,
        day,
        minutes / 60,
        minutes % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
