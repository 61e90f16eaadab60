//! SH-015: Append-only JSONL install journal, one file per game.

use crate::core::types::{is_valid_slug, InstallEvent, TimestampedEvent};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn now_iso8601() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format_utc(secs)
}

fn format_utc(secs: u64) -> String {
    let (y, m, d) = civil_from_days((secs / 86_400) as i64);
    let tod = secs % 86_400;
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        y,
        m,
        d,
        tod / 3600,
        (tod % 3600) / 60,
        tod % 60
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Short identifier for one install attempt.
pub fn generate_run_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("i-{:012x}", nanos & 0xFFFF_FFFF_FFFF)
}

/// `<journal_dir>/<game>/events.jsonl`. Names that could leave `journal_dir` are refused.
pub fn event_log_path(journal_dir: &Path, game: &str) -> Result<PathBuf, String> {
    if !is_valid_slug(game) {
        return Err(format!("invalid journal name '{}'", game));
    }
    Ok(journal_dir.join(game).join("events.jsonl"))
}

/// Append one event line to the game's journal.
pub fn append_event(journal_dir: &Path, game: &str, event: InstallEvent) -> Result<(), String> {
    let path = event_log_path(journal_dir, game)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create journal dir {}: {}", parent.display(), e))?;
    }

    let line = serde_json::to_string(&TimestampedEvent {
        ts: now_iso8601(),
        event,
    })
    .map_err(|e| format!("cannot encode event: {}", e))?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("cannot open journal {}: {}", path.display(), e))?;
    writeln!(file, "{}", line).map_err(|e| format!("cannot append to {}: {}", path.display(), e))
}

/// Read a game's journal back. A missing journal is empty.
pub fn read_events(journal_dir: &Path, game: &str) -> Result<Vec<TimestampedEvent>, String> {
    let path = event_log_path(journal_dir, game)?;
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| format!("cannot read journal {}: {}", path.display(), e))?;
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|e| format!("{}:{}: bad event: {}", path.display(), i + 1, e))
        })
        .collect()
}
