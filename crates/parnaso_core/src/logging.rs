//! Rolling file logs for the CLI and embedders.
//!
//! # Invariants
//! - One logger per process; asking again with the same level and directory
//!   is a no-op, anything else is refused.
//! - Log lines carry ids, counts and statuses only. Passwords, hashes and
//!   session notes never reach a log call.
//! - Setup reports failures as `Err(String)` and never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Once;

const LOG_FILE_BASENAME: &str = "parnaso";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;
const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: &'static str,
    dir: PathBuf,
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

impl LogSettings {
    fn parse(level: &str, dir: &Path) -> Result<Self, String> {
        let wanted = level.trim().to_ascii_lowercase();
        let wanted = if wanted == "warning" { "warn".to_string() } else { wanted };
        let level = LEVELS
            .iter()
            .copied()
            .find(|known| *known == wanted)
            .ok_or_else(|| {
                format!("unknown log level `{wanted}`; use one of {}", LEVELS.join("|"))
            })?;

        if dir.as_os_str().is_empty() {
            return Err("log directory is empty".to_string());
        }
        if dir.is_relative() {
            return Err(format!(
                "log directory must be absolute: `{}`",
                dir.display()
            ));
        }
        Ok(Self {
            level,
            dir: dir.to_path_buf(),
        })
    }
}

/// Starts logging `level` and above into `log_dir/parnaso*.log`.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), String> {
    let settings = LogSettings::parse(level, log_dir.as_ref())?;
    let active = ACTIVE.get_or_try_init(|| start(settings.clone()))?;
    if active.settings == settings {
        return Ok(());
    }
    Err(format!(
        "logging already running (level `{}`, dir `{}`); refusing level `{}`, dir `{}`",
        active.settings.level,
        active.settings.dir.display(),
        settings.level,
        settings.dir.display()
    ))
}

/// Active `(level, directory)`, if logging was started.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.settings.level, active.settings.dir.clone()))
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start(settings: LogSettings) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(&settings.dir)
        .map_err(|err| format!("cannot create `{}`: {err}", settings.dir.display()))?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(|err| format!("bad log spec `{}`: {err}", settings.level))?
        .log_to_file(
            FileSpec::default()
                .directory(&settings.dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("logger start failed: {err}"))?;

    PANIC_HOOK.call_once(install_panic_hook);
    info!(
        "event=logging_init module=logging status=ok version={} os={} level={} dir={}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        settings.level,
        settings.dir.display()
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let location = panic
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        let payload = panic
            .payload()
            .downcast_ref::<&str>()
            .map(|text| (*text).to_string())
            .or_else(|| panic.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string payload>".to_string());
        error!(
            "event=panic module=logging status=error location={} payload={}",
            location,
            one_line(&payload, PANIC_PAYLOAD_LIMIT)
        );
        previous(panic);
    }));
}

/// Joins lines and truncates to `limit` chars so an event stays on one line.
fn one_line(text: &str, limit: usize) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() <= limit {
        return flat;
    }
    let mut cut: String = flat.chars().take(limit).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, LogSettings};
    use std::path::Path;

    #[test]
    fn settings_accept_known_levels_only() {
        let dir = Path::new("/tmp/parnaso-logs");
        assert_eq!(LogSettings::parse(" INFO ", dir).unwrap().level, "info");
        assert_eq!(LogSettings::parse("Warning", dir).unwrap().level, "warn");
        assert!(LogSettings::parse("loud", dir).is_err());
    }

    #[test]
    fn settings_require_absolute_directory() {
        let err = LogSettings::parse("info", Path::new("logs")).unwrap_err();
        assert!(err.contains("absolute"));
        assert!(LogSettings::parse("info", Path::new("")).is_err());
    }

    #[test]
    fn one_line_flattens_and_truncates() {
        assert_eq!(one_line("a\nb", 10), "a b");
        assert_eq!(one_line("abcdef\r\n", 4), "abcd...");
    }

    #[test]
    fn second_init_must_match_the_first() {
        let first = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();

        init_logging("info", first.path()).unwrap();
        init_logging("INFO", first.path()).unwrap();
        assert!(init_logging("debug", first.path())
            .unwrap_err()
            .contains("refusing"));
        assert!(init_logging("info", other.path())
            .unwrap_err()
            .contains("refusing"));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, "info");
        assert_eq!(dir, first.path());
    }
}
