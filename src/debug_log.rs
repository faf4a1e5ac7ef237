//! Opt-in debug logging for tracing a run.
//!
//! Enable by setting environment variable: CHATSTATS_DEBUG_LOG=1
//! Logs are written to `chatstats-debug.log` in the system temp directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static START_TIME: OnceLock<Instant> = OnceLock::new();
static LOG_FILE: OnceLock<std::sync::Mutex<std::fs::File>> = OnceLock::new();

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("chatstats-debug.log")
}

/// Initialize debug logging. Call once at startup.
pub fn init() {
    if std::env::var("CHATSTATS_DEBUG_LOG").is_err() {
        return;
    }

    let file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path())
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Could not open debug log {}: {e}", log_path().display());
            return;
        }
    };

    START_TIME.get_or_init(Instant::now);
    LOG_FILE.get_or_init(|| std::sync::Mutex::new(file));
    ENABLED.store(true, Ordering::SeqCst);
    log("DEBUG", "init", "Debug logging initialized");
}

/// Check if debug logging is enabled.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Log a debug message with the time elapsed since startup.
pub fn log(category: &str, action: &str, detail: &str) {
    if !is_enabled() {
        return;
    }

    let elapsed = START_TIME
        .get()
        .map(|s| s.elapsed().as_millis())
        .unwrap_or(0);

    let msg = format!("[{elapsed:>8}ms] [{category}] {action} - {detail}\n");

    if let Some(file_mutex) = LOG_FILE.get()
        && let Ok(mut file) = file_mutex.lock()
    {
        let _ = file.write_all(msg.as_bytes());
        let _ = file.flush();
    }
}

/// RAII guard that logs how long a phase took when dropped.
pub struct Timed {
    category: &'static str,
    detail: String,
    started: Instant,
}

impl Timed {
    pub fn new(category: &'static str, detail: String) -> Self {
        if is_enabled() {
            log(category, "START", &detail);
        }
        Self {
            category,
            detail,
            started: Instant::now(),
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        if is_enabled() {
            let detail = format!("{} ({}ms)", self.detail, self.started.elapsed().as_millis());
            log(self.category, "DONE", &detail);
        }
    }
}
