//! Console and file logging for the cuprum-plugins CLI.
//!
//! Messages go to stderr so that machine-readable output on stdout
//! (`list --json`) stays clean. Every message is also appended to
//! `~/.cuprum/logs/cuprum-plugins.log` with a timestamp, regardless of
//! the console verbosity. Once that file passes [`MAX_LOG_BYTES`] it is
//! moved to `cuprum-plugins.log.1` and a fresh one is started, so at most
//! two generations are kept. Output of child processes is not logged.

use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use once_cell::sync::OnceCell;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Console verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Verbosity {
    Quiet = 0,
    Normal = 1,
    Verbose = 2,
    Debug = 3,
}

impl Verbosity {
    /// Map the CLI's `-q` flag and `-v` count to a level
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Verbosity::Quiet;
        }
        match verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            2 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    }
}

/// Size at which the log file is rotated on startup
pub const MAX_LOG_BYTES: u64 = 1024 * 1024;

static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);
static LOG_FILE: OnceCell<Option<Mutex<File>>> = OnceCell::new();

/// Default log file location
pub fn log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".cuprum")
            .join("logs")
            .join("cuprum-plugins.log")
    })
}

/// Initialize the logger. Safe to call more than once; only the first call
/// opens the log file.
pub fn init(verbosity: Verbosity) {
    VERBOSITY.store(verbosity as u8, Ordering::Relaxed);
    LOG_FILE.get_or_init(|| open_log_file().map(Mutex::new));
}

fn open_log_file() -> Option<File> {
    let path = log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    // a failed rotation just means the file keeps growing this run
    let _ = rotate_if_larger(&path, MAX_LOG_BYTES);
    OpenOptions::new().create(true).append(true).open(path).ok()
}

/// Move `path` to `<path>.1` (replacing an older one) when it is larger
/// than `max_bytes`. Returns whether a rotation happened.
fn rotate_if_larger(path: &Path, max_bytes: u64) -> std::io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if len <= max_bytes {
        return Ok(false);
    }
    let mut rotated = path.as_os_str().to_owned();
    rotated.push(".1");
    fs::rename(path, PathBuf::from(rotated))?;
    Ok(true)
}

pub fn get_verbosity() -> Verbosity {
    Verbosity::from_u8(VERBOSITY.load(Ordering::Relaxed))
}

pub fn get_log_path_string() -> String {
    log_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unavailable>".to_string())
}

fn write_to_file(level: &str, msg: &str) {
    let Some(Some(file)) = LOG_FILE.get() else {
        return;
    };
    if let Ok(mut file) = file.lock() {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "[{}] {:<5} {}", timestamp, level, msg);
    }
}

fn enabled(level: Verbosity) -> bool {
    get_verbosity() >= level
}

pub fn error(msg: &str) {
    write_to_file("ERROR", msg);
    // errors are shown even in quiet mode
    eprintln!("{} {}", "error:".red().bold(), msg);
}

pub fn warn(msg: &str) {
    write_to_file("WARN", msg);
    if enabled(Verbosity::Normal) {
        eprintln!("{} {}", "warning:".yellow().bold(), msg);
    }
}

pub fn info(msg: &str) {
    write_to_file("INFO", msg);
    if enabled(Verbosity::Verbose) {
        eprintln!("{} {}", "info:".blue(), msg);
    }
}

pub fn debug(msg: &str) {
    write_to_file("DEBUG", msg);
    if enabled(Verbosity::Debug) {
        eprintln!("{} {}", "debug:".dimmed(), msg.dimmed());
    }
}

/// A top-level step of a command ("Building workspace", "Installing plugins")
pub fn step(msg: &str) {
    write_to_file("STEP", msg);
    if enabled(Verbosity::Normal) {
        eprintln!("{} {}", "==>".cyan().bold(), msg.bold());
    }
}

pub fn success(msg: &str) {
    write_to_file("OK", msg);
    if enabled(Verbosity::Normal) {
        eprintln!("{} {}", "✓".green().bold(), msg);
    }
}

/// Spinner shown while a long step runs. Only drawn on an interactive
/// stderr at normal verbosity; otherwise every call is a no-op.
pub struct Spinner {
    bar: Option<ProgressBar>,
}

impl Spinner {
    pub fn start(msg: &str) -> Self {
        let interactive = atty::is(atty::Stream::Stderr);
        if !interactive || get_verbosity() != Verbosity::Normal {
            return Spinner { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
            bar.set_style(style);
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner { bar: Some(bar) }
    }

    pub fn is_drawn(&self) -> bool {
        self.bar.is_some()
    }

    /// Print a line to stderr without tearing the spinner
    pub fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => eprintln!("{}", line),
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
