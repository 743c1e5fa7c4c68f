//! Logging setup for the command line tool.
//!
//! Console logging goes through `env_logger` with a colored, timestamped
//! format. `RUST_LOG` wins when set; otherwise debug builds show this crate's
//! debug output and release builds show errors only. Other crates are silenced.
//!
//! Panics are written with a backtrace to `<data dir>/platemark/logs/panic.log`.

use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::PathBuf;

use chrono::Utc;
use env_logger::fmt::{Color, Formatter};
use log::{Level, LevelFilter, Record};

#[allow(unused_imports)]
use log::{debug, info, warn, error};

pub fn setup_logger(app_name: &str) {
    let mut builder = env_logger::Builder::new();
    apply_filters(&mut builder, app_name, std::env::var("RUST_LOG").ok().as_deref());

    builder.format(|buf: &mut Formatter, record: &Record| {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");
        let module_info = module_info(record.module_path(), record.line());

        let mut level_style = buf.style();
        let mut meta_style = buf.style();

        match record.level() {
            Level::Error => level_style.set_color(Color::Red).set_bold(true),
            Level::Warn => level_style.set_color(Color::Yellow).set_bold(true),
            Level::Info => level_style.set_color(Color::Green).set_bold(true),
            Level::Debug => level_style.set_color(Color::Blue).set_bold(true),
            Level::Trace => level_style.set_color(Color::White),
        };

        // Color::Rgb does not work on macOS terminals
        #[cfg(target_os = "macos")]
        {
            meta_style.set_color(Color::Blue);
        }

        #[cfg(not(target_os = "macos"))]
        {
            meta_style.set_color(Color::Rgb(120, 120, 120));
        }

        writeln!(
            buf,
            "{} {} {} {}",
            meta_style.value(timestamp),
            level_style.value(record.level()),
            meta_style.value(module_info),
            record.args()
        )
    });

    // A second init (tests, embedding) keeps the first logger
    if builder.try_init().is_err() {
        debug!("Logger already initialized");
    }
}

/// `RUST_LOG` is used as given. Without it only this crate logs, at debug level
/// in debug builds and error level in release builds.
fn apply_filters(builder: &mut env_logger::Builder, app_name: &str, rust_log: Option<&str>) {
    if let Some(spec) = rust_log {
        builder.parse_filters(spec);
        return;
    }
    let level = if cfg!(debug_assertions) { LevelFilter::Debug } else { LevelFilter::Error };
    builder.filter(None, LevelFilter::Off);
    builder.filter(Some(app_name), level);
}

fn module_info(module: Option<&str>, line: Option<u32>) -> String {
    match (module, line) {
        (Some(module), Some(line)) => format!("{module}:{line}"),
        (Some(module), None) => module.to_string(),
        (None, Some(line)) => format!("line:{line}"),
        (None, None) => "unknown".to_string(),
    }
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(app_name).join("logs")
}

/// Write panics with a backtrace to panic.log, then run the default hook so the
/// message still reaches stderr.
pub fn setup_panic_hook(app_name: &str) {
    let log_dir = get_log_directory(app_name);
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        warn!("Could not create log directory {:?}: {}", log_dir, e);
        return;
    }
    let log_file_path = log_dir.join("panic.log");
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let backtrace = backtrace::Backtrace::new();
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        let location = if let Some(location) = info.location() {
            format!("{}:{}", location.file(), location.line())
        } else {
            "unknown location".to_string()
        };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&log_file_path);
        if let Ok(mut file) = file {
            let _ = writeln!(file, "{timestamp} [PANIC] at {location} - {info}");
            let _ = writeln!(file, "{timestamp} [PANIC] Backtrace:");
            for line in format!("{backtrace:?}").lines() {
                let _ = writeln!(file, "{timestamp} [BACKTRACE] {}", line.trim());
            }
        }

        error!("[PANIC] at {location} - {info}");
        default_hook(info);
    }));
}
